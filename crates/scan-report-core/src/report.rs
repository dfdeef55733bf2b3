//! Report pipeline: turns the scan outputs in a working directory into the
//! final merged report.
//!
//! Stages run sequentially and hand documents to each other as files:
//!
//! ```text
//! load_inputs ─┬─ cover_pages ──┐
//!              ├─ annotate ─────┴─ plagiarism_merge ─┐
//!              └─ ai_pages ──────────────────────────┴─ final_merge
//! ```
//!
//! A failed stage does not abort the run: stages depending on it are marked
//! skipped and independent stages still execute. The run succeeds only when
//! `final_merge` completes.

use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use serde::Serialize;
use tracing::{debug, error, info, warn};

use crate::assets::{AssetRegistry, DirAssetRegistry, PDF_FOOTER, PDF_HEADER};
use crate::config::ReportConfig;
use crate::error::{Error, Result};
use crate::model::{AiDetectionResult, CrawledVersion, ScanResult, parse_json};
use crate::pages::{build_ai_pages, build_cover_page, build_plagiarism_page};
use crate::pdf::{AnnotateRequest, MergeOptions, ReportDocument, annotate_pdf, merge_pdfs, page_count};

// =============================================================================
// Stages
// =============================================================================

/// A step of the report pipeline.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Stage {
    LoadInputs,
    CoverPages,
    Annotate,
    PlagiarismMerge,
    AiPages,
    FinalMerge,
}

impl Stage {
    /// Every stage in execution order.
    pub const ALL: [Self; 6] = [
        Self::LoadInputs,
        Self::CoverPages,
        Self::Annotate,
        Self::PlagiarismMerge,
        Self::AiPages,
        Self::FinalMerge,
    ];

    /// Stages whose output this stage consumes.
    pub const fn dependencies(self) -> &'static [Self] {
        match self {
            Self::LoadInputs => &[],
            Self::CoverPages | Self::Annotate | Self::AiPages => &[Self::LoadInputs],
            Self::PlagiarismMerge => &[Self::CoverPages, Self::Annotate],
            Self::FinalMerge => &[Self::PlagiarismMerge, Self::AiPages],
        }
    }

    pub const fn as_str(self) -> &'static str {
        match self {
            Self::LoadInputs => "load_inputs",
            Self::CoverPages => "cover_pages",
            Self::Annotate => "annotate",
            Self::PlagiarismMerge => "plagiarism_merge",
            Self::AiPages => "ai_pages",
            Self::FinalMerge => "final_merge",
        }
    }
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Outcome of a single stage.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum StageState {
    Pending,
    Completed {
        #[serde(skip_serializing_if = "Option::is_none")]
        output: Option<PathBuf>,
    },
    Failed {
        error: String,
    },
    Skipped {
        reason: String,
    },
}

impl StageState {
    pub const fn is_completed(&self) -> bool {
        matches!(self, Self::Completed { .. })
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StageReport {
    pub stage: Stage,
    #[serde(flatten)]
    pub state: StageState,
}

/// Serializable summary of a pipeline run.
#[derive(Debug, Clone, Serialize)]
pub struct ReportStatus {
    pub success: bool,
    pub stages: Vec<StageReport>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub first_failed: Option<Stage>,
    /// Path of the final report when the run succeeded
    #[serde(skip_serializing_if = "Option::is_none")]
    pub output: Option<PathBuf>,
    /// Whether the QR code made it onto the annotated report
    pub qr_embedded: bool,
}

impl ReportStatus {
    fn new() -> Self {
        Self {
            success: false,
            stages: Stage::ALL
                .iter()
                .map(|&stage| StageReport {
                    stage,
                    state: StageState::Pending,
                })
                .collect(),
            first_failed: None,
            output: None,
            qr_embedded: false,
        }
    }

    pub fn state(&self, stage: Stage) -> &StageState {
        self.stages
            .iter()
            .find(|report| report.stage == stage)
            .map_or(&StageState::Pending, |report| &report.state)
    }

    fn set(&mut self, stage: Stage, state: StageState) -> &StageReport {
        let index = Stage::ALL.iter().position(|&s| s == stage).unwrap_or_default();
        self.stages[index].state = state;
        &self.stages[index]
    }

    /// Why `stage` cannot run, if one of its dependencies did not complete.
    fn blocked_by(&self, stage: Stage) -> Option<Stage> {
        stage
            .dependencies()
            .iter()
            .copied()
            .find(|&dep| !self.state(dep).is_completed())
    }
}

/// Callback invoked after every stage with its final state.
pub type ProgressCallback = Box<dyn Fn(&StageReport) + Send + Sync>;

// =============================================================================
// Generator
// =============================================================================

/// Parsed inputs of a report run.
#[derive(Debug, Clone)]
pub struct ReportInputs {
    pub scan: ScanResult,
    pub ai: AiDetectionResult,
    pub crawled: CrawledVersion,
    pub plagiarism_report: Vec<u8>,
}

/// Data carried between stages of one run.
#[derive(Debug, Default)]
struct RunState {
    inputs: Option<ReportInputs>,
    qr_embedded: bool,
}

impl RunState {
    fn inputs(&self, dir: &Path) -> Result<&ReportInputs> {
        self.inputs
            .as_ref()
            .ok_or_else(|| Error::MissingInput(dir.to_path_buf()))
    }
}

/// Generates the merged report for one working directory.
pub struct ReportGenerator {
    config: ReportConfig,
    assets: Arc<dyn AssetRegistry>,
}

impl ReportGenerator {
    /// Create a generator reading assets from `config.assets_dir`.
    pub fn new(config: ReportConfig) -> Self {
        let assets = Arc::new(DirAssetRegistry::new(config.assets_dir.clone()));
        Self { config, assets }
    }

    /// Create a generator with a custom asset source.
    pub fn with_assets(config: ReportConfig, assets: Arc<dyn AssetRegistry>) -> Self {
        Self { config, assets }
    }

    pub const fn config(&self) -> &ReportConfig {
        &self.config
    }

    fn path(dir: &Path, name: &str) -> PathBuf {
        dir.join(name)
    }

    /// Fail fast with [`Error::MissingInput`] if any input file is absent.
    pub async fn check_inputs(&self, dir: &Path) -> Result<()> {
        let files = &self.config.files;
        for name in [
            &files.scan_results,
            &files.ai_result,
            &files.crawled_version,
            &files.plagiarism_report,
        ] {
            let path = Self::path(dir, name);
            if !tokio::fs::try_exists(&path).await? {
                return Err(Error::MissingInput(path));
            }
        }
        Ok(())
    }

    /// Read and parse every input file.
    pub async fn load_inputs(&self, dir: &Path) -> Result<ReportInputs> {
        let files = &self.config.files;

        let scan_path = Self::path(dir, &files.scan_results);
        let scan = parse_json(&scan_path, &tokio::fs::read(&scan_path).await?)?;

        let ai_path = Self::path(dir, &files.ai_result);
        let ai = parse_json(&ai_path, &tokio::fs::read(&ai_path).await?)?;

        let crawled_path = Self::path(dir, &files.crawled_version);
        let crawled = parse_json(&crawled_path, &tokio::fs::read(&crawled_path).await?)?;

        let plagiarism_report = tokio::fs::read(Self::path(dir, &files.plagiarism_report)).await?;

        Ok(ReportInputs {
            scan,
            ai,
            crawled,
            plagiarism_report,
        })
    }

    /// Cover page plus plagiarism detail page.
    pub fn cover_pages(&self, scan: &ScanResult) -> Result<Vec<u8>> {
        let mut doc = ReportDocument::new(Arc::clone(&self.assets));
        build_cover_page(&mut doc, scan, &self.config)?;
        build_plagiarism_page(&mut doc, scan, &self.config)?;
        doc.to_pdf_bytes()
    }

    /// AI summary, phrase insight and highlighted text pages.
    pub fn ai_pages(&self, ai: &AiDetectionResult, crawled: &CrawledVersion) -> Result<Vec<u8>> {
        let mut doc = ReportDocument::new(Arc::clone(&self.assets));
        build_ai_pages(&mut doc, ai, crawled, &self.config)?;
        doc.to_pdf_bytes()
    }

    /// Brand the external plagiarism report; returns bytes and QR placement.
    pub fn annotate(&self, report: &[u8], identifier: &str) -> Result<(Vec<u8>, bool)> {
        let request = AnnotateRequest {
            header: self.assets.load_asset(PDF_HEADER)?,
            footer: self.assets.load_asset(PDF_FOOTER)?,
            link: self.config.header_link.clone(),
            qr_url: self.config.qr_url(identifier),
            qr_background: self.config.qr_background,
        };
        debug!("Annotating report of {} pages", page_count(report)?);
        let annotated = annotate_pdf(report, &request)?;
        Ok((annotated.bytes, annotated.qr_embedded))
    }

    async fn merge_files(&self, dir: &Path, first: &str, second: &str, options: MergeOptions, output: &str) -> Result<PathBuf> {
        let first = tokio::fs::read(Self::path(dir, first)).await?;
        let second = tokio::fs::read(Self::path(dir, second)).await?;
        let merged = merge_pdfs(&first, &second, options)?;
        write_output(dir, output, &merged).await
    }

    async fn run_stage(
        &self,
        stage: Stage,
        dir: &Path,
        identifier: &str,
        run: &mut RunState,
    ) -> Result<Option<PathBuf>> {
        let files = &self.config.files;
        let output = match stage {
            Stage::LoadInputs => {
                run.inputs = Some(self.load_inputs(dir).await?);
                return Ok(None);
            }
            Stage::CoverPages => {
                let bytes = self.cover_pages(&run.inputs(dir)?.scan)?;
                write_output(dir, &files.part1, &bytes).await?
            }
            Stage::Annotate => {
                let (bytes, qr_embedded) = self.annotate(&run.inputs(dir)?.plagiarism_report, identifier)?;
                run.qr_embedded = qr_embedded;
                write_output(dir, &files.header_added, &bytes).await?
            }
            Stage::PlagiarismMerge => {
                self.merge_files(
                    dir,
                    &files.part1,
                    &files.header_added,
                    MergeOptions::skip_first_page(),
                    &files.plagiarism_merged,
                )
                .await?
            }
            Stage::AiPages => {
                let inputs = run.inputs(dir)?;
                let bytes = self.ai_pages(&inputs.ai, &inputs.crawled)?;
                write_output(dir, &files.part2, &bytes).await?
            }
            Stage::FinalMerge => {
                self.merge_files(
                    dir,
                    &files.plagiarism_merged,
                    &files.part2,
                    MergeOptions::default(),
                    &files.final_report,
                )
                .await?
            }
        };
        Ok(Some(output))
    }

    /// Run the whole pipeline in `dir`.
    ///
    /// Returns `Err` only for missing inputs; every other failure is recorded
    /// in the returned [`ReportStatus`].
    pub async fn generate(
        &self,
        dir: &Path,
        identifier: &str,
        progress: Option<ProgressCallback>,
    ) -> Result<ReportStatus> {
        self.check_inputs(dir).await?;

        let mut status = ReportStatus::new();
        let mut run = RunState::default();

        for stage in Stage::ALL {
            let state = if let Some(dependency) = status.blocked_by(stage) {
                warn!("Skipping {stage}: {dependency} did not complete");
                StageState::Skipped {
                    reason: format!("{dependency} did not complete"),
                }
            } else {
                info!("Running {stage}");
                let result = self.run_stage(stage, dir, identifier, &mut run).await;

                match result {
                    Ok(output) => {
                        info!("Finished {stage}");
                        StageState::Completed { output }
                    }
                    Err(e) => {
                        error!("Stage {stage} failed: {e}");
                        status.first_failed.get_or_insert(stage);
                        StageState::Failed { error: e.to_string() }
                    }
                }
            };

            let report = status.set(stage, state);
            if let Some(callback) = &progress {
                callback(report);
            }
        }

        status.qr_embedded = run.qr_embedded;
        if let StageState::Completed { output } = status.state(Stage::FinalMerge) {
            status.output = output.clone();
            status.success = true;
        }

        Ok(status)
    }
}

async fn write_output(dir: &Path, name: &str, bytes: &[u8]) -> Result<PathBuf> {
    let path = dir.join(name);
    tokio::fs::write(&path, bytes).await?;
    debug!("Wrote {} ({} bytes)", path.display(), bytes.len());
    Ok(path)
}
