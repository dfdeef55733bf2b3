//! Integration tests for scan-report-core
//!
//! These tests run the report pipeline end to end in a temporary working
//! directory:
//! - Input loading and missing-input detection
//! - Page generation, annotation and merging
//! - Stage skipping after failures
//! - Directory and base64 asset loading

use std::path::Path;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use base64::Engine;
use image::{ImageBuffer, ImageFormat, Rgba, RgbaImage};
use lopdf::content::{Content, Operation};
use lopdf::{Dictionary, Document, Object, Stream};
use scan_report_core::assets::{self, MemoryAssetRegistry};
use scan_report_core::{Error, ReportConfig, ReportGenerator, Stage, StageState};
use serde_json::json;
use tempfile::TempDir;

// =============================================================================
// Fixtures
// =============================================================================

fn png(width: u32, height: u32) -> Vec<u8> {
    let img: RgbaImage = ImageBuffer::from_pixel(width, height, Rgba([20, 60, 160, 255]));
    let mut out = std::io::Cursor::new(Vec::new());
    img.write_to(&mut out, ImageFormat::Png).unwrap();
    out.into_inner()
}

fn asset_names(config: &ReportConfig) -> Vec<String> {
    let mut names: Vec<String> = [
        assets::HEADER_BANNER,
        assets::CERTIFICATION,
        assets::PDF_HEADER,
        assets::PDF_FOOTER,
        assets::ICON_REPOSITORY,
        assets::ICON_INTERNAL_DATABASE,
        assets::ICON_FILTERED,
        assets::ICON_INTERNET,
        assets::ICON_BATCH,
    ]
    .iter()
    .map(|s| (*s).to_string())
    .collect();
    names.extend(config.social_links.iter().map(|l| l.icon.clone()));
    names
}

fn memory_assets(config: &ReportConfig) -> MemoryAssetRegistry {
    let mut registry = MemoryAssetRegistry::new();
    for name in asset_names(config) {
        registry.insert(name, png(16, 8));
    }
    registry
}

/// A plain PDF with one page per text, standing in for the external report.
fn external_report(texts: &[&str]) -> Vec<u8> {
    let mut doc = Document::with_version("1.5");
    let pages_id = doc.new_object_id();

    let font_id = doc.add_object(Dictionary::from_iter([
        ("Type", Object::Name(b"Font".to_vec())),
        ("Subtype", Object::Name(b"Type1".to_vec())),
        ("BaseFont", Object::Name(b"Helvetica".to_vec())),
    ]));

    let mut kids = Vec::new();
    for text in texts {
        let content = Content {
            operations: vec![
                Operation::new("BT", vec![]),
                Operation::new("Tf", vec!["F1".into(), 18.into()]),
                Operation::new("Td", vec![72.into(), 700.into()]),
                Operation::new("Tj", vec![Object::string_literal(*text)]),
                Operation::new("ET", vec![]),
            ],
        };
        let content_id = doc.add_object(Stream::new(Dictionary::new(), content.encode().unwrap()));
        let page_id = doc.add_object(Dictionary::from_iter([
            ("Type", Object::Name(b"Page".to_vec())),
            ("Parent", Object::Reference(pages_id)),
            ("Contents", Object::Reference(content_id)),
            (
                "Resources",
                Object::Dictionary(Dictionary::from_iter([(
                    "Font",
                    Object::Dictionary(Dictionary::from_iter([("F1", Object::Reference(font_id))])),
                )])),
            ),
        ]));
        kids.push(Object::Reference(page_id));
    }

    let count = i64::try_from(kids.len()).unwrap();
    doc.objects.insert(
        pages_id,
        Object::Dictionary(Dictionary::from_iter([
            ("Type", Object::Name(b"Pages".to_vec())),
            ("Kids", Object::Array(kids)),
            ("Count", Object::Integer(count)),
            (
                "MediaBox",
                Object::Array(vec![0.into(), 0.into(), 595.into(), 842.into()]),
            ),
        ])),
    );
    let catalog_id = doc.add_object(Dictionary::from_iter([
        ("Type", Object::Name(b"Catalog".to_vec())),
        ("Pages", Object::Reference(pages_id)),
    ]));
    doc.trailer.set("Root", Object::Reference(catalog_id));

    let mut out = Vec::new();
    doc.save_to(&mut out).unwrap();
    out
}

fn write_inputs(dir: &Path, report_pages: &[&str]) {
    let scan = json!({
        "scannedDocument": {
            "metadata": { "filename": "thesis.pdf" },
            "creationTime": "2024-06-01T08:30:00Z",
            "totalWords": 1200,
            "totalExcluded": 12
        },
        "results": {
            "score": {
                "aggregatedScore": 23.4,
                "identicalWords": 150,
                "minorChangedWords": 40,
                "relatedMeaningWords": 25
            }
        }
    });
    let ai = json!({
        "explain": {
            "patterns": {
                "text": { "words": { "starts": [0, 4], "lengths": [3, 2] } },
                "statistics": { "aiCount": [6.0, 2.0], "humanCount": [2.0, 4.0] }
            }
        },
        "results": [
            { "matches": [ { "text": { "words": { "starts": [0], "lengths": [10] } } } ] }
        ]
    });
    let crawled = json!({
        "text": { "value": "The quick brown fox jumps over the lazy dog today" }
    });

    std::fs::write(dir.join("scan_results.json"), scan.to_string()).unwrap();
    std::fs::write(dir.join("ai_result.json"), ai.to_string()).unwrap();
    std::fs::write(dir.join("crawled_version.json"), crawled.to_string()).unwrap();
    std::fs::write(dir.join("plagiarism_report.pdf"), external_report(report_pages)).unwrap();
}

fn generator() -> ReportGenerator {
    let config = ReportConfig::default();
    let assets = memory_assets(&config);
    ReportGenerator::with_assets(config, Arc::new(assets))
}

fn page_count(path: &Path) -> usize {
    Document::load(path).unwrap().get_pages().len()
}

// =============================================================================
// Pipeline
// =============================================================================

#[tokio::test]
async fn test_full_pipeline_produces_merged_report() {
    let dir = TempDir::new().unwrap();
    write_inputs(dir.path(), &["external cover", "sources", "matches"]);

    let status = generator().generate(dir.path(), "abc123", None).await.unwrap();

    assert!(status.success, "{status:?}");
    assert!(status.first_failed.is_none());
    assert!(status.qr_embedded);
    for stage in Stage::ALL {
        assert!(status.state(stage).is_completed(), "{stage} did not complete");
    }

    let final_path = dir.path().join("MergedFinalReport.pdf");
    assert_eq!(status.output.as_deref(), Some(final_path.as_path()));

    let part1 = page_count(&dir.path().join("part1.pdf"));
    let annotated = page_count(&dir.path().join("header_added.pdf"));
    let plag = page_count(&dir.path().join("plag.pdf"));
    let part2 = page_count(&dir.path().join("part2.pdf"));

    assert!(part1 >= 2);
    assert_eq!(annotated, 3);
    assert_eq!(plag, part1 + annotated - 1);
    assert!(part2 >= 3);
    assert_eq!(page_count(&final_path), plag + part2);
}

#[tokio::test]
async fn test_final_report_is_final_merge_output() {
    let dir = TempDir::new().unwrap();
    write_inputs(dir.path(), &["one", "two"]);

    generator().generate(dir.path(), "id", None).await.unwrap();

    let expected = scan_report_core::merge_pdfs(
        &std::fs::read(dir.path().join("plag.pdf")).unwrap(),
        &std::fs::read(dir.path().join("part2.pdf")).unwrap(),
        scan_report_core::MergeOptions::default(),
    )
    .unwrap();
    let written = std::fs::read(dir.path().join("MergedFinalReport.pdf")).unwrap();
    assert_eq!(
        Document::load_mem(&written).unwrap().get_pages().len(),
        Document::load_mem(&expected).unwrap().get_pages().len()
    );
}

#[tokio::test]
async fn test_single_page_report_skips_qr() {
    let dir = TempDir::new().unwrap();
    write_inputs(dir.path(), &["only page"]);

    let status = generator().generate(dir.path(), "abc", None).await.unwrap();

    assert!(status.success);
    assert!(!status.qr_embedded);
    let part1 = page_count(&dir.path().join("part1.pdf"));
    // The lone external page is the skipped first page
    assert_eq!(page_count(&dir.path().join("plag.pdf")), part1);
}

#[tokio::test]
async fn test_missing_input_halts() {
    let dir = TempDir::new().unwrap();
    write_inputs(dir.path(), &["a", "b"]);
    std::fs::remove_file(dir.path().join("crawled_version.json")).unwrap();

    let err = generator().generate(dir.path(), "abc", None).await.unwrap_err();
    assert!(err.is_not_found());
    assert!(matches!(err, Error::MissingInput(path) if path.ends_with("crawled_version.json")));
    assert!(!dir.path().join("part1.pdf").exists());
}

#[tokio::test]
async fn test_malformed_json_skips_dependents() {
    let dir = TempDir::new().unwrap();
    write_inputs(dir.path(), &["a", "b"]);
    std::fs::write(dir.path().join("ai_result.json"), "{ not json").unwrap();

    let status = generator().generate(dir.path(), "abc", None).await.unwrap();

    assert!(!status.success);
    assert_eq!(status.first_failed, Some(Stage::LoadInputs));
    assert!(matches!(status.state(Stage::LoadInputs), StageState::Failed { error } if error.contains("ai_result.json")));
    for stage in &Stage::ALL[1..] {
        assert!(matches!(status.state(*stage), StageState::Skipped { .. }));
    }
    assert!(!dir.path().join("MergedFinalReport.pdf").exists());
}

#[tokio::test]
async fn test_failed_annotation_keeps_independent_stages() {
    let dir = TempDir::new().unwrap();
    write_inputs(dir.path(), &["a", "b"]);

    let config = ReportConfig::default();
    let mut assets = MemoryAssetRegistry::new();
    for name in asset_names(&config) {
        if name != assets::PDF_HEADER {
            assets.insert(name, png(16, 8));
        }
    }
    let generator = ReportGenerator::with_assets(config, Arc::new(assets));

    let status = generator.generate(dir.path(), "abc", None).await.unwrap();

    assert!(!status.success);
    assert_eq!(status.first_failed, Some(Stage::Annotate));
    assert!(status.state(Stage::CoverPages).is_completed());
    assert!(status.state(Stage::AiPages).is_completed());
    assert!(matches!(status.state(Stage::PlagiarismMerge), StageState::Skipped { .. }));
    assert!(matches!(status.state(Stage::FinalMerge), StageState::Skipped { .. }));
    assert!(dir.path().join("part2.pdf").exists());
}

#[tokio::test]
async fn test_progress_reported_for_every_stage() {
    let dir = TempDir::new().unwrap();
    write_inputs(dir.path(), &["a", "b"]);

    let calls = Arc::new(AtomicUsize::new(0));
    let counter = Arc::clone(&calls);
    generator()
        .generate(
            dir.path(),
            "abc",
            Some(Box::new(move |_: &scan_report_core::StageReport| {
                counter.fetch_add(1, Ordering::SeqCst);
            })),
        )
        .await
        .unwrap();

    assert_eq!(calls.load(Ordering::SeqCst), Stage::ALL.len());
}

// =============================================================================
// Assets on disk
// =============================================================================

#[tokio::test]
async fn test_directory_assets_with_base64_files() {
    let dir = TempDir::new().unwrap();
    write_inputs(dir.path(), &["a", "b"]);

    let assets_dir = dir.path().join("assets");
    std::fs::create_dir(&assets_dir).unwrap();

    let mut config = ReportConfig::default();
    for (i, name) in asset_names(&config).into_iter().enumerate() {
        let bytes = png(12, 6);
        if i % 2 == 0 {
            std::fs::write(assets_dir.join(&name), bytes).unwrap();
        } else {
            let encoded = base64::engine::general_purpose::STANDARD.encode(&bytes);
            std::fs::write(
                assets_dir.join(format!("{name}.b64")),
                format!("data:image/png;base64,{encoded}"),
            )
            .unwrap();
        }
    }
    config.assets_dir = assets_dir;

    let status = ReportGenerator::new(config).generate(dir.path(), "abc", None).await.unwrap();
    assert!(status.success, "{status:?}");
}

#[tokio::test]
async fn test_status_json_shape() {
    let dir = TempDir::new().unwrap();
    write_inputs(dir.path(), &["a", "b"]);

    let status = generator().generate(dir.path(), "abc", None).await.unwrap();
    let json = serde_json::to_value(&status).unwrap();

    assert_eq!(json["success"], true);
    assert_eq!(json["stages"].as_array().unwrap().len(), 6);
    assert_eq!(json["stages"][5]["stage"], "final_merge");
    assert_eq!(json["stages"][5]["state"], "completed");
    assert!(json["output"].as_str().unwrap().ends_with("MergedFinalReport.pdf"));
}
