//! Scan Report CLI - Command line tool for composing the final scan report.

use anyhow::{Context, Result};
use clap::Parser;
use indicatif::{ProgressBar, ProgressStyle};
use scan_report_core::{ReportConfig, ReportGenerator, Stage, StageReport, StageState};
use std::path::PathBuf;
use tracing::{Level, info};
use tracing_subscriber::FmtSubscriber;

#[derive(Parser, Debug)]
#[command(name = "scan-report")]
#[command(author, version, about = "Compose the final PDF report of a document scan", long_about = None)]
struct Args {
    /// Working directory holding the scan outputs
    #[arg(default_value = ".")]
    dir: PathBuf,

    /// Identifier encoded in the report's QR code
    #[arg(short, long, env = "SCAN_REPORT_ID")]
    identifier: String,

    /// Directory of the image assets
    #[arg(short, long, env = "SCAN_REPORT_ASSETS")]
    assets: Option<PathBuf>,

    /// Base URL of the QR code link
    #[arg(long, env = "SCAN_REPORT_QR_BASE_URL")]
    qr_base_url: Option<String>,

    /// Link target of the header band on annotated pages
    #[arg(long, env = "SCAN_REPORT_HEADER_LINK")]
    header_link: Option<String>,

    /// Config file path
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Verbose output
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,
}

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env file if present (before parsing args so env vars are available)
    dotenvy::dotenv().ok();

    let args = Args::parse();

    let log_level = match args.verbose {
        0 => Level::WARN,
        1 => Level::INFO,
        2 => Level::DEBUG,
        _ => Level::TRACE,
    };

    FmtSubscriber::builder()
        .with_max_level(log_level)
        .with_target(false)
        .init();

    let mut config = if let Some(config_path) = &args.config {
        ReportConfig::from_file(config_path).context("Failed to load config file")?
    } else {
        ReportConfig::load()
    };

    // Override config with CLI arguments
    if let Some(assets) = args.assets {
        config.assets_dir = assets;
    }
    if let Some(url) = args.qr_base_url {
        config.qr_base_url = url;
    }
    if args.header_link.is_some() {
        config.header_link = args.header_link;
    }

    info!("Composing report in {}", args.dir.display());

    #[allow(clippy::cast_possible_truncation)]
    let pb = ProgressBar::new(Stage::ALL.len() as u64);
    // Template is hardcoded and valid, unwrap is safe
    #[allow(clippy::unwrap_used)]
    pb.set_style(
        ProgressStyle::default_bar()
            .template("{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} {msg}")
            .unwrap()
            .progress_chars("#>-"),
    );

    let generator = ReportGenerator::new(config);
    let progress_bar = pb.clone();
    let status = generator
        .generate(
            &args.dir,
            &args.identifier,
            Some(Box::new(move |report: &StageReport| {
                progress_bar.set_message(report.stage.to_string());
                match &report.state {
                    StageState::Failed { error } => {
                        progress_bar.println(format!("{} failed: {error}", report.stage));
                    }
                    StageState::Skipped { reason } => {
                        progress_bar.println(format!("{} skipped: {reason}", report.stage));
                    }
                    _ => {}
                }
                progress_bar.inc(1);
            })),
        )
        .await
        .context(format!("Failed to compose report in {}", args.dir.display()))?;

    pb.finish_with_message(if status.success { "done" } else { "failed" });

    let json = serde_json::to_string_pretty(&status).context("Failed to serialize status")?;

    // CLI output is intentional
    #[allow(clippy::print_stdout)]
    {
        println!("{json}");
    }

    if !status.success {
        anyhow::bail!(
            "Report generation failed at {}",
            status.first_failed.map_or("final_merge", Stage::as_str)
        );
    }

    Ok(())
}
