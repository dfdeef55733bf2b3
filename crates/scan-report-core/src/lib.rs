//! Scan Report Core Library
//!
//! This library composes the final PDF report of a document scan:
//! - Cover, plagiarism detail and AI analysis pages drawn from scan JSON
//! - Header, footer and QR branding of an externally produced PDF
//! - Merging of the generated and annotated documents
//! - A staged pipeline with per-stage status reporting

pub mod assets;
pub mod config;
pub mod draw;
pub mod error;
pub mod model;
pub mod pages;
pub mod pdf;
pub mod report;
pub mod util;

pub use assets::{AssetRegistry, DirAssetRegistry, MemoryAssetRegistry};
pub use config::{FileNames, Palette, ReportConfig, Rgb, SocialLink};
pub use error::{Error, MergeInput, Result};
pub use model::{AiDetectionResult, AiSummary, CrawledVersion, Proportion, ScanResult};
pub use pdf::{AnnotateRequest, AnnotatedPdf, MergeOptions, ReportDocument, annotate_pdf, merge_pdfs};
pub use report::{ProgressCallback, ReportGenerator, ReportInputs, ReportStatus, Stage, StageReport, StageState};
