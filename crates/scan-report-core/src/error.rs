//! Error types for report generation.

use std::path::PathBuf;

use thiserror::Error;

/// Which side of a merge failed to load.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MergeInput {
    First,
    Second,
}

impl std::fmt::Display for MergeInput {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::First => f.write_str("first"),
            Self::Second => f.write_str("second"),
        }
    }
}

/// Unified error type for scan-report-core
///
/// This enum encompasses all error cases that can occur in the library:
/// - Input loading (missing files, malformed JSON)
/// - PDF operations (loading, merging, saving)
/// - Asset and image handling (registry lookups, decoding, QR generation)
/// - Configuration and general I/O
///
/// Degenerate report data (zero word counts, empty or out-of-range spans) is
/// never an error; builders render placeholder values instead.
#[derive(Error, Debug)]
pub enum Error {
    // ==========================================================================
    // Input Errors
    // ==========================================================================
    /// A required input file does not exist
    #[error("missing input: {}", .0.display())]
    MissingInput(PathBuf),

    /// An input file is not valid JSON for its schema
    #[error("failed to parse {}: {source}", path.display())]
    Json {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    // ==========================================================================
    // PDF Errors
    // ==========================================================================
    /// One of the merge inputs could not be parsed as a PDF
    #[error("failed to load {input} merge input: {reason}")]
    Merge { input: MergeInput, reason: String },

    /// Invalid page number requested
    #[error("invalid page number {page} (document has {total} pages)")]
    PdfInvalidPage { page: usize, total: usize },

    /// Failed to save a PDF
    #[error("failed to save PDF: {0}")]
    PdfSave(String),

    /// Error from the lopdf library
    #[error("lopdf error: {0}")]
    Lopdf(String),

    // ==========================================================================
    // Asset Errors
    // ==========================================================================
    /// The asset registry has no entry with this name
    #[error("asset not found: {0}")]
    AssetNotFound(String),

    /// The asset exists but its base64 payload is malformed
    #[error("failed to decode asset {name}: {reason}")]
    AssetDecode { name: String, reason: String },

    /// Image bytes could not be decoded
    #[error("failed to decode image: {0}")]
    Image(String),

    /// The QR payload could not be encoded
    #[error("failed to encode QR code: {0}")]
    QrEncode(String),

    // ==========================================================================
    // Configuration Errors
    // ==========================================================================
    /// Failed to load configuration file
    #[error("failed to load config: {0}")]
    ConfigLoad(String),

    // ==========================================================================
    // I/O Errors
    // ==========================================================================
    /// General I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl Error {
    /// True for errors a request handler should report as "not found".
    pub const fn is_not_found(&self) -> bool {
        matches!(self, Self::MissingInput(_))
    }
}

pub type Result<T> = std::result::Result<T, Error>;
