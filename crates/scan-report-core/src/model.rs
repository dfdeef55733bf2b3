//! Input records read from the scan pipeline's JSON files.
//!
//! Every field carries a serde default so that incomplete input degrades to
//! zero/empty values instead of failing to parse. Only structurally invalid
//! JSON is an error.

use std::path::Path;

use serde::Deserialize;
use serde::de::DeserializeOwned;
use tracing::warn;

use crate::error::{Error, Result};
use crate::util::tokenize;

// =============================================================================
// Plagiarism scan
// =============================================================================

/// Result of a plagiarism scan (`scan_results.json`).
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ScanResult {
    pub scanned_document: ScannedDocument,
    pub results: ScanResults,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ScannedDocument {
    pub metadata: ScannedMetadata,
    /// ISO-8601 timestamp of the scan
    pub creation_time: String,
    pub total_words: u64,
    pub total_excluded: u64,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct ScannedMetadata {
    pub filename: String,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct ScanResults {
    pub score: ScoreBreakdown,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ScoreBreakdown {
    /// Overall plagiarism percentage
    pub aggregated_score: f64,
    pub identical_words: u64,
    pub minor_changed_words: u64,
    pub related_meaning_words: u64,
}

// =============================================================================
// AI detection
// =============================================================================

/// Result of AI-content detection (`ai_result.json`).
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct AiDetectionResult {
    pub explain: AiExplain,
    pub results: Vec<AiResultEntry>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct AiExplain {
    pub patterns: AiPatterns,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct AiPatterns {
    pub text: SpanText,
    pub statistics: PatternStatistics,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct SpanText {
    pub words: WordSpans,
}

/// Parallel arrays of token start indices and span lengths.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct WordSpans {
    pub starts: Vec<usize>,
    pub lengths: Vec<usize>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct PatternStatistics {
    pub ai_count: Vec<f64>,
    pub human_count: Vec<f64>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct AiResultEntry {
    pub matches: Vec<AiMatch>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct AiMatch {
    pub text: SpanText,
}

/// One zipped row of the span and statistics arrays.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PhraseSpan {
    pub start: usize,
    pub length: usize,
    pub ai_count: f64,
    pub human_count: f64,
}

impl PhraseSpan {
    /// AI-to-human occurrence ratio, 0 when there are no human occurrences.
    pub fn ratio(&self) -> f64 {
        Proportion::of(self.ai_count, self.human_count).value_or_zero()
    }

    /// The phrase this span covers, clamped to the token bounds.
    ///
    /// A span starting past the end of the text yields an empty string.
    pub fn phrase(&self, tokens: &[&str]) -> String {
        let start = self.start.min(tokens.len());
        let end = self.start.saturating_add(self.length).min(tokens.len());
        tokens[start..end].join(" ")
    }
}

/// A span ready for display: phrase text plus its statistics.
#[derive(Debug, Clone, PartialEq)]
pub struct RankedPhrase {
    pub phrase: String,
    pub ratio: f64,
    pub ai_count: f64,
    pub human_count: f64,
}

impl AiDetectionResult {
    /// Total word count reported by the detector, 0 when absent.
    pub fn total_words(&self) -> u64 {
        self.results
            .first()
            .and_then(|r| r.matches.first())
            .and_then(|m| m.text.words.lengths.first())
            .map_or(0, |&n| n as u64)
    }

    /// Zip the parallel arrays into spans.
    ///
    /// Arrays of unequal length are truncated to the shortest one.
    pub fn spans(&self) -> Vec<PhraseSpan> {
        let words = &self.explain.patterns.text.words;
        let stats = &self.explain.patterns.statistics;

        let len = words
            .starts
            .len()
            .min(words.lengths.len())
            .min(stats.ai_count.len())
            .min(stats.human_count.len());

        if [
            words.starts.len(),
            words.lengths.len(),
            stats.ai_count.len(),
            stats.human_count.len(),
        ]
        .iter()
        .any(|&n| n != len)
        {
            warn!(
                starts = words.starts.len(),
                lengths = words.lengths.len(),
                ai_count = stats.ai_count.len(),
                human_count = stats.human_count.len(),
                "AI span arrays differ in length, using the first {}",
                len
            );
        }

        (0..len)
            .map(|i| PhraseSpan {
                start: words.starts[i],
                length: words.lengths[i],
                ai_count: stats.ai_count[i],
                human_count: stats.human_count[i],
            })
            .collect()
    }

    /// Summary statistics for the AI analysis page.
    pub fn summary(&self) -> AiSummary {
        let total_ai_words: u64 = self
            .explain
            .patterns
            .text
            .words
            .lengths
            .iter()
            .map(|&n| n as u64)
            .sum();
        AiSummary::new(total_ai_words, self.total_words())
    }

    /// Spans resolved against the text and sorted by descending ratio.
    pub fn ranked_phrases(&self, text: &str) -> Vec<RankedPhrase> {
        let tokens = tokenize(text);
        let mut ranked: Vec<RankedPhrase> = self
            .spans()
            .iter()
            .map(|span| RankedPhrase {
                phrase: span.phrase(&tokens),
                ratio: span.ratio(),
                ai_count: span.ai_count,
                human_count: span.human_count,
            })
            .collect();
        ranked.sort_by(|a, b| b.ratio.total_cmp(&a.ratio));
        ranked
    }
}

// =============================================================================
// Crawled text
// =============================================================================

/// The scanned text as crawled (`crawled_version.json`).
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct CrawledVersion {
    pub text: CrawledText,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct CrawledText {
    pub value: String,
}

// =============================================================================
// Derived values
// =============================================================================

/// Result of a guarded division.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Proportion {
    Known(f64),
    /// The denominator was zero (or the inputs were not finite)
    InsufficientData,
}

impl Proportion {
    pub fn of(part: f64, whole: f64) -> Self {
        if whole == 0.0 || !whole.is_finite() || !part.is_finite() {
            Self::InsufficientData
        } else {
            Self::Known(part / whole)
        }
    }

    pub const fn value_or_zero(self) -> f64 {
        match self {
            Self::Known(v) => v,
            Self::InsufficientData => 0.0,
        }
    }
}

/// Word counts and shares shown on the AI analysis page.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AiSummary {
    pub total_ai_words: u64,
    pub total_words: u64,
    pub human_words: u64,
    pub ai_share: Proportion,
}

impl AiSummary {
    pub fn new(total_ai_words: u64, total_words: u64) -> Self {
        Self {
            total_ai_words,
            total_words,
            human_words: total_words.saturating_sub(total_ai_words),
            ai_share: Proportion::of(total_ai_words as f64, total_words as f64),
        }
    }

    /// AI percentage, 0 when there is no word count to divide by.
    pub const fn ai_percentage(&self) -> f64 {
        match self.ai_share {
            Proportion::Known(v) => v * 100.0,
            Proportion::InsufficientData => 0.0,
        }
    }

    /// Human percentage, 0 when there is no word count to divide by. Never
    /// negative, matching the saturated `human_words`.
    pub const fn human_percentage(&self) -> f64 {
        match self.ai_share {
            Proportion::Known(v) => (100.0 - v * 100.0).max(0.0),
            Proportion::InsufficientData => 0.0,
        }
    }
}

// =============================================================================
// Loading
// =============================================================================

/// Parse a JSON input, attributing errors to `path`.
pub fn parse_json<T: DeserializeOwned>(path: &Path, bytes: &[u8]) -> Result<T> {
    serde_json::from_slice(bytes).map_err(|source| Error::Json {
        path: path.to_path_buf(),
        source,
    })
}
