//! The report's first page.

use chrono::{DateTime, NaiveDateTime, Utc};
use tracing::debug;

use crate::assets::HEADER_BANNER;
use crate::config::{ReportConfig, Rgb};
use crate::draw::{ArcStyle, draw_score_arc};
use crate::error::Result;
use crate::model::ScanResult;
use crate::pdf::{Canvas, Point, Rect, ReportDocument, TextStyle};

use super::{MARGIN, ROW_HEIGHT, draw_footer, draw_heading, draw_table_row};

const BANNER_MAX_HEIGHT: f32 = 45.0;
const METADATA_WIDTHS: [f32; 2] = [45.0, 80.0];
const LEGEND_X: f32 = 60.0;
const DOT_RADIUS: f32 = 1.8;

const DATE_FORMAT: &str = "%m/%d/%Y, %I:%M:%S %p";

/// Format a scan timestamp as `MM/DD/YYYY, hh:mm:ss AM` in UTC.
///
/// Timestamps that are not ISO-8601 are returned verbatim.
pub fn format_scan_time(raw: &str) -> String {
    if let Ok(parsed) = DateTime::parse_from_rfc3339(raw) {
        return parsed.with_timezone(&Utc).format(DATE_FORMAT).to_string();
    }
    if let Ok(parsed) = NaiveDateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M:%S%.f") {
        return parsed.format(DATE_FORMAT).to_string();
    }
    debug!("Unparseable scan time {raw:?}, rendering verbatim");
    raw.to_string()
}

/// Append the cover page summarising the plagiarism scan.
pub fn build_cover_page(doc: &mut ReportDocument, scan: &ScanResult, config: &ReportConfig) -> Result<()> {
    let palette = &config.palette;
    let document = &scan.scanned_document;
    let score = &scan.results.score;

    doc.add_page();
    let width = doc.page_size().width;

    let banner = doc.asset_image(HEADER_BANNER)?;
    let banner_height = (width * doc.image_aspect_ratio(banner)).min(BANNER_MAX_HEIGHT);
    doc.image(banner, Rect::new(0.0, 0.0, width, banner_height));

    draw_footer(doc, config)?;

    let mut y = banner_height + 14.0;
    y = draw_heading(doc, y, "Plagiarism & AI Content Report", 20.0, palette.brand) + 6.0;

    let filename = if document.metadata.filename.is_empty() {
        "Untitled document"
    } else {
        document.metadata.filename.as_str()
    };
    doc.text(Point::new(MARGIN, y), filename, TextStyle::regular(12.0));
    y += 8.0;

    let scan_time = format_scan_time(&document.creation_time);
    let total_words = document.total_words.to_string();
    let label = TextStyle::bold(10.0);
    let value = TextStyle::regular(10.0);
    for (name, content) in [
        ("Scan Time", scan_time.as_str()),
        ("Total Pages", "1"),
        ("Total Words", total_words.as_str()),
    ] {
        draw_table_row(doc, MARGIN, y, &METADATA_WIDTHS[..1], &[name], label, Some(Rgb::light_gray()));
        y = draw_table_row(doc, MARGIN + METADATA_WIDTHS[0], y, &METADATA_WIDTHS[1..], &[content], value, None);
    }

    y += 12.0;
    y = draw_heading(doc, y, "Plagiarism Detection", 14.0, palette.brand) + 8.0;

    let style = ArcStyle::cover(palette.brand);
    draw_score_arc(doc, score.aggregated_score, Point::new(MARGIN + style.radius + 4.0, y + style.radius), &style);

    let legend = [
        ("Identical", score.identical_words, palette.identical),
        ("Minor Changes", score.minor_changed_words, palette.minor_changes),
        ("Paraphrased", score.related_meaning_words, palette.paraphrased),
    ];
    let mut row_y = y;
    for (name, words, color) in legend {
        doc.fill_circle(Point::new(LEGEND_X, row_y + ROW_HEIGHT / 2.0), DOT_RADIUS, color);
        doc.text(Point::new(LEGEND_X + 5.0, row_y + ROW_HEIGHT * 0.68), name, TextStyle::regular(10.0));
        doc.text(
            Point::new(LEGEND_X + 60.0, row_y + ROW_HEIGHT * 0.68),
            &format!("{words} words"),
            TextStyle::bold(10.0),
        );
        row_y += ROW_HEIGHT + 2.0;
    }

    Ok(())
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::model::{ScannedDocument, ScannedMetadata, ScanResults, ScoreBreakdown};
    use crate::pages::tests::test_document;
    use crate::pdf::tests::all_page_texts;

    fn scan() -> ScanResult {
        ScanResult {
            scanned_document: ScannedDocument {
                metadata: ScannedMetadata {
                    filename: "essay.docx".to_string(),
                },
                creation_time: "2024-03-05T14:07:09Z".to_string(),
                total_words: 812,
                total_excluded: 4,
            },
            results: ScanResults {
                score: ScoreBreakdown {
                    aggregated_score: 42.5,
                    identical_words: 120,
                    minor_changed_words: 30,
                    related_meaning_words: 15,
                },
            },
        }
    }

    #[test]
    fn test_format_scan_time() {
        assert_eq!(format_scan_time("2024-03-05T14:07:09Z"), "03/05/2024, 02:07:09 PM");
        assert_eq!(format_scan_time("2024-03-05T09:07:09.123"), "03/05/2024, 09:07:09 AM");
        assert_eq!(format_scan_time("2024-03-05T14:07:09+02:00"), "03/05/2024, 12:07:09 PM");
    }

    #[test]
    fn test_unparseable_time_verbatim() {
        assert_eq!(format_scan_time("yesterday"), "yesterday");
        assert_eq!(format_scan_time(""), "");
    }

    #[test]
    fn test_cover_page_content() {
        let mut doc = test_document();
        build_cover_page(&mut doc, &scan(), &ReportConfig::default()).unwrap();
        assert_eq!(doc.page_count(), 1);

        let texts = &all_page_texts(&doc.to_pdf_bytes().unwrap())[0];
        for expected in [
            "essay.docx",
            "03/05/2024, 02:07:09 PM",
            "1",
            "812",
            "42.5%",
            "Identical",
            "Minor Changes",
            "Paraphrased",
            "120 words",
            "30 words",
            "15 words",
        ] {
            assert!(texts.iter().any(|t| t == expected), "missing {expected}");
        }
    }

    #[test]
    fn test_cover_page_with_empty_scan() {
        let mut doc = test_document();
        build_cover_page(&mut doc, &ScanResult::default(), &ReportConfig::default()).unwrap();

        let texts = &all_page_texts(&doc.to_pdf_bytes().unwrap())[0];
        assert!(texts.iter().any(|t| t == "0%"));
        assert!(texts.iter().any(|t| t == "Untitled document"));
    }
}
