//! AI-content analysis pages: summary, phrase insights and highlighted text.

use std::collections::HashSet;

use tracing::{debug, info};

use crate::config::{ReportConfig, Rgb};
use crate::draw::{ArcStyle, draw_score_arc};
use crate::error::Result;
use crate::model::{AiDetectionResult, CrawledVersion, RankedPhrase};
use crate::pdf::{Canvas, FontFace, PT_PER_MM, Point, Rect, ReportDocument, TextStyle, wrap_text};
use crate::util::{format_percent, tokenize};

use super::plagiarism::{TABLE_WIDTHS, draw_full_width_sections, draw_two_column_blocks};
use super::{
    CONTENT_BOTTOM, CONTENT_TOP, MARGIN, RIGHT_COLUMN, draw_heading, draw_paragraph, draw_table_row, ensure_space,
    start_page,
};

const DESCRIPTION: &str = "The text was analysed for patterns typical of machine-generated \
    writing. The share below is the fraction of words that belong to passages flagged as \
    likely AI-generated.";

const CATEGORY_BLOCKS: [(&str, &str); 2] = [
    (
        "AI Content",
        "Passages whose phrasing and word choice closely follow patterns of language models.",
    ),
    (
        "Human Content",
        "Passages consistent with human writing, including natural variation in style and structure.",
    ),
];

const SECTIONS: [(&str, &str); 2] = [
    (
        "How detection works",
        "Each phrase is compared against how often it appears in AI-generated and human-written reference text.",
    ),
    (
        "Interpreting the results",
        "A high AI share is an indication, not proof. Review flagged passages before drawing conclusions.",
    ),
];

const COLUMN_WIDTH: f32 = 90.0;
const BADGE_WIDTH: f32 = 24.0;
const BADGE_HEIGHT: f32 = 7.0;
const PHRASE_SIZE: f32 = 9.0;
const PHRASE_LINE: f32 = 4.0;

const HIGHLIGHT_SIZE: f32 = 10.0;
const HIGHLIGHT_LINE: f32 = 6.0;

/// Append the three AI analysis pages.
pub fn build_ai_pages(
    doc: &mut ReportDocument,
    ai: &AiDetectionResult,
    crawled: &CrawledVersion,
    config: &ReportConfig,
) -> Result<()> {
    let text = crawled.text.value.as_str();
    build_ai_summary_page(doc, ai, config)?;
    build_phrase_pages(doc, ai, text, config)?;
    build_highlight_pages(doc, ai, text, config)?;
    info!("AI analysis pages built ({} total)", doc.page_count());
    Ok(())
}

/// Summary page with the AI share gauge and word counts.
pub fn build_ai_summary_page(doc: &mut ReportDocument, ai: &AiDetectionResult, config: &ReportConfig) -> Result<()> {
    let palette = &config.palette;
    let summary = ai.summary();
    debug!(
        "AI words {} of {} ({:?})",
        summary.total_ai_words, summary.total_words, summary.ai_share
    );

    let top = start_page(doc, config)?;
    let width = doc.page_size().width;

    let mut y = draw_heading(doc, top, "AI Content Detection", 16.0, palette.brand) + 4.0;

    let style = ArcStyle::detail(palette.ai);
    draw_score_arc(
        doc,
        summary.ai_percentage(),
        Point::new(width - MARGIN - style.radius - 2.0, top + style.radius - 4.0),
        &style,
    );

    y += 34.0;
    for (name, color) in [("AI", palette.ai), ("Human", palette.human)] {
        doc.fill_circle(Point::new(MARGIN + 2.0, y - 1.5), 1.8, color);
        doc.text(Point::new(MARGIN + 6.0, y), name, TextStyle::regular(10.0));
        y += 6.0;
    }
    y += 4.0;

    let header = TextStyle::bold(10.0).with_color(Rgb::white());
    let cell = TextStyle::regular(10.0);
    y = draw_table_row(doc, MARGIN, y, &TABLE_WIDTHS, &["Category", "Percentage", "Words"], header, Some(palette.brand));
    let rows = [
        ("AI", summary.ai_percentage(), summary.total_ai_words),
        ("Human", summary.human_percentage(), summary.human_words),
    ];
    for (name, percentage, words) in rows {
        let percentage = format_percent(percentage);
        let words = words.to_string();
        y = draw_table_row(doc, MARGIN, y, &TABLE_WIDTHS, &[name, percentage.as_str(), words.as_str()], cell, None);
    }

    y = draw_paragraph(doc, MARGIN, y + 8.0, width - 2.0 * MARGIN, DESCRIPTION, 10.0) + 6.0;
    y = draw_two_column_blocks(doc, config, y, &CATEGORY_BLOCKS)?;
    draw_full_width_sections(doc, config, y, &SECTIONS)?;

    Ok(())
}

/// Phrase insight pages: flagged phrases ranked by AI/human ratio.
pub fn build_phrase_pages(doc: &mut ReportDocument, ai: &AiDetectionResult, text: &str, config: &ReportConfig) -> Result<()> {
    let top = start_page(doc, config)?;
    let mut y = draw_heading(doc, top, "Phrase Insights", 16.0, config.palette.brand) + 6.0;

    let phrases = ai.ranked_phrases(text);
    if phrases.is_empty() {
        doc.text(Point::new(MARGIN, y), "No AI phrases were detected.", TextStyle::regular(10.0));
        return Ok(());
    }

    for row in phrases.chunks(2) {
        let height = row
            .iter()
            .map(phrase_height)
            .fold(0.0_f32, f32::max);
        if height > CONTENT_BOTTOM - CONTENT_TOP {
            for phrase in row {
                y = draw_long_phrase(doc, config, y, phrase)?;
            }
            continue;
        }
        y = ensure_space(doc, config, y, height)?;
        for (column, phrase) in row.iter().enumerate() {
            let x = if column == 0 { MARGIN } else { RIGHT_COLUMN };
            draw_phrase(doc, config, x, y, phrase);
        }
        y += height;
    }

    Ok(())
}

fn phrase_lines(phrase: &RankedPhrase) -> Vec<String> {
    wrap_text(&phrase.phrase, FontFace::Regular, PHRASE_SIZE, COLUMN_WIDTH)
}

fn phrase_height(phrase: &RankedPhrase) -> f32 {
    BADGE_HEIGHT + 4.0 + phrase_lines(phrase).len() as f32 * PHRASE_LINE + 2.0 * PHRASE_LINE + 4.0
}

fn draw_phrase(canvas: &mut dyn Canvas, config: &ReportConfig, x: f32, y: f32, phrase: &RankedPhrase) {
    draw_badge(canvas, config, x, y, phrase);

    let mut line_y = y + BADGE_HEIGHT + 5.0;
    for line in phrase_lines(phrase) {
        canvas.text(Point::new(x, line_y), &line, TextStyle::regular(PHRASE_SIZE));
        line_y += PHRASE_LINE;
    }

    draw_stats(canvas, config, x, line_y, phrase);
}

/// Lay out a phrase taller than a page in the left column, breaking pages
/// between lines. Returns the cursor below the phrase.
fn draw_long_phrase(doc: &mut ReportDocument, config: &ReportConfig, y: f32, phrase: &RankedPhrase) -> Result<f32> {
    let mut y = ensure_space(doc, config, y, BADGE_HEIGHT + 5.0 + PHRASE_LINE)?;
    draw_badge(doc, config, MARGIN, y, phrase);
    y += BADGE_HEIGHT + 5.0;

    let lines = phrase_lines(phrase);
    debug!("Phrase of {} lines spans pages", lines.len());
    for line in lines {
        y = ensure_space(doc, config, y, PHRASE_LINE)?;
        doc.text(Point::new(MARGIN, y), &line, TextStyle::regular(PHRASE_SIZE));
        y += PHRASE_LINE;
    }

    y = ensure_space(doc, config, y, 2.0 * PHRASE_LINE)?;
    draw_stats(doc, config, MARGIN, y, phrase);
    Ok(y + 2.0 * PHRASE_LINE + 4.0)
}

fn draw_badge(canvas: &mut dyn Canvas, config: &ReportConfig, x: f32, y: f32, phrase: &RankedPhrase) {
    canvas.fill_rounded_rect(Rect::new(x, y, BADGE_WIDTH, BADGE_HEIGHT), 2.0, config.palette.highlight);
    let badge = format!("{:.2}", phrase.ratio);
    let badge_style = TextStyle::bold(9.0);
    canvas.text(
        Point::new(x + (BADGE_WIDTH - badge_style.width_of(&badge)) / 2.0, y + BADGE_HEIGHT * 0.68),
        &badge,
        badge_style,
    );
}

fn draw_stats(canvas: &mut dyn Canvas, config: &ReportConfig, x: f32, y: f32, phrase: &RankedPhrase) {
    let palette = &config.palette;
    let stat = TextStyle::regular(8.0).with_color(Rgb::dark_gray());
    canvas.text(Point::new(x, y), &format!("AI: {}", phrase.ai_count), stat.with_color(palette.ai));
    canvas.text(
        Point::new(x, y + PHRASE_LINE),
        &format!("Human: {}", phrase.human_count),
        stat.with_color(palette.human),
    );
}

/// Full text with every AI span's starting word highlighted.
pub fn build_highlight_pages(
    doc: &mut ReportDocument,
    ai: &AiDetectionResult,
    text: &str,
    config: &ReportConfig,
) -> Result<()> {
    let top = start_page(doc, config)?;
    let mut y = draw_heading(doc, top, "Highlighted Text", 16.0, config.palette.brand) + 8.0;

    let starts: HashSet<usize> = ai.explain.patterns.text.words.starts.iter().copied().collect();
    let style = TextStyle::regular(HIGHLIGHT_SIZE);
    let font_height = HIGHLIGHT_SIZE / PT_PER_MM;
    let space = style.width_of(" ");
    let right = doc.page_size().width - MARGIN;

    let mut x = MARGIN;
    for (index, token) in tokenize(text).into_iter().enumerate() {
        let width = style.width_of(token);
        if x > MARGIN && x + width > right {
            x = MARGIN;
            y += HIGHLIGHT_LINE;
            if y > CONTENT_BOTTOM {
                debug!("Highlighted text continues on a new page");
                y = start_page(doc, config)?;
            }
        }

        if starts.contains(&index) {
            doc.fill_rect(
                Rect::new(x - 0.5, y - font_height * 0.8, width + 1.0, font_height * 1.1),
                config.palette.highlight,
            );
        }
        doc.text(Point::new(x, y), token, style);
        x += width + space;
    }

    Ok(())
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::model::{AiMatch, AiResultEntry, SpanText, WordSpans};
    use crate::pages::tests::test_document;
    use crate::pdf::tests::all_page_texts;

    fn detection(starts: Vec<usize>, lengths: Vec<usize>, ai: Vec<f64>, human: Vec<f64>, total: usize) -> AiDetectionResult {
        let mut result = AiDetectionResult::default();
        result.explain.patterns.text.words = WordSpans { starts, lengths };
        result.explain.patterns.statistics.ai_count = ai;
        result.explain.patterns.statistics.human_count = human;
        result.results = vec![AiResultEntry {
            matches: vec![AiMatch {
                text: SpanText {
                    words: WordSpans {
                        starts: vec![0],
                        lengths: vec![total],
                    },
                },
            }],
        }];
        result
    }

    fn crawled(text: &str) -> CrawledVersion {
        let mut crawled = CrawledVersion::default();
        crawled.text.value = text.to_string();
        crawled
    }

    #[test]
    fn test_summary_page_percentages() {
        let ai = detection(vec![0, 5], vec![3, 2], vec![1.0, 1.0], vec![1.0, 1.0], 10);
        let mut doc = test_document();
        build_ai_summary_page(&mut doc, &ai, &ReportConfig::default()).unwrap();

        let pages = all_page_texts(&doc.to_pdf_bytes().unwrap());
        let texts = &pages[0];
        assert_eq!(texts.iter().filter(|t| t.as_str() == "50%").count(), 3);
        assert!(texts.iter().any(|t| t == "5"));
    }

    #[test]
    fn test_summary_without_word_count_is_zero() {
        let ai = detection(vec![0], vec![3], vec![1.0], vec![1.0], 0);
        let mut doc = test_document();
        build_ai_summary_page(&mut doc, &ai, &ReportConfig::default()).unwrap();

        let texts = &all_page_texts(&doc.to_pdf_bytes().unwrap())[0];
        assert!(!texts.iter().any(|t| t.contains("NaN") || t.contains("inf")));
        assert_eq!(texts.iter().filter(|t| t.as_str() == "0%").count(), 3);
    }

    #[test]
    fn test_phrases_ranked_by_ratio() {
        let ai = detection(vec![0, 2], vec![2, 2], vec![1.0, 9.0], vec![1.0, 3.0], 4);
        let mut doc = test_document();
        build_phrase_pages(&mut doc, &ai, "alpha beta gamma delta", &ReportConfig::default()).unwrap();

        let texts = &all_page_texts(&doc.to_pdf_bytes().unwrap())[0];
        let first = texts.iter().position(|t| t == "gamma delta").unwrap();
        let second = texts.iter().position(|t| t == "alpha beta").unwrap();
        assert!(first < second);
        assert!(texts.iter().any(|t| t == "3.00"));
        assert!(texts.iter().any(|t| t == "AI: 9"));
        assert!(texts.iter().any(|t| t == "Human: 3"));
    }

    #[test]
    fn test_phrase_pages_break() {
        let n = 60;
        let ai = detection(vec![0; n], vec![1; n], vec![1.0; n], vec![1.0; n], 1);
        let mut doc = test_document();
        build_phrase_pages(&mut doc, &ai, "word", &ReportConfig::default()).unwrap();
        assert!(doc.page_count() > 1);
    }

    #[test]
    fn test_long_phrase_stays_above_footer() {
        let words = 1500;
        let text = "word ".repeat(words);
        let ai = detection(vec![0], vec![words], vec![2.0], vec![1.0], words);
        let mut doc = test_document();
        build_phrase_pages(&mut doc, &ai, &text, &ReportConfig::default()).unwrap();
        assert!(doc.page_count() > 1);

        let bytes = doc.to_pdf_bytes().unwrap();
        let loaded = lopdf::Document::load_mem(&bytes).unwrap();
        let lowest = (doc.page_size().height - CONTENT_BOTTOM) * PT_PER_MM - 0.01;
        let mut drawn_words = 0;
        for page_id in loaded.get_pages().into_values() {
            let content = lopdf::content::Content::decode(&loaded.get_page_content(page_id).unwrap()).unwrap();
            for pair in content.operations.windows(2) {
                if pair[0].operator != "Td" || pair[1].operator != "Tj" {
                    continue;
                }
                let shown = String::from_utf8_lossy(pair[1].operands[0].as_str().unwrap()).into_owned();
                if !shown.starts_with("word") {
                    continue;
                }
                let y = pair[0].operands[1].as_float().unwrap();
                assert!(y >= lowest, "phrase line at {y}pt is below the content area");
                drawn_words += shown.split_whitespace().count();
            }
        }
        assert_eq!(drawn_words, words);
    }

    #[test]
    fn test_no_phrases_message() {
        let mut doc = test_document();
        build_phrase_pages(&mut doc, &AiDetectionResult::default(), "", &ReportConfig::default()).unwrap();
        let texts = &all_page_texts(&doc.to_pdf_bytes().unwrap())[0];
        assert!(texts.iter().any(|t| t == "No AI phrases were detected."));
    }

    #[test]
    fn test_out_of_range_spans_do_not_crash() {
        let ai = detection(vec![50], vec![4], vec![2.0], vec![1.0], 3);
        let mut doc = test_document();
        build_ai_pages(&mut doc, &ai, &crawled("one two three"), &ReportConfig::default()).unwrap();
        assert_eq!(doc.page_count(), 3);
    }

    #[test]
    fn test_highlight_only_span_starts() {
        let ai = detection(vec![1, 3], vec![2, 1], vec![1.0, 1.0], vec![1.0, 1.0], 5);
        let config = ReportConfig::default();

        let mut canvas_doc = test_document();
        build_highlight_pages(&mut canvas_doc, &ai, "a b c d e", &config).unwrap();

        // Only the highlight fills use the highlight colour
        let bytes = canvas_doc.to_pdf_bytes().unwrap();
        let doc = lopdf::Document::load_mem(&bytes).unwrap();
        let page_id = doc.get_pages()[&1];
        let content = lopdf::content::Content::decode(&doc.get_page_content(page_id).unwrap()).unwrap();
        let highlight = config.palette.highlight;
        let fills = content
            .operations
            .iter()
            .filter(|op| op.operator == "rg")
            .filter(|op| {
                op.operands
                    .first()
                    .and_then(|o| o.as_float().ok())
                    .is_some_and(|r| (r - highlight.r).abs() < 1e-4)
                    && op
                        .operands
                        .get(2)
                        .and_then(|o| o.as_float().ok())
                        .is_some_and(|b| (b - highlight.b).abs() < 1e-4)
            })
            .count();
        assert_eq!(fills, 2);
    }

    #[test]
    fn test_long_text_breaks_pages() {
        let text = "lorem ipsum dolor sit amet ".repeat(600);
        let mut doc = test_document();
        build_highlight_pages(&mut doc, &AiDetectionResult::default(), &text, &ReportConfig::default()).unwrap();
        assert!(doc.page_count() > 1);
    }
}
