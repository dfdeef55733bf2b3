//! Plagiarism detail page.

use crate::assets::{ICON_BATCH, ICON_FILTERED, ICON_INTERNAL_DATABASE, ICON_INTERNET, ICON_REPOSITORY};
use crate::config::{ReportConfig, Rgb};
use crate::draw::{ArcStyle, LinkedText, draw_linked_text, draw_score_arc};
use crate::error::Result;
use crate::model::ScanResult;
use crate::pdf::{Canvas, Point, Rect, ReportDocument, TextStyle};

use super::{
    CONTENT_TOP, MARGIN, RIGHT_COLUMN, ROW_HEIGHT, draw_footer, draw_heading, draw_paragraph, draw_table_row,
    ensure_space,
};

/// Source categories shown as icons, in display order.
const SOURCE_ICONS: [(&str, &str); 5] = [
    (ICON_REPOSITORY, "Repository"),
    (ICON_INTERNAL_DATABASE, "Internal Database"),
    (ICON_FILTERED, "Filtered / Excluded"),
    (ICON_INTERNET, "Internet Sources"),
    (ICON_BATCH, "Current Batch"),
];

const ICON_SIZE: f32 = 12.0;
const ICON_CELL: f32 = 38.0;
const ICON_ROW_HEIGHT: f32 = 24.0;
const ICONS_PER_FIRST_ROW: usize = 3;

pub(crate) const TABLE_WIDTHS: [f32; 3] = [80.0, 50.0, 60.0];

const DOT_RADIUS: f32 = 1.8;

const DESCRIPTION: &str = "The document was compared against public internet sources, \
    the institutional repository and documents submitted in the same batch. Matching \
    passages are grouped by how closely they follow the source text.";

const CATEGORY_BLOCKS: [(&str, &str); 4] = [
    (
        "Identical",
        "Identical words are one-to-one matches with a source, with no changes to wording or order.",
    ),
    (
        "Minor Changes",
        "Minor changes are near matches where a few words were altered, such as tense or word form.",
    ),
    (
        "Paraphrased",
        "Paraphrased passages express the meaning of a source using substantially different wording.",
    ),
    (
        "Omitted Words",
        "Omitted words were excluded from the scan, for example quotations, references or templates.",
    ),
];

const SOURCE_SECTIONS: [(&str, &str); 3] = [
    (
        "Internal Database",
        "Matches against documents previously submitted to your organisation's private repository.",
    ),
    (
        "Filtered / Excluded",
        "Sources that matched but were filtered out by the scan settings and do not count toward the score.",
    ),
    (
        "Current Batch",
        "Matches against other documents submitted in the same batch as this one.",
    ),
];

/// Append the plagiarism detail page.
///
/// Missing scan values render as zeros; nothing here fails on data.
pub fn build_plagiarism_page(doc: &mut ReportDocument, scan: &ScanResult, config: &ReportConfig) -> Result<()> {
    let palette = &config.palette;
    let score = &scan.results.score;

    doc.add_page();
    draw_footer(doc, config)?;
    let width = doc.page_size().width;

    let mut y = draw_heading(doc, CONTENT_TOP, "Plagiarism Detection Details", 16.0, palette.brand) + 4.0;

    let style = ArcStyle::detail(palette.brand);
    draw_score_arc(
        doc,
        score.aggregated_score,
        Point::new(width - MARGIN - style.radius - 2.0, CONTENT_TOP + style.radius - 4.0),
        &style,
    );

    y = draw_source_icons(doc, y + 6.0)? + 4.0;

    let header = TextStyle::bold(10.0).with_color(Rgb::white());
    let cell = TextStyle::regular(10.0);
    y = draw_table_row(doc, MARGIN, y, &TABLE_WIDTHS, &["Category", "Percentage", "Words"], header, Some(palette.brand));
    let rows = [
        ("Identical", score.identical_words, palette.identical),
        ("Minor Changes", score.minor_changed_words, palette.minor_changes),
        ("Paraphrased", score.related_meaning_words, palette.paraphrased),
        ("Omitted Words", scan.scanned_document.total_excluded, palette.omitted),
    ];
    for (name, words, color) in rows {
        // Category dot at the right edge of the first cell
        doc.fill_circle(
            Point::new(MARGIN + TABLE_WIDTHS[0] - 5.0, y + ROW_HEIGHT / 2.0),
            DOT_RADIUS,
            color,
        );
        let words = words.to_string();
        y = draw_table_row(doc, MARGIN, y, &TABLE_WIDTHS, &[name, "0%", words.as_str()], cell, None);
    }

    y = draw_paragraph(doc, MARGIN, y + 8.0, width - 2.0 * MARGIN, DESCRIPTION, 10.0) + 6.0;

    y = draw_two_column_blocks(doc, config, y, &CATEGORY_BLOCKS)?;
    draw_full_width_sections(doc, config, y, &SOURCE_SECTIONS)?;

    Ok(())
}

/// Five icons with captions, three on the first row and two centred below.
fn draw_source_icons(doc: &mut ReportDocument, y: f32) -> Result<f32> {
    let page_width = doc.page_size().width;
    let caption = TextStyle::regular(8.0);

    let mut y = y;
    for row in SOURCE_ICONS.chunks(ICONS_PER_FIRST_ROW) {
        let row_width = row.len() as f32 * ICON_CELL;
        let start = (page_width - row_width) / 2.0;
        for (i, (icon, label)) in row.iter().enumerate() {
            let cell_x = start + i as f32 * ICON_CELL;
            // Centre the icon and caption inside their cell
            let image = doc.asset_image(icon)?;
            let height = ICON_SIZE * doc.image_aspect_ratio(image);
            doc.image(image, Rect::new(cell_x + (ICON_CELL - ICON_SIZE) / 2.0, y, ICON_SIZE, height));
            let text_x = cell_x + (ICON_CELL - caption.width_of(label)) / 2.0;
            doc.text(Point::new(text_x, y + ICON_SIZE + 5.0), label, caption);
        }
        y += ICON_ROW_HEIGHT;
    }

    Ok(y)
}

/// Titled linked-text blocks laid out in pairs; returns the cursor below.
pub(crate) fn draw_two_column_blocks(
    doc: &mut ReportDocument,
    config: &ReportConfig,
    y: f32,
    blocks: &[(&str, &str)],
) -> Result<f32> {
    let mut y = y;
    for pair in blocks.chunks(2) {
        y = ensure_space(doc, config, y, 30.0)?;
        let mut next_y = y;
        for (column, (title, body)) in pair.iter().enumerate() {
            let x = if column == 0 { MARGIN } else { RIGHT_COLUMN };
            doc.text(Point::new(x, y), title, TextStyle::bold(11.0).with_color(config.palette.brand));
            let block = LinkedText::new(body, "Learn more", &config.learn_more_url, config.palette.link);
            next_y = next_y.max(draw_linked_text(doc, x, y + 5.0, &block));
        }
        y = next_y + 2.0;
    }
    Ok(y)
}

/// Full-width titled linked-text sections; returns the cursor below.
pub(crate) fn draw_full_width_sections(
    doc: &mut ReportDocument,
    config: &ReportConfig,
    y: f32,
    sections: &[(&str, &str)],
) -> Result<f32> {
    let mut y = y;
    for (title, body) in sections {
        y = ensure_space(doc, config, y, 20.0)?;
        doc.text(Point::new(MARGIN, y), title, TextStyle::bold(11.0).with_color(config.palette.brand));
        let block = LinkedText::new(body, "Learn more", &config.learn_more_url, config.palette.link).full_width();
        y = draw_linked_text(doc, MARGIN, y + 5.0, &block) + 2.0;
    }
    Ok(y)
}
