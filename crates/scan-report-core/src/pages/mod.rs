//! Builders for the generated report pages.
//!
//! Every builder appends pages to a [`ReportDocument`] and threads a vertical
//! cursor (millimetres from the top edge) through its drawing calls.

mod ai;
mod cover;
mod footer;
mod plagiarism;

pub use ai::{build_ai_pages, build_ai_summary_page, build_highlight_pages, build_phrase_pages};
pub use cover::{build_cover_page, format_scan_time};
pub use footer::draw_footer;
pub use plagiarism::build_plagiarism_page;

use crate::config::{ReportConfig, Rgb};
use crate::error::Result;
use crate::pdf::{Canvas, FontFace, Point, Rect, ReportDocument, TextStyle};

/// Left and right page margin.
pub(crate) const MARGIN: f32 = 10.0;

/// First usable y on a page without a banner.
pub(crate) const CONTENT_TOP: f32 = 18.0;

/// Content must end above the footer band.
pub(crate) const CONTENT_BOTTOM: f32 = 258.0;

pub(crate) const ROW_HEIGHT: f32 = 7.0;

/// Horizontal start of the right column in two-column layouts.
pub(crate) const RIGHT_COLUMN: f32 = 107.0;

/// Append a page with the shared footer and return the top cursor.
pub(crate) fn start_page(doc: &mut ReportDocument, config: &ReportConfig) -> Result<f32> {
    doc.add_page();
    draw_footer(doc, config)?;
    Ok(CONTENT_TOP)
}

/// Break to a new page if `height` more millimetres would not fit.
pub(crate) fn ensure_space(
    doc: &mut ReportDocument,
    config: &ReportConfig,
    y: f32,
    height: f32,
) -> Result<f32> {
    if y + height > CONTENT_BOTTOM {
        tracing::debug!("Page break at y={y:.1}");
        start_page(doc, config)
    } else {
        Ok(y)
    }
}

/// Draw a page or section title and return the cursor below it.
pub(crate) fn draw_heading(canvas: &mut dyn Canvas, y: f32, text: &str, size: f32, color: Rgb) -> f32 {
    canvas.text(Point::new(MARGIN, y), text, TextStyle::new(FontFace::Bold, size, color));
    y + size * 0.55
}

/// Draw a bordered table row and return the cursor below it.
pub(crate) fn draw_table_row(
    canvas: &mut dyn Canvas,
    x: f32,
    y: f32,
    widths: &[f32],
    cells: &[&str],
    style: TextStyle,
    fill: Option<Rgb>,
) -> f32 {
    let mut cell_x = x;
    for (width, cell) in widths.iter().zip(cells) {
        let rect = Rect::new(cell_x, y, *width, ROW_HEIGHT);
        if let Some(fill) = fill {
            canvas.fill_rect(rect, fill);
        }
        canvas.stroke_rect(rect, 0.2, Rgb::dark_gray());
        canvas.text(Point::new(cell_x + 2.0, y + ROW_HEIGHT * 0.68), cell, style);
        cell_x += width;
    }
    y + ROW_HEIGHT
}

/// Draw a block of wrapped plain text and return the cursor below it.
pub(crate) fn draw_paragraph(canvas: &mut dyn Canvas, x: f32, y: f32, width: f32, text: &str, size: f32) -> f32 {
    let style = TextStyle::regular(size);
    let line_height = size * 0.45;
    let lines = crate::pdf::wrap_text(text, style.face, style.size, width);
    for (i, line) in lines.iter().enumerate() {
        canvas.text(Point::new(x, y + i as f32 * line_height), line, style);
    }
    y + lines.len() as f32 * line_height
}

/// Place an asset image at `x, y` scaled to `width`, returning its height.
pub(crate) fn draw_asset(doc: &mut ReportDocument, name: &str, x: f32, y: f32, width: f32) -> Result<f32> {
    let image = doc.asset_image(name)?;
    let height = width * doc.image_aspect_ratio(image);
    doc.image(image, Rect::new(x, y, width, height));
    Ok(height)
}
