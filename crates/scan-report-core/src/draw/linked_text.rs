//! Wrapped paragraph followed by a clickable label.

use crate::config::Rgb;
use crate::pdf::{Canvas, FontFace, PT_PER_MM, Point, Rect, TextStyle, wrap_text};

/// Vertical advance per body line (mm).
pub const LINE_HEIGHT: f32 = 4.0;

/// Vertical advance after the link label (mm).
pub const LINK_ADVANCE: f32 = 6.0;

const BODY_SIZE: f32 = 9.0;
const LABEL_SIZE: f32 = 9.0;

/// Horizontal space excluded from the wrap width (mm).
const WRAP_INSET: f32 = 20.0;

/// A paragraph with a trailing link, e.g. an explanatory block.
#[derive(Debug, Clone)]
pub struct LinkedText<'a> {
    pub body: &'a str,
    pub label: &'a str,
    pub url: &'a str,
    pub link_color: Rgb,
    /// Fraction of the usable width the paragraph occupies (2 = half)
    pub width_divisor: f32,
}

impl<'a> LinkedText<'a> {
    /// A half-width block.
    pub const fn new(body: &'a str, label: &'a str, url: &'a str, link_color: Rgb) -> Self {
        Self {
            body,
            label,
            url,
            link_color,
            width_divisor: 2.0,
        }
    }

    #[must_use]
    pub const fn full_width(mut self) -> Self {
        self.width_divisor = 1.0;
        self
    }
}

/// Draw `text` at `(x, y)` and return the y just below it.
pub fn draw_linked_text(canvas: &mut dyn Canvas, x: f32, y: f32, text: &LinkedText<'_>) -> f32 {
    let divisor = if text.width_divisor > 0.0 { text.width_divisor } else { 1.0 };
    let max_width = (canvas.page_size().width - WRAP_INSET) / divisor;

    let body_style = TextStyle::regular(BODY_SIZE);
    let lines = wrap_text(text.body, body_style.face, body_style.size, max_width);

    let mut y = y;
    for (i, line) in lines.iter().enumerate() {
        canvas.text(Point::new(x, y + i as f32 * LINE_HEIGHT), line, body_style);
    }
    y += lines.len() as f32 * LINE_HEIGHT;

    let label_style = TextStyle::new(FontFace::Regular, LABEL_SIZE, text.link_color);
    canvas.text(Point::new(x, y), text.label, label_style);

    let label_height = LABEL_SIZE / PT_PER_MM;
    canvas.link(
        Rect::new(x, y - label_height, label_style.width_of(text.label), label_height * 1.3),
        text.url,
    );

    y + LINK_ADVANCE
}
