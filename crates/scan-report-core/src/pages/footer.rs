//! Footer shared by every generated page.

use crate::assets::CERTIFICATION;
use crate::config::{ReportConfig, Rgb};
use crate::error::Result;
use crate::pdf::{Canvas, Point, Rect, ReportDocument, TextStyle, wrap_text};

use super::{MARGIN, draw_asset};

const FOOTER_TOP: f32 = 264.0;
const FOOTER_TEXT_SIZE: f32 = 7.0;
const FOOTER_TEXT_WIDTH: f32 = 140.0;
const CERTIFICATION_WIDTH: f32 = 30.0;
const ICON_SIZE: f32 = 6.0;
const ICON_SPACING: f32 = 9.0;

/// Shared page footer: disclaimer, certification badge and social icons.
pub fn draw_footer(doc: &mut ReportDocument, config: &ReportConfig) -> Result<()> {
    let width = doc.page_size().width;
    doc.fill_rect(Rect::new(MARGIN, FOOTER_TOP - 2.0, width - 2.0 * MARGIN, 0.3), Rgb::light_gray());

    let style = TextStyle::regular(FOOTER_TEXT_SIZE).with_color(Rgb::dark_gray());
    let mut y = FOOTER_TOP + 3.0;
    for line in wrap_text(&config.footer_text, style.face, style.size, FOOTER_TEXT_WIDTH) {
        doc.text(Point::new(MARGIN, y), &line, style);
        y += 3.0;
    }

    draw_asset(doc, CERTIFICATION, width - MARGIN - CERTIFICATION_WIDTH, FOOTER_TOP, CERTIFICATION_WIDTH)?;

    let icons_y = y + 2.0;
    for (i, social) in config.social_links.iter().enumerate() {
        let icon = doc.asset_image(&social.icon)?;
        let rect = Rect::new(MARGIN + i as f32 * ICON_SPACING, icons_y, ICON_SIZE, ICON_SIZE);
        doc.image(icon, rect);
        doc.link(rect, &social.url);
    }

    Ok(())
}
