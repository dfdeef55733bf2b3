//! Circular score gauge.

use std::f32::consts::{FRAC_PI_2, TAU};

use crate::config::Rgb;
use crate::pdf::{Canvas, FontFace, PT_PER_MM, Point, TextStyle};
use crate::util::format_percent;

/// Number of straight segments approximating the arc.
pub const ARC_SEGMENTS: usize = 100;

/// Sizing and colours of a score gauge.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ArcStyle {
    pub radius: f32,
    pub line_width: f32,
    pub font_size: f32,
    pub track: Rgb,
    pub color: Rgb,
}

impl ArcStyle {
    /// Gauge on the cover page.
    pub const fn cover(color: Rgb) -> Self {
        Self {
            radius: 14.0,
            line_width: 3.0,
            font_size: 12.0,
            track: Rgb::light_gray(),
            color,
        }
    }

    /// Larger gauge in the corner of the detail pages.
    pub const fn detail(color: Rgb) -> Self {
        Self {
            radius: 18.0,
            line_width: 4.0,
            font_size: 15.0,
            track: Rgb::light_gray(),
            color,
        }
    }
}

/// Clamp a score into 0..=100, mapping NaN to 0.
pub fn clamp_score(score: f64) -> f64 {
    if score.is_nan() { 0.0 } else { score.clamp(0.0, 100.0) }
}

/// Points of an arc starting at 12 o'clock and sweeping clockwise in
/// proportion to `score / 100`.
///
/// Always returns `ARC_SEGMENTS + 1` points; for a score of 0 they all
/// coincide.
#[allow(clippy::cast_possible_truncation)]
pub fn arc_path(score: f64, center: Point, radius: f32) -> Vec<Point> {
    let sweep = (clamp_score(score) / 100.0) as f32 * TAU;
    let start = -FRAC_PI_2;

    (0..=ARC_SEGMENTS)
        .map(|i| {
            let angle = start + sweep * i as f32 / ARC_SEGMENTS as f32;
            // y grows downward, so increasing angles run clockwise
            Point::new(center.x + radius * angle.cos(), center.y + radius * angle.sin())
        })
        .collect()
}

/// Draw the gauge track, the score arc and the centred percentage.
pub fn draw_score_arc(canvas: &mut dyn Canvas, score: f64, center: Point, style: &ArcStyle) {
    let score = clamp_score(score);

    canvas.stroke_polyline(&arc_path(100.0, center, style.radius), style.line_width, style.track);

    if score > 0.0 {
        canvas.stroke_polyline(&arc_path(score, center, style.radius), style.line_width, style.color);
    }

    let label = format_percent(score);
    let text = TextStyle::new(FontFace::Bold, style.font_size, Rgb::black());
    let width = text.width_of(&label);
    // Half the cap height below centre
    let baseline = center.y + style.font_size / PT_PER_MM * 0.35;
    canvas.text(Point::new(center.x - width / 2.0, baseline), &label, text);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pdf::{Drawn, RecordingCanvas};

    const CENTER: Point = Point::new(50.0, 50.0);

    fn close(a: Point, b: Point) -> bool {
        (a.x - b.x).abs() < 1e-3 && (a.y - b.y).abs() < 1e-3
    }

    #[test]
    fn test_arc_always_has_100_segments() {
        for score in [0.0, 12.5, 50.0, 100.0] {
            assert_eq!(arc_path(score, CENTER, 10.0).len(), ARC_SEGMENTS + 1);
        }
    }

    #[test]
    fn test_arc_starts_at_top() {
        let path = arc_path(37.0, CENTER, 10.0);
        assert!(close(path[0], Point::new(50.0, 40.0)));
    }

    #[test]
    fn test_zero_score_has_no_length() {
        let path = arc_path(0.0, CENTER, 10.0);
        assert!(path.iter().all(|p| close(*p, path[0])));
    }

    #[test]
    fn test_quarter_sweeps_clockwise() {
        let path = arc_path(25.0, CENTER, 10.0);
        // Clockwise from the top ends at 3 o'clock
        assert!(close(*path.last().unwrap_or(&CENTER), Point::new(60.0, 50.0)));
    }

    #[test]
    fn test_full_score_closes_circle() {
        let path = arc_path(100.0, CENTER, 10.0);
        assert!(close(path[0], path[ARC_SEGMENTS]));
    }

    #[test]
    fn test_score_clamped() {
        assert!((clamp_score(f64::NAN)).abs() < f64::EPSILON);
        assert!((clamp_score(-5.0)).abs() < f64::EPSILON);
        assert!((clamp_score(180.0) - 100.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_zero_score_draws_track_only() {
        let mut canvas = RecordingCanvas::new();
        draw_score_arc(&mut canvas, 0.0, CENTER, &ArcStyle::cover(Rgb::blue()));

        let polylines = canvas
            .calls
            .iter()
            .filter(|c| matches!(c, Drawn::Polyline(..)))
            .count();
        assert_eq!(polylines, 1);
        assert_eq!(canvas.texts(), vec!["0%"]);
    }

    #[test]
    fn test_full_score_draws_arc() {
        let mut canvas = RecordingCanvas::new();
        draw_score_arc(&mut canvas, 100.0, CENTER, &ArcStyle::detail(Rgb::blue()));

        assert!(canvas.calls.iter().any(
            |c| matches!(c, Drawn::Polyline(points, color) if *color == Rgb::blue() && points.len() == ARC_SEGMENTS + 1)
        ));
        assert_eq!(canvas.texts(), vec!["100%"]);
    }
}
