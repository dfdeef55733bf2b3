//! Reusable drawing helpers shared by the page builders.

mod arc;
mod linked_text;

pub use arc::{ARC_SEGMENTS, ArcStyle, arc_path, clamp_score, draw_score_arc};
pub use linked_text::{LINE_HEIGHT, LINK_ADVANCE, LinkedText, draw_linked_text};
