mod annotate;
mod canvas;
mod font;
mod image;
mod merge;
mod objects;
mod page_index;
mod qr;

pub use annotate::{AnnotateRequest, AnnotatedPdf, annotate_pdf, page_count};
pub use canvas::{Canvas, ImageHandle, PageSize, Point, Rect, ReportDocument, TextStyle};
pub use font::{FontFace, PT_PER_MM, wrap_text};
pub use self::image::PdfImage;
pub use merge::{MergeOptions, merge_pdfs};
pub use page_index::PageIndex;
pub use qr::qr_raster;

#[cfg(test)]
pub(crate) use canvas::tests::{Drawn, RecordingCanvas};
