//! Drawing surface for generated report pages.
//!
//! # Coordinate System
//!
//! Builders lay pages out in **millimetres** with a **top-left origin**:
//! - (0, 0) is the top-left corner of the page
//! - X increases to the right
//! - Y increases downward
//!
//! PDF uses points with a bottom-left origin, so [`ReportDocument`] converts
//! every coordinate when it emits operators:
//! ```text
//! pdf_x = x * PT_PER_MM
//! pdf_y = (page_height - y) * PT_PER_MM
//! ```
//!
//! There is no hidden drawing state: colour and font travel with each call,
//! and the vertical layout cursor is threaded through the drawing helpers by
//! value.

use std::collections::HashMap;
use std::sync::Arc;

use lopdf::content::{Content, Operation};
use lopdf::{Dictionary, Document, Object, ObjectId, Stream, StringFormat};
use tracing::debug;

use super::font::{FontFace, PT_PER_MM, encode_win_ansi};
use super::image::PdfImage;
use crate::assets::AssetRegistry;
use crate::config::Rgb;
use crate::error::{Error, Result};

/// Magic number for approximating a quarter circle with a cubic Bézier.
const KAPPA: f32 = 0.552_284_8;

// =============================================================================
// Geometry
// =============================================================================

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Point {
    pub x: f32,
    pub y: f32,
}

impl Point {
    pub const fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }
}

/// An axis-aligned rectangle; `y` is the top edge.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Rect {
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
}

impl Rect {
    pub const fn new(x: f32, y: f32, width: f32, height: f32) -> Self {
        Self { x, y, width, height }
    }

    pub fn bottom(&self) -> f32 {
        self.y + self.height
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PageSize {
    pub width: f32,
    pub height: f32,
}

impl PageSize {
    /// ISO A4 portrait in millimetres.
    pub const A4: Self = Self {
        width: 210.0,
        height: 297.0,
    };
}

/// Font, size (points) and colour of a text run.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TextStyle {
    pub face: FontFace,
    pub size: f32,
    pub color: Rgb,
}

impl TextStyle {
    pub const fn new(face: FontFace, size: f32, color: Rgb) -> Self {
        Self { face, size, color }
    }

    pub const fn regular(size: f32) -> Self {
        Self::new(FontFace::Regular, size, Rgb::black())
    }

    pub const fn bold(size: f32) -> Self {
        Self::new(FontFace::Bold, size, Rgb::black())
    }

    #[must_use]
    pub const fn with_color(mut self, color: Rgb) -> Self {
        self.color = color;
        self
    }

    /// Width of `text` in millimetres.
    pub fn width_of(&self, text: &str) -> f32 {
        self.face.string_width(text, self.size)
    }
}

/// Handle to an image registered with a document.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ImageHandle {
    index: usize,
}

// =============================================================================
// Canvas
// =============================================================================

/// Drawing primitives the layout helpers are written against.
///
/// Text is positioned by its baseline origin.
pub trait Canvas {
    fn page_size(&self) -> PageSize;

    fn fill_rect(&mut self, rect: Rect, color: Rgb);

    fn stroke_rect(&mut self, rect: Rect, line_width: f32, color: Rgb);

    fn fill_rounded_rect(&mut self, rect: Rect, radius: f32, color: Rgb);

    fn fill_circle(&mut self, center: Point, radius: f32, color: Rgb);

    /// Stroke a connected polyline through `points`.
    fn stroke_polyline(&mut self, points: &[Point], line_width: f32, color: Rgb);

    fn text(&mut self, origin: Point, text: &str, style: TextStyle);

    fn image(&mut self, image: ImageHandle, rect: Rect);

    /// Make `rect` a clickable region that opens `url`.
    fn link(&mut self, rect: Rect, url: &str);
}

// =============================================================================
// Report Document
// =============================================================================

#[derive(Debug, Default)]
struct PageContent {
    operations: Vec<Operation>,
    images: Vec<usize>,
    links: Vec<(Rect, String)>,
}

/// A document built page by page from drawing calls.
///
/// Drawing always targets the most recently added page. Pages are only ever
/// appended.
pub struct ReportDocument {
    size: PageSize,
    pages: Vec<PageContent>,
    images: Vec<PdfImage>,
    image_names: HashMap<String, ImageHandle>,
    assets: Arc<dyn AssetRegistry>,
}

impl std::fmt::Debug for ReportDocument {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ReportDocument")
            .field("size", &self.size)
            .field("pages", &self.pages.len())
            .field("images", &self.images.len())
            .finish_non_exhaustive()
    }
}

impl ReportDocument {
    /// Create an empty A4 document drawing images from `assets`.
    pub fn new(assets: Arc<dyn AssetRegistry>) -> Self {
        Self::with_size(assets, PageSize::A4)
    }

    pub fn with_size(assets: Arc<dyn AssetRegistry>, size: PageSize) -> Self {
        Self {
            size,
            pages: Vec::new(),
            images: Vec::new(),
            image_names: HashMap::new(),
            assets,
        }
    }

    /// Start a new page; subsequent drawing goes there.
    pub fn add_page(&mut self) {
        self.pages.push(PageContent::default());
        debug!("Started page {}", self.pages.len());
    }

    pub fn page_count(&self) -> usize {
        self.pages.len()
    }

    /// Load a named asset once and return a handle for drawing it.
    pub fn asset_image(&mut self, name: &str) -> Result<ImageHandle> {
        if let Some(handle) = self.image_names.get(name) {
            return Ok(*handle);
        }

        let bytes = self.assets.load_asset(name)?;
        let handle = self.add_image(PdfImage::decode(&bytes)?);
        self.image_names.insert(name.to_string(), handle);
        Ok(handle)
    }

    /// Register an already decoded image.
    pub fn add_image(&mut self, image: PdfImage) -> ImageHandle {
        self.images.push(image);
        ImageHandle {
            index: self.images.len() - 1,
        }
    }

    /// Height divided by width of a registered image.
    pub fn image_aspect_ratio(&self, image: ImageHandle) -> f32 {
        self.images
            .get(image.index)
            .map_or(1.0, PdfImage::aspect_ratio)
    }

    fn current(&mut self) -> &mut PageContent {
        if self.pages.is_empty() {
            self.add_page();
        }
        let last = self.pages.len() - 1;
        &mut self.pages[last]
    }

    fn push(&mut self, operation: Operation) {
        self.current().operations.push(operation);
    }

    fn pdf_x(x: f32) -> f32 {
        x * PT_PER_MM
    }

    fn pdf_y(&self, y: f32) -> f32 {
        (self.size.height - y) * PT_PER_MM
    }

    /// Rectangle operands `x y w h` in PDF space.
    fn pdf_rect(&self, rect: Rect) -> Vec<Object> {
        vec![
            Object::Real(Self::pdf_x(rect.x)),
            Object::Real(self.pdf_y(rect.bottom())),
            Object::Real(rect.width * PT_PER_MM),
            Object::Real(rect.height * PT_PER_MM),
        ]
    }

    fn set_fill(&mut self, color: Rgb) {
        self.push(Operation::new(
            "rg",
            vec![Object::Real(color.r), Object::Real(color.g), Object::Real(color.b)],
        ));
    }

    fn set_stroke(&mut self, color: Rgb, line_width: f32) {
        self.push(Operation::new(
            "RG",
            vec![Object::Real(color.r), Object::Real(color.g), Object::Real(color.b)],
        ));
        self.push(Operation::new("w", vec![Object::Real(line_width * PT_PER_MM)]));
    }

    fn move_to(&mut self, p: Point) {
        let y = self.pdf_y(p.y);
        self.push(Operation::new("m", vec![Object::Real(Self::pdf_x(p.x)), Object::Real(y)]));
    }

    fn line_to(&mut self, p: Point) {
        let y = self.pdf_y(p.y);
        self.push(Operation::new("l", vec![Object::Real(Self::pdf_x(p.x)), Object::Real(y)]));
    }

    fn curve_to(&mut self, c1: Point, c2: Point, end: Point) {
        let operands = vec![
            Object::Real(Self::pdf_x(c1.x)),
            Object::Real(self.pdf_y(c1.y)),
            Object::Real(Self::pdf_x(c2.x)),
            Object::Real(self.pdf_y(c2.y)),
            Object::Real(Self::pdf_x(end.x)),
            Object::Real(self.pdf_y(end.y)),
        ];
        self.push(Operation::new("c", operands));
    }

    /// Serialize the document to PDF bytes.
    pub fn to_pdf_bytes(&self) -> Result<Vec<u8>> {
        let mut doc = Document::with_version("1.5");
        let pages_id = doc.new_object_id();

        let regular_id = FontFace::Regular.add_to_document(&mut doc);
        let bold_id = FontFace::Bold.add_to_document(&mut doc);
        let fonts = Dictionary::from_iter([
            (FontFace::Regular.resource_name(), Object::Reference(regular_id)),
            (FontFace::Bold.resource_name(), Object::Reference(bold_id)),
        ]);

        let image_ids: Vec<ObjectId> = self
            .images
            .iter()
            .map(|image| image.add_to_document(&mut doc))
            .collect();

        let media_box = Object::Array(vec![
            Object::Integer(0),
            Object::Integer(0),
            Object::Real(self.size.width * PT_PER_MM),
            Object::Real(self.size.height * PT_PER_MM),
        ]);

        let mut kids = Vec::with_capacity(self.pages.len());
        for page in &self.pages {
            let content = Content {
                operations: page.operations.clone(),
            };
            let content_bytes = content
                .encode()
                .map_err(|e| Error::PdfSave(format!("Failed to encode page content: {e}")))?;
            let content_id = doc.add_object(Stream::new(Dictionary::new(), content_bytes));

            let mut xobjects = Dictionary::new();
            for &index in &page.images {
                xobjects.set(image_resource_name(index), Object::Reference(image_ids[index]));
            }

            let resources = Dictionary::from_iter([
                ("Font", Object::Dictionary(fonts.clone())),
                ("XObject", Object::Dictionary(xobjects)),
            ]);

            let annots: Vec<Object> = page
                .links
                .iter()
                .map(|(rect, url)| Object::Reference(doc.add_object(self.link_annotation(*rect, url))))
                .collect();

            let mut page_dict = Dictionary::from_iter([
                ("Type", Object::Name(b"Page".to_vec())),
                ("Parent", Object::Reference(pages_id)),
                ("MediaBox", media_box.clone()),
                ("Contents", Object::Reference(content_id)),
                ("Resources", Object::Dictionary(resources)),
            ]);
            if !annots.is_empty() {
                page_dict.set("Annots", Object::Array(annots));
            }

            kids.push(Object::Reference(doc.add_object(page_dict)));
        }

        #[allow(clippy::cast_possible_wrap)]
        let count = kids.len() as i64;
        let pages_dict = Dictionary::from_iter([
            ("Type", Object::Name(b"Pages".to_vec())),
            ("Kids", Object::Array(kids)),
            ("Count", Object::Integer(count)),
        ]);
        doc.objects.insert(pages_id, Object::Dictionary(pages_dict));

        let catalog_id = doc.add_object(Dictionary::from_iter([
            ("Type", Object::Name(b"Catalog".to_vec())),
            ("Pages", Object::Reference(pages_id)),
        ]));
        doc.trailer.set("Root", Object::Reference(catalog_id));

        doc.compress();

        let mut output = Vec::new();
        doc.save_to(&mut output)
            .map_err(|e| Error::PdfSave(format!("Failed to save PDF: {e}")))?;

        Ok(output)
    }

    fn link_annotation(&self, rect: Rect, url: &str) -> Dictionary {
        link_annotation(
            [
                Self::pdf_x(rect.x),
                self.pdf_y(rect.bottom()),
                Self::pdf_x(rect.x + rect.width),
                self.pdf_y(rect.y),
            ],
            url,
        )
    }
}

/// XObject resource name of a registered image.
fn image_resource_name(index: usize) -> String {
    format!("Im{index}")
}

/// A borderless URI link annotation over `[x0, y0, x1, y1]` (PDF space).
pub fn link_annotation(rect: [f32; 4], url: &str) -> Dictionary {
    Dictionary::from_iter([
        ("Type", Object::Name(b"Annot".to_vec())),
        ("Subtype", Object::Name(b"Link".to_vec())),
        ("Rect", Object::Array(rect.iter().map(|&v| Object::Real(v)).collect())),
        (
            "Border",
            Object::Array(vec![Object::Integer(0), Object::Integer(0), Object::Integer(0)]),
        ),
        (
            "A",
            Object::Dictionary(Dictionary::from_iter([
                ("Type", Object::Name(b"Action".to_vec())),
                ("S", Object::Name(b"URI".to_vec())),
                ("URI", Object::String(url.as_bytes().to_vec(), StringFormat::Literal)),
            ])),
        ),
    ])
}

/// Operators placing an image XObject over `[x, y, w, h]` (PDF space).
pub fn image_operations(name: &str, x: f32, y: f32, width: f32, height: f32) -> Vec<Operation> {
    vec![
        Operation::new("q", vec![]),
        Operation::new(
            "cm",
            vec![
                Object::Real(width),
                Object::Real(0.0),
                Object::Real(0.0),
                Object::Real(height),
                Object::Real(x),
                Object::Real(y),
            ],
        ),
        Operation::new("Do", vec![Object::Name(name.as_bytes().to_vec())]),
        Operation::new("Q", vec![]),
    ]
}

impl Canvas for ReportDocument {
    fn page_size(&self) -> PageSize {
        self.size
    }

    fn fill_rect(&mut self, rect: Rect, color: Rgb) {
        self.set_fill(color);
        let operands = self.pdf_rect(rect);
        self.push(Operation::new("re", operands));
        self.push(Operation::new("f", vec![]));
    }

    fn stroke_rect(&mut self, rect: Rect, line_width: f32, color: Rgb) {
        self.set_stroke(color, line_width);
        let operands = self.pdf_rect(rect);
        self.push(Operation::new("re", operands));
        self.push(Operation::new("S", vec![]));
    }

    fn fill_rounded_rect(&mut self, rect: Rect, radius: f32, color: Rgb) {
        let r = radius.clamp(0.0, rect.width.min(rect.height) / 2.0);
        if r <= 0.0 {
            self.fill_rect(rect, color);
            return;
        }

        let k = r * KAPPA;
        let (left, top) = (rect.x, rect.y);
        let (right, bottom) = (rect.x + rect.width, rect.bottom());

        self.set_fill(color);
        self.move_to(Point::new(left + r, top));
        self.line_to(Point::new(right - r, top));
        self.curve_to(
            Point::new(right - r + k, top),
            Point::new(right, top + r - k),
            Point::new(right, top + r),
        );
        self.line_to(Point::new(right, bottom - r));
        self.curve_to(
            Point::new(right, bottom - r + k),
            Point::new(right - r + k, bottom),
            Point::new(right - r, bottom),
        );
        self.line_to(Point::new(left + r, bottom));
        self.curve_to(
            Point::new(left + r - k, bottom),
            Point::new(left, bottom - r + k),
            Point::new(left, bottom - r),
        );
        self.line_to(Point::new(left, top + r));
        self.curve_to(
            Point::new(left, top + r - k),
            Point::new(left + r - k, top),
            Point::new(left + r, top),
        );
        self.push(Operation::new("f", vec![]));
    }

    fn fill_circle(&mut self, center: Point, radius: f32, color: Rgb) {
        let (cx, cy, r) = (center.x, center.y, radius);
        let k = r * KAPPA;

        self.set_fill(color);
        self.move_to(Point::new(cx + r, cy));
        self.curve_to(Point::new(cx + r, cy + k), Point::new(cx + k, cy + r), Point::new(cx, cy + r));
        self.curve_to(Point::new(cx - k, cy + r), Point::new(cx - r, cy + k), Point::new(cx - r, cy));
        self.curve_to(Point::new(cx - r, cy - k), Point::new(cx - k, cy - r), Point::new(cx, cy - r));
        self.curve_to(Point::new(cx + k, cy - r), Point::new(cx + r, cy - k), Point::new(cx + r, cy));
        self.push(Operation::new("f", vec![]));
    }

    fn stroke_polyline(&mut self, points: &[Point], line_width: f32, color: Rgb) {
        let Some((first, rest)) = points.split_first() else {
            return;
        };
        if rest.is_empty() {
            return;
        }

        self.set_stroke(color, line_width);
        // Round caps and joins hide the seams between short segments
        self.push(Operation::new("J", vec![Object::Integer(1)]));
        self.push(Operation::new("j", vec![Object::Integer(1)]));
        self.move_to(*first);
        for point in rest {
            self.line_to(*point);
        }
        self.push(Operation::new("S", vec![]));
    }

    fn text(&mut self, origin: Point, text: &str, style: TextStyle) {
        if text.is_empty() {
            return;
        }

        self.set_fill(style.color);
        let y = self.pdf_y(origin.y);
        self.push(Operation::new("BT", vec![]));
        self.push(Operation::new(
            "Tf",
            vec![
                Object::Name(style.face.resource_name().as_bytes().to_vec()),
                Object::Real(style.size),
            ],
        ));
        self.push(Operation::new("Td", vec![Object::Real(Self::pdf_x(origin.x)), Object::Real(y)]));
        self.push(Operation::new(
            "Tj",
            vec![Object::String(encode_win_ansi(text), StringFormat::Literal)],
        ));
        self.push(Operation::new("ET", vec![]));
    }

    fn image(&mut self, image: ImageHandle, rect: Rect) {
        let x = Self::pdf_x(rect.x);
        let y = self.pdf_y(rect.bottom());
        let operations = image_operations(
            &image_resource_name(image.index),
            x,
            y,
            rect.width * PT_PER_MM,
            rect.height * PT_PER_MM,
        );

        let page = self.current();
        if !page.images.contains(&image.index) {
            page.images.push(image.index);
        }
        page.operations.extend(operations);
    }

    fn link(&mut self, rect: Rect, url: &str) {
        self.current().links.push((rect, url.to_string()));
    }
}

// =============================================================================
// Tests
// =============================================================================
