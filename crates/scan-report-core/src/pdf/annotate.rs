//! Branding an existing PDF with header, footer and QR code.
//!
//! Unlike [`ReportDocument`](super::canvas::ReportDocument), which builds
//! pages from scratch, the annotator edits pages of an externally produced
//! PDF in place, so all placement is done in the page's own coordinate space
//! (points, bottom-left origin, relative to its media box).

use lopdf::content::Content;
use lopdf::Document;
use tracing::{debug, info, warn};

use super::canvas::{image_operations, link_annotation};
use super::image::PdfImage;
use super::objects::{add_annotation_to_page, add_xobject_to_page, append_content_to_page, get_media_box};
use super::page_index::PageIndex;
use super::qr::qr_raster;
use crate::config::Rgb;
use crate::error::{Error, Result};

// =============================================================================
// Layout Constants (points)
// =============================================================================

/// Height of the header band; it spans the full page width.
const HEADER_HEIGHT: f32 = 50.0;

const FOOTER_WIDTH: f32 = 160.0;
const FOOTER_HEIGHT: f32 = 32.0;

const QR_SIZE: f32 = 72.0;

/// Distance of the QR code from the right page edge and the header band.
const QR_MARGIN: f32 = 18.0;

/// Padding of the QR background rectangle around the code.
const QR_PADDING: f32 = 4.0;

/// Page the QR code is placed on.
const QR_PAGE: usize = 1;

const HEADER_NAME: &str = "ImScanHeader";
const FOOTER_NAME: &str = "ImScanFooter";
const QR_NAME: &str = "ImScanQr";

// =============================================================================
// Public Types
// =============================================================================

/// What to stamp onto an existing document.
#[derive(Debug, Clone)]
pub struct AnnotateRequest {
    /// Header image bytes (PNG or JPEG)
    pub header: Vec<u8>,
    /// Footer image bytes (PNG or JPEG)
    pub footer: Vec<u8>,
    /// Makes the header band clickable when set
    pub link: Option<String>,
    /// Target encoded in the QR code
    pub qr_url: String,
    /// Rectangle drawn behind the QR code
    pub qr_background: Option<Rgb>,
}

/// Result of [`annotate_pdf`].
#[derive(Debug, Clone)]
pub struct AnnotatedPdf {
    pub bytes: Vec<u8>,
    /// False when the document was too short to carry the QR page
    pub qr_embedded: bool,
}

// =============================================================================
// Annotator
// =============================================================================

/// Draw the header and footer on every page and the QR code on page 1.
pub fn annotate_pdf(pdf_bytes: &[u8], request: &AnnotateRequest) -> Result<AnnotatedPdf> {
    let mut doc = Document::load_mem(pdf_bytes)
        .map_err(|e| Error::Lopdf(format!("Failed to load PDF: {e}")))?;

    let header_id = PdfImage::decode(&request.header)?.add_to_document(&mut doc);
    let footer_id = PdfImage::decode(&request.footer)?.add_to_document(&mut doc);

    let pages = doc.get_pages();
    let total = pages.len();
    info!("Annotating {total} pages");

    for &page_id in pages.values() {
        let [x0, y0, x1, y1] = get_media_box(&doc, page_id)?;
        let page_width = x1 - x0;

        add_xobject_to_page(&mut doc, page_id, HEADER_NAME, header_id)?;
        add_xobject_to_page(&mut doc, page_id, FOOTER_NAME, footer_id)?;

        let mut operations = image_operations(HEADER_NAME, x0, y1 - HEADER_HEIGHT, page_width, HEADER_HEIGHT);
        operations.extend(image_operations(FOOTER_NAME, x0, y0, FOOTER_WIDTH, FOOTER_HEIGHT));
        append_operations(&mut doc, page_id, operations)?;

        if let Some(link) = &request.link {
            add_annotation_to_page(
                &mut doc,
                page_id,
                link_annotation([x0, y1 - HEADER_HEIGHT, x1, y1], link),
            )?;
        }
    }

    let qr_embedded = if total > QR_PAGE {
        embed_qr(&mut doc, request)?;
        true
    } else {
        warn!("Document has {total} page(s), skipping QR code");
        false
    };

    let mut bytes = Vec::new();
    doc.save_to(&mut bytes)
        .map_err(|e| Error::PdfSave(format!("Failed to save PDF: {e}")))?;

    Ok(AnnotatedPdf { bytes, qr_embedded })
}

fn embed_qr(doc: &mut Document, request: &AnnotateRequest) -> Result<()> {
    let pages = doc.get_pages();
    let index = PageIndex::try_from_page_num(QR_PAGE, pages.len())?;
    let page_id = *pages
        .get(&index.as_lopdf_page_number())
        .ok_or(Error::PdfInvalidPage {
            page: QR_PAGE,
            total: pages.len(),
        })?;

    // The raster only lives for this scope
    let qr_id = {
        let raster = qr_raster(&request.qr_url)?;
        PdfImage::from_gray(raster).add_to_document(doc)
    };

    let [_, _, x1, y1] = get_media_box(doc, page_id)?;
    let x = x1 - QR_MARGIN - QR_SIZE;
    let y = y1 - HEADER_HEIGHT - QR_MARGIN - QR_SIZE;

    let mut content = Vec::new();
    if let Some(bg) = request.qr_background {
        content.extend_from_slice(
            format!(
                "q {} {} {} rg {} {} {} {} re f Q\n",
                bg.r,
                bg.g,
                bg.b,
                x - QR_PADDING,
                y - QR_PADDING,
                QR_SIZE + 2.0 * QR_PADDING,
                QR_SIZE + 2.0 * QR_PADDING
            )
            .as_bytes(),
        );
    }

    add_xobject_to_page(doc, page_id, QR_NAME, qr_id)?;
    let qr = Content {
        operations: image_operations(QR_NAME, x, y, QR_SIZE, QR_SIZE),
    };
    content.extend(
        qr.encode()
            .map_err(|e| Error::PdfSave(format!("Failed to encode QR content: {e}")))?,
    );
    append_content_to_page(doc, page_id, content)?;

    debug!("Embedded QR code for {} on page {index}", request.qr_url);
    Ok(())
}

fn append_operations(
    doc: &mut Document,
    page_id: lopdf::ObjectId,
    operations: Vec<lopdf::content::Operation>,
) -> Result<()> {
    let content = Content { operations }
        .encode()
        .map_err(|e| Error::PdfSave(format!("Failed to encode overlay content: {e}")))?;
    append_content_to_page(doc, page_id, content)
}

/// Number of pages in a PDF, used to report annotator input sizes.
pub fn page_count(pdf_bytes: &[u8]) -> Result<usize> {
    let doc = Document::load_mem(pdf_bytes)
        .map_err(|e| Error::Lopdf(format!("Failed to load PDF: {e}")))?;
    Ok(doc.get_pages().len())
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::pdf::image::tests::png_bytes;
    use crate::pdf::objects::{resolve_dict_object, resolve_resources};
    use crate::pdf::tests::{multi_page_pdf, page_texts, single_page_pdf};

    fn request(link: Option<&str>) -> AnnotateRequest {
        AnnotateRequest {
            header: png_bytes(40, 4, 255),
            footer: png_bytes(20, 4, 255),
            link: link.map(str::to_string),
            qr_url: "https://app.scanreport.io/user/scanreport/abc".to_string(),
            qr_background: Some(Rgb::white()),
        }
    }

    fn xobject_names(doc: &Document, page_id: lopdf::ObjectId) -> Vec<String> {
        let resources = resolve_resources(doc, page_id).unwrap();
        resources
            .get(b"XObject")
            .ok()
            .and_then(|obj| resolve_dict_object(doc, obj))
            .map(|d| d.iter().map(|(k, _)| String::from_utf8_lossy(k).into_owned()).collect())
            .unwrap_or_default()
    }

    #[test]
    fn test_single_page_skips_qr() {
        let result = annotate_pdf(&single_page_pdf("only"), &request(None)).unwrap();
        assert!(!result.qr_embedded);

        let doc = Document::load_mem(&result.bytes).unwrap();
        let page_id = doc.get_pages()[&1];
        let names = xobject_names(&doc, page_id);
        assert!(names.contains(&HEADER_NAME.to_string()));
        assert!(!names.contains(&QR_NAME.to_string()));
    }

    #[test]
    fn test_qr_only_on_second_page() {
        let input = multi_page_pdf(&["p0", "p1", "p2"]);
        let result = annotate_pdf(&input, &request(None)).unwrap();
        assert!(result.qr_embedded);
        assert_eq!(page_texts(&result.bytes), vec!["p0", "p1", "p2"]);

        let doc = Document::load_mem(&result.bytes).unwrap();
        let pages = doc.get_pages();
        for (number, page_id) in &pages {
            let names = xobject_names(&doc, *page_id);
            assert!(names.contains(&FOOTER_NAME.to_string()));
            assert_eq!(names.contains(&QR_NAME.to_string()), *number == 2);
        }
    }

    #[test]
    fn test_header_link_annotations() {
        let input = multi_page_pdf(&["p0", "p1"]);
        let result = annotate_pdf(&input, &request(Some("https://example.com"))).unwrap();

        let doc = Document::load_mem(&result.bytes).unwrap();
        for page_id in doc.get_pages().values() {
            let page = doc.get_object(*page_id).unwrap().as_dict().unwrap();
            let annots = page.get(b"Annots").unwrap().as_array().unwrap();
            assert_eq!(annots.len(), 1);
        }
    }

    #[test]
    fn test_bad_header_image_fails() {
        let mut req = request(None);
        req.header = b"nope".to_vec();
        assert!(matches!(
            annotate_pdf(&single_page_pdf("x"), &req),
            Err(Error::Image(_))
        ));
    }

    #[test]
    fn test_page_count() {
        assert_eq!(page_count(&multi_page_pdf(&["a", "b"])).unwrap(), 2);
        assert!(page_count(b"junk").is_err());
    }
}
