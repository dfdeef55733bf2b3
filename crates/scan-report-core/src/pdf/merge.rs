//! Merging two PDF documents into one.

use lopdf::{Dictionary, Document, Object, ObjectId};
use tracing::debug;

use super::objects::{INHERITABLE_ATTRIBUTES, inherited_attribute};
use crate::error::{Error, MergeInput, Result};

/// Options for [`merge_pdfs`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MergeOptions {
    /// Drop the first page of the second document (e.g. its own cover).
    pub skip_first_page_of_second: bool,
}

impl MergeOptions {
    pub const fn skip_first_page() -> Self {
        Self {
            skip_first_page_of_second: true,
        }
    }
}

fn load(bytes: &[u8], input: MergeInput) -> Result<Document> {
    Document::load_mem(bytes).map_err(|e| Error::Merge {
        input,
        reason: e.to_string(),
    })
}

/// Pages of `doc` in page order, with inherited attributes made explicit.
///
/// The source page tree nodes are dropped during the merge, so anything a
/// page inherits from them has to be copied onto the page itself.
fn flatten_pages(doc: &Document, skip: usize) -> Vec<(ObjectId, Dictionary)> {
    doc.get_pages()
        .values()
        .skip(skip)
        .filter_map(|&page_id| {
            let page = doc.get_object(page_id).and_then(Object::as_dict).ok()?;
            let mut page = page.clone();
            for key in INHERITABLE_ATTRIBUTES {
                if page.get(key).is_err()
                    && let Some(value) = inherited_attribute(doc, &page, key)
                {
                    page.set(key, value);
                }
            }
            Some((page_id, page))
        })
        .collect()
}

/// Merge two PDFs into a fresh document.
///
/// Output page order is every page of `first` followed by the pages of
/// `second` (minus its first page when requested). Objects only reachable
/// from skipped pages are pruned.
pub fn merge_pdfs(first: &[u8], second: &[u8], options: MergeOptions) -> Result<Vec<u8>> {
    let mut first = load(first, MergeInput::First)?;
    let mut second = load(second, MergeInput::Second)?;

    first.renumber_objects_with(1);
    second.renumber_objects_with(first.max_id + 1);

    let skip = usize::from(options.skip_first_page_of_second);
    let mut pages = flatten_pages(&first, 0);
    pages.extend(flatten_pages(&second, skip));

    debug!(
        "Merging {} + {} pages (skipping {skip})",
        first.get_pages().len(),
        second.get_pages().len()
    );

    let mut document = Document::with_version("1.5");
    document.max_id = second.max_id;

    for source in [first, second] {
        for (object_id, object) in source.objects {
            match object.type_name().unwrap_or(b"") {
                b"Catalog" | b"Pages" | b"Page" | b"Outlines" | b"Outline" => {}
                _ => {
                    document.objects.insert(object_id, object);
                }
            }
        }
    }

    let pages_id = document.new_object_id();

    let mut kids = Vec::with_capacity(pages.len());
    for (page_id, mut page) in pages {
        page.set("Parent", Object::Reference(pages_id));
        document.objects.insert(page_id, Object::Dictionary(page));
        kids.push(Object::Reference(page_id));
    }

    #[allow(clippy::cast_possible_wrap)]
    let count = kids.len() as i64;
    document.objects.insert(
        pages_id,
        Object::Dictionary(Dictionary::from_iter([
            ("Type", Object::Name(b"Pages".to_vec())),
            ("Kids", Object::Array(kids)),
            ("Count", Object::Integer(count)),
        ])),
    );

    let catalog_id = document.add_object(Dictionary::from_iter([
        ("Type", Object::Name(b"Catalog".to_vec())),
        ("Pages", Object::Reference(pages_id)),
    ]));
    document.trailer.set("Root", Object::Reference(catalog_id));

    let pruned = document.prune_objects();
    debug!("Pruned {} unreferenced objects", pruned.len());

    document.renumber_objects();
    document.compress();

    let mut output = Vec::new();
    document
        .save_to(&mut output)
        .map_err(|e| Error::PdfSave(format!("Failed to save merged PDF: {e}")))?;

    Ok(output)
}
