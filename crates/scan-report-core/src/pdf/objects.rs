//! Low-level helpers for editing existing lopdf pages.
//!
//! PDF pages can carry `Resources` and `MediaBox` either inline, as indirect
//! references, or inherited from an ancestor `Pages` node. These helpers
//! resolve all three forms so callers can treat every page the same way.

use lopdf::{Dictionary, Document, Object, ObjectId, Stream};

use crate::error::{Error, Result};

/// Depth limit when walking up the page tree, guarding against circular
/// `Parent` references in malformed files.
const MAX_TREE_DEPTH: usize = 10;

/// Page attributes a page may inherit from its ancestors.
pub const INHERITABLE_ATTRIBUTES: [&[u8]; 4] = [b"Resources", b"MediaBox", b"CropBox", b"Rotate"];

/// Default page size when no MediaBox is found (A4 in points).
pub const DEFAULT_MEDIA_BOX: [f32; 4] = [0.0, 0.0, 595.28, 841.89];

fn page_dict(doc: &Document, page_id: ObjectId) -> Result<&Dictionary> {
    doc.get_object(page_id)
        .and_then(Object::as_dict)
        .map_err(|e| Error::Lopdf(format!("Failed to get page: {e}")))
}

/// Find an attribute on a page or the nearest ancestor that defines it.
pub fn inherited_attribute(doc: &Document, page: &Dictionary, key: &[u8]) -> Option<Object> {
    if let Ok(value) = page.get(key) {
        return Some(value.clone());
    }

    let mut parent = page.get(b"Parent").ok()?.as_reference().ok()?;
    for _ in 0..MAX_TREE_DEPTH {
        let node = doc.get_object(parent).ok()?.as_dict().ok()?;
        if let Ok(value) = node.get(key) {
            return Some(value.clone());
        }
        parent = node.get(b"Parent").ok()?.as_reference().ok()?;
    }

    None
}

/// Resolve an object that should be a Dictionary (handles References).
pub fn resolve_dict_object(doc: &Document, obj: &Object) -> Option<Dictionary> {
    match obj {
        Object::Dictionary(d) => Some(d.clone()),
        Object::Reference(ref_id) => {
            if let Ok(Object::Dictionary(d)) = doc.get_object(*ref_id) {
                Some(d.clone())
            } else {
                None
            }
        }
        _ => None,
    }
}

/// Resolve the effective Resources dictionary of a page.
///
/// Returns an empty dictionary when the page has none.
pub fn resolve_resources(doc: &Document, page_id: ObjectId) -> Result<Dictionary> {
    let page = page_dict(doc, page_id)?;
    Ok(inherited_attribute(doc, page, b"Resources")
        .and_then(|obj| resolve_dict_object(doc, &obj))
        .unwrap_or_default())
}

/// Get the effective media box of a page as `[x0, y0, x1, y1]`.
pub fn get_media_box(doc: &Document, page_id: ObjectId) -> Result<[f32; 4]> {
    let page = page_dict(doc, page_id)?;

    let array = match inherited_attribute(doc, page, b"MediaBox") {
        Some(Object::Array(arr)) => Some(arr),
        Some(Object::Reference(id)) => doc
            .get_object(id)
            .and_then(Object::as_array)
            .ok()
            .cloned(),
        _ => None,
    };

    if let Some(arr) = array
        && arr.len() == 4
    {
        let values: Vec<f32> = arr
            .iter()
            .filter_map(|o| match o {
                #[allow(clippy::cast_possible_truncation)]
                Object::Integer(i) => Some(*i as f32),
                Object::Real(r) => Some(*r),
                _ => None,
            })
            .collect();

        if values.len() == 4 {
            return Ok([values[0], values[1], values[2], values[3]]);
        }
    }

    Ok(DEFAULT_MEDIA_BOX)
}

/// Register an XObject under `name` in the page's resources.
///
/// The resolved Resources dictionary is written back inline on the page so
/// inherited or shared resource dictionaries are left untouched.
pub fn add_xobject_to_page(
    doc: &mut Document,
    page_id: ObjectId,
    name: &str,
    xobject_id: ObjectId,
) -> Result<()> {
    let mut resources = resolve_resources(doc, page_id)?;

    let mut xobjects = resources
        .get(b"XObject")
        .ok()
        .and_then(|obj| resolve_dict_object(doc, obj))
        .unwrap_or_default();

    xobjects.set(name, Object::Reference(xobject_id));
    resources.set("XObject", Object::Dictionary(xobjects));

    let page = doc
        .get_object_mut(page_id)
        .map_err(|e| Error::Lopdf(format!("Failed to get page: {e}")))?;

    if let Object::Dictionary(page_dict) = page {
        page_dict.set("Resources", Object::Dictionary(resources));
    }

    Ok(())
}

/// Append an annotation dictionary to the page's `Annots` array.
pub fn add_annotation_to_page(doc: &mut Document, page_id: ObjectId, annotation: Dictionary) -> Result<()> {
    let annotation_id = doc.add_object(Object::Dictionary(annotation));

    let existing = page_dict(doc, page_id)?.get(b"Annots").ok().cloned();
    let mut annots = match existing {
        Some(Object::Array(arr)) => arr,
        Some(Object::Reference(id)) => doc
            .get_object(id)
            .and_then(Object::as_array)
            .ok()
            .cloned()
            .unwrap_or_default(),
        _ => Vec::new(),
    };
    annots.push(Object::Reference(annotation_id));

    let page = doc
        .get_object_mut(page_id)
        .map_err(|e| Error::Lopdf(format!("Failed to get page: {e}")))?;

    if let Object::Dictionary(dict) = page {
        dict.set("Annots", Object::Array(annots));
    }

    Ok(())
}

/// Append a content stream to a page, drawing over the existing content.
///
/// The existing content is wrapped in `q`/`Q` so that any graphics state it
/// leaves behind (transforms, colours) does not leak into the new content.
pub fn append_content_to_page(doc: &mut Document, page_id: ObjectId, content: Vec<u8>) -> Result<()> {
    let save_id = doc.add_object(Object::Stream(Stream::new(Dictionary::new(), b"q\n".to_vec())));

    let mut overlay = b"Q\n".to_vec();
    overlay.extend_from_slice(&content);
    let content_id = doc.add_object(Object::Stream(Stream::new(Dictionary::new(), overlay)));

    let page = doc
        .get_object_mut(page_id)
        .map_err(|e| Error::Lopdf(format!("Failed to get page: {e}")))?;

    if let Object::Dictionary(dict) = page {
        let existing_contents = dict.get(b"Contents").ok().cloned();

        let contents = match existing_contents {
            Some(Object::Reference(existing_id)) => vec![
                Object::Reference(save_id),
                Object::Reference(existing_id),
                Object::Reference(content_id),
            ],
            Some(Object::Array(arr)) => {
                let mut contents = Vec::with_capacity(arr.len() + 2);
                contents.push(Object::Reference(save_id));
                contents.extend(arr);
                contents.push(Object::Reference(content_id));
                contents
            }
            _ => vec![Object::Reference(save_id), Object::Reference(content_id)],
        };
        dict.set("Contents", Object::Array(contents));
    }

    Ok(())
}
