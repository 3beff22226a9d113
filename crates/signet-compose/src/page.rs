// crates/signet-compose/src/page.rs
// ============================================================================
// Module: Page Structure Helpers
// Description: Page dimensions, resource injection, and page appending.
// Purpose: Keep lopdf page-tree surgery in one place for the compositor.
// Dependencies: lopdf, signet-core
// ============================================================================

//! ## Overview
//! Helpers over the lopdf page tree: MediaBox resolution (walking the parent
//! chain, falling back to A4 when metadata is missing), injection of
//! compositor-owned font and XObject resources into existing pages, and
//! appending the certificate page through the catalog's Kids/Count pair.

// ============================================================================
// SECTION: Imports
// ============================================================================

use lopdf::Dictionary;
use lopdf::Document;
use lopdf::Object;
use lopdf::ObjectId;
use lopdf::dictionary;
use signet_core::ComposeError;
use signet_core::PageSize;

// ============================================================================
// SECTION: Constants
// ============================================================================

/// Fallback page size when no MediaBox is recorded (A4 in points).
const FALLBACK_PAGE_SIZE: PageSize = PageSize::new(595.0, 842.0);

// ============================================================================
// SECTION: Page Dimensions
// ============================================================================

/// Resolves the page size, walking the parent chain for inherited boxes.
///
/// Documents without a resolvable MediaBox fall back to A4 rather than
/// failing the attempt.
///
/// # Errors
///
/// Returns [`ComposeError::Parse`] when the page object itself is malformed.
pub fn page_size(doc: &Document, page_id: ObjectId) -> Result<PageSize, ComposeError> {
    let mut current = Some(page_id);
    while let Some(id) = current {
        let dict = doc
            .get_object(id)
            .and_then(Object::as_dict)
            .map_err(|err| ComposeError::Parse(format!("page dictionary missing: {err}")))?;
        if let Some(size) = media_box_size(doc, dict) {
            return Ok(size);
        }
        current = dict.get(b"Parent").and_then(Object::as_reference).ok();
    }
    Ok(FALLBACK_PAGE_SIZE)
}

/// Extracts a MediaBox size from a page or pages dictionary.
fn media_box_size(doc: &Document, dict: &Dictionary) -> Option<PageSize> {
    let raw = dict.get(b"MediaBox").ok()?;
    let resolved = match raw {
        Object::Reference(id) => doc.get_object(*id).ok()?,
        other => other,
    };
    let array = resolved.as_array().ok()?;
    if array.len() != 4 {
        return None;
    }
    let llx = number(&array[0])?;
    let lly = number(&array[1])?;
    let urx = number(&array[2])?;
    let ury = number(&array[3])?;
    Some(PageSize::new(urx - llx, ury - lly))
}

/// Reads a PDF numeric object as f64.
///
/// Page coordinates fit f64 exactly for any realistic document.
#[allow(clippy::cast_precision_loss, reason = "page coordinates are small")]
fn number(object: &Object) -> Option<f64> {
    match object {
        Object::Integer(value) => Some(*value as f64),
        Object::Real(value) => Some(f64::from(*value)),
        _ => None,
    }
}

// ============================================================================
// SECTION: Resource Injection
// ============================================================================

/// Adds one entry to a named resource sub-dictionary of an existing page.
///
/// Pages that keep their resources behind a reference are followed; pages
/// with no resources at all receive a fresh dictionary.
///
/// # Errors
///
/// Returns [`ComposeError::Parse`] when the page's resource structure is not
/// a dictionary shape lopdf can edit.
pub fn add_page_resource(
    doc: &mut Document,
    page_id: ObjectId,
    category: &str,
    name: &str,
    target: ObjectId,
) -> Result<(), ComposeError> {
    let mut resources = {
        let page_dict = doc
            .get_object_mut(page_id)
            .and_then(Object::as_dict_mut)
            .map_err(|err| ComposeError::Parse(format!("page dictionary missing: {err}")))?;
        page_dict.remove(b"Resources").unwrap_or_else(|| Object::Dictionary(dictionary! {}))
    };

    match &mut resources {
        Object::Reference(id) => {
            let shared = doc
                .get_object_mut(*id)
                .and_then(Object::as_dict_mut)
                .map_err(|err| ComposeError::Parse(format!("resources missing: {err}")))?;
            set_category_entry(shared, category, name, target)?;
        }
        Object::Dictionary(dict) => {
            set_category_entry(dict, category, name, target)?;
        }
        _ => {
            return Err(ComposeError::Parse("page resources are not a dictionary".to_string()));
        }
    }

    let page_dict = doc
        .get_object_mut(page_id)
        .and_then(Object::as_dict_mut)
        .map_err(|err| ComposeError::Parse(format!("page dictionary missing: {err}")))?;
    page_dict.set("Resources", resources);
    Ok(())
}

/// Sets `name → target` inside `category` of a resource dictionary.
fn set_category_entry(
    resources: &mut Dictionary,
    category: &str,
    name: &str,
    target: ObjectId,
) -> Result<(), ComposeError> {
    let owned = resources
        .remove(category.as_bytes())
        .unwrap_or_else(|| Object::Dictionary(dictionary! {}));
    let mut dict = match owned {
        Object::Dictionary(dict) => dict,
        // A referenced sub-dictionary is replaced by a local one; existing
        // shared entries stay reachable through the original object.
        Object::Reference(_) => dictionary! {},
        _ => {
            return Err(ComposeError::Parse(format!(
                "page resource category {category} is not a dictionary"
            )));
        }
    };
    dict.set(name, target);
    resources.set(category, Object::Dictionary(dict));
    Ok(())
}

// ============================================================================
// SECTION: Page Appending
// ============================================================================

/// Returns the object id of the catalog's page-tree root.
///
/// # Errors
///
/// Returns [`ComposeError::Parse`] when the catalog or root is missing.
pub fn pages_root(doc: &Document) -> Result<ObjectId, ComposeError> {
    doc.catalog()
        .map_err(|err| ComposeError::Parse(format!("catalog missing: {err}")))?
        .get(b"Pages")
        .and_then(Object::as_reference)
        .map_err(|err| ComposeError::Parse(format!("page tree root missing: {err}")))
}

/// Appends a fully built page to the document's page tree.
///
/// # Errors
///
/// Returns [`ComposeError::Parse`] when the page tree cannot be edited.
pub fn append_page(
    doc: &mut Document,
    root_id: ObjectId,
    page: Dictionary,
) -> Result<ObjectId, ComposeError> {
    let mut page = page;
    page.set("Parent", root_id);
    let page_id = doc.add_object(Object::Dictionary(page));

    let pages_dict = doc
        .get_object_mut(root_id)
        .and_then(Object::as_dict_mut)
        .map_err(|err| ComposeError::Parse(format!("page tree root missing: {err}")))?;
    let kids = pages_dict
        .get_mut(b"Kids")
        .and_then(Object::as_array_mut)
        .map_err(|err| ComposeError::Parse(format!("page tree kids missing: {err}")))?;
    kids.push(Object::Reference(page_id));
    let count = pages_dict.get(b"Count").and_then(Object::as_i64).unwrap_or(0);
    pages_dict.set("Count", count + 1);
    Ok(page_id)
}
