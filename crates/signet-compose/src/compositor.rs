// crates/signet-compose/src/compositor.rs
// ============================================================================
// Module: PDF Document Compositor
// Description: Field fill, signature stamping, and certificate appending.
// Purpose: Produce the signed output document in one all-or-nothing pass.
// Dependencies: lopdf, signet-core, time, crate::{certificate, draw, page, raster}
// ============================================================================

//! ## Overview
//! [`PdfCompositor`] implements the core [`DocumentCompositor`] contract over
//! lopdf. Parse, decode, and serialize failures are fatal and never yield
//! partial output. Field-level issues degrade gracefully: an out-of-range
//! page or missing profile value skips that field, because a partially
//! filled document with a valid audit trail beats total failure over a
//! single bad mapping.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::collections::BTreeMap;

use lopdf::Document;
use lopdf::ObjectId;
use lopdf::Stream;
use lopdf::content::Content;
use lopdf::content::Operation;
use lopdf::dictionary;
use signet_core::ComposeError;
use signet_core::ComposeRequest;
use signet_core::DocumentCompositor;
use signet_core::FieldKey;
use signet_core::FieldKind;
use signet_core::FieldMapping;
use signet_core::PageSize;
use signet_core::RenderPoint;
use signet_core::SignerProfile;
use signet_core::Timestamp;
use signet_core::fit_inside;
use signet_core::font_size_for_height;
use signet_core::image_anchor;
use signet_core::is_reserved_key;
use signet_core::text_anchor;
use time::OffsetDateTime;

use crate::certificate::CERT_FONT;
use crate::certificate::CERT_FONT_BOLD;
use crate::certificate::CERT_SEAL;
use crate::certificate::CertificateLabels;
use crate::certificate::certificate_ops;
use crate::draw::check_mark_ops;
use crate::draw::image_ops;
use crate::draw::real;
use crate::draw::text_ops;
use crate::page::add_page_resource;
use crate::page::append_page;
use crate::page::page_size;
use crate::page::pages_root;
use crate::raster::EmbeddedSignature;
use crate::raster::embed_signature;

// ============================================================================
// SECTION: Constants
// ============================================================================

/// Font resource name injected into existing pages for field text.
const FIELD_FONT: &str = "SgF1";
/// Bounding box of the fallback signature stamp, in points.
const DEFAULT_STAMP_BOUNDS: (f64, f64) = (180.0, 60.0);
/// Bottom offset of the fallback signature stamp, in points.
const DEFAULT_STAMP_BOTTOM_OFFSET: f64 = 96.0;

// ============================================================================
// SECTION: Compositor
// ============================================================================

/// lopdf-backed implementation of [`DocumentCompositor`].
#[derive(Debug, Clone, Default)]
pub struct PdfCompositor {
    /// Display strings for the certificate page.
    labels: CertificateLabels,
}

impl PdfCompositor {
    /// Creates a compositor with the provided certificate labels.
    #[must_use]
    pub const fn new(labels: CertificateLabels) -> Self {
        Self {
            labels,
        }
    }
}

impl DocumentCompositor for PdfCompositor {
    fn compose(&self, request: &ComposeRequest) -> Result<Vec<u8>, ComposeError> {
        let mut doc = Document::load_mem(&request.source_pdf)
            .map_err(|err| ComposeError::Parse(err.to_string()))?;
        let pages: BTreeMap<u32, ObjectId> = doc.get_pages();
        let last_page_id = pages
            .values()
            .next_back()
            .copied()
            .ok_or_else(|| ComposeError::Parse("document has no pages".to_string()))?;

        let embedded = embed_signature(&mut doc, &request.signature_png)?;
        let field_font_id = doc.add_object(dictionary! {
            "Type" => "Font",
            "Subtype" => "Type1",
            "BaseFont" => "Helvetica",
            "Encoding" => "WinAnsiEncoding",
        });

        // Pass 1: data fields. Signature fields are collected and placed
        // afterwards so the fallback rule can see whether any exist.
        let mut signature_fields: Vec<&FieldMapping> = Vec::new();
        for mapping in &request.mappings {
            if mapping.kind == FieldKind::Signature {
                signature_fields.push(mapping);
                continue;
            }
            fill_data_field(&mut doc, &pages, mapping, request, field_font_id)?;
        }

        // Pass 2: signature stamps, mapped placement and fallback mutually
        // exclusive.
        if signature_fields.is_empty() {
            let page = page_size(&doc, last_page_id)?;
            let (width, height) = fit_inside(
                f64::from(embedded.width_px),
                f64::from(embedded.height_px),
                DEFAULT_STAMP_BOUNDS.0,
                DEFAULT_STAMP_BOUNDS.1,
            );
            let origin = RenderPoint {
                x: (page.width - width) / 2.0,
                y: DEFAULT_STAMP_BOTTOM_OFFSET,
            };
            stamp_signature(&mut doc, last_page_id, &embedded, 0, origin, width, height)?;
        } else {
            for (index, mapping) in signature_fields.iter().enumerate() {
                let Some(&page_id) = pages.get(&mapping.page) else {
                    // Out-of-range page: skip the field, keep composing.
                    continue;
                };
                let Ok(page) = page_size(&doc, page_id) else {
                    continue;
                };
                let (width, height) = fit_inside(
                    f64::from(embedded.width_px),
                    f64::from(embedded.height_px),
                    mapping.width,
                    mapping.height,
                );
                let centered_x = mapping.x + (mapping.width - width) / 2.0;
                let centered_y = mapping.y + (mapping.height - height) / 2.0;
                let origin = image_anchor(page, centered_x, centered_y, height);
                stamp_signature(&mut doc, page_id, &embedded, index, origin, width, height)?;
            }
        }

        // Pass 3: append the audit certificate page.
        let certificate_size = page_size(&doc, last_page_id)?;
        append_certificate(&mut doc, certificate_size, request, &self.labels, &embedded)?;

        let mut out = Vec::new();
        doc.save_to(&mut out).map_err(|err| ComposeError::Serialize(err.to_string()))?;
        Ok(out)
    }
}

// ============================================================================
// SECTION: Data Fields
// ============================================================================

/// Renders one text or checkbox field, skipping gracefully on field-level
/// issues.
fn fill_data_field(
    doc: &mut Document,
    pages: &BTreeMap<u32, ObjectId>,
    mapping: &FieldMapping,
    request: &ComposeRequest,
    field_font_id: ObjectId,
) -> Result<(), ComposeError> {
    let Some(&page_id) = pages.get(&mapping.page) else {
        return Ok(());
    };
    let Ok(page) = page_size(doc, page_id) else {
        return Ok(());
    };

    let ops: Vec<Operation> = match mapping.kind {
        FieldKind::Text => {
            let Some(value) =
                resolve_field_value(&mapping.key, &request.profile, request.audit.completed_at)
            else {
                return Ok(());
            };
            if add_page_resource(doc, page_id, "Font", FIELD_FONT, field_font_id).is_err() {
                return Ok(());
            }
            let anchor = text_anchor(page, mapping.x, mapping.y);
            text_ops(FIELD_FONT, font_size_for_height(mapping.height), anchor, &value)
        }
        FieldKind::Checkbox => {
            let Some(value) = request.profile.usable_value(&mapping.key) else {
                return Ok(());
            };
            if !mapping.trigger_matches(value) {
                return Ok(());
            }
            let origin = image_anchor(page, mapping.x, mapping.y, mapping.height);
            check_mark_ops(origin, mapping.width, mapping.height)
        }
        FieldKind::Signature => return Ok(()),
    };

    append_content(doc, page_id, ops)
}

/// Resolves a field value from reserved system keys or the signer profile.
fn resolve_field_value(
    key: &FieldKey,
    profile: &SignerProfile,
    completed_at: Timestamp,
) -> Option<String> {
    if is_reserved_key(key) {
        return reserved_value(key, completed_at);
    }
    profile.usable_value(key).map(str::to_string)
}

/// Resolves the reserved date keys from the completion timestamp.
fn reserved_value(key: &FieldKey, completed_at: Timestamp) -> Option<String> {
    let moment = OffsetDateTime::from_unix_timestamp(completed_at.as_unix_seconds()).ok()?;
    match key.as_str() {
        "today_date" => Some(format!(
            "{:02}/{:02}/{:04}",
            moment.day(),
            u8::from(moment.month()),
            moment.year()
        )),
        "today_day" => Some(format!("{:02}", moment.day())),
        "today_month" => Some(format!("{:02}", u8::from(moment.month()))),
        "today_year" => Some(format!("{:04}", moment.year())),
        _ => None,
    }
}

// ============================================================================
// SECTION: Signature Stamps
// ============================================================================

/// Places one signature stamp on a page.
fn stamp_signature(
    doc: &mut Document,
    page_id: ObjectId,
    embedded: &EmbeddedSignature,
    index: usize,
    origin: RenderPoint,
    width: f64,
    height: f64,
) -> Result<(), ComposeError> {
    let name = format!("SgIm{index}");
    add_page_resource(doc, page_id, "XObject", &name, embedded.image_id)?;
    append_content(doc, page_id, image_ops(&name, origin, width, height))
}

// ============================================================================
// SECTION: Certificate Page
// ============================================================================

/// Builds and appends the audit certificate page.
fn append_certificate(
    doc: &mut Document,
    page: PageSize,
    request: &ComposeRequest,
    labels: &CertificateLabels,
    embedded: &EmbeddedSignature,
) -> Result<(), ComposeError> {
    let ops = certificate_ops(
        page,
        &request.audit,
        &request.tenant.display_name,
        labels,
        (embedded.width_px, embedded.height_px),
    );
    let content = Content {
        operations: ops,
    }
    .encode()
    .map_err(|err| ComposeError::Serialize(err.to_string()))?;
    let content_id = doc.add_object(Stream::new(dictionary! {}, content));

    let regular_id = doc.add_object(dictionary! {
        "Type" => "Font",
        "Subtype" => "Type1",
        "BaseFont" => "Helvetica",
        "Encoding" => "WinAnsiEncoding",
    });
    let bold_id = doc.add_object(dictionary! {
        "Type" => "Font",
        "Subtype" => "Type1",
        "BaseFont" => "Helvetica-Bold",
        "Encoding" => "WinAnsiEncoding",
    });

    let root_id = pages_root(doc)?;
    let page_dict = dictionary! {
        "Type" => "Page",
        "MediaBox" => vec![real(0.0), real(0.0), real(page.width), real(page.height)],
        "Contents" => content_id,
        "Resources" => dictionary! {
            "Font" => dictionary! {
                CERT_FONT => regular_id,
                CERT_FONT_BOLD => bold_id,
            },
            "XObject" => dictionary! {
                CERT_SEAL => embedded.image_id,
            },
        },
    };
    append_page(doc, root_id, page_dict).map(|_| ())
}

// ============================================================================
// SECTION: Content Appending
// ============================================================================

/// Encodes and appends operations to a page's content streams.
fn append_content(
    doc: &mut Document,
    page_id: ObjectId,
    ops: Vec<Operation>,
) -> Result<(), ComposeError> {
    let encoded = Content {
        operations: ops,
    }
    .encode()
    .map_err(|err| ComposeError::Serialize(err.to_string()))?;
    doc.add_page_contents(page_id, encoded)
        .map_err(|err| ComposeError::Serialize(err.to_string()))
}
