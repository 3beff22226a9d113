// system-tests/src/fixtures.rs
// ============================================================================
// Module: System Test Fixtures
// Description: Documents, strokes, and seed records for end-to-end suites.
// Purpose: Keep suite files focused on scenario flow instead of setup.
// Dependencies: lopdf, signet-capture, signet-core
// ============================================================================

//! ## Overview
//! Deterministic inputs for the system-test suites: a minimal multi-page PDF
//! built in memory, a signature rendered through the real capture surface,
//! and pending-request seed records shaped like issuance-flow output.

// ============================================================================
// SECTION: Imports
// ============================================================================

use lopdf::Document;
use lopdf::Object;
use lopdf::Stream;
use lopdf::content::Content;
use lopdf::dictionary;
use signet_capture::CaptureError;
use signet_capture::CaptureSurface;
use signet_capture::PointerPoint;
use signet_core::FieldKey;
use signet_core::FieldKind;
use signet_core::FieldMapping;
use signet_core::RequestId;
use signet_core::RequestStatus;
use signet_core::RequestToken;
use signet_core::SignatureRequest;
use signet_core::TemplateId;
use signet_core::TenantId;
use signet_core::Timestamp;

// ============================================================================
// SECTION: Documents
// ============================================================================

/// Builds a minimal PDF with `pages` empty A4 pages.
///
/// # Errors
///
/// Returns [`lopdf::Error`] when content encoding or serialization fails.
pub fn minimal_pdf(pages: u16) -> Result<Vec<u8>, lopdf::Error> {
    let mut doc = Document::with_version("1.5");
    let pages_id = doc.new_object_id();
    let mut kids = Vec::new();
    for _ in 0..pages {
        let content = Content {
            operations: Vec::new(),
        };
        let content_id = doc.add_object(Stream::new(dictionary! {}, content.encode()?));
        let page_id = doc.add_object(dictionary! {
            "Type" => "Page",
            "Parent" => pages_id,
            "MediaBox" => vec![0_i64.into(), 0_i64.into(), 595_i64.into(), 842_i64.into()],
            "Contents" => content_id,
        });
        kids.push(Object::Reference(page_id));
    }
    doc.objects.insert(
        pages_id,
        Object::Dictionary(dictionary! {
            "Type" => "Pages",
            "Kids" => kids,
            "Count" => i64::from(pages),
        }),
    );
    let catalog_id = doc.add_object(dictionary! {
        "Type" => "Catalog",
        "Pages" => pages_id,
    });
    doc.trailer.set("Root", catalog_id);

    let mut out = Vec::new();
    doc.save_to(&mut out)?;
    Ok(out)
}

// ============================================================================
// SECTION: Signatures
// ============================================================================

/// Renders a deterministic signature through the real capture surface.
///
/// # Errors
///
/// Returns [`CaptureError`] when PNG export fails.
pub fn stroke_signature() -> Result<Vec<u8>, CaptureError> {
    let mut surface = CaptureSurface::new();
    surface.resize(360, 120);
    surface.start(PointerPoint::new(30.0, 70.0));
    for step in 1..=30_u8 {
        let t = f32::from(step) * 10.0;
        surface.extend(PointerPoint::new(30.0 + t, 70.0 - t * 0.1));
    }
    surface.end();
    surface.export()
}

// ============================================================================
// SECTION: Seed Records
// ============================================================================

/// Builds a pending request for `token` expiring at `expires_at`.
#[must_use]
pub fn pending_request(token: &str, expires_at: Timestamp) -> SignatureRequest {
    SignatureRequest {
        token: RequestToken::new(token),
        request_id: RequestId::new("req-0001"),
        tenant_id: TenantId::new("acme"),
        template_id: TemplateId::new("nda-es"),
        signer_name: "Ana Torres".to_string(),
        signer_email: Some("ana@example.com".to_string()),
        requester_name: "Legal Ops".to_string(),
        status: RequestStatus::Pending,
        document_path: "acme/req-0001/source.pdf".to_string(),
        signed_document_path: None,
        signature_path: None,
        signature_hash: None,
        expires_at,
        signed_at: None,
    }
}

/// Builds a text mapping for `key` on `page`.
#[must_use]
pub fn text_mapping(key: &str, page: u32) -> FieldMapping {
    FieldMapping {
        key: FieldKey::new(key),
        kind: FieldKind::Text,
        page,
        x: 50.0,
        y: 120.0,
        width: 180.0,
        height: 16.0,
        trigger_value: None,
    }
}

/// Builds a signature mapping on `page`.
#[must_use]
pub fn signature_mapping(page: u32) -> FieldMapping {
    FieldMapping {
        key: FieldKey::new("signature"),
        kind: FieldKind::Signature,
        page,
        x: 300.0,
        y: 640.0,
        width: 180.0,
        height: 60.0,
        trigger_value: None,
    }
}
