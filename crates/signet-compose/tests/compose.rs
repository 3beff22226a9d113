// crates/signet-compose/tests/compose.rs
// ============================================================================
// Module: Compositor Tests
// Description: End-to-end tests for field fill, stamping, and the certificate.
// Purpose: Validate composition semantics over real PDF bytes.
// Dependencies: signet-compose, signet-core, signet-capture, lopdf, sha2
// ============================================================================
//! ## Overview
//! Builds minimal PDF documents in memory, runs the compositor with a
//! capture-surface signature, and inspects the output page tree and content
//! streams: checkbox trigger matching, out-of-range skipping, the default
//! stamp fallback, and the audit-hash round trip.

#![allow(
    clippy::panic,
    clippy::print_stdout,
    clippy::print_stderr,
    clippy::unwrap_used,
    clippy::expect_used,
    clippy::use_debug,
    clippy::dbg_macro,
    clippy::panic_in_result_fn,
    clippy::unwrap_in_result,
    reason = "Test-only output and panic-based assertions are permitted."
)]

use lopdf::Document;
use lopdf::Object;
use lopdf::Stream;
use lopdf::content::Content;
use lopdf::dictionary;
use sha2::Digest;
use sha2::Sha256;
use signet_capture::CaptureSurface;
use signet_capture::PointerPoint;
use signet_compose::CertificateLabels;
use signet_compose::PdfCompositor;
use signet_core::AuditRecord;
use signet_core::ComposeError;
use signet_core::ComposeRequest;
use signet_core::DocumentCompositor;
use signet_core::FieldKey;
use signet_core::FieldKind;
use signet_core::FieldMapping;
use signet_core::HashAlgorithm;
use signet_core::RequestId;
use signet_core::SignerProfile;
use signet_core::TenantBranding;
use signet_core::Timestamp;
use signet_core::hashing::hash_bytes;

/// Fixed completion time used by the tests.
const NOW: Timestamp = Timestamp::from_unix_millis(1_700_000_000_000);

/// Builds a minimal PDF with `pages` empty A4 pages.
fn minimal_pdf(pages: usize) -> Vec<u8> {
    let mut doc = Document::with_version("1.5");
    let pages_id = doc.new_object_id();
    let mut kids = Vec::new();
    for _ in 0..pages {
        let content = Content {
            operations: Vec::new(),
        };
        let content_id = doc.add_object(Stream::new(dictionary! {}, content.encode().unwrap()));
        let page_id = doc.add_object(dictionary! {
            "Type" => "Page",
            "Parent" => pages_id,
            "MediaBox" => vec![0_i64.into(), 0_i64.into(), 595_i64.into(), 842_i64.into()],
            "Contents" => content_id,
        });
        kids.push(Object::Reference(page_id));
    }
    let count = i64::try_from(pages).unwrap();
    doc.objects.insert(
        pages_id,
        Object::Dictionary(dictionary! {
            "Type" => "Pages",
            "Kids" => kids,
            "Count" => count,
        }),
    );
    let catalog_id = doc.add_object(dictionary! {
        "Type" => "Catalog",
        "Pages" => pages_id,
    });
    doc.trailer.set("Root", catalog_id);

    let mut out = Vec::new();
    doc.save_to(&mut out).unwrap();
    out
}

/// Renders a small signature through the capture surface.
fn sample_signature() -> Vec<u8> {
    let mut surface = CaptureSurface::new();
    surface.resize(360, 120);
    surface.start(PointerPoint::new(30.0, 70.0));
    for step in 1..=30_u8 {
        let t = f32::from(step) * 10.0;
        surface.extend(PointerPoint::new(30.0 + t, 70.0 - (t * 0.1)));
    }
    surface.end();
    surface.export().unwrap()
}

/// Builds an audit record over `signature_png`.
fn sample_audit(signature_png: &[u8], email: Option<&str>) -> AuditRecord {
    AuditRecord {
        request_id: RequestId::new("req-20f4a1b2c3"),
        signer_name: "Ana Torres".to_string(),
        signer_email: email.map(str::to_string),
        completed_at: NOW,
        client_address: "203.0.113.9".to_string(),
        user_agent: "test-agent/1.0".to_string(),
        signature_hash: hash_bytes(HashAlgorithm::Sha256, signature_png),
        disposition: signet_core::DISPOSITION_SIGNED.to_string(),
    }
}

/// Builds a text mapping.
fn text_field(key: &str, page: u32) -> FieldMapping {
    FieldMapping {
        key: FieldKey::new(key),
        kind: FieldKind::Text,
        page,
        x: 60.0,
        y: 140.0,
        width: 200.0,
        height: 16.0,
        trigger_value: None,
    }
}

/// Builds a signature mapping.
fn signature_field(page: u32, x: f64, y: f64) -> FieldMapping {
    FieldMapping {
        key: FieldKey::new("signature"),
        kind: FieldKind::Signature,
        page,
        x,
        y,
        width: 180.0,
        height: 60.0,
        trigger_value: None,
    }
}

/// Returns true when `needle` occurs in `haystack`.
fn contains(haystack: &[u8], needle: &[u8]) -> bool {
    haystack.windows(needle.len()).any(|window| window == needle)
}

/// Returns the concatenated content of page `number` (1-based).
fn page_content(doc: &Document, number: u32) -> Vec<u8> {
    let pages = doc.get_pages();
    let page_id = *pages.get(&number).unwrap();
    doc.get_page_content(page_id).unwrap()
}

/// Counts occurrences of `operator` on page `number`.
fn count_ops(doc: &Document, number: u32, operator: &str) -> usize {
    let content = Content::decode(&page_content(doc, number)).unwrap();
    content.operations.iter().filter(|op| op.operator == operator).count()
}

/// Returns true when page `number` draws the named image XObject.
fn draws_image(doc: &Document, number: u32, name: &str) -> bool {
    let content = Content::decode(&page_content(doc, number)).unwrap();
    let expected = Object::Name(name.as_bytes().to_vec());
    content
        .operations
        .iter()
        .any(|op| op.operator == "Do" && op.operands.first() == Some(&expected))
}

/// Verifies the composed output carries filled fields, a stamp, and the
/// certificate page, and that the rendered hash matches the signature bytes.
#[test]
fn compose_fills_stamps_and_appends_certificate() {
    let signature = sample_signature();
    let mut profile = SignerProfile::new();
    profile.set(FieldKey::new("full_name"), Some("Ana Torres".to_string()));
    profile.set(FieldKey::new("accepts_terms"), Some("sí".to_string()));
    profile.set(FieldKey::new("newsletter"), Some("No".to_string()));

    let checkbox = |key: &str, y: f64| FieldMapping {
        key: FieldKey::new(key),
        kind: FieldKind::Checkbox,
        page: 1,
        x: 40.0,
        y,
        width: 14.0,
        height: 14.0,
        trigger_value: Some("Sí".to_string()),
    };
    let request = ComposeRequest {
        source_pdf: minimal_pdf(1),
        mappings: vec![
            text_field("full_name", 1),
            checkbox("accepts_terms", 200.0),
            checkbox("newsletter", 230.0),
            text_field("city", 99),
            signature_field(1, 300.0, 600.0),
        ],
        profile,
        signature_png: signature.clone(),
        audit: sample_audit(&signature, Some("ana@example.com")),
        tenant: TenantBranding {
            display_name: "Acme Legal".to_string(),
        },
    };

    let composed = PdfCompositor::new(CertificateLabels::default()).compose(&request).unwrap();
    let doc = Document::load_mem(&composed).unwrap();
    assert_eq!(doc.get_pages().len(), 2);

    let first = page_content(&doc, 1);
    assert!(contains(&first, b"Ana Torres"));
    // Exactly one check mark: the matching checkbox strokes a path, the
    // non-matching one draws nothing.
    assert_eq!(count_ops(&doc, 1, "S"), 1);
    assert!(draws_image(&doc, 1, "SgIm0"));

    let certificate = page_content(&doc, 2);
    assert!(contains(&certificate, b"Signature Certificate"));
    assert!(contains(&certificate, b"Acme Legal"));
    assert!(contains(&certificate, b"ana@example.com"));
    assert!(contains(&certificate, b"REQ-20F4"));

    // Audit round trip: the rendered prefix matches an independent digest of
    // the signature bytes.
    let mut hasher = Sha256::new();
    hasher.update(&signature);
    let independent = format!("{:x}", hasher.finalize()).to_uppercase();
    assert!(contains(&certificate, independent[..16].as_bytes()));
}

/// Verifies a template with no signature fields gets one default stamp on
/// the last page.
#[test]
fn compose_defaults_stamp_without_signature_fields() {
    let signature = sample_signature();
    let request = ComposeRequest {
        source_pdf: minimal_pdf(2),
        mappings: vec![text_field("full_name", 1)],
        profile: SignerProfile::new(),
        signature_png: signature.clone(),
        audit: sample_audit(&signature, None),
        tenant: TenantBranding {
            display_name: "Acme Legal".to_string(),
        },
    };

    let composed = PdfCompositor::new(CertificateLabels::default()).compose(&request).unwrap();
    let doc = Document::load_mem(&composed).unwrap();
    assert_eq!(doc.get_pages().len(), 3);

    // The stamp lands on the last original page, not the first.
    assert!(!draws_image(&doc, 1, "SgIm0"));
    assert!(draws_image(&doc, 2, "SgIm0"));
}

/// Verifies multiple signature fields each receive a stamp.
#[test]
fn compose_stamps_every_signature_field() {
    let signature = sample_signature();
    let request = ComposeRequest {
        source_pdf: minimal_pdf(2),
        mappings: vec![signature_field(1, 60.0, 600.0), signature_field(2, 60.0, 600.0)],
        profile: SignerProfile::new(),
        signature_png: signature.clone(),
        audit: sample_audit(&signature, None),
        tenant: TenantBranding {
            display_name: "Acme Legal".to_string(),
        },
    };

    let composed = PdfCompositor::new(CertificateLabels::default()).compose(&request).unwrap();
    let doc = Document::load_mem(&composed).unwrap();
    assert!(draws_image(&doc, 1, "SgIm0"));
    assert!(draws_image(&doc, 2, "SgIm1"));
}

/// Verifies a missing signer email renders the configured placeholder.
#[test]
fn compose_renders_not_provided_placeholder() {
    let signature = sample_signature();
    let request = ComposeRequest {
        source_pdf: minimal_pdf(1),
        mappings: Vec::new(),
        profile: SignerProfile::new(),
        signature_png: signature.clone(),
        audit: sample_audit(&signature, None),
        tenant: TenantBranding {
            display_name: "Acme Legal".to_string(),
        },
    };

    let composed = PdfCompositor::new(CertificateLabels::default()).compose(&request).unwrap();
    let doc = Document::load_mem(&composed).unwrap();
    assert!(contains(&page_content(&doc, 2), b"Not provided"));
}

/// Verifies reserved date keys resolve from the completion timestamp.
#[test]
fn compose_fills_reserved_date_fields() {
    let signature = sample_signature();
    let request = ComposeRequest {
        source_pdf: minimal_pdf(1),
        mappings: vec![text_field("today_year", 1)],
        profile: SignerProfile::new(),
        signature_png: signature.clone(),
        audit: sample_audit(&signature, None),
        tenant: TenantBranding {
            display_name: "Acme Legal".to_string(),
        },
    };

    let composed = PdfCompositor::new(CertificateLabels::default()).compose(&request).unwrap();
    let doc = Document::load_mem(&composed).unwrap();
    // 1_700_000_000_000 ms falls in 2023 UTC.
    assert!(contains(&page_content(&doc, 1), b"2023"));
}

/// Verifies parse and decode failures are fatal with no output.
#[test]
fn compose_fails_closed_on_bad_inputs() {
    let signature = sample_signature();
    let compositor = PdfCompositor::new(CertificateLabels::default());

    let bad_source = ComposeRequest {
        source_pdf: b"not a pdf".to_vec(),
        mappings: Vec::new(),
        profile: SignerProfile::new(),
        signature_png: signature.clone(),
        audit: sample_audit(&signature, None),
        tenant: TenantBranding {
            display_name: "Acme Legal".to_string(),
        },
    };
    assert!(matches!(compositor.compose(&bad_source), Err(ComposeError::Parse(_))));

    let bad_signature = ComposeRequest {
        source_pdf: minimal_pdf(1),
        mappings: Vec::new(),
        profile: SignerProfile::new(),
        signature_png: b"not an image".to_vec(),
        audit: sample_audit(&signature, None),
        tenant: TenantBranding {
            display_name: "Acme Legal".to_string(),
        },
    };
    assert!(matches!(compositor.compose(&bad_signature), Err(ComposeError::Signature(_))));
}
