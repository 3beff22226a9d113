// crates/signet-compose/src/certificate.rs
// ============================================================================
// Module: Audit Certificate Page
// Description: Renders the appended tamper-evidence certificate page.
// Purpose: Lay out the audit table, signature seal, and legal footer.
// Dependencies: lopdf, signet-core, time, crate::draw
// ============================================================================

//! ## Overview
//! The certificate page is appended after the last document page and renders
//! the final [`AuditRecord`] verbatim: header band with product and tenant
//! branding, the labeled audit table, the signature image as a visual seal,
//! and the fixed legal footer. Timestamps render in a fixed UTC form so the
//! page is reproducible from the persisted record.

// ============================================================================
// SECTION: Imports
// ============================================================================

use lopdf::content::Operation;
use signet_core::AuditRecord;
use signet_core::PageSize;
use signet_core::RenderPoint;
use signet_core::fit_inside;
use time::OffsetDateTime;

use crate::draw::filled_rect_ops;
use crate::draw::gray_text_ops;
use crate::draw::image_ops;
use crate::draw::rule_ops;

// ============================================================================
// SECTION: Labels
// ============================================================================

/// Display strings rendered on the certificate page.
///
/// Passed in explicitly from host configuration; the compositor keeps no
/// ambient branding.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CertificateLabels {
    /// Product name for the header band and attribution line.
    pub product_name: String,
    /// Legal notice rendered above the attribution line.
    pub legal_notice: String,
    /// Placeholder rendered when the signer provided no email.
    pub not_provided: String,
}

impl Default for CertificateLabels {
    fn default() -> Self {
        Self {
            product_name: "Signet".to_string(),
            legal_notice: "This page certifies the electronic signature applied to this document."
                .to_string(),
            not_provided: "Not provided".to_string(),
        }
    }
}

// ============================================================================
// SECTION: Layout Constants
// ============================================================================

/// Page margin in points.
const MARGIN: f64 = 54.0;
/// Header band height in points.
const HEADER_HEIGHT: f64 = 72.0;
/// Header band fill color.
const HEADER_RGB: (f64, f64, f64) = (0.13, 0.17, 0.25);
/// Horizontal offset of audit values relative to their labels.
const VALUE_COLUMN_OFFSET: f64 = 150.0;
/// Vertical distance between audit rows.
const ROW_STEP: f64 = 22.0;
/// Bounding box for the signature seal, in points.
const SEAL_BOUNDS: (f64, f64) = (220.0, 70.0);
/// Regular font resource name on the certificate page.
pub const CERT_FONT: &str = "F1";
/// Bold font resource name on the certificate page.
pub const CERT_FONT_BOLD: &str = "F2";
/// Seal image resource name on the certificate page.
pub const CERT_SEAL: &str = "Seal";

// ============================================================================
// SECTION: Page Content
// ============================================================================

/// Builds the full content-operation list for the certificate page.
#[must_use]
pub fn certificate_ops(
    page: PageSize,
    audit: &AuditRecord,
    tenant_name: &str,
    labels: &CertificateLabels,
    seal_px: (u32, u32),
) -> Vec<Operation> {
    let mut ops = Vec::new();

    // Header band with product and tenant branding.
    ops.extend(filled_rect_ops(0.0, page.height - HEADER_HEIGHT, page.width, HEADER_HEIGHT, HEADER_RGB));
    ops.extend(gray_text_ops(
        CERT_FONT_BOLD,
        16.0,
        1.0,
        RenderPoint {
            x: MARGIN,
            y: page.height - 32.0,
        },
        &labels.product_name,
    ));
    ops.extend(gray_text_ops(
        CERT_FONT,
        10.0,
        0.85,
        RenderPoint {
            x: MARGIN,
            y: page.height - 52.0,
        },
        tenant_name,
    ));

    // Title and separator.
    let title_y = page.height - HEADER_HEIGHT - 40.0;
    ops.extend(gray_text_ops(
        CERT_FONT_BOLD,
        14.0,
        0.1,
        RenderPoint {
            x: MARGIN,
            y: title_y,
        },
        "Signature Certificate",
    ));
    ops.extend(rule_ops(MARGIN, title_y - 10.0, page.width - 2.0 * MARGIN, 0.7));

    // Audit table, top to bottom.
    let email = audit
        .signer_email
        .as_deref()
        .map(str::trim)
        .filter(|value| !value.is_empty())
        .unwrap_or(&labels.not_provided);
    let request_label = audit.request_id.audit_label();
    let completed = format_utc(audit);
    let hash_label = audit.hash_label();
    let user_agent = audit.user_agent_label();
    let rows: [(&str, &str); 8] = [
        ("Request", &request_label),
        ("Signer", &audit.signer_name),
        ("Email", email),
        ("Completed", &completed),
        ("Network address", &audit.client_address),
        ("Client", &user_agent),
        ("Signature SHA-256", &hash_label),
        ("Status", &audit.disposition),
    ];
    let mut row_y = title_y - 36.0;
    for (label, value) in rows {
        ops.extend(gray_text_ops(
            CERT_FONT_BOLD,
            9.0,
            0.35,
            RenderPoint {
                x: MARGIN,
                y: row_y,
            },
            label,
        ));
        ops.extend(gray_text_ops(
            CERT_FONT,
            10.0,
            0.1,
            RenderPoint {
                x: MARGIN + VALUE_COLUMN_OFFSET,
                y: row_y,
            },
            value,
        ));
        row_y -= ROW_STEP;
    }

    // Signature seal.
    let (seal_w, seal_h) =
        fit_inside(f64::from(seal_px.0), f64::from(seal_px.1), SEAL_BOUNDS.0, SEAL_BOUNDS.1);
    let seal_top = row_y - 16.0;
    ops.extend(gray_text_ops(
        CERT_FONT_BOLD,
        9.0,
        0.35,
        RenderPoint {
            x: MARGIN,
            y: seal_top,
        },
        "Signature",
    ));
    ops.extend(image_ops(
        CERT_SEAL,
        RenderPoint {
            x: MARGIN,
            y: seal_top - 10.0 - seal_h,
        },
        seal_w,
        seal_h,
    ));

    // Legal footer and attribution.
    ops.extend(rule_ops(MARGIN, 80.0, page.width - 2.0 * MARGIN, 0.7));
    ops.extend(gray_text_ops(
        CERT_FONT,
        8.0,
        0.45,
        RenderPoint {
            x: MARGIN,
            y: 64.0,
        },
        &labels.legal_notice,
    ));
    let attribution = format!("Generated by {}", labels.product_name);
    ops.extend(gray_text_ops(
        CERT_FONT,
        8.0,
        0.45,
        RenderPoint {
            x: MARGIN,
            y: 50.0,
        },
        &attribution,
    ));

    ops
}

// ============================================================================
// SECTION: Timestamp Formatting
// ============================================================================

/// Renders the completion timestamp as `YYYY-MM-DD HH:MM:SS UTC`.
fn format_utc(audit: &AuditRecord) -> String {
    OffsetDateTime::from_unix_timestamp(audit.completed_at.as_unix_seconds()).map_or_else(
        |_| "unknown".to_string(),
        |moment| {
            format!(
                "{:04}-{:02}-{:02} {:02}:{:02}:{:02} UTC",
                moment.year(),
                u8::from(moment.month()),
                moment.day(),
                moment.hour(),
                moment.minute(),
                moment.second()
            )
        },
    )
}
