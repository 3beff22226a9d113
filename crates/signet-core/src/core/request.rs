// crates/signet-core/src/core/request.rs
// ============================================================================
// Module: Signet Signature Requests
// Description: Signature request lifecycle, completion records, and branding.
// Purpose: Capture the single shared mutable record of a signing attempt.
// Dependencies: crate::core::{hashing, identifiers, time}, serde
// ============================================================================

//! ## Overview
//! A [`SignatureRequest`] represents one instance of "this document needs a
//! signature from this person". It is created by an external issuance flow in
//! `Pending` status and transitions to `Signed` exactly once through the
//! atomic completion step; `Expired` and `Cancelled` are terminal states
//! reached through housekeeping or lazy expiry. Terminal states are never
//! left.

// ============================================================================
// SECTION: Imports
// ============================================================================

use serde::Deserialize;
use serde::Serialize;

use crate::core::hashing::HashDigest;
use crate::core::identifiers::RequestId;
use crate::core::identifiers::RequestToken;
use crate::core::identifiers::TemplateId;
use crate::core::identifiers::TenantId;
use crate::core::time::Timestamp;

// ============================================================================
// SECTION: Request Status
// ============================================================================

/// Signature request lifecycle status.
///
/// # Invariants
/// - Variants are stable for serialization and store round-trips.
/// - `Signed`, `Expired`, and `Cancelled` are terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RequestStatus {
    /// Awaiting signature; the only state completion may start from.
    Pending,
    /// Signed and certified; completion artifacts are recorded.
    Signed,
    /// Deadline passed before signing.
    Expired,
    /// Withdrawn by the requester.
    Cancelled,
}

impl RequestStatus {
    /// Returns true for states that never transition again.
    #[must_use]
    pub const fn is_terminal(self) -> bool {
        matches!(self, Self::Signed | Self::Expired | Self::Cancelled)
    }

    /// Returns the stable string form used by durable stores.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Signed => "signed",
            Self::Expired => "expired",
            Self::Cancelled => "cancelled",
        }
    }
}

// ============================================================================
// SECTION: Signature Request
// ============================================================================

/// One document awaiting one person's signature.
///
/// # Invariants
/// - `signed_document_path`, `signature_path`, `signature_hash`, and
///   `signed_at` are `Some` if and only if `status == Signed`.
/// - `token` is the only signer-facing handle; stores must scope every
///   lookup by it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SignatureRequest {
    /// Opaque access token for the signing session.
    pub token: RequestToken,
    /// Internal request identifier used for path namespacing and audit labels.
    pub request_id: RequestId,
    /// Owning tenant.
    pub tenant_id: TenantId,
    /// Template describing the document and its field layout.
    pub template_id: TemplateId,
    /// Signer display name.
    pub signer_name: String,
    /// Signer email, when collected by the issuance flow.
    pub signer_email: Option<String>,
    /// Display name of the person who requested the signature.
    pub requester_name: String,
    /// Lifecycle status.
    pub status: RequestStatus,
    /// Storage path of the source document.
    pub document_path: String,
    /// Storage path of the signed output; set by completion.
    pub signed_document_path: Option<String>,
    /// Storage path of the raw signature image; set by completion.
    pub signature_path: Option<String>,
    /// Digest of the raw signature bytes; set by completion.
    pub signature_hash: Option<HashDigest>,
    /// Expiry deadline for the signing session.
    pub expires_at: Timestamp,
    /// Completion time; set by completion.
    pub signed_at: Option<Timestamp>,
}

impl SignatureRequest {
    /// Returns true when the expiry deadline has passed at `now`.
    #[must_use]
    pub fn is_expired_at(&self, now: Timestamp) -> bool {
        self.expires_at.is_before(now)
    }
}

// ============================================================================
// SECTION: Tenant Branding
// ============================================================================

/// Tenant display metadata shown to signers and on the audit certificate.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TenantBranding {
    /// Tenant display name rendered in the certificate header band.
    pub display_name: String,
}

// ============================================================================
// SECTION: Completion
// ============================================================================

/// Signer identity snapshot frozen into the completion record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SignerIdentity {
    /// Signer display name at completion time.
    pub name: String,
    /// Signer email at completion time, when provided.
    pub email: Option<String>,
}

/// Inputs to the atomic completion step.
///
/// # Invariants
/// - Both storage paths must already be durably written before the record
///   is submitted; completion never references a missing artifact.
/// - `signature_hash` is computed from the exact uploaded signature bytes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CompletionRecord {
    /// Storage path of the composed, signed document.
    pub signed_document_path: String,
    /// Storage path of the raw signature image.
    pub signature_path: String,
    /// Digest of the raw signature bytes.
    pub signature_hash: HashDigest,
    /// Signer identity snapshot.
    pub signer: SignerIdentity,
    /// Client network address observed at completion, or `"unknown"`.
    pub client_address: String,
    /// Client user-agent string observed at completion.
    pub user_agent: String,
    /// Completion timestamp supplied by the host.
    pub completed_at: Timestamp,
}

/// Outcome of the atomic completion step.
///
/// # Invariants
/// - `Conflict` means another attempt already finalized the request; the
///   caller must treat it as a soft success, never as an error.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CompletionOutcome {
    /// This attempt performed the single `Pending → Signed` transition.
    Completed,
    /// The request was already finalized by a concurrent attempt.
    Conflict,
}
