// crates/signet-core/src/core/audit.rs
// ============================================================================
// Module: Signet Audit Records
// Description: Tamper-evidence metadata embedded in signed documents.
// Purpose: Freeze the who/when/where/what of a completed signature.
// Dependencies: crate::core::{hashing, identifiers, time}, serde
// ============================================================================

//! ## Overview
//! An [`AuditRecord`] is constructed exactly once per completion, from the
//! final raster signature bytes and the client context observed at that
//! moment. It is rendered onto the appended certificate page and persisted in
//! the same atomic operation that finalizes the request; it is never
//! recomputed or mutated afterward.

// ============================================================================
// SECTION: Imports
// ============================================================================

use serde::Deserialize;
use serde::Serialize;

use crate::core::hashing::HashDigest;
use crate::core::identifiers::RequestId;
use crate::core::time::Timestamp;

// ============================================================================
// SECTION: Constants
// ============================================================================

/// Fixed disposition label rendered on the certificate page.
pub const DISPOSITION_SIGNED: &str = "Signed and certified";

/// Placeholder recorded when the client network address cannot be resolved.
pub const UNKNOWN_CLIENT_ADDRESS: &str = "unknown";

/// Hex digits of the signature hash rendered on the certificate page.
pub const AUDIT_HASH_PREFIX_LEN: usize = 16;

/// Longest user-agent string rendered on the certificate page.
pub const AUDIT_USER_AGENT_MAX_LEN: usize = 64;

// ============================================================================
// SECTION: Audit Record
// ============================================================================

/// Tamper-evidence artifact for one completed signature.
///
/// # Invariants
/// - `signature_hash` is computed from the exact uploaded signature bytes.
/// - Constructed transiently during composition and written once; downstream
///   code treats it as immutable.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AuditRecord {
    /// Request identifier the record certifies.
    pub request_id: RequestId,
    /// Signer display name.
    pub signer_name: String,
    /// Signer email, when provided.
    pub signer_email: Option<String>,
    /// Completion timestamp.
    pub completed_at: Timestamp,
    /// Client network address, or [`UNKNOWN_CLIENT_ADDRESS`].
    pub client_address: String,
    /// Client user-agent string.
    pub user_agent: String,
    /// Digest of the raw signature bytes.
    pub signature_hash: HashDigest,
    /// Final disposition label; always [`DISPOSITION_SIGNED`].
    pub disposition: String,
}

impl AuditRecord {
    /// Returns the user-agent truncated for certificate rendering.
    #[must_use]
    pub fn user_agent_label(&self) -> String {
        self.user_agent.chars().take(AUDIT_USER_AGENT_MAX_LEN).collect()
    }

    /// Returns the truncated hash prefix rendered on the certificate.
    #[must_use]
    pub fn hash_label(&self) -> String {
        self.signature_hash.audit_prefix(AUDIT_HASH_PREFIX_LEN)
    }
}
