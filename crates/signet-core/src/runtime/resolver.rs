// crates/signet-core/src/runtime/resolver.rs
// ============================================================================
// Module: Signet Field Resolution
// Description: Token-scoped session loading, lazy expiry, and corrections.
// Purpose: Decide whether signing may proceed and what data is still missing.
// Dependencies: crate::{core, interfaces}
// ============================================================================

//! ## Overview
//! Field resolution is the read side of the signing session: it loads the
//! request, branding, mappings, and profile through the token-scoped store,
//! applies lazy expiry, and computes the missing-field set that gates the
//! `NeedsData`/`Ready` split. All lookups go through the token; there is no
//! path here that accepts a bare row identifier.

// ============================================================================
// SECTION: Imports
// ============================================================================

use thiserror::Error;

use crate::core::FieldKey;
use crate::core::FieldMapping;
use crate::core::ProfileUpdate;
use crate::core::RequestStatus;
use crate::core::RequestToken;
use crate::core::SignatureRequest;
use crate::core::SignerProfile;
use crate::core::TenantBranding;
use crate::core::Timestamp;
use crate::core::missing_fields;
use crate::interfaces::RequestStore;
use crate::interfaces::StoreError;

// ============================================================================
// SECTION: Resolution Errors
// ============================================================================

/// Errors surfaced while resolving a signing session.
#[derive(Debug, Error)]
pub enum ResolveError {
    /// Token does not resolve to any request; the signer needs a new link.
    #[error("signing link not found")]
    NotFound,
    /// Deadline passed or the request was cancelled before signing.
    #[error("signing link expired")]
    Expired,
    /// Underlying store failure.
    #[error(transparent)]
    Store(#[from] StoreError),
}

// ============================================================================
// SECTION: Session Snapshot
// ============================================================================

/// Disposition of a loaded session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionDisposition {
    /// Required fields still lack usable values; signing is blocked.
    NeedsData,
    /// All required data is present; signing may begin.
    Ready,
    /// The request was already finalized; idempotent re-view, not an error.
    AlreadySigned {
        /// Storage path of the signed output, when recorded.
        signed_document_path: Option<String>,
    },
}

/// Immutable view of a signing session returned by [`load_session`].
#[derive(Debug, Clone, PartialEq)]
pub struct SessionSnapshot {
    /// The resolved signature request.
    pub request: SignatureRequest,
    /// Owning tenant's display metadata.
    pub branding: TenantBranding,
    /// Template field mappings.
    pub mappings: Vec<FieldMapping>,
    /// Signer profile at load time.
    pub profile: SignerProfile,
    /// Keys of fields still missing usable values.
    pub missing: Vec<FieldKey>,
    /// Load disposition.
    pub disposition: SessionDisposition,
}

// ============================================================================
// SECTION: Session Loading
// ============================================================================

/// Loads the signing session identified by `token`.
///
/// Applies lazy expiry: a `Pending` request whose deadline has passed at
/// `now` is marked expired through the store before [`ResolveError::Expired`]
/// is reported, so a later re-check observes the persisted state without
/// further mutation. An already-signed request resolves to an
/// [`SessionDisposition::AlreadySigned`] snapshot.
///
/// # Errors
///
/// Returns [`ResolveError::NotFound`] for unknown tokens,
/// [`ResolveError::Expired`] for expired or cancelled requests, and
/// [`ResolveError::Store`] on backend failure.
pub fn load_session<S: RequestStore>(
    store: &S,
    token: &RequestToken,
    now: Timestamp,
) -> Result<SessionSnapshot, ResolveError> {
    let request = store.get_request(token)?.ok_or(ResolveError::NotFound)?;

    match request.status {
        RequestStatus::Expired | RequestStatus::Cancelled => return Err(ResolveError::Expired),
        RequestStatus::Pending if request.is_expired_at(now) => {
            store.mark_expired(token)?;
            return Err(ResolveError::Expired);
        }
        RequestStatus::Pending | RequestStatus::Signed => {}
    }

    let branding = store.get_tenant_branding(token)?;
    let mappings = store.get_field_mappings(token)?;
    let profile = store.get_signer_profile(token)?;
    let missing: Vec<FieldKey> =
        missing_fields(&mappings, &profile).iter().map(|mapping| mapping.key.clone()).collect();

    let disposition = if request.status == RequestStatus::Signed {
        SessionDisposition::AlreadySigned {
            signed_document_path: request.signed_document_path.clone(),
        }
    } else if missing.is_empty() {
        SessionDisposition::Ready
    } else {
        SessionDisposition::NeedsData
    };

    Ok(SessionSnapshot {
        request,
        branding,
        mappings,
        profile,
        missing,
        disposition,
    })
}

/// Merges `updates` into the signer profile and recomputes the session.
///
/// Only the provided keys change. The returned snapshot is `Ready` when the
/// missing set is empty and `NeedsData` with the remaining subset otherwise.
///
/// # Errors
///
/// Propagates the same taxonomy as [`load_session`]; the expiry check is
/// re-applied so corrections cannot revive a request past its deadline.
pub fn submit_corrections<S: RequestStore>(
    store: &S,
    token: &RequestToken,
    updates: &ProfileUpdate,
    now: Timestamp,
) -> Result<SessionSnapshot, ResolveError> {
    store.update_signer_profile(token, updates)?;
    load_session(store, token, now)
}
