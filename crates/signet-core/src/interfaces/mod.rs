// crates/signet-core/src/interfaces/mod.rs
// ============================================================================
// Module: Signet Interfaces
// Description: Backend-agnostic interfaces for storage, composition, and I/O.
// Purpose: Define the contract surfaces used by the signing-session runtime.
// Dependencies: crate::core
// ============================================================================

//! ## Overview
//! Interfaces define how Signet integrates with external systems without
//! embedding backend-specific details. Request stores are token-scoped by
//! contract: implementations must never expose lookups keyed by bare row
//! identifiers, because the token is the tenant-isolation boundary for the
//! signer-facing surface. Implementations fail closed on missing or invalid
//! data.

// ============================================================================
// SECTION: Imports
// ============================================================================

use serde::Deserialize;
use serde::Serialize;
use thiserror::Error;

use crate::core::AuditRecord;
use crate::core::CompletionOutcome;
use crate::core::CompletionRecord;
use crate::core::FieldMapping;
use crate::core::ProfileUpdate;
use crate::core::RequestToken;
use crate::core::SignatureRequest;
use crate::core::SignerProfile;
use crate::core::TenantBranding;
use crate::core::Timestamp;

// ============================================================================
// SECTION: Request Store
// ============================================================================

/// Request store errors.
#[derive(Debug, Error)]
pub enum StoreError {
    /// Token does not resolve to a request.
    #[error("request store: unknown token")]
    NotFound,
    /// Store I/O error.
    #[error("request store io error: {0}")]
    Io(String),
    /// Store data is corrupted or fails integrity checks.
    #[error("request store corruption: {0}")]
    Corrupt(String),
    /// Store data version is incompatible.
    #[error("request store version mismatch: {0}")]
    VersionMismatch(String),
    /// Store data is invalid.
    #[error("request store invalid data: {0}")]
    Invalid(String),
}

/// Token-scoped persistence for signature requests.
///
/// # Invariants
/// - Every operation is keyed by the request token; implementations must
///   reject or fail closed on any other access path.
/// - `complete_signature` must be atomic and guarded by a compare-and-set on
///   `Pending` status so concurrent attempts cannot double-finalize.
pub trait RequestStore {
    /// Loads the request identified by `token`.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] when loading fails; an unknown token is
    /// `Ok(None)`, not an error.
    fn get_request(&self, token: &RequestToken) -> Result<Option<SignatureRequest>, StoreError>;

    /// Loads the field mappings of the request's template.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::NotFound`] when the token does not resolve.
    fn get_field_mappings(&self, token: &RequestToken) -> Result<Vec<FieldMapping>, StoreError>;

    /// Loads the signer profile for the request.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::NotFound`] when the token does not resolve.
    fn get_signer_profile(&self, token: &RequestToken) -> Result<SignerProfile, StoreError>;

    /// Merges a partial profile update; only provided keys change.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::NotFound`] when the token does not resolve.
    fn update_signer_profile(
        &self,
        token: &RequestToken,
        updates: &ProfileUpdate,
    ) -> Result<(), StoreError>;

    /// Loads the owning tenant's display metadata.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::NotFound`] when the token does not resolve.
    fn get_tenant_branding(&self, token: &RequestToken) -> Result<TenantBranding, StoreError>;

    /// Marks a pending request expired (lazy expiry).
    ///
    /// Already-terminal requests are left untouched so the check stays
    /// idempotent.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::NotFound`] when the token does not resolve.
    fn mark_expired(&self, token: &RequestToken) -> Result<(), StoreError>;

    /// Atomically finalizes the request and writes its audit record.
    ///
    /// The transition happens only when the current status is still
    /// `Pending`; otherwise [`CompletionOutcome::Conflict`] is returned and
    /// nothing is written.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] when the transaction fails outright.
    fn complete_signature(
        &self,
        token: &RequestToken,
        record: &CompletionRecord,
    ) -> Result<CompletionOutcome, StoreError>;

    /// Returns the audit records written for the request.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::NotFound`] when the token does not resolve.
    fn get_audit_records(&self, token: &RequestToken) -> Result<Vec<AuditRecord>, StoreError>;
}

// ============================================================================
// SECTION: Document Store
// ============================================================================

/// Document storage errors.
#[derive(Debug, Error)]
pub enum StorageError {
    /// Object does not exist at the given bucket and path.
    #[error("storage object not found: {bucket}/{path}")]
    NotFound {
        /// Bucket name.
        bucket: String,
        /// Object path.
        path: String,
    },
    /// Upload failed.
    #[error("storage upload failed: {0}")]
    Upload(String),
    /// Download failed.
    #[error("storage download failed: {0}")]
    Download(String),
    /// Signed URL creation failed.
    #[error("storage signed url failed: {0}")]
    SignedUrl(String),
}

/// Durable artifact storage for source documents, signatures, and output.
pub trait DocumentStore {
    /// Writes `bytes` at `bucket`/`path`, replacing any existing object.
    ///
    /// # Errors
    ///
    /// Returns [`StorageError`] when the write is not durable.
    fn upload(
        &self,
        bucket: &str,
        path: &str,
        bytes: &[u8],
        content_type: &str,
    ) -> Result<(), StorageError>;

    /// Reads the object at `bucket`/`path`.
    ///
    /// # Errors
    ///
    /// Returns [`StorageError`] when the object is missing or unreadable.
    fn download(&self, bucket: &str, path: &str) -> Result<Vec<u8>, StorageError>;

    /// Creates a time-limited retrieval URL for the object.
    ///
    /// # Errors
    ///
    /// Returns [`StorageError`] when the URL cannot be minted.
    fn create_signed_url(
        &self,
        bucket: &str,
        path: &str,
        ttl_seconds: u64,
    ) -> Result<String, StorageError>;
}

// ============================================================================
// SECTION: Client Address Source
// ============================================================================

/// Client network-address lookup errors.
#[derive(Debug, Error)]
pub enum AddressError {
    /// Lookup failed; callers substitute the unknown-address placeholder.
    #[error("client address lookup failed: {0}")]
    Lookup(String),
}

/// Best-effort resolver for the signer's public network address.
///
/// Failures are never fatal to a signing attempt; the session substitutes
/// [`crate::core::UNKNOWN_CLIENT_ADDRESS`].
pub trait ClientAddressSource {
    /// Resolves the client's public network address.
    ///
    /// # Errors
    ///
    /// Returns [`AddressError`] when the address cannot be determined.
    fn client_address(&self) -> Result<String, AddressError>;
}

// ============================================================================
// SECTION: Document Compositor
// ============================================================================

/// Composition errors.
///
/// Every variant is fatal to the signing attempt; field-level issues degrade
/// inside the compositor instead of surfacing here.
#[derive(Debug, Error)]
pub enum ComposeError {
    /// Source document failed to parse.
    #[error("document parse failed: {0}")]
    Parse(String),
    /// Signature image failed to decode.
    #[error("signature image decode failed: {0}")]
    Signature(String),
    /// Font resource could not be prepared.
    #[error("font setup failed: {0}")]
    Font(String),
    /// Composed document failed to serialize.
    #[error("document serialize failed: {0}")]
    Serialize(String),
}

/// Inputs to one composition run.
///
/// # Invariants
/// - `audit` is already final; the compositor renders it verbatim and must
///   not derive or mutate any of its values.
#[derive(Debug, Clone, PartialEq)]
pub struct ComposeRequest {
    /// Source document bytes.
    pub source_pdf: Vec<u8>,
    /// Template field mappings.
    pub mappings: Vec<FieldMapping>,
    /// Resolved signer profile.
    pub profile: SignerProfile,
    /// Raw captured signature image (PNG).
    pub signature_png: Vec<u8>,
    /// Final audit record to render on the certificate page.
    pub audit: AuditRecord,
    /// Owning tenant's display metadata.
    pub tenant: TenantBranding,
}

/// Produces the signed output document from a composition request.
pub trait DocumentCompositor {
    /// Fills fields, stamps the signature, and appends the certificate page.
    ///
    /// All-or-nothing: a returned error means no output bytes exist.
    ///
    /// # Errors
    ///
    /// Returns [`ComposeError`] on parse, decode, font, or serialize failure.
    fn compose(&self, request: &ComposeRequest) -> Result<Vec<u8>, ComposeError>;
}

// ============================================================================
// SECTION: Event Sink
// ============================================================================

/// Structured operational event emitted by the session runtime.
///
/// # Invariants
/// - Events carry token and stage context only; profile values and signature
///   bytes never appear here.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionEvent {
    /// Request token the event belongs to.
    pub token: RequestToken,
    /// Pipeline stage that emitted the event.
    pub stage: String,
    /// Short outcome label (`ok`, `failed`, `conflict`, ...).
    pub outcome: String,
    /// Optional display-safe detail.
    pub detail: Option<String>,
    /// Event timestamp supplied by the runtime's caller.
    pub at: Timestamp,
}

/// Destination for session events.
///
/// Emission is best-effort: implementations must not propagate their own
/// failures into the signing pipeline.
pub trait EventSink {
    /// Records one event.
    fn emit(&self, event: &SessionEvent);
}
