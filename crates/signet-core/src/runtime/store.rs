// crates/signet-core/src/runtime/store.rs
// ============================================================================
// Module: Signet Store Implementations
// Description: In-memory reference stores and shared store wrappers.
// Purpose: Provide deterministic store implementations without external deps.
// Dependencies: crate::{core, interfaces}
// ============================================================================

//! ## Overview
//! This module provides in-memory implementations of [`RequestStore`] and
//! [`DocumentStore`] for tests and local demos, plus `Arc`-backed shared
//! wrappers for running several sessions over one backend. The in-memory
//! request store performs its completion compare-and-set under a single
//! mutex hold, which gives the same atomicity guarantee the durable store
//! enforces with a transaction; it is not intended for production use.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::collections::BTreeMap;
use std::sync::Arc;
use std::sync::Mutex;

use crate::core::AuditRecord;
use crate::core::CompletionOutcome;
use crate::core::CompletionRecord;
use crate::core::FieldMapping;
use crate::core::ProfileUpdate;
use crate::core::RequestStatus;
use crate::core::RequestToken;
use crate::core::SignatureRequest;
use crate::core::SignerProfile;
use crate::core::TenantBranding;
use crate::interfaces::DocumentStore;
use crate::interfaces::RequestStore;
use crate::interfaces::StorageError;
use crate::interfaces::StoreError;

// ============================================================================
// SECTION: In-Memory Request Store
// ============================================================================

/// Everything the store tracks for one signing link.
#[derive(Debug, Clone)]
struct RequestEntry {
    /// The request record.
    request: SignatureRequest,
    /// Owning tenant's display metadata.
    branding: TenantBranding,
    /// Template field mappings.
    mappings: Vec<FieldMapping>,
    /// Signer profile.
    profile: SignerProfile,
    /// Audit records written by completion.
    audits: Vec<AuditRecord>,
}

/// In-memory request store for tests and demos.
#[derive(Debug, Default, Clone)]
pub struct InMemoryRequestStore {
    /// Request map protected by a mutex.
    entries: Arc<Mutex<BTreeMap<String, RequestEntry>>>,
}

impl InMemoryRequestStore {
    /// Creates a new in-memory request store.
    #[must_use]
    pub fn new() -> Self {
        Self {
            entries: Arc::new(Mutex::new(BTreeMap::new())),
        }
    }

    /// Seeds one signing link; stands in for the external issuance flow.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Invalid`] when the token is already seeded.
    pub fn insert_request(
        &self,
        request: SignatureRequest,
        branding: TenantBranding,
        mappings: Vec<FieldMapping>,
        profile: SignerProfile,
    ) -> Result<(), StoreError> {
        let mut guard = self.lock()?;
        let key = request.token.as_str().to_string();
        if guard.contains_key(&key) {
            return Err(StoreError::Invalid("token already seeded".to_string()));
        }
        guard.insert(key, RequestEntry {
            request,
            branding,
            mappings,
            profile,
            audits: Vec::new(),
        });
        Ok(())
    }

    /// Locks the entry map, failing closed on poisoning.
    fn lock(&self) -> Result<std::sync::MutexGuard<'_, BTreeMap<String, RequestEntry>>, StoreError> {
        self.entries
            .lock()
            .map_err(|_| StoreError::Io("request store mutex poisoned".to_string()))
    }
}

impl RequestStore for InMemoryRequestStore {
    fn get_request(&self, token: &RequestToken) -> Result<Option<SignatureRequest>, StoreError> {
        let guard = self.lock()?;
        Ok(guard.get(token.as_str()).map(|entry| entry.request.clone()))
    }

    fn get_field_mappings(&self, token: &RequestToken) -> Result<Vec<FieldMapping>, StoreError> {
        let guard = self.lock()?;
        guard.get(token.as_str()).map(|entry| entry.mappings.clone()).ok_or(StoreError::NotFound)
    }

    fn get_signer_profile(&self, token: &RequestToken) -> Result<SignerProfile, StoreError> {
        let guard = self.lock()?;
        guard.get(token.as_str()).map(|entry| entry.profile.clone()).ok_or(StoreError::NotFound)
    }

    fn update_signer_profile(
        &self,
        token: &RequestToken,
        updates: &ProfileUpdate,
    ) -> Result<(), StoreError> {
        let mut guard = self.lock()?;
        let entry = guard.get_mut(token.as_str()).ok_or(StoreError::NotFound)?;
        entry.profile.apply(updates);
        Ok(())
    }

    fn get_tenant_branding(&self, token: &RequestToken) -> Result<TenantBranding, StoreError> {
        let guard = self.lock()?;
        guard.get(token.as_str()).map(|entry| entry.branding.clone()).ok_or(StoreError::NotFound)
    }

    fn mark_expired(&self, token: &RequestToken) -> Result<(), StoreError> {
        let mut guard = self.lock()?;
        let entry = guard.get_mut(token.as_str()).ok_or(StoreError::NotFound)?;
        if entry.request.status == RequestStatus::Pending {
            entry.request.status = RequestStatus::Expired;
        }
        Ok(())
    }

    fn complete_signature(
        &self,
        token: &RequestToken,
        record: &CompletionRecord,
    ) -> Result<CompletionOutcome, StoreError> {
        let mut guard = self.lock()?;
        let entry = guard.get_mut(token.as_str()).ok_or(StoreError::NotFound)?;
        // Compare-and-set under the same lock that serializes every access:
        // a concurrent attempt observes the flipped status, never a second
        // write.
        if entry.request.status != RequestStatus::Pending {
            return Ok(CompletionOutcome::Conflict);
        }
        entry.request.status = RequestStatus::Signed;
        entry.request.signed_document_path = Some(record.signed_document_path.clone());
        entry.request.signature_path = Some(record.signature_path.clone());
        entry.request.signature_hash = Some(record.signature_hash.clone());
        entry.request.signed_at = Some(record.completed_at);
        entry.audits.push(AuditRecord {
            request_id: entry.request.request_id.clone(),
            signer_name: record.signer.name.clone(),
            signer_email: record.signer.email.clone(),
            completed_at: record.completed_at,
            client_address: record.client_address.clone(),
            user_agent: record.user_agent.clone(),
            signature_hash: record.signature_hash.clone(),
            disposition: crate::core::DISPOSITION_SIGNED.to_string(),
        });
        Ok(CompletionOutcome::Completed)
    }

    fn get_audit_records(&self, token: &RequestToken) -> Result<Vec<AuditRecord>, StoreError> {
        let guard = self.lock()?;
        guard.get(token.as_str()).map(|entry| entry.audits.clone()).ok_or(StoreError::NotFound)
    }
}

// ============================================================================
// SECTION: Shared Store Wrappers
// ============================================================================

/// Shared request store backed by an `Arc` trait object.
///
/// The signing session takes ownership of its store; hosts that need to keep
/// a handle for diagnosis, or run several sessions over one backend, wrap the
/// store here and clone.
#[derive(Clone)]
pub struct SharedRequestStore {
    /// Inner store implementation.
    inner: Arc<dyn RequestStore + Send + Sync>,
}

impl SharedRequestStore {
    /// Wraps a request store in a shared, clonable wrapper.
    #[must_use]
    pub fn from_store(store: impl RequestStore + Send + Sync + 'static) -> Self {
        Self {
            inner: Arc::new(store),
        }
    }

    /// Wraps an existing shared store.
    #[must_use]
    pub const fn new(store: Arc<dyn RequestStore + Send + Sync>) -> Self {
        Self {
            inner: store,
        }
    }
}

impl RequestStore for SharedRequestStore {
    fn get_request(&self, token: &RequestToken) -> Result<Option<SignatureRequest>, StoreError> {
        self.inner.get_request(token)
    }

    fn get_field_mappings(&self, token: &RequestToken) -> Result<Vec<FieldMapping>, StoreError> {
        self.inner.get_field_mappings(token)
    }

    fn get_signer_profile(&self, token: &RequestToken) -> Result<SignerProfile, StoreError> {
        self.inner.get_signer_profile(token)
    }

    fn update_signer_profile(
        &self,
        token: &RequestToken,
        updates: &ProfileUpdate,
    ) -> Result<(), StoreError> {
        self.inner.update_signer_profile(token, updates)
    }

    fn get_tenant_branding(&self, token: &RequestToken) -> Result<TenantBranding, StoreError> {
        self.inner.get_tenant_branding(token)
    }

    fn mark_expired(&self, token: &RequestToken) -> Result<(), StoreError> {
        self.inner.mark_expired(token)
    }

    fn complete_signature(
        &self,
        token: &RequestToken,
        record: &CompletionRecord,
    ) -> Result<CompletionOutcome, StoreError> {
        self.inner.complete_signature(token, record)
    }

    fn get_audit_records(&self, token: &RequestToken) -> Result<Vec<AuditRecord>, StoreError> {
        self.inner.get_audit_records(token)
    }
}

/// Shared document store backed by an `Arc` trait object.
#[derive(Clone)]
pub struct SharedDocumentStore {
    /// Inner store implementation.
    inner: Arc<dyn DocumentStore + Send + Sync>,
}

impl SharedDocumentStore {
    /// Wraps a document store in a shared, clonable wrapper.
    #[must_use]
    pub fn from_store(store: impl DocumentStore + Send + Sync + 'static) -> Self {
        Self {
            inner: Arc::new(store),
        }
    }

    /// Wraps an existing shared store.
    #[must_use]
    pub const fn new(store: Arc<dyn DocumentStore + Send + Sync>) -> Self {
        Self {
            inner: store,
        }
    }
}

impl DocumentStore for SharedDocumentStore {
    fn upload(
        &self,
        bucket: &str,
        path: &str,
        bytes: &[u8],
        content_type: &str,
    ) -> Result<(), StorageError> {
        self.inner.upload(bucket, path, bytes, content_type)
    }

    fn download(&self, bucket: &str, path: &str) -> Result<Vec<u8>, StorageError> {
        self.inner.download(bucket, path)
    }

    fn create_signed_url(
        &self,
        bucket: &str,
        path: &str,
        ttl_seconds: u64,
    ) -> Result<String, StorageError> {
        self.inner.create_signed_url(bucket, path, ttl_seconds)
    }
}

// ============================================================================
// SECTION: In-Memory Document Store
// ============================================================================

/// One stored object.
#[derive(Debug, Clone)]
struct StoredObject {
    /// Object bytes.
    bytes: Vec<u8>,
    /// Declared content type.
    content_type: String,
}

/// In-memory document store for tests and demos.
#[derive(Debug, Default, Clone)]
pub struct InMemoryDocumentStore {
    /// Object map keyed by bucket and path, protected by a mutex.
    objects: Arc<Mutex<BTreeMap<(String, String), StoredObject>>>,
}

impl InMemoryDocumentStore {
    /// Creates a new in-memory document store.
    #[must_use]
    pub fn new() -> Self {
        Self {
            objects: Arc::new(Mutex::new(BTreeMap::new())),
        }
    }

    /// Returns the declared content type of an object, when present.
    ///
    /// # Errors
    ///
    /// Returns [`StorageError::Download`] when the store lock is poisoned.
    pub fn content_type(&self, bucket: &str, path: &str) -> Result<Option<String>, StorageError> {
        let guard = self
            .objects
            .lock()
            .map_err(|_| StorageError::Download("document store mutex poisoned".to_string()))?;
        Ok(guard
            .get(&(bucket.to_string(), path.to_string()))
            .map(|object| object.content_type.clone()))
    }
}

impl DocumentStore for InMemoryDocumentStore {
    fn upload(
        &self,
        bucket: &str,
        path: &str,
        bytes: &[u8],
        content_type: &str,
    ) -> Result<(), StorageError> {
        let mut guard = self
            .objects
            .lock()
            .map_err(|_| StorageError::Upload("document store mutex poisoned".to_string()))?;
        guard.insert((bucket.to_string(), path.to_string()), StoredObject {
            bytes: bytes.to_vec(),
            content_type: content_type.to_string(),
        });
        Ok(())
    }

    fn download(&self, bucket: &str, path: &str) -> Result<Vec<u8>, StorageError> {
        let guard = self
            .objects
            .lock()
            .map_err(|_| StorageError::Download("document store mutex poisoned".to_string()))?;
        guard.get(&(bucket.to_string(), path.to_string())).map(|object| object.bytes.clone()).ok_or(
            StorageError::NotFound {
                bucket: bucket.to_string(),
                path: path.to_string(),
            },
        )
    }

    fn create_signed_url(
        &self,
        bucket: &str,
        path: &str,
        ttl_seconds: u64,
    ) -> Result<String, StorageError> {
        let guard = self
            .objects
            .lock()
            .map_err(|_| StorageError::SignedUrl("document store mutex poisoned".to_string()))?;
        if !guard.contains_key(&(bucket.to_string(), path.to_string())) {
            return Err(StorageError::NotFound {
                bucket: bucket.to_string(),
                path: path.to_string(),
            });
        }
        Ok(format!("memory://{bucket}/{path}?ttl={ttl_seconds}"))
    }
}
