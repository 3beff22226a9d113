// crates/signet-core/tests/store.rs
// ============================================================================
// Module: In-Memory Store Tests
// Description: Tests for the in-memory request and document stores.
// Purpose: Validate token scoping and the completion compare-and-set.
// Dependencies: signet-core
// ============================================================================
//! ## Overview
//! Ensures the reference stores honor the token-scoped contract and that the
//! completion compare-and-set admits exactly one winner under a thread race.

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

use std::thread;

use signet_core::CompletionOutcome;
use signet_core::CompletionRecord;
use signet_core::DEFAULT_HASH_ALGORITHM;
use signet_core::DocumentStore;
use signet_core::InMemoryDocumentStore;
use signet_core::InMemoryRequestStore;
use signet_core::RequestId;
use signet_core::RequestStatus;
use signet_core::RequestStore;
use signet_core::RequestToken;
use signet_core::SignatureRequest;
use signet_core::SignerIdentity;
use signet_core::SignerProfile;
use signet_core::StorageError;
use signet_core::StoreError;
use signet_core::TemplateId;
use signet_core::TenantBranding;
use signet_core::TenantId;
use signet_core::Timestamp;
use signet_core::hashing::hash_bytes;

/// Fixed completion time used by the tests.
const NOW: Timestamp = Timestamp::from_unix_millis(1_700_000_000_000);

/// Seeds a store with one pending request for `token`.
fn seeded(token: &str) -> InMemoryRequestStore {
    let store = InMemoryRequestStore::new();
    store
        .insert_request(
            SignatureRequest {
                token: RequestToken::new(token),
                request_id: RequestId::new("req-0001"),
                tenant_id: TenantId::new("acme"),
                template_id: TemplateId::new("nda-es"),
                signer_name: "Ana Torres".to_string(),
                signer_email: None,
                requester_name: "Legal Ops".to_string(),
                status: RequestStatus::Pending,
                document_path: "acme/req-0001/source.pdf".to_string(),
                signed_document_path: None,
                signature_path: None,
                signature_hash: None,
                expires_at: Timestamp::from_unix_millis(NOW.as_unix_millis() + 3_600_000),
                signed_at: None,
            },
            TenantBranding {
                display_name: "Acme Legal".to_string(),
            },
            Vec::new(),
            SignerProfile::new(),
        )
        .unwrap();
    store
}

/// Builds a completion record for the race tests.
fn completion(label: &str) -> CompletionRecord {
    CompletionRecord {
        signed_document_path: "acme/req-0001/signed.pdf".to_string(),
        signature_path: "acme/req-0001/signature.png".to_string(),
        signature_hash: hash_bytes(DEFAULT_HASH_ALGORITHM, label.as_bytes()),
        signer: SignerIdentity {
            name: "Ana Torres".to_string(),
            email: None,
        },
        client_address: "203.0.113.9".to_string(),
        user_agent: label.to_string(),
        completed_at: NOW,
    }
}

/// Verifies duplicate seeding is rejected.
#[test]
fn insert_request_rejects_duplicate_token() {
    let store = seeded("tok-1");
    let result = store.insert_request(
        store.get_request(&RequestToken::new("tok-1")).unwrap().unwrap(),
        TenantBranding {
            display_name: "Acme Legal".to_string(),
        },
        Vec::new(),
        SignerProfile::new(),
    );
    assert!(matches!(result, Err(StoreError::Invalid(_))));
}

/// Verifies mark_expired flips pending and leaves terminal states alone.
#[test]
fn mark_expired_is_idempotent() {
    let store = seeded("tok-1");
    let token = RequestToken::new("tok-1");

    store.mark_expired(&token).unwrap();
    assert_eq!(store.get_request(&token).unwrap().unwrap().status, RequestStatus::Expired);

    // A second call observes the terminal state and changes nothing.
    store.mark_expired(&token).unwrap();
    assert_eq!(store.get_request(&token).unwrap().unwrap().status, RequestStatus::Expired);
}

/// Verifies two near-simultaneous completions admit exactly one winner.
#[test]
fn completion_race_admits_one_winner() {
    let store = seeded("tok-1");
    let token = RequestToken::new("tok-1");

    let outcomes: Vec<CompletionOutcome> = thread::scope(|scope| {
        let handles: Vec<_> = ["first", "second"]
            .into_iter()
            .map(|label| {
                let store = store.clone();
                let token = token.clone();
                scope.spawn(move || store.complete_signature(&token, &completion(label)).unwrap())
            })
            .collect();
        handles.into_iter().map(|handle| handle.join().unwrap()).collect()
    });

    let completed =
        outcomes.iter().filter(|outcome| **outcome == CompletionOutcome::Completed).count();
    let conflicted =
        outcomes.iter().filter(|outcome| **outcome == CompletionOutcome::Conflict).count();
    assert_eq!(completed, 1);
    assert_eq!(conflicted, 1);

    assert_eq!(store.get_audit_records(&token).unwrap().len(), 1);
    assert_eq!(store.get_request(&token).unwrap().unwrap().status, RequestStatus::Signed);
}

/// Verifies the document store round-trips and reports missing objects.
#[test]
fn document_store_roundtrip_and_not_found() {
    let documents = InMemoryDocumentStore::new();
    documents.upload("documents", "acme/a.pdf", b"bytes", "application/pdf").unwrap();

    assert_eq!(documents.download("documents", "acme/a.pdf").unwrap(), b"bytes");
    assert_eq!(
        documents.content_type("documents", "acme/a.pdf").unwrap().as_deref(),
        Some("application/pdf")
    );

    let missing = documents.download("documents", "acme/missing.pdf");
    assert!(matches!(missing, Err(StorageError::NotFound { .. })));

    let url = documents.create_signed_url("documents", "acme/a.pdf", 300).unwrap();
    assert!(url.contains("acme/a.pdf"));
    assert!(url.contains("ttl=300"));
}
