// crates/signet-core/tests/resolver.rs
// ============================================================================
// Module: Field Resolution Tests
// Description: Tests for session loading, lazy expiry, and corrections.
// Purpose: Validate the read side of the signing session.
// Dependencies: signet-core
// ============================================================================
//! ## Overview
//! Ensures token resolution, lazy expiry persistence, the NeedsData/Ready
//! split, and idempotent re-view of signed requests.

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

use signet_core::FieldKey;
use signet_core::FieldKind;
use signet_core::FieldMapping;
use signet_core::InMemoryRequestStore;
use signet_core::ProfileUpdate;
use signet_core::RequestId;
use signet_core::RequestStatus;
use signet_core::RequestStore;
use signet_core::RequestToken;
use signet_core::ResolveError;
use signet_core::SessionDisposition;
use signet_core::SignatureRequest;
use signet_core::SignerProfile;
use signet_core::TemplateId;
use signet_core::TenantBranding;
use signet_core::TenantId;
use signet_core::Timestamp;
use signet_core::load_session;
use signet_core::submit_corrections;

/// Fixed "now" used by the tests.
const NOW: Timestamp = Timestamp::from_unix_millis(1_700_000_000_000);
/// A deadline one hour after [`NOW`].
const LATER: Timestamp = Timestamp::from_unix_millis(1_700_000_000_000 + 3_600_000);
/// A deadline one hour before [`NOW`].
const EARLIER: Timestamp = Timestamp::from_unix_millis(1_700_000_000_000 - 3_600_000);

/// Builds a pending request for `token` expiring at `expires_at`.
fn sample_request(token: &str, expires_at: Timestamp) -> SignatureRequest {
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

/// Builds a one-text-field template.
fn sample_mappings() -> Vec<FieldMapping> {
    vec![FieldMapping {
        key: FieldKey::new("full_name"),
        kind: FieldKind::Text,
        page: 1,
        x: 50.0,
        y: 120.0,
        width: 180.0,
        height: 16.0,
        trigger_value: None,
    }]
}

/// Seeds a store with one pending request.
fn seeded_store(token: &str, expires_at: Timestamp, profile: SignerProfile) -> InMemoryRequestStore {
    let store = InMemoryRequestStore::new();
    store
        .insert_request(
            sample_request(token, expires_at),
            TenantBranding {
                display_name: "Acme Legal".to_string(),
            },
            sample_mappings(),
            profile,
        )
        .unwrap();
    store
}

/// Verifies an unknown token reports NotFound.
#[test]
fn load_session_unknown_token_is_not_found() {
    let store = InMemoryRequestStore::new();
    let result = load_session(&store, &RequestToken::new("missing"), NOW);
    assert!(matches!(result, Err(ResolveError::NotFound)));
}

/// Verifies a missing field yields NeedsData.
#[test]
fn load_session_reports_needs_data() {
    let store = seeded_store("tok-1", LATER, SignerProfile::new());
    let snapshot = load_session(&store, &RequestToken::new("tok-1"), NOW).unwrap();
    assert_eq!(snapshot.disposition, SessionDisposition::NeedsData);
    assert_eq!(snapshot.missing.len(), 1);
    assert_eq!(snapshot.missing[0].as_str(), "full_name");
}

/// Verifies a complete profile yields Ready.
#[test]
fn load_session_reports_ready() {
    let mut profile = SignerProfile::new();
    profile.set(FieldKey::new("full_name"), Some("Ana Torres".to_string()));
    let store = seeded_store("tok-1", LATER, profile);
    let snapshot = load_session(&store, &RequestToken::new("tok-1"), NOW).unwrap();
    assert_eq!(snapshot.disposition, SessionDisposition::Ready);
}

/// Verifies lazy expiry persists and stays idempotent on re-check.
#[test]
fn load_session_applies_lazy_expiry() {
    let store = seeded_store("tok-1", EARLIER, SignerProfile::new());
    let token = RequestToken::new("tok-1");

    let first = load_session(&store, &token, NOW);
    assert!(matches!(first, Err(ResolveError::Expired)));
    let status = store.get_request(&token).unwrap().unwrap().status;
    assert_eq!(status, RequestStatus::Expired);

    // Re-checking observes the persisted state without further mutation.
    let second = load_session(&store, &token, NOW);
    assert!(matches!(second, Err(ResolveError::Expired)));
    let status = store.get_request(&token).unwrap().unwrap().status;
    assert_eq!(status, RequestStatus::Expired);
}

/// Verifies corrections transition NeedsData to Ready.
#[test]
fn submit_corrections_reaches_ready() {
    let store = seeded_store("tok-1", LATER, SignerProfile::new());
    let token = RequestToken::new("tok-1");

    let snapshot = load_session(&store, &token, NOW).unwrap();
    assert_eq!(snapshot.disposition, SessionDisposition::NeedsData);

    let updates = ProfileUpdate::new().with("full_name", "Ana Torres");
    let snapshot = submit_corrections(&store, &token, &updates, NOW).unwrap();
    assert_eq!(snapshot.disposition, SessionDisposition::Ready);
    assert!(snapshot.missing.is_empty());
}

/// Verifies partial corrections keep the remaining subset.
#[test]
fn submit_corrections_keeps_remaining_subset() {
    let store = InMemoryRequestStore::new();
    let mut mappings = sample_mappings();
    mappings.push(FieldMapping {
        key: FieldKey::new("city"),
        kind: FieldKind::Text,
        page: 1,
        x: 50.0,
        y: 160.0,
        width: 180.0,
        height: 16.0,
        trigger_value: None,
    });
    store
        .insert_request(
            sample_request("tok-1", LATER),
            TenantBranding {
                display_name: "Acme Legal".to_string(),
            },
            mappings,
            SignerProfile::new(),
        )
        .unwrap();

    let updates = ProfileUpdate::new().with("full_name", "Ana Torres");
    let snapshot =
        submit_corrections(&store, &RequestToken::new("tok-1"), &updates, NOW).unwrap();
    assert_eq!(snapshot.disposition, SessionDisposition::NeedsData);
    assert_eq!(snapshot.missing.len(), 1);
    assert_eq!(snapshot.missing[0].as_str(), "city");
}

/// Verifies an already-signed request resolves idempotently with its path.
#[test]
fn load_session_signed_is_idempotent_view() {
    let store = seeded_store("tok-1", LATER, SignerProfile::new());
    let token = RequestToken::new("tok-1");
    let record = signet_core::CompletionRecord {
        signed_document_path: "acme/req-0001/signed.pdf".to_string(),
        signature_path: "acme/req-0001/signature.png".to_string(),
        signature_hash: signet_core::hashing::hash_bytes(
            signet_core::DEFAULT_HASH_ALGORITHM,
            b"ink",
        ),
        signer: signet_core::SignerIdentity {
            name: "Ana Torres".to_string(),
            email: Some("ana@example.com".to_string()),
        },
        client_address: "203.0.113.9".to_string(),
        user_agent: "test-agent".to_string(),
        completed_at: NOW,
    };
    store.complete_signature(&token, &record).unwrap();

    let snapshot = load_session(&store, &token, NOW).unwrap();
    assert_eq!(snapshot.disposition, SessionDisposition::AlreadySigned {
        signed_document_path: Some("acme/req-0001/signed.pdf".to_string()),
    });
}
