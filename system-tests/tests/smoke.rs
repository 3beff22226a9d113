// system-tests/tests/smoke.rs
// ============================================================================
// Module: Smoke Suite
// Description: End-to-end signing flows over the durable backends.
// Purpose: Drive the full pipeline with SQLite, filesystem storage, and the
//          real compositor instead of stubs.
// Dependencies: system-tests fixtures, signet crates, tempfile
// ============================================================================

//! ## Overview
//! Runs the signing pipeline the way a host deploys it: the SQLite request
//! store, the capability-scoped filesystem document store, the capture
//! surface, and the lopdf compositor. Covers the happy path with the audit
//! round trip, lazy expiry persistence across connections, and the
//! double-submit conflict over one durable backend.

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

use signet_compose::CertificateLabels;
use signet_compose::PdfCompositor;
use signet_core::AddressError;
use signet_core::ClientAddressSource;
use signet_core::ClientContext;
use signet_core::DEFAULT_HASH_ALGORITHM;
use signet_core::DocumentStore;
use signet_core::FieldMapping;
use signet_core::NullSink;
use signet_core::ProfileUpdate;
use signet_core::RequestStatus;
use signet_core::RequestStore;
use signet_core::RequestToken;
use signet_core::SessionConfig;
use signet_core::SessionState;
use signet_core::SharedDocumentStore;
use signet_core::SharedRequestStore;
use signet_core::SignerProfile;
use signet_core::SigningSession;
use signet_core::TenantBranding;
use signet_core::Timestamp;
use signet_core::hashing::hash_bytes;
use signet_providers::FsDocumentStore;
use signet_store_sqlite::SqliteRequestStore;
use signet_store_sqlite::SqliteStoreConfig;
use system_tests::fixtures::minimal_pdf;
use system_tests::fixtures::pending_request;
use system_tests::fixtures::signature_mapping;
use system_tests::fixtures::stroke_signature;
use system_tests::fixtures::text_mapping;
use tempfile::TempDir;

/// Fixed "now" used by the suite.
const NOW: Timestamp = Timestamp::from_unix_millis(1_700_000_000_000);
/// A deadline one hour after [`NOW`].
const LATER: Timestamp = Timestamp::from_unix_millis(1_700_000_000_000 + 3_600_000);
/// A deadline one hour before [`NOW`].
const EARLIER: Timestamp = Timestamp::from_unix_millis(1_700_000_000_000 - 3_600_000);

/// Stub address source returning a fixed address.
struct StubAddress;

impl ClientAddressSource for StubAddress {
    fn client_address(&self) -> Result<String, AddressError> {
        Ok("203.0.113.9".to_string())
    }
}

/// One durable deployment rooted in a temporary directory.
struct Deployment {
    /// Root directory owning the database and object tree.
    dir: TempDir,
    /// Shared handle on the SQLite request store.
    store: SharedRequestStore,
    /// Shared handle on the filesystem document store.
    documents: SharedDocumentStore,
}

impl Deployment {
    /// Opens the durable stack and seeds one request with `mappings`.
    fn seed(token: &str, expires_at: Timestamp, mappings: Vec<FieldMapping>) -> Self {
        let dir = TempDir::new().unwrap();
        let sqlite =
            SqliteRequestStore::open(&SqliteStoreConfig::new(dir.path().join("signet.db")))
                .unwrap();
        sqlite
            .insert_request(
                &pending_request(token, expires_at),
                &TenantBranding {
                    display_name: "Acme Legal".to_string(),
                },
                &mappings,
                &SignerProfile::new(),
            )
            .unwrap();

        let documents = SharedDocumentStore::from_store(
            FsDocumentStore::open(dir.path().join("data")).unwrap(),
        );
        documents
            .upload(
                "documents",
                "acme/req-0001/source.pdf",
                &minimal_pdf(2).unwrap(),
                "application/pdf",
            )
            .unwrap();

        Self {
            dir,
            store: SharedRequestStore::from_store(sqlite),
            documents,
        }
    }

    /// Opens a fresh connection over the deployment's database file.
    fn reopen_store(&self) -> SqliteRequestStore {
        SqliteRequestStore::open(&SqliteStoreConfig::new(self.dir.path().join("signet.db")))
            .unwrap()
    }

    /// Builds a session over shared handles on the deployment.
    fn session(
        &self,
        token: &str,
    ) -> SigningSession<
        SharedRequestStore,
        SharedDocumentStore,
        PdfCompositor,
        StubAddress,
        NullSink,
    > {
        SigningSession::new(
            RequestToken::new(token),
            SessionConfig::default(),
            ClientContext {
                user_agent: "system-tests/1.0".to_string(),
            },
            self.store.clone(),
            self.documents.clone(),
            PdfCompositor::new(CertificateLabels::default()),
            StubAddress,
            NullSink,
        )
    }
}

/// Returns true when `needle` occurs in `haystack`.
fn contains(haystack: &[u8], needle: &[u8]) -> bool {
    haystack.windows(needle.len()).any(|window| window == needle)
}

/// Verifies the full pipeline over the durable stack: corrections, signing,
/// artifact storage, the atomic completion, and the audit round trip.
#[test]
fn durable_pipeline_signs_and_certifies() {
    let deployment = Deployment::seed(
        "tok-system-1",
        LATER,
        vec![text_mapping("full_name", 1), signature_mapping(2)],
    );
    let mut session = deployment.session("tok-system-1");

    let loaded = session.load(NOW).unwrap().clone();
    assert!(matches!(loaded, SessionState::NeedsData { .. }));

    let updates = ProfileUpdate::new().with("full_name", "Ana Torres");
    assert_eq!(session.submit_corrections(&updates, NOW).unwrap(), &SessionState::Ready);

    session.begin_signing(NOW).unwrap();
    let ink = stroke_signature().unwrap();
    let state = session.confirm_signature(ink.clone(), NOW).unwrap().clone();
    let SessionState::Success {
        signed_document_path,
    } = state
    else {
        panic!("expected success, got {state:?}");
    };

    // The durable record carries the terminal state and both artifact paths.
    let token = RequestToken::new("tok-system-1");
    let request = deployment.store.get_request(&token).unwrap().unwrap();
    assert_eq!(request.status, RequestStatus::Signed);
    assert_eq!(request.signed_document_path.as_deref(), Some(signed_document_path.as_str()));
    assert_eq!(request.signature_path.as_deref(), Some("acme/req-0001/signature.png"));
    assert_eq!(request.signed_at, Some(NOW));

    // Hash round trip: the stored digest matches the uploaded bytes exactly.
    let uploaded =
        deployment.documents.download("signatures", "acme/req-0001/signature.png").unwrap();
    assert_eq!(uploaded, ink);
    let digest = hash_bytes(DEFAULT_HASH_ALGORITHM, &uploaded);
    assert_eq!(request.signature_hash, Some(digest.clone()));

    // The composed output gained the certificate page, the mapped stamp, and
    // the rendered hash prefix.
    let composed = deployment.documents.download("documents", &signed_document_path).unwrap();
    let doc = lopdf::Document::load_mem(&composed).unwrap();
    let pages = doc.get_pages();
    assert_eq!(pages.len(), 3);
    let stamped = doc.get_page_content(*pages.get(&2).unwrap()).unwrap();
    assert!(contains(&stamped, b"/SgIm0"));
    let certificate = doc.get_page_content(*pages.get(&3).unwrap()).unwrap();
    assert!(contains(&certificate, b"Ana Torres"));
    assert!(contains(&certificate, digest.audit_prefix(16).as_bytes()));

    // Exactly one audit record, and the session download matches storage.
    assert_eq!(deployment.store.get_audit_records(&token).unwrap().len(), 1);
    assert_eq!(session.download_signed_document().unwrap(), composed);
}

/// Verifies lazy expiry is persisted and visible across connections.
#[test]
fn durable_lazy_expiry_persists_across_connections() {
    let deployment =
        Deployment::seed("tok-system-2", EARLIER, vec![text_mapping("full_name", 1)]);
    let mut session = deployment.session("tok-system-2");

    assert_eq!(session.load(NOW).unwrap(), &SessionState::Expired);

    // A fresh connection over the same database observes the terminal state.
    let reopened = deployment.reopen_store();
    let request =
        reopened.get_request(&RequestToken::new("tok-system-2")).unwrap().unwrap();
    assert_eq!(request.status, RequestStatus::Expired);
}

/// Verifies a double submit over one durable backend admits one completion.
#[test]
fn durable_double_submit_resolves_to_already_signed() {
    let deployment = Deployment::seed("tok-system-3", LATER, vec![signature_mapping(1)]);

    let mut first = deployment.session("tok-system-3");
    first.load(NOW).unwrap();
    first.begin_signing(NOW).unwrap();

    let mut second = deployment.session("tok-system-3");
    second.load(NOW).unwrap();
    second.begin_signing(NOW).unwrap();

    let ink = stroke_signature().unwrap();
    let state = first.confirm_signature(ink.clone(), NOW).unwrap().clone();
    assert!(matches!(state, SessionState::Success { .. }));

    let state = second.confirm_signature(ink, NOW).unwrap().clone();
    let SessionState::AlreadySigned {
        signed_document_path,
    } = state
    else {
        panic!("expected already-signed, got {state:?}");
    };
    assert_eq!(signed_document_path.as_deref(), Some("acme/req-0001/signed.pdf"));

    // Exactly one signed transition and one audit record survive the race.
    let token = RequestToken::new("tok-system-3");
    assert_eq!(deployment.store.get_audit_records(&token).unwrap().len(), 1);
    assert_eq!(
        deployment.store.get_request(&token).unwrap().unwrap().status,
        RequestStatus::Signed
    );
}
