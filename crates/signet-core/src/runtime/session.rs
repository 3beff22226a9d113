// crates/signet-core/src/runtime/session.rs
// ============================================================================
// Module: Signet Signing Session
// Description: Completion and persistence state machine for one signing link.
// Purpose: Drive capture output through composition to the atomic completion.
// Dependencies: crate::{core, interfaces, runtime::resolver}, std::thread
// ============================================================================

//! ## Overview
//! [`SigningSession`] is the single canonical execution path for a signing
//! attempt. It exposes exactly five user-facing actions: begin signing,
//! cancel signing, confirm the captured signature, submit field corrections,
//! and download the signed artifact. Once processing starts there is no
//! mid-flight cancellation; the attempt runs to `Success`, `Failed`, or the
//! soft-success `AlreadySigned` when a concurrent attempt won the completion
//! race.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::thread;

use thiserror::Error;

use crate::core::AuditRecord;
use crate::core::CompletionOutcome;
use crate::core::CompletionRecord;
use crate::core::DEFAULT_HASH_ALGORITHM;
use crate::core::DISPOSITION_SIGNED;
use crate::core::FieldKey;
use crate::core::ProfileUpdate;
use crate::core::RequestToken;
use crate::core::SignerIdentity;
use crate::core::Timestamp;
use crate::core::UNKNOWN_CLIENT_ADDRESS;
use crate::core::hashing::hash_bytes;
use crate::interfaces::ClientAddressSource;
use crate::interfaces::ComposeRequest;
use crate::interfaces::DocumentCompositor;
use crate::interfaces::DocumentStore;
use crate::interfaces::EventSink;
use crate::interfaces::RequestStore;
use crate::interfaces::SessionEvent;
use crate::runtime::resolver::ResolveError;
use crate::runtime::resolver::SessionDisposition;
use crate::runtime::resolver::SessionSnapshot;
use crate::runtime::resolver::load_session;
use crate::runtime::resolver::submit_corrections;

// ============================================================================
// SECTION: Session Configuration
// ============================================================================

/// Configuration for the signing session runtime.
///
/// Bucket names and URL lifetimes are passed in explicitly; the runtime keeps
/// no ambient storage identifiers.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionConfig {
    /// Bucket holding source and signed documents.
    pub documents_bucket: String,
    /// Bucket holding raw signature images.
    pub signatures_bucket: String,
    /// Lifetime of minted download URLs, in seconds.
    pub download_url_ttl_seconds: u64,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            documents_bucket: "documents".to_string(),
            signatures_bucket: "signatures".to_string(),
            download_url_ttl_seconds: 300,
        }
    }
}

/// Client context observed by the host shell for the current signer.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ClientContext {
    /// User-agent string reported by the signer's client.
    pub user_agent: String,
}

// ============================================================================
// SECTION: Session State
// ============================================================================

/// Signing session state.
///
/// # Invariants
/// - `Success`, `Failed`, `AlreadySigned`, `Expired`, and `NotFound` are
///   terminal for the current attempt; `Failed` permits a restart from a
///   fresh session.
#[derive(Debug, Clone, PartialEq)]
pub enum SessionState {
    /// Initial state; the session has not been loaded yet.
    Loading,
    /// Required fields are missing; signing is blocked on corrections.
    NeedsData {
        /// Keys of the fields still missing usable values.
        missing: Vec<FieldKey>,
    },
    /// All required data is present; signing may begin.
    Ready,
    /// The capture surface is active.
    Signing,
    /// The completion pipeline is running.
    Processing,
    /// The request was finalized by this attempt.
    Success {
        /// Storage path of the signed output.
        signed_document_path: String,
    },
    /// The attempt failed; the message is safe to display to the signer.
    Failed {
        /// Display-safe failure message.
        message: String,
    },
    /// The request was already finalized before or during this attempt.
    AlreadySigned {
        /// Storage path of the signed output, when recorded.
        signed_document_path: Option<String>,
    },
    /// The signing link expired or was cancelled.
    Expired,
    /// The token does not resolve to any request.
    NotFound,
}

// ============================================================================
// SECTION: Session Errors
// ============================================================================

/// Errors returned for actions invalid in the current state.
///
/// Pipeline failures do not surface here; they transition the session to
/// [`SessionState::Failed`] instead.
#[derive(Debug, Error)]
pub enum SessionError {
    /// The action is not permitted in the current state.
    #[error("action {action} is not valid in the current session state")]
    InvalidAction {
        /// Name of the rejected action.
        action: &'static str,
    },
    /// No signed document is available to download.
    #[error("no signed document is available")]
    NoSignedDocument,
    /// Download failed.
    #[error("signed document download failed: {0}")]
    Download(String),
}

// ============================================================================
// SECTION: Signing Session
// ============================================================================

/// State machine driving one signing link from load to completion.
pub struct SigningSession<R, D, C, A, E> {
    /// Request token identifying the session.
    token: RequestToken,
    /// Runtime configuration.
    config: SessionConfig,
    /// Client context observed by the host shell.
    client: ClientContext,
    /// Token-scoped request store.
    store: R,
    /// Durable artifact storage.
    documents: D,
    /// Document compositor.
    compositor: C,
    /// Best-effort client address source.
    address: A,
    /// Operational event sink.
    events: E,
    /// Current state.
    state: SessionState,
    /// Snapshot captured by the last successful load.
    snapshot: Option<SessionSnapshot>,
}

impl<R, D, C, A, E> SigningSession<R, D, C, A, E>
where
    R: RequestStore + Sync,
    D: DocumentStore,
    C: DocumentCompositor,
    A: ClientAddressSource + Sync,
    E: EventSink,
{
    /// Creates a session in the `Loading` state.
    pub fn new(
        token: RequestToken,
        config: SessionConfig,
        client: ClientContext,
        store: R,
        documents: D,
        compositor: C,
        address: A,
        events: E,
    ) -> Self {
        Self {
            token,
            config,
            client,
            store,
            documents,
            compositor,
            address,
            events,
            state: SessionState::Loading,
            snapshot: None,
        }
    }

    /// Returns the current session state.
    #[must_use]
    pub const fn state(&self) -> &SessionState {
        &self.state
    }

    /// Returns the snapshot captured by the last successful load.
    #[must_use]
    pub const fn snapshot(&self) -> Option<&SessionSnapshot> {
        self.snapshot.as_ref()
    }

    /// Loads the session, applying lazy expiry.
    ///
    /// # Errors
    ///
    /// Returns [`SessionError::InvalidAction`] unless the session is in
    /// `Loading`.
    pub fn load(&mut self, now: Timestamp) -> Result<&SessionState, SessionError> {
        if self.state != SessionState::Loading {
            return Err(SessionError::InvalidAction {
                action: "load",
            });
        }
        match load_session(&self.store, &self.token, now) {
            Ok(snapshot) => {
                self.state = match &snapshot.disposition {
                    SessionDisposition::NeedsData => SessionState::NeedsData {
                        missing: snapshot.missing.clone(),
                    },
                    SessionDisposition::Ready => SessionState::Ready,
                    SessionDisposition::AlreadySigned {
                        signed_document_path,
                    } => SessionState::AlreadySigned {
                        signed_document_path: signed_document_path.clone(),
                    },
                };
                self.snapshot = Some(snapshot);
                self.emit("load", "ok", None, now);
            }
            Err(ResolveError::NotFound) => {
                self.state = SessionState::NotFound;
                self.emit("load", "not_found", None, now);
            }
            Err(ResolveError::Expired) => {
                self.state = SessionState::Expired;
                self.emit("load", "expired", None, now);
            }
            Err(ResolveError::Store(err)) => {
                self.fail("load", "We could not load this signing link. Try again.", &err, now);
            }
        }
        Ok(&self.state)
    }

    /// Submits field corrections while the session needs data.
    ///
    /// # Errors
    ///
    /// Returns [`SessionError::InvalidAction`] unless the session is in
    /// `NeedsData`.
    pub fn submit_corrections(
        &mut self,
        updates: &ProfileUpdate,
        now: Timestamp,
    ) -> Result<&SessionState, SessionError> {
        if !matches!(self.state, SessionState::NeedsData { .. }) {
            return Err(SessionError::InvalidAction {
                action: "submit_corrections",
            });
        }
        match submit_corrections(&self.store, &self.token, updates, now) {
            Ok(snapshot) => {
                self.state = if snapshot.missing.is_empty() {
                    SessionState::Ready
                } else {
                    SessionState::NeedsData {
                        missing: snapshot.missing.clone(),
                    }
                };
                self.snapshot = Some(snapshot);
                self.emit("corrections", "ok", None, now);
            }
            Err(ResolveError::NotFound) => {
                self.state = SessionState::NotFound;
                self.emit("corrections", "not_found", None, now);
            }
            Err(ResolveError::Expired) => {
                self.state = SessionState::Expired;
                self.emit("corrections", "expired", None, now);
            }
            Err(ResolveError::Store(err)) => {
                self.fail(
                    "corrections",
                    "We could not save your information. Try again.",
                    &err,
                    now,
                );
            }
        }
        Ok(&self.state)
    }

    /// Opens the capture surface.
    ///
    /// # Errors
    ///
    /// Returns [`SessionError::InvalidAction`] unless the session is `Ready`.
    pub fn begin_signing(&mut self, now: Timestamp) -> Result<&SessionState, SessionError> {
        if self.state != SessionState::Ready {
            return Err(SessionError::InvalidAction {
                action: "begin_signing",
            });
        }
        self.state = SessionState::Signing;
        self.emit("signing", "started", None, now);
        Ok(&self.state)
    }

    /// Abandons the capture surface with no side effects.
    ///
    /// # Errors
    ///
    /// Returns [`SessionError::InvalidAction`] unless the session is
    /// `Signing`.
    pub fn cancel_signing(&mut self, now: Timestamp) -> Result<&SessionState, SessionError> {
        if self.state != SessionState::Signing {
            return Err(SessionError::InvalidAction {
                action: "cancel_signing",
            });
        }
        self.state = SessionState::Ready;
        self.emit("signing", "cancelled", None, now);
        Ok(&self.state)
    }

    /// Confirms the captured signature and runs the completion pipeline.
    ///
    /// The pipeline uploads the raw signature, composes the signed document,
    /// uploads it, and invokes the atomic completion step. Failures surface
    /// as [`SessionState::Failed`]; a lost completion race surfaces as
    /// [`SessionState::AlreadySigned`].
    ///
    /// # Errors
    ///
    /// Returns [`SessionError::InvalidAction`] unless the session is
    /// `Signing`.
    pub fn confirm_signature(
        &mut self,
        signature_png: Vec<u8>,
        now: Timestamp,
    ) -> Result<&SessionState, SessionError> {
        if self.state != SessionState::Signing {
            return Err(SessionError::InvalidAction {
                action: "confirm_signature",
            });
        }
        let Some(snapshot) = self.snapshot.clone() else {
            // Unreachable through the public API: Signing is only entered
            // after a successful load.
            self.state = SessionState::Failed {
                message: "The signing session was not loaded.".to_string(),
            };
            return Ok(&self.state);
        };
        self.state = SessionState::Processing;
        self.emit("processing", "started", None, now);
        self.state = self.run_processing(&snapshot, signature_png, now);
        Ok(&self.state)
    }

    /// Downloads the signed document for `Success` or `AlreadySigned`.
    ///
    /// # Errors
    ///
    /// Returns [`SessionError::InvalidAction`] outside those states,
    /// [`SessionError::NoSignedDocument`] when no path was recorded, and
    /// [`SessionError::Download`] on storage failure.
    pub fn download_signed_document(&self) -> Result<Vec<u8>, SessionError> {
        let path = self.signed_document_path()?;
        self.documents
            .download(&self.config.documents_bucket, &path)
            .map_err(|err| SessionError::Download(err.to_string()))
    }

    /// Mints a time-limited URL for the signed document.
    ///
    /// # Errors
    ///
    /// Same taxonomy as [`Self::download_signed_document`].
    pub fn signed_document_url(&self) -> Result<String, SessionError> {
        let path = self.signed_document_path()?;
        self.documents
            .create_signed_url(
                &self.config.documents_bucket,
                &path,
                self.config.download_url_ttl_seconds,
            )
            .map_err(|err| SessionError::Download(err.to_string()))
    }

    /// Returns the signed-document path exposed by the current state.
    fn signed_document_path(&self) -> Result<String, SessionError> {
        match &self.state {
            SessionState::Success {
                signed_document_path,
            } => Ok(signed_document_path.clone()),
            SessionState::AlreadySigned {
                signed_document_path,
            } => signed_document_path.clone().ok_or(SessionError::NoSignedDocument),
            _ => Err(SessionError::InvalidAction {
                action: "download",
            }),
        }
    }

    /// Executes the completion pipeline and returns the terminal state.
    fn run_processing(
        &mut self,
        snapshot: &SessionSnapshot,
        signature_png: Vec<u8>,
        now: Timestamp,
    ) -> SessionState {
        let request = &snapshot.request;

        // Fan-out: the address lookup and profile fetch are independent
        // reads, run concurrently before the slow compositor step.
        let address_source = &self.address;
        let store = &self.store;
        let token = &self.token;
        let (address_result, profile_result) = thread::scope(|scope| {
            let handle = scope.spawn(move || address_source.client_address());
            let profile = store.get_signer_profile(token);
            let address = handle.join().unwrap_or_else(|_| {
                Ok(UNKNOWN_CLIENT_ADDRESS.to_string())
            });
            (address, profile)
        });
        let client_address =
            address_result.unwrap_or_else(|_| UNKNOWN_CLIENT_ADDRESS.to_string());
        let profile = match profile_result {
            Ok(profile) => profile,
            Err(err) => {
                return self.failure(
                    "processing",
                    "We could not load your information. Try again.",
                    &err,
                    now,
                );
            }
        };

        let signature_path = format!(
            "{}/{}/signature.png",
            request.tenant_id.as_str(),
            request.request_id.as_str()
        );
        if let Err(err) = self.documents.upload(
            &self.config.signatures_bucket,
            &signature_path,
            &signature_png,
            "image/png",
        ) {
            return self.failure(
                "processing",
                "We could not store your signature. Try again.",
                &err,
                now,
            );
        }

        // The audit hash covers the exact bytes uploaded above.
        let signature_hash = hash_bytes(DEFAULT_HASH_ALGORITHM, &signature_png);

        let audit = AuditRecord {
            request_id: request.request_id.clone(),
            signer_name: request.signer_name.clone(),
            signer_email: request.signer_email.clone(),
            completed_at: now,
            client_address: client_address.clone(),
            user_agent: self.client.user_agent.clone(),
            signature_hash: signature_hash.clone(),
            disposition: DISPOSITION_SIGNED.to_string(),
        };

        let source_pdf = match self
            .documents
            .download(&self.config.documents_bucket, &request.document_path)
        {
            Ok(bytes) => bytes,
            Err(err) => {
                return self.failure(
                    "processing",
                    "We could not load the document. Try again.",
                    &err,
                    now,
                );
            }
        };

        let composed = match self.compositor.compose(&ComposeRequest {
            source_pdf,
            mappings: snapshot.mappings.clone(),
            profile,
            signature_png,
            audit,
            tenant: snapshot.branding.clone(),
        }) {
            Ok(bytes) => bytes,
            Err(err) => {
                return self.failure(
                    "processing",
                    "We could not prepare the signed document. Try again.",
                    &err,
                    now,
                );
            }
        };

        let signed_document_path = format!(
            "{}/{}/signed.pdf",
            request.tenant_id.as_str(),
            request.request_id.as_str()
        );
        if let Err(err) = self.documents.upload(
            &self.config.documents_bucket,
            &signed_document_path,
            &composed,
            "application/pdf",
        ) {
            return self.failure(
                "processing",
                "We could not store the signed document. Try again.",
                &err,
                now,
            );
        }

        let record = CompletionRecord {
            signed_document_path: signed_document_path.clone(),
            signature_path,
            signature_hash,
            signer: SignerIdentity {
                name: request.signer_name.clone(),
                email: request.signer_email.clone(),
            },
            client_address,
            user_agent: self.client.user_agent.clone(),
            completed_at: now,
        };
        match self.store.complete_signature(&self.token, &record) {
            Ok(CompletionOutcome::Completed) => {
                self.emit("complete", "ok", None, now);
                SessionState::Success {
                    signed_document_path,
                }
            }
            Ok(CompletionOutcome::Conflict) => {
                // A concurrent attempt won the race; soft success.
                self.emit("complete", "conflict", None, now);
                let recorded = self
                    .store
                    .get_request(&self.token)
                    .ok()
                    .flatten()
                    .and_then(|request| request.signed_document_path);
                SessionState::AlreadySigned {
                    signed_document_path: recorded,
                }
            }
            Err(err) => self.failure(
                "processing",
                "We could not finalize the signature. Try again.",
                &err,
                now,
            ),
        }
    }

    /// Emits an event and moves the session to `Failed`.
    fn fail(
        &mut self,
        stage: &str,
        message: &str,
        err: &dyn std::error::Error,
        now: Timestamp,
    ) {
        self.state = self.failure(stage, message, err, now);
    }

    /// Emits an event and returns the `Failed` state for `message`.
    fn failure(
        &self,
        stage: &str,
        message: &str,
        err: &dyn std::error::Error,
        now: Timestamp,
    ) -> SessionState {
        self.emit(stage, "failed", Some(err.to_string()), now);
        SessionState::Failed {
            message: message.to_string(),
        }
    }

    /// Emits one structured session event.
    fn emit(&self, stage: &str, outcome: &str, detail: Option<String>, now: Timestamp) {
        self.events.emit(&SessionEvent {
            token: self.token.clone(),
            stage: stage.to_string(),
            outcome: outcome.to_string(),
            detail,
            at: now,
        });
    }
}
