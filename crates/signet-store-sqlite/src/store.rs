// crates/signet-store-sqlite/src/store.rs
// ============================================================================
// Module: SQLite Request Store
// Description: Durable token-scoped RequestStore backed by SQLite.
// Purpose: Persist signing links with a transactional completion guard.
// Dependencies: signet-core, rusqlite, serde, serde_json, thiserror
// ============================================================================

//! ## Overview
//! This module implements a durable [`RequestStore`] using `SQLite`. Every
//! lookup is keyed by the request token. The completion step runs as a single
//! transaction whose `UPDATE ... WHERE status = 'pending'` guard is the
//! backend-enforced compare-and-set the concurrency model requires: a second
//! attempt matches zero rows and observes the conflict without writing.
//! Audit records are stored as canonical JSON snapshots with content hashes
//! and loads fail closed on corruption.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::path::Path;
use std::path::PathBuf;
use std::sync::Mutex;
use std::sync::MutexGuard;
use std::time::Duration;

use rusqlite::Connection;
use rusqlite::OpenFlags;
use rusqlite::OptionalExtension;
use rusqlite::params;
use serde::Deserialize;
use signet_core::AuditRecord;
use signet_core::CompletionOutcome;
use signet_core::CompletionRecord;
use signet_core::FieldKey;
use signet_core::FieldKind;
use signet_core::FieldMapping;
use signet_core::HashAlgorithm;
use signet_core::HashDigest;
use signet_core::ProfileUpdate;
use signet_core::RequestId;
use signet_core::RequestStatus;
use signet_core::RequestStore;
use signet_core::RequestToken;
use signet_core::SignatureRequest;
use signet_core::SignerProfile;
use signet_core::StoreError;
use signet_core::TemplateId;
use signet_core::TenantBranding;
use signet_core::TenantId;
use signet_core::Timestamp;
use signet_core::hashing::DEFAULT_HASH_ALGORITHM;
use signet_core::hashing::canonical_json_bytes;
use signet_core::hashing::hash_bytes;
use thiserror::Error;

// ============================================================================
// SECTION: Constants
// ============================================================================

/// `SQLite` schema version for the store.
const SCHEMA_VERSION: i64 = 1;
/// Default busy timeout (ms).
const DEFAULT_BUSY_TIMEOUT_MS: u64 = 5_000;
/// Maximum length of a single path component.
const MAX_PATH_COMPONENT_LENGTH: usize = 255;
/// Maximum total path length.
const MAX_TOTAL_PATH_LENGTH: usize = 4096;

// ============================================================================
// SECTION: Config
// ============================================================================

/// `SQLite` journal mode configuration.
///
/// # Invariants
/// - Values map 1:1 to `SQLite` `journal_mode` pragma settings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum SqliteStoreMode {
    /// WAL journal mode (recommended).
    #[default]
    Wal,
    /// Delete journal mode (legacy).
    Delete,
}

impl SqliteStoreMode {
    /// Returns the `SQLite` pragma value.
    #[must_use]
    pub const fn pragma_value(self) -> &'static str {
        match self {
            Self::Wal => "wal",
            Self::Delete => "delete",
        }
    }
}

/// `SQLite` sync mode configuration.
///
/// # Invariants
/// - Values map 1:1 to `SQLite` `synchronous` pragma settings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum SqliteSyncMode {
    /// Full synchronous mode (safest).
    #[default]
    Full,
    /// Normal synchronous mode (balanced).
    Normal,
}

impl SqliteSyncMode {
    /// Returns the `SQLite` pragma value.
    #[must_use]
    pub const fn pragma_value(self) -> &'static str {
        match self {
            Self::Full => "full",
            Self::Normal => "normal",
        }
    }
}

/// Configuration for the `SQLite` request store.
///
/// # Invariants
/// - `path` must resolve to a file path (not a directory).
/// - `busy_timeout_ms` is interpreted as milliseconds.
#[derive(Debug, Clone, Deserialize)]
pub struct SqliteStoreConfig {
    /// Path to the `SQLite` database file.
    pub path: PathBuf,
    /// Busy timeout in milliseconds.
    #[serde(default = "default_busy_timeout_ms")]
    pub busy_timeout_ms: u64,
    /// `SQLite` journal mode.
    #[serde(default)]
    pub journal_mode: SqliteStoreMode,
    /// `SQLite` sync mode.
    #[serde(default)]
    pub sync_mode: SqliteSyncMode,
}

impl SqliteStoreConfig {
    /// Creates a config with defaults for the given database path.
    #[must_use]
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            busy_timeout_ms: DEFAULT_BUSY_TIMEOUT_MS,
            journal_mode: SqliteStoreMode::default(),
            sync_mode: SqliteSyncMode::default(),
        }
    }
}

/// Returns the default busy timeout.
const fn default_busy_timeout_ms() -> u64 {
    DEFAULT_BUSY_TIMEOUT_MS
}

// ============================================================================
// SECTION: Errors
// ============================================================================

/// Errors local to the `SQLite` store.
#[derive(Debug, Error)]
pub enum SqliteStoreError {
    /// Database failure.
    #[error("sqlite store db error: {0}")]
    Db(String),
    /// Invalid configuration or input.
    #[error("sqlite store invalid: {0}")]
    Invalid(String),
    /// Stored data failed an integrity check.
    #[error("sqlite store corruption: {0}")]
    Corrupt(String),
    /// Stored schema version is incompatible.
    #[error("sqlite store version mismatch: {0}")]
    VersionMismatch(String),
}

impl From<SqliteStoreError> for StoreError {
    fn from(err: SqliteStoreError) -> Self {
        match err {
            SqliteStoreError::Db(message) => Self::Io(message),
            SqliteStoreError::Invalid(message) => Self::Invalid(message),
            SqliteStoreError::Corrupt(message) => Self::Corrupt(message),
            SqliteStoreError::VersionMismatch(message) => Self::VersionMismatch(message),
        }
    }
}

/// Maps a rusqlite failure into the local error type.
fn db_err(err: &rusqlite::Error) -> SqliteStoreError {
    SqliteStoreError::Db(err.to_string())
}

// ============================================================================
// SECTION: Store
// ============================================================================

/// Durable token-scoped request store backed by `SQLite`.
#[derive(Debug)]
pub struct SqliteRequestStore {
    /// Database connection serialized behind a mutex.
    connection: Mutex<Connection>,
}

impl SqliteRequestStore {
    /// Opens (creating if needed) the store at the configured path.
    ///
    /// # Errors
    ///
    /// Returns [`SqliteStoreError`] on invalid paths, connection failure, or
    /// schema version mismatch.
    pub fn open(config: &SqliteStoreConfig) -> Result<Self, SqliteStoreError> {
        validate_path(&config.path)?;
        let mut connection = open_connection(config)?;
        initialize_schema(&mut connection)?;
        Ok(Self {
            connection: Mutex::new(connection),
        })
    }

    /// Seeds one signing link; stands in for the external issuance flow.
    ///
    /// The signer-facing runtime never calls this; only host tooling does.
    ///
    /// # Errors
    ///
    /// Returns [`SqliteStoreError`] when the token is already present or the
    /// transaction fails.
    pub fn insert_request(
        &self,
        request: &SignatureRequest,
        branding: &TenantBranding,
        mappings: &[FieldMapping],
        profile: &SignerProfile,
    ) -> Result<(), SqliteStoreError> {
        let mut guard = self.lock()?;
        let tx = guard.transaction().map_err(|err| db_err(&err))?;
        let inserted = tx
            .execute(
                "INSERT OR IGNORE INTO signature_requests (
                    token, request_id, tenant_id, template_id, signer_name,
                    signer_email, requester_name, status, document_path,
                    signed_document_path, signature_path, signature_hash,
                    expires_at, signed_at, tenant_display_name
                ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, NULL, NULL, NULL, ?10, NULL, ?11)",
                params![
                    request.token.as_str(),
                    request.request_id.as_str(),
                    request.tenant_id.as_str(),
                    request.template_id.as_str(),
                    request.signer_name,
                    request.signer_email,
                    request.requester_name,
                    request.status.as_str(),
                    request.document_path,
                    request.expires_at.as_unix_millis(),
                    branding.display_name,
                ],
            )
            .map_err(|err| db_err(&err))?;
        if inserted == 0 {
            return Err(SqliteStoreError::Invalid("token already seeded".to_string()));
        }
        for mapping in mappings {
            tx.execute(
                "INSERT INTO field_mappings (
                    token, field_key, kind, page, x, y, width, height, trigger_value
                ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)",
                params![
                    request.token.as_str(),
                    mapping.key.as_str(),
                    kind_label(mapping.kind),
                    mapping.page,
                    mapping.x,
                    mapping.y,
                    mapping.width,
                    mapping.height,
                    mapping.trigger_value,
                ],
            )
            .map_err(|err| db_err(&err))?;
        }
        for key in profile.usable_keys() {
            tx.execute(
                "INSERT INTO profile_values (token, field_key, value) VALUES (?1, ?2, ?3)",
                params![request.token.as_str(), key.as_str(), profile.get(key)],
            )
            .map_err(|err| db_err(&err))?;
        }
        tx.commit().map_err(|err| db_err(&err))?;
        Ok(())
    }

    /// Locks the connection, failing closed on poisoning.
    fn lock(&self) -> Result<MutexGuard<'_, Connection>, SqliteStoreError> {
        self.connection
            .lock()
            .map_err(|_| SqliteStoreError::Db("store mutex poisoned".to_string()))
    }

    /// Returns whether the token exists at all.
    fn token_exists(
        conn: &Connection,
        token: &RequestToken,
    ) -> Result<bool, SqliteStoreError> {
        conn.query_row(
            "SELECT 1 FROM signature_requests WHERE token = ?1",
            params![token.as_str()],
            |_| Ok(()),
        )
        .optional()
        .map(|found| found.is_some())
        .map_err(|err| db_err(&err))
    }
}

impl RequestStore for SqliteRequestStore {
    fn get_request(&self, token: &RequestToken) -> Result<Option<SignatureRequest>, StoreError> {
        let guard = self.lock()?;
        let row = guard
            .query_row(
                "SELECT token, request_id, tenant_id, template_id, signer_name,
                        signer_email, requester_name, status, document_path,
                        signed_document_path, signature_path, signature_hash,
                        expires_at, signed_at
                 FROM signature_requests WHERE token = ?1",
                params![token.as_str()],
                request_from_row,
            )
            .optional()
            .map_err(|err| StoreError::from(db_err(&err)))?;
        row.map(|parsed| parsed.map_err(StoreError::from)).transpose()
    }

    fn get_field_mappings(&self, token: &RequestToken) -> Result<Vec<FieldMapping>, StoreError> {
        let guard = self.lock()?;
        if !Self::token_exists(&guard, token)? {
            return Err(StoreError::NotFound);
        }
        let mut statement = guard
            .prepare(
                "SELECT field_key, kind, page, x, y, width, height, trigger_value
                 FROM field_mappings WHERE token = ?1 ORDER BY id",
            )
            .map_err(|err| StoreError::from(db_err(&err)))?;
        let rows = statement
            .query_map(params![token.as_str()], mapping_from_row)
            .map_err(|err| StoreError::from(db_err(&err)))?;
        let mut mappings = Vec::new();
        for row in rows {
            let parsed = row.map_err(|err| StoreError::from(db_err(&err)))?;
            mappings.push(parsed.map_err(StoreError::from)?);
        }
        Ok(mappings)
    }

    fn get_signer_profile(&self, token: &RequestToken) -> Result<SignerProfile, StoreError> {
        let guard = self.lock()?;
        if !Self::token_exists(&guard, token)? {
            return Err(StoreError::NotFound);
        }
        let mut statement = guard
            .prepare("SELECT field_key, value FROM profile_values WHERE token = ?1")
            .map_err(|err| StoreError::from(db_err(&err)))?;
        let rows = statement
            .query_map(params![token.as_str()], |row| {
                Ok((row.get::<_, String>(0)?, row.get::<_, Option<String>>(1)?))
            })
            .map_err(|err| StoreError::from(db_err(&err)))?;
        let mut profile = SignerProfile::new();
        for row in rows {
            let (key, value) = row.map_err(|err| StoreError::from(db_err(&err)))?;
            profile.set(FieldKey::new(key), value);
        }
        Ok(profile)
    }

    fn update_signer_profile(
        &self,
        token: &RequestToken,
        updates: &ProfileUpdate,
    ) -> Result<(), StoreError> {
        let mut guard = self.lock()?;
        if !Self::token_exists(&guard, token)? {
            return Err(StoreError::NotFound);
        }
        let tx = guard.transaction().map_err(|err| StoreError::from(db_err(&err)))?;
        for (key, value) in &updates.values {
            tx.execute(
                "INSERT INTO profile_values (token, field_key, value) VALUES (?1, ?2, ?3)
                 ON CONFLICT (token, field_key) DO UPDATE SET value = excluded.value",
                params![token.as_str(), key.as_str(), value],
            )
            .map_err(|err| StoreError::from(db_err(&err)))?;
        }
        tx.commit().map_err(|err| StoreError::from(db_err(&err)))?;
        Ok(())
    }

    fn get_tenant_branding(&self, token: &RequestToken) -> Result<TenantBranding, StoreError> {
        let guard = self.lock()?;
        guard
            .query_row(
                "SELECT tenant_display_name FROM signature_requests WHERE token = ?1",
                params![token.as_str()],
                |row| {
                    Ok(TenantBranding {
                        display_name: row.get(0)?,
                    })
                },
            )
            .optional()
            .map_err(|err| StoreError::from(db_err(&err)))?
            .ok_or(StoreError::NotFound)
    }

    fn mark_expired(&self, token: &RequestToken) -> Result<(), StoreError> {
        let guard = self.lock()?;
        if !Self::token_exists(&guard, token)? {
            return Err(StoreError::NotFound);
        }
        // Terminal states are left untouched; the check stays idempotent.
        guard
            .execute(
                "UPDATE signature_requests SET status = 'expired'
                 WHERE token = ?1 AND status = 'pending'",
                params![token.as_str()],
            )
            .map_err(|err| StoreError::from(db_err(&err)))?;
        Ok(())
    }

    fn complete_signature(
        &self,
        token: &RequestToken,
        record: &CompletionRecord,
    ) -> Result<CompletionOutcome, StoreError> {
        let mut guard = self.lock()?;
        let tx = guard.transaction().map_err(|err| StoreError::from(db_err(&err)))?;

        // Backend-enforced compare-and-set: the guard clause matches only the
        // single pending row, so a concurrent second attempt updates nothing.
        let updated = tx
            .execute(
                "UPDATE signature_requests SET
                    status = 'signed',
                    signed_document_path = ?1,
                    signature_path = ?2,
                    signature_hash = ?3,
                    signed_at = ?4
                 WHERE token = ?5 AND status = 'pending'",
                params![
                    record.signed_document_path,
                    record.signature_path,
                    record.signature_hash.value,
                    record.completed_at.as_unix_millis(),
                    token.as_str(),
                ],
            )
            .map_err(|err| StoreError::from(db_err(&err)))?;
        if updated == 0 {
            return if Self::token_exists(&tx, token)? {
                Ok(CompletionOutcome::Conflict)
            } else {
                Err(StoreError::NotFound)
            };
        }

        let request_id: String = tx
            .query_row(
                "SELECT request_id FROM signature_requests WHERE token = ?1",
                params![token.as_str()],
                |row| row.get(0),
            )
            .map_err(|err| StoreError::from(db_err(&err)))?;
        let audit = AuditRecord {
            request_id: RequestId::new(request_id),
            signer_name: record.signer.name.clone(),
            signer_email: record.signer.email.clone(),
            completed_at: record.completed_at,
            client_address: record.client_address.clone(),
            user_agent: record.user_agent.clone(),
            signature_hash: record.signature_hash.clone(),
            disposition: signet_core::DISPOSITION_SIGNED.to_string(),
        };
        let record_json = canonical_json_bytes(&audit)
            .map_err(|err| StoreError::Invalid(err.to_string()))?;
        let record_hash = hash_bytes(DEFAULT_HASH_ALGORITHM, &record_json);
        tx.execute(
            "INSERT INTO audit_log (token, record_json, record_hash, created_at)
             VALUES (?1, ?2, ?3, ?4)",
            params![
                token.as_str(),
                record_json,
                record_hash.value,
                record.completed_at.as_unix_millis(),
            ],
        )
        .map_err(|err| StoreError::from(db_err(&err)))?;

        tx.commit().map_err(|err| StoreError::from(db_err(&err)))?;
        Ok(CompletionOutcome::Completed)
    }

    fn get_audit_records(&self, token: &RequestToken) -> Result<Vec<AuditRecord>, StoreError> {
        let guard = self.lock()?;
        if !Self::token_exists(&guard, token)? {
            return Err(StoreError::NotFound);
        }
        let mut statement = guard
            .prepare(
                "SELECT record_json, record_hash FROM audit_log
                 WHERE token = ?1 ORDER BY id",
            )
            .map_err(|err| StoreError::from(db_err(&err)))?;
        let rows = statement
            .query_map(params![token.as_str()], |row| {
                Ok((row.get::<_, Vec<u8>>(0)?, row.get::<_, String>(1)?))
            })
            .map_err(|err| StoreError::from(db_err(&err)))?;
        let mut records = Vec::new();
        for row in rows {
            let (json, stored_hash) = row.map_err(|err| StoreError::from(db_err(&err)))?;
            let computed = hash_bytes(DEFAULT_HASH_ALGORITHM, &json);
            if computed.value != stored_hash {
                return Err(StoreError::Corrupt("audit record hash mismatch".to_string()));
            }
            let record: AuditRecord = serde_json::from_slice(&json)
                .map_err(|err| StoreError::Corrupt(err.to_string()))?;
            records.push(record);
        }
        Ok(records)
    }
}

// ============================================================================
// SECTION: Row Mapping
// ============================================================================

/// Intermediate result allowing row parsing to report domain corruption.
type ParsedRequest = Result<SignatureRequest, SqliteStoreError>;

/// Maps a request row into the domain type.
fn request_from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<ParsedRequest> {
    let status_label: String = row.get(7)?;
    let hash_value: Option<String> = row.get(11)?;
    let expires_at: i64 = row.get(12)?;
    let signed_at: Option<i64> = row.get(13)?;
    let token: String = row.get(0)?;
    let request_id: String = row.get(1)?;
    let tenant_id: String = row.get(2)?;
    let template_id: String = row.get(3)?;
    let signer_name: String = row.get(4)?;
    let signer_email: Option<String> = row.get(5)?;
    let requester_name: String = row.get(6)?;
    let document_path: String = row.get(8)?;
    let signed_document_path: Option<String> = row.get(9)?;
    let signature_path: Option<String> = row.get(10)?;

    let parsed = status_from_label(&status_label).map(|status| SignatureRequest {
        token: RequestToken::new(token),
        request_id: RequestId::new(request_id),
        tenant_id: TenantId::new(tenant_id),
        template_id: TemplateId::new(template_id),
        signer_name,
        signer_email,
        requester_name,
        status,
        document_path,
        signed_document_path,
        signature_path,
        signature_hash: hash_value.map(|value| HashDigest {
            algorithm: HashAlgorithm::Sha256,
            value,
        }),
        expires_at: Timestamp::from_unix_millis(expires_at),
        signed_at: signed_at.map(Timestamp::from_unix_millis),
    });
    Ok(parsed)
}

/// Intermediate result allowing mapping rows to report domain corruption.
type ParsedMapping = Result<FieldMapping, SqliteStoreError>;

/// Maps a field-mapping row into the domain type.
fn mapping_from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<ParsedMapping> {
    let key: String = row.get(0)?;
    let kind_label: String = row.get(1)?;
    let page: u32 = row.get(2)?;
    let x: f64 = row.get(3)?;
    let y: f64 = row.get(4)?;
    let width: f64 = row.get(5)?;
    let height: f64 = row.get(6)?;
    let trigger_value: Option<String> = row.get(7)?;

    let parsed = kind_from_label(&kind_label).map(|kind| FieldMapping {
        key: FieldKey::new(key),
        kind,
        page,
        x,
        y,
        width,
        height,
        trigger_value,
    });
    Ok(parsed)
}

/// Returns the stable storage label for a field kind.
const fn kind_label(kind: FieldKind) -> &'static str {
    match kind {
        FieldKind::Text => "text",
        FieldKind::Checkbox => "checkbox",
        FieldKind::Signature => "signature",
    }
}

/// Parses a stored field-kind label.
fn kind_from_label(label: &str) -> Result<FieldKind, SqliteStoreError> {
    match label {
        "text" => Ok(FieldKind::Text),
        "checkbox" => Ok(FieldKind::Checkbox),
        "signature" => Ok(FieldKind::Signature),
        other => Err(SqliteStoreError::Corrupt(format!("unknown field kind: {other}"))),
    }
}

/// Parses a stored status label.
fn status_from_label(label: &str) -> Result<RequestStatus, SqliteStoreError> {
    match label {
        "pending" => Ok(RequestStatus::Pending),
        "signed" => Ok(RequestStatus::Signed),
        "expired" => Ok(RequestStatus::Expired),
        "cancelled" => Ok(RequestStatus::Cancelled),
        other => Err(SqliteStoreError::Corrupt(format!("unknown request status: {other}"))),
    }
}

// ============================================================================
// SECTION: Connection Setup
// ============================================================================

/// Validates the configured database path.
fn validate_path(path: &Path) -> Result<(), SqliteStoreError> {
    let path_string = path.to_string_lossy();
    if path_string.is_empty() {
        return Err(SqliteStoreError::Invalid("store path is empty".to_string()));
    }
    if path_string.len() > MAX_TOTAL_PATH_LENGTH {
        return Err(SqliteStoreError::Invalid("store path exceeds length limit".to_string()));
    }
    for component in path.components() {
        let name = component.as_os_str().to_string_lossy();
        if name.len() > MAX_PATH_COMPONENT_LENGTH {
            return Err(SqliteStoreError::Invalid(
                "store path contains an overlong component".to_string(),
            ));
        }
    }
    if path.exists() && path.is_dir() {
        return Err(SqliteStoreError::Invalid(
            "store path must be a file, not a directory".to_string(),
        ));
    }
    Ok(())
}

/// Opens an `SQLite` connection with secure defaults.
fn open_connection(config: &SqliteStoreConfig) -> Result<Connection, SqliteStoreError> {
    let flags = OpenFlags::SQLITE_OPEN_READ_WRITE
        | OpenFlags::SQLITE_OPEN_CREATE
        | OpenFlags::SQLITE_OPEN_FULL_MUTEX;
    let connection =
        Connection::open_with_flags(&config.path, flags).map_err(|err| db_err(&err))?;
    apply_pragmas(&connection, config)?;
    Ok(connection)
}

/// Applies `SQLite` pragmas required for durability.
fn apply_pragmas(
    connection: &Connection,
    config: &SqliteStoreConfig,
) -> Result<(), SqliteStoreError> {
    connection
        .execute_batch("PRAGMA foreign_keys = ON;")
        .map_err(|err| db_err(&err))?;
    connection
        .execute_batch(&format!("PRAGMA journal_mode = {};", config.journal_mode.pragma_value()))
        .map_err(|err| db_err(&err))?;
    connection
        .execute_batch(&format!("PRAGMA synchronous = {};", config.sync_mode.pragma_value()))
        .map_err(|err| db_err(&err))?;
    connection
        .busy_timeout(Duration::from_millis(config.busy_timeout_ms))
        .map_err(|err| db_err(&err))?;
    Ok(())
}

/// Initializes the `SQLite` schema or validates the existing version.
fn initialize_schema(connection: &mut Connection) -> Result<(), SqliteStoreError> {
    let tx = connection.transaction().map_err(|err| db_err(&err))?;
    tx.execute_batch("CREATE TABLE IF NOT EXISTS store_meta (version INTEGER NOT NULL);")
        .map_err(|err| db_err(&err))?;
    let version: Option<i64> = tx
        .query_row("SELECT version FROM store_meta LIMIT 1", params![], |row| row.get(0))
        .optional()
        .map_err(|err| db_err(&err))?;
    match version {
        None => {
            tx.execute("INSERT INTO store_meta (version) VALUES (?1)", params![SCHEMA_VERSION])
                .map_err(|err| db_err(&err))?;
            tx.execute_batch(
                "CREATE TABLE IF NOT EXISTS signature_requests (
                    token TEXT PRIMARY KEY,
                    request_id TEXT NOT NULL,
                    tenant_id TEXT NOT NULL,
                    template_id TEXT NOT NULL,
                    signer_name TEXT NOT NULL,
                    signer_email TEXT,
                    requester_name TEXT NOT NULL,
                    status TEXT NOT NULL,
                    document_path TEXT NOT NULL,
                    signed_document_path TEXT,
                    signature_path TEXT,
                    signature_hash TEXT,
                    expires_at INTEGER NOT NULL,
                    signed_at INTEGER,
                    tenant_display_name TEXT NOT NULL
                );
                CREATE TABLE IF NOT EXISTS field_mappings (
                    id INTEGER PRIMARY KEY AUTOINCREMENT,
                    token TEXT NOT NULL REFERENCES signature_requests(token)
                        ON DELETE CASCADE,
                    field_key TEXT NOT NULL,
                    kind TEXT NOT NULL,
                    page INTEGER NOT NULL,
                    x REAL NOT NULL,
                    y REAL NOT NULL,
                    width REAL NOT NULL,
                    height REAL NOT NULL,
                    trigger_value TEXT
                );
                CREATE INDEX IF NOT EXISTS idx_field_mappings_token
                    ON field_mappings (token);
                CREATE TABLE IF NOT EXISTS profile_values (
                    token TEXT NOT NULL REFERENCES signature_requests(token)
                        ON DELETE CASCADE,
                    field_key TEXT NOT NULL,
                    value TEXT,
                    PRIMARY KEY (token, field_key)
                );
                CREATE TABLE IF NOT EXISTS audit_log (
                    id INTEGER PRIMARY KEY AUTOINCREMENT,
                    token TEXT NOT NULL REFERENCES signature_requests(token)
                        ON DELETE CASCADE,
                    record_json BLOB NOT NULL,
                    record_hash TEXT NOT NULL,
                    created_at INTEGER NOT NULL
                );",
            )
            .map_err(|err| db_err(&err))?;
        }
        Some(found) if found == SCHEMA_VERSION => {}
        Some(found) => {
            return Err(SqliteStoreError::VersionMismatch(format!(
                "found schema version {found}, expected {SCHEMA_VERSION}"
            )));
        }
    }
    tx.commit().map_err(|err| db_err(&err))?;
    Ok(())
}
