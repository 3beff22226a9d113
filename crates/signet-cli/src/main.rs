// crates/signet-cli/src/main.rs
// ============================================================================
// Module: Signet CLI Entry Point
// Description: Command dispatcher for signing-session workflows.
// Purpose: Drive seeding, corrections, signing, download, and verification.
// Dependencies: clap, signet-capture, signet-compose, signet-config,
//               signet-core, signet-providers, signet-store-sqlite
// ============================================================================

//! ## Overview
//! The Signet CLI wires the pipeline end to end over the durable SQLite
//! request store and the filesystem document store: seed a signing link,
//! inspect its state, submit field corrections, run the capture-and-complete
//! flow, download the signed artifact, and verify the audit hash against the
//! uploaded signature bytes.

// ============================================================================
// SECTION: Modules
// ============================================================================


// ============================================================================
// SECTION: Imports
// ============================================================================

use std::fs;
use std::fs::OpenOptions;
use std::io::Write;
use std::path::Path;
use std::path::PathBuf;
use std::process::ExitCode;
use std::time::SystemTime;
use std::time::UNIX_EPOCH;

use clap::Parser;
use clap::Subcommand;
use serde::Deserialize;
use signet_capture::CaptureSurface;
use signet_capture::PointerPoint;
use signet_compose::CertificateLabels;
use signet_compose::PdfCompositor;
use signet_config::SignetConfig;
use signet_core::ClientContext;
use signet_core::DocumentStore;
use signet_core::FieldKey;
use signet_core::FieldKind;
use signet_core::FieldMapping;
use signet_core::ProfileUpdate;
use signet_core::RequestId;
use signet_core::RequestStatus;
use signet_core::RequestStore;
use signet_core::RequestToken;
use signet_core::SessionConfig;
use signet_core::SessionState;
use signet_core::SignatureRequest;
use signet_core::SignerProfile;
use signet_core::SigningSession;
use signet_core::TemplateId;
use signet_core::TenantBranding;
use signet_core::TenantId;
use signet_core::Timestamp;
use signet_core::hashing::DEFAULT_HASH_ALGORITHM;
use signet_core::hashing::hash_bytes;
use signet_core::load_session;
use signet_core::runtime::JsonLineSink;
use signet_core::submit_corrections;
use signet_providers::FsDocumentStore;
use signet_providers::HttpClientAddressSource;
use signet_store_sqlite::SqliteRequestStore;
use thiserror::Error;

// ============================================================================
// SECTION: Constants
// ============================================================================

/// Default signing-link lifetime when seeding, in hours.
const DEFAULT_EXPIRES_IN_HOURS: i64 = 168;
/// Event log filename under the storage root.
const EVENT_LOG_NAME: &str = "signet-events.jsonl";

// ============================================================================
// SECTION: CLI Types
// ============================================================================

/// Top-level CLI definition.
#[derive(Parser, Debug)]
#[command(name = "signet", version, about = "Signet signing pipeline tools")]
struct Cli {
    /// Path to the configuration file (overrides `SIGNET_CONFIG`).
    #[arg(long, global = true, value_name = "FILE")]
    config: Option<PathBuf>,
    /// Selected subcommand to execute.
    #[command(subcommand)]
    command: Commands,
}

/// Supported CLI subcommands.
#[derive(Subcommand, Debug)]
enum Commands {
    /// Seed a signing link from a template file and source document.
    Seed(SeedCommand),
    /// Show the state of a signing link.
    Status(TokenCommand),
    /// Submit field corrections for a signing link.
    Fill(FillCommand),
    /// Capture (or load) a signature and complete the signing flow.
    Sign(SignCommand),
    /// Download the signed document.
    Download(DownloadCommand),
    /// Verify the recorded audit hash against the uploaded signature bytes.
    Verify(TokenCommand),
}

/// Arguments for seeding one signing link.
#[derive(Parser, Debug)]
struct SeedCommand {
    /// Access token to mint for the link.
    #[arg(long)]
    token: String,
    /// Owning tenant identifier.
    #[arg(long)]
    tenant: String,
    /// Template description file (TOML).
    #[arg(long, value_name = "FILE")]
    template: PathBuf,
    /// Source document (PDF).
    #[arg(long, value_name = "FILE")]
    document: PathBuf,
    /// Signer display name.
    #[arg(long)]
    signer_name: String,
    /// Signer email.
    #[arg(long)]
    signer_email: Option<String>,
    /// Requester display name.
    #[arg(long)]
    requester: String,
    /// Link lifetime in hours.
    #[arg(long, default_value_t = DEFAULT_EXPIRES_IN_HOURS)]
    expires_in_hours: i64,
}

/// Arguments carrying only a token.
#[derive(Parser, Debug)]
struct TokenCommand {
    /// Access token of the signing link.
    #[arg(long)]
    token: String,
}

/// Arguments for submitting corrections.
#[derive(Parser, Debug)]
struct FillCommand {
    /// Access token of the signing link.
    #[arg(long)]
    token: String,
    /// Field values as `key=value` pairs.
    #[arg(value_name = "KEY=VALUE", required = true)]
    values: Vec<String>,
}

/// Arguments for the signing flow.
#[derive(Parser, Debug)]
struct SignCommand {
    /// Access token of the signing link.
    #[arg(long)]
    token: String,
    /// Pre-rendered signature image (PNG).
    #[arg(long, value_name = "FILE", conflicts_with = "strokes")]
    signature: Option<PathBuf>,
    /// Stroke capture file (JSON) rendered through the capture surface.
    #[arg(long, value_name = "FILE")]
    strokes: Option<PathBuf>,
    /// User-agent string recorded in the audit trail.
    #[arg(long, default_value_t = default_user_agent())]
    user_agent: String,
}

/// Arguments for downloading the signed document.
#[derive(Parser, Debug)]
struct DownloadCommand {
    /// Access token of the signing link.
    #[arg(long)]
    token: String,
    /// Output path for the signed document.
    #[arg(long, value_name = "FILE")]
    out: PathBuf,
}

/// Returns the default recorded user agent.
fn default_user_agent() -> String {
    format!("signet-cli/{}", env!("CARGO_PKG_VERSION"))
}

// ============================================================================
// SECTION: Template File
// ============================================================================

/// Template description file parsed for seeding.
#[derive(Debug, Deserialize)]
struct TemplateFile {
    /// Template identifier.
    template_id: String,
    /// Tenant display name for branding.
    #[serde(default)]
    display_name: Option<String>,
    /// Field layout entries.
    #[serde(default)]
    fields: Vec<TemplateField>,
}

/// One field entry in a template file.
#[derive(Debug, Deserialize)]
struct TemplateField {
    /// Key into the signer profile.
    key: String,
    /// Field kind: `text`, `checkbox`, or `signature`.
    kind: String,
    /// 1-based page number.
    page: u32,
    /// Horizontal position in points from the left edge.
    x: f64,
    /// Vertical position in points from the top edge.
    y: f64,
    /// Field width in points.
    width: f64,
    /// Field height in points.
    height: f64,
    /// Checkbox trigger value.
    #[serde(default)]
    trigger_value: Option<String>,
}

/// Stroke capture file rendered through the capture surface.
#[derive(Debug, Deserialize)]
struct StrokesFile {
    /// Surface width in pixels.
    width: u32,
    /// Surface height in pixels.
    height: u32,
    /// Strokes as lists of `[x, y]` points.
    strokes: Vec<Vec<[f32; 2]>>,
}

// ============================================================================
// SECTION: Errors
// ============================================================================

/// CLI error carrying a user-facing message.
#[derive(Debug, Error)]
#[error("{message}")]
struct CliError {
    /// Human-readable error message.
    message: String,
}

impl CliError {
    /// Constructs a new [`CliError`].
    fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

/// CLI result alias for fallible operations.
type CliResult<T> = Result<T, CliError>;

// ============================================================================
// SECTION: Entry Point
// ============================================================================

/// CLI entry point returning an exit code.
fn main() -> ExitCode {
    match run() {
        Ok(code) => code,
        Err(err) => {
            let mut stderr = std::io::stderr();
            let _ = writeln!(&mut stderr, "error: {err}");
            ExitCode::FAILURE
        }
    }
}

/// Executes the CLI command dispatcher.
fn run() -> CliResult<ExitCode> {
    let cli = Cli::parse();
    let config = SignetConfig::load(cli.config.as_deref())
        .map_err(|err| CliError::new(err.to_string()))?;
    match cli.command {
        Commands::Seed(command) => command_seed(&config, &command),
        Commands::Status(command) => command_status(&config, &command),
        Commands::Fill(command) => command_fill(&config, &command),
        Commands::Sign(command) => command_sign(&config, command),
        Commands::Download(command) => command_download(&config, &command),
        Commands::Verify(command) => command_verify(&config, &command),
    }
}

// ============================================================================
// SECTION: Shared Wiring
// ============================================================================

/// Opens the durable request store.
fn open_store(config: &SignetConfig) -> CliResult<SqliteRequestStore> {
    SqliteRequestStore::open(&config.request_store).map_err(|err| CliError::new(err.to_string()))
}

/// Opens the filesystem document store.
fn open_documents(config: &SignetConfig) -> CliResult<FsDocumentStore> {
    FsDocumentStore::open(config.storage.root.clone())
        .map_err(|err| CliError::new(err.to_string()))
}

/// Returns the current wall-clock time as a pipeline timestamp.
fn now() -> CliResult<Timestamp> {
    let elapsed = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map_err(|err| CliError::new(err.to_string()))?;
    let millis = i64::try_from(elapsed.as_millis())
        .map_err(|err| CliError::new(err.to_string()))?;
    Ok(Timestamp::from_unix_millis(millis))
}

/// Builds the session runtime configuration from host configuration.
fn session_config(config: &SignetConfig) -> SessionConfig {
    SessionConfig {
        documents_bucket: config.storage.documents_bucket.clone(),
        signatures_bucket: config.storage.signatures_bucket.clone(),
        download_url_ttl_seconds: config.storage.download_url_ttl_seconds,
    }
}

/// Builds the certificate labels from host configuration.
fn certificate_labels(config: &SignetConfig) -> CertificateLabels {
    CertificateLabels {
        product_name: config.branding.product_name.clone(),
        legal_notice: config.branding.legal_notice.clone(),
        not_provided: config.branding.not_provided_label.clone(),
    }
}

/// Opens the append-only event log under the storage root.
fn open_event_log(config: &SignetConfig) -> CliResult<JsonLineSink<fs::File>> {
    fs::create_dir_all(&config.storage.root).map_err(|err| CliError::new(err.to_string()))?;
    let file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(config.storage.root.join(EVENT_LOG_NAME))
        .map_err(|err| CliError::new(err.to_string()))?;
    Ok(JsonLineSink::new(file))
}

/// Writes one line to stdout.
fn write_stdout_line(message: &str) -> CliResult<()> {
    let mut stdout = std::io::stdout();
    writeln!(&mut stdout, "{message}").map_err(|err| CliError::new(err.to_string()))
}

// ============================================================================
// SECTION: Seed
// ============================================================================

/// Seeds one signing link and uploads its source document.
fn command_seed(config: &SignetConfig, command: &SeedCommand) -> CliResult<ExitCode> {
    let template_text =
        fs::read_to_string(&command.template).map_err(|err| CliError::new(err.to_string()))?;
    let template: TemplateFile =
        toml::from_str(&template_text).map_err(|err| CliError::new(err.to_string()))?;
    let document =
        fs::read(&command.document).map_err(|err| CliError::new(err.to_string()))?;
    if document.len() > config.limits.max_document_bytes {
        return Err(CliError::new("source document exceeds the configured size limit"));
    }

    let mut mappings = Vec::new();
    for field in &template.fields {
        mappings.push(FieldMapping {
            key: FieldKey::new(field.key.clone()),
            kind: parse_kind(&field.kind)?,
            page: field.page,
            x: field.x,
            y: field.y,
            width: field.width,
            height: field.height,
            trigger_value: field.trigger_value.clone(),
        });
    }

    // Request ids are derived from the token so seeding stays deterministic.
    let request_id = format!(
        "req-{}",
        &hash_bytes(DEFAULT_HASH_ALGORITHM, command.token.as_bytes()).value[..12]
    );
    let document_path = format!("{}/{request_id}/source.pdf", command.tenant);

    let documents = open_documents(config)?;
    documents
        .upload(&config.storage.documents_bucket, &document_path, &document, "application/pdf")
        .map_err(|err| CliError::new(err.to_string()))?;

    let current = now()?;
    let expires_at = Timestamp::from_unix_millis(
        current.as_unix_millis() + command.expires_in_hours * 60 * 60 * 1_000,
    );
    let request = SignatureRequest {
        token: RequestToken::new(command.token.clone()),
        request_id: RequestId::new(request_id.clone()),
        tenant_id: TenantId::new(command.tenant.clone()),
        template_id: TemplateId::new(template.template_id.clone()),
        signer_name: command.signer_name.clone(),
        signer_email: command.signer_email.clone(),
        requester_name: command.requester.clone(),
        status: RequestStatus::Pending,
        document_path,
        signed_document_path: None,
        signature_path: None,
        signature_hash: None,
        expires_at,
        signed_at: None,
    };
    let branding = TenantBranding {
        display_name: template
            .display_name
            .clone()
            .unwrap_or_else(|| config.branding.tenant_display_name.clone()),
    };

    let store = open_store(config)?;
    store
        .insert_request(&request, &branding, &mappings, &SignerProfile::new())
        .map_err(|err| CliError::new(err.to_string()))?;
    write_stdout_line(&format!("seeded signing link {request_id}"))?;
    Ok(ExitCode::SUCCESS)
}

/// Parses a template field kind label.
fn parse_kind(label: &str) -> CliResult<FieldKind> {
    match label {
        "text" => Ok(FieldKind::Text),
        "checkbox" => Ok(FieldKind::Checkbox),
        "signature" => Ok(FieldKind::Signature),
        other => Err(CliError::new(format!("unknown field kind: {other}"))),
    }
}

// ============================================================================
// SECTION: Status / Fill
// ============================================================================

/// Shows the resolved state of a signing link.
fn command_status(config: &SignetConfig, command: &TokenCommand) -> CliResult<ExitCode> {
    let store = open_store(config)?;
    let token = RequestToken::new(command.token.clone());
    match load_session(&store, &token, now()?) {
        Ok(snapshot) => {
            if snapshot.missing.is_empty() {
                write_stdout_line(&format!(
                    "status: {}",
                    snapshot.request.status.as_str()
                ))?;
            } else {
                let keys: Vec<&str> =
                    snapshot.missing.iter().map(FieldKey::as_str).collect();
                write_stdout_line(&format!("status: needs_data ({})", keys.join(", ")))?;
            }
            Ok(ExitCode::SUCCESS)
        }
        Err(err) => Err(CliError::new(err.to_string())),
    }
}

/// Submits field corrections.
fn command_fill(config: &SignetConfig, command: &FillCommand) -> CliResult<ExitCode> {
    let mut updates = ProfileUpdate::new();
    for pair in &command.values {
        let Some((key, value)) = pair.split_once('=') else {
            return Err(CliError::new(format!("expected key=value, got: {pair}")));
        };
        updates = updates.with(key, value);
    }
    let store = open_store(config)?;
    let token = RequestToken::new(command.token.clone());
    let snapshot = submit_corrections(&store, &token, &updates, now()?)
        .map_err(|err| CliError::new(err.to_string()))?;
    if snapshot.missing.is_empty() {
        write_stdout_line("all required fields are filled")?;
    } else {
        let keys: Vec<&str> = snapshot.missing.iter().map(FieldKey::as_str).collect();
        write_stdout_line(&format!("still missing: {}", keys.join(", ")))?;
    }
    Ok(ExitCode::SUCCESS)
}

// ============================================================================
// SECTION: Sign
// ============================================================================

/// Runs the capture-and-complete signing flow.
fn command_sign(config: &SignetConfig, command: SignCommand) -> CliResult<ExitCode> {
    let signature_png = load_signature(config, &command)?;

    let store = open_store(config)?;
    let documents = open_documents(config)?;
    let compositor = PdfCompositor::new(certificate_labels(config));
    let address = HttpClientAddressSource::new(config.address_lookup.clone())
        .map_err(|err| CliError::new(err.to_string()))?;
    let events = open_event_log(config)?;

    let mut session = SigningSession::new(
        RequestToken::new(command.token.clone()),
        session_config(config),
        ClientContext {
            user_agent: command.user_agent.clone(),
        },
        store,
        documents,
        compositor,
        address,
        events,
    );

    let loaded = session.load(now()?).map_err(|err| CliError::new(err.to_string()))?.clone();
    match loaded {
        SessionState::Ready => {}
        SessionState::NeedsData {
            missing,
        } => {
            let keys: Vec<&str> = missing.iter().map(FieldKey::as_str).collect();
            return Err(CliError::new(format!(
                "missing required fields: {} (use `signet fill`)",
                keys.join(", ")
            )));
        }
        SessionState::AlreadySigned {
            ..
        } => {
            write_stdout_line("already signed")?;
            return Ok(ExitCode::SUCCESS);
        }
        SessionState::Expired => return Err(CliError::new("signing link expired")),
        SessionState::NotFound => return Err(CliError::new("signing link not found")),
        other => {
            return Err(CliError::new(format!("cannot sign from state {}", state_label(&other))));
        }
    }

    session.begin_signing(now()?).map_err(|err| CliError::new(err.to_string()))?;
    let state =
        session.confirm_signature(signature_png, now()?).map_err(|err| CliError::new(err.to_string()))?;
    match state.clone() {
        SessionState::Success {
            signed_document_path,
        } => {
            write_stdout_line(&format!("signed: {signed_document_path}"))?;
            let url =
                session.signed_document_url().map_err(|err| CliError::new(err.to_string()))?;
            write_stdout_line(&format!("download: {url}"))?;
            Ok(ExitCode::SUCCESS)
        }
        SessionState::AlreadySigned {
            ..
        } => {
            write_stdout_line("already signed by a concurrent attempt")?;
            Ok(ExitCode::SUCCESS)
        }
        SessionState::Failed {
            message,
        } => Err(CliError::new(message)),
        other => Err(CliError::new(format!(
            "unexpected state after signing: {}",
            state_label(&other)
        ))),
    }
}

/// Loads the signature PNG from a file or renders it from strokes.
fn load_signature(config: &SignetConfig, command: &SignCommand) -> CliResult<Vec<u8>> {
    let bytes = if let Some(path) = &command.signature {
        fs::read(path).map_err(|err| CliError::new(err.to_string()))?
    } else if let Some(path) = &command.strokes {
        render_strokes(path)?
    } else {
        return Err(CliError::new("provide --signature FILE or --strokes FILE"));
    };
    if bytes.len() > config.limits.max_signature_bytes {
        return Err(CliError::new("signature image exceeds the configured size limit"));
    }
    Ok(bytes)
}

/// Renders a strokes file through the capture surface.
fn render_strokes(path: &Path) -> CliResult<Vec<u8>> {
    let raw = fs::read(path).map_err(|err| CliError::new(err.to_string()))?;
    let parsed: StrokesFile =
        serde_json::from_slice(&raw).map_err(|err| CliError::new(err.to_string()))?;

    let mut surface = CaptureSurface::new();
    surface.resize(parsed.width, parsed.height);
    for stroke in &parsed.strokes {
        let mut points = stroke.iter();
        if let Some(first) = points.next() {
            surface.start(PointerPoint::new(first[0], first[1]));
            for point in points {
                surface.extend(PointerPoint::new(point[0], point[1]));
            }
            surface.end();
        }
    }
    if !surface.has_content() {
        return Err(CliError::new("strokes file contains no drawable segments"));
    }
    surface.export().map_err(|err| CliError::new(err.to_string()))
}

/// Returns a short label for a session state.
const fn state_label(state: &SessionState) -> &'static str {
    match state {
        SessionState::Loading => "loading",
        SessionState::NeedsData {
            ..
        } => "needs_data",
        SessionState::Ready => "ready",
        SessionState::Signing => "signing",
        SessionState::Processing => "processing",
        SessionState::Success {
            ..
        } => "success",
        SessionState::Failed {
            ..
        } => "failed",
        SessionState::AlreadySigned {
            ..
        } => "already_signed",
        SessionState::Expired => "expired",
        SessionState::NotFound => "not_found",
    }
}

// ============================================================================
// SECTION: Download / Verify
// ============================================================================

/// Downloads the signed document to a local path.
fn command_download(config: &SignetConfig, command: &DownloadCommand) -> CliResult<ExitCode> {
    let store = open_store(config)?;
    let token = RequestToken::new(command.token.clone());
    let request = store
        .get_request(&token)
        .map_err(|err| CliError::new(err.to_string()))?
        .ok_or_else(|| CliError::new("signing link not found"))?;
    let Some(path) = request.signed_document_path else {
        return Err(CliError::new("document is not signed yet"));
    };
    let documents = open_documents(config)?;
    let bytes = documents
        .download(&config.storage.documents_bucket, &path)
        .map_err(|err| CliError::new(err.to_string()))?;
    fs::write(&command.out, bytes).map_err(|err| CliError::new(err.to_string()))?;
    write_stdout_line(&format!("saved {}", command.out.display()))?;
    Ok(ExitCode::SUCCESS)
}

/// Verifies the recorded audit hash against the uploaded signature bytes.
fn command_verify(config: &SignetConfig, command: &TokenCommand) -> CliResult<ExitCode> {
    let store = open_store(config)?;
    let token = RequestToken::new(command.token.clone());
    let request = store
        .get_request(&token)
        .map_err(|err| CliError::new(err.to_string()))?
        .ok_or_else(|| CliError::new("signing link not found"))?;
    let (Some(signature_path), Some(recorded)) =
        (request.signature_path, request.signature_hash)
    else {
        return Err(CliError::new("document is not signed yet"));
    };

    let documents = open_documents(config)?;
    let signature = documents
        .download(&config.storage.signatures_bucket, &signature_path)
        .map_err(|err| CliError::new(err.to_string()))?;
    let computed = hash_bytes(DEFAULT_HASH_ALGORITHM, &signature);

    let audits =
        store.get_audit_records(&token).map_err(|err| CliError::new(err.to_string()))?;
    let audit_matches =
        audits.iter().all(|record| record.signature_hash.value == computed.value);

    if computed.value == recorded.value && audit_matches {
        write_stdout_line(&format!("verified: sha256 {}", computed.value))?;
        Ok(ExitCode::SUCCESS)
    } else {
        Err(CliError::new("signature hash mismatch; artifacts may have been altered"))
    }
}
