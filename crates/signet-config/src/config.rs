// crates/signet-config/src/config.rs
// ============================================================================
// Module: Signet Configuration
// Description: Configuration loading and validation for Signet hosts.
// Purpose: Provide strict, fail-closed config parsing with hard limits.
// Dependencies: signet-providers, signet-store-sqlite, serde, toml
// ============================================================================

//! ## Overview
//! Configuration is loaded from a TOML file with strict size limits and
//! validated before use. Storage buckets, branding labels, and limits are
//! explicit here and passed into the compositor and persistence layers;
//! nothing in the pipeline reads ambient global identifiers.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::env;
use std::fs;
use std::path::Path;
use std::path::PathBuf;

use serde::Deserialize;
use signet_providers::AddressLookupConfig;
use signet_store_sqlite::SqliteStoreConfig;
use thiserror::Error;

// ============================================================================
// SECTION: Constants
// ============================================================================

/// Default configuration filename when no path is specified.
const DEFAULT_CONFIG_NAME: &str = "signet.toml";
/// Environment variable used to override the config path.
pub(crate) const CONFIG_ENV_VAR: &str = "SIGNET_CONFIG";
/// Maximum configuration file size in bytes.
pub(crate) const MAX_CONFIG_FILE_SIZE: usize = 1024 * 1024;
/// Default database filename.
const DEFAULT_DB_NAME: &str = "signet.db";
/// Minimum signed URL lifetime in seconds.
const MIN_URL_TTL_SECONDS: u64 = 30;
/// Maximum signed URL lifetime in seconds.
const MAX_URL_TTL_SECONDS: u64 = 24 * 60 * 60;
/// Default maximum source-document size in bytes.
const DEFAULT_MAX_DOCUMENT_BYTES: usize = 10 * 1024 * 1024;
/// Hard upper bound on the source-document limit.
const MAX_MAX_DOCUMENT_BYTES: usize = 50 * 1024 * 1024;
/// Default maximum signature image size in bytes.
const DEFAULT_MAX_SIGNATURE_BYTES: usize = 1024 * 1024;
/// Hard upper bound on the signature image limit.
const MAX_MAX_SIGNATURE_BYTES: usize = 4 * 1024 * 1024;
/// Longest accepted branding string.
const MAX_LABEL_LENGTH: usize = 256;

// ============================================================================
// SECTION: Errors
// ============================================================================

/// Configuration loading and validation errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Configuration file could not be read.
    #[error("config read failed: {0}")]
    Read(String),
    /// Configuration file exceeds the size limit.
    #[error("config file exceeds {MAX_CONFIG_FILE_SIZE} bytes")]
    TooLarge,
    /// Configuration file failed to parse.
    #[error("config parse failed: {0}")]
    Parse(String),
    /// Configuration failed validation.
    #[error("config invalid: {0}")]
    Invalid(String),
}

// ============================================================================
// SECTION: Configuration Types
// ============================================================================

/// Root Signet configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct SignetConfig {
    /// Artifact storage configuration.
    #[serde(default)]
    pub storage: StorageConfig,
    /// Durable request store configuration.
    #[serde(default = "default_store_config")]
    pub request_store: SqliteStoreConfig,
    /// Branding rendered on signer screens and the certificate page.
    #[serde(default)]
    pub branding: BrandingConfig,
    /// Client address lookup configuration.
    #[serde(default)]
    pub address_lookup: AddressLookupConfig,
    /// Input size limits.
    #[serde(default)]
    pub limits: LimitsConfig,
}

impl Default for SignetConfig {
    fn default() -> Self {
        Self {
            storage: StorageConfig::default(),
            request_store: default_store_config(),
            branding: BrandingConfig::default(),
            address_lookup: AddressLookupConfig::default(),
            limits: LimitsConfig::default(),
        }
    }
}

/// Returns the default request store configuration.
fn default_store_config() -> SqliteStoreConfig {
    SqliteStoreConfig::new(DEFAULT_DB_NAME)
}

/// Artifact storage configuration.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct StorageConfig {
    /// Filesystem root for the document store.
    pub root: PathBuf,
    /// Bucket holding source and signed documents.
    pub documents_bucket: String,
    /// Bucket holding raw signature images.
    pub signatures_bucket: String,
    /// Lifetime of minted download URLs, in seconds.
    pub download_url_ttl_seconds: u64,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            root: PathBuf::from("signet-data"),
            documents_bucket: "documents".to_string(),
            signatures_bucket: "signatures".to_string(),
            download_url_ttl_seconds: 300,
        }
    }
}

/// Branding labels for signer screens and the certificate page.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct BrandingConfig {
    /// Product name for headers and attribution.
    pub product_name: String,
    /// Legal notice rendered on the certificate footer.
    pub legal_notice: String,
    /// Placeholder rendered when the signer provided no email.
    pub not_provided_label: String,
    /// Fallback tenant display name.
    pub tenant_display_name: String,
}

impl Default for BrandingConfig {
    fn default() -> Self {
        Self {
            product_name: "Signet".to_string(),
            legal_notice: "This page certifies the electronic signature applied to this document."
                .to_string(),
            not_provided_label: "Not provided".to_string(),
            tenant_display_name: "Signet".to_string(),
        }
    }
}

/// Input size limits.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct LimitsConfig {
    /// Maximum source-document size in bytes.
    pub max_document_bytes: usize,
    /// Maximum signature image size in bytes.
    pub max_signature_bytes: usize,
}

impl Default for LimitsConfig {
    fn default() -> Self {
        Self {
            max_document_bytes: DEFAULT_MAX_DOCUMENT_BYTES,
            max_signature_bytes: DEFAULT_MAX_SIGNATURE_BYTES,
        }
    }
}

// ============================================================================
// SECTION: Loading
// ============================================================================

impl SignetConfig {
    /// Loads and validates configuration.
    ///
    /// Resolution order: explicit `path`, the `SIGNET_CONFIG` environment
    /// variable, then `signet.toml` in the working directory. An explicit or
    /// environment path must exist; a missing default file yields the default
    /// configuration.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] on read, size, parse, or validation failure.
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        let resolved: Option<PathBuf> = match path {
            Some(explicit) => Some(explicit.to_path_buf()),
            None => match env::var_os(CONFIG_ENV_VAR) {
                Some(from_env) => Some(PathBuf::from(from_env)),
                None => {
                    let fallback = PathBuf::from(DEFAULT_CONFIG_NAME);
                    fallback.exists().then_some(fallback)
                }
            },
        };
        let config = match resolved {
            Some(file) => Self::load_file(&file)?,
            None => Self::default(),
        };
        config.validate()?;
        Ok(config)
    }

    /// Loads configuration from one file.
    fn load_file(path: &Path) -> Result<Self, ConfigError> {
        let raw = fs::read(path)
            .map_err(|err| ConfigError::Read(format!("{}: {err}", path.display())))?;
        if raw.len() > MAX_CONFIG_FILE_SIZE {
            return Err(ConfigError::TooLarge);
        }
        let text = String::from_utf8(raw).map_err(|err| ConfigError::Parse(err.to_string()))?;
        toml::from_str(&text).map_err(|err| ConfigError::Parse(err.to_string()))
    }

    /// Validates the configuration, failing closed on any violation.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Invalid`] naming the offending setting.
    pub fn validate(&self) -> Result<(), ConfigError> {
        validate_bucket("storage.documents_bucket", &self.storage.documents_bucket)?;
        validate_bucket("storage.signatures_bucket", &self.storage.signatures_bucket)?;
        if self.storage.documents_bucket == self.storage.signatures_bucket {
            return Err(ConfigError::Invalid(
                "storage buckets must be distinct".to_string(),
            ));
        }
        let ttl = self.storage.download_url_ttl_seconds;
        if !(MIN_URL_TTL_SECONDS..=MAX_URL_TTL_SECONDS).contains(&ttl) {
            return Err(ConfigError::Invalid(format!(
                "storage.download_url_ttl_seconds must be between {MIN_URL_TTL_SECONDS} and {MAX_URL_TTL_SECONDS}"
            )));
        }
        validate_label("branding.product_name", &self.branding.product_name)?;
        validate_label("branding.legal_notice", &self.branding.legal_notice)?;
        validate_label("branding.not_provided_label", &self.branding.not_provided_label)?;
        validate_label("branding.tenant_display_name", &self.branding.tenant_display_name)?;
        if self.limits.max_document_bytes == 0
            || self.limits.max_document_bytes > MAX_MAX_DOCUMENT_BYTES
        {
            return Err(ConfigError::Invalid(format!(
                "limits.max_document_bytes must be between 1 and {MAX_MAX_DOCUMENT_BYTES}"
            )));
        }
        if self.limits.max_signature_bytes == 0
            || self.limits.max_signature_bytes > MAX_MAX_SIGNATURE_BYTES
        {
            return Err(ConfigError::Invalid(format!(
                "limits.max_signature_bytes must be between 1 and {MAX_MAX_SIGNATURE_BYTES}"
            )));
        }
        if self.address_lookup.timeout_ms == 0 {
            return Err(ConfigError::Invalid(
                "address_lookup.timeout_ms must be greater than zero".to_string(),
            ));
        }
        if self.address_lookup.max_response_bytes == 0 {
            return Err(ConfigError::Invalid(
                "address_lookup.max_response_bytes must be greater than zero".to_string(),
            ));
        }
        Ok(())
    }
}

/// Validates one bucket name.
fn validate_bucket(setting: &str, value: &str) -> Result<(), ConfigError> {
    if value.is_empty() || value.len() > MAX_LABEL_LENGTH || value.contains('/') {
        return Err(ConfigError::Invalid(format!("{setting} is not a valid bucket name")));
    }
    Ok(())
}

/// Validates one branding label.
fn validate_label(setting: &str, value: &str) -> Result<(), ConfigError> {
    if value.trim().is_empty() || value.len() > MAX_LABEL_LENGTH {
        return Err(ConfigError::Invalid(format!(
            "{setting} must be non-empty and at most {MAX_LABEL_LENGTH} bytes"
        )));
    }
    Ok(())
}
