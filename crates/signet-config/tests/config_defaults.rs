// crates/signet-config/tests/config_defaults.rs
// ============================================================================
// Module: Config Default Tests
// Description: Tests for default configuration values and validation.
// Purpose: Ensure defaults are valid and violations fail closed.
// Dependencies: signet-config
// ============================================================================
//! ## Overview
//! The default configuration must validate as-is; every bound must reject
//! out-of-range values with a setting-specific message.

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

use signet_config::ConfigError;
use signet_config::SignetConfig;

/// Verifies the default configuration validates.
#[test]
fn defaults_are_valid() {
    let config = SignetConfig::default();
    config.validate().unwrap();
    assert_eq!(config.storage.documents_bucket, "documents");
    assert_eq!(config.storage.signatures_bucket, "signatures");
    assert_eq!(config.branding.not_provided_label, "Not provided");
}

/// Verifies identical buckets are rejected.
#[test]
fn identical_buckets_are_rejected() {
    let mut config = SignetConfig::default();
    config.storage.signatures_bucket = config.storage.documents_bucket.clone();
    assert!(matches!(config.validate(), Err(ConfigError::Invalid(_))));
}

/// Verifies the URL lifetime bounds are enforced.
#[test]
fn url_ttl_bounds_are_enforced() {
    let mut config = SignetConfig::default();
    config.storage.download_url_ttl_seconds = 1;
    assert!(config.validate().is_err());

    config.storage.download_url_ttl_seconds = 7 * 24 * 60 * 60;
    assert!(config.validate().is_err());
}

/// Verifies size limits reject zero and excessive values.
#[test]
fn size_limits_are_bounded() {
    let mut config = SignetConfig::default();
    config.limits.max_document_bytes = 0;
    assert!(config.validate().is_err());

    let mut config = SignetConfig::default();
    config.limits.max_signature_bytes = usize::MAX;
    assert!(config.validate().is_err());
}

/// Verifies empty branding labels are rejected.
#[test]
fn empty_labels_are_rejected() {
    let mut config = SignetConfig::default();
    config.branding.product_name = "   ".to_string();
    assert!(matches!(config.validate(), Err(ConfigError::Invalid(_))));
}
