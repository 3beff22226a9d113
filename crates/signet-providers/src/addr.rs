// crates/signet-providers/src/addr.rs
// ============================================================================
// Module: HTTP Client Address Source
// Description: Best-effort public-address lookup over a bounded HTTPS GET.
// Purpose: Supply the audit record's network address without ever failing a
//          signing attempt.
// Dependencies: signet-core, reqwest, serde_json, url
// ============================================================================

//! ## Overview
//! The address source issues one bounded GET against a lookup endpoint and
//! returns the reported address. It enforces scheme restrictions, disables
//! redirects, and caps response size. Every failure maps to
//! [`AddressError`]; the session runtime substitutes the unknown-address
//! placeholder, so nothing here is fatal to signing.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::io::Read;
use std::time::Duration;

use reqwest::blocking::Client;
use reqwest::redirect::Policy;
use serde::Deserialize;
use signet_core::AddressError;
use signet_core::ClientAddressSource;
use url::Url;

// ============================================================================
// SECTION: Configuration
// ============================================================================

/// Configuration for the HTTP address source.
///
/// # Invariants
/// - `allow_http = false` blocks cleartext `http://` endpoints.
/// - `max_response_bytes` is enforced as a hard upper bound on bodies.
/// - Redirects are never followed.
/// - `timeout_ms` applies to the full request lifecycle.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct AddressLookupConfig {
    /// Lookup endpoint returning the caller's public address.
    pub endpoint: String,
    /// Allow cleartext HTTP (disabled by default).
    pub allow_http: bool,
    /// Request timeout in milliseconds.
    pub timeout_ms: u64,
    /// Maximum response size allowed, in bytes.
    pub max_response_bytes: usize,
    /// User agent string for outbound requests.
    pub user_agent: String,
}

impl Default for AddressLookupConfig {
    fn default() -> Self {
        Self {
            endpoint: "https://api.ipify.org?format=json".to_string(),
            allow_http: false,
            timeout_ms: 3_000,
            max_response_bytes: 4 * 1024,
            user_agent: "signet/0.1".to_string(),
        }
    }
}

// ============================================================================
// SECTION: Address Source
// ============================================================================

/// Response body shape of JSON lookup endpoints.
#[derive(Debug, Deserialize)]
struct AddressBody {
    /// Reported public address.
    ip: String,
}

/// Best-effort HTTP implementation of [`ClientAddressSource`].
#[derive(Debug)]
pub struct HttpClientAddressSource {
    /// Source configuration, including limits and policy.
    config: AddressLookupConfig,
    /// HTTP client used for outbound requests.
    client: Client,
}

impl HttpClientAddressSource {
    /// Creates a new address source with the given configuration.
    ///
    /// # Errors
    ///
    /// Returns [`AddressError`] when the endpoint is invalid or the HTTP
    /// client cannot be created.
    pub fn new(config: AddressLookupConfig) -> Result<Self, AddressError> {
        let url = Url::parse(&config.endpoint)
            .map_err(|err| AddressError::Lookup(format!("invalid endpoint: {err}")))?;
        match url.scheme() {
            "https" => {}
            "http" if config.allow_http => {}
            other => {
                return Err(AddressError::Lookup(format!("blocked scheme: {other}")));
            }
        }
        let client = Client::builder()
            .redirect(Policy::none())
            .timeout(Duration::from_millis(config.timeout_ms))
            .user_agent(config.user_agent.clone())
            .build()
            .map_err(|err| AddressError::Lookup(err.to_string()))?;
        Ok(Self {
            config,
            client,
        })
    }
}

impl ClientAddressSource for HttpClientAddressSource {
    fn client_address(&self) -> Result<String, AddressError> {
        let response = self
            .client
            .get(&self.config.endpoint)
            .send()
            .map_err(|err| AddressError::Lookup(err.to_string()))?;
        if !response.status().is_success() {
            return Err(AddressError::Lookup(format!(
                "lookup returned status {}",
                response.status().as_u16()
            )));
        }

        let mut body = Vec::new();
        let limit = self.config.max_response_bytes as u64;
        response
            .take(limit.saturating_add(1))
            .read_to_end(&mut body)
            .map_err(|err| AddressError::Lookup(err.to_string()))?;
        if body.len() > self.config.max_response_bytes {
            return Err(AddressError::Lookup("response exceeds size limit".to_string()));
        }

        parse_address(&body)
    }
}

/// Parses a lookup body as JSON `{"ip": ...}` or a bare address line.
fn parse_address(body: &[u8]) -> Result<String, AddressError> {
    if let Ok(parsed) = serde_json::from_slice::<AddressBody>(body) {
        let trimmed = parsed.ip.trim();
        if !trimmed.is_empty() {
            return Ok(trimmed.to_string());
        }
    }
    let text = std::str::from_utf8(body)
        .map_err(|err| AddressError::Lookup(err.to_string()))?
        .trim();
    if text.is_empty() || text.len() > 64 || text.chars().any(char::is_whitespace) {
        return Err(AddressError::Lookup("unparseable lookup response".to_string()));
    }
    Ok(text.to_string())
}
