// crates/signet-providers/tests/addr_lookup.rs
// ============================================================================
// Module: Address Lookup Tests
// Description: Tests for the bounded HTTP client address source.
// Purpose: Validate parsing, limits, and fail-closed behavior.
// Dependencies: signet-providers, signet-core, tiny_http
// ============================================================================
//! ## Overview
//! Runs a local HTTP stub and exercises
//! [`signet_providers::HttpClientAddressSource`]: JSON and bare-text bodies,
//! status failures, the response size cap, and the cleartext scheme policy.

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

use signet_core::ClientAddressSource;
use signet_providers::AddressLookupConfig;
use signet_providers::HttpClientAddressSource;
use tiny_http::Response;
use tiny_http::Server;

/// Serves one response body with the given status, returning the endpoint.
fn serve_once(status: u16, body: &'static str) -> String {
    let server = Server::http("127.0.0.1:0").unwrap();
    let endpoint = format!("http://{}", server.server_addr().to_ip().unwrap());
    thread::spawn(move || {
        if let Ok(request) = server.recv() {
            let response = Response::from_string(body).with_status_code(status);
            let _ = request.respond(response);
        }
    });
    endpoint
}

/// Builds a config for a local cleartext endpoint.
fn local_config(endpoint: String) -> AddressLookupConfig {
    AddressLookupConfig {
        endpoint,
        allow_http: true,
        ..AddressLookupConfig::default()
    }
}

/// Verifies a JSON body parses into the address.
#[test]
fn json_body_parses() {
    let endpoint = serve_once(200, r#"{"ip": "203.0.113.9"}"#);
    let source = HttpClientAddressSource::new(local_config(endpoint)).unwrap();
    assert_eq!(source.client_address().unwrap(), "203.0.113.9");
}

/// Verifies a bare-text body parses into the address.
#[test]
fn bare_text_body_parses() {
    let endpoint = serve_once(200, "203.0.113.9\n");
    let source = HttpClientAddressSource::new(local_config(endpoint)).unwrap();
    assert_eq!(source.client_address().unwrap(), "203.0.113.9");
}

/// Verifies non-success statuses fail the lookup.
#[test]
fn error_status_fails_lookup() {
    let endpoint = serve_once(503, "unavailable");
    let source = HttpClientAddressSource::new(local_config(endpoint)).unwrap();
    assert!(source.client_address().is_err());
}

/// Verifies bodies over the cap fail closed.
#[test]
fn oversized_body_fails_closed() {
    let endpoint = serve_once(200, "not an address but a very long body repeated");
    let mut config = local_config(endpoint);
    config.max_response_bytes = 8;
    let source = HttpClientAddressSource::new(config).unwrap();
    assert!(source.client_address().is_err());
}

/// Verifies cleartext endpoints are blocked unless opted in.
#[test]
fn cleartext_scheme_is_blocked_by_default() {
    let config = AddressLookupConfig {
        endpoint: "http://127.0.0.1:9/ip".to_string(),
        ..AddressLookupConfig::default()
    };
    assert!(HttpClientAddressSource::new(config).is_err());
}

/// Verifies garbage bodies are rejected rather than recorded.
#[test]
fn unparseable_body_is_rejected() {
    let endpoint = serve_once(200, "not an ip address");
    let source = HttpClientAddressSource::new(local_config(endpoint)).unwrap();
    assert!(source.client_address().is_err());
}
