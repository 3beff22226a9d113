// crates/signet-core/tests/fields.rs
// ============================================================================
// Module: Field Mapping Tests
// Description: Tests for missing-field computation and checkbox triggers.
// Purpose: Validate the data gate that blocks signing on incomplete profiles.
// Dependencies: signet-core
// ============================================================================
//! ## Overview
//! Ensures reserved system keys and signature fields never count as missing,
//! trimming rules hold, and checkbox trigger matching is case-insensitive
//! for localized values.

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
use signet_core::SignerProfile;
use signet_core::is_reserved_key;
use signet_core::missing_fields;

/// Builds a text mapping for `key`.
fn text_field(key: &str) -> FieldMapping {
    FieldMapping {
        key: FieldKey::new(key),
        kind: FieldKind::Text,
        page: 1,
        x: 50.0,
        y: 100.0,
        width: 180.0,
        height: 16.0,
        trigger_value: None,
    }
}

/// Builds a signature mapping.
fn signature_field() -> FieldMapping {
    FieldMapping {
        key: FieldKey::new("signature"),
        kind: FieldKind::Signature,
        page: 1,
        x: 60.0,
        y: 600.0,
        width: 180.0,
        height: 60.0,
        trigger_value: None,
    }
}

/// Verifies signature fields and reserved keys are excluded by construction.
#[test]
fn missing_fields_excludes_reserved_and_signature() {
    let mappings = vec![
        text_field("full_name"),
        text_field("today_date"),
        text_field("today_day"),
        text_field("today_month"),
        text_field("today_year"),
        signature_field(),
    ];
    let profile = SignerProfile::new();

    let missing = missing_fields(&mappings, &profile);
    let keys: Vec<&str> = missing.iter().map(|mapping| mapping.key.as_str()).collect();
    assert_eq!(keys, vec!["full_name"]);
}

/// Verifies whitespace-only values still count as missing.
#[test]
fn missing_fields_trims_values() {
    let mappings = vec![text_field("full_name"), text_field("city")];
    let mut profile = SignerProfile::new();
    profile.set(FieldKey::new("full_name"), Some("   ".to_string()));
    profile.set(FieldKey::new("city"), Some("Valencia".to_string()));

    let missing = missing_fields(&mappings, &profile);
    assert_eq!(missing.len(), 1);
    assert_eq!(missing[0].key.as_str(), "full_name");
}

/// Verifies a complete profile yields an empty missing set.
#[test]
fn missing_fields_empty_when_complete() {
    let mappings = vec![text_field("full_name"), signature_field()];
    let mut profile = SignerProfile::new();
    profile.set(FieldKey::new("full_name"), Some("Ana Torres".to_string()));

    assert!(missing_fields(&mappings, &profile).is_empty());
}

/// Verifies duplicate keys are reported once.
#[test]
fn missing_fields_dedupes_keys() {
    let mappings = vec![text_field("full_name"), text_field("full_name")];
    let profile = SignerProfile::new();

    assert_eq!(missing_fields(&mappings, &profile).len(), 1);
}

/// Verifies the reserved key predicate covers the full set.
#[test]
fn reserved_keys_are_recognized() {
    for key in ["today_date", "today_day", "today_month", "today_year", "signature"] {
        assert!(is_reserved_key(&FieldKey::new(key)), "expected {key} to be reserved");
    }
    assert!(!is_reserved_key(&FieldKey::new("full_name")));
}

/// Verifies localized trigger values match case-insensitively.
#[test]
fn checkbox_trigger_matches_localized_case() {
    let mapping = FieldMapping {
        key: FieldKey::new("accepts_terms"),
        kind: FieldKind::Checkbox,
        page: 1,
        x: 40.0,
        y: 200.0,
        width: 14.0,
        height: 14.0,
        trigger_value: Some("Sí".to_string()),
    };

    assert!(mapping.trigger_matches("sí"));
    assert!(mapping.trigger_matches("SÍ"));
    assert!(!mapping.trigger_matches("No"));
}

/// Verifies the default trigger value is `true`.
#[test]
fn checkbox_trigger_defaults_to_true() {
    let mapping = FieldMapping {
        key: FieldKey::new("accepts_terms"),
        kind: FieldKind::Checkbox,
        page: 1,
        x: 40.0,
        y: 200.0,
        width: 14.0,
        height: 14.0,
        trigger_value: None,
    };

    assert!(mapping.trigger_matches("TRUE"));
    assert!(mapping.trigger_matches("true"));
    assert!(!mapping.trigger_matches("false"));
}

/// Verifies partial updates only change provided keys.
#[test]
fn profile_apply_merges_partially() {
    let mut profile = SignerProfile::new();
    profile.set(FieldKey::new("full_name"), Some("Ana Torres".to_string()));
    profile.set(FieldKey::new("city"), Some("Valencia".to_string()));

    let update = signet_core::ProfileUpdate::new().with("city", "Madrid");
    profile.apply(&update);

    assert_eq!(profile.get(&FieldKey::new("full_name")), Some("Ana Torres"));
    assert_eq!(profile.get(&FieldKey::new("city")), Some("Madrid"));
}
