// crates/signet-core/src/core/fields.rs
// ============================================================================
// Module: Signet Field Mappings
// Description: Template field layout, signer profiles, and missing-field math.
// Purpose: Decide which data must be collected before signing may proceed.
// Dependencies: crate::core::identifiers, serde
// ============================================================================

//! ## Overview
//! A [`FieldMapping`] tells the compositor where on the document a profile
//! value or the signature image must be rendered. The missing-field
//! computation drives the `NeedsData`/`Ready` split of the signing session:
//! signature fields and reserved system keys are always considered satisfied
//! because the pipeline supplies them itself.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::collections::BTreeMap;

use serde::Deserialize;
use serde::Serialize;

use crate::core::identifiers::FieldKey;

// ============================================================================
// SECTION: Reserved Keys
// ============================================================================

/// Field keys the pipeline satisfies itself; never collected from signers.
///
/// The date keys resolve from the completion timestamp at composition time,
/// and `signature` is filled by the capture surface.
pub const RESERVED_FIELD_KEYS: [&str; 5] =
    ["today_date", "today_day", "today_month", "today_year", "signature"];

/// Returns true when `key` names a reserved system field.
#[must_use]
pub fn is_reserved_key(key: &FieldKey) -> bool {
    RESERVED_FIELD_KEYS.contains(&key.as_str())
}

/// Default trigger value for checkbox fields without an explicit one.
pub const DEFAULT_CHECKBOX_TRIGGER: &str = "true";

// ============================================================================
// SECTION: Field Mappings
// ============================================================================

/// Kind of rendering a field mapping requests.
///
/// # Invariants
/// - Variants are stable for serialization and store round-trips.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FieldKind {
    /// Plain text drawn at the field anchor.
    Text,
    /// Check mark drawn when the profile value matches the trigger.
    Checkbox,
    /// Signature image stamped into the field box.
    Signature,
}

/// Template-authored instruction for rendering one field.
///
/// # Invariants
/// - `page` is 1-based; a page beyond the rendered document is skipped at
///   composition time rather than failing the attempt.
/// - `x`/`y` are top-left-origin document points; rendering flips to the
///   bottom-left origin via the geometry module.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FieldMapping {
    /// Key into the signer profile.
    pub key: FieldKey,
    /// Rendering kind.
    pub kind: FieldKind,
    /// 1-based page number.
    pub page: u32,
    /// Horizontal position in points from the left edge.
    pub x: f64,
    /// Vertical position in points from the top edge.
    pub y: f64,
    /// Field width in points.
    pub width: f64,
    /// Field height in points.
    pub height: f64,
    /// Checkbox trigger value; [`DEFAULT_CHECKBOX_TRIGGER`] when absent.
    pub trigger_value: Option<String>,
}

impl FieldMapping {
    /// Returns true when the profile value activates this checkbox.
    ///
    /// Comparison is Unicode case-insensitive so localized trigger values
    /// such as `"Sí"` match `"sí"`.
    #[must_use]
    pub fn trigger_matches(&self, value: &str) -> bool {
        let trigger = self.trigger_value.as_deref().unwrap_or(DEFAULT_CHECKBOX_TRIGGER);
        value.to_lowercase() == trigger.to_lowercase()
    }
}

// ============================================================================
// SECTION: Signer Profile
// ============================================================================

/// The signer's resolved data used to fill fields.
///
/// Values are nullable; a field is usable only when its trimmed value is
/// non-empty.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SignerProfile {
    /// Mapping from field key to optional value.
    values: BTreeMap<FieldKey, Option<String>>,
}

impl SignerProfile {
    /// Creates an empty profile.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the raw value for `key`, when present and non-null.
    #[must_use]
    pub fn get(&self, key: &FieldKey) -> Option<&str> {
        self.values.get(key).and_then(|value| value.as_deref())
    }

    /// Returns the trimmed value for `key` when it is usable.
    #[must_use]
    pub fn usable_value(&self, key: &FieldKey) -> Option<&str> {
        self.get(key).map(str::trim).filter(|value| !value.is_empty())
    }

    /// Sets the value for `key`.
    pub fn set(&mut self, key: FieldKey, value: Option<String>) {
        self.values.insert(key, value);
    }

    /// Merges `updates` into the profile; only provided keys change.
    pub fn apply(&mut self, updates: &ProfileUpdate) {
        for (key, value) in &updates.values {
            self.values.insert(key.clone(), value.clone());
        }
    }

    /// Returns an iterator over all keys with a usable value.
    pub fn usable_keys(&self) -> impl Iterator<Item = &FieldKey> {
        self.values.keys().filter(|key| self.usable_value(key).is_some())
    }
}

/// Partial profile update submitted by the corrections flow.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ProfileUpdate {
    /// Keys to merge; absent keys are left untouched.
    pub values: BTreeMap<FieldKey, Option<String>>,
}

impl ProfileUpdate {
    /// Creates an empty update.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds one key to the update.
    #[must_use]
    pub fn with(mut self, key: impl Into<FieldKey>, value: impl Into<String>) -> Self {
        self.values.insert(key.into(), Some(value.into()));
        self
    }
}

// ============================================================================
// SECTION: Missing-Field Computation
// ============================================================================

/// Returns the mappings whose data must still be collected from the signer.
///
/// Signature fields and reserved system keys are excluded by construction; a
/// remaining field is missing when its trimmed profile value is absent or
/// empty. Duplicate keys are reported once.
#[must_use]
pub fn missing_fields<'a>(
    mappings: &'a [FieldMapping],
    profile: &SignerProfile,
) -> Vec<&'a FieldMapping> {
    let mut seen: Vec<&FieldKey> = Vec::new();
    mappings
        .iter()
        .filter(|mapping| mapping.kind != FieldKind::Signature)
        .filter(|mapping| !is_reserved_key(&mapping.key))
        .filter(|mapping| profile.usable_value(&mapping.key).is_none())
        .filter(|mapping| {
            if seen.contains(&&mapping.key) {
                false
            } else {
                seen.push(&mapping.key);
                true
            }
        })
        .collect()
}
