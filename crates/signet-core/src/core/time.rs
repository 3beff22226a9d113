// crates/signet-core/src/core/time.rs
// ============================================================================
// Module: Signet Time Model
// Description: Canonical timestamp representation for requests and audit logs.
// Purpose: Provide explicit, replayable time values across Signet records.
// Dependencies: serde
// ============================================================================

//! ## Overview
//! Signet embeds explicit time values in requests and audit records to keep
//! expiry checks and completion timestamps replayable. The core never reads
//! wall-clock time directly; hosts supply `now` at every boundary that needs
//! it (session load, completion).

// ============================================================================
// SECTION: Imports
// ============================================================================

use serde::Deserialize;
use serde::Serialize;

// ============================================================================
// SECTION: Time Values
// ============================================================================

/// Canonical timestamp used in Signet records, in unix epoch milliseconds.
///
/// # Invariants
/// - Values are explicitly provided by callers; the core never reads
///   wall-clock time.
/// - No validation is performed; monotonicity is a caller responsibility.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, Default,
)]
#[serde(transparent)]
pub struct Timestamp(i64);

impl Timestamp {
    /// Creates a timestamp from unix epoch milliseconds.
    #[must_use]
    pub const fn from_unix_millis(millis: i64) -> Self {
        Self(millis)
    }

    /// Returns the timestamp as unix epoch milliseconds.
    #[must_use]
    pub const fn as_unix_millis(&self) -> i64 {
        self.0
    }

    /// Returns the timestamp as whole unix epoch seconds.
    #[must_use]
    pub const fn as_unix_seconds(&self) -> i64 {
        self.0.div_euclid(1_000)
    }

    /// Returns true when this timestamp is strictly before `other`.
    #[must_use]
    pub const fn is_before(&self, other: Self) -> bool {
        self.0 < other.0
    }
}
