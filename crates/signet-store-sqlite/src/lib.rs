// crates/signet-store-sqlite/src/lib.rs
// ============================================================================
// Module: Signet SQLite Store Library
// Description: Public API surface for the durable request store.
// Purpose: Expose the SQLite-backed RequestStore and its configuration.
// Dependencies: crate::store
// ============================================================================

//! ## Overview
//! Durable persistence for signing links. The store is token-scoped by
//! construction and enforces the completion compare-and-set inside a single
//! `SQLite` transaction, making the `Pending → Signed` transition atomic
//! under concurrent attempts.

// ============================================================================
// SECTION: Modules
// ============================================================================

pub mod store;

// ============================================================================
// SECTION: Re-Exports
// ============================================================================

pub use store::SqliteRequestStore;
pub use store::SqliteStoreConfig;
pub use store::SqliteStoreError;
pub use store::SqliteStoreMode;
pub use store::SqliteSyncMode;
