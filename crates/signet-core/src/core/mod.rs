// crates/signet-core/src/core/mod.rs
// ============================================================================
// Module: Signet Core Model
// Description: Data model shared by every stage of the signing pipeline.
// Purpose: Group identifiers, time, requests, fields, audit, and geometry.
// Dependencies: crate::core submodules
// ============================================================================

//! ## Overview
//! The core model is pure data: no I/O, no clocks, no backend detail. Stage
//! implementations (capture, composition, stores) depend on these types and
//! on the interfaces module, never on each other.

// ============================================================================
// SECTION: Modules
// ============================================================================

pub mod audit;
pub mod fields;
pub mod geometry;
pub mod hashing;
pub mod identifiers;
pub mod request;
pub mod time;

// ============================================================================
// SECTION: Re-Exports
// ============================================================================

pub use audit::AUDIT_HASH_PREFIX_LEN;
pub use audit::AUDIT_USER_AGENT_MAX_LEN;
pub use audit::AuditRecord;
pub use audit::DISPOSITION_SIGNED;
pub use audit::UNKNOWN_CLIENT_ADDRESS;
pub use fields::DEFAULT_CHECKBOX_TRIGGER;
pub use fields::FieldKind;
pub use fields::FieldMapping;
pub use fields::ProfileUpdate;
pub use fields::RESERVED_FIELD_KEYS;
pub use fields::SignerProfile;
pub use fields::is_reserved_key;
pub use fields::missing_fields;
pub use geometry::PageSize;
pub use geometry::RenderPoint;
pub use geometry::fit_inside;
pub use geometry::font_size_for_height;
pub use geometry::image_anchor;
pub use geometry::text_anchor;
pub use hashing::DEFAULT_HASH_ALGORITHM;
pub use hashing::HashAlgorithm;
pub use hashing::HashDigest;
pub use hashing::HashError;
pub use identifiers::FieldKey;
pub use identifiers::RequestId;
pub use identifiers::RequestToken;
pub use identifiers::TemplateId;
pub use identifiers::TenantId;
pub use request::CompletionOutcome;
pub use request::CompletionRecord;
pub use request::RequestStatus;
pub use request::SignatureRequest;
pub use request::SignerIdentity;
pub use request::TenantBranding;
pub use time::Timestamp;
