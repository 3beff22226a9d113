// crates/signet-capture/src/lib.rs
// ============================================================================
// Module: Signet Capture Library
// Description: Public API surface for signature capture.
// Purpose: Expose the capture surface and its error type.
// Dependencies: crate::surface
// ============================================================================

//! ## Overview
//! Signature capture for the Signet pipeline: a stroke-based drawing surface
//! that exports the handwritten signature as a PNG raster. The crate is
//! host-agnostic; pointer events are forwarded by whatever shell embeds the
//! surface.

// ============================================================================
// SECTION: Modules
// ============================================================================

pub mod surface;

// ============================================================================
// SECTION: Re-Exports
// ============================================================================

pub use surface::CaptureError;
pub use surface::CaptureSurface;
pub use surface::PointerPoint;
