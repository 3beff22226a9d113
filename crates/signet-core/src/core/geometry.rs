// crates/signet-core/src/core/geometry.rs
// ============================================================================
// Module: Signet Page Geometry
// Description: Coordinate transforms between authoring and rendering origins.
// Purpose: Centralize the top-left to bottom-left flip and fit-inside scaling.
// Dependencies: serde
// ============================================================================

//! ## Overview
//! Field mappings are authored against a top-left origin while the document
//! renderer uses a bottom-left origin. Every placement in the compositor goes
//! through the transforms in this module; inline flip arithmetic at call
//! sites is forbidden because it is the most bug-prone part of composition.

// ============================================================================
// SECTION: Imports
// ============================================================================

use serde::Deserialize;
use serde::Serialize;

// ============================================================================
// SECTION: Constants
// ============================================================================

/// Horizontal padding applied to text anchors, in points.
pub const TEXT_LEFT_PAD: f64 = 2.0;
/// Baseline drop applied to text anchors, in points.
pub const TEXT_BASELINE_OFFSET: f64 = 12.0;
/// Ratio of field height used as the text font size.
pub const TEXT_FONT_RATIO: f64 = 0.7;
/// Smallest font size rendered for text fields, in points.
pub const MIN_TEXT_FONT_SIZE: f64 = 6.0;
/// Largest font size rendered for text fields, in points.
pub const MAX_TEXT_FONT_SIZE: f64 = 18.0;

// ============================================================================
// SECTION: Page Size
// ============================================================================

/// Page dimensions in document points.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PageSize {
    /// Page width in points.
    pub width: f64,
    /// Page height in points.
    pub height: f64,
}

impl PageSize {
    /// Creates a page size.
    #[must_use]
    pub const fn new(width: f64, height: f64) -> Self {
        Self {
            width,
            height,
        }
    }
}

/// A bottom-left-origin point produced by the transforms below.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RenderPoint {
    /// Horizontal position in points from the left edge.
    pub x: f64,
    /// Vertical position in points from the bottom edge.
    pub y: f64,
}

// ============================================================================
// SECTION: Coordinate Transforms
// ============================================================================

/// Transforms a top-left-origin text anchor into render coordinates.
///
/// Applies [`TEXT_LEFT_PAD`] and drops the baseline by
/// [`TEXT_BASELINE_OFFSET`] so glyphs sit inside the authored box.
#[must_use]
pub fn text_anchor(page: PageSize, x: f64, y: f64) -> RenderPoint {
    RenderPoint {
        x: x + TEXT_LEFT_PAD,
        y: page.height - y - TEXT_BASELINE_OFFSET,
    }
}

/// Transforms a top-left-origin image box into render coordinates.
///
/// `height` is the placed image height; the returned point is the lower-left
/// corner of the box, clamped to the page bottom.
#[must_use]
pub fn image_anchor(page: PageSize, x: f64, y: f64, height: f64) -> RenderPoint {
    RenderPoint {
        x,
        y: (page.height - y - height).max(0.0),
    }
}

/// Returns the font size for a text field of the given height.
#[must_use]
pub fn font_size_for_height(height: f64) -> f64 {
    (height * TEXT_FONT_RATIO).clamp(MIN_TEXT_FONT_SIZE, MAX_TEXT_FONT_SIZE)
}

// ============================================================================
// SECTION: Fit-Inside Scaling
// ============================================================================

/// Returns the largest size that fits inside the bounds while preserving the
/// source aspect ratio.
///
/// Degenerate inputs (non-positive source or bounds) collapse to the bounds
/// themselves so callers never divide by zero.
#[must_use]
pub fn fit_inside(source_w: f64, source_h: f64, bounds_w: f64, bounds_h: f64) -> (f64, f64) {
    if source_w <= 0.0 || source_h <= 0.0 || bounds_w <= 0.0 || bounds_h <= 0.0 {
        return (bounds_w.max(0.0), bounds_h.max(0.0));
    }
    let scale = (bounds_w / source_w).min(bounds_h / source_h);
    (source_w * scale, source_h * scale)
}
