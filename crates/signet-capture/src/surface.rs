// crates/signet-capture/src/surface.rs
// ============================================================================
// Module: Signature Capture Surface
// Description: Pointer-driven stroke model with raster PNG export.
// Purpose: Acquire one freehand signature as an image for the compositor.
// Dependencies: image, thiserror
// ============================================================================

//! ## Overview
//! The capture surface is a pure input/render device: it records pointer
//! strokes, tracks whether any ink exists, and rasterizes the result to PNG
//! on demand. It performs no network or persistence side effects. Hosts size
//! the surface to its container with [`CaptureSurface::resize`] and gate
//! their confirm action on [`CaptureSurface::has_content`]; gesture
//! suppression and scroll locking belong to the host shell, not here.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::io::Cursor;

use image::ImageFormat;
use image::Rgba;
use image::RgbaImage;
use thiserror::Error;

// ============================================================================
// SECTION: Constants
// ============================================================================

/// Ink stroke radius in pixels.
const STROKE_RADIUS: f32 = 1.6;
/// Sampling step along a segment, in pixels.
const SEGMENT_STEP: f32 = 0.5;
/// Ink color (near-black blue, matching pen ink).
const INK: Rgba<u8> = Rgba([16, 24, 48, 255]);
/// Guide baseline color.
const GUIDE: Rgba<u8> = Rgba([200, 200, 200, 255]);
/// Background color.
const BACKGROUND: Rgba<u8> = Rgba([255, 255, 255, 255]);
/// Horizontal inset of the guide baseline, as a fraction of the width.
const GUIDE_INSET_RATIO: f32 = 0.08;
/// Vertical position of the guide baseline, as a fraction of the height.
const GUIDE_HEIGHT_RATIO: f32 = 0.75;

// ============================================================================
// SECTION: Errors
// ============================================================================

/// Capture surface errors.
#[derive(Debug, Error)]
pub enum CaptureError {
    /// The surface was never sized; callers must resize before exporting.
    #[error("capture surface has no dimensions")]
    Unsized,
    /// PNG encoding failed.
    #[error("signature encode failed: {0}")]
    Encode(String),
}

// ============================================================================
// SECTION: Points
// ============================================================================

/// One pointer position in surface pixels, top-left origin.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PointerPoint {
    /// Horizontal position in pixels.
    pub x: f32,
    /// Vertical position in pixels.
    pub y: f32,
}

impl PointerPoint {
    /// Creates a pointer point.
    #[must_use]
    pub const fn new(x: f32, y: f32) -> Self {
        Self {
            x,
            y,
        }
    }
}

// ============================================================================
// SECTION: Capture Surface
// ============================================================================

/// Freehand signature capture surface.
///
/// # Invariants
/// - `extend`/`end` without an active stroke are no-ops, never errors.
/// - `has_content` becomes true on the first successful `extend` and is only
///   reset by `clear`.
/// - Strokes survive `resize`; points outside the surface are clamped at
///   render time.
#[derive(Debug, Default, Clone)]
pub struct CaptureSurface {
    /// Surface dimensions in pixels, when sized.
    size: Option<(u32, u32)>,
    /// Completed strokes.
    strokes: Vec<Vec<PointerPoint>>,
    /// Stroke currently being drawn.
    active: Option<Vec<PointerPoint>>,
    /// True once any segment has been drawn.
    has_content: bool,
}

impl CaptureSurface {
    /// Creates an unsized, blank surface.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sizes the surface to its container.
    ///
    /// Called on mount and again whenever the container resizes. Existing
    /// strokes are preserved and re-rendered against the new dimensions.
    pub fn resize(&mut self, width: u32, height: u32) {
        self.size = Some((width, height));
    }

    /// Returns the current dimensions, when sized.
    #[must_use]
    pub const fn size(&self) -> Option<(u32, u32)> {
        self.size
    }

    /// Returns true once any ink has been drawn.
    #[must_use]
    pub const fn has_content(&self) -> bool {
        self.has_content
    }

    /// Begins a new stroke at `point`.
    ///
    /// An unterminated previous stroke is closed first, matching pointer
    /// streams that lose their release event.
    pub fn start(&mut self, point: PointerPoint) {
        if let Some(stroke) = self.active.take() {
            self.strokes.push(stroke);
        }
        self.active = Some(vec![point]);
    }

    /// Appends a segment from the last recorded point to `point`.
    ///
    /// No-op while no stroke is active.
    pub fn extend(&mut self, point: PointerPoint) {
        if let Some(stroke) = self.active.as_mut() {
            stroke.push(point);
            self.has_content = true;
        }
    }

    /// Closes the active stroke.
    ///
    /// No-op while no stroke is active.
    pub fn end(&mut self) {
        if let Some(stroke) = self.active.take() {
            self.strokes.push(stroke);
        }
    }

    /// Resets the surface to blank and drops the has-content flag.
    ///
    /// The static guide decoration is repainted on the next render.
    pub fn clear(&mut self) {
        self.strokes.clear();
        self.active = None;
        self.has_content = false;
    }

    /// Renders the surface and returns PNG bytes.
    ///
    /// Callers gate this behind [`Self::has_content`]; the only failure mode
    /// a host can reach is exporting a surface that was never sized.
    ///
    /// # Errors
    ///
    /// Returns [`CaptureError::Unsized`] when the surface has no dimensions
    /// and [`CaptureError::Encode`] when PNG encoding fails.
    pub fn export(&self) -> Result<Vec<u8>, CaptureError> {
        let (width, height) = match self.size {
            Some((width, height)) if width > 0 && height > 0 => (width, height),
            _ => return Err(CaptureError::Unsized),
        };

        let mut canvas = RgbaImage::from_pixel(width, height, BACKGROUND);
        draw_guide(&mut canvas);
        for stroke in self.strokes.iter().chain(self.active.as_ref()) {
            draw_stroke(&mut canvas, stroke);
        }

        let mut out = Vec::new();
        image::DynamicImage::ImageRgba8(canvas)
            .write_to(&mut Cursor::new(&mut out), ImageFormat::Png)
            .map_err(|err| CaptureError::Encode(err.to_string()))?;
        Ok(out)
    }
}

// ============================================================================
// SECTION: Rasterization
// ============================================================================

/// Paints the static guide baseline.
fn draw_guide(canvas: &mut RgbaImage) {
    let (width, height) = canvas.dimensions();
    let inset = ratio_of(width, GUIDE_INSET_RATIO);
    let row = ratio_of(height, GUIDE_HEIGHT_RATIO).min(height.saturating_sub(1));
    for x in inset..width.saturating_sub(inset) {
        canvas.put_pixel(x, row, GUIDE);
    }
}

/// Converts a dimension fraction to a pixel offset.
#[allow(clippy::cast_possible_truncation, reason = "value is bounds-checked")]
#[allow(clippy::cast_sign_loss, reason = "value is non-negative")]
fn ratio_of(extent: u32, ratio: f32) -> u32 {
    let scaled = (f64::from(extent) * f64::from(ratio)).floor();
    if scaled <= 0.0 {
        0
    } else if scaled >= f64::from(u32::MAX) {
        u32::MAX
    } else {
        scaled as u32
    }
}

/// Rasterizes one stroke as round-capped segments.
fn draw_stroke(canvas: &mut RgbaImage, stroke: &[PointerPoint]) {
    match stroke {
        [] => {}
        [point] => stamp(canvas, *point),
        _ => {
            for pair in stroke.windows(2) {
                draw_segment(canvas, pair[0], pair[1]);
            }
        }
    }
}

/// Rasterizes one segment by stamping discs along its length.
fn draw_segment(canvas: &mut RgbaImage, from: PointerPoint, to: PointerPoint) {
    let dx = to.x - from.x;
    let dy = to.y - from.y;
    let length = dx.hypot(dy);
    let steps = (length / SEGMENT_STEP).ceil().max(1.0);
    let mut step = 0.0;
    while step <= steps {
        let t = step / steps;
        stamp(canvas, PointerPoint::new(from.x + dx * t, from.y + dy * t));
        step += 1.0;
    }
}

/// Stamps one ink disc, clamping to the canvas bounds.
fn stamp(canvas: &mut RgbaImage, center: PointerPoint) {
    let (width, height) = canvas.dimensions();
    let radius = STROKE_RADIUS;
    let min_x = (center.x - radius).floor().max(0.0);
    let min_y = (center.y - radius).floor().max(0.0);
    let max_x = (center.x + radius).ceil().min(f32::from(u16::MAX)).max(0.0);
    let max_y = (center.y + radius).ceil().min(f32::from(u16::MAX)).max(0.0);

    let mut y = min_y;
    while y <= max_y {
        let mut x = min_x;
        while x <= max_x {
            let dist_x = x - center.x;
            let dist_y = y - center.y;
            if dist_x.mul_add(dist_x, dist_y * dist_y) <= radius * radius {
                let px = clamp_to_u32(x, width);
                let py = clamp_to_u32(y, height);
                if px < width && py < height {
                    canvas.put_pixel(px, py, INK);
                }
            }
            x += 1.0;
        }
        y += 1.0;
    }
}

/// Converts a non-negative coordinate to a pixel index below `extent`.
#[allow(clippy::cast_possible_truncation, reason = "value is bounds-checked")]
#[allow(clippy::cast_sign_loss, reason = "value is non-negative")]
fn clamp_to_u32(value: f32, extent: u32) -> u32 {
    if value <= 0.0 {
        0
    } else if f64::from(value) >= f64::from(extent) {
        extent
    } else {
        value as u32
    }
}
