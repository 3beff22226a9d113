// crates/signet-compose/src/raster.rs
// ============================================================================
// Module: Signature Image Embedding
// Description: PNG decode and XObject stream construction for signatures.
// Purpose: Embed the captured raster with its alpha channel preserved.
// Dependencies: image, lopdf, signet-core
// ============================================================================

//! ## Overview
//! The captured signature arrives as PNG bytes with an alpha channel. PDF
//! image XObjects carry color and alpha separately, so the raster is split
//! into a DeviceRGB stream and a DeviceGray soft mask referenced through
//! `SMask`. Decode failure is fatal to the attempt; the compositor never
//! stamps a partially decoded image.

// ============================================================================
// SECTION: Imports
// ============================================================================

use lopdf::Document;
use lopdf::Stream;
use lopdf::dictionary;
use signet_core::ComposeError;

// ============================================================================
// SECTION: Embedded Signature
// ============================================================================

/// An embedded signature raster ready for placement.
#[derive(Debug, Clone, Copy)]
pub struct EmbeddedSignature {
    /// Object id of the RGB image XObject.
    pub image_id: lopdf::ObjectId,
    /// Source raster width in pixels.
    pub width_px: u32,
    /// Source raster height in pixels.
    pub height_px: u32,
}

/// Decodes the signature PNG and embeds it as an image XObject pair.
///
/// # Errors
///
/// Returns [`ComposeError::Signature`] when the bytes do not decode as an
/// image.
pub fn embed_signature(
    doc: &mut Document,
    signature_png: &[u8],
) -> Result<EmbeddedSignature, ComposeError> {
    let raster = image::load_from_memory(signature_png)
        .map_err(|err| ComposeError::Signature(err.to_string()))?
        .to_rgba8();
    let (width_px, height_px) = raster.dimensions();

    let mut rgb = Vec::with_capacity((width_px * height_px * 3) as usize);
    let mut alpha = Vec::with_capacity((width_px * height_px) as usize);
    for pixel in raster.pixels() {
        rgb.push(pixel[0]);
        rgb.push(pixel[1]);
        rgb.push(pixel[2]);
        alpha.push(pixel[3]);
    }

    let smask_id = doc.add_object(Stream::new(
        dictionary! {
            "Type" => "XObject",
            "Subtype" => "Image",
            "Width" => i64::from(width_px),
            "Height" => i64::from(height_px),
            "ColorSpace" => "DeviceGray",
            "BitsPerComponent" => 8,
        },
        alpha,
    ));
    let image_id = doc.add_object(Stream::new(
        dictionary! {
            "Type" => "XObject",
            "Subtype" => "Image",
            "Width" => i64::from(width_px),
            "Height" => i64::from(height_px),
            "ColorSpace" => "DeviceRGB",
            "BitsPerComponent" => 8,
            "SMask" => smask_id,
        },
        rgb,
    ));

    Ok(EmbeddedSignature {
        image_id,
        width_px,
        height_px,
    })
}
