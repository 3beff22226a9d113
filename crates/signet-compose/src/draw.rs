// crates/signet-compose/src/draw.rs
// ============================================================================
// Module: Content Drawing Helpers
// Description: Operation builders for text, check marks, rules, and images.
// Purpose: Produce lopdf content operations from render-space coordinates.
// Dependencies: lopdf, signet-core
// ============================================================================

//! ## Overview
//! Builders for the small set of content-stream operations the compositor
//! emits. Text is encoded as WinAnsi so Latin-script values like `"Sí"`
//! render correctly with the standard fonts; unmapped characters degrade to
//! `?` rather than corrupting the stream.

// ============================================================================
// SECTION: Imports
// ============================================================================

use lopdf::Object;
use lopdf::StringFormat;
use lopdf::content::Operation;
use signet_core::RenderPoint;

// ============================================================================
// SECTION: Numeric Conversion
// ============================================================================

/// Converts a render-space coordinate to a PDF real operand.
///
/// PDF reals are single precision; coordinates are page-bounded.
#[must_use]
#[allow(clippy::cast_possible_truncation, reason = "page coordinates fit f32")]
pub fn real(value: f64) -> Object {
    Object::Real(value as f32)
}

// ============================================================================
// SECTION: Text
// ============================================================================

/// Encodes text as WinAnsi bytes, degrading unmapped characters to `?`.
#[must_use]
pub fn encode_win_ansi(text: &str) -> Vec<u8> {
    text.chars().map(win_ansi_byte).collect()
}

/// Maps one character to its WinAnsi code point.
#[allow(clippy::cast_possible_truncation, reason = "matched ranges fit one byte")]
fn win_ansi_byte(ch: char) -> u8 {
    match ch {
        '\u{0000}'..='\u{007e}' => ch as u32 as u8,
        '\u{00a0}'..='\u{00ff}' => ch as u32 as u8,
        '\u{20ac}' => 0x80,
        '\u{2018}' => 0x91,
        '\u{2019}' => 0x92,
        '\u{201c}' => 0x93,
        '\u{201d}' => 0x94,
        '\u{2022}' => 0x95,
        '\u{2013}' => 0x96,
        '\u{2014}' => 0x97,
        '\u{2026}' => 0x85,
        _ => b'?',
    }
}

/// Builds the operations for one line of text at a render anchor.
#[must_use]
pub fn text_ops(font: &str, size: f64, at: RenderPoint, text: &str) -> Vec<Operation> {
    vec![
        Operation::new("BT", vec![]),
        Operation::new("Tf", vec![font.into(), real(size)]),
        Operation::new("Td", vec![real(at.x), real(at.y)]),
        Operation::new(
            "Tj",
            vec![Object::String(encode_win_ansi(text), StringFormat::Literal)],
        ),
        Operation::new("ET", vec![]),
    ]
}

/// Builds gray-scale text operations (used by certificate labels).
#[must_use]
pub fn gray_text_ops(
    font: &str,
    size: f64,
    gray: f64,
    at: RenderPoint,
    text: &str,
) -> Vec<Operation> {
    let mut ops = vec![Operation::new("q", vec![]), Operation::new("g", vec![real(gray)])];
    ops.extend(text_ops(font, size, at, text));
    ops.push(Operation::new("Q", vec![]));
    ops
}

// ============================================================================
// SECTION: Shapes
// ============================================================================

/// Builds a stroked check mark fitted to a field box.
///
/// `origin` is the lower-left corner of the box in render space.
#[must_use]
pub fn check_mark_ops(origin: RenderPoint, width: f64, height: f64) -> Vec<Operation> {
    let x0 = origin.x + width * 0.2;
    let y0 = origin.y + height * 0.45;
    let x1 = origin.x + width * 0.4;
    let y1 = origin.y + height * 0.2;
    let x2 = origin.x + width * 0.8;
    let y2 = origin.y + height * 0.8;
    vec![
        Operation::new("q", vec![]),
        Operation::new("w", vec![real((height * 0.12).max(1.0))]),
        Operation::new("m", vec![real(x0), real(y0)]),
        Operation::new("l", vec![real(x1), real(y1)]),
        Operation::new("l", vec![real(x2), real(y2)]),
        Operation::new("S", vec![]),
        Operation::new("Q", vec![]),
    ]
}

/// Builds a filled rectangle (used for the certificate header band).
#[must_use]
pub fn filled_rect_ops(
    x: f64,
    y: f64,
    width: f64,
    height: f64,
    rgb: (f64, f64, f64),
) -> Vec<Operation> {
    vec![
        Operation::new("q", vec![]),
        Operation::new("rg", vec![real(rgb.0), real(rgb.1), real(rgb.2)]),
        Operation::new("re", vec![real(x), real(y), real(width), real(height)]),
        Operation::new("f", vec![]),
        Operation::new("Q", vec![]),
    ]
}

/// Builds a horizontal rule (used as a certificate separator).
#[must_use]
pub fn rule_ops(x: f64, y: f64, width: f64, gray: f64) -> Vec<Operation> {
    vec![
        Operation::new("q", vec![]),
        Operation::new("G", vec![real(gray)]),
        Operation::new("w", vec![real(0.5)]),
        Operation::new("m", vec![real(x), real(y)]),
        Operation::new("l", vec![real(x + width), real(y)]),
        Operation::new("S", vec![]),
        Operation::new("Q", vec![]),
    ]
}

// ============================================================================
// SECTION: Images
// ============================================================================

/// Builds the operations placing a named image XObject.
///
/// `origin` is the lower-left corner; `width`/`height` are the placed size.
#[must_use]
pub fn image_ops(name: &str, origin: RenderPoint, width: f64, height: f64) -> Vec<Operation> {
    vec![
        Operation::new("q", vec![]),
        Operation::new(
            "cm",
            vec![
                real(width),
                real(0.0),
                real(0.0),
                real(height),
                real(origin.x),
                real(origin.y),
            ],
        ),
        Operation::new("Do", vec![name.into()]),
        Operation::new("Q", vec![]),
    ]
}
