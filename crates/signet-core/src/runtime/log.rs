// crates/signet-core/src/runtime/log.rs
// ============================================================================
// Module: Signet Event Log Sinks
// Description: Reference event sinks for operational session events.
// Purpose: Record stage transitions as canonical JSON lines.
// Dependencies: crate::interfaces, serde_json
// ============================================================================

//! ## Overview
//! [`JsonLineSink`] writes one canonical JSON object per event to any
//! `io::Write` destination. Emission is best-effort by contract: a write
//! failure is swallowed so an unavailable log can never fail a signing
//! attempt. [`NullSink`] discards events for hosts that aggregate elsewhere.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::io::Write;
use std::sync::Mutex;

use crate::interfaces::EventSink;
use crate::interfaces::SessionEvent;

// ============================================================================
// SECTION: JSON Line Sink
// ============================================================================

/// Event sink writing one canonical JSON line per event.
#[derive(Debug)]
pub struct JsonLineSink<W> {
    /// Destination writer protected by a mutex.
    writer: Mutex<W>,
}

impl<W: Write> JsonLineSink<W> {
    /// Creates a sink over the provided writer.
    pub fn new(writer: W) -> Self {
        Self {
            writer: Mutex::new(writer),
        }
    }

    /// Consumes the sink and returns the inner writer.
    ///
    /// Returns the writer even when the mutex was poisoned; the log is
    /// best-effort and its contents remain useful for diagnosis.
    pub fn into_inner(self) -> W {
        match self.writer.into_inner() {
            Ok(writer) => writer,
            Err(poisoned) => poisoned.into_inner(),
        }
    }
}

impl<W: Write> EventSink for JsonLineSink<W> {
    fn emit(&self, event: &SessionEvent) {
        let Ok(line) = serde_json::to_string(event) else {
            return;
        };
        if let Ok(mut writer) = self.writer.lock() {
            let _ = writeln!(writer, "{line}");
        }
    }
}

// ============================================================================
// SECTION: Null Sink
// ============================================================================

/// Event sink that discards every event.
#[derive(Debug, Clone, Copy, Default)]
pub struct NullSink;

impl EventSink for NullSink {
    fn emit(&self, _event: &SessionEvent) {}
}
