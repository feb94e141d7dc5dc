// crates/loadgate-core/src/runtime/sinks.rs
// ============================================================================
// Module: Load Gate Sinks
// Description: Reference gate log and verdict recorder implementations.
// Purpose: Emit JSON-lines logs and records without hard logging dependencies.
// Dependencies: crate::{core, interfaces}, serde, serde_json
// ============================================================================

//! ## Overview
//! JSON-lines sinks write one object per line to any [`Write`] target, so
//! hosts can route gate output to stderr, a file, or their own pipeline.
//! In-memory sinks capture events and records for inspection.
//!
//! Security posture: events carry redacted identifiers only; secret keys are
//! never part of a [`GateEvent`] or [`VerdictRecord`].

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::io::Write;
use std::sync::Mutex;
use std::sync::PoisonError;
use std::time::SystemTime;
use std::time::UNIX_EPOCH;

use serde::Serialize;

use crate::core::VerdictRecord;
use crate::interfaces::GateEvent;
use crate::interfaces::GateLog;
use crate::interfaces::RecordError;
use crate::interfaces::VerdictRecorder;

// ============================================================================
// SECTION: Gate Logs
// ============================================================================

/// Log line wrapper adding the emission timestamp.
#[derive(Serialize)]
struct TimestampedEvent<'a> {
    /// Emission timestamp (milliseconds since epoch).
    timestamp_ms: u128,
    /// Logged event.
    #[serde(flatten)]
    event: &'a GateEvent,
}

/// Gate log writing JSON lines.
pub struct JsonLinesGateLog<W: Write + Send> {
    /// Output writer for log lines.
    writer: Mutex<W>,
}

impl<W: Write + Send> JsonLinesGateLog<W> {
    /// Creates a JSON-lines log over the provided writer.
    pub const fn new(writer: W) -> Self {
        Self {
            writer: Mutex::new(writer),
        }
    }

    /// Consumes the log and returns the writer.
    pub fn into_inner(self) -> W {
        self.writer.into_inner().unwrap_or_else(PoisonError::into_inner)
    }
}

impl<W: Write + Send> GateLog for JsonLinesGateLog<W> {
    fn record(&self, event: GateEvent) {
        let timestamp_ms =
            SystemTime::now().duration_since(UNIX_EPOCH).unwrap_or_default().as_millis();
        let line = TimestampedEvent {
            timestamp_ms,
            event: &event,
        };
        if let Ok(payload) = serde_json::to_string(&line)
            && let Ok(mut writer) = self.writer.lock()
        {
            let _ = writeln!(writer, "{payload}");
            let _ = writer.flush();
        }
    }
}

/// Gate log capturing events in memory.
#[derive(Debug, Default)]
pub struct InMemoryGateLog {
    /// Captured events in emission order.
    events: Mutex<Vec<GateEvent>>,
}

impl InMemoryGateLog {
    /// Creates an empty in-memory log.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns a snapshot of captured events.
    #[must_use]
    pub fn events(&self) -> Vec<GateEvent> {
        self.events.lock().unwrap_or_else(PoisonError::into_inner).clone()
    }
}

impl GateLog for InMemoryGateLog {
    fn record(&self, event: GateEvent) {
        self.events.lock().unwrap_or_else(PoisonError::into_inner).push(event);
    }
}

/// Gate log that discards events.
pub struct NoopGateLog;

impl GateLog for NoopGateLog {
    fn record(&self, _event: GateEvent) {}
}

// ============================================================================
// SECTION: Verdict Recorders
// ============================================================================

/// Verdict recorder writing one JSON line per record.
pub struct JsonLinesVerdictRecorder<W: Write + Send> {
    /// Output writer for records.
    writer: Mutex<W>,
}

impl<W: Write + Send> JsonLinesVerdictRecorder<W> {
    /// Creates a recorder over the provided writer.
    pub const fn new(writer: W) -> Self {
        Self {
            writer: Mutex::new(writer),
        }
    }

    /// Consumes the recorder and returns the writer.
    pub fn into_inner(self) -> W {
        self.writer.into_inner().unwrap_or_else(PoisonError::into_inner)
    }
}

impl<W: Write + Send> VerdictRecorder for JsonLinesVerdictRecorder<W> {
    fn record(&self, record: &VerdictRecord) -> Result<(), RecordError> {
        let mut guard = self
            .writer
            .lock()
            .map_err(|_| RecordError::WriteFailed("record writer mutex poisoned".to_string()))?;
        serde_json::to_writer(&mut *guard, record)
            .map_err(|err| RecordError::WriteFailed(err.to_string()))?;
        guard.write_all(b"\n").map_err(|err| RecordError::WriteFailed(err.to_string()))?;
        guard.flush().map_err(|err| RecordError::WriteFailed(err.to_string()))?;
        drop(guard);
        Ok(())
    }
}

/// Verdict recorder capturing records in memory.
#[derive(Debug, Default)]
pub struct InMemoryVerdictRecorder {
    /// Captured records in order.
    records: Mutex<Vec<VerdictRecord>>,
}

impl InMemoryVerdictRecorder {
    /// Creates an empty recorder.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns a snapshot of captured records.
    #[must_use]
    pub fn records(&self) -> Vec<VerdictRecord> {
        self.records.lock().unwrap_or_else(PoisonError::into_inner).clone()
    }
}

impl VerdictRecorder for InMemoryVerdictRecorder {
    fn record(&self, record: &VerdictRecord) -> Result<(), RecordError> {
        self.records.lock().unwrap_or_else(PoisonError::into_inner).push(record.clone());
        Ok(())
    }
}
