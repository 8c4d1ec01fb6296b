//! Time-series records and the pending-record buffer.
//!
//! Each tick produces one [`LogRecord`] shaped like a time-series point:
//! a measurement name, a `run` tag, and a map of named fields.  Records are
//! queued in a [`TelemetryBuffer`] and flushed to a
//! [`LogSink`](crate::app::ports::LogSink) in one batch.  A failed flush
//! keeps the batch for the next attempt; when the buffer is full the oldest
//! record is dropped.

use std::collections::{BTreeMap, VecDeque};

use chrono::NaiveDateTime;
use log::{error, warn};
use serde::Serialize;

use crate::app::ports::LogSink;
use crate::error::SinkError;

/// Tag key carrying the run identifier.
pub const RUN_TAG: &str = "run";

/// A single field value.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(untagged)]
pub enum FieldValue {
    Float(f64),
    Int(i64),
    Bool(bool),
}

impl From<f64> for FieldValue {
    fn from(v: f64) -> Self {
        Self::Float(v)
    }
}

impl From<i64> for FieldValue {
    fn from(v: i64) -> Self {
        Self::Int(v)
    }
}

impl From<bool> for FieldValue {
    fn from(v: bool) -> Self {
        Self::Bool(v)
    }
}

/// One tick's telemetry point.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LogRecord {
    pub measurement: String,
    pub tags: BTreeMap<String, String>,
    pub fields: BTreeMap<String, FieldValue>,
    pub time: NaiveDateTime,
}

impl LogRecord {
    pub fn new(measurement: &str, run_id: &str, time: NaiveDateTime) -> Self {
        let mut tags = BTreeMap::new();
        tags.insert(RUN_TAG.to_owned(), run_id.to_owned());
        Self {
            measurement: measurement.to_owned(),
            tags,
            fields: BTreeMap::new(),
            time,
        }
    }

    pub fn insert(&mut self, name: impl Into<String>, value: impl Into<FieldValue>) {
        self.fields.insert(name.into(), value.into());
    }

    pub fn field(&self, name: &str) -> Option<FieldValue> {
        self.fields.get(name).copied()
    }

    /// Shorthand for float fields in assertions and logging.
    pub fn float(&self, name: &str) -> Option<f64> {
        match self.field(name)? {
            FieldValue::Float(v) => Some(v),
            FieldValue::Int(v) => Some(v as f64),
            FieldValue::Bool(_) => None,
        }
    }
}

/// Bounded queue of records waiting for the sink.
pub struct TelemetryBuffer {
    pending: VecDeque<LogRecord>,
    capacity: usize,
    dropped: u64,
}

impl TelemetryBuffer {
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            pending: VecDeque::with_capacity(capacity),
            capacity,
            dropped: 0,
        }
    }

    /// Queue a record, evicting the oldest when full.
    pub fn push(&mut self, record: LogRecord) {
        if self.pending.len() >= self.capacity {
            self.pending.pop_front();
            self.dropped += 1;
            warn!(
                "Telemetry backlog full ({}), dropped oldest record ({} total)",
                self.capacity, self.dropped
            );
        }
        self.pending.push_back(record);
    }

    /// Send everything pending in one batch.
    ///
    /// Returns the number of records written.  On failure the records stay
    /// queued.
    pub fn flush(&mut self, sink: &mut impl LogSink) -> Result<usize, SinkError> {
        if self.pending.is_empty() {
            return Ok(0);
        }
        let batch = self.pending.make_contiguous();
        match sink.write(batch) {
            Ok(()) => {
                let n = self.pending.len();
                self.pending.clear();
                Ok(n)
            }
            Err(e) => {
                error!(
                    "Problem writing sensor data ({} records kept): {}",
                    self.pending.len(),
                    e
                );
                Err(e)
            }
        }
    }

    pub fn len(&self) -> usize {
        self.pending.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pending.is_empty()
    }

    /// Records evicted since startup.
    pub fn dropped(&self) -> u64 {
        self.dropped
    }
}
