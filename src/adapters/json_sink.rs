//! JSON-lines telemetry sink.
//!
//! Writes each [`LogRecord`] as one compact JSON object per line to any
//! [`Write`] target (a file, stdout, or a `Vec<u8>` in tests).  A batch is
//! encoded up front and handed to the writer in one call, then flushed.

use std::io::Write;

use crate::app::ports::LogSink;
use crate::error::SinkError;
use crate::telemetry::LogRecord;

pub struct JsonLinesSink<W> {
    out: W,
}

impl<W: Write> JsonLinesSink<W> {
    pub fn new(out: W) -> Self {
        Self { out }
    }

    pub fn get_ref(&self) -> &W {
        &self.out
    }

    pub fn into_inner(self) -> W {
        self.out
    }
}

impl<W: Write> LogSink for JsonLinesSink<W> {
    fn write(&mut self, records: &[LogRecord]) -> Result<(), SinkError> {
        if records.is_empty() {
            return Ok(());
        }
        // Encode the whole batch first so an encoding error writes nothing.
        let mut batch = Vec::new();
        for record in records {
            serde_json::to_writer(&mut batch, record)
                .map_err(|e| SinkError::Encode(e.to_string()))?;
            batch.push(b'\n');
        }
        self.out
            .write_all(&batch)
            .and_then(|()| self.out.flush())
            .map_err(|e| SinkError::Io(e.to_string()))
    }
}
