//! Control cycle → TelemetryBuffer → JsonLinesSink pipeline.

use std::fs::{self, OpenOptions};
use std::io::{self, Write};

use chrono::Duration;
use vivarium::adapters::json_sink::JsonLinesSink;
use vivarium::app::ports::LogSink;
use vivarium::app::service::ControlCycle;
use vivarium::config::SystemConfig;
use vivarium::error::SinkError;
use vivarium::telemetry::{LogRecord, TelemetryBuffer};

use crate::mock_hw::{EventLog, FixedProbe, MockHardware, NoDelay, at, linear_table};

/// Writer that can be switched off to simulate an unreachable sink.
struct Switchable {
    up: bool,
    lines: Vec<u8>,
}

impl Write for Switchable {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        if !self.up {
            return Err(io::Error::new(io::ErrorKind::ConnectionRefused, "down"));
        }
        self.lines.extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

fn run_ticks(n: i64) -> Vec<LogRecord> {
    let config = SystemConfig::default();
    let mut cycle = ControlCycle::new(&config, linear_table(4)).unwrap();
    let mut hw = MockHardware::new(4, 21.0);
    let mut events = EventLog::default();
    (0..n)
        .map(|i| {
            cycle.run_once(
                at(8, 0, 0) + Duration::seconds(10 * i),
                &mut hw,
                &mut NoDelay::default(),
                &mut FixedProbe(None),
                &mut events,
            )
        })
        .collect()
}

#[test]
fn records_reach_a_jsonl_file() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("vivarium.jsonl");
    let file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(&path)
        .unwrap();
    let mut sink = JsonLinesSink::new(file);
    let mut buffer = TelemetryBuffer::new(16);

    for record in run_ticks(3) {
        buffer.push(record);
        assert_eq!(buffer.flush(&mut sink), Ok(1));
    }

    let text = fs::read_to_string(&path).unwrap();
    let lines: Vec<serde_json::Value> = text
        .lines()
        .map(|l| serde_json::from_str(l).unwrap())
        .collect();
    assert_eq!(lines.len(), 3);
    assert!(lines.iter().all(|l| l["measurement"] == "vivarium2"));
    assert_eq!(lines[0]["time"], "2024-05-01T08:00:00");
    assert_eq!(lines[2]["time"], "2024-05-01T08:00:20");
    assert_eq!(lines[0]["fields"]["heater_state"], true);
    assert_eq!(lines[0]["fields"]["valid_sensors"], 4);
}

#[test]
fn outage_keeps_records_until_sink_returns() {
    let mut sink = JsonLinesSink::new(Switchable {
        up: false,
        lines: Vec::new(),
    });
    let mut buffer = TelemetryBuffer::new(16);

    for record in run_ticks(5) {
        buffer.push(record);
        assert!(matches!(buffer.flush(&mut sink), Err(SinkError::Io(_))));
    }
    assert_eq!(buffer.len(), 5);

    let mut sink = JsonLinesSink::new(Switchable {
        up: true,
        lines: Vec::new(),
    });
    assert_eq!(buffer.flush(&mut sink), Ok(5));
    let out = String::from_utf8(sink.into_inner().lines).unwrap();
    assert_eq!(out.lines().count(), 5);
}

#[test]
fn long_outage_drops_oldest() {
    struct Down;
    impl LogSink for Down {
        fn write(&mut self, _: &[LogRecord]) -> Result<(), SinkError> {
            Err(SinkError::Io("down".into()))
        }
    }

    let mut buffer = TelemetryBuffer::new(4);
    for record in run_ticks(10) {
        buffer.push(record);
        let _ = buffer.flush(&mut Down);
    }
    assert_eq!(buffer.len(), 4);
    assert_eq!(buffer.dropped(), 6);
}
