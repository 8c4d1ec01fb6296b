//! End-to-end control cycle tests: mock thermistors → ControlCycle →
//! mock relay / PWM, with the log record checked after every tick.

use chrono::{Duration, NaiveDateTime};
use vivarium::app::events::{Actuator, AppEvent};
use vivarium::app::service::ControlCycle;
use vivarium::config::SystemConfig;
use vivarium::control::heater::{DayCycleParams, PowerState, target_temperature};
use vivarium::control::light::{LightCycleParams, MAX_LEVEL, brightness};
use vivarium::error::{ActuatorError, CalibrationError};
use vivarium::telemetry::{FieldValue, LogRecord};

use crate::mock_hw::{
    ActuatorCall, EventLog, FixedProbe, MockHardware, NoDelay, SENTINEL_VOLTS, at, linear_table,
};

const CHANNELS: usize = 4;

fn approx(a: f64, b: f64) -> bool {
    (a - b).abs() < 1e-6
}

struct Rig {
    cycle: ControlCycle,
    hw: MockHardware,
    delay: NoDelay,
    probe: FixedProbe,
    events: EventLog,
}

impl Rig {
    fn new(temp: f64) -> Self {
        Self::with_config(SystemConfig::default(), temp)
    }

    fn with_config(config: SystemConfig, temp: f64) -> Self {
        let channels = config.sensors.channels;
        let mut cycle = ControlCycle::new(&config, linear_table(channels)).unwrap();
        let mut events = EventLog::default();
        cycle.start(&mut events);
        Self {
            cycle,
            hw: MockHardware::new(channels, temp),
            delay: NoDelay::default(),
            probe: FixedProbe(Some(47.5)),
            events,
        }
    }

    fn tick(&mut self, now: NaiveDateTime) -> LogRecord {
        self.cycle.run_once(
            now,
            &mut self.hw,
            &mut self.delay,
            &mut self.probe,
            &mut self.events,
        )
    }
}

fn default_target(now: NaiveDateTime) -> f64 {
    target_temperature(
        now.time(),
        &DayCycleParams {
            avg_temp: 26.0,
            delta_temp: 2.0,
            coldest_hour: 2.0,
        },
    )
}

// ── Single tick ───────────────────────────────────────────────

#[test]
fn cold_enclosure_at_one_pm() {
    let mut rig = Rig::new(20.0);
    let now = at(13, 0, 0);
    let record = rig.tick(now);

    assert_eq!(
        rig.hw.calls,
        vec![ActuatorCall::Heater(true), ActuatorCall::Light(MAX_LEVEL)]
    );

    assert_eq!(record.measurement, "vivarium2");
    assert_eq!(record.tags.get("run").map(String::as_str), Some("v1"));
    assert_eq!(record.time, now);
    for ch in 0..CHANNELS {
        assert!(approx(record.float(&format!("temp{ch}")).unwrap(), 20.0));
    }
    assert!(approx(record.float("temp_avg").unwrap(), 20.0));
    assert_eq!(record.field("valid_sensors"), Some(FieldValue::Int(4)));
    assert_eq!(record.field("heater_state"), Some(FieldValue::Bool(true)));
    assert_eq!(record.field("light"), Some(FieldValue::Int(1024)));
    assert!(approx(record.float("target_temp").unwrap(), default_target(now)));
    assert_eq!(record.float("temp_host"), Some(47.5));

    assert_eq!(
        rig.events
            .count(|e| matches!(e, AppEvent::HeaterSwitched { on: true, .. })),
        1
    );
    assert_eq!(
        rig.events
            .count(|e| matches!(e, AppEvent::LightChanged { level: 1024 })),
        1
    );
}

#[test]
fn warm_enclosure_at_night_turns_heater_off_and_light_stays_dark() {
    let mut rig = Rig::new(30.0);
    let record = rig.tick(at(2, 0, 0));
    assert_eq!(
        rig.hw.calls,
        vec![ActuatorCall::Heater(false), ActuatorCall::Light(0)]
    );
    assert_eq!(record.field("heater_state"), Some(FieldValue::Bool(false)));
    assert!(approx(record.float("target_temp").unwrap(), 24.0));
}

#[test]
fn all_sentinel_readings_skip_the_heater() {
    let mut rig = Rig::new(20.0);
    rig.hw.voltages = vec![SENTINEL_VOLTS; CHANNELS];
    let now = at(13, 0, 0);
    let record = rig.tick(now);

    assert!(rig.hw.heater_calls().is_empty());
    assert_eq!(rig.hw.light_calls(), vec![MAX_LEVEL]);
    assert_eq!(rig.cycle.heater_power(), PowerState::Unknown);

    assert_eq!(record.field("temp_avg"), None);
    assert_eq!(record.field("heater_state"), None);
    assert_eq!(record.field("valid_sensors"), Some(FieldValue::Int(0)));
    assert!(approx(record.float("temp0").unwrap(), 13.0));
    assert!(approx(record.float("target_temp").unwrap(), default_target(now)));
    assert_eq!(
        rig.events
            .count(|e| matches!(e, AppEvent::NoValidReading { .. })),
        1
    );
}

#[test]
fn sentinel_channel_is_excluded_from_median() {
    let mut rig = Rig::new(20.0);
    rig.hw.voltages = vec![2.0, SENTINEL_VOLTS, 2.2, 2.4];
    let record = rig.tick(at(13, 0, 0));
    assert!(approx(record.float("temp_avg").unwrap(), 22.0));
    assert_eq!(record.field("valid_sensors"), Some(FieldValue::Int(3)));
}

#[test]
fn failed_channel_is_left_out_of_record() {
    let mut rig = Rig::new(20.0);
    rig.hw.voltages = vec![2.0, 2.1, 2.3, 2.4];
    rig.hw.failing_channels = vec![3];
    let record = rig.tick(at(13, 0, 0));
    assert_eq!(record.field("temp3"), None);
    assert!(approx(record.float("temp_avg").unwrap(), 21.0));
    assert_eq!(record.field("valid_sensors"), Some(FieldValue::Int(3)));
}

#[test]
fn even_valid_count_averages_middle_pair() {
    let mut rig = Rig::new(20.0);
    rig.hw.voltages = vec![2.0, 2.1, 2.3, 2.6];
    let record = rig.tick(at(13, 0, 0));
    assert!(approx(record.float("temp_avg").unwrap(), 22.0));
}

#[test]
fn missing_probe_omits_host_temperature() {
    let mut rig = Rig::new(20.0);
    rig.probe = FixedProbe(None);
    let record = rig.tick(at(13, 0, 0));
    assert_eq!(record.field("temp_host"), None);
}

// ── Deadzones across ticks ────────────────────────────────────

#[test]
fn temperature_deadzone_holds_relay() {
    let mut rig = Rig::new(20.0);
    let t0 = at(13, 0, 0);
    rig.tick(t0);
    assert_eq!(rig.hw.heater_on(), Some(true));

    // Just above target but within 0.1 °C, long after the time band.
    let t1 = t0 + Duration::minutes(10);
    rig.hw.set_temp(default_target(t1) + 0.05);
    rig.tick(t1);
    assert_eq!(rig.hw.heater_calls(), vec![true]);

    let t2 = t1 + Duration::minutes(10);
    rig.hw.set_temp(default_target(t2) + 0.5);
    rig.tick(t2);
    assert_eq!(rig.hw.heater_calls(), vec![true, false]);
}

#[test]
fn time_deadzone_holds_relay() {
    let mut rig = Rig::new(20.0);
    let t0 = at(13, 0, 0);
    rig.tick(t0);

    rig.hw.set_temp(35.0);
    rig.tick(t0 + Duration::seconds(60));
    rig.tick(t0 + Duration::seconds(179));
    assert_eq!(rig.hw.heater_calls(), vec![true]);
    assert_eq!(rig.cycle.heater_power(), PowerState::On);

    rig.tick(t0 + Duration::seconds(181));
    assert_eq!(rig.hw.heater_calls(), vec![true, false]);
}

// ── Actuator faults ───────────────────────────────────────────

#[test]
fn heater_fault_retries_next_tick() {
    let mut rig = Rig::new(20.0);
    rig.hw.heater_fails = true;
    let t0 = at(13, 0, 0);
    let record = rig.tick(t0);
    assert_eq!(record.field("heater_state"), None);
    assert!(rig.events.events.contains(&AppEvent::ActuatorFault {
        actuator: Actuator::Heater,
        error: ActuatorError::GpioWriteFailed,
    }));

    rig.hw.heater_fails = false;
    rig.tick(t0 + Duration::seconds(10));
    assert_eq!(rig.hw.heater_calls(), vec![true]);
    assert_eq!(rig.cycle.heater_power(), PowerState::On);
}

#[test]
fn light_fault_retries_next_tick() {
    let mut rig = Rig::new(20.0);
    rig.hw.light_fails = true;
    let t0 = at(13, 0, 0);
    let record = rig.tick(t0);
    assert_eq!(record.field("light"), None);
    assert_eq!(rig.cycle.light_level(), None);

    rig.hw.light_fails = false;
    let record = rig.tick(t0 + Duration::seconds(1));
    assert_eq!(rig.hw.light_calls().len(), 1);
    assert!(record.field("light").is_some());
}

// ── Full day ──────────────────────────────────────────────────

#[test]
fn actuator_writes_match_actual_changes_over_a_day() {
    let mut rig = Rig::new(22.0);
    let start = at(0, 0, 0);
    let step = Duration::seconds(10);
    let mut temp = 22.0;
    let mut switch_times: Vec<NaiveDateTime> = Vec::new();
    let mut expected_light_writes = 0;
    let mut last_level = None;
    let lights = LightCycleParams::from_hours(6.0, 20.0);

    for i in 0..(24 * 360) {
        let now = start + step * i;
        rig.hw.set_temp(temp);
        let before = rig.hw.heater_calls().len();
        let record = rig.tick(now);

        if rig.hw.heater_calls().len() > before {
            switch_times.push(now);
        }
        let level = brightness(now.time(), &lights);
        if last_level != Some(level) {
            expected_light_writes += 1;
            last_level = Some(level);
        }
        assert_eq!(
            record.field("heater_state"),
            rig.hw.heater_on().map(FieldValue::Bool)
        );

        temp += if rig.hw.heater_on() == Some(true) {
            0.02
        } else {
            -0.015
        };
    }

    let heater = rig.hw.heater_calls();
    assert!(heater.len() > 2, "model should cycle the heater");
    assert!(heater.windows(2).all(|w| w[0] != w[1]));
    assert!(
        switch_times
            .windows(2)
            .all(|w| (w[1] - w[0]).num_seconds() >= 180)
    );
    assert_eq!(
        rig.events
            .count(|e| matches!(e, AppEvent::HeaterSwitched { .. })),
        heater.len()
    );

    let light = rig.hw.light_calls();
    assert_eq!(light.len(), expected_light_writes);
    assert!(light.windows(2).all(|w| w[0] != w[1]));
    assert!(light.iter().all(|&l| l <= MAX_LEVEL));
    assert_eq!(light.iter().max(), Some(&MAX_LEVEL));
}

// ── Configuration ─────────────────────────────────────────────

#[test]
fn calibration_must_match_channel_count() {
    let config = SystemConfig::default();
    let err = ControlCycle::new(&config, linear_table(3)).err();
    assert_eq!(
        err,
        Some(CalibrationError::ChannelCount {
            expected: 4,
            found: 3
        })
    );
}

#[test]
fn multi_sample_reads_wait_between_samples() {
    let mut config = SystemConfig::default();
    config.sensors.samples_per_tick = 3;
    config.sensors.settle_ms = 250;
    let mut rig = Rig::with_config(config, 24.0);
    let record = rig.tick(at(13, 0, 0));
    assert_eq!(rig.delay.total_ms, 500);
    assert!(approx(record.float("temp_avg").unwrap(), 24.0));
}

// ── Lifecycle ─────────────────────────────────────────────────

#[test]
fn start_and_shutdown_events() {
    let mut rig = Rig::new(20.0);
    assert_eq!(rig.events.events[0], AppEvent::Started { channels: 4 });
    rig.tick(at(13, 0, 0));
    rig.hw.calls.clear();

    rig.cycle.shutdown(&mut rig.hw, &mut rig.events);
    assert_eq!(
        rig.hw.calls,
        vec![ActuatorCall::Heater(false), ActuatorCall::Light(0)]
    );
    assert_eq!(rig.events.events.last(), Some(&AppEvent::Shutdown));
}
