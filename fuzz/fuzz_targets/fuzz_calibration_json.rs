//! Fuzz target: `CalibrationTable::from_json`
//!
//! Arbitrary documents must either be rejected or yield a table that
//! resolves every in-range channel and rejects the rest.
//!
//! cargo fuzz run fuzz_calibration_json

#![no_main]

use libfuzzer_sys::fuzz_target;
use vivarium::sensors::calibration::CalibrationTable;

fuzz_target!(|data: &[u8]| {
    let Ok(text) = std::str::from_utf8(data) else {
        return;
    };
    let Ok(table) = CalibrationTable::from_json(text) else {
        return;
    };

    assert!(table.channels() > 0, "accepted table must have channels");
    for ch in 0..table.channels() {
        for v in [-1.0, 0.0, 0.5, 1.65, 3.3, 100.0] {
            assert!(table.temperature_for(ch, v).is_ok());
        }
    }
    assert!(table.temperature_for(table.channels(), 1.0).is_err());
});
