//! Fuzz target: `SystemConfig::from_json`
//!
//! Whatever the input, an accepted config must pass validation again and
//! survive a serialise/parse cycle unchanged.
//!
//! cargo fuzz run fuzz_config_json

#![no_main]

use libfuzzer_sys::fuzz_target;
use vivarium::config::SystemConfig;

fuzz_target!(|data: &[u8]| {
    let Ok(text) = std::str::from_utf8(data) else {
        return;
    };
    let Ok(config) = SystemConfig::from_json(text) else {
        return;
    };

    assert!(config.validate().is_ok());
    let json = serde_json::to_string(&config).expect("valid config serialises");
    let again = SystemConfig::from_json(&json).expect("serialised config parses");
    assert_eq!(config, again);
});
