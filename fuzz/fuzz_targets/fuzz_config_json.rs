//! Fuzz target: config document decoding
//!
//! Arbitrary bytes as a stored config file.  Decoding may fail, but a
//! document that decodes and validates must describe a usable channel
//! block.
//!
//! cargo fuzz run fuzz_config_json

#![no_main]

use libfuzzer_sys::fuzz_target;
use rovercontrol::config::{MAX_CHANNELS, RoverConfig};

fuzz_target!(|data: &[u8]| {
    let Ok(config) = serde_json::from_slice::<RoverConfig>(data) else {
        return;
    };
    if config.validate().is_ok() {
        assert!(config.channel_count >= 1);
        assert!(config.channel_count as usize <= MAX_CHANNELS);
        assert!(!config.device_path.is_empty());
    }
});
