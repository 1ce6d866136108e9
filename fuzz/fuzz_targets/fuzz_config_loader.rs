#![no_main]
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &str| {
    // Parse and validation errors are fine; panics are not.
    if let Ok(cfg) = tracker_config::load_toml(data) {
        if cfg.validate().is_ok() {
            // A valid config must always convert into engine settings
            let _ = tracker_core::TrackerCfg::from(&cfg);
        }
    }
});
