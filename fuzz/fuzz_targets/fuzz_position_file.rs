#![no_main]
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &str| {
    if let Ok(pos) = tracker_core::store::parse_position(data) {
        assert!(pos.yaw_s.is_finite() && pos.pitch_s.is_finite());
        let again = tracker_core::store::parse_position(&tracker_core::store::format_position(pos));
        assert_eq!(again.ok(), Some(pos));
    }
});
