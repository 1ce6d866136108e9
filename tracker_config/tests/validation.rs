use rstest::rstest;
use std::fs;
use tempfile::tempdir;
use tracker_config::{Reduction, load_file, load_toml};

const PINS: &str = r#"
[pins]
yaw_in1 = 13
yaw_in2 = 15
yaw_enable = 11
pitch_in1 = 18
pitch_in2 = 22
pitch_enable = 16
"#;

#[test]
fn pins_only_config_uses_rig_defaults() {
    let cfg = load_toml(PINS).expect("parse TOML");
    cfg.validate().expect("defaults must validate");

    assert_eq!(cfg.adc.i2c_address, 0x4b);
    assert_eq!(cfg.sampler.reads, 10);
    assert_eq!(cfg.sampler.read_interval_ms, 200);
    assert_eq!(cfg.sampler.reduction, Reduction::Mean);
    assert_eq!(cfg.sampler.max_raw, 255);
    assert!((cfg.yaw.revolution_s - 18.63).abs() < 1e-9);
    assert!((cfg.pitch.revolution_s - 127.44).abs() < 1e-9);
    assert!((cfg.yaw.coarse_deg - 15.0).abs() < 1e-9);
    assert!((cfg.pitch.fine_deg - 5.0).abs() < 1e-9);
    assert_eq!(cfg.search.max_iterations, 0);
    assert_eq!(cfg.cycle.rest_interval_ms, 60_000);
    assert_eq!(cfg.store.path, "position_save.txt");
}

#[test]
fn missing_pins_is_a_parse_error() {
    let err = load_toml("[sampler]\nreads = 3\n").expect_err("pins are mandatory");
    assert!(err.to_string().contains("pins"));
}

#[test]
fn partial_axis_section_keeps_step_defaults() {
    let toml = format!("{PINS}\n[pitch]\nrevolution_s = 100.0\ncoarse_deg = 20.0\n");
    let cfg = load_toml(&toml).expect("parse TOML");
    cfg.validate().expect("valid");
    assert!((cfg.pitch.revolution_s - 100.0).abs() < 1e-9);
    assert!((cfg.pitch.coarse_deg - 20.0).abs() < 1e-9);
    assert!((cfg.pitch.fine_deg - 5.0).abs() < 1e-9);
    assert_eq!(cfg.pitch.duty_cycle_pct, 100);
}

#[test]
fn median_reduction_parses() {
    let toml = format!("{PINS}\n[sampler]\nreduction = \"median\"\nreads = 5\n");
    let cfg = load_toml(&toml).expect("parse TOML");
    assert_eq!(cfg.sampler.reduction, Reduction::Median);
    assert_eq!(cfg.sampler.reads, 5);
}

#[rstest]
#[case("[sampler]\nreads = 0\n", "sampler.reads must be >= 1")]
#[case("[sampler]\nmax_raw = 0\n", "sampler.max_raw must be > 0")]
#[case("[sampler]\ndivider_factor = -1.0\n", "sampler.divider_factor must be > 0")]
#[case("[yaw]\nrevolution_s = 0.0\n", "yaw.revolution_s must be > 0")]
#[case("[pitch]\nrevolution_s = 127.44\nduty_cycle_pct = 0\n", "pitch.duty_cycle_pct must be in [1, 100]")]
#[case("[yaw]\nrevolution_s = 18.63\ncoarse_deg = 5.0\nfine_deg = 10.0\n", "yaw.fine_deg must be <= yaw.coarse_deg")]
#[case("[cycle]\ncountdown_log_every_ms = 0\n", "cycle.countdown_log_every_ms must be >= 1")]
#[case("[store]\npath = \"  \"\n", "store.path must not be empty")]
#[case("[logging]\nrotation = \"weekly\"\n", "logging.rotation must be one of")]
fn rejects_out_of_range_values(#[case] section: &str, #[case] needle: &str) {
    let toml = format!("{PINS}\n{section}");
    let cfg = load_toml(&toml).expect("parse TOML");
    let err = cfg.validate().expect_err("should be rejected");
    assert!(
        format!("{err}").contains(needle),
        "expected {needle:?} in {err}"
    );
}

#[test]
fn load_file_wraps_validation_errors() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("tracker.toml");
    fs::write(&path, format!("{PINS}\n[sampler]\nreads = 0\n")).unwrap();

    let err = load_file(&path).expect_err("invalid");
    let msg = format!("{err}");
    assert!(msg.contains("invalid configuration"));
    assert!(msg.contains("sampler.reads"));
}

#[test]
fn load_file_reports_missing_file() {
    let dir = tempdir().unwrap();
    let err = load_file(&dir.path().join("nope.toml")).expect_err("missing");
    assert!(format!("{err}").contains("read config"));
}
