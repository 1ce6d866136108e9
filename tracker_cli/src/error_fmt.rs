//! Human-readable error descriptions, exit codes and structured JSON errors.

use tracker_core::error::{BuildError, TrackerError};

/// Exit code when the ADC did not answer at startup.
pub const EXIT_SENSOR_NOT_DETECTED: i32 = 3;
/// Exit code for GPIO/PWM/I2C faults after startup.
pub const EXIT_HARDWARE: i32 = 4;
/// Exit code when the position file could not be read or written.
pub const EXIT_STORE: i32 = 5;

fn tracker_error(err: &eyre::Report) -> Option<&TrackerError> {
    err.chain().find_map(|e| e.downcast_ref::<TrackerError>())
}

/// Map an eyre::Report to a human-readable explanation with likely causes and fix hints.
pub fn humanize(err: &eyre::Report) -> String {
    // Typed matches first
    if let Some(be) = err.chain().find_map(|e| e.downcast_ref::<BuildError>()) {
        return match be {
            BuildError::MissingActuator => {
                "What happened: No actuator was provided to the tracker.\nLikely causes: Motor outputs failed to initialize or were not wired into the builder.\nHow to fix: Ensure the GPIO actuator is created successfully and passed via with_actuator(...).".to_string()
            }
            BuildError::MissingSensor => {
                "What happened: No voltage sensor was provided to the tracker.\nLikely causes: The ADC failed to initialize or was not wired into the builder.\nHow to fix: Ensure the ADS7830 is created successfully and passed via with_sensor(...).".to_string()
            }
            BuildError::InvalidConfig(msg) => format!(
                "What happened: Invalid configuration ({msg}).\nLikely causes: Missing or out-of-range values in the TOML.\nHow to fix: Edit the config file, then rerun. See etc/tracker.toml for a sample."
            ),
        };
    }

    if let Some(te) = tracker_error(err) {
        return match te {
            TrackerError::SensorNotDetected(detail) => format!(
                "What happened: The voltage sensor was not detected ({detail}).\nLikely causes: ADS7830 not powered, SDA/SCL miswired, wrong adc.i2c_address, or I2C disabled.\nHow to fix: Check the wiring, run `i2cdetect -y 1`, and fix [adc] in the config. Nothing was moved."
            ),
            TrackerError::Hardware(detail) | TrackerError::HardwareFault(detail) => format!(
                "What happened: A motor or bus operation failed ({detail}).\nLikely causes: Wrong [pins] numbers, missing GPIO permissions, or a loose H-bridge connection.\nHow to fix: Verify [pins] against the wiring and run as a user in the gpio group. The last move was not counted."
            ),
            TrackerError::Config(detail) => format!(
                "What happened: Configuration is invalid or incomplete ({detail}).\nLikely causes: Missing [pins] (yaw_in1, yaw_in2, yaw_enable, pitch_in1, pitch_in2, pitch_enable), or out-of-range values.\nHow to fix: Edit the TOML config and try again. See etc/tracker.toml for a sample."
            ),
            TrackerError::Store(detail) => format!(
                "What happened: The saved position could not be used ({detail}).\nLikely causes: Unreadable or hand-edited position file, or no write permission.\nHow to fix: Check store.path; delete the file to start from the current position."
            ),
            other => format!(
                "What happened: {other}.\nLikely causes: See logs.\nHow to fix: Re-run with --log-level=debug or set RUST_LOG for more detail."
            ),
        };
    }

    // String-based heuristics for errors coming from init or config
    let msg = err.to_string();
    let lower = msg.to_ascii_lowercase();

    if lower.contains("read config") {
        return format!(
            "What happened: The config file could not be read.\nLikely causes: Wrong --config path or missing permissions.\nHow to fix: Pass --config pointing to a TOML file (see etc/tracker.toml). Details: {msg}"
        );
    }

    // Generic fallback
    let mut cause = String::new();
    if let Some(src) = err.source() {
        cause = format!(" Cause: {src}");
    }
    format!(
        "Something went wrong.{cause}\nHow to fix: Re-run with --log-level=debug for details. Details: {msg}"
    )
}

/// Stable exit codes for typed failures; everything else is 1.
pub fn exit_code_for_error(err: &eyre::Report) -> i32 {
    match tracker_error(err) {
        Some(TrackerError::SensorNotDetected(_)) => EXIT_SENSOR_NOT_DETECTED,
        Some(TrackerError::Hardware(_) | TrackerError::HardwareFault(_)) => EXIT_HARDWARE,
        Some(TrackerError::Store(_)) => EXIT_STORE,
        _ => 1,
    }
}

fn reason_name(err: &eyre::Report) -> &'static str {
    match tracker_error(err) {
        Some(TrackerError::SensorNotDetected(_)) => "SensorNotDetected",
        Some(TrackerError::Hardware(_) | TrackerError::HardwareFault(_)) => "Hardware",
        Some(TrackerError::Store(_)) => "Store",
        Some(TrackerError::Config(_)) => "Config",
        Some(TrackerError::State(_)) => "State",
        None => "Error",
    }
}

/// Structured JSON for errors when --json is enabled.
pub fn format_error_json(err: &eyre::Report) -> String {
    serde_json::json!({
        "reason": reason_name(err),
        "exit_code": exit_code_for_error(err),
        "message": humanize(err),
    })
    .to_string()
}
