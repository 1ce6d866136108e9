//! Rig assembly and the subcommand flows.

use std::io;
use std::sync::Arc;

use eyre::WrapErr;
use tracker_core::{
    FilePositionStore, PositionReport, RestoreOutcome, RunSummary, ShutdownSignal, StopReason,
    Tracker, TrackerCfg, TrackerError,
};
use tracker_hardware::{PanelModel, SimCalibration, SimulatedPanel};
use tracker_traits::clock::{Clock, MonotonicClock};
use tracker_traits::{Actuator, PositionStore, VirtualClock, VoltageSensor};

use crate::cli::RestoreMode;
use crate::prompt::restore_interactive;

/// Actuator, sensor and clock for one process.
pub struct Rig {
    pub actuator: Box<dyn Actuator>,
    pub sensor: Box<dyn VoltageSensor>,
    pub clock: Box<dyn Clock + Send + Sync>,
}

fn env_flag(name: &str) -> bool {
    std::env::var(name).is_ok_and(|v| v.trim() == "1")
}

fn env_f64(name: &str) -> eyre::Result<Option<f64>> {
    match std::env::var(name) {
        Ok(v) => v
            .trim()
            .parse::<f64>()
            .map(Some)
            .map_err(|e| eyre::eyre!("{name}={v:?}: {e}")),
        Err(_) => Ok(None),
    }
}

/// Simulated panel. `TRACKER_SIM_SUN_AZ`/`TRACKER_SIM_SUN_EL` place the sun,
/// `TRACKER_SIM_NO_SENSOR=1` unplugs the ADC and `TRACKER_SIM_REALTIME=1`
/// makes moves and reads take wall-clock time.
fn sim_rig(cfg: &tracker_config::Config) -> eyre::Result<Rig> {
    let mut model = PanelModel::default();
    model.yaw_revolution_s = cfg.yaw.revolution_s;
    model.pitch_revolution_s = cfg.pitch.revolution_s;
    model.calibration = SimCalibration {
        reference_volts: cfg.sampler.reference_volts,
        max_raw: cfg.sampler.max_raw,
        divider_factor: cfg.sampler.divider_factor,
    };
    if let Some(az) = env_f64("TRACKER_SIM_SUN_AZ")? {
        model.sun_azimuth_deg = az;
    }
    if let Some(el) = env_f64("TRACKER_SIM_SUN_EL")? {
        model.sun_elevation_deg = el;
    }
    tracing::info!(
        sun_azimuth_deg = model.sun_azimuth_deg,
        sun_elevation_deg = model.sun_elevation_deg,
        "using simulated rig"
    );

    let (shared, clock): (Arc<dyn Clock + Send + Sync>, Box<dyn Clock + Send + Sync>) =
        if env_flag("TRACKER_SIM_REALTIME") {
            (Arc::new(MonotonicClock::new()), Box::new(MonotonicClock::new()))
        } else {
            let c = VirtualClock::new();
            (Arc::new(c.clone()), Box::new(c))
        };
    let panel = SimulatedPanel::new(model, shared);
    let sensor = if env_flag("TRACKER_SIM_NO_SENSOR") {
        panel.missing_sensor()
    } else {
        panel.sensor()
    };
    Ok(Rig {
        actuator: Box::new(panel.actuator()),
        sensor: Box::new(sensor),
        clock,
    })
}

#[cfg(all(feature = "hardware", target_os = "linux"))]
fn hardware_rig(cfg: &tracker_config::Config) -> eyre::Result<Rig> {
    use tracker_hardware::{Ads7830, GpioActuator, MotorPins};

    let p = &cfg.pins;
    let actuator = GpioActuator::new(
        MotorPins {
            in1: p.yaw_in1,
            in2: p.yaw_in2,
            enable: p.yaw_enable,
        },
        cfg.yaw.duty_cycle_pct,
        MotorPins {
            in1: p.pitch_in1,
            in2: p.pitch_in2,
            enable: p.pitch_enable,
        },
        cfg.pitch.duty_cycle_pct,
        cfg.hardware.pwm_frequency_hz,
    )
    .map_err(|e| eyre::Report::new(TrackerError::Hardware(e.to_string())))
    .wrap_err("initializing motor outputs")?;
    let sensor = Ads7830::new(cfg.adc.i2c_address, cfg.adc.channel)
        .map_err(|e| eyre::Report::new(TrackerError::SensorNotDetected(e.to_string())))?;
    Ok(Rig {
        actuator: Box::new(actuator),
        sensor: Box::new(sensor),
        clock: Box::new(MonotonicClock::new()),
    })
}

/// Real hardware when built with `hardware` on Linux (unless `TRACKER_SIM=1`),
/// the simulator otherwise.
pub fn make_rig(cfg: &tracker_config::Config) -> eyre::Result<Rig> {
    #[cfg(all(feature = "hardware", target_os = "linux"))]
    {
        if !env_flag("TRACKER_SIM") {
            return hardware_rig(cfg);
        }
    }
    sim_rig(cfg)
}

/// Engine config with CLI overrides applied. `--cycles 0` means unbounded.
pub fn tracker_cfg(
    cfg: &tracker_config::Config,
    cycles: Option<u32>,
    rest_ms: Option<u64>,
) -> TrackerCfg {
    let mut tc = TrackerCfg::from(cfg);
    if let Some(n) = cycles {
        tc.cycle.max_cycles = (n > 0).then_some(n);
    }
    if let Some(ms) = rest_ms {
        tc.cycle.rest_interval_ms = ms;
    }
    tc
}

fn build(
    cfg: &tracker_config::Config,
    tc: TrackerCfg,
    with_store: bool,
    shutdown: ShutdownSignal,
) -> eyre::Result<Tracker> {
    let rig = make_rig(cfg)?;
    let mut builder = Tracker::builder()
        .with_actuator(rig.actuator)
        .with_sensor(rig.sensor)
        .with_config(tc)
        .with_clock(rig.clock)
        .with_shutdown(shutdown);
    if with_store {
        builder = builder.with_store(FilePositionStore::new(&cfg.store.path));
    }
    builder.build()
}

/// Ctrl-C requests a clean stop after the current move.
fn install_interrupt(signal: &ShutdownSignal) -> eyre::Result<()> {
    let s = signal.clone();
    ctrlc::set_handler(move || {
        tracing::warn!("interrupt received; stopping after the current move");
        s.trigger();
    })
    .wrap_err("installing Ctrl-C handler")
}

/// Combine a session result with its shutdown; the first error wins.
fn finish<T>(
    result: eyre::Result<T>,
    down: eyre::Result<PositionReport>,
) -> eyre::Result<(T, PositionReport)> {
    match (result, down) {
        (Ok(v), Ok(report)) => Ok((v, report)),
        (Err(e), Ok(_)) | (Ok(_), Err(e)) => Err(e),
        (Err(e), Err(d)) => {
            tracing::error!(error = %d, "shutdown failed after error");
            Err(e)
        }
    }
}

fn position_json(r: &PositionReport) -> serde_json::Value {
    serde_json::json!({
        "yaw_s": r.yaw_s,
        "yaw_deg": r.yaw_deg,
        "pitch_s": r.pitch_s,
        "pitch_deg": r.pitch_deg,
    })
}

fn stop_name(stop: StopReason) -> &'static str {
    match stop {
        StopReason::Interrupted => "interrupted",
        StopReason::CycleLimit => "cycle_limit",
    }
}

fn apply_restore(tracker: &mut Tracker, mode: RestoreMode) -> eyre::Result<()> {
    match mode {
        RestoreMode::Yes => {
            if tracker.restore_saved()? == RestoreOutcome::StoreMissing {
                tracing::warn!("continuing with the current position as origin");
            }
        }
        RestoreMode::No => tracing::info!("restore skipped; current position is origin"),
        RestoreMode::Ask => {
            // Prompt on stderr so stdout stays machine-readable
            let stdin = io::stdin();
            let mut input = stdin.lock();
            let mut out = io::stderr();
            restore_interactive(tracker, &mut input, &mut out)?;
        }
    }
    Ok(())
}

fn session(tracker: &mut Tracker, restore: RestoreMode) -> eyre::Result<RunSummary> {
    tracker.probe()?;
    apply_restore(tracker, restore)?;
    tracker.prepare()?;
    tracker.run()
}

pub fn cmd_run(
    cfg: &tracker_config::Config,
    restore: RestoreMode,
    cycles: Option<u32>,
    rest_ms: Option<u64>,
    json: bool,
) -> eyre::Result<()> {
    let shutdown = ShutdownSignal::new();
    install_interrupt(&shutdown)?;
    let mut tracker = build(cfg, tracker_cfg(cfg, cycles, rest_ms), true, shutdown)?;
    let result = session(&mut tracker, restore);
    let down = tracker.shutdown();
    let (summary, report) = finish(result, down)?;

    if json {
        let last = summary.last.map(|c| {
            serde_json::json!({
                "cycle": c.cycle,
                "yaw_deg": c.yaw_deg,
                "pitch_deg": c.pitch_deg,
                "volts": c.volts,
            })
        });
        println!(
            "{}",
            serde_json::json!({
                "cycles": summary.cycles,
                "stop": stop_name(summary.stop),
                "last": last,
                "position": position_json(&report),
            })
        );
    } else {
        println!(
            "Stopped after {} cycle(s) ({})",
            summary.cycles,
            stop_name(summary.stop).replace('_', " ")
        );
        if let Some(last) = summary.last {
            println!("Last {last}");
        }
        println!("Final position: {report}");
    }
    Ok(())
}

pub fn cmd_measure(cfg: &tracker_config::Config, count: u32, json: bool) -> eyre::Result<()> {
    let mut tracker = build(cfg, TrackerCfg::from(cfg), false, ShutdownSignal::new())?;
    let result = (|| -> eyre::Result<Vec<_>> {
        tracker.probe()?;
        (0..count).map(|_| tracker.sample()).collect()
    })();
    let down = tracker.shutdown();
    let (samples, _) = finish(result, down)?;

    for (i, s) in samples.iter().enumerate() {
        if json {
            println!(
                "{}",
                serde_json::json!({ "sample": i + 1, "volts": s.volts, "raw": s.raw })
            );
        } else {
            println!("sample {}: {:.3} V (raw {:.1})", i + 1, s.volts, s.raw);
        }
    }
    Ok(())
}

pub fn cmd_report(cfg: &tracker_config::Config, json: bool) -> eyre::Result<()> {
    let mut store = FilePositionStore::new(&cfg.store.path);
    let saved = store
        .load()
        .map_err(|e| match e.downcast::<TrackerError>() {
            Ok(t) => eyre::Report::new(*t),
            Err(e) => eyre::Report::new(TrackerError::Store(e.to_string())),
        })
        .wrap_err_with(|| format!("reading {}", cfg.store.path))?;

    match saved {
        Some(pos) => {
            let report = PositionReport::from_saved(pos, cfg.yaw.revolution_s, cfg.pitch.revolution_s);
            if json {
                println!("{}", serde_json::json!({ "position": position_json(&report) }));
            } else {
                println!("Saved position: {report}");
            }
        }
        None => {
            if json {
                println!("{}", serde_json::json!({ "position": null }));
            } else {
                println!("no saved position in {}", cfg.store.path);
            }
        }
    }
    Ok(())
}

pub fn cmd_home(cfg: &tracker_config::Config, json: bool) -> eyre::Result<()> {
    let shutdown = ShutdownSignal::new();
    install_interrupt(&shutdown)?;
    let mut tracker = build(cfg, TrackerCfg::from(cfg), true, shutdown)?;
    let result = tracker.probe().and_then(|()| tracker.home());
    let down = tracker.shutdown();
    let (outcome, report) = finish(result, down)?;

    let restored = matches!(outcome, RestoreOutcome::Restored(_));
    if json {
        println!(
            "{}",
            serde_json::json!({ "restored": restored, "position": position_json(&report) })
        );
    } else if restored {
        println!("Returned to origin. Final position: {report}");
    } else {
        println!("No saved position; current position kept as origin.");
    }
    Ok(())
}

pub fn cmd_self_check(cfg: &tracker_config::Config, json: bool) -> eyre::Result<()> {
    let mut tracker = build(cfg, TrackerCfg::from(cfg), false, ShutdownSignal::new())?;
    let result = tracker.probe().and_then(|()| tracker.sample());
    let down = tracker.shutdown();
    let (sample, _) = finish(result, down)?;

    if json {
        println!(
            "{}",
            serde_json::json!({ "ok": true, "volts": sample.volts, "raw": sample.raw })
        );
    } else {
        println!("self-check ok: sensor responding, {:.3} V", sample.volts);
    }
    Ok(())
}
