//! The tracker session: startup workflow, optimization cycles, shutdown.

use std::sync::Arc;
use std::time::Duration;

use eyre::WrapErr;
use tracker_traits::clock::Clock;
use tracker_traits::{Actuator, Axis, Direction, PositionStore, SavedPosition, VoltageSensor};

use crate::builder::{Missing, TrackerBuilder};
use crate::config::TrackerCfg;
use crate::error::{Result, TrackerError};
use crate::executor::MoveExecutor;
use crate::hill_climb::{HillClimbController, SearchOutcome};
use crate::orienter::{TriSampleOrienter, TriSamplePick};
use crate::shutdown::ShutdownSignal;
use crate::status::{CycleReport, PositionReport, RunSummary, StopReason};
use crate::voltage::{VoltageSample, VoltageSampler};

/// What `Tracker::restore_saved` found.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum RestoreOutcome {
    /// The record was loaded and both axes returned to origin from it.
    Restored(SavedPosition),
    /// No store configured or nothing saved yet.
    StoreMissing,
}

/// Dynamic tracker over boxed collaborators.
pub struct Tracker {
    exec: MoveExecutor<Box<dyn Actuator>>,
    sampler: VoltageSampler<Box<dyn VoltageSensor>>,
    store: Option<Box<dyn PositionStore>>,
    cfg: TrackerCfg,
    clock: Arc<dyn Clock + Send + Sync>,
    shutdown: ShutdownSignal,
    yaw: HillClimbController,
    pitch: HillClimbController,
    orienter: TriSampleOrienter,
    sensor_ok: bool,
}

impl core::fmt::Debug for Tracker {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("Tracker")
            .field("exec", &self.exec)
            .field("sampler", &self.sampler)
            .field("has_store", &self.store.is_some())
            .field("sensor_ok", &self.sensor_ok)
            .finish()
    }
}

impl Tracker {
    /// Start building a Tracker.
    pub fn builder() -> TrackerBuilder<Missing, Missing> {
        TrackerBuilder::default()
    }

    pub(crate) fn from_parts(
        actuator: Box<dyn Actuator>,
        sensor: Box<dyn VoltageSensor>,
        store: Option<Box<dyn PositionStore>>,
        cfg: TrackerCfg,
        clock: Arc<dyn Clock + Send + Sync>,
        shutdown: ShutdownSignal,
    ) -> Self {
        let exec = MoveExecutor::new(actuator, cfg.yaw.revolution_s, cfg.pitch.revolution_s);
        let sampler = VoltageSampler::new(sensor, cfg.sampler.clone(), Arc::clone(&clock));
        let yaw = HillClimbController::new(Axis::Yaw, &cfg.yaw, &cfg.search, shutdown.clone());
        let pitch =
            HillClimbController::new(Axis::Pitch, &cfg.pitch, &cfg.search, shutdown.clone());
        Self {
            exec,
            sampler,
            store,
            cfg,
            clock,
            shutdown,
            yaw,
            pitch,
            orienter: TriSampleOrienter::new(),
            sensor_ok: false,
        }
    }

    pub fn cfg(&self) -> &TrackerCfg {
        &self.cfg
    }

    pub fn shutdown_signal(&self) -> ShutdownSignal {
        self.shutdown.clone()
    }

    pub fn positions(&self) -> SavedPosition {
        self.exec.positions()
    }

    pub fn report(&self) -> PositionReport {
        PositionReport::from_saved(
            self.exec.positions(),
            self.cfg.yaw.revolution_s,
            self.cfg.pitch.revolution_s,
        )
    }

    /// Verify the voltage sensor answers. Nothing may move until this passed.
    pub fn probe(&mut self) -> Result<()> {
        self.sampler.probe()?;
        self.sensor_ok = true;
        Ok(())
    }

    fn require_sensor(&self) -> Result<()> {
        if self.sensor_ok {
            Ok(())
        } else {
            Err(eyre::Report::new(TrackerError::State(
                "voltage sensor has not been probed".into(),
            )))
        }
    }

    pub fn sample(&mut self) -> Result<VoltageSample> {
        self.sampler.sample()
    }

    fn load_saved(&mut self) -> Result<Option<SavedPosition>> {
        let Some(store) = self.store.as_mut() else {
            return Ok(None);
        };
        store
            .load()
            .map_err(|e| match e.downcast::<TrackerError>() {
                Ok(t) => eyre::Report::new(*t),
                Err(e) => eyre::Report::new(TrackerError::Store(e.to_string())),
            })
            .wrap_err("loading saved position")
    }

    /// Load the checkpoint into both axes and drive them back to origin.
    pub fn restore_saved(&mut self) -> Result<RestoreOutcome> {
        self.require_sensor()?;
        match self.load_saved()? {
            Some(saved) => {
                tracing::info!(yaw_s = saved.yaw_s, pitch_s = saved.pitch_s, "restoring saved position");
                self.exec.restore(saved);
                self.return_to_origin()?;
                Ok(RestoreOutcome::Restored(saved))
            }
            None => {
                tracing::warn!("no saved position found");
                Ok(RestoreOutcome::StoreMissing)
            }
        }
    }

    /// Yaw then pitch back to zero.
    pub fn return_to_origin(&mut self) -> Result<()> {
        self.require_sensor()?;
        for axis in Axis::ALL {
            self.exec.return_to_origin(axis)?;
        }
        Ok(())
    }

    /// Samples taken before anything moves so the operator can check the
    /// sensor reacts (e.g. by shading the cell).
    pub fn test_measurements(&mut self) -> Result<Vec<f64>> {
        let n = self.cfg.startup.test_measurements;
        let gap = Duration::from_millis(self.cfg.startup.test_gap_ms);
        let mut out = Vec::with_capacity(n as usize);
        for i in 0..n {
            let s = self.sampler.sample()?;
            tracing::info!(measurement = i + 1, of = n, volts = s.volts, "test measurement");
            out.push(s.volts);
            if i + 1 < n {
                self.clock.sleep(gap);
            }
        }
        Ok(out)
    }

    /// Tilt pitch by `startup.initial_pitch_deg` before the first yaw sweep.
    pub fn tilt_initial_pitch(&mut self) -> Result<()> {
        self.require_sensor()?;
        let deg = self.cfg.startup.initial_pitch_deg;
        let direction = if deg < 0.0 {
            Direction::Reverse
        } else {
            Direction::Forward
        };
        let d = self.exec.tracker(Axis::Pitch).duration_for_degrees(deg);
        tracing::info!(degrees = deg, "initial pitch tilt");
        self.exec.execute(Axis::Pitch, direction, d)?;
        Ok(())
    }

    /// Tri-sample yaw orientation; `None` when disabled.
    pub fn orient(&mut self) -> Result<Option<TriSamplePick>> {
        self.require_sensor()?;
        if !self.cfg.startup.tri_sample {
            return Ok(None);
        }
        let (_, pick) = self.orienter.orient(&mut self.exec, &mut self.sampler)?;
        Ok(Some(pick))
    }

    /// Everything after probe and restore: test samples, tilt, orientation.
    pub fn prepare(&mut self) -> Result<PositionReport> {
        self.require_sensor()?;
        self.test_measurements()?;
        if self.shutdown.is_triggered() {
            return Ok(self.report());
        }
        self.tilt_initial_pitch()?;
        if self.shutdown.is_triggered() {
            return Ok(self.report());
        }
        self.orient()?;
        let report = self.report();
        tracing::info!(%report, "startup complete");
        Ok(report)
    }

    /// Probe, optionally restore, then prepare.
    pub fn start(&mut self, restore: bool) -> Result<PositionReport> {
        self.probe()?;
        if restore && self.restore_saved()? == RestoreOutcome::StoreMissing {
            tracing::warn!("continuing with the current position as origin");
        }
        self.prepare()
    }

    /// Yaw pass then pitch pass. `None` if interrupted.
    pub fn run_cycle(&mut self, cycle: u32) -> Result<Option<CycleReport>> {
        self.require_sensor()?;
        tracing::info!(cycle, "cycle start");
        let yaw = self.yaw.run(&mut self.exec, &mut self.sampler)?;
        if matches!(yaw, SearchOutcome::Interrupted { .. }) {
            return Ok(None);
        }
        let pitch = self.pitch.run(&mut self.exec, &mut self.sampler)?;
        let volts = match pitch {
            SearchOutcome::Interrupted { .. } => return Ok(None),
            SearchOutcome::Converged { volts, .. } => volts,
            SearchOutcome::Exhausted { .. } => self.sampler.sample()?.volts,
        };
        let report = CycleReport {
            cycle,
            yaw_deg: self.exec.tracker(Axis::Yaw).degrees(),
            pitch_deg: self.exec.tracker(Axis::Pitch).degrees(),
            volts,
        };
        tracing::info!(
            cycle,
            yaw_deg = report.yaw_deg,
            pitch_deg = report.pitch_deg,
            volts,
            "cycle complete"
        );
        Ok(Some(report))
    }

    /// Wait out the rest interval in countdown chunks. `true` if shutdown
    /// was requested meanwhile.
    pub fn rest(&self) -> bool {
        let every = self.cfg.cycle.countdown_log_every_ms.max(1);
        let mut remaining = self.cfg.cycle.rest_interval_ms;
        while remaining > 0 {
            tracing::info!(remaining_ms = remaining, "next cycle in");
            let chunk = remaining.min(every);
            if self.shutdown.wait_for(Duration::from_millis(chunk)) {
                return true;
            }
            remaining -= chunk;
        }
        self.shutdown.is_triggered()
    }

    /// Repeat cycles until shutdown or `cycle.max_cycles`.
    pub fn run(&mut self) -> Result<RunSummary> {
        let mut cycles = 0u32;
        let mut last = None;
        loop {
            if self.shutdown.is_triggered() {
                return Ok(RunSummary {
                    cycles,
                    stop: StopReason::Interrupted,
                    last,
                });
            }
            let Some(report) = self.run_cycle(cycles + 1)? else {
                return Ok(RunSummary {
                    cycles,
                    stop: StopReason::Interrupted,
                    last,
                });
            };
            cycles += 1;
            last = Some(report);
            if self.cfg.cycle.max_cycles.is_some_and(|max| cycles >= max) {
                return Ok(RunSummary {
                    cycles,
                    stop: StopReason::CycleLimit,
                    last,
                });
            }
            if self.rest() {
                return Ok(RunSummary {
                    cycles,
                    stop: StopReason::Interrupted,
                    last,
                });
            }
        }
    }

    /// Idle both axes, save positions, release the actuator.
    ///
    /// Every step is attempted. Saving is skipped when the sensor never
    /// probed, so an aborted start cannot overwrite a good checkpoint with
    /// zeros. Save failures are logged only.
    pub fn shutdown(&mut self) -> Result<PositionReport> {
        tracing::info!("shutting down");
        let idle = self.exec.idle_all();
        if self.sensor_ok {
            let pos = self.exec.positions();
            if let Some(store) = self.store.as_mut() {
                match store.save(pos) {
                    Ok(()) => tracing::info!(yaw_s = pos.yaw_s, pitch_s = pos.pitch_s, "position saved"),
                    Err(e) => tracing::error!(error = %e, "failed to save position"),
                }
            }
        }
        let release = self.exec.release();
        idle?;
        release?;
        let report = self.report();
        tracing::info!(%report, "final position");
        Ok(report)
    }

    /// Restore the checkpoint (if any), return to origin and persist zeros.
    pub fn home(&mut self) -> Result<RestoreOutcome> {
        let outcome = self.restore_saved()?;
        if outcome == RestoreOutcome::StoreMissing {
            self.return_to_origin()?;
        }
        Ok(outcome)
    }
}

/// Full session: start, run, and always shut down.
///
/// The first error wins; a shutdown error is only logged when the session
/// itself already failed.
pub fn run_session(tracker: &mut Tracker, restore: bool) -> Result<RunSummary> {
    let result = tracker.start(restore).and_then(|_| tracker.run());
    let down = tracker.shutdown();
    match (result, down) {
        (Ok(summary), Ok(_)) => Ok(summary),
        (Ok(_), Err(e)) => Err(e),
        (Err(e), Ok(_)) => Err(e),
        (Err(e), Err(d)) => {
            tracing::error!(error = %d, "shutdown failed after error");
            Err(e)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mocks::{MemoryStore, RecordingActuator, ScriptedSensor};
    use tracker_traits::VirtualClock;

    fn quick_cfg() -> TrackerCfg {
        let mut cfg = TrackerCfg::default();
        cfg.sampler.reads = 1;
        cfg.sampler.read_interval_ms = 0;
        cfg.startup.test_measurements = 2;
        cfg.startup.test_gap_ms = 5_000;
        cfg.cycle.rest_interval_ms = 0;
        cfg
    }

    #[test]
    fn probe_failure_moves_nothing_and_saves_nothing() {
        let act = RecordingActuator::new();
        let log = act.log();
        let store = MemoryStore::with(SavedPosition {
            yaw_s: 1.0,
            pitch_s: 2.0,
        });
        let mut t = Tracker::builder()
            .with_actuator(act)
            .with_sensor(ScriptedSensor::undetected())
            .with_store(store.clone())
            .with_config(quick_cfg())
            .with_clock(Box::new(VirtualClock::new()))
            .build()
            .unwrap();

        let err = run_session(&mut t, true).unwrap_err();
        assert!(matches!(
            err.downcast_ref::<TrackerError>(),
            Some(TrackerError::SensorNotDetected(_))
        ));
        assert!(log.moves().is_empty());
        assert_eq!(log.idled(), vec![Axis::Yaw, Axis::Pitch]);
        assert!(log.released());
        assert_eq!(store.save_count(), 0);
    }

    #[test]
    fn test_measurements_wait_between_samples_only() {
        let clock = VirtualClock::new();
        let mut t = Tracker::builder()
            .with_actuator(RecordingActuator::new())
            .with_sensor(ScriptedSensor::new([100]))
            .with_config(quick_cfg())
            .with_clock(Box::new(clock.clone()))
            .build()
            .unwrap();
        t.probe().unwrap();
        let v = t.test_measurements().unwrap();
        assert_eq!(v.len(), 2);
        assert_eq!(clock.elapsed(), Duration::from_secs(5));
    }

    #[test]
    fn restore_loads_then_returns_to_origin() {
        let act = RecordingActuator::new();
        let log = act.log();
        let store = MemoryStore::with(SavedPosition {
            yaw_s: 3.0,
            pitch_s: -2.0,
        });
        let mut t = Tracker::builder()
            .with_actuator(act)
            .with_sensor(ScriptedSensor::new([100]))
            .with_store(store)
            .with_config(quick_cfg())
            .with_clock(Box::new(VirtualClock::new()))
            .build()
            .unwrap();
        t.probe().unwrap();

        let out = t.restore_saved().unwrap();
        assert!(matches!(out, RestoreOutcome::Restored(_)));
        let moves = log.moves();
        assert_eq!(moves.len(), 2);
        assert_eq!((moves[0].axis, moves[0].direction), (Axis::Yaw, Direction::Reverse));
        assert_eq!((moves[1].axis, moves[1].direction), (Axis::Pitch, Direction::Forward));
        assert_eq!(t.positions(), SavedPosition::default());
    }

    #[test]
    fn restore_without_store_reports_missing() {
        let mut t = Tracker::builder()
            .with_actuator(RecordingActuator::new())
            .with_sensor(ScriptedSensor::new([100]))
            .with_config(quick_cfg())
            .with_clock(Box::new(VirtualClock::new()))
            .build()
            .unwrap();
        t.probe().unwrap();
        assert_eq!(t.restore_saved().unwrap(), RestoreOutcome::StoreMissing);
    }

    #[test]
    fn moving_before_probe_is_a_state_error() {
        let mut t = Tracker::builder()
            .with_actuator(RecordingActuator::new())
            .with_sensor(ScriptedSensor::new([100]))
            .with_config(quick_cfg())
            .build()
            .unwrap();
        let err = t.run_cycle(1).unwrap_err();
        assert!(matches!(
            err.downcast_ref::<TrackerError>(),
            Some(TrackerError::State(_))
        ));
    }

    #[test]
    fn initial_tilt_before_sensor_check_moves_nothing() {
        let act = RecordingActuator::new();
        let log = act.log();
        let mut t = Tracker::builder()
            .with_actuator(act)
            .with_sensor(ScriptedSensor::new([100]))
            .with_config(quick_cfg())
            .build()
            .unwrap();
        let err = t.tilt_initial_pitch().unwrap_err();
        assert!(matches!(
            err.downcast_ref::<TrackerError>(),
            Some(TrackerError::State(_))
        ));
        assert!(log.moves().is_empty());
    }

    #[test]
    fn initial_tilt_is_an_eighth_of_a_pitch_turn() {
        let act = RecordingActuator::new();
        let log = act.log();
        let mut t = Tracker::builder()
            .with_actuator(act)
            .with_sensor(ScriptedSensor::new([100]))
            .with_config(quick_cfg())
            .build()
            .unwrap();
        t.probe().unwrap();
        t.tilt_initial_pitch().unwrap();
        let m = log.moves_on(Axis::Pitch);
        assert_eq!(m.len(), 1);
        assert_eq!(m[0].direction, Direction::Forward);
        assert!((m[0].duration.as_secs_f64() - 127.44 / 8.0).abs() < 1e-6);
    }

    #[test]
    fn rest_returns_immediately_when_triggered() {
        let mut cfg = quick_cfg();
        cfg.cycle.rest_interval_ms = 60_000;
        let t = Tracker::builder()
            .with_actuator(RecordingActuator::new())
            .with_sensor(ScriptedSensor::new([100]))
            .with_config(cfg)
            .build()
            .unwrap();
        t.shutdown_signal().trigger();
        assert!(t.rest());
    }
}
