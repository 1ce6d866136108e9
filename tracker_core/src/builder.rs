//! Type-state builder for `Tracker` and generic `build_tracker` constructor.
//!
//! The builder enforces at compile time that an Actuator and a VoltageSensor
//! are provided before `build()` is available. `try_build()` is always
//! available for dynamic checks.

use std::marker::PhantomData;
use std::sync::Arc;

use tracker_traits::clock::{Clock, MonotonicClock};
use tracker_traits::{Actuator, PositionStore, VoltageSensor};

use crate::config::{AxisCfg, TrackerCfg};
use crate::error::{BuildError, Result};
use crate::runner::Tracker;
use crate::shutdown::ShutdownSignal;

// ── Type-state markers ───────────────────────────────────────────────────────

pub struct Missing;
pub struct Set;

/// Builder for `Tracker`. The configuration is validated on `build()`.
pub struct TrackerBuilder<A, S> {
    actuator: Option<Box<dyn Actuator>>,
    sensor: Option<Box<dyn VoltageSensor>>,
    store: Option<Box<dyn PositionStore>>,
    cfg: Option<TrackerCfg>,
    clock: Option<Box<dyn Clock + Send + Sync>>,
    shutdown: Option<ShutdownSignal>,
    _a: PhantomData<A>,
    _s: PhantomData<S>,
}

impl Default for TrackerBuilder<Missing, Missing> {
    fn default() -> Self {
        Self {
            actuator: None,
            sensor: None,
            store: None,
            cfg: None,
            clock: None,
            shutdown: None,
            _a: PhantomData,
            _s: PhantomData,
        }
    }
}

fn check_axis(axis: &AxisCfg) -> std::result::Result<(), BuildError> {
    if !(axis.revolution_s.is_finite() && axis.revolution_s > 0.0) {
        return Err(BuildError::InvalidConfig("revolution_s must be > 0"));
    }
    if !(axis.coarse_deg.is_finite() && axis.coarse_deg > 0.0)
        || !(axis.fine_deg.is_finite() && axis.fine_deg > 0.0)
    {
        return Err(BuildError::InvalidConfig("step degrees must be > 0"));
    }
    if axis.fine_deg > axis.coarse_deg {
        return Err(BuildError::InvalidConfig("fine_deg must be <= coarse_deg"));
    }
    Ok(())
}

/// Validate configuration and assemble a `Tracker`.
///
/// Shared by `TrackerBuilder::try_build()` and `build_tracker()`.
fn validate_and_build(
    actuator: Box<dyn Actuator>,
    sensor: Box<dyn VoltageSensor>,
    store: Option<Box<dyn PositionStore>>,
    cfg: TrackerCfg,
    clock: Option<Box<dyn Clock + Send + Sync>>,
    shutdown: ShutdownSignal,
) -> Result<Tracker> {
    check_axis(&cfg.yaw).map_err(eyre::Report::new)?;
    check_axis(&cfg.pitch).map_err(eyre::Report::new)?;
    if cfg.sampler.reads == 0 {
        return Err(eyre::Report::new(BuildError::InvalidConfig(
            "sampler reads must be >= 1",
        )));
    }
    let cal = &cfg.sampler.calibration;
    if cal.max_raw == 0
        || !(cal.reference_volts.is_finite() && cal.reference_volts > 0.0)
        || !(cal.divider_factor.is_finite() && cal.divider_factor > 0.0)
    {
        return Err(eyre::Report::new(BuildError::InvalidConfig(
            "voltage calibration must be positive",
        )));
    }
    if cfg.cycle.countdown_log_every_ms == 0 {
        return Err(eyre::Report::new(BuildError::InvalidConfig(
            "countdown_log_every_ms must be >= 1",
        )));
    }
    if !cfg.startup.initial_pitch_deg.is_finite() {
        return Err(eyre::Report::new(BuildError::InvalidConfig(
            "initial_pitch_deg must be finite",
        )));
    }

    let clock: Arc<dyn Clock + Send + Sync> = match clock {
        Some(b) => Arc::from(b),
        None => Arc::new(MonotonicClock::new()),
    };

    Ok(Tracker::from_parts(actuator, sensor, store, cfg, clock, shutdown))
}

impl<A, S> TrackerBuilder<A, S> {
    /// Fallible build available in any type-state; returns detailed error for missing pieces.
    pub fn try_build(self) -> Result<Tracker> {
        let actuator = self
            .actuator
            .ok_or_else(|| eyre::Report::new(BuildError::MissingActuator))?;
        let sensor = self
            .sensor
            .ok_or_else(|| eyre::Report::new(BuildError::MissingSensor))?;
        validate_and_build(
            actuator,
            sensor,
            self.store,
            self.cfg.unwrap_or_default(),
            self.clock,
            self.shutdown.unwrap_or_default(),
        )
    }

    pub fn with_config(mut self, cfg: TrackerCfg) -> Self {
        self.cfg = Some(cfg);
        self
    }

    pub fn with_store(mut self, store: impl PositionStore + 'static) -> Self {
        self.store = Some(Box::new(store));
        self
    }

    /// Provide a custom clock implementation; defaults to `MonotonicClock` when not provided.
    pub fn with_clock(mut self, clock: Box<dyn Clock + Send + Sync>) -> Self {
        self.clock = Some(clock);
        self
    }

    /// Share a shutdown signal with e.g. a Ctrl-C handler.
    pub fn with_shutdown(mut self, shutdown: ShutdownSignal) -> Self {
        self.shutdown = Some(shutdown);
        self
    }
}

// Setters that advance type-state
impl<S> TrackerBuilder<Missing, S> {
    pub fn with_actuator(self, actuator: impl Actuator + 'static) -> TrackerBuilder<Set, S> {
        TrackerBuilder {
            actuator: Some(Box::new(actuator)),
            sensor: self.sensor,
            store: self.store,
            cfg: self.cfg,
            clock: self.clock,
            shutdown: self.shutdown,
            _a: PhantomData,
            _s: PhantomData,
        }
    }
}

impl<A> TrackerBuilder<A, Missing> {
    pub fn with_sensor(self, sensor: impl VoltageSensor + 'static) -> TrackerBuilder<A, Set> {
        TrackerBuilder {
            actuator: self.actuator,
            sensor: Some(Box::new(sensor)),
            store: self.store,
            cfg: self.cfg,
            clock: self.clock,
            shutdown: self.shutdown,
            _a: PhantomData,
            _s: PhantomData,
        }
    }
}

impl TrackerBuilder<Set, Set> {
    pub fn build(self) -> Result<Tracker> {
        self.try_build()
    }
}

/// Build a `Tracker` from concrete collaborators without the builder.
pub fn build_tracker<A, S>(
    actuator: A,
    sensor: S,
    store: Option<Box<dyn PositionStore>>,
    cfg: TrackerCfg,
    clock: Option<Box<dyn Clock + Send + Sync>>,
    shutdown: ShutdownSignal,
) -> Result<Tracker>
where
    A: Actuator + 'static,
    S: VoltageSensor + 'static,
{
    validate_and_build(
        Box::new(actuator),
        Box::new(sensor),
        store,
        cfg,
        clock,
        shutdown,
    )
}
