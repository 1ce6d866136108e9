//! Averaged, calibrated panel voltage from repeated raw reads.

use std::sync::Arc;
use std::time::Duration;

use eyre::WrapErr;
use tracker_traits::VoltageSensor;
use tracker_traits::clock::Clock;

use crate::config::{Reduction, SamplerCfg};
use crate::error::{Result, TrackerError};
use crate::hw_error::map_hw_error;

/// One calibrated voltage estimate at the panel terminals.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct VoltageSample {
    pub volts: f64,
    /// Reduced raw value the estimate was computed from.
    pub raw: f64,
}

pub struct VoltageSampler<S: VoltageSensor> {
    sensor: S,
    cfg: SamplerCfg,
    clock: Arc<dyn Clock + Send + Sync>,
    buf: Vec<u16>,
}

impl<S: VoltageSensor> core::fmt::Debug for VoltageSampler<S> {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("VoltageSampler")
            .field("reads", &self.cfg.reads)
            .field("read_interval_ms", &self.cfg.read_interval_ms)
            .field("reduction", &self.cfg.reduction)
            .finish()
    }
}

impl<S: VoltageSensor> VoltageSampler<S> {
    pub fn new(sensor: S, cfg: SamplerCfg, clock: Arc<dyn Clock + Send + Sync>) -> Self {
        let cap = cfg.reads.max(1) as usize;
        Self {
            sensor,
            cfg,
            clock,
            buf: Vec::with_capacity(cap),
        }
    }

    pub fn cfg(&self) -> &SamplerCfg {
        &self.cfg
    }

    /// Check the converter is present. Any failure is reported as
    /// `SensorNotDetected`, since nothing may move without voltage feedback.
    pub fn probe(&mut self) -> Result<()> {
        self.sensor.probe().map_err(|e| {
            let mapped = match map_hw_error(&*e) {
                TrackerError::SensorNotDetected(m) => TrackerError::SensorNotDetected(m),
                other => TrackerError::SensorNotDetected(other.to_string()),
            };
            eyre::Report::new(mapped)
        })?;
        tracing::info!("voltage sensor detected");
        Ok(())
    }

    /// Take `reads` raw readings `read_interval_ms` apart and reduce them to
    /// one calibrated sample. The full read window always elapses.
    pub fn sample(&mut self) -> Result<VoltageSample> {
        let n = self.cfg.reads.max(1);
        let interval = Duration::from_millis(self.cfg.read_interval_ms);
        self.buf.clear();
        for i in 0..n {
            let raw = self
                .sensor
                .read_raw()
                .map_err(|e| eyre::Report::new(map_hw_error(&*e)))
                .wrap_err("reading voltage sensor")?;
            tracing::trace!(read = i + 1, raw, "adc read");
            self.buf.push(raw);
            self.clock.sleep(interval);
        }

        let raw = reduce(&mut self.buf, self.cfg.reduction);
        let volts = self.cfg.calibration.to_volts(raw);
        tracing::debug!(raw, volts, "voltage sample");
        Ok(VoltageSample { volts, raw })
    }
}

/// Collapse raw reads into one value. `reads` may be reordered.
fn reduce(reads: &mut [u16], reduction: Reduction) -> f64 {
    if reads.is_empty() {
        return 0.0;
    }
    match reduction {
        Reduction::Mean => {
            let sum: u64 = reads.iter().map(|&r| u64::from(r)).sum();
            sum as f64 / reads.len() as f64
        }
        Reduction::Median => {
            reads.sort_unstable();
            let mid = reads.len() / 2;
            if reads.len() % 2 == 0 {
                (f64::from(reads[mid - 1]) + f64::from(reads[mid])) / 2.0
            } else {
                f64::from(reads[mid])
            }
        }
    }
}
