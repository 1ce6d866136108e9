//! Simulated rig: a panel under a fixed sun.
//!
//! The actuator and sensor share one `PanelModel`, so motion changes what the
//! sensor reads. Pitch is measured from the zenith: at 0° the cell faces
//! straight up.

use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;

use tracker_traits::clock::Clock;
use tracker_traits::{Actuator, Axis, Direction, VoltageSensor};

use crate::error::HwError;

/// ADC calibration needed to turn panel volts back into raw counts.
#[derive(Debug, Clone, Copy)]
pub struct SimCalibration {
    pub reference_volts: f64,
    pub max_raw: u16,
    pub divider_factor: f64,
}

impl Default for SimCalibration {
    fn default() -> Self {
        Self {
            reference_volts: 3.3,
            max_raw: 255,
            divider_factor: 5.6,
        }
    }
}

#[derive(Debug, Clone)]
pub struct PanelModel {
    pub yaw_deg: f64,
    pub pitch_deg: f64,
    pub yaw_revolution_s: f64,
    pub pitch_revolution_s: f64,
    pub sun_azimuth_deg: f64,
    pub sun_elevation_deg: f64,
    /// Panel volts when facing the sun head-on.
    pub peak_volts: f64,
    pub calibration: SimCalibration,
}

impl Default for PanelModel {
    fn default() -> Self {
        Self {
            yaw_deg: 0.0,
            pitch_deg: 0.0,
            yaw_revolution_s: 18.63,
            pitch_revolution_s: 127.44,
            sun_azimuth_deg: 120.0,
            sun_elevation_deg: 40.0,
            peak_volts: 15.0,
            calibration: SimCalibration::default(),
        }
    }
}

impl PanelModel {
    /// Apply actuation time to the true pose.
    pub fn advance(&mut self, axis: Axis, direction: Direction, duration: Duration) {
        let secs = f64::from(direction.sign()) * duration.as_secs_f64();
        match axis {
            Axis::Yaw => self.yaw_deg += secs * 360.0 / self.yaw_revolution_s,
            Axis::Pitch => self.pitch_deg += secs * 360.0 / self.pitch_revolution_s,
        }
    }

    /// Cosine of the angle between the panel normal and the sun.
    pub fn incidence(&self) -> f64 {
        let (yaw, pitch) = (self.yaw_deg.to_radians(), self.pitch_deg.to_radians());
        let (az, el) = (
            self.sun_azimuth_deg.to_radians(),
            self.sun_elevation_deg.to_radians(),
        );
        let n = [pitch.sin() * yaw.cos(), pitch.sin() * yaw.sin(), pitch.cos()];
        let s = [el.cos() * az.cos(), el.cos() * az.sin(), el.sin()];
        n[0] * s[0] + n[1] * s[1] + n[2] * s[2]
    }

    pub fn panel_volts(&self) -> f64 {
        self.peak_volts * self.incidence().max(0.0)
    }

    /// Panel volts as the ADC would report them.
    pub fn raw(&self) -> u16 {
        let c = &self.calibration;
        let raw = self.panel_volts() / c.divider_factor / c.reference_volts * f64::from(c.max_raw);
        raw.round().clamp(0.0, f64::from(c.max_raw)) as u16
    }
}

fn lock(m: &Mutex<PanelModel>) -> MutexGuard<'_, PanelModel> {
    m.lock().unwrap_or_else(std::sync::PoisonError::into_inner)
}

/// Factory for a matching actuator/sensor pair.
#[derive(Clone)]
pub struct SimulatedPanel {
    model: Arc<Mutex<PanelModel>>,
    clock: Arc<dyn Clock + Send + Sync>,
}

impl core::fmt::Debug for SimulatedPanel {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("SimulatedPanel")
            .field("model", &*lock(&self.model))
            .finish()
    }
}

impl SimulatedPanel {
    pub fn new(model: PanelModel, clock: Arc<dyn Clock + Send + Sync>) -> Self {
        Self {
            model: Arc::new(Mutex::new(model)),
            clock,
        }
    }

    pub fn actuator(&self) -> SimulatedActuator {
        SimulatedActuator {
            model: Arc::clone(&self.model),
            clock: Arc::clone(&self.clock),
        }
    }

    pub fn sensor(&self) -> SimulatedSensor {
        SimulatedSensor {
            model: Arc::clone(&self.model),
            detected: true,
        }
    }

    /// Sensor whose probe fails, as with an unplugged ADC.
    pub fn missing_sensor(&self) -> SimulatedSensor {
        SimulatedSensor {
            model: Arc::clone(&self.model),
            detected: false,
        }
    }

    pub fn snapshot(&self) -> PanelModel {
        lock(&self.model).clone()
    }
}

pub struct SimulatedActuator {
    model: Arc<Mutex<PanelModel>>,
    clock: Arc<dyn Clock + Send + Sync>,
}

impl Actuator for SimulatedActuator {
    fn drive(
        &mut self,
        axis: Axis,
        direction: Direction,
        duration: Duration,
    ) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
        if duration.is_zero() {
            return Ok(());
        }
        self.clock.sleep(duration);
        lock(&self.model).advance(axis, direction, duration);
        tracing::trace!(%axis, %direction, secs = duration.as_secs_f64(), "sim drive");
        Ok(())
    }

    fn idle(&mut self, axis: Axis) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
        tracing::trace!(%axis, "sim idle");
        Ok(())
    }
}

pub struct SimulatedSensor {
    model: Arc<Mutex<PanelModel>>,
    detected: bool,
}

impl VoltageSensor for SimulatedSensor {
    fn probe(&mut self) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
        if self.detected {
            Ok(())
        } else {
            Err(Box::new(HwError::NotDetected { address: 0x4b }))
        }
    }

    fn read_raw(&mut self) -> Result<u16, Box<dyn std::error::Error + Send + Sync>> {
        if !self.detected {
            return Err(Box::new(HwError::NotDetected { address: 0x4b }));
        }
        Ok(lock(&self.model).raw())
    }
}
