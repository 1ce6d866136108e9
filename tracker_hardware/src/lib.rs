//! Device backends for the solar tracker.
//!
//! The simulator is always built. The Raspberry Pi backend (`GpioActuator`,
//! `Ads7830`) needs the `hardware` feature and Linux.
pub mod error;
pub mod sim;
pub mod util;

#[cfg(all(feature = "hardware", target_os = "linux"))]
pub mod ads7830;
#[cfg(all(feature = "hardware", target_os = "linux"))]
pub mod gpio;

pub use sim::{PanelModel, SimCalibration, SimulatedActuator, SimulatedPanel, SimulatedSensor};

#[cfg(all(feature = "hardware", target_os = "linux"))]
pub use ads7830::Ads7830;
#[cfg(all(feature = "hardware", target_os = "linux"))]
pub use gpio::{GpioActuator, MotorPins};
