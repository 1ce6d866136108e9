//! Collaborator contracts for the solar tracker.
//!
//! The core never touches pins or buses directly; it drives motors through
//! [`Actuator`], reads the panel through [`VoltageSensor`] and checkpoints its
//! dead-reckoned position through [`PositionStore`].
pub mod clock;

pub use clock::{Clock, MonotonicClock, VirtualClock};

use std::fmt;
use std::time::Duration;

/// One of the two motorised axes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Axis {
    /// Rotation of the whole device around the vertical.
    Yaw,
    /// Head-over-head rotation of the cell.
    Pitch,
}

impl Axis {
    pub const ALL: [Axis; 2] = [Axis::Yaw, Axis::Pitch];

    pub fn name(self) -> &'static str {
        match self {
            Axis::Yaw => "yaw",
            Axis::Pitch => "pitch",
        }
    }
}

impl fmt::Display for Axis {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Motor polarity. `Stop` means zero net voltage across the terminals.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Direction {
    Forward,
    Reverse,
    Stop,
}

impl Direction {
    /// +1, -1 or 0.
    #[inline]
    pub fn sign(self) -> i8 {
        match self {
            Direction::Forward => 1,
            Direction::Reverse => -1,
            Direction::Stop => 0,
        }
    }

    /// Multiply by -1. `Stop` stays `Stop`.
    #[inline]
    pub fn flipped(self) -> Self {
        match self {
            Direction::Forward => Direction::Reverse,
            Direction::Reverse => Direction::Forward,
            Direction::Stop => Direction::Stop,
        }
    }

    /// Direction that moves a signed quantity back toward zero.
    pub fn toward_zero(value: f64) -> Self {
        if value > 0.0 {
            Direction::Reverse
        } else if value < 0.0 {
            Direction::Forward
        } else {
            Direction::Stop
        }
    }
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Direction::Forward => "forward",
            Direction::Reverse => "reverse",
            Direction::Stop => "stop",
        })
    }
}

pub trait Actuator {
    /// Hold `direction` on `axis` for `duration`, blocking, then leave the
    /// axis in its zero-power rest state. A zero duration is a no-op.
    fn drive(
        &mut self,
        axis: Axis,
        direction: Direction,
        duration: Duration,
    ) -> Result<(), Box<dyn std::error::Error + Send + Sync>>;

    /// Force the axis output to zero power.
    fn idle(&mut self, axis: Axis) -> Result<(), Box<dyn std::error::Error + Send + Sync>>;

    /// Release PWM channels and pins. Called once on shutdown.
    fn release(&mut self) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
        Ok(())
    }
}

pub trait VoltageSensor {
    /// Check that the converter answers. Failure is fatal at startup.
    fn probe(&mut self) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
        Ok(())
    }

    /// One instantaneous reading in `[0, max_raw]` on the configured channel.
    fn read_raw(&mut self) -> Result<u16, Box<dyn std::error::Error + Send + Sync>>;
}

/// Dead-reckoned positions in actuation-seconds.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct SavedPosition {
    pub yaw_s: f64,
    pub pitch_s: f64,
}

pub trait PositionStore {
    /// `Ok(None)` when nothing has been saved yet.
    fn load(&mut self) -> Result<Option<SavedPosition>, Box<dyn std::error::Error + Send + Sync>>;
    fn save(
        &mut self,
        position: SavedPosition,
    ) -> Result<(), Box<dyn std::error::Error + Send + Sync>>;
}

impl<T: Actuator + ?Sized> Actuator for Box<T> {
    fn drive(
        &mut self,
        axis: Axis,
        direction: Direction,
        duration: Duration,
    ) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
        (**self).drive(axis, direction, duration)
    }
    fn idle(&mut self, axis: Axis) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
        (**self).idle(axis)
    }
    fn release(&mut self) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
        (**self).release()
    }
}

impl<T: VoltageSensor + ?Sized> VoltageSensor for Box<T> {
    fn probe(&mut self) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
        (**self).probe()
    }
    fn read_raw(&mut self) -> Result<u16, Box<dyn std::error::Error + Send + Sync>> {
        (**self).read_raw()
    }
}

impl<T: PositionStore + ?Sized> PositionStore for Box<T> {
    fn load(&mut self) -> Result<Option<SavedPosition>, Box<dyn std::error::Error + Send + Sync>> {
        (**self).load()
    }
    fn save(
        &mut self,
        position: SavedPosition,
    ) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
        (**self).save(position)
    }
}
