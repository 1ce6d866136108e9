//! Pre-search yaw orientation from three readings 120° apart.

use std::fmt;

use tracker_traits::{Actuator, Axis, Direction, VoltageSensor};

use crate::error::Result;
use crate::executor::MoveExecutor;
use crate::voltage::VoltageSampler;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TriSamplePick {
    Origin,
    Plus120,
    Plus240,
}

impl TriSamplePick {
    /// Yaw offset from the starting position, in degrees.
    pub fn offset_deg(self) -> f64 {
        match self {
            TriSamplePick::Origin => 0.0,
            TriSamplePick::Plus120 => 120.0,
            TriSamplePick::Plus240 => 240.0,
        }
    }
}

impl fmt::Display for TriSamplePick {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}°", self.offset_deg())
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TriSampleReadings {
    pub origin: f64,
    pub plus_120: f64,
    pub plus_240: f64,
}

impl TriSampleReadings {
    /// Highest reading wins. Ties: 240° beats both others, 120° beats
    /// origin, origin only wins outright.
    pub fn pick(&self) -> TriSamplePick {
        if self.plus_240 >= self.origin && self.plus_240 >= self.plus_120 {
            TriSamplePick::Plus240
        } else if self.plus_120 >= self.origin {
            TriSamplePick::Plus120
        } else {
            TriSamplePick::Origin
        }
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct TriSampleOrienter;

impl TriSampleOrienter {
    pub fn new() -> Self {
        Self
    }

    /// Sample at the current yaw, 120° forward and 240° forward, then
    /// reverse back to the best of the three.
    pub fn orient<A: Actuator, S: VoltageSensor>(
        &self,
        exec: &mut MoveExecutor<A>,
        sampler: &mut VoltageSampler<S>,
    ) -> Result<(TriSampleReadings, TriSamplePick)> {
        let third = exec.tracker(Axis::Yaw).duration_for_degrees(120.0);

        let origin = sampler.sample()?.volts;
        exec.execute(Axis::Yaw, Direction::Forward, third)?;
        let plus_120 = sampler.sample()?.volts;
        exec.execute(Axis::Yaw, Direction::Forward, third)?;
        let plus_240 = sampler.sample()?.volts;

        let readings = TriSampleReadings {
            origin,
            plus_120,
            plus_240,
        };
        let pick = readings.pick();
        tracing::info!(origin, plus_120, plus_240, %pick, "tri-sample");

        let back = match pick {
            TriSamplePick::Plus240 => None,
            TriSamplePick::Plus120 => Some(third),
            TriSamplePick::Origin => Some(exec.tracker(Axis::Yaw).duration_for_degrees(240.0)),
        };
        if let Some(d) = back {
            exec.execute(Axis::Yaw, Direction::Reverse, d)?;
        }
        Ok((readings, pick))
    }
}
