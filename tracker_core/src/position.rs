//! Dead-reckoned axis position.
//!
//! An axis has no encoder; its position is the signed sum of every completed
//! actuation, in seconds. Degrees follow from the configured revolution time.

use std::time::Duration;

use tracker_traits::{Axis, Direction};

use crate::util::{degrees_for_seconds, duration_from_secs, seconds_for_degrees};

/// A single actuation request. The sign of motion lives in `direction`;
/// `duration` is non-negative by construction.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MoveCommand {
    pub axis: Axis,
    pub direction: Direction,
    pub duration: Duration,
}

impl MoveCommand {
    /// Signed seconds this command adds to the axis position.
    #[inline]
    pub fn signed_secs(&self) -> f64 {
        f64::from(self.direction.sign()) * self.duration.as_secs_f64()
    }

    #[inline]
    pub fn is_noop(&self) -> bool {
        self.direction == Direction::Stop || self.duration.is_zero()
    }
}

#[derive(Debug, Clone)]
pub struct AxisPositionTracker {
    axis: Axis,
    position_s: f64,
    revolution_s: f64,
}

impl AxisPositionTracker {
    /// Tracker at the implicit origin.
    pub fn new(axis: Axis, revolution_s: f64) -> Self {
        Self::with_position(axis, revolution_s, 0.0)
    }

    pub fn with_position(axis: Axis, revolution_s: f64, position_s: f64) -> Self {
        Self {
            axis,
            position_s,
            revolution_s,
        }
    }

    pub fn axis(&self) -> Axis {
        self.axis
    }

    /// Signed cumulative actuation time.
    pub fn position_s(&self) -> f64 {
        self.position_s
    }

    pub fn revolution_s(&self) -> f64 {
        self.revolution_s
    }

    pub fn degrees(&self) -> f64 {
        degrees_for_seconds(self.position_s, self.revolution_s)
    }

    /// Actuation time that covers `degrees` on this axis.
    pub fn duration_for_degrees(&self, degrees: f64) -> Duration {
        duration_from_secs(seconds_for_degrees(degrees.abs(), self.revolution_s))
    }

    /// Command that brings the axis back to zero: opposite sign of the
    /// position for `|position|` seconds, or a zero-length Stop at origin.
    pub fn reset_to_origin(&self) -> MoveCommand {
        MoveCommand {
            axis: self.axis,
            direction: Direction::toward_zero(self.position_s),
            duration: duration_from_secs(self.position_s.abs()),
        }
    }

    /// Record a completed move.
    pub(crate) fn apply(&mut self, direction: Direction, duration: Duration) {
        self.position_s += f64::from(direction.sign()) * duration.as_secs_f64();
    }

    /// The origin move finished; clear any float residue.
    pub(crate) fn confirm_origin(&mut self) {
        self.position_s = 0.0;
    }

    pub(crate) fn restore(&mut self, position_s: f64) {
        self.position_s = position_s;
    }
}
