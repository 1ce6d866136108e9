//! Blocking move execution with position bookkeeping.
//!
//! `MoveExecutor` is the only owner of the axis trackers: a position changes
//! exactly when the actuator reports a completed move, never before.

use std::time::Duration;

use eyre::WrapErr;
use tracker_traits::{Actuator, Axis, Direction, SavedPosition};

use crate::error::Result;
use crate::hw_error::map_hw_error;
use crate::position::{AxisPositionTracker, MoveCommand};

pub struct MoveExecutor<A: Actuator> {
    actuator: A,
    yaw: AxisPositionTracker,
    pitch: AxisPositionTracker,
    moves: u64,
}

impl<A: Actuator> core::fmt::Debug for MoveExecutor<A> {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("MoveExecutor")
            .field("yaw_s", &self.yaw.position_s())
            .field("pitch_s", &self.pitch.position_s())
            .field("moves", &self.moves)
            .finish()
    }
}

impl<A: Actuator> MoveExecutor<A> {
    pub fn new(actuator: A, yaw_revolution_s: f64, pitch_revolution_s: f64) -> Self {
        Self {
            actuator,
            yaw: AxisPositionTracker::new(Axis::Yaw, yaw_revolution_s),
            pitch: AxisPositionTracker::new(Axis::Pitch, pitch_revolution_s),
            moves: 0,
        }
    }

    pub fn tracker(&self, axis: Axis) -> &AxisPositionTracker {
        match axis {
            Axis::Yaw => &self.yaw,
            Axis::Pitch => &self.pitch,
        }
    }

    fn tracker_mut(&mut self, axis: Axis) -> &mut AxisPositionTracker {
        match axis {
            Axis::Yaw => &mut self.yaw,
            Axis::Pitch => &mut self.pitch,
        }
    }

    /// Completed moves since construction (no-ops included).
    pub fn moves(&self) -> u64 {
        self.moves
    }

    /// Drive `axis` for `duration`, then record the move.
    ///
    /// On actuator failure the position is left untouched: the move cannot be
    /// confirmed as complete.
    pub fn execute(
        &mut self,
        axis: Axis,
        direction: Direction,
        duration: Duration,
    ) -> Result<MoveCommand> {
        self.execute_command(MoveCommand {
            axis,
            direction,
            duration,
        })
    }

    pub fn execute_command(&mut self, cmd: MoveCommand) -> Result<MoveCommand> {
        self.actuator
            .drive(cmd.axis, cmd.direction, cmd.duration)
            .map_err(|e| eyre::Report::new(map_hw_error(&*e)))
            .wrap_err_with(|| format!("driving {} {}", cmd.axis, cmd.direction))?;
        let tracker = self.tracker_mut(cmd.axis);
        tracker.apply(cmd.direction, cmd.duration);
        let position_s = tracker.position_s();
        let degrees = tracker.degrees();
        self.moves += 1;
        tracing::debug!(
            axis = %cmd.axis,
            direction = %cmd.direction,
            secs = cmd.duration.as_secs_f64(),
            position_s,
            degrees,
            "move complete"
        );
        Ok(cmd)
    }

    /// Drive `axis` back to its zero and pin the position there.
    pub fn return_to_origin(&mut self, axis: Axis) -> Result<MoveCommand> {
        let cmd = self.tracker(axis).reset_to_origin();
        if cmd.is_noop() {
            tracing::info!(%axis, "already at origin");
        } else {
            tracing::info!(%axis, direction = %cmd.direction, secs = cmd.duration.as_secs_f64(), "returning to origin");
        }
        let cmd = self.execute_command(cmd)?;
        self.tracker_mut(axis).confirm_origin();
        Ok(cmd)
    }

    pub fn positions(&self) -> SavedPosition {
        SavedPosition {
            yaw_s: self.yaw.position_s(),
            pitch_s: self.pitch.position_s(),
        }
    }

    /// Overwrite both positions with a loaded checkpoint.
    pub fn restore(&mut self, saved: SavedPosition) {
        self.yaw.restore(saved.yaw_s);
        self.pitch.restore(saved.pitch_s);
    }

    /// Zero power on both axes. Both are attempted even if the first fails.
    pub fn idle_all(&mut self) -> Result<()> {
        let mut first_err = None;
        for axis in Axis::ALL {
            if let Err(e) = self.actuator.idle(axis) {
                tracing::warn!(%axis, error = %e, "idle failed");
                first_err.get_or_insert_with(|| {
                    eyre::Report::new(map_hw_error(&*e)).wrap_err(format!("idling {axis}"))
                });
            }
        }
        match first_err {
            Some(e) => Err(e),
            None => Ok(()),
        }
    }

    pub fn release(&mut self) -> Result<()> {
        self.actuator
            .release()
            .map_err(|e| eyre::Report::new(map_hw_error(&*e)))
            .wrap_err("releasing actuator")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mocks::RecordingActuator;

    #[test]
    fn execute_records_after_drive() {
        let act = RecordingActuator::new();
        let log = act.log();
        let mut exec = MoveExecutor::new(act, 18.63, 127.44);

        exec.execute(Axis::Yaw, Direction::Forward, Duration::from_secs(2))
            .unwrap();
        exec.execute(Axis::Pitch, Direction::Reverse, Duration::from_secs(1))
            .unwrap();

        assert_eq!(log.moves().len(), 2);
        assert!((exec.positions().yaw_s - 2.0).abs() < 1e-9);
        assert!((exec.positions().pitch_s + 1.0).abs() < 1e-9);
        assert_eq!(exec.moves(), 2);
    }

    #[test]
    fn failed_drive_leaves_position_untouched() {
        let act = RecordingActuator::failing();
        let mut exec = MoveExecutor::new(act, 18.63, 127.44);
        let err = exec
            .execute(Axis::Yaw, Direction::Forward, Duration::from_secs(1))
            .unwrap_err();
        assert!(format!("{err:#}").contains("driving yaw forward"));
        assert_eq!(exec.positions(), SavedPosition::default());
    }

    #[test]
    fn return_to_origin_unwinds_and_zeroes() {
        let act = RecordingActuator::new();
        let log = act.log();
        let mut exec = MoveExecutor::new(act, 18.63, 127.44);
        exec.restore(SavedPosition {
            yaw_s: -4.5,
            pitch_s: 0.0,
        });

        let cmd = exec.return_to_origin(Axis::Yaw).unwrap();
        assert_eq!(cmd.direction, Direction::Forward);
        assert!((cmd.duration.as_secs_f64() - 4.5).abs() < 1e-9);
        assert_eq!(exec.tracker(Axis::Yaw).position_s(), 0.0);
        assert_eq!(log.moves(), vec![cmd]);
    }

    #[test]
    fn return_to_origin_at_zero_is_noop_move() {
        let act = RecordingActuator::new();
        let log = act.log();
        let mut exec = MoveExecutor::new(act, 18.63, 127.44);

        let cmd = exec.return_to_origin(Axis::Pitch).unwrap();
        assert!(cmd.duration.is_zero());
        assert_eq!(cmd.direction, Direction::Stop);
        assert_eq!(exec.tracker(Axis::Pitch).position_s(), 0.0);
        assert_eq!(log.moves().len(), 1);
    }

    #[test]
    fn idle_all_touches_both_axes() {
        let act = RecordingActuator::new();
        let log = act.log();
        let mut exec = MoveExecutor::new(act, 18.63, 127.44);
        exec.idle_all().unwrap();
        assert_eq!(log.idled(), vec![Axis::Yaw, Axis::Pitch]);
    }
}
