//! Pure helpers shared by the hardware backends.

use std::time::Duration;

use tracker_traits::{Axis, Direction};

use crate::error::Result;

/// BCM GPIO number for a physical pin on the 40-pin header, or `None` for
/// power, ground and ID EEPROM pins.
pub fn board_to_bcm(pin: u8) -> Option<u8> {
    let bcm = match pin {
        3 => 2,
        5 => 3,
        7 => 4,
        8 => 14,
        10 => 15,
        11 => 17,
        12 => 18,
        13 => 27,
        15 => 22,
        16 => 23,
        18 => 24,
        19 => 10,
        21 => 9,
        22 => 25,
        23 => 11,
        24 => 8,
        26 => 7,
        29 => 5,
        31 => 6,
        32 => 12,
        33 => 13,
        35 => 19,
        36 => 16,
        37 => 26,
        38 => 20,
        40 => 21,
        _ => return None,
    };
    Some(bcm)
}

/// ADS7830 command byte for a single-ended read of `channel` (0..=7) with the
/// internal reference off and the converter on.
///
/// The channel select bits are interleaved: C2 = ch bit 0, C1..C0 = ch bits 2..1.
pub fn ads7830_command(channel: u8) -> u8 {
    let ch = channel & 0x07;
    0x84 | ((((ch << 2) | (ch >> 1)) & 0x07) << 4)
}

/// Duty fraction in `[0, 1]` from a percentage.
pub fn duty_fraction(pct: u8) -> f64 {
    f64::from(pct.min(100)) / 100.0
}

/// One H-bridge output pair per axis.
pub trait HBridge {
    /// Set polarity and start PWM at the running duty.
    fn energize(&mut self, axis: Axis, direction: Direction) -> Result<()>;
    /// Both inputs low, duty 0.
    fn deenergize(&mut self, axis: Axis) -> Result<()>;
}

/// Drive `axis` for `duration`, leaving the bridge de-energized on every path.
///
/// `Stop` still blocks for `duration`. A failure to de-energize after the
/// motor ran is logged and the move is reported as done, because the panel
/// did turn.
pub fn timed_drive<B: HBridge + ?Sized>(
    bridge: &mut B,
    axis: Axis,
    direction: Direction,
    duration: Duration,
    sleep: impl FnOnce(Duration),
) -> Result<()> {
    if duration.is_zero() {
        return bridge.deenergize(axis);
    }
    if direction == Direction::Stop {
        bridge.deenergize(axis)?;
        sleep(duration);
        return Ok(());
    }
    if let Err(e) = bridge.energize(axis, direction) {
        if let Err(z) = bridge.deenergize(axis) {
            tracing::error!(?axis, error = %z, "could not de-energize after failed start");
        }
        return Err(e);
    }
    sleep(duration);
    if let Err(e) = bridge.deenergize(axis) {
        tracing::error!(?axis, ?direction, error = %e, "motor left energized after move");
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::HwError;
    use rstest::rstest;
    use std::cell::Cell;

    #[derive(Debug, PartialEq)]
    enum Ev {
        On(Axis, Direction),
        Off(Axis),
    }

    #[derive(Default)]
    struct FakeBridge {
        events: Vec<Ev>,
        fail_on: bool,
        fail_off: bool,
    }

    impl HBridge for FakeBridge {
        fn energize(&mut self, axis: Axis, direction: Direction) -> Result<()> {
            self.events.push(Ev::On(axis, direction));
            if self.fail_on {
                return Err(HwError::Pwm("duty rejected".into()));
            }
            Ok(())
        }

        fn deenergize(&mut self, axis: Axis) -> Result<()> {
            self.events.push(Ev::Off(axis));
            if self.fail_off {
                return Err(HwError::Pwm("stuck".into()));
            }
            Ok(())
        }
    }

    const MS: Duration = Duration::from_millis(250);

    #[test]
    fn move_energizes_sleeps_then_deenergizes() {
        let mut b = FakeBridge::default();
        let slept = Cell::new(None);
        timed_drive(&mut b, Axis::Yaw, Direction::Forward, MS, |d| slept.set(Some(d))).unwrap();
        assert_eq!(b.events, vec![Ev::On(Axis::Yaw, Direction::Forward), Ev::Off(Axis::Yaw)]);
        assert_eq!(slept.get(), Some(MS));
    }

    #[test]
    fn failed_start_still_deenergizes() {
        let mut b = FakeBridge {
            fail_on: true,
            ..Default::default()
        };
        let slept = Cell::new(false);
        let err = timed_drive(&mut b, Axis::Pitch, Direction::Reverse, MS, |_| slept.set(true));
        assert!(matches!(err, Err(HwError::Pwm(_))));
        assert_eq!(
            b.events,
            vec![Ev::On(Axis::Pitch, Direction::Reverse), Ev::Off(Axis::Pitch)]
        );
        assert!(!slept.get());
    }

    #[test]
    fn failed_stop_after_move_still_counts_the_move() {
        let mut b = FakeBridge {
            fail_off: true,
            ..Default::default()
        };
        let slept = Cell::new(false);
        timed_drive(&mut b, Axis::Yaw, Direction::Reverse, MS, |_| slept.set(true)).unwrap();
        assert!(slept.get());
        assert_eq!(b.events.len(), 2);
    }

    #[test]
    fn stop_blocks_for_the_duration() {
        let mut b = FakeBridge::default();
        let slept = Cell::new(None);
        timed_drive(&mut b, Axis::Yaw, Direction::Stop, MS, |d| slept.set(Some(d))).unwrap();
        assert_eq!(b.events, vec![Ev::Off(Axis::Yaw)]);
        assert_eq!(slept.get(), Some(MS));
    }

    #[rstest]
    #[case(Direction::Forward)]
    #[case(Direction::Stop)]
    fn zero_duration_only_deenergizes(#[case] dir: Direction) {
        let mut b = FakeBridge::default();
        let slept = Cell::new(false);
        timed_drive(&mut b, Axis::Pitch, dir, Duration::ZERO, |_| slept.set(true)).unwrap();
        assert_eq!(b.events, vec![Ev::Off(Axis::Pitch)]);
        assert!(!slept.get());
    }

    #[rstest]
    #[case(13, Some(27))]
    #[case(15, Some(22))]
    #[case(11, Some(17))]
    #[case(18, Some(24))]
    #[case(22, Some(25))]
    #[case(16, Some(23))]
    #[case(1, None)]
    #[case(6, None)]
    #[case(27, None)]
    fn rig_pins_map_to_bcm(#[case] board: u8, #[case] bcm: Option<u8>) {
        assert_eq!(board_to_bcm(board), bcm);
    }

    #[rstest]
    #[case(0, 0x84)]
    #[case(1, 0xC4)]
    #[case(2, 0x94)]
    #[case(3, 0xD4)]
    #[case(7, 0xF4)]
    fn single_ended_command_bytes(#[case] ch: u8, #[case] cmd: u8) {
        assert_eq!(ads7830_command(ch), cmd);
    }
}
