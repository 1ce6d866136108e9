//! Four-slot direction history used as the convergence detector.

use tracker_traits::Direction;

pub const WINDOW_LEN: usize = 4;

/// The last three applied directions plus the pending one, most recent last.
///
/// A fresh window holds three empty slots and the initial direction. Empty
/// slots never sum to zero, so the earliest possible convergence is the third
/// decision, when the initial direction is the oldest entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DirectionWindow {
    slots: [Option<Direction>; WINDOW_LEN],
}

impl DirectionWindow {
    /// Window at the start of a phase: only the initial direction is known.
    pub fn seeded(initial: Direction) -> Self {
        Self {
            slots: [None, None, None, Some(initial)],
        }
    }

    pub fn from_directions(dirs: [Direction; WINDOW_LEN]) -> Self {
        Self {
            slots: dirs.map(Some),
        }
    }

    /// Drop the oldest entry and append `dir`.
    pub fn push(&mut self, dir: Direction) {
        self.slots.rotate_left(1);
        self.slots[WINDOW_LEN - 1] = Some(dir);
    }

    /// Sum of the signs, or `None` while any slot is still empty.
    pub fn sum(&self) -> Option<i32> {
        self.slots
            .iter()
            .try_fold(0i32, |acc, d| d.map(|d| acc + i32::from(d.sign())))
    }

    /// True when the four entries net to zero.
    ///
    /// This is a sum test, not a pattern test: `[F, F, R, R]` fires just like
    /// `[F, R, F, R]`.
    pub fn converged(&self) -> bool {
        self.sum() == Some(0)
    }

    pub fn slots(&self) -> &[Option<Direction>; WINDOW_LEN] {
        &self.slots
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;
    use Direction::{Forward as F, Reverse as R};

    #[rstest]
    #[case([F, R, F, R], true)]
    #[case([R, F, R, F], true)]
    #[case([F, F, R, R], true)]
    #[case([F, F, F, R], false)]
    #[case([F, F, F, F], false)]
    fn zero_sum_is_the_convergence_rule(#[case] dirs: [Direction; 4], #[case] expected: bool) {
        assert_eq!(DirectionWindow::from_directions(dirs).converged(), expected);
    }

    #[test]
    fn seeded_window_can_fire_on_third_push() {
        let mut w = DirectionWindow::seeded(F);
        assert!(!w.converged());
        w.push(R);
        assert!(!w.converged());
        w.push(F);
        assert!(!w.converged());
        assert_eq!(w.sum(), None);
        // the seed is now the oldest slot: [F, R, F, R]
        w.push(R);
        assert_eq!(w.slots(), &[Some(F), Some(R), Some(F), Some(R)]);
        assert!(w.converged());
    }

    #[test]
    fn seeded_window_keeps_climbing_without_reversals() {
        let mut w = DirectionWindow::seeded(F);
        for _ in 0..3 {
            w.push(F);
        }
        assert_eq!(w.sum(), Some(4));
        assert!(!w.converged());
    }

    #[test]
    fn push_drops_oldest() {
        let mut w = DirectionWindow::from_directions([F, F, F, F]);
        w.push(R);
        assert_eq!(w.slots(), &[Some(F), Some(F), Some(F), Some(R)]);
        assert_eq!(w.sum(), Some(2));
    }

    #[test]
    fn stop_counts_as_zero() {
        let w = DirectionWindow::from_directions([Direction::Stop; 4]);
        assert_eq!(w.sum(), Some(0));
    }
}
