use std::time::Duration;

use proptest::prelude::*;
use tracker_core::MoveExecutor;
use tracker_core::mocks::RecordingActuator;
use tracker_traits::{Axis, Direction};

fn direction_strategy() -> impl Strategy<Value = Direction> {
    prop_oneof![
        Just(Direction::Forward),
        Just(Direction::Reverse),
        Just(Direction::Stop),
    ]
}

proptest! {
    #[test]
    fn position_is_signed_sum_of_completed_moves(
        moves in prop::collection::vec((direction_strategy(), 0u64..20_000), 0..60)
    ) {
        let mut exec = MoveExecutor::new(RecordingActuator::new(), 18.63, 127.44);
        let mut expected = 0.0f64;
        for (dir, ms) in &moves {
            let d = Duration::from_millis(*ms);
            exec.execute(Axis::Yaw, *dir, d).unwrap();
            expected += f64::from(dir.sign()) * d.as_secs_f64();
        }
        prop_assert!((exec.tracker(Axis::Yaw).position_s() - expected).abs() < 1e-6);
        prop_assert_eq!(exec.tracker(Axis::Pitch).position_s(), 0.0);
    }

    #[test]
    fn order_of_moves_does_not_matter(
        mut moves in prop::collection::vec((direction_strategy(), 0u64..5_000), 1..30)
    ) {
        let mut a = MoveExecutor::new(RecordingActuator::new(), 18.63, 127.44);
        for (dir, ms) in &moves {
            a.execute(Axis::Pitch, *dir, Duration::from_millis(*ms)).unwrap();
        }
        moves.reverse();
        let mut b = MoveExecutor::new(RecordingActuator::new(), 18.63, 127.44);
        for (dir, ms) in &moves {
            b.execute(Axis::Pitch, *dir, Duration::from_millis(*ms)).unwrap();
        }
        prop_assert!((a.positions().pitch_s - b.positions().pitch_s).abs() < 1e-6);
    }

    #[test]
    fn return_to_origin_always_lands_on_zero(
        moves in prop::collection::vec((direction_strategy(), 0u64..20_000), 0..30)
    ) {
        let act = RecordingActuator::new();
        let log = act.log();
        let mut exec = MoveExecutor::new(act, 18.63, 127.44);
        for (dir, ms) in &moves {
            exec.execute(Axis::Yaw, *dir, Duration::from_millis(*ms)).unwrap();
        }
        let before = exec.tracker(Axis::Yaw).position_s();
        let cmd = exec.return_to_origin(Axis::Yaw).unwrap();
        prop_assert!((cmd.signed_secs() + before).abs() < 1e-6);
        prop_assert_eq!(exec.tracker(Axis::Yaw).position_s(), 0.0);

        // a second reset is a zero-length no-op
        let again = exec.return_to_origin(Axis::Yaw).unwrap();
        prop_assert!(again.is_noop());
        prop_assert!(again.duration.is_zero());
        prop_assert_eq!(exec.tracker(Axis::Yaw).position_s(), 0.0);
        prop_assert_eq!(log.moves().len(), moves.len() + 2);
    }
}
