//! Perturb-and-observe search for one axis.
//!
//! Each pass runs a coarse phase then a fine phase with the same decision
//! loop: move, sample, keep the direction while the voltage does not drop,
//! flip it on a drop. A phase ends when the last four directions net to zero;
//! one more step in the current direction is taken before moving on.

use std::fmt;
use std::time::Duration;

use tracker_traits::{Actuator, Axis, Direction, VoltageSensor};

use crate::config::{AxisCfg, SearchCfg};
use crate::error::Result;
use crate::executor::MoveExecutor;
use crate::shutdown::ShutdownSignal;
use crate::util::{duration_from_secs, seconds_for_degrees};
use crate::voltage::VoltageSampler;
use crate::window::DirectionWindow;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SearchGrain {
    Coarse,
    Fine,
    Converged,
}

impl SearchGrain {
    pub fn next(self) -> Self {
        match self {
            SearchGrain::Coarse => SearchGrain::Fine,
            SearchGrain::Fine | SearchGrain::Converged => SearchGrain::Converged,
        }
    }
}

impl fmt::Display for SearchGrain {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            SearchGrain::Coarse => "coarse",
            SearchGrain::Fine => "fine",
            SearchGrain::Converged => "converged",
        })
    }
}

/// Actuation time of one coarse and one fine step on an axis.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct StepSizes {
    pub coarse: Duration,
    pub fine: Duration,
}

impl StepSizes {
    pub fn from_degrees(coarse_deg: f64, fine_deg: f64, revolution_s: f64) -> Self {
        Self {
            coarse: duration_from_secs(seconds_for_degrees(coarse_deg, revolution_s)),
            fine: duration_from_secs(seconds_for_degrees(fine_deg, revolution_s)),
        }
    }

    pub fn for_axis(cfg: &AxisCfg) -> Self {
        Self::from_degrees(cfg.coarse_deg, cfg.fine_deg, cfg.revolution_s)
    }

    pub fn for_grain(&self, grain: SearchGrain) -> Option<Duration> {
        match grain {
            SearchGrain::Coarse => Some(self.coarse),
            SearchGrain::Fine => Some(self.fine),
            SearchGrain::Converged => None,
        }
    }
}

/// The perturb-and-observe rule. Equal readings keep the direction.
#[inline]
pub fn next_direction(current: Direction, previous_volts: f64, new_volts: f64) -> Direction {
    if new_volts < previous_volts {
        current.flipped()
    } else {
        current
    }
}

/// Decision state of one coarse or fine phase.
#[derive(Debug, Clone)]
pub struct ClimbPhase {
    grain: SearchGrain,
    step: Duration,
    direction: Direction,
    previous: f64,
    window: DirectionWindow,
    iterations: u32,
}

impl ClimbPhase {
    /// Start a phase heading Forward from a `baseline` taken before any move.
    pub fn begin(grain: SearchGrain, step: Duration, baseline: f64) -> Self {
        Self {
            grain,
            step,
            direction: Direction::Forward,
            previous: baseline,
            window: DirectionWindow::seeded(Direction::Forward),
            iterations: 0,
        }
    }

    /// Direction of the next move.
    pub fn direction(&self) -> Direction {
        self.direction
    }

    pub fn grain(&self) -> SearchGrain {
        self.grain
    }

    pub fn step(&self) -> Duration {
        self.step
    }

    pub fn iterations(&self) -> u32 {
        self.iterations
    }

    pub fn window(&self) -> &DirectionWindow {
        &self.window
    }

    /// Feed the sample taken after a move. Returns `true` when the phase has
    /// converged.
    pub fn observe(&mut self, volts: f64) -> bool {
        self.direction = next_direction(self.direction, self.previous, volts);
        self.previous = volts;
        self.window.push(self.direction);
        self.iterations += 1;
        self.window.converged()
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum SearchOutcome {
    /// Both phases converged. `volts` is the last fine-phase sample.
    Converged { iterations: u32, volts: f64 },
    /// `max_iterations` was reached in `grain` before convergence.
    Exhausted { grain: SearchGrain, iterations: u32 },
    /// Shutdown was requested between iterations.
    Interrupted { grain: SearchGrain },
}

#[derive(Debug, Clone)]
pub struct HillClimbController {
    axis: Axis,
    steps: StepSizes,
    max_iterations: Option<u32>,
    shutdown: ShutdownSignal,
}

impl HillClimbController {
    pub fn new(axis: Axis, axis_cfg: &AxisCfg, search: &SearchCfg, shutdown: ShutdownSignal) -> Self {
        Self {
            axis,
            steps: StepSizes::for_axis(axis_cfg),
            max_iterations: search.max_iterations,
            shutdown,
        }
    }

    pub fn axis(&self) -> Axis {
        self.axis
    }

    pub fn steps(&self) -> StepSizes {
        self.steps
    }

    /// Run coarse then fine on this axis.
    pub fn run<A: Actuator, S: VoltageSensor>(
        &self,
        exec: &mut MoveExecutor<A>,
        sampler: &mut VoltageSampler<S>,
    ) -> Result<SearchOutcome> {
        let axis = self.axis;
        let mut grain = SearchGrain::Coarse;
        let mut total = 0u32;
        let mut last_volts = 0.0;

        while let Some(step) = self.steps.for_grain(grain) {
            if self.shutdown.is_triggered() {
                return Ok(SearchOutcome::Interrupted { grain });
            }
            let baseline = sampler.sample()?.volts;
            tracing::info!(%axis, %grain, baseline, step_s = step.as_secs_f64(), "search phase start");
            let mut phase = ClimbPhase::begin(grain, step, baseline);

            loop {
                if self.shutdown.is_triggered() {
                    tracing::info!(%axis, %grain, iterations = phase.iterations(), "search interrupted");
                    return Ok(SearchOutcome::Interrupted { grain });
                }
                if let Some(max) = self.max_iterations
                    && phase.iterations() >= max
                {
                    tracing::warn!(%axis, %grain, iterations = max, "search phase hit iteration limit");
                    return Ok(SearchOutcome::Exhausted {
                        grain,
                        iterations: phase.iterations(),
                    });
                }

                exec.execute(axis, phase.direction(), step)?;
                let volts = sampler.sample()?.volts;
                last_volts = volts;
                let converged = phase.observe(volts);
                tracing::debug!(
                    %axis,
                    %grain,
                    iteration = phase.iterations(),
                    volts,
                    next = %phase.direction(),
                    "search step"
                );
                if converged {
                    exec.execute(axis, phase.direction(), step)?;
                    break;
                }
            }

            total += phase.iterations();
            tracing::info!(
                %axis,
                %grain,
                iterations = phase.iterations(),
                degrees = exec.tracker(axis).degrees(),
                "search phase converged"
            );
            grain = grain.next();
        }

        Ok(SearchOutcome::Converged {
            iterations: total,
            volts: last_volts,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{SamplerCfg, VoltageCalibration};
    use crate::mocks::{RecordingActuator, ScriptedSensor};
    use std::sync::Arc;
    use tracker_traits::VirtualClock;
    use Direction::{Forward as F, Reverse as R};

    /// One read per sample, volts = raw / 10.
    fn tenths_sampler(script: &[u16]) -> VoltageSampler<ScriptedSensor> {
        let cfg = SamplerCfg {
            reads: 1,
            read_interval_ms: 0,
            calibration: VoltageCalibration {
                reference_volts: 25.5,
                max_raw: 255,
                divider_factor: 1.0,
            },
            ..SamplerCfg::default()
        };
        VoltageSampler::new(
            ScriptedSensor::new(script.iter().copied()),
            cfg,
            Arc::new(VirtualClock::new()),
        )
    }

    fn controller(max_iterations: Option<u32>) -> HillClimbController {
        HillClimbController::new(
            Axis::Yaw,
            &AxisCfg::yaw(),
            &SearchCfg { max_iterations },
            ShutdownSignal::new(),
        )
    }

    #[test]
    fn drop_in_voltage_flips_direction() {
        let mut phase = ClimbPhase::begin(SearchGrain::Coarse, Duration::from_secs(1), 3.0);
        assert!(!phase.observe(3.5));
        assert_eq!(phase.direction(), F);
        assert!(!phase.observe(3.2));
        assert_eq!(phase.direction(), R);
    }

    #[test]
    fn equal_reading_keeps_direction() {
        assert_eq!(next_direction(R, 2.0, 2.0), R);
        assert_eq!(next_direction(F, 2.0, 1.99), R);
    }

    #[test]
    fn moves_follow_perturb_and_observe() {
        let act = RecordingActuator::new();
        let log = act.log();
        let mut exec = MoveExecutor::new(act, 18.63, 127.44);
        // baseline 3.0, then 3.5 keeps Forward, 3.2 flips to Reverse and
        // 3.1 flips back, so the window [F, F, R, F] never nets to zero
        let mut sampler = tenths_sampler(&[30, 35, 32, 31]);

        let out = controller(Some(3)).run(&mut exec, &mut sampler).unwrap();

        assert_eq!(
            out,
            SearchOutcome::Exhausted {
                grain: SearchGrain::Coarse,
                iterations: 3
            }
        );
        let dirs: Vec<_> = log.moves().iter().map(|m| m.direction).collect();
        assert_eq!(dirs, vec![F, F, R]);
    }

    #[test]
    fn flip_after_second_move_then_reversal_converges() {
        let act = RecordingActuator::new();
        let log = act.log();
        let mut exec = MoveExecutor::new(act, 18.63, 127.44);
        // after 3.2 the repeated reading keeps Reverse: [F, F, R, R] nets to zero
        let mut sampler = tenths_sampler(&[30, 35, 32]);

        let out = controller(Some(3)).run(&mut exec, &mut sampler).unwrap();

        assert_eq!(
            out,
            SearchOutcome::Exhausted {
                grain: SearchGrain::Fine,
                iterations: 3
            }
        );
        let coarse = StepSizes::for_axis(&AxisCfg::yaw()).coarse;
        let coarse_dirs: Vec<_> = log
            .moves()
            .iter()
            .filter(|m| m.duration == coarse)
            .map(|m| m.direction)
            .collect();
        // three search moves plus the extra move in the converged direction
        assert_eq!(coarse_dirs, vec![F, F, R, R]);
    }

    #[test]
    fn coarse_then_fine_with_one_extra_move_each() {
        let act = RecordingActuator::new();
        let log = act.log();
        let mut exec = MoveExecutor::new(act, 18.63, 127.44);
        let mut sampler = tenths_sampler(&[10, 20, 10, 20, 10, 20, 10, 20]);
        let ctl = controller(None);
        let steps = ctl.steps();

        let out = ctl.run(&mut exec, &mut sampler).unwrap();

        assert_eq!(
            out,
            SearchOutcome::Converged {
                iterations: 6,
                volts: 2.0
            }
        );
        let moves = log.moves();
        assert_eq!(moves.len(), 8);
        let coarse: Vec<_> = moves[..4].iter().map(|m| (m.direction, m.duration)).collect();
        assert_eq!(
            coarse,
            vec![
                (F, steps.coarse),
                (F, steps.coarse),
                (R, steps.coarse),
                (R, steps.coarse)
            ]
        );
        assert!(moves[4..].iter().all(|m| m.duration == steps.fine));
        let fine: Vec<_> = moves[4..].iter().map(|m| m.direction).collect();
        assert_eq!(fine, vec![F, F, R, R]);
    }

    #[test]
    fn fresh_phase_window_is_not_convergent() {
        let phase = ClimbPhase::begin(SearchGrain::Fine, Duration::from_millis(250), 1.0);
        assert!(!phase.window().converged());
        assert_eq!(phase.direction(), F);
        assert_eq!(phase.iterations(), 0);
    }

    #[test]
    fn triggered_shutdown_interrupts_before_moving() {
        let act = RecordingActuator::new();
        let log = act.log();
        let mut exec = MoveExecutor::new(act, 18.63, 127.44);
        let mut sampler = tenths_sampler(&[10]);
        let shutdown = ShutdownSignal::new();
        shutdown.trigger();
        let ctl = HillClimbController::new(Axis::Pitch, &AxisCfg::pitch(), &SearchCfg::default(), shutdown);

        let out = ctl.run(&mut exec, &mut sampler).unwrap();
        assert_eq!(
            out,
            SearchOutcome::Interrupted {
                grain: SearchGrain::Coarse
            }
        );
        assert!(log.moves().is_empty());
    }

    #[test]
    fn step_sizes_scale_with_revolution_time() {
        let s = StepSizes::from_degrees(15.0, 5.0, 18.63);
        assert!((s.coarse.as_secs_f64() - 0.77625).abs() < 1e-9);
        assert!((s.fine.as_secs_f64() - 0.25875).abs() < 1e-9);
        assert_eq!(s.for_grain(SearchGrain::Converged), None);
    }
}
