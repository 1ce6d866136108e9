#![cfg_attr(all(not(debug_assertions), not(test)), deny(warnings))]
#![cfg_attr(
    all(not(debug_assertions), not(test)),
    deny(clippy::all, clippy::pedantic, clippy::nursery)
)]
#![allow(clippy::module_name_repetitions, clippy::missing_errors_doc)]
#![cfg_attr(not(test), deny(clippy::unwrap_used, clippy::expect_used))]
//! Core tracking logic (hardware-agnostic).
//!
//! This crate provides the solar tracking engine. All hardware interactions
//! go through `tracker_traits::Actuator`, `tracker_traits::VoltageSensor` and
//! `tracker_traits::PositionStore`.
//!
//! ## Architecture
//!
//! - **Sampling**: N raw reads reduced and calibrated to panel volts (`voltage`)
//! - **Dead reckoning**: axis position as signed actuation seconds (`position`)
//! - **Execution**: blocking moves that update position on completion (`executor`)
//! - **Search**: coarse/fine perturb-and-observe per axis (`hill_climb`, `window`)
//! - **Orientation**: best of three yaw headings before the first search (`orienter`)
//! - **Session**: startup, cycles, rest and orderly shutdown (`runner`)
//!
//! Nothing here spawns threads. The only cross-thread value is
//! [`ShutdownSignal`], which a signal handler may trigger at any time; it is
//! observed between search iterations and during rest intervals.

pub mod builder;
pub mod config;
pub mod conversions;
pub mod error;
pub mod executor;
pub mod hill_climb;
pub mod hw_error;
pub mod mocks;
pub mod orienter;
pub mod position;
pub mod runner;
pub mod shutdown;
pub mod status;
pub mod store;
pub mod util;
pub mod voltage;
pub mod window;

pub use builder::{Missing, Set, TrackerBuilder, build_tracker};
pub use config::*;
pub use error::{BuildError, Report, Result, TrackerError};
pub use executor::MoveExecutor;
pub use hill_climb::{ClimbPhase, HillClimbController, SearchGrain, SearchOutcome, StepSizes};
pub use orienter::{TriSampleOrienter, TriSamplePick, TriSampleReadings};
pub use position::{AxisPositionTracker, MoveCommand};
pub use runner::{RestoreOutcome, Tracker, run_session};
pub use shutdown::ShutdownSignal;
pub use status::{CycleReport, PositionReport, RunSummary, StopReason};
pub use store::FilePositionStore;
pub use voltage::{VoltageSample, VoltageSampler};
pub use window::DirectionWindow;
