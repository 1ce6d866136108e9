//! Test doubles for the collaborator traits.
//!
//! Each double hands out a cloneable handle to its recorded state so tests
//! can inspect it after the double has been boxed into a `Tracker`.

use std::collections::VecDeque;
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;

use tracker_traits::{Actuator, Axis, Direction, PositionStore, SavedPosition, VoltageSensor};

use crate::position::MoveCommand;

fn lock<T>(m: &Mutex<T>) -> MutexGuard<'_, T> {
    m.lock().unwrap_or_else(std::sync::PoisonError::into_inner)
}

#[derive(Debug, Default)]
struct ActuatorState {
    moves: Vec<MoveCommand>,
    idled: Vec<Axis>,
    released: bool,
}

/// Read side of a [`RecordingActuator`].
#[derive(Debug, Clone, Default)]
pub struct ActuatorLog(Arc<Mutex<ActuatorState>>);

impl ActuatorLog {
    pub fn moves(&self) -> Vec<MoveCommand> {
        lock(&self.0).moves.clone()
    }

    /// Moves on one axis, in order.
    pub fn moves_on(&self, axis: Axis) -> Vec<MoveCommand> {
        lock(&self.0)
            .moves
            .iter()
            .filter(|m| m.axis == axis)
            .copied()
            .collect()
    }

    pub fn idled(&self) -> Vec<Axis> {
        lock(&self.0).idled.clone()
    }

    pub fn released(&self) -> bool {
        lock(&self.0).released
    }
}

/// Actuator that records every command and returns immediately.
#[derive(Debug, Default)]
pub struct RecordingActuator {
    log: ActuatorLog,
    fail_drive: bool,
}

impl RecordingActuator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Every `drive` call fails; idle and release still succeed.
    pub fn failing() -> Self {
        Self {
            fail_drive: true,
            ..Self::default()
        }
    }

    pub fn log(&self) -> ActuatorLog {
        self.log.clone()
    }
}

impl Actuator for RecordingActuator {
    fn drive(
        &mut self,
        axis: Axis,
        direction: Direction,
        duration: Duration,
    ) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
        if self.fail_drive {
            return Err(Box::new(std::io::Error::other("h-bridge fault")));
        }
        lock(&self.log.0).moves.push(MoveCommand {
            axis,
            direction,
            duration,
        });
        Ok(())
    }

    fn idle(&mut self, axis: Axis) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
        lock(&self.log.0).idled.push(axis);
        Ok(())
    }

    fn release(&mut self) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
        lock(&self.log.0).released = true;
        Ok(())
    }
}

/// Sensor that replays a fixed list of raw readings and then keeps
/// returning the last one.
#[derive(Debug, Default)]
pub struct ScriptedSensor {
    script: VecDeque<u16>,
    last: u16,
    detected: bool,
    reads: Arc<Mutex<usize>>,
}

impl ScriptedSensor {
    pub fn new(script: impl IntoIterator<Item = u16>) -> Self {
        Self {
            script: script.into_iter().collect(),
            last: 0,
            detected: true,
            reads: Arc::default(),
        }
    }

    /// Probe fails as if nothing answered on the bus.
    pub fn undetected() -> Self {
        Self {
            detected: false,
            ..Self::new([])
        }
    }

    /// Shared counter of `read_raw` calls.
    pub fn read_counter(&self) -> Arc<Mutex<usize>> {
        Arc::clone(&self.reads)
    }
}

impl VoltageSensor for ScriptedSensor {
    fn probe(&mut self) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
        if self.detected {
            Ok(())
        } else {
            Err(Box::new(std::io::Error::other("ADC not detected")))
        }
    }

    fn read_raw(&mut self) -> Result<u16, Box<dyn std::error::Error + Send + Sync>> {
        if !self.detected {
            return Err(Box::new(std::io::Error::other("ADC not detected")));
        }
        if let Some(v) = self.script.pop_front() {
            self.last = v;
        }
        *lock(&self.reads) += 1;
        Ok(self.last)
    }
}

/// In-memory checkpoint shared through a cloneable handle.
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    slot: Arc<Mutex<Option<SavedPosition>>>,
    saves: Arc<Mutex<usize>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(position: SavedPosition) -> Self {
        let s = Self::default();
        *lock(&s.slot) = Some(position);
        s
    }

    pub fn saved(&self) -> Option<SavedPosition> {
        *lock(&self.slot)
    }

    pub fn save_count(&self) -> usize {
        *lock(&self.saves)
    }
}

impl PositionStore for MemoryStore {
    fn load(&mut self) -> Result<Option<SavedPosition>, Box<dyn std::error::Error + Send + Sync>> {
        Ok(*lock(&self.slot))
    }

    fn save(
        &mut self,
        position: SavedPosition,
    ) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
        *lock(&self.slot) = Some(position);
        *lock(&self.saves) += 1;
        Ok(())
    }
}
