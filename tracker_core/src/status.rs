//! Reports produced by the tracker for logging and the CLI.

use std::fmt;

use tracker_traits::SavedPosition;

use crate::util::degrees_for_seconds;

/// Both axis positions in seconds and degrees.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PositionReport {
    pub yaw_s: f64,
    pub yaw_deg: f64,
    pub pitch_s: f64,
    pub pitch_deg: f64,
}

impl PositionReport {
    pub fn from_saved(pos: SavedPosition, yaw_revolution_s: f64, pitch_revolution_s: f64) -> Self {
        Self {
            yaw_s: pos.yaw_s,
            yaw_deg: degrees_for_seconds(pos.yaw_s, yaw_revolution_s),
            pitch_s: pos.pitch_s,
            pitch_deg: degrees_for_seconds(pos.pitch_s, pitch_revolution_s),
        }
    }
}

impl fmt::Display for PositionReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "yaw {:.2} s = {:.2}°, pitch {:.2} s = {:.2}°",
            self.yaw_s, self.yaw_deg, self.pitch_s, self.pitch_deg
        )
    }
}

/// Result of one yaw + pitch optimization cycle.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CycleReport {
    /// 1-based cycle number.
    pub cycle: u32,
    pub yaw_deg: f64,
    pub pitch_deg: f64,
    /// Last sample of the pitch pass.
    pub volts: f64,
}

impl fmt::Display for CycleReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "cycle {}: yaw {:.2}°, pitch {:.2}°, {:.3} V",
            self.cycle, self.yaw_deg, self.pitch_deg, self.volts
        )
    }
}

/// Why `Tracker::run` returned.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StopReason {
    /// The shutdown signal fired.
    Interrupted,
    /// `cycle.max_cycles` cycles completed.
    CycleLimit,
}

#[derive(Debug, Clone, PartialEq)]
pub struct RunSummary {
    pub cycles: u32,
    pub stop: StopReason,
    pub last: Option<CycleReport>,
}
