//! Configuration types for the tracking engine.
//!
//! These are the runtime configuration structs used by `Tracker`.
//! They are separate from the TOML-deserialized config in `tracker_config`.

/// How the raw reads of one sample are collapsed into a single value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Reduction {
    /// Arithmetic mean (the rig's historical behaviour).
    #[default]
    Mean,
    /// Median; rejects a single spurious read.
    Median,
}

/// Linear conversion from raw ADC counts to panel volts.
///
/// volts = raw / max_raw * reference_volts * divider_factor
#[derive(Debug, Clone, Copy)]
pub struct VoltageCalibration {
    pub reference_volts: f64,
    pub max_raw: u16,
    pub divider_factor: f64,
}

impl VoltageCalibration {
    #[inline]
    pub fn to_volts(&self, raw: f64) -> f64 {
        raw / f64::from(self.max_raw) * self.reference_volts * self.divider_factor
    }

    /// Inverse of `to_volts`, unclamped.
    #[inline]
    pub fn to_raw(&self, volts: f64) -> f64 {
        volts / self.divider_factor / self.reference_volts * f64::from(self.max_raw)
    }
}

impl Default for VoltageCalibration {
    fn default() -> Self {
        Self {
            reference_volts: 3.3,
            max_raw: 255,
            divider_factor: 5.6,
        }
    }
}

/// Voltage sampling configuration.
#[derive(Debug, Clone)]
pub struct SamplerCfg {
    /// Raw reads per sample. Default: 10.
    pub reads: u32,
    /// Delay after each raw read (ms). Default: 200.
    pub read_interval_ms: u64,
    pub reduction: Reduction,
    pub calibration: VoltageCalibration,
}

impl Default for SamplerCfg {
    fn default() -> Self {
        Self {
            reads: 10,
            read_interval_ms: 200,
            reduction: Reduction::Mean,
            calibration: VoltageCalibration::default(),
        }
    }
}

/// Drive model and search increments of one axis.
#[derive(Debug, Clone)]
pub struct AxisCfg {
    /// Actuation seconds per full 360° turn.
    pub revolution_s: f64,
    pub coarse_deg: f64,
    pub fine_deg: f64,
}

impl AxisCfg {
    pub fn yaw() -> Self {
        Self {
            revolution_s: 18.63,
            coarse_deg: 15.0,
            fine_deg: 5.0,
        }
    }

    pub fn pitch() -> Self {
        Self {
            revolution_s: 127.44,
            coarse_deg: 15.0,
            fine_deg: 5.0,
        }
    }
}

/// Hill-climb limits.
#[derive(Debug, Clone, Default)]
pub struct SearchCfg {
    /// Iteration cap per phase; `None` keeps the search unbounded.
    pub max_iterations: Option<u32>,
}

/// One-off steps taken before the first optimization cycle.
#[derive(Debug, Clone)]
pub struct StartupCfg {
    pub test_measurements: u32,
    pub test_gap_ms: u64,
    pub initial_pitch_deg: f64,
    pub tri_sample: bool,
}

impl Default for StartupCfg {
    fn default() -> Self {
        Self {
            test_measurements: 2,
            test_gap_ms: 5_000,
            initial_pitch_deg: 45.0,
            tri_sample: true,
        }
    }
}

/// Outer loop pacing.
#[derive(Debug, Clone)]
pub struct CycleCfg {
    pub rest_interval_ms: u64,
    pub countdown_log_every_ms: u64,
    /// Stop after this many cycles; `None` runs until interrupted.
    pub max_cycles: Option<u32>,
}

impl Default for CycleCfg {
    fn default() -> Self {
        Self {
            rest_interval_ms: 60_000,
            countdown_log_every_ms: 10_000,
            max_cycles: None,
        }
    }
}

/// Everything the tracker needs besides its collaborators.
#[derive(Debug, Clone)]
pub struct TrackerCfg {
    pub sampler: SamplerCfg,
    pub yaw: AxisCfg,
    pub pitch: AxisCfg,
    pub search: SearchCfg,
    pub startup: StartupCfg,
    pub cycle: CycleCfg,
}

impl Default for TrackerCfg {
    fn default() -> Self {
        Self {
            sampler: SamplerCfg::default(),
            yaw: AxisCfg::yaw(),
            pitch: AxisCfg::pitch(),
            search: SearchCfg::default(),
            startup: StartupCfg::default(),
            cycle: CycleCfg::default(),
        }
    }
}
