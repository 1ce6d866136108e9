#![cfg_attr(all(not(debug_assertions), not(test)), deny(warnings))]
#![cfg_attr(
    all(not(debug_assertions), not(test)),
    deny(clippy::all, clippy::pedantic, clippy::nursery)
)]
#![allow(clippy::module_name_repetitions, clippy::missing_errors_doc)]
//! Config schema for the solar tracker.
//!
//! - `Config` and sub-structs are deserialized from TOML and validated.
//! - Only `[pins]` is mandatory; every other section falls back to the
//!   values the rig was tuned with.
use serde::Deserialize;
use std::path::Path;

/// H-bridge wiring, physical (BOARD) pin numbers.
#[derive(Debug, Deserialize)]
pub struct Pins {
    pub yaw_in1: u8,
    pub yaw_in2: u8,
    pub yaw_enable: u8,
    pub pitch_in1: u8,
    pub pitch_in2: u8,
    pub pitch_enable: u8,
}

#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct AdcCfg {
    /// I2C address of the ADS7830
    pub i2c_address: u16,
    /// Single-ended input the panel divider is wired to
    pub channel: u8,
}

impl Default for AdcCfg {
    fn default() -> Self {
        Self {
            i2c_address: 0x4b,
            channel: 0,
        }
    }
}

#[derive(Debug, Deserialize, Clone, Copy, Default, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum Reduction {
    #[default]
    Mean,
    Median,
}

#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct SamplerCfg {
    /// Raw reads averaged into one voltage sample
    pub reads: u32,
    pub read_interval_ms: u64,
    pub reduction: Reduction,
    /// ADC reference voltage
    pub reference_volts: f64,
    /// Raw full-scale count (255 for an 8-bit converter)
    pub max_raw: u16,
    /// Panel volts per volt seen on the ADC input
    pub divider_factor: f64,
}

impl Default for SamplerCfg {
    fn default() -> Self {
        Self {
            reads: 10,
            read_interval_ms: 200,
            reduction: Reduction::Mean,
            reference_volts: 3.3,
            max_raw: 255,
            divider_factor: 5.6,
        }
    }
}

/// Per-axis drive model. `revolution_s` is required whenever the section is
/// present; the step sizes default to 15°/5° and full duty.
#[derive(Debug, Deserialize, Clone)]
pub struct AxisCfg {
    /// Seconds of full-duty actuation for one 360° turn
    pub revolution_s: f64,
    #[serde(default = "de_duty")]
    pub duty_cycle_pct: u8,
    #[serde(default = "de_coarse")]
    pub coarse_deg: f64,
    #[serde(default = "de_fine")]
    pub fine_deg: f64,
}

fn de_duty() -> u8 {
    100
}

fn de_coarse() -> f64 {
    15.0
}

fn de_fine() -> f64 {
    5.0
}

impl AxisCfg {
    pub fn yaw_default() -> Self {
        Self {
            revolution_s: 18.63,
            duty_cycle_pct: de_duty(),
            coarse_deg: de_coarse(),
            fine_deg: de_fine(),
        }
    }

    pub fn pitch_default() -> Self {
        Self {
            revolution_s: 127.44,
            ..Self::yaw_default()
        }
    }

    fn validate(&self, section: &str) -> eyre::Result<()> {
        if !(self.revolution_s.is_finite() && self.revolution_s > 0.0) {
            eyre::bail!("{section}.revolution_s must be > 0");
        }
        if !(1..=100).contains(&self.duty_cycle_pct) {
            eyre::bail!("{section}.duty_cycle_pct must be in [1, 100]");
        }
        if !(self.coarse_deg.is_finite() && self.coarse_deg > 0.0) {
            eyre::bail!("{section}.coarse_deg must be > 0");
        }
        if !(self.fine_deg.is_finite() && self.fine_deg > 0.0) {
            eyre::bail!("{section}.fine_deg must be > 0");
        }
        if self.fine_deg > self.coarse_deg {
            eyre::bail!("{section}.fine_deg must be <= {section}.coarse_deg");
        }
        Ok(())
    }
}

fn de_yaw() -> AxisCfg {
    AxisCfg::yaw_default()
}

fn de_pitch() -> AxisCfg {
    AxisCfg::pitch_default()
}

#[derive(Debug, Deserialize, Default)]
#[serde(default)]
pub struct SearchCfg {
    /// Iteration cap per search phase; 0 keeps the search unbounded
    pub max_iterations: u32,
}

#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct StartupCfg {
    /// Sensor check samples taken before anything moves
    pub test_measurements: u32,
    pub test_gap_ms: u64,
    /// Forward pitch tilt applied before the yaw sweep
    pub initial_pitch_deg: f64,
    /// Sample at 0°/120°/240° yaw before the first climb
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

#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct CycleCfg {
    /// Idle time between two optimization cycles
    pub rest_interval_ms: u64,
    pub countdown_log_every_ms: u64,
    /// 0 runs until interrupted
    pub max_cycles: u32,
}

impl Default for CycleCfg {
    fn default() -> Self {
        Self {
            rest_interval_ms: 60_000,
            countdown_log_every_ms: 10_000,
            max_cycles: 0,
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct StoreCfg {
    pub path: String,
}

impl Default for StoreCfg {
    fn default() -> Self {
        Self {
            path: "position_save.txt".to_string(),
        }
    }
}

#[derive(Debug, Deserialize, Default)]
#[serde(default)]
pub struct Logging {
    pub file: Option<String>,  // path to .log (JSON lines)
    pub level: Option<String>, // "info","debug"
    /// Log rotation policy: "never" | "daily" | "hourly" (default: never)
    pub rotation: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct Hardware {
    /// Software PWM frequency on the enable pins
    pub pwm_frequency_hz: f64,
}

impl Default for Hardware {
    fn default() -> Self {
        Self {
            pwm_frequency_hz: 100.0,
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct Config {
    pub pins: Pins,
    #[serde(default)]
    pub adc: AdcCfg,
    #[serde(default)]
    pub sampler: SamplerCfg,
    #[serde(default = "de_yaw")]
    pub yaw: AxisCfg,
    #[serde(default = "de_pitch")]
    pub pitch: AxisCfg,
    #[serde(default)]
    pub search: SearchCfg,
    #[serde(default)]
    pub startup: StartupCfg,
    #[serde(default)]
    pub cycle: CycleCfg,
    #[serde(default)]
    pub store: StoreCfg,
    #[serde(default)]
    pub logging: Logging,
    #[serde(default)]
    pub hardware: Hardware,
}

pub fn load_toml(s: &str) -> Result<Config, toml::de::Error> {
    toml::from_str::<Config>(s)
}

/// Read, parse and validate a config file.
pub fn load_file(path: &Path) -> eyre::Result<Config> {
    let text = std::fs::read_to_string(path)
        .map_err(|e| eyre::eyre!("read config {:?}: {}", path, e))?;
    let cfg = load_toml(&text).map_err(|e| eyre::eyre!("invalid configuration: {e}"))?;
    cfg.validate()
        .map_err(|e| eyre::eyre!("invalid configuration: {e}"))?;
    Ok(cfg)
}

impl Config {
    pub fn validate(&self) -> eyre::Result<()> {
        // Sampler
        if self.sampler.reads == 0 {
            eyre::bail!("sampler.reads must be >= 1");
        }
        if self.sampler.max_raw == 0 {
            eyre::bail!("sampler.max_raw must be > 0");
        }
        if !(self.sampler.reference_volts.is_finite() && self.sampler.reference_volts > 0.0) {
            eyre::bail!("sampler.reference_volts must be > 0");
        }
        if !(self.sampler.divider_factor.is_finite() && self.sampler.divider_factor > 0.0) {
            eyre::bail!("sampler.divider_factor must be > 0");
        }

        // Axes
        self.yaw.validate("yaw")?;
        self.pitch.validate("pitch")?;

        // Startup
        if !self.startup.initial_pitch_deg.is_finite() {
            eyre::bail!("startup.initial_pitch_deg must be finite");
        }

        // Cycle
        if self.cycle.countdown_log_every_ms == 0 {
            eyre::bail!("cycle.countdown_log_every_ms must be >= 1");
        }

        // Store
        if self.store.path.trim().is_empty() {
            eyre::bail!("store.path must not be empty");
        }

        // Hardware
        if !(self.hardware.pwm_frequency_hz.is_finite() && self.hardware.pwm_frequency_hz > 0.0) {
            eyre::bail!("hardware.pwm_frequency_hz must be > 0");
        }

        // Logging
        if let Some(rot) = self.logging.rotation.as_deref()
            && !matches!(rot, "never" | "daily" | "hourly")
        {
            eyre::bail!("logging.rotation must be one of never|daily|hourly");
        }

        Ok(())
    }
}
