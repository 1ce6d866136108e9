//! `From` implementations bridging `tracker_config` types to `tracker_core` types.

use crate::config::{
    AxisCfg, CycleCfg, Reduction, SamplerCfg, SearchCfg, StartupCfg, TrackerCfg,
    VoltageCalibration,
};

// ── SamplerCfg ───────────────────────────────────────────────────────────────

impl From<tracker_config::Reduction> for Reduction {
    fn from(r: tracker_config::Reduction) -> Self {
        match r {
            tracker_config::Reduction::Mean => Reduction::Mean,
            tracker_config::Reduction::Median => Reduction::Median,
        }
    }
}

impl From<&tracker_config::SamplerCfg> for SamplerCfg {
    fn from(c: &tracker_config::SamplerCfg) -> Self {
        Self {
            reads: c.reads,
            read_interval_ms: c.read_interval_ms,
            reduction: c.reduction.into(),
            calibration: VoltageCalibration {
                reference_volts: c.reference_volts,
                max_raw: c.max_raw,
                divider_factor: c.divider_factor,
            },
        }
    }
}

// ── AxisCfg ──────────────────────────────────────────────────────────────────

impl From<&tracker_config::AxisCfg> for AxisCfg {
    fn from(c: &tracker_config::AxisCfg) -> Self {
        Self {
            revolution_s: c.revolution_s,
            coarse_deg: c.coarse_deg,
            fine_deg: c.fine_deg,
        }
    }
}

// ── SearchCfg / StartupCfg / CycleCfg ────────────────────────────────────────

impl From<&tracker_config::SearchCfg> for SearchCfg {
    fn from(c: &tracker_config::SearchCfg) -> Self {
        Self {
            max_iterations: (c.max_iterations > 0).then_some(c.max_iterations),
        }
    }
}

impl From<&tracker_config::StartupCfg> for StartupCfg {
    fn from(c: &tracker_config::StartupCfg) -> Self {
        Self {
            test_measurements: c.test_measurements,
            test_gap_ms: c.test_gap_ms,
            initial_pitch_deg: c.initial_pitch_deg,
            tri_sample: c.tri_sample,
        }
    }
}

impl From<&tracker_config::CycleCfg> for CycleCfg {
    fn from(c: &tracker_config::CycleCfg) -> Self {
        Self {
            rest_interval_ms: c.rest_interval_ms,
            countdown_log_every_ms: c.countdown_log_every_ms,
            max_cycles: (c.max_cycles > 0).then_some(c.max_cycles),
        }
    }
}

// ── TrackerCfg ───────────────────────────────────────────────────────────────

impl From<&tracker_config::Config> for TrackerCfg {
    fn from(c: &tracker_config::Config) -> Self {
        Self {
            sampler: (&c.sampler).into(),
            yaw: (&c.yaw).into(),
            pitch: (&c.pitch).into(),
            search: (&c.search).into(),
            startup: (&c.startup).into(),
            cycle: (&c.cycle).into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn zero_limits_map_to_unbounded() {
        let search: SearchCfg = (&tracker_config::SearchCfg { max_iterations: 0 }).into();
        assert_eq!(search.max_iterations, None);
        let cycle: CycleCfg = (&tracker_config::CycleCfg {
            rest_interval_ms: 5,
            countdown_log_every_ms: 1,
            max_cycles: 3,
        })
            .into();
        assert_eq!(cycle.max_cycles, Some(3));
    }
}
