//! Maps `Box<dyn Error>` from trait boundaries to typed `TrackerError`.
//!
//! The traits in `tracker_traits` use `Box<dyn Error + Send + Sync>` for maximum
//! flexibility; this module converts those to our typed error enum, with an
//! optional feature-gated path for `tracker_hardware::HwError` downcasting.

use crate::error::TrackerError;

/// Map a trait-boundary error to a typed `TrackerError`.
///
/// Attempts to downcast known hardware error types first, then falls back
/// to string-based heuristics.
pub fn map_hw_error(e: &(dyn std::error::Error + 'static)) -> TrackerError {
    // Feature-gated: try to downcast to HwError for precise mapping
    #[cfg(feature = "hardware-errors")]
    {
        if let Some(hw) = e.downcast_ref::<tracker_hardware::error::HwError>() {
            return match hw {
                tracker_hardware::error::HwError::NotDetected { .. } => {
                    TrackerError::SensorNotDetected(hw.to_string())
                }
                other => TrackerError::HardwareFault(other.to_string()),
            };
        }
    }

    // Fallback: string-based detection
    let s = e.to_string();
    if s.to_lowercase().contains("not detected") {
        TrackerError::SensorNotDetected(s)
    } else {
        TrackerError::Hardware(s)
    }
}
