//! Maps `Box<dyn Error>` from trait boundaries to typed `ControlError`.
//!
//! The traits in `robo_traits` use `Box<dyn Error + Send + Sync>` so any
//! vendor adapter can plug in; this module converts those to our typed error
//! enum, with an optional feature-gated path for `robo_hardware::HwError`.

use crate::error::ControlError;

/// Map a trait-boundary error to a typed `ControlError`.
///
/// Attempts to downcast known hardware error types first, then falls back
/// to string-based heuristics.
pub fn map_hw_error(e: &(dyn std::error::Error + 'static)) -> ControlError {
    #[cfg(feature = "hardware-errors")]
    {
        if let Some(hw) = e.downcast_ref::<robo_hardware::error::HwError>() {
            return match hw {
                robo_hardware::error::HwError::Disconnected(_)
                | robo_hardware::error::HwError::Timeout => {
                    ControlError::HardwareFault(hw.to_string())
                }
                other => ControlError::Hardware(other.to_string()),
            };
        }
    }

    let s = e.to_string();
    let lower = s.to_lowercase();
    if lower.contains("timeout") || lower.contains("disconnected") {
        ControlError::HardwareFault(s)
    } else {
        ControlError::Hardware(s)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unknown_errors_fall_back_to_string_heuristics() {
        let e = std::io::Error::other("bus timeout on CAN id 6");
        assert!(matches!(map_hw_error(&e), ControlError::HardwareFault(_)));
        let e = std::io::Error::other("brownout");
        assert!(matches!(map_hw_error(&e), ControlError::Hardware(_)));
    }

    #[cfg(feature = "hardware-errors")]
    #[test]
    fn hardware_errors_downcast_precisely() {
        let e = robo_hardware::error::HwError::Injected("joint".into());
        assert_eq!(
            map_hw_error(&e),
            ControlError::Hardware("injected fault: joint".into())
        );
        let e = robo_hardware::error::HwError::Disconnected("encoder");
        assert!(matches!(map_hw_error(&e), ControlError::HardwareFault(_)));
    }
}
