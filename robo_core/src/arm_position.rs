//! Arm position from two absolute encoders on opposite sides of the joint.

use robo_traits::AbsoluteEncoder;

use crate::config::{ArmCfg, EncoderCal};
use crate::cyclic::{cyclic_average, cyclic_contains, cyclic_delta, cyclic_distance, wrap_unit};
use crate::status::SensorFault;

/// Which end of the operating arc the arm has gone beyond.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LimitSide {
    Lower,
    Upper,
}

/// Estimator output for one tick.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct ArmReading {
    /// Fused position in `[0, 1)`; `None` on a fault.
    pub position: Option<f64>,
    /// Rotations per second, 0 when either this or the previous tick had no position.
    pub speed: f64,
    pub limit: Option<LimitSide>,
    pub fault: Option<SensorFault>,
    /// Calibrated per-side readings, `None` when that side is disconnected.
    pub left: Option<f64>,
    pub right: Option<f64>,
}

impl ArmReading {
    pub fn is_past_lower_limit(&self) -> bool {
        self.limit == Some(LimitSide::Lower)
    }

    pub fn is_past_upper_limit(&self) -> bool {
        self.limit == Some(LimitSide::Upper)
    }
}

/// Apply a side's calibration to a raw reading.
pub fn calibrate(raw: f64, cal: EncoderCal) -> f64 {
    let adjusted = wrap_unit(raw - cal.offset);
    if cal.inverted {
        wrap_unit(-adjusted)
    } else {
        adjusted
    }
}

/// Combine two calibrated readings.
///
/// Both present and within `tolerance` of each other (measured around the
/// circle) average across the wrap boundary; a single reading is trusted
/// as-is.
pub fn fuse(left: Option<f64>, right: Option<f64>, tolerance: f64) -> Result<f64, SensorFault> {
    match (left, right) {
        (Some(l), Some(r)) if cyclic_distance(l, r) <= tolerance => Ok(cyclic_average(l, r)),
        (Some(_), Some(_)) => Err(SensorFault::EncoderDisagreement),
        (Some(v), None) | (None, Some(v)) => Ok(wrap_unit(v)),
        (None, None) => Err(SensorFault::EncodersDisconnected),
    }
}

/// Where `position` sits relative to the short arc `lower..upper`.
///
/// Outside the arc, the midpoint of the complementary arc splits the two
/// sides; a position exactly on it counts as past the lower limit.
pub fn limit_side(position: f64, lower: f64, upper: f64) -> Option<LimitSide> {
    if cyclic_contains(position, lower, upper) {
        None
    } else if cyclic_distance(position, lower) <= cyclic_distance(position, upper) {
        Some(LimitSide::Lower)
    } else {
        Some(LimitSide::Upper)
    }
}

#[derive(Debug)]
pub struct ArmPositionEstimator<E: AbsoluteEncoder> {
    left: E,
    right: E,
    left_cal: EncoderCal,
    right_cal: EncoderCal,
    tolerance: f64,
    lower_limit: f64,
    upper_limit: f64,
    period_s: f64,
    last: ArmReading,
}

impl<E: AbsoluteEncoder> ArmPositionEstimator<E> {
    pub fn new(left: E, right: E, cfg: &ArmCfg, period_s: f64) -> Self {
        Self {
            left,
            right,
            left_cal: cfg.left,
            right_cal: cfg.right,
            tolerance: cfg.disagreement_tolerance,
            lower_limit: cfg.lower_limit,
            upper_limit: cfg.upper_limit,
            period_s,
            last: ArmReading::default(),
        }
    }

    /// Sample both encoders and fuse them.
    pub fn update(&mut self) -> ArmReading {
        let left = read_side(&mut self.left, self.left_cal, "left");
        let right = read_side(&mut self.right, self.right_cal, "right");
        self.update_from_readings(left, right)
    }

    /// Fuse already-calibrated readings; `None` means that side is disconnected.
    pub fn update_from_readings(&mut self, left: Option<f64>, right: Option<f64>) -> ArmReading {
        let (position, fault) = match fuse(left, right, self.tolerance) {
            Ok(p) => (Some(p), None),
            Err(f) => {
                if self.last.fault != Some(f) {
                    tracing::warn!(fault = ?f, ?left, ?right, "arm position unavailable");
                }
                (None, Some(f))
            }
        };
        let speed = match (self.last.position, position) {
            (Some(prev), Some(now)) => cyclic_delta(prev, now) / self.period_s,
            _ => 0.0,
        };
        self.last = ArmReading {
            position,
            speed,
            limit: position.and_then(|p| limit_side(p, self.lower_limit, self.upper_limit)),
            fault,
            left,
            right,
        };
        self.last
    }

    /// Result of the most recent update.
    pub fn reading(&self) -> ArmReading {
        self.last
    }

    pub fn position(&self) -> Option<f64> {
        self.last.position
    }

    pub fn is_past_lower_limit(&self) -> bool {
        self.last.is_past_lower_limit()
    }

    pub fn is_past_upper_limit(&self) -> bool {
        self.last.is_past_upper_limit()
    }

    pub fn set_calibration(&mut self, left: EncoderCal, right: EncoderCal) {
        self.left_cal = left;
        self.right_cal = right;
    }

    pub fn set_disagreement_tolerance(&mut self, tolerance: f64) {
        self.tolerance = tolerance;
    }
}

fn read_side<E: AbsoluteEncoder>(enc: &mut E, cal: EncoderCal, side: &'static str) -> Option<f64> {
    if !enc.is_connected() {
        return None;
    }
    match enc.read() {
        Ok(raw) if raw.is_finite() => Some(calibrate(raw, cal)),
        Ok(raw) => {
            tracing::trace!(side, raw, "non-finite encoder reading");
            None
        }
        Err(e) => {
            tracing::trace!(side, error = %e, "encoder read failed");
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case(0.886, false, 0.886, 0.0)]
    #[case(0.936, false, 0.886, 0.05)]
    #[case(0.836, false, 0.886, 0.95)]
    #[case(0.836, true, 0.886, 0.05)]
    fn calibration_wraps(
        #[case] raw: f64,
        #[case] inverted: bool,
        #[case] offset: f64,
        #[case] expected: f64,
    ) {
        let got = calibrate(raw, EncoderCal { offset, inverted });
        assert!(cyclic_distance(got, expected) < 1e-9, "got {got}");
    }

    #[rstest]
    #[case(0.3, None)]
    #[case(0.01, Some(LimitSide::Lower))]
    #[case(0.6, Some(LimitSide::Upper))]
    #[case(0.9, Some(LimitSide::Lower))]
    fn limit_regions(#[case] pos: f64, #[case] side: Option<LimitSide>) {
        assert_eq!(limit_side(pos, 0.02, 0.43), side);
    }

    #[test]
    fn complementary_midpoint_counts_as_lower() {
        // arc 0.2..0.4, complementary midpoint 0.8
        assert_eq!(limit_side(0.8, 0.2, 0.4), Some(LimitSide::Lower));
    }
}
