//! Tick timing and command-range helpers.

use crate::error::ControlError;

/// Number of microseconds in one second.
pub const MICROS_PER_SEC: u64 = 1_000_000;
/// Number of milliseconds in one second.
pub const MILLIS_PER_SEC: u64 = 1_000;

/// Compute the tick period in microseconds for a given rate in Hz.
/// - Clamps `hz` to at least 1 to avoid division by zero.
/// - Ensures result is at least 1 microsecond.
#[inline]
pub fn period_us(hz: u32) -> u64 {
    (MICROS_PER_SEC / u64::from(hz.max(1))).max(1)
}

/// Compute the tick period in milliseconds for a given rate in Hz.
#[inline]
pub fn period_ms(hz: u32) -> u64 {
    (MILLIS_PER_SEC / u64::from(hz.max(1))).max(1)
}

/// Tick period in seconds, as used by the PID loops.
#[inline]
pub fn period_s(hz: u32) -> f64 {
    1.0 / f64::from(hz.max(1))
}

/// Number of ticks a timed state lasts, never less than one.
#[inline]
pub fn ticks_for(seconds: f64, hz: u32) -> u32 {
    if !seconds.is_finite() || seconds <= 0.0 {
        return 1;
    }
    let ticks = (seconds * f64::from(hz.max(1))).round();
    if ticks >= f64::from(u32::MAX) {
        u32::MAX
    } else {
        (ticks as u32).max(1)
    }
}

/// Restrict `value` to `[-limit, limit]`.
#[inline]
pub fn clamp_magnitude(value: f64, limit: f64) -> f64 {
    let limit = limit.abs();
    value.clamp(-limit, limit)
}

/// Accept a caller-supplied actuator command only if it lies in `[-1, 1]`.
///
/// Out-of-range input is a caller bug and is reported, not clamped.
pub fn check_command(name: &'static str, value: f64) -> Result<f64, ControlError> {
    if value.is_finite() && (-1.0..=1.0).contains(&value) {
        Ok(value)
    } else {
        Err(ControlError::InvalidCommand { name, value })
    }
}
