//! Discrete PID controller with optional continuous (wrapped) input.
//!
//! One controller belongs to exactly one state machine. The owner calls
//! [`PidController::calculate`] once per tick with the fixed tick period
//! given at construction.

/// Proportional, integral and derivative gains.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PidGains {
    pub kp: f64,
    pub ki: f64,
    pub kd: f64,
}

impl PidGains {
    pub const fn new(kp: f64, ki: f64, kd: f64) -> Self {
        Self { kp, ki, kd }
    }

    pub fn is_finite(&self) -> bool {
        self.kp.is_finite() && self.ki.is_finite() && self.kd.is_finite()
    }
}

/// Position and velocity tolerances used by [`PidController::at_setpoint`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Tolerance {
    pub position: f64,
    pub velocity: f64,
}

impl Tolerance {
    /// Position-only tolerance; any rate of change is accepted.
    pub const fn position(position: f64) -> Self {
        Self {
            position,
            velocity: f64::INFINITY,
        }
    }
}

impl Default for Tolerance {
    fn default() -> Self {
        Self {
            position: 0.05,
            velocity: f64::INFINITY,
        }
    }
}

#[derive(Debug, Clone)]
pub struct PidController {
    gains: PidGains,
    period_s: f64,
    setpoint: f64,
    has_setpoint: bool,
    last_measurement: Option<f64>,
    continuous: Option<(f64, f64)>,
    tolerance: Tolerance,
    integrator_range: (f64, f64),
    position_error: f64,
    velocity_error: f64,
    prev_error: f64,
    total_error: f64,
}

impl PidController {
    /// A controller with the given gains evaluated every `period_s` seconds.
    ///
    /// A non-positive or non-finite period falls back to 20 ms.
    pub fn new(gains: PidGains, period_s: f64) -> Self {
        let period_s = if period_s.is_finite() && period_s > 0.0 {
            period_s
        } else {
            0.02
        };
        Self {
            gains,
            period_s,
            setpoint: 0.0,
            has_setpoint: false,
            last_measurement: None,
            continuous: None,
            tolerance: Tolerance::default(),
            integrator_range: (-1.0, 1.0),
            position_error: 0.0,
            velocity_error: 0.0,
            prev_error: 0.0,
            total_error: 0.0,
        }
    }

    /// Treat the input as wrapping from `max` back to `min`.
    pub fn enable_continuous_input(&mut self, min: f64, max: f64) {
        self.continuous = Some((min.min(max), min.max(max)));
    }

    pub fn disable_continuous_input(&mut self) {
        self.continuous = None;
    }

    pub fn is_continuous_input_enabled(&self) -> bool {
        self.continuous.is_some()
    }

    pub fn gains(&self) -> PidGains {
        self.gains
    }

    pub fn set_gains(&mut self, gains: PidGains) {
        self.gains = gains;
    }

    pub fn tolerance(&self) -> Tolerance {
        self.tolerance
    }

    pub fn set_tolerance(&mut self, tolerance: Tolerance) {
        self.tolerance = tolerance;
    }

    /// Bound the integral term's contribution to `[min, max]` of output.
    pub fn set_integrator_range(&mut self, min: f64, max: f64) {
        self.integrator_range = (min.min(max), min.max(max));
    }

    pub fn setpoint(&self) -> f64 {
        self.setpoint
    }

    pub fn has_setpoint(&self) -> bool {
        self.has_setpoint
    }

    pub fn set_setpoint(&mut self, setpoint: f64) {
        self.setpoint = setpoint;
        self.has_setpoint = true;
        if let Some(m) = self.last_measurement {
            // keep the error in step with the new goal until the next calculate
            self.position_error = self.error_to(m);
        }
    }

    pub fn position_error(&self) -> f64 {
        self.position_error
    }

    pub fn velocity_error(&self) -> f64 {
        self.velocity_error
    }

    /// True once a measurement has been taken and both errors are within tolerance.
    pub fn at_setpoint(&self) -> bool {
        self.last_measurement.is_some()
            && self.has_setpoint
            && self.position_error.abs() < self.tolerance.position
            && self.velocity_error.abs() < self.tolerance.velocity
    }

    /// Advance the loop one period and return the raw (unclamped) output.
    pub fn calculate(&mut self, measurement: f64) -> f64 {
        self.prev_error = self.position_error;
        self.last_measurement = Some(measurement);
        self.position_error = self.error_to(measurement);
        self.velocity_error = (self.position_error - self.prev_error) / self.period_s;

        if self.gains.ki != 0.0 {
            let (lo, hi) = self.integrator_range;
            let (lo, hi) = (lo / self.gains.ki, hi / self.gains.ki);
            self.total_error = (self.total_error + self.position_error * self.period_s)
                .clamp(lo.min(hi), lo.max(hi));
        }

        self.gains.kp * self.position_error
            + self.gains.ki * self.total_error
            + self.gains.kd * self.velocity_error
    }

    /// Clear accumulated error history; gains, setpoint and tolerance stay.
    pub fn reset(&mut self) {
        self.position_error = 0.0;
        self.velocity_error = 0.0;
        self.prev_error = 0.0;
        self.total_error = 0.0;
        self.last_measurement = None;
    }

    fn error_to(&self, measurement: f64) -> f64 {
        let raw = self.setpoint - measurement;
        match self.continuous {
            Some((min, max)) => {
                let bound = (max - min) / 2.0;
                input_modulus(raw, -bound, bound)
            }
            None => raw,
        }
    }
}

/// Wrap `input` into `[min, max)` where the span is one full cycle.
pub fn input_modulus(input: f64, min: f64, max: f64) -> f64 {
    let span = max - min;
    if span <= 0.0 || !span.is_finite() {
        return input;
    }
    min + (input - min).rem_euclid(span)
}
