//! Capability interfaces between the control core and the hardware.
//!
//! Every method is pull-based and non-blocking: the core calls into these
//! once per tick. Errors cross the boundary boxed so that adapters for any
//! vendor library can report their own error types.

pub mod clock;

pub use clock::{Clock, MonotonicClock, VirtualClock};

/// Motor behaviour when the commanded output is zero.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum IdleMode {
    #[default]
    Coast,
    Brake,
}

/// A single motor (or a group wired to act as one).
pub trait Actuator {
    /// Normalized output power in `[-1, 1]`.
    fn set_duty(&mut self, duty: f64) -> Result<(), Box<dyn std::error::Error + Send + Sync>>;
    /// Absolute voltage target.
    fn set_voltage(&mut self, volts: f64) -> Result<(), Box<dyn std::error::Error + Send + Sync>>;
    fn set_idle_mode(
        &mut self,
        mode: IdleMode,
    ) -> Result<(), Box<dyn std::error::Error + Send + Sync>>;

    fn stop(&mut self) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
        self.set_duty(0.0)
    }
}

/// Drive base accepting arcade-style commands, both in `[-1, 1]`.
pub trait Chassis {
    fn arcade_drive(
        &mut self,
        forward: f64,
        turn: f64,
    ) -> Result<(), Box<dyn std::error::Error + Send + Sync>>;
}

/// Absolute rotary encoder reporting a fraction of one rotation.
pub trait AbsoluteEncoder {
    /// Raw position in `[0, 1)`.
    fn read(&mut self) -> Result<f64, Box<dyn std::error::Error + Send + Sync>>;
    fn is_connected(&mut self) -> bool;
}

/// One gyro reading. Heading grows clockwise; it may be unwrapped.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct GyroSample {
    pub heading_deg: f64,
    pub rate_dps: f64,
}

pub trait Gyro {
    fn sample(&mut self) -> Result<GyroSample, Box<dyn std::error::Error + Send + Sync>>;
}

/// Game-piece presence sensor (beam break or similar) mounted on the arm.
pub trait NoteSensor {
    fn has_note(&mut self) -> Result<bool, Box<dyn std::error::Error + Send + Sync>>;
}

/// A fiducial detected by a camera, expressed as an offset from the camera.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TargetCandidate {
    /// Forward, meters.
    pub x: f64,
    /// Lateral, meters.
    pub y: f64,
    /// Vertical, meters.
    pub z: f64,
    pub tag_id: i32,
    /// Pose ambiguity score; lower is better.
    pub ambiguity: f64,
}

/// Latest pipeline result of one camera.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct CameraFrame {
    pub candidates: Vec<TargetCandidate>,
    /// Capture-to-publish latency in seconds.
    pub latency_s: f64,
}

pub trait TargetSource {
    fn latest(&mut self) -> Result<CameraFrame, Box<dyn std::error::Error + Send + Sync>>;
}

impl<T: Actuator + ?Sized> Actuator for Box<T> {
    fn set_duty(&mut self, duty: f64) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
        (**self).set_duty(duty)
    }
    fn set_voltage(&mut self, volts: f64) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
        (**self).set_voltage(volts)
    }
    fn set_idle_mode(
        &mut self,
        mode: IdleMode,
    ) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
        (**self).set_idle_mode(mode)
    }
    fn stop(&mut self) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
        (**self).stop()
    }
}

impl<T: Chassis + ?Sized> Chassis for Box<T> {
    fn arcade_drive(
        &mut self,
        forward: f64,
        turn: f64,
    ) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
        (**self).arcade_drive(forward, turn)
    }
}

impl<T: AbsoluteEncoder + ?Sized> AbsoluteEncoder for Box<T> {
    fn read(&mut self) -> Result<f64, Box<dyn std::error::Error + Send + Sync>> {
        (**self).read()
    }
    fn is_connected(&mut self) -> bool {
        (**self).is_connected()
    }
}

impl<T: Gyro + ?Sized> Gyro for Box<T> {
    fn sample(&mut self) -> Result<GyroSample, Box<dyn std::error::Error + Send + Sync>> {
        (**self).sample()
    }
}

impl<T: NoteSensor + ?Sized> NoteSensor for Box<T> {
    fn has_note(&mut self) -> Result<bool, Box<dyn std::error::Error + Send + Sync>> {
        (**self).has_note()
    }
}

impl<T: TargetSource + ?Sized> TargetSource for Box<T> {
    fn latest(&mut self) -> Result<CameraFrame, Box<dyn std::error::Error + Send + Sync>> {
        (**self).latest()
    }
}
