//! Simulated devices implementing the `robo_traits` capabilities.
//!
//! Each device hands out a cloneable probe sharing its state, so tests and
//! the simulation loop can script sensor values and inspect the last command
//! after the device itself has been moved into the control core.

pub mod error;
pub mod world;

use std::sync::{Arc, Mutex, MutexGuard};

use robo_traits::{
    AbsoluteEncoder, Actuator, CameraFrame, Chassis, Gyro, GyroSample, IdleMode, NoteSensor,
    TargetSource,
};

use crate::error::HwError;

pub use world::{SimWorld, WorldParams};

fn lock<T>(m: &Mutex<T>) -> MutexGuard<'_, T> {
    m.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

/// Last command seen by a simulated actuator.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct ActuatorState {
    pub duty: f64,
    pub volts: Option<f64>,
    pub idle_mode: IdleMode,
    pub commands: u64,
    /// When set, the next command fails once with an injected error.
    pub fail_next: bool,
}

#[derive(Debug, Clone, Default)]
pub struct ActuatorProbe(Arc<Mutex<ActuatorState>>);

impl ActuatorProbe {
    pub fn state(&self) -> ActuatorState {
        *lock(&self.0)
    }

    pub fn duty(&self) -> f64 {
        lock(&self.0).duty
    }

    pub fn fail_next(&self) {
        lock(&self.0).fail_next = true;
    }
}

/// Actuator that records what it was told to do.
#[derive(Debug, Default)]
pub struct SimulatedActuator {
    name: &'static str,
    state: ActuatorProbe,
}

impl SimulatedActuator {
    pub fn new(name: &'static str) -> Self {
        Self {
            name,
            state: ActuatorProbe::default(),
        }
    }

    pub fn probe(&self) -> ActuatorProbe {
        self.state.clone()
    }

    fn command(
        &mut self,
        f: impl FnOnce(&mut ActuatorState),
    ) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
        let mut s = lock(&self.state.0);
        if s.fail_next {
            s.fail_next = false;
            return Err(Box::new(HwError::Injected(format!("{} command", self.name))));
        }
        f(&mut s);
        s.commands = s.commands.saturating_add(1);
        Ok(())
    }
}

impl Actuator for SimulatedActuator {
    fn set_duty(&mut self, duty: f64) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
        self.command(|s| {
            s.duty = duty;
            s.volts = None;
        })
    }

    fn set_voltage(&mut self, volts: f64) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
        self.command(|s| {
            s.volts = Some(volts);
            s.duty = 0.0;
        })
    }

    fn set_idle_mode(
        &mut self,
        mode: IdleMode,
    ) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
        self.command(|s| s.idle_mode = mode)
    }
}

#[derive(Debug, Clone, Default)]
pub struct ChassisProbe(Arc<Mutex<(f64, f64)>>);

impl ChassisProbe {
    /// Last `(forward, turn)` command.
    pub fn last(&self) -> (f64, f64) {
        *lock(&self.0)
    }
}

#[derive(Debug, Default)]
pub struct SimulatedChassis {
    last: ChassisProbe,
}

impl SimulatedChassis {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn probe(&self) -> ChassisProbe {
        self.last.clone()
    }
}

impl Chassis for SimulatedChassis {
    fn arcade_drive(
        &mut self,
        forward: f64,
        turn: f64,
    ) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
        *lock(&self.last.0) = (forward, turn);
        Ok(())
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
struct EncoderState {
    raw: f64,
    connected: bool,
}

#[derive(Debug, Clone)]
pub struct EncoderProbe(Arc<Mutex<EncoderState>>);

impl EncoderProbe {
    pub fn set(&self, raw: f64) {
        lock(&self.0).raw = raw.rem_euclid(1.0);
    }

    pub fn set_connected(&self, connected: bool) {
        lock(&self.0).connected = connected;
    }
}

/// Absolute encoder whose raw value is scripted through its probe.
#[derive(Debug)]
pub struct SimulatedEncoder {
    state: EncoderProbe,
}

impl SimulatedEncoder {
    pub fn new(raw: f64) -> Self {
        Self {
            state: EncoderProbe(Arc::new(Mutex::new(EncoderState {
                raw: raw.rem_euclid(1.0),
                connected: true,
            }))),
        }
    }

    pub fn probe(&self) -> EncoderProbe {
        self.state.clone()
    }
}

impl AbsoluteEncoder for SimulatedEncoder {
    fn read(&mut self) -> Result<f64, Box<dyn std::error::Error + Send + Sync>> {
        let s = *lock(&self.state.0);
        if !s.connected {
            return Err(Box::new(HwError::Disconnected("encoder")));
        }
        Ok(s.raw)
    }

    fn is_connected(&mut self) -> bool {
        lock(&self.state.0).connected
    }
}

#[derive(Debug, Clone, Default)]
pub struct GyroProbe(Arc<Mutex<GyroSample>>);

impl GyroProbe {
    pub fn set(&self, heading_deg: f64, rate_dps: f64) {
        *lock(&self.0) = GyroSample {
            heading_deg,
            rate_dps,
        };
    }
}

#[derive(Debug, Default)]
pub struct SimulatedGyro {
    state: GyroProbe,
}

impl SimulatedGyro {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn probe(&self) -> GyroProbe {
        self.state.clone()
    }
}

impl Gyro for SimulatedGyro {
    fn sample(&mut self) -> Result<GyroSample, Box<dyn std::error::Error + Send + Sync>> {
        Ok(*lock(&self.state.0))
    }
}

#[derive(Debug, Clone, Default)]
pub struct NoteProbe(Arc<Mutex<bool>>);

impl NoteProbe {
    pub fn set(&self, present: bool) {
        *lock(&self.0) = present;
    }
}

#[derive(Debug, Default)]
pub struct SimulatedNoteSensor {
    state: NoteProbe,
}

impl SimulatedNoteSensor {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn probe(&self) -> NoteProbe {
        self.state.clone()
    }
}

impl NoteSensor for SimulatedNoteSensor {
    fn has_note(&mut self) -> Result<bool, Box<dyn std::error::Error + Send + Sync>> {
        Ok(*lock(&self.state.0))
    }
}

#[derive(Debug, Clone, Default)]
pub struct CameraProbe(Arc<Mutex<CameraFrame>>);

impl CameraProbe {
    /// Replace the frame returned from now on.
    pub fn set(&self, frame: CameraFrame) {
        *lock(&self.0) = frame;
    }

    pub fn clear(&self) {
        *lock(&self.0) = CameraFrame::default();
    }
}

/// Camera that keeps returning the last scripted frame.
#[derive(Debug, Default)]
pub struct SimulatedCamera {
    frame: CameraProbe,
}

impl SimulatedCamera {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn probe(&self) -> CameraProbe {
        self.frame.clone()
    }
}

impl TargetSource for SimulatedCamera {
    fn latest(&mut self) -> Result<CameraFrame, Box<dyn std::error::Error + Send + Sync>> {
        Ok(lock(&self.frame.0).clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use robo_traits::TargetCandidate;
    use rstest::rstest;

    #[rstest]
    #[case(0.0, 0.0)]
    #[case(1.25, 0.25)]
    #[case(-0.25, 0.75)]
    #[case(3.5, 0.5)]
    fn encoder_wraps_raw_into_one_rotation(#[case] raw: f64, #[case] expected: f64) {
        let mut enc = SimulatedEncoder::new(0.0);
        enc.probe().set(raw);
        assert!((enc.read().unwrap() - expected).abs() < 1e-12);
    }

    #[test]
    fn actuator_probe_sees_commands() {
        let mut motor = SimulatedActuator::new("belt");
        let probe = motor.probe();
        motor.set_duty(0.4).unwrap();
        motor.set_idle_mode(IdleMode::Brake).unwrap();
        let s = probe.state();
        assert_eq!(s.duty, 0.4);
        assert_eq!(s.idle_mode, IdleMode::Brake);
        assert_eq!(s.commands, 2);
    }

    #[test]
    fn voltage_and_duty_replace_each_other() {
        let mut motor = SimulatedActuator::new("wheels");
        let probe = motor.probe();
        motor.set_duty(0.6).unwrap();
        motor.set_voltage(9.0).unwrap();
        assert_eq!((probe.duty(), probe.state().volts), (0.0, Some(9.0)));
        motor.stop().unwrap();
        assert_eq!(probe.state().volts, None);
    }

    #[test]
    fn injected_failure_fires_once() {
        let mut motor = SimulatedActuator::new("joint");
        let probe = motor.probe();
        probe.fail_next();
        let err = motor.set_duty(0.2).expect_err("first command should fail");
        assert!(err.to_string().contains("joint"));
        motor.set_duty(0.2).expect("second command succeeds");
        assert_eq!(probe.duty(), 0.2);
    }

    #[test]
    fn disconnected_encoder_errors_on_read() {
        let mut enc = SimulatedEncoder::new(1.25);
        let probe = enc.probe();
        assert!((enc.read().unwrap() - 0.25).abs() < 1e-12);
        probe.set_connected(false);
        assert!(!enc.is_connected());
        assert!(enc.read().is_err());
    }

    #[test]
    fn camera_returns_scripted_frame() {
        let mut cam = SimulatedCamera::new();
        let probe = cam.probe();
        assert!(cam.latest().unwrap().candidates.is_empty());
        probe.set(CameraFrame {
            candidates: vec![TargetCandidate {
                x: 1.0,
                y: 0.0,
                z: 0.5,
                tag_id: 7,
                ambiguity: 0.1,
            }],
            latency_s: 0.02,
        });
        assert_eq!(cam.latest().unwrap().candidates.len(), 1);
    }
}
