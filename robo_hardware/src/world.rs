//! Minimal kinematic world closing the loop around the simulated devices.
//!
//! Conventions: heading grows clockwise, a positive turn command turns the
//! robot counter-clockwise, a positive joint duty raises the arm position,
//! a positive belt duty pulls a note in and a positive feed duty pushes it
//! into the shooter wheels. The right climber winch is mounted mirrored, so
//! a negative duty extends it.

use robo_traits::{CameraFrame, TargetCandidate};

use crate::{
    ActuatorProbe, CameraProbe, ChassisProbe, EncoderProbe, GyroProbe, NoteProbe,
    SimulatedActuator, SimulatedCamera, SimulatedChassis, SimulatedEncoder, SimulatedGyro,
    SimulatedNoteSensor,
};

#[derive(Debug, Clone)]
pub struct WorldParams {
    /// Field bearing of the tag from the robot, clockwise positive.
    pub tag_bearing_deg: f64,
    pub tag_distance_m: f64,
    pub tag_id: i32,
    /// Robot-center to camera vector (forward, lateral).
    pub camera_mount: (f64, f64),
    pub camera_fov_deg: f64,
    pub camera_latency_s: f64,
    pub max_turn_rate_dps: f64,
    pub max_speed_mps: f64,
    /// Rotations per second at full joint duty.
    pub arm_rate: f64,
    pub arm_start: f64,
    pub left_offset: f64,
    pub right_offset: f64,
    /// Time the belt must run to pull a note in.
    pub intake_s: f64,
    pub floor_notes: u32,
    /// Fraction of full climber travel per second at full winch duty.
    pub climber_rate: f64,
}

impl Default for WorldParams {
    fn default() -> Self {
        Self {
            tag_bearing_deg: 20.0,
            tag_distance_m: 2.0,
            tag_id: 7,
            camera_mount: (0.3556, 0.2159),
            camera_fov_deg: 70.0,
            camera_latency_s: 0.02,
            max_turn_rate_dps: 180.0,
            max_speed_mps: 2.0,
            arm_rate: 0.5,
            arm_start: 0.05,
            left_offset: 0.886,
            right_offset: 0.359,
            intake_s: 0.4,
            floor_notes: 1,
            climber_rate: 0.5,
        }
    }
}

/// Devices wired into a `SimWorld`, ready to hand to the robot builder.
#[derive(Debug)]
pub struct SimDevices {
    pub chassis: SimulatedChassis,
    pub gyro: SimulatedGyro,
    pub left_encoder: SimulatedEncoder,
    pub right_encoder: SimulatedEncoder,
    pub note_sensor: SimulatedNoteSensor,
    pub joint: SimulatedActuator,
    pub belt: SimulatedActuator,
    pub wheels: SimulatedActuator,
    pub feed: SimulatedActuator,
    pub camera: SimulatedCamera,
    pub climber_left: SimulatedActuator,
    pub climber_right: SimulatedActuator,
}

#[derive(Debug)]
struct Probes {
    chassis: ChassisProbe,
    gyro: GyroProbe,
    left: EncoderProbe,
    right: EncoderProbe,
    note: NoteProbe,
    joint: ActuatorProbe,
    belt: ActuatorProbe,
    wheels: ActuatorProbe,
    feed: ActuatorProbe,
    camera: CameraProbe,
    climber_left: ActuatorProbe,
    climber_right: ActuatorProbe,
}

#[derive(Debug)]
pub struct SimWorld {
    params: WorldParams,
    probes: Probes,
    heading_deg: f64,
    distance_m: f64,
    arm_position: f64,
    note_loaded: bool,
    floor_notes: u32,
    intake_progress_s: f64,
    shots: u32,
    /// `[left, right]` climber extension, 0 retracted to 1 fully out.
    climber: [f64; 2],
}

impl SimWorld {
    pub fn new(params: WorldParams) -> (Self, SimDevices) {
        let devices = SimDevices {
            chassis: SimulatedChassis::new(),
            gyro: SimulatedGyro::new(),
            left_encoder: SimulatedEncoder::new(params.arm_start + params.left_offset),
            right_encoder: SimulatedEncoder::new(params.arm_start + params.right_offset),
            note_sensor: SimulatedNoteSensor::new(),
            joint: SimulatedActuator::new("arm joint"),
            belt: SimulatedActuator::new("arm belt"),
            wheels: SimulatedActuator::new("shooter wheels"),
            feed: SimulatedActuator::new("shooter feed"),
            camera: SimulatedCamera::new(),
            climber_left: SimulatedActuator::new("left climber"),
            climber_right: SimulatedActuator::new("right climber"),
        };
        let probes = Probes {
            chassis: devices.chassis.probe(),
            gyro: devices.gyro.probe(),
            left: devices.left_encoder.probe(),
            right: devices.right_encoder.probe(),
            note: devices.note_sensor.probe(),
            joint: devices.joint.probe(),
            belt: devices.belt.probe(),
            wheels: devices.wheels.probe(),
            feed: devices.feed.probe(),
            camera: devices.camera.probe(),
            climber_left: devices.climber_left.probe(),
            climber_right: devices.climber_right.probe(),
        };
        let mut world = Self {
            distance_m: params.tag_distance_m,
            arm_position: params.arm_start.rem_euclid(1.0),
            floor_notes: params.floor_notes,
            params,
            probes,
            heading_deg: 0.0,
            note_loaded: false,
            intake_progress_s: 0.0,
            shots: 0,
            climber: [0.0; 2],
        };
        world.publish_sensors(0.0);
        (world, devices)
    }

    /// Integrate the last actuator commands over `dt_s` and refresh sensors.
    pub fn step(&mut self, dt_s: f64) {
        let (forward, turn) = self.probes.chassis.last();
        let rate = -turn * self.params.max_turn_rate_dps;
        self.heading_deg += rate * dt_s;
        self.distance_m = (self.distance_m - forward * self.params.max_speed_mps * dt_s).max(0.0);

        self.arm_position =
            (self.arm_position + self.probes.joint.duty() * self.params.arm_rate * dt_s)
                .rem_euclid(1.0);

        let belt = self.probes.belt.duty();
        if belt > 0.05 && !self.note_loaded && self.floor_notes > 0 {
            self.intake_progress_s += dt_s;
            if self.intake_progress_s >= self.params.intake_s {
                self.note_loaded = true;
                self.floor_notes -= 1;
                self.intake_progress_s = 0.0;
                tracing::debug!("sim: note picked up");
            }
        } else {
            self.intake_progress_s = 0.0;
        }
        if belt < -0.05 && self.note_loaded {
            self.note_loaded = false;
            self.floor_notes += 1;
            tracing::debug!("sim: note ejected");
        }

        if self.note_loaded && self.probes.wheels.duty() > 0.5 && self.probes.feed.duty() > 0.05 {
            self.note_loaded = false;
            self.shots += 1;
            tracing::debug!(shots = self.shots, "sim: note shot");
        }

        let travel = self.params.climber_rate * dt_s;
        let [left, right] = &mut self.climber;
        *left = (*left + self.probes.climber_left.duty() * travel).clamp(0.0, 1.0);
        *right = (*right - self.probes.climber_right.duty() * travel).clamp(0.0, 1.0);

        self.publish_sensors(rate);
    }

    fn publish_sensors(&mut self, rate_dps: f64) {
        self.probes.gyro.set(self.heading_deg, rate_dps);
        self.probes
            .left
            .set(self.arm_position + self.params.left_offset);
        self.probes
            .right
            .set(self.arm_position + self.params.right_offset);
        self.probes.note.set(self.note_loaded);

        let bearing = (self.params.tag_bearing_deg - self.heading_deg + 180.0).rem_euclid(360.0)
            - 180.0;
        if bearing.abs() <= self.params.camera_fov_deg / 2.0 {
            let b = bearing.to_radians();
            let (mx, my) = self.params.camera_mount;
            self.probes.camera.set(CameraFrame {
                candidates: vec![TargetCandidate {
                    x: self.distance_m * b.cos() - mx,
                    y: -self.distance_m * b.sin() - my,
                    z: 0.5,
                    tag_id: self.params.tag_id,
                    ambiguity: 0.05,
                }],
                latency_s: self.params.camera_latency_s,
            });
        } else {
            self.probes.camera.clear();
        }
    }

    pub fn heading_deg(&self) -> f64 {
        self.heading_deg
    }

    pub fn distance_m(&self) -> f64 {
        self.distance_m
    }

    pub fn arm_position(&self) -> f64 {
        self.arm_position
    }

    pub fn note_loaded(&self) -> bool {
        self.note_loaded
    }

    pub fn shots(&self) -> u32 {
        self.shots
    }

    /// `[left, right]` climber extension in `[0, 1]`.
    pub fn climber_extension(&self) -> [f64; 2] {
        self.climber
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use robo_traits::{AbsoluteEncoder, Actuator, Chassis, Gyro, TargetSource};

    #[test]
    fn turning_command_moves_heading_counter_clockwise() {
        let (mut world, mut dev) = SimWorld::new(WorldParams::default());
        dev.chassis.arcade_drive(0.0, 0.5).unwrap();
        world.step(0.1);
        assert!(world.heading_deg() < 0.0);
        let g = dev.gyro.sample().unwrap();
        assert_eq!(g.heading_deg, world.heading_deg());
    }

    #[test]
    fn encoders_report_arm_position_plus_offset() {
        let params = WorldParams {
            arm_start: 0.2,
            left_offset: 0.9,
            right_offset: 0.1,
            ..WorldParams::default()
        };
        let (_world, mut dev) = SimWorld::new(params);
        assert!((dev.left_encoder.read().unwrap() - 0.1).abs() < 1e-9);
        assert!((dev.right_encoder.read().unwrap() - 0.3).abs() < 1e-9);
    }

    #[test]
    fn camera_loses_tag_outside_field_of_view() {
        let params = WorldParams {
            tag_bearing_deg: 120.0,
            ..WorldParams::default()
        };
        let (_world, mut dev) = SimWorld::new(params);
        assert!(dev.camera.latest().unwrap().candidates.is_empty());
    }

    #[test]
    fn belt_pulls_note_then_feed_shoots_it() {
        let (mut world, mut dev) = SimWorld::new(WorldParams::default());
        dev.belt.set_duty(0.5).unwrap();
        for _ in 0..25 {
            world.step(0.02);
        }
        assert!(world.note_loaded());
        dev.belt.set_duty(0.0).unwrap();
        dev.wheels.set_duty(1.0).unwrap();
        dev.feed.set_duty(0.3).unwrap();
        world.step(0.02);
        assert!(!world.note_loaded());
        assert_eq!(world.shots(), 1);
    }

    #[test]
    fn mirrored_right_winch_extends_on_negative_duty() {
        let (mut world, mut dev) = SimWorld::new(WorldParams::default());
        dev.climber_left.set_duty(0.3).unwrap();
        dev.climber_right.set_duty(-0.3).unwrap();
        for _ in 0..10 {
            world.step(0.02);
        }
        let [left, right] = world.climber_extension();
        assert!((left - 0.03).abs() < 1e-9);
        assert!((right - 0.03).abs() < 1e-9);

        dev.climber_left.set_duty(-1.0).unwrap();
        dev.climber_right.set_duty(1.0).unwrap();
        world.step(1.0);
        assert_eq!(world.climber_extension(), [0.0, 0.0]);
    }
}
