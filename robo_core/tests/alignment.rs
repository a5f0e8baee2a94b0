use robo_core::vision::Offset;
use robo_core::{AlignmentCfg, AlignmentController, AlignmentState, PidGains, TargetView, Tolerance};
use robo_hardware::{ChassisProbe, SimulatedChassis};
use robo_traits::GyroSample;

const RATE_HZ: u32 = 50;
const TURN_DPS: f64 = 180.0;

/// Alignment controller closed around a chassis that turns at a fixed
/// rate per unit of turn command.
struct Rig {
    ctl: AlignmentController<SimulatedChassis>,
    chassis: ChassisProbe,
    heading: f64,
    tag_bearing: f64,
    tag_distance: f64,
}

impl Rig {
    fn new(cfg: AlignmentCfg) -> Self {
        let chassis = SimulatedChassis::new();
        let probe = chassis.probe();
        Self {
            ctl: AlignmentController::new(chassis, cfg, RATE_HZ),
            chassis: probe,
            heading: 0.0,
            tag_bearing: 20.0,
            tag_distance: 2.0,
        }
    }

    fn view(&self) -> TargetView {
        TargetView {
            offset: Some(Offset {
                x: self.tag_distance,
                y: 0.0,
                z: 0.5,
            }),
            heading_deg: Some(self.tag_bearing - self.heading),
            latency_s: Some(0.0),
            tag_id: Some(7),
        }
    }

    fn step_with(&mut self, view: TargetView) -> AlignmentState {
        let gyro = GyroSample {
            heading_deg: self.heading,
            rate_dps: 0.0,
        };
        self.ctl.tick(&view, gyro).expect("tick");
        let (_, turn) = self.chassis.last();
        self.heading -= turn * TURN_DPS / f64::from(RATE_HZ);
        self.ctl.current_state()
    }

    fn step(&mut self) -> AlignmentState {
        let view = self.view();
        self.step_with(view)
    }
}

fn proportional_only() -> AlignmentCfg {
    AlignmentCfg {
        turn_gains: PidGains::new(0.025, 0.0, 0.0),
        turn_tolerance: Tolerance::position(1.0),
        ..AlignmentCfg::default()
    }
}

#[test]
fn align_request_with_target_starts_turning_next_tick() {
    let mut rig = Rig::new(AlignmentCfg::default());
    rig.ctl.request_align();
    assert_eq!(rig.step(), AlignmentState::Turning);
    assert_eq!(rig.ctl.turn_setpoint(), Some(20.0));
}

#[test]
fn align_request_without_target_is_dropped() {
    let mut rig = Rig::new(AlignmentCfg::default());
    rig.ctl.request_align();
    assert_eq!(rig.step_with(TargetView::default()), AlignmentState::Free);
    // requests are level-triggered: nothing carries over to the next tick
    assert_eq!(rig.step(), AlignmentState::Free);
}

#[test]
fn manual_drive_passes_through_only_while_free() {
    let mut rig = Rig::new(AlignmentCfg::default());
    rig.ctl.arcade_drive(0.4, -0.2).expect("in range");
    rig.step_with(TargetView::default());
    assert_eq!(rig.chassis.last(), (0.4, -0.2));

    // not repeated without a fresh request
    rig.step_with(TargetView::default());
    assert_eq!(rig.chassis.last(), (0.0, 0.0));

    rig.ctl.request_align();
    rig.step();
    rig.ctl.arcade_drive(0.9, 0.9).expect("in range");
    assert_eq!(rig.step(), AlignmentState::Turning);
    let (forward, turn) = rig.chassis.last();
    assert_eq!(forward, 0.0);
    assert!(turn < 0.0, "turn {turn} should head clockwise");
}

#[test]
fn losing_the_target_releases_the_chassis() {
    let mut rig = Rig::new(AlignmentCfg::default());
    rig.ctl.request_align();
    rig.step();
    assert_eq!(rig.step_with(TargetView::default()), AlignmentState::Free);
    assert_eq!(rig.chassis.last(), (0.0, 0.0));
}

#[test]
fn turns_onto_target_then_settles_back_to_free() {
    let mut rig = Rig::new(proportional_only());
    rig.ctl.request_align();
    rig.step();

    let mut ticks = 0;
    while rig.step() == AlignmentState::Turning {
        ticks += 1;
        assert!(ticks < 250, "never reached setpoint, heading {}", rig.heading);
    }
    assert_eq!(rig.ctl.current_state(), AlignmentState::Settling);
    assert!((rig.heading - 20.0).abs() < 1.0, "heading {}", rig.heading);

    let settle_ticks = (0.5 * f64::from(RATE_HZ)) as u32;
    for _ in 0..settle_ticks - 1 {
        assert_eq!(rig.step(), AlignmentState::Settling);
        assert_eq!(rig.chassis.last(), (0.0, 0.0));
    }
    assert_eq!(rig.step(), AlignmentState::Free);
}

#[test]
fn turn_times_out_into_settling() {
    let mut rig = Rig::new(AlignmentCfg {
        turn_gains: PidGains::new(0.0, 0.0, 0.0),
        ..AlignmentCfg::default()
    });
    rig.ctl.request_align();
    rig.step();

    let timeout_ticks = 5 * RATE_HZ;
    for _ in 0..timeout_ticks - 1 {
        assert_eq!(rig.step(), AlignmentState::Turning);
    }
    assert_eq!(rig.step(), AlignmentState::Settling);
    assert!(!rig.ctl.turn_at_setpoint());
}

#[test]
fn chained_spacing_drives_to_standoff() {
    let mut rig = Rig::new(AlignmentCfg {
        chain_spacing: true,
        ..proportional_only()
    });
    rig.ctl.request_align();
    rig.step();
    while rig.step() == AlignmentState::Turning {}
    assert_eq!(rig.ctl.current_state(), AlignmentState::Spacing);

    assert_eq!(rig.step(), AlignmentState::Spacing);
    let (forward, turn) = rig.chassis.last();
    assert_eq!(forward, 0.5);
    assert_eq!(turn, 0.0);

    rig.tag_distance = 0.35;
    assert_eq!(rig.step(), AlignmentState::Settling);
    assert!(rig.ctl.spacing_at_setpoint());
}

#[test]
fn abort_returns_to_free_immediately() {
    let mut rig = Rig::new(AlignmentCfg::default());
    rig.ctl.request_align();
    rig.step();
    rig.ctl.abort();
    assert_eq!(rig.ctl.current_state(), AlignmentState::Free);
    rig.ctl.arcade_drive(0.1, 0.0).expect("in range");
    rig.step();
    assert_eq!(rig.chassis.last(), (0.1, 0.0));
}
