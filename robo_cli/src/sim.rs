//! Simulated runs: config mapping, sim assembly, scripted intents and reporting.

use std::sync::Arc;
use std::sync::atomic::AtomicBool;

use eyre::WrapErr;
use robo_core::error::Result as CoreResult;
use robo_core::runner::{RunOptions, RunSummary, run};
use robo_core::util::period_s;
use robo_core::{
    ArmHardware, ArmState, ClimberHardware, DriveHardware, Intent, Robot, RobotCfg, ShooterHardware, ShooterState,
    TickReport,
};
use robo_hardware::world::SimDevices;
use robo_hardware::{ActuatorProbe, SimWorld, WorldParams};
use robo_traits::{Clock, MonotonicClock, VirtualClock};
use serde_json::json;

use crate::cli::Scenario;

/// Test hook: make the arm joint fail once on the tick after this one.
const FAIL_JOINT_ENV: &str = "ROBOCORE_SIM_FAIL_JOINT_AT";

/// Ticks the climb scenario spends extending before it contracts.
const CLIMB_EXTEND_TICKS: u64 = 100;

#[derive(Debug, Clone, Copy)]
pub struct SimOptions {
    pub scenario: Scenario,
    pub ticks: u64,
    pub tag_bearing_deg: f64,
    pub realtime: bool,
    pub trace_ticks: bool,
    pub json: bool,
}

/// Where the simulated robot ended up.
#[derive(Debug, Clone)]
pub struct SimOutcome {
    pub run: RunSummary,
    pub heading_deg: f64,
    pub arm_position: f64,
    pub note_loaded: bool,
    pub shots: u32,
    pub climber_extension: [f64; 2],
}

/// World parameters consistent with the robot's calibration, so a
/// correctly configured robot sees a correctly built world.
fn world_params(cfg: &robo_config::Config, tag_bearing_deg: f64) -> WorldParams {
    WorldParams {
        tag_bearing_deg,
        camera_mount: (cfg.vision.mount_x, cfg.vision.mount_y),
        arm_start: cfg.arm.retracted,
        left_offset: cfg.arm.left_offset,
        right_offset: cfg.arm.right_offset,
        ..WorldParams::default()
    }
}

/// Assemble a robot around freshly simulated hardware.
pub fn build_sim(
    cfg: &robo_config::Config,
    tag_bearing_deg: f64,
) -> CoreResult<(SimWorld, Robot, ActuatorProbe)> {
    let (world, dev) = SimWorld::new(world_params(cfg, tag_bearing_deg));
    let SimDevices {
        chassis,
        gyro,
        left_encoder,
        right_encoder,
        note_sensor,
        joint,
        belt,
        wheels,
        feed,
        camera,
        climber_left,
        climber_right,
    } = dev;
    let joint_probe = joint.probe();
    let robot = Robot::builder()
        .with_config(RobotCfg::from(cfg))
        .with_drive(DriveHardware::new(chassis, gyro))
        .with_arm(ArmHardware::new(
            joint,
            belt,
            left_encoder,
            right_encoder,
            note_sensor,
        ))
        .with_shooter(ShooterHardware::new(wheels, feed))
        .with_camera(camera)
        .with_climber(ClimberHardware::new(climber_left, climber_right))
        .build()
        .wrap_err("building robot")?;
    Ok((world, robot, joint_probe))
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Phase {
    Start,
    Deploying,
    Intaking,
    Holding,
    Shooting,
}

/// Operator stand-in producing one `Intent` per tick.
#[derive(Debug)]
pub struct Script {
    scenario: Scenario,
    phase: Phase,
}

impl Script {
    pub fn new(scenario: Scenario) -> Self {
        Self {
            scenario,
            phase: Phase::Start,
        }
    }

    pub fn intent(&mut self, tick: u64, robot: &Robot) -> Intent {
        match self.scenario {
            Scenario::Idle => Intent::default(),
            Scenario::Align => Intent {
                align: tick == 0,
                ..Intent::default()
            },
            Scenario::Intake | Scenario::Shoot => self.note_cycle(robot),
            Scenario::Climb => Intent {
                extend_left: tick < CLIMB_EXTEND_TICKS,
                extend_right: tick < CLIMB_EXTEND_TICKS,
                contract_left: tick >= CLIMB_EXTEND_TICKS,
                contract_right: tick >= CLIMB_EXTEND_TICKS,
                ..Intent::default()
            },
        }
    }

    fn note_cycle(&mut self, robot: &Robot) -> Intent {
        let mut intent = Intent::default();
        match self.phase {
            Phase::Start => {
                intent.arm_down = true;
                self.advance(Phase::Deploying);
            }
            Phase::Deploying => {
                if robot.arm_snapshot().state == ArmState::Ready {
                    intent.intake = true;
                    self.advance(Phase::Intaking);
                }
            }
            Phase::Intaking => {
                if robot.shooter_snapshot().state == ShooterState::Holding {
                    self.advance(Phase::Holding);
                } else {
                    intent.intake = true;
                }
            }
            Phase::Holding => {
                if self.scenario == Scenario::Shoot {
                    intent.shoot = true;
                    self.advance(Phase::Shooting);
                }
            }
            Phase::Shooting => {}
        }
        intent
    }

    fn advance(&mut self, next: Phase) {
        tracing::info!(from = ?self.phase, to = ?next, "script phase");
        self.phase = next;
    }
}

pub fn report_json(r: &TickReport) -> serde_json::Value {
    json!({
        "tick": r.tick,
        "alignment": r.alignment.as_str(),
        "arm": r.arm.as_str(),
        "shooter": r.shooter.as_str(),
        "forward": r.drive.forward,
        "turn": r.drive.turn,
        "arm_position": r.arm_position,
        "has_target": r.has_target,
        "has_note": r.has_note,
        "faults": r.faults.iter().map(|f| f.as_str()).collect::<Vec<_>>(),
    })
}

fn report_line(r: &TickReport) -> String {
    let position = r
        .arm_position
        .map_or_else(|| "-".to_string(), |p| format!("{p:.3}"));
    let faults = if r.faults.is_empty() {
        String::new()
    } else {
        let names: Vec<&str> = r.faults.iter().map(|f| f.as_str()).collect();
        format!(" faults={}", names.join(","))
    };
    format!(
        "tick {:>5}  align={:<8} arm={:<13} shooter={:<8} drive=({:+.2},{:+.2}) arm_pos={position}{faults}",
        r.tick,
        r.alignment.as_str(),
        r.arm.as_str(),
        r.shooter.as_str(),
        r.drive.forward,
        r.drive.turn,
    )
}

/// Run a scripted scenario until the tick budget or a shutdown request.
pub fn run_sim(
    cfg: &robo_config::Config,
    opts: SimOptions,
    shutdown: Arc<AtomicBool>,
) -> CoreResult<SimOutcome> {
    let (mut world, mut robot, joint) = build_sim(cfg, opts.tag_bearing_deg)?;
    let dt = period_s(robot.rate_hz());
    let fail_joint_at = std::env::var(FAIL_JOINT_ENV)
        .ok()
        .and_then(|v| v.trim().parse::<u64>().ok());
    let clock: Box<dyn Clock> = if opts.realtime {
        Box::new(MonotonicClock::new())
    } else {
        Box::new(VirtualClock::new())
    };
    let run_opts = RunOptions {
        max_ticks: Some(opts.ticks),
        shutdown: Some(shutdown),
    };

    tracing::info!(scenario = ?opts.scenario, ticks = opts.ticks, realtime = opts.realtime, "run start");
    let mut script = Script::new(opts.scenario);
    let summary = run(
        &mut robot,
        clock.as_ref(),
        &run_opts,
        |tick, robot| script.intent(tick, robot),
        |report| {
            world.step(dt);
            if fail_joint_at == Some(report.tick) {
                joint.fail_next();
            }
            if opts.trace_ticks {
                if opts.json {
                    println!("{}", report_json(report));
                } else {
                    println!("{}", report_line(report));
                }
            }
        },
    )?;
    tracing::info!(ticks = summary.ticks, stopped_by = ?summary.stopped_by, "run complete");

    Ok(SimOutcome {
        run: summary,
        heading_deg: world.heading_deg(),
        arm_position: world.arm_position(),
        note_loaded: world.note_loaded(),
        shots: world.shots(),
        climber_extension: world.climber_extension(),
    })
}

pub fn print_outcome(o: &SimOutcome, json: bool) {
    let last = o.run.last.as_ref();
    if json {
        let obj = json!({
            "ticks": o.run.ticks,
            "stopped_by": format!("{:?}", o.run.stopped_by),
            "overruns": o.run.overruns,
            "alignment": last.map(|r| r.alignment.as_str()),
            "arm": last.map(|r| r.arm.as_str()),
            "shooter": last.map(|r| r.shooter.as_str()),
            "heading_deg": o.heading_deg,
            "arm_position": o.arm_position,
            "note_loaded": o.note_loaded,
            "shots": o.shots,
            "climber_extension": o.climber_extension,
        });
        println!("{obj}");
        return;
    }
    println!(
        "run complete: {} ticks ({:?}), {} overruns",
        o.run.ticks, o.run.stopped_by, o.run.overruns
    );
    if let Some(r) = last {
        println!(
            "final state: alignment={} arm={} shooter={}",
            r.alignment.as_str(),
            r.arm.as_str(),
            r.shooter.as_str()
        );
    }
    println!(
        "world: heading={:.1} deg arm_position={:.3} note_loaded={} shots={} climber=({:.2},{:.2})",
        o.heading_deg,
        o.arm_position,
        o.note_loaded,
        o.shots,
        o.climber_extension[0],
        o.climber_extension[1]
    );
}

/// Build against simulated hardware and run one tick.
pub fn self_check(cfg: &robo_config::Config) -> CoreResult<TickReport> {
    let (_world, mut robot, _) = build_sim(cfg, WorldParams::default().tag_bearing_deg)?;
    let report = robot.tick().wrap_err("self-check tick")?;
    robot.stop_all();
    Ok(report)
}
