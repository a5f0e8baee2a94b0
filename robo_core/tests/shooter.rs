use robo_core::{ArmSnapshot, ArmState, ShooterCfg, ShooterController, ShooterState};
use robo_hardware::{ActuatorProbe, SimulatedActuator};
use rstest::rstest;

const RATE_HZ: u32 = 50;

struct Rig {
    shooter: ShooterController<SimulatedActuator, SimulatedActuator>,
    wheels: ActuatorProbe,
    feed: ActuatorProbe,
}

fn rig() -> Rig {
    let wheels = SimulatedActuator::new("shooter wheels");
    let feed = SimulatedActuator::new("shooter feed");
    let (wp, fp) = (wheels.probe(), feed.probe());
    Rig {
        shooter: ShooterController::new(wheels, feed, ShooterCfg::default(), RATE_HZ),
        wheels: wp,
        feed: fp,
    }
}

fn arm(has_note: bool) -> ArmSnapshot {
    ArmSnapshot {
        state: ArmState::Intaking,
        has_note,
    }
}

impl Rig {
    fn tick(&mut self, has_note: bool) -> ShooterState {
        self.shooter.tick(&arm(has_note)).expect("shooter tick");
        self.shooter.current_state()
    }

    fn outputs(&self) -> (f64, f64) {
        (self.wheels.duty(), self.feed.duty())
    }

    fn holding(mut self) -> Self {
        self.shooter.request_intake();
        self.tick(false);
        for _ in 0..3 {
            self.shooter.request_intake();
            self.tick(true);
        }
        assert_eq!(self.shooter.current_state(), ShooterState::Holding);
        self
    }
}

#[test]
fn intake_debounces_the_note_before_holding() {
    let mut r = rig();
    r.shooter.request_intake();
    assert_eq!(r.tick(false), ShooterState::Intaking);

    r.shooter.request_intake();
    assert_eq!(r.tick(true), ShooterState::Intaking);
    assert_eq!(r.outputs(), (-0.3, 0.3));

    // a flicker restarts the count
    r.shooter.request_intake();
    r.tick(false);
    for _ in 0..2 {
        r.shooter.request_intake();
        assert_eq!(r.tick(true), ShooterState::Intaking);
    }
    r.shooter.request_intake();
    assert_eq!(r.tick(true), ShooterState::Holding);

    r.tick(true);
    assert_eq!(r.outputs(), (0.0, 0.0));
    assert!(!r.shooter.is_running_motors());
}

#[test]
fn releasing_intake_without_a_note_returns_to_idle() {
    let mut r = rig();
    r.shooter.request_intake();
    r.tick(false);
    assert_eq!(r.tick(false), ShooterState::Idle);
}

#[test]
fn shoot_sequence_timing() {
    let mut r = rig().holding();
    r.shooter.request_shoot();
    assert_eq!(r.tick(true), ShooterState::Feeding);

    let backoff = 13; // 0.25 s * 50 Hz, rounded half up
    let feed_ticks = RATE_HZ; // 1.0 s
    for i in 0..feed_ticks {
        let state = r.tick(true);
        let (wheels, feed) = r.outputs();
        assert_eq!(wheels, 1.0, "tick {i}");
        let want_feed = if i < backoff { -0.3 } else { 0.0 };
        assert_eq!(feed, want_feed, "tick {i}");
        let want = if i + 1 < feed_ticks {
            ShooterState::Feeding
        } else {
            ShooterState::Shooting
        };
        assert_eq!(state, want, "tick {i}");
    }

    for i in 0..RATE_HZ {
        let state = r.tick(false);
        assert_eq!(r.outputs(), (1.0, 0.3), "tick {i}");
        let want = if i + 1 < RATE_HZ {
            ShooterState::Shooting
        } else {
            ShooterState::Idle
        };
        assert_eq!(state, want, "tick {i}");
    }
    r.tick(false);
    assert_eq!(r.outputs(), (0.0, 0.0));
}

#[test]
fn idle_shoot_fires_a_preloaded_note() {
    let mut r = rig();
    r.shooter.request_shoot();
    assert_eq!(r.tick(false), ShooterState::Feeding);
}

#[rstest]
#[case::idle(false)]
#[case::holding(true)]
fn eject_overrides_current_state(#[case] hold_first: bool) {
    let mut r = if hold_first { rig().holding() } else { rig() };
    r.shooter.request_shoot();
    r.shooter.request_eject();
    assert_eq!(r.tick(true), ShooterState::Ejecting);
    assert_eq!(r.outputs(), (0.0, 0.0));

    r.shooter.request_eject();
    r.tick(true);
    assert_eq!(r.outputs(), (-0.5, -0.3));
}

#[test]
fn eject_interrupts_a_shot_in_progress() {
    let mut r = rig().holding();
    r.shooter.request_shoot();
    r.tick(true);
    r.tick(true);
    r.shooter.request_eject();
    assert_eq!(r.tick(true), ShooterState::Ejecting);
}

#[test]
fn ejecting_ends_when_request_is_released() {
    let mut r = rig();
    r.shooter.request_eject();
    assert_eq!(r.tick(true), ShooterState::Ejecting);
    // released while the note is still there
    assert_eq!(r.tick(true), ShooterState::Idle);
    assert_eq!(r.tick(true), ShooterState::Idle);
}

#[test]
fn ejecting_ends_once_note_clears_even_if_request_is_held() {
    let mut r = rig();
    r.shooter.request_eject();
    assert_eq!(r.tick(true), ShooterState::Ejecting);
    r.shooter.request_eject();
    assert_eq!(r.tick(true), ShooterState::Ejecting);

    r.shooter.request_eject();
    assert_eq!(r.tick(false), ShooterState::Idle);
    for _ in 0..5 {
        r.shooter.request_eject();
        assert_eq!(r.tick(false), ShooterState::Idle);
        assert_eq!(r.outputs(), (0.0, 0.0));
    }

    // a fresh press ejects again
    r.tick(false);
    r.shooter.request_eject();
    assert_eq!(r.tick(false), ShooterState::Ejecting);
}

#[test]
fn empty_ejection_runs_while_request_is_held() {
    let mut r = rig();
    for _ in 0..10 {
        r.shooter.request_eject();
        r.tick(false);
    }
    assert_eq!(r.shooter.current_state(), ShooterState::Ejecting);
    assert_eq!(r.outputs(), (-0.5, -0.3));
}

#[test]
fn running_motors_flag_follows_state() {
    assert!(!ShooterState::Idle.is_running_motors());
    assert!(!ShooterState::Holding.is_running_motors());
    for s in [
        ShooterState::Intaking,
        ShooterState::Ejecting,
        ShooterState::Feeding,
        ShooterState::Shooting,
    ] {
        assert!(s.is_running_motors(), "{}", s.as_str());
    }
}

#[test]
fn out_of_range_speed_is_rejected() {
    let mut r = rig();
    assert!(r.shooter.set_shoot_speed(1.2).is_err());
    assert_eq!(r.shooter.config().wheel_shoot_speed, 1.0);
    r.shooter.set_shoot_speed(0.8).expect("in range");
    assert_eq!(r.shooter.config().wheel_shoot_speed, 0.8);
}
