use robo_core::{PidController, PidGains, Tolerance};

/// Heading plant: one unit of output turns the robot `gain` degrees per tick.
fn simulate(pid: &mut PidController, start: f64, gain: f64, ticks: usize) -> Vec<f64> {
    let mut heading = start;
    let mut trace = Vec::with_capacity(ticks);
    for _ in 0..ticks {
        let out = pid.calculate(heading).clamp(-1.0, 1.0);
        heading = (heading + out * gain).rem_euclid(360.0);
        trace.push(heading);
    }
    trace
}

#[test]
fn continuous_heading_settles_on_setpoint_and_stays() {
    let mut pid = PidController::new(PidGains::new(0.04, 0.0, 0.0), 0.02);
    pid.enable_continuous_input(0.0, 360.0);
    pid.set_tolerance(Tolerance::position(1.0));
    pid.set_setpoint(90.0);

    let trace = simulate(&mut pid, 0.0, 10.0, 200);
    assert!(pid.at_setpoint(), "final heading {:?}", trace.last());
    let settled = trace.iter().rposition(|h| (h - 90.0).abs() >= 1.0).map_or(0, |i| i + 1);
    assert!(settled < 100, "settled after {settled} ticks");
    assert!(trace[settled..].iter().all(|h| (h - 90.0).abs() < 1.0));
}

#[test]
fn continuous_heading_takes_the_short_way_across_zero() {
    let mut pid = PidController::new(PidGains::new(0.04, 0.0, 0.0), 0.02);
    pid.enable_continuous_input(0.0, 360.0);
    pid.set_setpoint(10.0);

    let first = pid.calculate(350.0);
    assert!(first > 0.0, "should increase heading through 0, got {first}");
    let trace = simulate(&mut pid, 350.0, 10.0, 100);
    assert!(trace.iter().all(|h| *h >= 349.0 || *h <= 11.0), "went the long way: {trace:?}");
}

#[test]
fn integrator_removes_steady_state_offset() {
    // plant with a constant disturbance pulling the heading back
    let mut pid = PidController::new(PidGains::new(0.02, 0.2, 0.0), 0.02);
    pid.set_tolerance(Tolerance::position(0.5));
    pid.set_setpoint(45.0);
    let mut heading: f64 = 0.0;
    for _ in 0..2000 {
        let out = pid.calculate(heading).clamp(-1.0, 1.0);
        heading += out * 10.0 - 0.5;
    }
    assert!((heading - 45.0).abs() < 0.5, "heading {heading}");
}
