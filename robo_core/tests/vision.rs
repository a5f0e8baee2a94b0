use robo_core::{VisionCfg, VisionTracker};
use robo_hardware::{CameraProbe, SimulatedCamera};
use robo_traits::{CameraFrame, TargetCandidate};
use rstest::rstest;

fn frame(x: f64, y: f64, tag_id: i32, ambiguity: f64) -> CameraFrame {
    CameraFrame {
        candidates: vec![TargetCandidate {
            x,
            y,
            z: 0.5,
            tag_id,
            ambiguity,
        }],
        latency_s: 0.03,
    }
}

fn tracker(cameras: usize, cfg: VisionCfg) -> (VisionTracker<SimulatedCamera>, Vec<CameraProbe>) {
    let sensors: Vec<SimulatedCamera> = (0..cameras).map(|_| SimulatedCamera::new()).collect();
    let probes = sensors.iter().map(SimulatedCamera::probe).collect();
    (VisionTracker::new(cfg, sensors), probes)
}

#[test]
fn no_target_before_first_detection() {
    let (mut t, _) = tracker(1, VisionCfg::default());
    let view = t.update();
    assert!(!view.has_target());
    assert_eq!(t.heading_to_target(), None);
    assert_eq!(t.staleness(0), Some(11));
    assert!(t.fault().is_some());
}

#[test]
fn averages_every_camera_with_a_target() {
    let (mut t, probes) = tracker(2, VisionCfg::default());
    probes[0].set(frame(1.0, 0.0, 7, 0.1));
    probes[1].set(frame(1.2, 0.0, 7, 0.1));
    t.update();
    let x = t.offset().expect("target").x;
    assert!((x - 1.1).abs() < 1e-9, "x {x}");
}

#[test]
fn stale_camera_drops_out_after_window() {
    let window = 10;
    let (mut t, probes) = tracker(
        2,
        VisionCfg {
            filter_window: window,
            ..VisionCfg::default()
        },
    );
    probes[0].set(frame(1.0, 0.0, 7, 0.1));
    probes[1].set(frame(1.2, 0.0, 7, 0.1));
    t.update();
    probes[1].clear();

    for _ in 0..window - 1 {
        t.update();
    }
    // the second camera still holds its last filtered value
    assert!((t.offset().expect("target").x - 1.1).abs() < 1e-9);

    t.update();
    assert_eq!(t.staleness(1), Some(window));
    assert!((t.offset().expect("target").x - 1.0).abs() < 1e-9);
    assert_eq!(t.fault(), None);
}

#[test]
fn single_miss_does_not_lose_the_target() {
    let (mut t, probes) = tracker(1, VisionCfg::default());
    probes[0].set(frame(2.0, 0.0, 7, 0.1));
    t.update();
    probes[0].clear();
    t.update();
    assert!(t.has_target());
    assert_eq!(t.staleness(0), Some(1));
}

#[rstest]
#[case(vec![], Some(4))]
#[case(vec![7], Some(7))]
#[case(vec![9], None)]
fn sought_ids_filter_candidates(#[case] sought: Vec<i32>, #[case] want: Option<i32>) {
    let (mut t, probes) = tracker(
        1,
        VisionCfg {
            sought_ids: sought,
            ..VisionCfg::default()
        },
    );
    let mut f = frame(2.0, 0.0, 7, 0.3);
    f.candidates.push(TargetCandidate {
        x: 2.0,
        y: 0.1,
        z: 0.5,
        tag_id: 4,
        ambiguity: 0.05,
    });
    probes[0].set(f);
    t.update();
    assert_eq!(t.tag_id(), want);
}

#[test]
fn heading_is_positive_clockwise_from_robot_center() {
    let cfg = VisionCfg::default();
    let bearing = 20f64.to_radians();
    let (mut t, probes) = tracker(1, cfg.clone());
    probes[0].set(frame(
        2.0 * bearing.cos() - cfg.mount_x,
        -2.0 * bearing.sin() - cfg.mount_y,
        7,
        0.1,
    ));
    t.update();
    let heading = t.heading_to_target().expect("heading");
    assert!((heading - 20.0).abs() < 1e-9, "heading {heading}");
    assert_eq!(t.latency(), Some(0.03));
}

#[test]
fn median_rejects_a_single_outlier() {
    let (mut t, probes) = tracker(1, VisionCfg::default());
    for _ in 0..4 {
        probes[0].set(frame(2.0, 0.0, 7, 0.1));
        t.update();
    }
    probes[0].set(frame(9.0, 0.0, 7, 0.1));
    t.update();
    assert_eq!(t.offset().expect("target").x, 2.0);
}

#[test]
fn no_cameras_is_not_a_fault() {
    let (mut t, _) = tracker(0, VisionCfg::default());
    t.update();
    assert!(!t.has_target());
    assert_eq!(t.fault(), None);
}
