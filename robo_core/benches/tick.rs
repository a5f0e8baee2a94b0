use criterion::{Criterion, black_box, criterion_group, criterion_main};
use robo_core::{ArmHardware, DriveHardware, Intent, Robot, ShooterHardware};
use robo_hardware::{SimWorld, WorldParams};

fn sim_robot() -> (Robot, SimWorld) {
    let (world, dev) = SimWorld::new(WorldParams::default());
    let robot = Robot::builder()
        .with_drive(DriveHardware::new(dev.chassis, dev.gyro))
        .with_arm(ArmHardware::new(
            dev.joint,
            dev.belt,
            dev.left_encoder,
            dev.right_encoder,
            dev.note_sensor,
        ))
        .with_shooter(ShooterHardware::new(dev.wheels, dev.feed))
        .with_camera(dev.camera)
        .build()
        .expect("sim robot builds");
    (robot, world)
}

pub fn bench_tick(c: &mut Criterion) {
    let mut g = c.benchmark_group("robot_tick");
    // Allow quick tweaking without CLI flags (Criterion 0.5):
    //   BENCH_SAMPLE_SIZE=10 BENCH_MEAS_MS=50 cargo bench -p robo_core --bench tick
    if let Ok(ss) = std::env::var("BENCH_SAMPLE_SIZE") {
        if let Ok(n) = ss.parse::<usize>() {
            g.sample_size(n.max(1));
        }
    } else {
        g.sample_size(50);
    }
    if let Ok(ms) = std::env::var("BENCH_MEAS_MS")
        && let Ok(ms_u64) = ms.parse::<u64>()
    {
        g.measurement_time(std::time::Duration::from_millis(ms_u64));
    }

    g.bench_function("idle", |b| {
        let (mut robot, mut world) = sim_robot();
        b.iter(|| {
            let report = robot.tick().expect("tick");
            world.step(0.02);
            black_box(report);
        });
    });

    g.bench_function("aligning", |b| {
        let (mut robot, mut world) = sim_robot();
        let intent = Intent {
            align: true,
            ..Intent::default()
        };
        b.iter(|| {
            robot.apply(black_box(&intent)).expect("valid intent");
            let report = robot.tick().expect("tick");
            world.step(0.02);
            black_box(report);
        });
    });
    g.finish();
}

criterion_group!(tick, bench_tick);
criterion_main!(tick);
