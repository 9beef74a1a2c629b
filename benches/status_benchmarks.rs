use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use pi_timelapse::{
    ControllerOptions, Schedule, SimulatedCamera, TimelapseConfig, TimelapseController,
    TimelapseStatus,
};
use std::time::Duration;

fn running_status() -> TimelapseStatus {
    serde_json::from_str(
        r#"{
            "run_id": 1,
            "state": "running",
            "running": true,
            "images_taken": 312,
            "total_count": 600,
            "interval_secs": 15.0,
            "time_to_next_capture": 7.25,
            "time_remaining_total": 4327.25,
            "destination_name": "20240614_0905",
            "start_time": "2024-06-14T09:05:00Z",
            "scheduled_finish_time": "2024-06-14T11:34:45Z",
            "last_image": "20240614_0905_0312.jpg",
            "last_error": null
        }"#,
    )
    .expect("Should parse status")
}

/// Benchmark reading the published snapshot while a run is active
fn bench_status_reads(c: &mut Criterion) {
    let rt = tokio::runtime::Runtime::new().expect("Should create tokio runtime");
    let root = tempfile::tempdir().expect("Should create temp dir");

    let controller = TimelapseController::with_runtime(
        SimulatedCamera::new(),
        ControllerOptions::new(root.path()),
        rt.handle().clone(),
    )
    .expect("Should create controller");
    let handle = controller
        .start(TimelapseConfig::new(Duration::from_secs(3600), 10))
        .expect("Should start run");

    c.bench_function("status_read", |b| b.iter(|| black_box(controller.status())));
    c.bench_function("status_summary", |b| {
        b.iter(|| black_box(controller.status().summary()))
    });

    handle.stop();
    rt.block_on(handle.join()).expect("Should join run");
}

/// Benchmark JSON serialization of status snapshots
fn bench_json_serialization(c: &mut Criterion) {
    let status = running_status();

    c.bench_function("status_json_serialization", |b| {
        b.iter(|| serde_json::to_string(black_box(&status)).expect("Should serialize"))
    });

    let json = serde_json::to_string(&status).expect("Should serialize");
    c.bench_function("status_json_deserialization", |b| {
        b.iter(|| {
            serde_json::from_str::<TimelapseStatus>(black_box(&json)).expect("Should deserialize")
        })
    });
}

/// Benchmark the cadence arithmetic done on every tick
fn bench_schedule(c: &mut Criterion) {
    let mut group = c.benchmark_group("schedule_tick");

    for total in [10u32, 600, 100_000] {
        let schedule = Schedule::new(Duration::from_secs(15), total);
        group.bench_with_input(BenchmarkId::from_parameter(total), &schedule, |b, s| {
            b.iter(|| {
                let since = black_box(Duration::from_millis(7_750));
                let ttn = s.time_to_next_secs(since);
                (s.remaining_wait(since), s.time_remaining_secs(ttn, 1))
            })
        });
    }

    group.finish();
}

criterion_group!(
    benches,
    bench_status_reads,
    bench_json_serialization,
    bench_schedule
);
criterion_main!(benches);
