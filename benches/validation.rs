use allotment::prelude::*;
use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};

/// A consistent dataset with `size` tasks and proportional clients and workers.
fn generated(size: usize) -> Dataset {
    let skills = ["ml", "data", "ops", "design"];

    let tasks = (0..size)
        .map(|i| {
            Record::new()
                .with("TaskID", format!("T{}", i))
                .with("Duration", "1")
                .with("RequiredSkills", skills[i % skills.len()])
                .with("MaxConcurrent", "1")
                .with("PreferredPhases", format!("{}-{}", i % 3 + 1, i % 3 + 3))
        })
        .collect();

    let workers = (0..size / 2 + 1)
        .map(|i| {
            Record::new()
                .with("WorkerID", format!("W{}", i))
                .with("AvailableSlots", "[1,2,3,4,5]")
                .with("Skills", format!("{},{}", skills[i % 4], skills[(i + 1) % 4]))
                .with("MaxLoadPerPhase", "3")
        })
        .collect();

    let clients = (0..size / 4 + 1)
        .map(|i| {
            Record::new()
                .with("ClientID", format!("C{}", i))
                .with("PriorityLevel", "3")
                .with("RequestedTaskIDs", format!("T{},T{}", i % size.max(1), (i + 1) % size.max(1)))
                .with("AttributesJSON", "{\"tier\": 1}")
        })
        .collect();

    let rules = (0..size / 10)
        .map(|i| Rule::co_run([format!("T{}", i * 10), format!("T{}", i * 10 + 1)]))
        .collect();

    Dataset::new(clients, workers, tasks, rules)
}

fn bench_default_pipeline(c: &mut Criterion) {
    let mut group = c.benchmark_group("default_pipeline");
    for size in [10, 100, 500] {
        let dataset = generated(size);
        let pipeline = ValidationPipeline::default_pipeline();
        group.bench_with_input(BenchmarkId::from_parameter(size), &dataset, |b, dataset| {
            b.iter(|| pipeline.run(black_box(dataset)));
        });
    }
    group.finish();
}

fn bench_parallel_pipeline(c: &mut Criterion) {
    let dataset = generated(500);
    let pipeline = ValidationPipeline::extended_pipeline()
        .with_options(ValidationOptions::default().with_parallel(true));
    c.bench_function("extended_pipeline_parallel(500)", |b| {
        b.iter(|| pipeline.run(black_box(&dataset)));
    });
}

criterion_group!(benches, bench_default_pipeline, bench_parallel_pipeline);
criterion_main!(benches);
