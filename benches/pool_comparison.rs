//! Benchmarks comparing the bounded pool against thread-per-task and
//! sequential execution

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use std::thread;
use workpool::prelude::*;

fn busy_work(n: u64) -> u64 {
    (0..200).fold(n, |acc, x| acc.wrapping_mul(31).wrapping_add(x))
}

fn sequential(tasks: &[u64]) -> Vec<u64> {
    tasks.iter().map(|&n| busy_work(n)).collect()
}

fn thread_per_task(tasks: &[u64]) -> Vec<u64> {
    let handles: Vec<_> = tasks
        .iter()
        .map(|&n| thread::spawn(move || busy_work(n)))
        .collect();
    handles.into_iter().map(|h| h.join().unwrap()).collect()
}

fn bounded_pool(executor: &Executor, tasks: &[u64]) -> usize {
    let report = executor
        .run(tasks.iter().copied(), |&n| Ok::<_, String>(busy_work(n)))
        .unwrap();
    report.succeeded()
}

fn bench_execution(c: &mut Criterion) {
    let executor = Executor::with_workers(4).expect("Failed to build executor");

    let mut group = c.benchmark_group("execution");

    for size in [10u64, 100, 1_000].iter() {
        let tasks: Vec<u64> = (0..*size).collect();

        group.bench_with_input(BenchmarkId::new("sequential", size), &tasks, |b, tasks| {
            b.iter(|| sequential(black_box(tasks)))
        });

        group.bench_with_input(BenchmarkId::new("thread_per_task", size), &tasks, |b, tasks| {
            b.iter(|| thread_per_task(black_box(tasks)))
        });

        group.bench_with_input(BenchmarkId::new("bounded_pool", size), &tasks, |b, tasks| {
            b.iter(|| bounded_pool(&executor, black_box(tasks)))
        });
    }

    group.finish();
}

fn bench_worker_count(c: &mut Criterion) {
    let tasks: Vec<u64> = (0..1_000).collect();

    let mut group = c.benchmark_group("worker_count");

    for workers in [1usize, 2, 4, 8].iter() {
        let executor = Executor::with_workers(*workers).expect("Failed to build executor");

        group.bench_with_input(BenchmarkId::from_parameter(workers), &tasks, |b, tasks| {
            b.iter(|| bounded_pool(&executor, black_box(tasks)))
        });
    }

    group.finish();
}

criterion_group!(benches, bench_execution, bench_worker_count);
criterion_main!(benches);
