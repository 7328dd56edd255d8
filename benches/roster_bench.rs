//! Criterion benchmarks for u-roster.
//!
//! Uses synthetic rosters of growing size (one early and one late shift,
//! headcount scaled to the staff) to measure evaluation and engine cost.

use chrono::NaiveTime;
use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use u_roster::chromosome::Chromosome;
use u_roster::conflict::ConflictDetector;
use u_roster::fitness::FitnessEvaluator;
use u_roster::ga::{GaConfig, GaRunner};
use u_roster::models::{Employee, LaborConstraints, OptimizationConfig, RosterProblem, Shift};
use u_roster::random::create_rng;
use u_roster::sa::{SaConfig, SaRunner};

// ===========================================================================
// Synthetic rosters
// ===========================================================================

fn synthetic(employees: usize, days: usize) -> RosterProblem {
    let headcount = (employees / 5).max(1) as u32;
    let time = |h| NaiveTime::from_hms_opt(h, 0, 0).unwrap();
    let config = OptimizationConfig::default()
        .with_period_days(days)
        .with_shifts(vec![
            Shift::new("early", "Early", time(6), time(14), headcount),
            Shift::new("late", "Late", time(14), time(22), headcount),
        ])
        .with_employees((0..employees).map(|i| Employee::new(format!("e{i}"))).collect())
        .with_constraints(
            LaborConstraints::default()
                .with_max_consecutive_work_days(5)
                .with_min_rest_days_per_week(2),
        );
    RosterProblem::new(&config).unwrap()
}

const SIZES: [(usize, usize); 3] = [(10, 7), (30, 14), (60, 28)];

// ===========================================================================
// Benchmarks
// ===========================================================================

fn bench_detect(c: &mut Criterion) {
    let mut group = c.benchmark_group("detect_conflicts");

    for (employees, days) in SIZES {
        let problem = synthetic(employees, days);
        let chromosome = Chromosome::random(&problem, &mut create_rng(42));
        group.bench_with_input(
            BenchmarkId::new(format!("e{employees}_d{days}"), employees * days),
            &(problem, chromosome),
            |b, (p, ch)| {
                let detector = ConflictDetector::new(p);
                b.iter(|| black_box(detector.detect(black_box(ch))))
            },
        );
    }
    group.finish();
}

fn bench_evaluate(c: &mut Criterion) {
    let mut group = c.benchmark_group("evaluate");

    for (employees, days) in SIZES {
        let problem = synthetic(employees, days);
        let chromosome = Chromosome::random(&problem, &mut create_rng(42));
        group.bench_with_input(
            BenchmarkId::new(format!("e{employees}_d{days}"), employees * days),
            &(problem, chromosome),
            |b, (p, ch)| {
                let evaluator = FitnessEvaluator::new(p);
                b.iter(|| black_box(evaluator.evaluate_chromosome(black_box(ch))))
            },
        );
    }
    group.finish();
}

fn bench_ga(c: &mut Criterion) {
    let mut group = c.benchmark_group("ga");
    group.sample_size(10);

    for (employees, days) in SIZES {
        let problem = synthetic(employees, days);
        let config = GaConfig::for_roster(employees, days)
            .with_population_size(50)
            .with_max_generations(30)
            .with_stagnation_limit(0);
        group.bench_with_input(
            BenchmarkId::new(format!("e{employees}_d{days}"), employees * days),
            &(problem, config),
            |b, (p, c)| {
                b.iter(|| {
                    let result = GaRunner::run(black_box(p), black_box(c), 42);
                    black_box(result)
                })
            },
        );
    }
    group.finish();
}

fn bench_sa(c: &mut Criterion) {
    let mut group = c.benchmark_group("sa");
    group.sample_size(10);

    for (employees, days) in SIZES {
        let problem = synthetic(employees, days);
        let config = SaConfig::default().with_max_iterations(2_000);
        group.bench_with_input(
            BenchmarkId::new(format!("e{employees}_d{days}"), employees * days),
            &(problem, config),
            |b, (p, c)| {
                b.iter(|| {
                    let result = SaRunner::run(black_box(p), black_box(c), 42);
                    black_box(result)
                })
            },
        );
    }
    group.finish();
}

criterion_group!(benches, bench_detect, bench_evaluate, bench_ga, bench_sa);
criterion_main!(benches);
