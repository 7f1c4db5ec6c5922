use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use ndarray::{Array1, Array2};
use rand::prelude::*;
use rand_chacha::ChaCha8Rng;
use tmd_fit::config::{CvConfig, ImputerConfig};
use tmd_fit::evaluation::evaluate_performance;
use tmd_fit::imputation::{Imputer, IterativeImputer};
use tmd_fit::pipeline::build_pipelines;
use tmd_fit::training::default_registry;

/// Three noisy activity classes with about 10% of values missing
fn create_sensor_data(n_rows: usize, n_features: usize) -> (Array2<f64>, Array1<f64>) {
    let mut rng = ChaCha8Rng::seed_from_u64(42);

    let y = Array1::from_iter((0..n_rows).map(|i| (i % 3) as f64));
    let x = Array2::from_shape_fn((n_rows, n_features), |(i, j)| {
        if rng.gen::<f64>() < 0.1 {
            f64::NAN
        } else {
            y[i] * (j + 1) as f64 + rng.gen::<f64>() * 2.0
        }
    });

    (x, y)
}

fn bench_imputation(c: &mut Criterion) {
    let mut group = c.benchmark_group("imputation");
    group.sample_size(10);

    for n_rows in [500, 2000].iter() {
        let (x, _) = create_sensor_data(*n_rows, 8);

        group.bench_with_input(BenchmarkId::new("iterative_fit", n_rows), &x, |b, x| {
            b.iter(|| {
                let mut imputer = IterativeImputer::new();
                imputer.fit(black_box(x)).unwrap()
            })
        });
    }

    group.finish();
}

fn bench_evaluation(c: &mut Criterion) {
    let mut group = c.benchmark_group("evaluation");
    group.sample_size(10); // Every iteration fits all models with 5-fold CV

    let models = default_registry().unwrap();

    for n_rows in [300, 1000].iter() {
        let (x_train, y_train) = create_sensor_data(*n_rows, 8);
        let (x_test, y_test) = create_sensor_data(*n_rows / 4, 8);

        group.bench_with_input(
            BenchmarkId::new("default_registry", n_rows),
            &(x_train, y_train, x_test, y_test),
            |b, (x_train, y_train, x_test, y_test)| {
                b.iter(|| {
                    let mut pipelines = build_pipelines(&models, &ImputerConfig::default());
                    evaluate_performance(
                        &mut pipelines,
                        black_box(x_train),
                        y_train,
                        x_test,
                        y_test,
                        &CvConfig::default(),
                    )
                    .unwrap()
                })
            },
        );
    }

    group.finish();
}

criterion_group!(benches, bench_imputation, bench_evaluation);
criterion_main!(benches);
