//! Criterion benchmarks for arachne-net: orchestration overhead with a
//! constant-time engine, isolating the fan-out and merge cost.

use criterion::{Criterion, criterion_group, criterion_main};
use rand::Rng;
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;

use arachne_net::{
    EngineFailure, FeatureMatrix, ForestEngine, ForestFit, ImportancePValue, NetworkConfig,
    TrainRequest,
};

struct ConstantEngine;

impl ForestEngine for ConstantEngine {
    type Model = ();

    fn train(&self, request: &TrainRequest<'_>) -> Result<((), ForestFit), EngineFailure> {
        let n = request.feature_names.len();
        Ok((
            (),
            ForestFit {
                importances: (0..n).map(|i| (i + 1) as f64).collect(),
                fit_quality: 0.5,
                prediction_error: 0.5,
                oob_predictions: vec![0.0; request.features.len()],
                confusion: None,
            },
        ))
    }

    fn importance_pvalues(
        &self,
        _model: &(),
        request: &TrainRequest<'_>,
        _permutations: usize,
    ) -> Result<Vec<ImportancePValue>, EngineFailure> {
        Ok(vec![
            ImportancePValue {
                importance: 1.0,
                p_value: 0.01,
            };
            request.feature_names.len()
        ])
    }
}

fn make_matrix(n_samples: usize, n_features: usize, seed: u64) -> FeatureMatrix {
    let mut rng = ChaCha8Rng::seed_from_u64(seed);
    let names: Vec<String> = (0..n_features).map(|f| format!("f{f}")).collect();
    let rows: Vec<Vec<f64>> = (0..n_samples)
        .map(|_| (0..n_features).map(|_| rng.r#gen::<f64>()).collect())
        .collect();
    FeatureMatrix::new(names, rows).unwrap()
}

fn bench_network_build(c: &mut Criterion) {
    let matrix = make_matrix(200, 50, 42);
    let config = NetworkConfig::new(3).unwrap().with_seed(42);

    c.bench_function("network_build_200x50_3rounds", |b| {
        b.iter(|| config.build(&matrix, &ConstantEngine).unwrap());
    });
}

fn bench_partition(c: &mut Criterion) {
    let matrix = make_matrix(500, 100, 42);

    c.bench_function("matrix_partition_500x100", |b| {
        b.iter(|| matrix.partition(50));
    });
}

criterion_group!(benches, bench_network_build, bench_partition);
criterion_main!(benches);
