//! Accuracy regression tests for the weighted forest engine, plus the
//! end-to-end network property: refinement over a real forest must recover a
//! planted dependency between two features and rank it above noise.

use arachne_net::{
    HistoryMode, NetworkConfig, RefineConfig, ResponseData,
};
use rand::Rng;
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;

use arachne_forest::{WeightedForestConfig, WeightedForestEngine};

// ---------------------------------------------------------------------------
// Helper: deterministic synthetic regression dataset
// ---------------------------------------------------------------------------

/// Generate a 200-sample, 10-feature regression dataset.
///
/// y = 2*x0 - x1 + noise; features 2-9 are pure noise.
fn make_regression(seed: u64) -> (Vec<Vec<f64>>, Vec<f64>, Vec<String>) {
    let mut rng = ChaCha8Rng::seed_from_u64(seed);
    let n_samples = 200;
    let n_features = 10;

    let mut features = Vec::with_capacity(n_samples);
    let mut response = Vec::with_capacity(n_samples);
    for _ in 0..n_samples {
        let row: Vec<f64> = (0..n_features).map(|_| rng.r#gen::<f64>() * 10.0).collect();
        response.push(2.0 * row[0] - row[1] + rng.r#gen::<f64>() * 0.5);
        features.push(row);
    }
    let names: Vec<String> = (0..n_features).map(|f| format!("f{f}")).collect();
    (features, response, names)
}

fn engine(n_trees: usize) -> WeightedForestEngine {
    WeightedForestEngine::new(WeightedForestConfig::new(n_trees).unwrap())
}

// ---------------------------------------------------------------------------
// a) variance explained on a linear signal
// ---------------------------------------------------------------------------

/// Refinement on the linear dataset must explain most of the variance.
///
/// Reference: observed fit_quality ~ 0.85 with 100 trees.
#[test]
fn refined_fit_explains_linear_signal() {
    let (features, response, names) = make_regression(42);
    let history = RefineConfig::new(2)
        .unwrap()
        .with_seed(42)
        .run(
            &features,
            &names,
            ResponseData::Continuous(&response),
            &engine(100),
        )
        .unwrap();

    let best = history.best().expect("at least one round");
    assert!(best.fit_quality > 0.7, "fit_quality = {}", best.fit_quality);
}

// ---------------------------------------------------------------------------
// b) informative features outrank noise
// ---------------------------------------------------------------------------

#[test]
fn informative_features_carry_top_weights() {
    let (features, response, names) = make_regression(42);
    let history = RefineConfig::new(2)
        .unwrap()
        .with_seed(42)
        .run(
            &features,
            &names,
            ResponseData::Continuous(&response),
            &engine(100),
        )
        .unwrap();

    let weights = history.best().unwrap().weights.clone();
    let mut order: Vec<usize> = (0..10).collect();
    order.sort_by(|&a, &b| weights.as_slice()[b].total_cmp(&weights.as_slice()[a]));

    assert!(
        order[..2].contains(&0) && order[..2].contains(&1),
        "top-2 weighted features are {:?}",
        &order[..2]
    );
}

// ---------------------------------------------------------------------------
// c) determinism
// ---------------------------------------------------------------------------

/// Same seed and inputs must reproduce the history bit-for-bit.
#[test]
fn identical_runs_reproduce_history() {
    let (features, response, names) = make_regression(7);
    let config = RefineConfig::new(2).unwrap().with_seed(7);
    let e = engine(40);

    let a = config
        .run(&features, &names, ResponseData::Continuous(&response), &e)
        .unwrap();
    let b = config
        .run(&features, &names, ResponseData::Continuous(&response), &e)
        .unwrap();

    assert_eq!(a.rounds_completed(), b.rounds_completed());
    for (ra, rb) in a.records().iter().zip(b.records()) {
        assert_eq!(ra.weights, rb.weights);
        assert_eq!(ra.fit_quality.to_bits(), rb.fit_quality.to_bits());
    }
}

// ---------------------------------------------------------------------------
// d) history retention modes agree on the best round
// ---------------------------------------------------------------------------

#[test]
fn best_only_matches_full_history_best() {
    let (features, response, names) = make_regression(11);
    let e = engine(40);

    let full = RefineConfig::new(3)
        .unwrap()
        .with_seed(11)
        .run(&features, &names, ResponseData::Continuous(&response), &e)
        .unwrap();
    let best_only = RefineConfig::new(3)
        .unwrap()
        .with_seed(11)
        .with_history(HistoryMode::BestOnly)
        .run(&features, &names, ResponseData::Continuous(&response), &e)
        .unwrap();

    let a = full.best().unwrap();
    let b = best_only.best().unwrap();
    assert_eq!(a.round, b.round);
    assert_eq!(a.weights, b.weights);
}

// ---------------------------------------------------------------------------
// e) end-to-end: planted dependency recovered as the top-ranked edge
// ---------------------------------------------------------------------------

/// 4 features, 20 samples: `a` is a noisy linear function of `b` alone,
/// `c`/`d` are independent noise. For each collaborator seed, the b→a edge
/// must outweigh every noise edge into `a`, and a→b every noise edge into
/// `b`. Rank comparison only; exact weights vary with the seed.
#[test]
fn network_recovers_planted_dependency() {
    for collaborator_seed in [1u64, 2, 3] {
        let mut rng = ChaCha8Rng::seed_from_u64(collaborator_seed.wrapping_add(100));
        let mut rows = Vec::with_capacity(20);
        for _ in 0..20 {
            let b: f64 = rng.r#gen::<f64>() * 10.0;
            let a = 0.9 * b + rng.r#gen::<f64>() * 0.4;
            let c: f64 = rng.r#gen::<f64>() * 10.0;
            let d: f64 = rng.r#gen::<f64>() * 10.0;
            rows.push(vec![a, b, c, d]);
        }
        let names = ["a", "b", "c", "d"].map(String::from).to_vec();
        let matrix = arachne_net::FeatureMatrix::new(names, rows).unwrap();

        let edges = NetworkConfig::new(1)
            .unwrap()
            .with_seed(collaborator_seed)
            .build(&matrix, &engine(100))
            .unwrap();

        let weight = |source: &str, target: &str| -> f64 {
            edges
                .iter()
                .find(|e| e.source == source && e.target == target)
                .map_or(0.0, |e| e.weight)
        };

        assert!(
            weight("b", "a") > weight("c", "a") && weight("b", "a") > weight("d", "a"),
            "seed {collaborator_seed}: b->a = {}, c->a = {}, d->a = {}",
            weight("b", "a"),
            weight("c", "a"),
            weight("d", "a"),
        );
        assert!(
            weight("a", "b") > weight("c", "b") && weight("a", "b") > weight("d", "b"),
            "seed {collaborator_seed}: a->b = {}, c->b = {}, d->b = {}",
            weight("a", "b"),
            weight("c", "b"),
            weight("d", "b"),
        );
    }
}

// ---------------------------------------------------------------------------
// f) p-value culling keeps the signal feature alive
// ---------------------------------------------------------------------------

#[test]
fn pvalue_culling_preserves_signal() {
    // Small dataset: 100 permutation retrains need p as low as 1/101 so the
    // signal feature clears the BH threshold at rank 1 of 6.
    let mut rng = ChaCha8Rng::seed_from_u64(5);
    let mut features = Vec::with_capacity(100);
    let mut response = Vec::with_capacity(100);
    for _ in 0..100 {
        let row: Vec<f64> = (0..6).map(|_| rng.r#gen::<f64>() * 10.0).collect();
        response.push(2.0 * row[0] + rng.r#gen::<f64>() * 0.3);
        features.push(row);
    }
    let names: Vec<String> = (0..6).map(|f| format!("f{f}")).collect();

    let history = RefineConfig::new(1)
        .unwrap()
        .with_seed(5)
        .with_pvalue_culling(arachne_net::PvalueCulling::Enabled { permutations: 100 })
        .run(
            &features,
            &names,
            ResponseData::Continuous(&response),
            &engine(25),
        )
        .unwrap();

    let record = &history.records()[0];
    let weights = record.weights.as_slice();
    assert!(weights[0] > 0.0, "signal feature culled: {weights:?}");
    assert!((weights.iter().sum::<f64>() - 1.0).abs() < 1e-9);
    // Culling should have zeroed at least some of the five noise features.
    assert!(record.active_predictors < 6);
}
