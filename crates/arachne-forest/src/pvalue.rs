//! Permutation importance and permutation-based p-values.
//!
//! Observed importance is the mean out-of-bag error increase when a
//! feature's OOB values are shuffled. The p-value null distribution comes
//! from retraining the forest on permuted responses (Altmann's method):
//! under the null the response carries no signal, so the observed importance
//! is compared against what shuffled-response forests produce.

use rand::SeedableRng;
use rand::seq::SliceRandom;
use rand_chacha::ChaCha8Rng;
use rayon::iter::{IntoParallelIterator, ParallelIterator};

use arachne_net::{ImportancePValue, ResponseData, TrainRequest};

use crate::config::{ImportanceMode, WeightedForestConfig};
use crate::error::ForestError;
use crate::forest::{self, TrainedForest};
use crate::node::LeafValue;
use crate::tree::DecisionTree;

/// Squared error (regression) or 0/1 loss (classification) of one prediction.
fn sample_error(prediction: LeafValue, response: ResponseData<'_>, sample_idx: usize) -> f64 {
    match (prediction, response) {
        (LeafValue::Mean(pred), ResponseData::Continuous(y)) => {
            let diff = pred - y[sample_idx];
            diff * diff
        }
        (LeafValue::Class(pred), ResponseData::Classes(labels)) => {
            if pred == labels[sample_idx] { 0.0 } else { 1.0 }
        }
        _ => unreachable!("tree kind always matches the response kind"),
    }
}

/// Mean error of one tree over its OOB samples.
fn tree_oob_error(
    tree: &DecisionTree,
    features: &[Vec<f64>],
    response: ResponseData<'_>,
    oob_indices: &[usize],
) -> f64 {
    let total: f64 = oob_indices
        .iter()
        .map(|&idx| sample_error(tree.predict(&features[idx]), response, idx))
        .sum();
    total / oob_indices.len() as f64
}

/// Mean error of one tree over its OOB samples with one feature permuted.
fn tree_permuted_error(
    tree: &DecisionTree,
    features: &[Vec<f64>],
    response: ResponseData<'_>,
    oob_indices: &[usize],
    feature_idx: usize,
    rng: &mut ChaCha8Rng,
) -> f64 {
    let mut permuted_values: Vec<f64> = oob_indices
        .iter()
        .map(|&idx| features[idx][feature_idx])
        .collect();
    permuted_values.shuffle(rng);

    let total: f64 = oob_indices
        .iter()
        .zip(&permuted_values)
        .map(|(&idx, &permuted_val)| {
            let mut sample = features[idx].clone();
            sample[feature_idx] = permuted_val;
            sample_error(tree.predict(&sample), response, idx)
        })
        .sum();
    total / oob_indices.len() as f64
}

/// Compute OOB permutation importance per feature.
///
/// For each tree with a non-empty OOB set and each feature, the importance
/// contribution is `permuted_error - baseline_error`; the final score is
/// the mean over trees. All-zero when no tree has OOB samples.
pub(crate) fn permutation_importance(
    forest: &TrainedForest,
    features: &[Vec<f64>],
    response: ResponseData<'_>,
    seed: u64,
) -> Vec<f64> {
    let n_features = forest.n_features();
    let mut increases: Vec<Vec<f64>> = Vec::new();

    for (tree_idx, (tree, oob_indices)) in forest
        .trees
        .iter()
        .zip(&forest.oob_indices_per_tree)
        .enumerate()
    {
        if oob_indices.is_empty() {
            continue;
        }
        let baseline = tree_oob_error(tree, features, response, oob_indices);

        let mut tree_increases = Vec::with_capacity(n_features);
        for feature_idx in 0..n_features {
            let rng_seed = seed
                .wrapping_add((tree_idx as u64).wrapping_mul(n_features as u64))
                .wrapping_add(feature_idx as u64);
            let mut rng = ChaCha8Rng::seed_from_u64(rng_seed);
            let permuted =
                tree_permuted_error(tree, features, response, oob_indices, feature_idx, &mut rng);
            tree_increases.push(permuted - baseline);
        }
        increases.push(tree_increases);
    }

    if increases.is_empty() {
        return vec![0.0; n_features];
    }
    let n_valid = increases.len() as f64;
    (0..n_features)
        .map(|f| increases.iter().map(|row| row[f]).sum::<f64>() / n_valid)
        .collect()
}

/// Score a trained forest's features against a permuted-response null.
///
/// Trains `permutations` additional forests, each on a shuffled copy of the
/// response, and collects their permutation importances as the null
/// distribution. `p = (1 + #{null >= observed}) / (permutations + 1)`.
pub(crate) fn importance_pvalues(
    config: &WeightedForestConfig,
    forest: &TrainedForest,
    request: &TrainRequest<'_>,
    permutations: usize,
) -> Result<Vec<ImportancePValue>, ForestError> {
    let observed = permutation_importance(
        forest,
        request.features,
        request.response,
        request.seed.wrapping_add(1),
    );
    let n_features = observed.len();

    // Null retrains skip the (expensive, unused) permutation importance mode.
    let null_config = config.clone().with_importance(ImportanceMode::Impurity);

    let null_rows: Vec<Vec<f64>> = (0..permutations as u64)
        .into_par_iter()
        .map(|perm_idx| -> Result<Vec<f64>, ForestError> {
            let perm_seed = request
                .seed
                .wrapping_mul(0x9E37_79B9_7F4A_7C15)
                .wrapping_add(perm_idx);
            let mut rng = ChaCha8Rng::seed_from_u64(perm_seed);

            match request.response {
                ResponseData::Continuous(y) => {
                    let mut shuffled = y.to_vec();
                    shuffled.shuffle(&mut rng);
                    let null_request = TrainRequest {
                        response: ResponseData::Continuous(&shuffled),
                        seed: perm_seed,
                        ..*request
                    };
                    let (null_forest, _) = forest::train(&null_config, &null_request)?;
                    Ok(permutation_importance(
                        &null_forest,
                        null_request.features,
                        null_request.response,
                        perm_seed.wrapping_add(1),
                    ))
                }
                ResponseData::Classes(labels) => {
                    let mut shuffled = labels.to_vec();
                    shuffled.shuffle(&mut rng);
                    let null_request = TrainRequest {
                        response: ResponseData::Classes(&shuffled),
                        seed: perm_seed,
                        ..*request
                    };
                    let (null_forest, _) = forest::train(&null_config, &null_request)?;
                    Ok(permutation_importance(
                        &null_forest,
                        null_request.features,
                        null_request.response,
                        perm_seed.wrapping_add(1),
                    ))
                }
            }
        })
        .collect::<Result<Vec<_>, ForestError>>()?;

    Ok((0..n_features)
        .map(|f| {
            let exceed = null_rows.iter().filter(|row| row[f] >= observed[f]).count();
            ImportancePValue {
                importance: observed[f],
                p_value: (1 + exceed) as f64 / (permutations + 1) as f64,
            }
        })
        .collect())
}

#[cfg(test)]
mod tests {
    use arachne_net::{ResponseData, TrainRequest};
    use rand::Rng;
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;

    use super::{importance_pvalues, permutation_importance};
    use crate::config::WeightedForestConfig;
    use crate::forest;

    /// y depends on x0 only; x1 is noise.
    fn make_data(n_samples: usize, seed: u64) -> (Vec<Vec<f64>>, Vec<f64>, Vec<String>) {
        let mut rng = ChaCha8Rng::seed_from_u64(seed);
        let mut features = Vec::with_capacity(n_samples);
        let mut response = Vec::with_capacity(n_samples);
        for _ in 0..n_samples {
            let x0: f64 = rng.r#gen::<f64>() * 10.0;
            let x1: f64 = rng.r#gen::<f64>() * 10.0;
            response.push(2.0 * x0 + rng.r#gen::<f64>() * 0.3);
            features.push(vec![x0, x1]);
        }
        let names = vec!["informative".to_string(), "noise".to_string()];
        (features, response, names)
    }

    #[test]
    fn informative_feature_dominates_permutation_importance() {
        let (features, response, names) = make_data(100, 42);
        let config = WeightedForestConfig::new(40).unwrap();
        let weights = [0.5, 0.5];
        let request = TrainRequest {
            features: &features,
            feature_names: &names,
            response: ResponseData::Continuous(&response),
            weights: &weights,
            mtry: 1,
            seed: 42,
        };
        let (forest, _) = forest::train(&config, &request).unwrap();

        let importances =
            permutation_importance(&forest, &features, ResponseData::Continuous(&response), 42);
        assert!(
            importances[0] > importances[1],
            "informative {} vs noise {}",
            importances[0],
            importances[1]
        );
        assert!(importances[0] > 0.0);
    }

    #[test]
    fn pvalues_separate_signal_from_noise() {
        let (features, response, names) = make_data(80, 7);
        let config = WeightedForestConfig::new(25).unwrap();
        let weights = [0.5, 0.5];
        let request = TrainRequest {
            features: &features,
            feature_names: &names,
            response: ResponseData::Continuous(&response),
            weights: &weights,
            mtry: 1,
            seed: 7,
        };
        let (forest, _) = forest::train(&config, &request).unwrap();

        let scored = importance_pvalues(&config, &forest, &request, 30).unwrap();
        assert_eq!(scored.len(), 2);
        assert!(
            scored[0].p_value < scored[1].p_value,
            "informative p {} vs noise p {}",
            scored[0].p_value,
            scored[1].p_value
        );
        // Smallest achievable p-value with 30 permutations.
        assert!(scored[0].p_value >= 1.0 / 31.0 - 1e-12);
    }

    #[test]
    fn pvalues_deterministic_for_fixed_seed() {
        let (features, response, names) = make_data(60, 9);
        let config = WeightedForestConfig::new(15).unwrap();
        let weights = [0.5, 0.5];
        let request = TrainRequest {
            features: &features,
            feature_names: &names,
            response: ResponseData::Continuous(&response),
            weights: &weights,
            mtry: 1,
            seed: 9,
        };
        let (forest, _) = forest::train(&config, &request).unwrap();

        let a = importance_pvalues(&config, &forest, &request, 10).unwrap();
        let b = importance_pvalues(&config, &forest, &request, 10).unwrap();
        for (x, y) in a.iter().zip(&b) {
            assert_eq!(x.importance.to_bits(), y.importance.to_bits());
            assert_eq!(x.p_value.to_bits(), y.p_value.to_bits());
        }
    }
}
