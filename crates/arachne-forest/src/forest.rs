//! Weighted forest training with parallel tree construction.

use rand::Rng;
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use rayon::iter::{IntoParallelIterator, ParallelIterator};
use tracing::{debug, instrument};

use arachne_net::{ForestFit, ResponseData, TrainRequest};

use crate::config::{ImportanceMode, WeightedForestConfig};
use crate::error::ForestError;
use crate::oob::evaluate_oob;
use crate::pvalue::permutation_importance;
use crate::sample::bootstrap_sample;
use crate::split::SplitTarget;
use crate::tree::{DecisionTree, TreeParams};

/// A fitted weighted forest, retained so permutation p-values can be
/// computed against it later.
#[derive(Debug)]
pub struct TrainedForest {
    pub(crate) trees: Vec<DecisionTree>,
    pub(crate) oob_indices_per_tree: Vec<Vec<usize>>,
    n_features: usize,
}

impl TrainedForest {
    /// Return the number of trees.
    #[must_use]
    pub fn n_trees(&self) -> usize {
        self.trees.len()
    }

    /// Return the number of feature columns the forest was trained on.
    #[must_use]
    pub fn n_features(&self) -> usize {
        self.n_features
    }
}

/// Train a weighted forest on one request.
#[instrument(skip_all, fields(n_trees = config.n_trees, n_samples = request.features.len(), mtry = request.mtry))]
pub(crate) fn train(
    config: &WeightedForestConfig,
    request: &TrainRequest<'_>,
) -> Result<(TrainedForest, ForestFit), ForestError> {
    validate(config, request)?;

    let n_samples = request.features.len();
    let n_features = request.features[0].len();

    // Column-major layout for the split scans.
    let col_features: Vec<Vec<f64>> = (0..n_features)
        .map(|feat_idx| request.features.iter().map(|row| row[feat_idx]).collect())
        .collect();

    let n_classes = match request.response {
        ResponseData::Continuous(_) => 0,
        ResponseData::Classes(labels) => labels.iter().max().copied().unwrap_or(0) + 1,
    };
    let target = match request.response {
        ResponseData::Continuous(y) => SplitTarget::Continuous(y),
        ResponseData::Classes(labels) => SplitTarget::Classes { labels, n_classes },
    };

    let draw_count = ((n_samples as f64) * config.sample_fraction).ceil() as usize;
    let params = TreeParams {
        max_depth: config.max_depth,
        min_samples_split: config.min_samples_split,
        min_samples_leaf: config.min_samples_leaf,
        mtry: request.mtry,
    };

    // Generate per-tree seeds from the request's master RNG.
    let mut master_rng = ChaCha8Rng::seed_from_u64(request.seed);
    let tree_seeds: Vec<u64> = (0..config.n_trees).map(|_| master_rng.r#gen()).collect();

    // Parallel tree training. Trees index the shared column store directly;
    // the bootstrap is a list of (repeatable) sample indices, never a copy.
    let tree_results: Vec<(DecisionTree, Vec<usize>)> = tree_seeds
        .into_par_iter()
        .map(|seed| {
            let mut rng = ChaCha8Rng::seed_from_u64(seed);
            let (bootstrap_indices, oob_indices) =
                bootstrap_sample(n_samples, draw_count, &mut rng);
            let tree = DecisionTree::grow(
                &col_features,
                &target,
                &bootstrap_indices,
                request.weights,
                &params,
                &mut rng,
            );
            (tree, oob_indices)
        })
        .collect();

    let mut trees = Vec::with_capacity(config.n_trees);
    let mut oob_indices_per_tree = Vec::with_capacity(config.n_trees);
    for (tree, oob) in tree_results {
        trees.push(tree);
        oob_indices_per_tree.push(oob);
    }

    let oob_eval = evaluate_oob(
        &trees,
        &oob_indices_per_tree,
        request.features,
        request.response,
    )?;

    let forest = TrainedForest {
        trees,
        oob_indices_per_tree,
        n_features,
    };

    let importances = match config.importance {
        ImportanceMode::Impurity => {
            let mut totals = vec![0.0f64; n_features];
            for tree in &forest.trees {
                tree.accumulate_importances(&mut totals);
            }
            totals
        }
        ImportanceMode::Permutation => permutation_importance(
            &forest,
            request.features,
            request.response,
            request.seed.wrapping_add(1),
        ),
    };

    debug!(
        n_trees_trained = forest.trees.len(),
        fit_quality = oob_eval.fit_quality,
        "forest training complete"
    );

    let fit = ForestFit {
        importances,
        fit_quality: oob_eval.fit_quality,
        prediction_error: oob_eval.prediction_error,
        oob_predictions: oob_eval.predictions,
        confusion: oob_eval.confusion,
    };
    Ok((forest, fit))
}

fn validate(config: &WeightedForestConfig, request: &TrainRequest<'_>) -> Result<(), ForestError> {
    config.validate()?;

    if request.features.is_empty() {
        return Err(ForestError::EmptyDataset);
    }
    let n_features = request.features[0].len();
    if n_features == 0 {
        return Err(ForestError::ZeroFeatures);
    }
    for (sample_index, row) in request.features.iter().enumerate() {
        if row.len() != n_features {
            return Err(ForestError::FeatureCountMismatch {
                expected: n_features,
                got: row.len(),
                sample_index,
            });
        }
        for (feature_index, &val) in row.iter().enumerate() {
            if !val.is_finite() {
                return Err(ForestError::NonFiniteValue {
                    sample_index,
                    feature_index,
                });
            }
        }
    }

    if request.response.len() != request.features.len() {
        return Err(ForestError::ResponseLengthMismatch {
            expected: request.features.len(),
            got: request.response.len(),
        });
    }

    if request.weights.len() != n_features {
        return Err(ForestError::WeightCountMismatch {
            expected: n_features,
            got: request.weights.len(),
        });
    }
    for (feature_index, &weight) in request.weights.iter().enumerate() {
        if !weight.is_finite() || weight < 0.0 {
            return Err(ForestError::InvalidWeight {
                feature_index,
                weight,
            });
        }
    }
    if request.weights.iter().all(|&w| w == 0.0) {
        return Err(ForestError::NoActiveFeatures);
    }

    if request.mtry == 0 || request.mtry > n_features {
        return Err(ForestError::InvalidMtry {
            mtry: request.mtry,
            n_features,
        });
    }

    Ok(())
}
