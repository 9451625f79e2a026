//! Out-of-bag evaluation for weighted forests.

use arachne_net::{ConfusionSummary, ResponseData};

use crate::error::ForestError;
use crate::node::LeafValue;
use crate::tree::DecisionTree;

/// Out-of-bag statistics for one trained forest.
#[derive(Debug, Clone)]
pub(crate) struct OobEvaluation {
    /// OOB prediction per sample; NaN where no tree held the sample out.
    pub(crate) predictions: Vec<f64>,
    /// Variance explained (regression) or accuracy (classification).
    pub(crate) fit_quality: f64,
    /// MSE (regression) or error rate (classification).
    pub(crate) prediction_error: f64,
    /// Confusion counts, classification only.
    pub(crate) confusion: Option<ConfusionSummary>,
}

/// Aggregate OOB predictions across trees and score the forest.
///
/// For each sample only the trees that held it out of bag contribute:
/// regression averages their leaf means, classification takes the majority
/// vote. Samples no tree held out are skipped (NaN prediction).
pub(crate) fn evaluate_oob(
    trees: &[DecisionTree],
    oob_indices_per_tree: &[Vec<usize>],
    features: &[Vec<f64>],
    response: ResponseData<'_>,
) -> Result<OobEvaluation, ForestError> {
    match response {
        ResponseData::Continuous(y) => evaluate_regression(trees, oob_indices_per_tree, features, y),
        ResponseData::Classes(labels) => {
            let n_classes = labels.iter().max().copied().unwrap_or(0) + 1;
            evaluate_classification(trees, oob_indices_per_tree, features, labels, n_classes)
        }
    }
}

fn evaluate_regression(
    trees: &[DecisionTree],
    oob_indices_per_tree: &[Vec<usize>],
    features: &[Vec<f64>],
    y: &[f64],
) -> Result<OobEvaluation, ForestError> {
    let n_samples = features.len();
    let mut sums = vec![0.0f64; n_samples];
    let mut counts = vec![0usize; n_samples];

    for (tree, oob_indices) in trees.iter().zip(oob_indices_per_tree) {
        for &sample_idx in oob_indices {
            if let LeafValue::Mean(pred) = tree.predict(&features[sample_idx]) {
                sums[sample_idx] += pred;
                counts[sample_idx] += 1;
            }
        }
    }

    let n_covered = counts.iter().filter(|&&c| c > 0).count();
    if n_covered == 0 {
        return Err(ForestError::NoOobSamples);
    }

    let mut predictions = vec![f64::NAN; n_samples];
    let mut sq_err = 0.0f64;
    for i in 0..n_samples {
        if counts[i] > 0 {
            let pred = sums[i] / counts[i] as f64;
            predictions[i] = pred;
            sq_err += (pred - y[i]) * (pred - y[i]);
        }
    }
    let mse = sq_err / n_covered as f64;

    // Variance explained is measured against the overall response variance.
    let mean_y: f64 = y.iter().sum::<f64>() / y.len() as f64;
    let var_y: f64 = y.iter().map(|&v| (v - mean_y) * (v - mean_y)).sum::<f64>() / y.len() as f64;
    let fit_quality = if var_y > 0.0 { 1.0 - mse / var_y } else { 0.0 };

    Ok(OobEvaluation {
        predictions,
        fit_quality,
        prediction_error: mse,
        confusion: None,
    })
}

fn evaluate_classification(
    trees: &[DecisionTree],
    oob_indices_per_tree: &[Vec<usize>],
    features: &[Vec<f64>],
    labels: &[usize],
    n_classes: usize,
) -> Result<OobEvaluation, ForestError> {
    let n_samples = features.len();
    let mut votes = vec![vec![0usize; n_classes]; n_samples];
    let mut has_oob = vec![false; n_samples];

    for (tree, oob_indices) in trees.iter().zip(oob_indices_per_tree) {
        for &sample_idx in oob_indices {
            if let LeafValue::Class(pred) = tree.predict(&features[sample_idx]) {
                votes[sample_idx][pred] += 1;
                has_oob[sample_idx] = true;
            }
        }
    }

    let n_covered = has_oob.iter().filter(|&&h| h).count();
    if n_covered == 0 {
        return Err(ForestError::NoOobSamples);
    }

    let mut predictions = vec![f64::NAN; n_samples];
    let mut counts = vec![vec![0usize; n_classes]; n_classes];
    let mut correct = 0usize;

    for i in 0..n_samples {
        if !has_oob[i] {
            continue;
        }
        // Strict comparison keeps the lowest class on ties.
        let mut predicted = 0usize;
        for (class, &count) in votes[i].iter().enumerate() {
            if count > votes[i][predicted] {
                predicted = class;
            }
        }
        predictions[i] = predicted as f64;
        counts[labels[i]][predicted] += 1;
        if predicted == labels[i] {
            correct += 1;
        }
    }

    let accuracy = correct as f64 / n_covered as f64;
    Ok(OobEvaluation {
        predictions,
        fit_quality: accuracy,
        prediction_error: 1.0 - accuracy,
        confusion: Some(ConfusionSummary { counts, accuracy }),
    })
}
