//! Collaborator interface to the random forest engine.
//!
//! The refinement loop never grows trees itself: each round it hands the
//! current weight vector to a [`ForestEngine`] and reads importances and fit
//! statistics back. Any forest library can sit behind this trait; the
//! in-workspace implementation lives in the `arachne-forest` crate.

use serde::Serialize;

/// The response column for one training run.
#[derive(Debug, Clone, Copy)]
pub enum ResponseData<'a> {
    /// Continuous response (regression forest).
    Continuous(&'a [f64]),
    /// Zero-based class labels (classification forest).
    Classes(&'a [usize]),
}

impl ResponseData<'_> {
    /// Return the number of response values.
    #[must_use]
    pub fn len(&self) -> usize {
        match self {
            ResponseData::Continuous(v) => v.len(),
            ResponseData::Classes(v) => v.len(),
        }
    }

    /// Return `true` if the response is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// One weighted training request, covering a single refinement round.
///
/// `features` is row-major: `features[sample_idx][predictor_idx]`. The weight
/// vector aligns with the predictor columns and biases split-candidate
/// selection; a predictor with weight 0 must never be offered as a candidate.
/// `seed` is a reproducibility hint the engine may use to derive its RNG
/// state; engines that manage their own randomness may ignore it.
#[derive(Debug, Clone, Copy)]
pub struct TrainRequest<'a> {
    /// Predictor values, row-major.
    pub features: &'a [Vec<f64>],
    /// Predictor column names, aligned with `features` columns.
    pub feature_names: &'a [String],
    /// The response column.
    pub response: ResponseData<'a>,
    /// Per-predictor split-selection weights, non-negative.
    pub weights: &'a [f64],
    /// Number of candidate predictors per split.
    pub mtry: usize,
    /// Seed hint for the engine's RNG.
    pub seed: u64,
}

/// Confusion counts from out-of-bag classification.
///
/// `counts[true_class][predicted_class]` over the OOB-covered samples.
#[derive(Debug, Clone, Serialize)]
pub struct ConfusionSummary {
    /// The confusion counts, `counts[true][predicted]`.
    pub counts: Vec<Vec<usize>>,
    /// Fraction of OOB-covered samples predicted correctly.
    pub accuracy: f64,
}

/// Everything one forest training hands back to the refinement loop.
#[derive(Debug, Clone)]
pub struct ForestFit {
    /// Raw per-predictor importances, aligned with the request's columns.
    /// Unnormalized; may contain negative entries depending on the engine's
    /// importance mode.
    pub importances: Vec<f64>,
    /// Scalar fit quality: variance explained for regression, OOB accuracy
    /// for classification. Higher is better.
    pub fit_quality: f64,
    /// Out-of-bag prediction error: MSE for regression, error rate for
    /// classification.
    pub prediction_error: f64,
    /// Out-of-bag prediction per sample; NaN where no tree held the sample
    /// out of bag.
    pub oob_predictions: Vec<f64>,
    /// Confusion counts, present for classification fits.
    pub confusion: Option<ConfusionSummary>,
}

/// Observed importance and permutation p-value for one predictor.
#[derive(Debug, Clone, Copy)]
pub struct ImportancePValue {
    /// The observed importance score.
    pub importance: f64,
    /// Probability of an importance at least this large under the null.
    pub p_value: f64,
}

/// An opaque failure raised by a forest engine.
///
/// Engines wrap their own error types here; the refinement loop propagates
/// the failure without interpreting it.
#[derive(Debug, thiserror::Error)]
#[error("forest engine failure: {message}")]
pub struct EngineFailure {
    message: String,
    #[source]
    source: Option<Box<dyn std::error::Error + Send + Sync + 'static>>,
}

impl EngineFailure {
    /// Create a failure from a message alone.
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            source: None,
        }
    }

    /// Create a failure wrapping an underlying error.
    pub fn with_source(
        message: impl Into<String>,
        source: impl std::error::Error + Send + Sync + 'static,
    ) -> Self {
        Self {
            message: message.into(),
            source: Some(Box::new(source)),
        }
    }

    /// Return the failure message.
    #[must_use]
    pub fn message(&self) -> &str {
        &self.message
    }
}

/// A random forest training engine with weighted split selection.
///
/// `train` fits one forest and returns the fitted model alongside its
/// statistics. `importance_pvalues` scores the predictors of an existing
/// model against a permutation null distribution; like the statistics, the
/// returned vector aligns with the request's predictor order. The request is
/// passed again because models do not retain their training data.
pub trait ForestEngine {
    /// The fitted model type retained between `train` and `importance_pvalues`.
    type Model;

    /// Train one weighted forest.
    fn train(&self, request: &TrainRequest<'_>)
        -> Result<(Self::Model, ForestFit), EngineFailure>;

    /// Compute permutation-based importance p-values for a trained model.
    fn importance_pvalues(
        &self,
        model: &Self::Model,
        request: &TrainRequest<'_>,
        permutations: usize,
    ) -> Result<Vec<ImportancePValue>, EngineFailure>;
}
