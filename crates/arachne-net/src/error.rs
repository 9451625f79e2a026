//! Error types for network inference.

use crate::engine::EngineFailure;

/// Errors from reweighted refinement and network assembly.
#[derive(Debug, thiserror::Error)]
pub enum NetError {
    /// Returned when the predictor set has zero columns.
    #[error("predictor set has zero columns")]
    EmptyPredictors,

    /// Returned when the predictor matrix has zero sample rows.
    #[error("predictor matrix has zero sample rows")]
    NoSamples,

    /// Returned when a predictor row has a different column count than expected.
    #[error("sample {sample_index} has {got} predictor values, expected {expected}")]
    PredictorRowMismatch {
        /// The expected number of predictor columns.
        expected: usize,
        /// The actual number of values in the sample row.
        got: usize,
        /// The zero-based index of the offending sample.
        sample_index: usize,
    },

    /// Returned when the response length disagrees with the sample count.
    #[error("response has {got} values, expected {expected}")]
    ResponseLengthMismatch {
        /// The number of sample rows.
        expected: usize,
        /// The actual response length.
        got: usize,
    },

    /// Returned when a matrix value is NaN or infinite.
    #[error("non-finite value at sample {sample_index}, feature \"{feature}\"")]
    NonFiniteValue {
        /// The zero-based index of the offending sample.
        sample_index: usize,
        /// The name of the offending feature column.
        feature: String,
    },

    /// Returned when two matrix columns share a name.
    #[error("duplicate feature name \"{name}\"")]
    DuplicateFeatureName {
        /// The duplicated column name.
        name: String,
    },

    /// Returned when the iteration bound is zero.
    #[error("max_rounds must be at least 1, got {max_rounds}")]
    InvalidIterationBound {
        /// The invalid bound provided.
        max_rounds: usize,
    },

    /// Returned when an mtry proportion is outside (0.0, 1.0].
    #[error("mtry proportion must be in (0.0, 1.0], got {proportion}")]
    InvalidMtryProportion {
        /// The invalid proportion provided.
        proportion: f64,
    },

    /// Returned when an absolute mtry count is zero.
    #[error("absolute mtry must be at least 1")]
    InvalidMtryCount,

    /// Returned when the matrix has fewer than two feature columns.
    #[error("network inference needs at least 2 feature columns, got {n_features}")]
    TooFewColumns {
        /// The number of columns in the matrix.
        n_features: usize,
    },

    /// Returned when the response range leaves [1, n_features] or is inverted.
    #[error("feature range [{first}, {last}] is invalid for {n_features} columns")]
    InvalidRange {
        /// One-based first response column.
        first: usize,
        /// One-based last response column.
        last: usize,
        /// The number of columns in the matrix.
        n_features: usize,
    },

    /// Returned when the importance sum is exactly zero before any round completed.
    #[error("importance sum is zero in round {round}; weights cannot be normalized")]
    DegenerateWeights {
        /// The one-based round in which normalization failed.
        round: usize,
    },

    /// Returned when the forest engine collaborator fails.
    #[error(transparent)]
    Engine(#[from] EngineFailure),

    /// Returned when a per-response task fails during network assembly.
    #[error("inference failed for response feature {index} (\"{name}\")")]
    FeatureTask {
        /// One-based column index of the failing response feature.
        index: usize,
        /// Name of the failing response feature.
        name: String,
        /// The underlying refinement error.
        source: Box<NetError>,
    },
}
