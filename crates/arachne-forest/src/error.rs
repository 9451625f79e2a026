//! Error types for weighted forest training.

/// Errors from weighted Random Forest operations.
#[derive(Debug, thiserror::Error)]
pub enum ForestError {
    /// Returned when n_trees is zero.
    #[error("n_trees must be at least 1, got {n_trees}")]
    InvalidTreeCount {
        /// The invalid n_trees value provided.
        n_trees: usize,
    },

    /// Returned when min_samples_split is less than 2.
    #[error("min_samples_split must be at least 2, got {min_samples_split}")]
    InvalidMinSamplesSplit {
        /// The invalid min_samples_split value provided.
        min_samples_split: usize,
    },

    /// Returned when min_samples_leaf is zero.
    #[error("min_samples_leaf must be at least 1, got {min_samples_leaf}")]
    InvalidMinSamplesLeaf {
        /// The invalid min_samples_leaf value provided.
        min_samples_leaf: usize,
    },

    /// Returned when sample_fraction is not in (0.0, 1.0].
    #[error("sample_fraction must be in (0.0, 1.0], got {fraction}")]
    InvalidSampleFraction {
        /// The invalid sample_fraction value provided.
        fraction: f64,
    },

    /// Returned when the training dataset has zero samples.
    #[error("training dataset has zero samples")]
    EmptyDataset,

    /// Returned when the training dataset has zero feature columns.
    #[error("training dataset has zero feature columns")]
    ZeroFeatures,

    /// Returned when a sample has a different number of features than expected.
    #[error("sample {sample_index} has {got} features, expected {expected}")]
    FeatureCountMismatch {
        /// The expected number of features.
        expected: usize,
        /// The actual number of features in the sample.
        got: usize,
        /// The zero-based index of the offending sample.
        sample_index: usize,
    },

    /// Returned when a training value is NaN or infinite.
    #[error("non-finite value at sample {sample_index}, feature {feature_index}")]
    NonFiniteValue {
        /// The zero-based index of the offending sample.
        sample_index: usize,
        /// The zero-based index of the offending feature column.
        feature_index: usize,
    },

    /// Returned when the response length does not match the sample count.
    #[error("response has {got} values, expected {expected}")]
    ResponseLengthMismatch {
        /// The number of training samples.
        expected: usize,
        /// The actual response length.
        got: usize,
    },

    /// Returned when the weight vector length does not match the feature count.
    #[error("weight vector has {got} entries, expected {expected}")]
    WeightCountMismatch {
        /// The number of feature columns.
        expected: usize,
        /// The actual weight vector length.
        got: usize,
    },

    /// Returned when a split-selection weight is negative or non-finite.
    #[error("invalid weight {weight} for feature {feature_index}")]
    InvalidWeight {
        /// The zero-based index of the offending feature.
        feature_index: usize,
        /// The offending weight value.
        weight: f64,
    },

    /// Returned when every split-selection weight is zero.
    #[error("all split-selection weights are zero")]
    NoActiveFeatures,

    /// Returned when mtry is zero or exceeds the feature count.
    #[error("mtry {mtry} is outside [1, {n_features}]")]
    InvalidMtry {
        /// The requested mtry.
        mtry: usize,
        /// The number of feature columns.
        n_features: usize,
    },

    /// Returned when no sample has any out-of-bag tree.
    #[error("OOB evaluation failed: no sample has any OOB tree")]
    NoOobSamples,
}
