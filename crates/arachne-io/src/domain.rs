//! Domain types for arachne-io.

use arachne_net::FeatureMatrix;

use crate::IoError;

/// A sample (row) identifier from the first CSV column.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct SampleId(String);

impl SampleId {
    pub(crate) fn new(id: String) -> Self {
        debug_assert!(!id.is_empty(), "sample id must not be empty");
        Self(id)
    }

    /// Return the sample id as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for SampleId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// A validated experiment name for output file naming.
///
/// Must match `[a-zA-Z0-9_-]+`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExperimentName(String);

impl ExperimentName {
    /// Parse and validate an experiment name.
    ///
    /// # Errors
    ///
    /// Returns [`IoError::InvalidExperimentName`] if the name is empty or
    /// contains characters outside `[a-zA-Z0-9_-]`.
    pub fn new(name: String) -> Result<Self, IoError> {
        if name.is_empty()
            || !name
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-')
        {
            return Err(IoError::InvalidExperimentName { name });
        }
        Ok(Self(name))
    }

    /// Return the experiment name as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for ExperimentName {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// A feature matrix with the sample ids it was read alongside.
///
/// Produced by [`MatrixReader`](crate::MatrixReader). `sample_ids[i]`
/// identifies row `i` of the matrix.
#[derive(Debug)]
pub struct MatrixDataset {
    sample_ids: Vec<SampleId>,
    matrix: FeatureMatrix,
}

impl MatrixDataset {
    pub(crate) fn new(sample_ids: Vec<SampleId>, matrix: FeatureMatrix) -> Self {
        Self { sample_ids, matrix }
    }

    /// Return the sample ids in row order.
    #[must_use]
    pub fn sample_ids(&self) -> &[SampleId] {
        &self.sample_ids
    }

    /// Return the feature matrix.
    #[must_use]
    pub fn matrix(&self) -> &FeatureMatrix {
        &self.matrix
    }

    /// Consume the dataset and return the feature matrix.
    #[must_use]
    pub fn into_matrix(self) -> FeatureMatrix {
        self.matrix
    }
}
