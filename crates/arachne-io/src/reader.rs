//! CSV feature-matrix reader with full input validation.

use std::collections::{HashMap, HashSet};
use std::path::{Path, PathBuf};

use arachne_net::FeatureMatrix;
use tracing::{debug, info, instrument};

use crate::IoError;
use crate::domain::{MatrixDataset, SampleId};

/// Reads a numeric feature matrix from a CSV file.
///
/// Expected CSV format:
/// - Header row required (first column is the sample id, remaining cells are
///   feature names)
/// - `sample_id,feature1,feature2,...,featureN`
/// - One row per sample, all rows must have the same number of columns
///
/// # Errors
///
/// | Variant | Condition |
/// |---|---|
/// | [`IoError::FileNotFound`] | File doesn't exist or is unreadable |
/// | [`IoError::CsvParse`] | Malformed CSV record |
/// | [`IoError::NoFeatureColumns`] | Only a sample id column, no features |
/// | [`IoError::DuplicateFeatureName`] | Two feature columns share a name |
/// | [`IoError::EmptyDataset`] | Zero data rows after header |
/// | [`IoError::InconsistentRowLength`] | Row has different column count than header |
/// | [`IoError::NonFiniteValue`] | Cell is NaN, Inf, or unparseable float |
/// | [`IoError::DuplicateSampleId`] | Same sample id appears twice |
pub struct MatrixReader {
    path: PathBuf,
}

impl MatrixReader {
    /// Create a new reader for the given CSV file path.
    pub fn new(path: &Path) -> Self {
        Self {
            path: path.to_path_buf(),
        }
    }

    /// Read and validate the CSV file, returning a [`MatrixDataset`].
    #[instrument(skip(self), fields(path = %self.path.display()))]
    pub fn read(&self) -> Result<MatrixDataset, IoError> {
        let file = std::fs::File::open(&self.path).map_err(|e| IoError::FileNotFound {
            path: self.path.clone(),
            source: e,
        })?;

        // flexible(true) allows rows with varying column counts so that our own
        // InconsistentRowLength check fires instead of a low-level CsvParse error.
        let mut rdr = csv::ReaderBuilder::new()
            .has_headers(true)
            .flexible(true)
            .from_reader(file);

        let header = rdr.headers().map_err(|e| IoError::CsvParse {
            path: self.path.clone(),
            offset: e.position().map_or(0, |p| p.byte()),
            source: e,
        })?;
        let expected_cols = header.len();
        debug!(expected_cols, "read CSV header");

        if expected_cols < 2 {
            return Err(IoError::NoFeatureColumns {
                path: self.path.clone(),
            });
        }

        let feature_names: Vec<String> = header.iter().skip(1).map(String::from).collect();
        let mut name_check: HashSet<&str> = HashSet::with_capacity(feature_names.len());
        for name in &feature_names {
            if !name_check.insert(name.as_str()) {
                return Err(IoError::DuplicateFeatureName {
                    path: self.path.clone(),
                    name: name.clone(),
                });
            }
        }

        let mut sample_ids = Vec::new();
        let mut rows = Vec::new();
        let mut seen: HashMap<String, usize> = HashMap::new();

        for (row_index, result) in rdr.records().enumerate() {
            let record = result.map_err(|e| IoError::CsvParse {
                path: self.path.clone(),
                offset: e.position().map_or(0, |p| p.byte()),
                source: e,
            })?;

            if record.len() != expected_cols {
                let sample_id = record.get(0).unwrap_or("").to_string();
                return Err(IoError::InconsistentRowLength {
                    path: self.path.clone(),
                    row_index,
                    sample_id,
                    expected: expected_cols,
                    got: record.len(),
                });
            }

            let sample_id_str = record.get(0).unwrap_or("").to_string();
            if let Some(&first_row) = seen.get(&sample_id_str) {
                return Err(IoError::DuplicateSampleId {
                    path: self.path.clone(),
                    sample_id: sample_id_str,
                    first_row,
                    second_row: row_index,
                });
            }
            seen.insert(sample_id_str.clone(), row_index);

            let mut values = Vec::with_capacity(expected_cols - 1);
            for col_index in 1..record.len() {
                let raw = record.get(col_index).unwrap_or("");
                let value: f64 = raw.parse().map_err(|_| IoError::NonFiniteValue {
                    path: self.path.clone(),
                    row_index,
                    col_index: col_index - 1,
                    raw: raw.to_string(),
                })?;
                if !value.is_finite() {
                    return Err(IoError::NonFiniteValue {
                        path: self.path.clone(),
                        row_index,
                        col_index: col_index - 1,
                        raw: raw.to_string(),
                    });
                }
                values.push(value);
            }

            sample_ids.push(SampleId::new(sample_id_str));
            rows.push(values);
        }

        if sample_ids.is_empty() {
            return Err(IoError::EmptyDataset {
                path: self.path.clone(),
            });
        }

        // Already validated above, so this should not fail, but handle gracefully.
        let matrix = FeatureMatrix::new(feature_names, rows).map_err(|_| IoError::EmptyDataset {
            path: self.path.clone(),
        })?;

        info!(
            n_samples = matrix.n_samples(),
            n_features = matrix.n_features(),
            "matrix loaded"
        );

        Ok(MatrixDataset::new(sample_ids, matrix))
    }
}
