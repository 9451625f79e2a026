//! Feature matrix domain type.

use std::collections::HashSet;

use crate::error::NetError;

/// A validated numeric feature matrix: m samples by n named columns.
///
/// Rows are samples, columns are features, `rows[sample_idx][feature_idx]`.
/// Column names are unique and every value is finite. The matrix is
/// immutable once built; network inference partitions it logically into one
/// response column and n−1 predictor columns per run.
#[derive(Debug, Clone)]
pub struct FeatureMatrix {
    feature_names: Vec<String>,
    rows: Vec<Vec<f64>>,
}

impl FeatureMatrix {
    /// Build a matrix from column names and row-major values.
    ///
    /// # Errors
    ///
    /// | Variant | Condition |
    /// |---|---|
    /// | [`NetError::EmptyPredictors`] | Zero columns |
    /// | [`NetError::NoSamples`] | Zero rows |
    /// | [`NetError::DuplicateFeatureName`] | Two columns share a name |
    /// | [`NetError::PredictorRowMismatch`] | A row's length disagrees with the names |
    /// | [`NetError::NonFiniteValue`] | A value is NaN or infinite |
    pub fn new(feature_names: Vec<String>, rows: Vec<Vec<f64>>) -> Result<Self, NetError> {
        if feature_names.is_empty() {
            return Err(NetError::EmptyPredictors);
        }
        if rows.is_empty() {
            return Err(NetError::NoSamples);
        }

        let mut seen: HashSet<&str> = HashSet::with_capacity(feature_names.len());
        for name in &feature_names {
            if !seen.insert(name.as_str()) {
                return Err(NetError::DuplicateFeatureName { name: name.clone() });
            }
        }

        let n_features = feature_names.len();
        for (sample_index, row) in rows.iter().enumerate() {
            if row.len() != n_features {
                return Err(NetError::PredictorRowMismatch {
                    expected: n_features,
                    got: row.len(),
                    sample_index,
                });
            }
            for (feature_index, &val) in row.iter().enumerate() {
                if !val.is_finite() {
                    return Err(NetError::NonFiniteValue {
                        sample_index,
                        feature: feature_names[feature_index].clone(),
                    });
                }
            }
        }

        Ok(Self { feature_names, rows })
    }

    /// Return the number of samples.
    #[must_use]
    pub fn n_samples(&self) -> usize {
        self.rows.len()
    }

    /// Return the number of feature columns.
    #[must_use]
    pub fn n_features(&self) -> usize {
        self.feature_names.len()
    }

    /// Return the feature column names.
    #[must_use]
    pub fn feature_names(&self) -> &[String] {
        &self.feature_names
    }

    /// Return the row-major values.
    #[must_use]
    pub fn rows(&self) -> &[Vec<f64>] {
        &self.rows
    }

    /// Return one column by zero-based index.
    #[must_use]
    pub fn column(&self, index: usize) -> Vec<f64> {
        self.rows.iter().map(|row| row[index]).collect()
    }

    /// Return the zero-based index of a column by name, if present.
    #[must_use]
    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.feature_names.iter().position(|n| n == name)
    }

    /// Split the matrix around a response column (zero-based).
    ///
    /// Returns the predictor rows (column order preserved, response column
    /// removed), the predictor names, and the response column.
    #[must_use]
    pub fn partition(&self, target: usize) -> (Vec<Vec<f64>>, Vec<String>, Vec<f64>) {
        let predictor_rows: Vec<Vec<f64>> = self
            .rows
            .iter()
            .map(|row| {
                row.iter()
                    .enumerate()
                    .filter_map(|(i, &v)| (i != target).then_some(v))
                    .collect()
            })
            .collect();
        let predictor_names: Vec<String> = self
            .feature_names
            .iter()
            .enumerate()
            .filter_map(|(i, n)| (i != target).then(|| n.clone()))
            .collect();
        let response = self.column(target);
        (predictor_rows, predictor_names, response)
    }
}

/// Encode a numeric column as zero-based class labels.
///
/// Distinct values map to labels by ascending value, so encoding is
/// deterministic regardless of row order. Used when a numeric response
/// column is treated as categorical.
#[must_use]
pub fn encode_class_labels(values: &[f64]) -> Vec<usize> {
    let mut distinct: Vec<f64> = values.to_vec();
    distinct.sort_unstable_by(f64::total_cmp);
    distinct.dedup_by(|a, b| a.total_cmp(b).is_eq());

    values
        .iter()
        .map(|v| {
            distinct
                .binary_search_by(|probe| probe.total_cmp(v))
                .unwrap_or(0)
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::{FeatureMatrix, encode_class_labels};
    use crate::error::NetError;

    fn names(list: &[&str]) -> Vec<String> {
        list.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn valid_matrix_roundtrip() {
        let m = FeatureMatrix::new(
            names(&["a", "b", "c"]),
            vec![vec![1.0, 2.0, 3.0], vec![4.0, 5.0, 6.0]],
        )
        .unwrap();
        assert_eq!(m.n_samples(), 2);
        assert_eq!(m.n_features(), 3);
        assert_eq!(m.column(1), vec![2.0, 5.0]);
        assert_eq!(m.column_index("c"), Some(2));
        assert_eq!(m.column_index("z"), None);
    }

    #[test]
    fn partition_removes_target_column() {
        let m = FeatureMatrix::new(
            names(&["a", "b", "c"]),
            vec![vec![1.0, 2.0, 3.0], vec![4.0, 5.0, 6.0]],
        )
        .unwrap();
        let (rows, pred_names, response) = m.partition(1);
        assert_eq!(rows, vec![vec![1.0, 3.0], vec![4.0, 6.0]]);
        assert_eq!(pred_names, names(&["a", "c"]));
        assert_eq!(response, vec![2.0, 5.0]);
    }

    #[test]
    fn duplicate_name_rejected() {
        let err = FeatureMatrix::new(names(&["a", "a"]), vec![vec![1.0, 2.0]]).unwrap_err();
        assert!(matches!(err, NetError::DuplicateFeatureName { name } if name == "a"));
    }

    #[test]
    fn ragged_rows_rejected() {
        let err = FeatureMatrix::new(
            names(&["a", "b"]),
            vec![vec![1.0, 2.0], vec![3.0]],
        )
        .unwrap_err();
        assert!(matches!(
            err,
            NetError::PredictorRowMismatch { sample_index: 1, expected: 2, got: 1 }
        ));
    }

    #[test]
    fn non_finite_rejected() {
        let err = FeatureMatrix::new(
            names(&["a", "b"]),
            vec![vec![1.0, f64::NAN]],
        )
        .unwrap_err();
        assert!(matches!(err, NetError::NonFiniteValue { sample_index: 0, .. }));
    }

    #[test]
    fn empty_inputs_rejected() {
        assert!(matches!(
            FeatureMatrix::new(vec![], vec![vec![]]),
            Err(NetError::EmptyPredictors)
        ));
        assert!(matches!(
            FeatureMatrix::new(names(&["a"]), vec![]),
            Err(NetError::NoSamples)
        ));
    }

    #[test]
    fn class_labels_by_ascending_value() {
        let labels = encode_class_labels(&[2.0, 0.0, 1.0, 2.0, 0.0]);
        assert_eq!(labels, vec![2, 0, 1, 2, 0]);
    }

    #[test]
    fn class_labels_single_class() {
        let labels = encode_class_labels(&[5.0, 5.0, 5.0]);
        assert_eq!(labels, vec![0, 0, 0]);
    }
}
