//! JSON and CSV writers for network and refinement artifacts.

use std::fs;
use std::path::{Path, PathBuf};

use arachne_net::{Edge, RoundRecord};
use serde::Serialize;
use tracing::{debug, info, instrument};

use crate::IoError;
use crate::domain::ExperimentName;

/// Writes network and refinement results to the output directory.
///
/// Creates the output directory on construction if it does not exist.
/// Output files are named `{experiment}_network.json`,
/// `{experiment}_edges.csv`, and `{experiment}_refinement.json`.
pub struct NetworkWriter {
    output_dir: PathBuf,
    experiment: ExperimentName,
}

#[derive(Serialize)]
struct NetworkArtifact<'a> {
    experiment: &'a str,
    n_features: usize,
    n_samples: usize,
    n_edges: usize,
    edges: &'a [Edge],
}

#[derive(Serialize)]
struct RoundArtifact<'a> {
    round: usize,
    fit_quality: f64,
    prediction_error: f64,
    mtry: usize,
    active_predictors: usize,
    predictors: &'a [String],
    weights: &'a [f64],
}

#[derive(Serialize)]
struct RefinementArtifact<'a> {
    experiment: &'a str,
    response: &'a str,
    rounds_completed: usize,
    best_round: Option<usize>,
    rounds: Vec<RoundArtifact<'a>>,
}

impl NetworkWriter {
    /// Create a new writer targeting the given directory and experiment name.
    ///
    /// # Errors
    ///
    /// Returns [`IoError::OutputDirCreate`] if the directory cannot be created.
    #[instrument(skip_all, fields(dir = %output_dir.display(), experiment = %experiment))]
    pub fn new(output_dir: &Path, experiment: ExperimentName) -> Result<Self, IoError> {
        fs::create_dir_all(output_dir).map_err(|e| IoError::OutputDirCreate {
            path: output_dir.to_path_buf(),
            source: e,
        })?;
        debug!("output directory ready");
        Ok(Self {
            output_dir: output_dir.to_path_buf(),
            experiment,
        })
    }

    /// Return the path of the network JSON artifact.
    #[must_use]
    pub fn network_path(&self) -> PathBuf {
        self.output_dir
            .join(format!("{}_network.json", self.experiment.as_str()))
    }

    /// Return the path of the edge-list CSV artifact.
    #[must_use]
    pub fn edges_path(&self) -> PathBuf {
        self.output_dir
            .join(format!("{}_edges.csv", self.experiment.as_str()))
    }

    /// Return the path of the refinement JSON artifact.
    #[must_use]
    pub fn refinement_path(&self) -> PathBuf {
        self.output_dir
            .join(format!("{}_refinement.json", self.experiment.as_str()))
    }

    /// Write the network to `{experiment}_network.json`.
    ///
    /// # Errors
    ///
    /// Returns [`IoError::WriteFile`] if the file cannot be written.
    #[instrument(skip_all)]
    pub fn write_network(
        &self,
        n_features: usize,
        n_samples: usize,
        edges: &[Edge],
    ) -> Result<(), IoError> {
        let path = self.network_path();
        let artifact = NetworkArtifact {
            experiment: self.experiment.as_str(),
            n_features,
            n_samples,
            n_edges: edges.len(),
            edges,
        };

        let json = serde_json::to_string_pretty(&artifact).expect("serialization cannot fail");
        fs::write(&path, &json).map_err(|e| IoError::WriteFile {
            path: path.clone(),
            source: e,
        })?;

        info!(path = %path.display(), n_edges = edges.len(), "network written");
        Ok(())
    }

    /// Write the edge list to `{experiment}_edges.csv`.
    ///
    /// Columns: `source,target,weight,fit_quality`, one row per edge in
    /// canonical order.
    ///
    /// # Errors
    ///
    /// Returns [`IoError::WriteFile`] if the file cannot be written.
    #[instrument(skip_all)]
    pub fn write_edges_csv(&self, edges: &[Edge]) -> Result<(), IoError> {
        let path = self.edges_path();
        let mut wtr = csv::Writer::from_path(&path).map_err(|e| IoError::WriteFile {
            path: path.clone(),
            source: std::io::Error::other(e),
        })?;

        for edge in edges {
            wtr.serialize(edge).map_err(|e| IoError::WriteFile {
                path: path.clone(),
                source: std::io::Error::other(e),
            })?;
        }
        wtr.flush().map_err(|e| IoError::WriteFile {
            path: path.clone(),
            source: e,
        })?;

        info!(path = %path.display(), n_edges = edges.len(), "edge list written");
        Ok(())
    }

    /// Write per-round refinement statistics to `{experiment}_refinement.json`.
    ///
    /// # Errors
    ///
    /// Returns [`IoError::WriteFile`] if the file cannot be written.
    #[instrument(skip_all, fields(response))]
    pub fn write_refinement(
        &self,
        response: &str,
        predictor_names: &[String],
        rounds_completed: usize,
        best_round: Option<usize>,
        records: &[RoundRecord],
    ) -> Result<(), IoError> {
        let path = self.refinement_path();
        let artifact = RefinementArtifact {
            experiment: self.experiment.as_str(),
            response,
            rounds_completed,
            best_round,
            rounds: records
                .iter()
                .map(|r| RoundArtifact {
                    round: r.round,
                    fit_quality: r.fit_quality,
                    prediction_error: r.prediction_error,
                    mtry: r.mtry,
                    active_predictors: r.active_predictors,
                    predictors: predictor_names,
                    weights: r.weights.as_slice(),
                })
                .collect(),
        };

        let json = serde_json::to_string_pretty(&artifact).expect("serialization cannot fail");
        fs::write(&path, &json).map_err(|e| IoError::WriteFile {
            path: path.clone(),
            source: e,
        })?;

        info!(path = %path.display(), "refinement written");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use arachne_net::Edge;
    use tempfile::TempDir;

    use super::NetworkWriter;
    use crate::domain::ExperimentName;

    fn edges() -> Vec<Edge> {
        vec![
            Edge {
                source: "g1".to_string(),
                target: "g2".to_string(),
                weight: 0.7,
                fit_quality: 0.9,
            },
            Edge {
                source: "g2".to_string(),
                target: "g1".to_string(),
                weight: 0.3,
                fit_quality: 0.8,
            },
        ]
    }

    #[test]
    fn network_json_round_trip() {
        let dir = TempDir::new().unwrap();
        let writer = NetworkWriter::new(
            dir.path(),
            ExperimentName::new("demo".to_string()).unwrap(),
        )
        .unwrap();

        writer.write_network(2, 10, &edges()).unwrap();

        let content = std::fs::read_to_string(writer.network_path()).unwrap();
        let value: serde_json::Value = serde_json::from_str(&content).unwrap();
        assert_eq!(value["experiment"], "demo");
        assert_eq!(value["n_edges"], 2);
        assert_eq!(value["edges"][0]["source"], "g1");
    }

    #[test]
    fn edges_csv_has_header_and_rows() {
        let dir = TempDir::new().unwrap();
        let writer = NetworkWriter::new(
            dir.path(),
            ExperimentName::new("demo".to_string()).unwrap(),
        )
        .unwrap();

        writer.write_edges_csv(&edges()).unwrap();

        let content = std::fs::read_to_string(writer.edges_path()).unwrap();
        let mut lines = content.lines();
        assert_eq!(lines.next().unwrap(), "source,target,weight,fit_quality");
        assert!(lines.next().unwrap().starts_with("g1,g2,0.7"));
        assert_eq!(lines.count(), 1);
    }

    #[test]
    fn creates_missing_output_directory() {
        let dir = TempDir::new().unwrap();
        let nested = dir.path().join("a").join("b");
        let writer = NetworkWriter::new(
            &nested,
            ExperimentName::new("demo".to_string()).unwrap(),
        );
        assert!(writer.is_ok());
        assert!(nested.is_dir());
    }
}
