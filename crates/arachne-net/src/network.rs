//! Leave-one-out network assembly.
//!
//! Every column of the matrix takes a turn as the response; the refinement
//! loop runs once per turn and the best round's normalized importances
//! become directed edges into that column. Per-response tasks are
//! independent and fan out across the rayon pool; the ordered `collect`
//! fixes the canonical edge order (response column ascending, then predictor
//! column order) regardless of which worker finishes first.

use rayon::iter::{IntoParallelIterator, ParallelIterator};
use serde::Serialize;
use tracing::{info, instrument, warn};

use crate::engine::{ForestEngine, ResponseData};
use crate::error::NetError;
use crate::matrix::{FeatureMatrix, encode_class_labels};
use crate::mtry::MtryPolicy;
use crate::refine::{PvalueCulling, RefineConfig, TaskKind};
use crate::result::HistoryMode;

/// A directed, weighted edge of the predictive network.
///
/// `source` predicts `target`; the pair (A→B) and (B→A) come from
/// independent runs and need not agree.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Edge {
    /// Predictor feature name.
    pub source: String,
    /// Response feature name.
    pub target: String,
    /// Normalized importance of the predictor, strictly positive.
    pub weight: f64,
    /// Fit quality of the model that produced this edge.
    pub fit_quality: f64,
}

/// One-based inclusive range of columns allowed to act as response.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FeatureRange {
    first: usize,
    last: usize,
}

impl FeatureRange {
    /// Create a range covering columns `first..=last` (columns are numbered
    /// from 1). Bounds are validated against the matrix at build time.
    #[must_use]
    pub fn new(first: usize, last: usize) -> Self {
        Self { first, last }
    }

    /// Return the one-based first column.
    #[must_use]
    pub fn first(&self) -> usize {
        self.first
    }

    /// Return the one-based last column.
    #[must_use]
    pub fn last(&self) -> usize {
        self.last
    }
}

/// What a failed per-response task does to the whole build.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailurePolicy {
    /// Fail the build on the first per-response error.
    Abort,
    /// Log the failure, drop that response's edges, keep going.
    Skip,
}

/// Configuration for a full leave-one-out network build.
///
/// Construct via [`NetworkConfig::new`], then chain `with_*` methods.
///
/// # Defaults
///
/// | Parameter        | Default              |
/// |------------------|----------------------|
/// | `mtry`           | `MtryPolicy::Default`|
/// | `task`           | `Regression`         |
/// | `pvalue_culling` | `Disabled`           |
/// | `feature_range`  | all columns          |
/// | `failure_policy` | `Abort`              |
/// | `seed`           | 42                   |
#[derive(Debug, Clone)]
pub struct NetworkConfig {
    refine: RefineConfig,
    feature_range: Option<FeatureRange>,
    failure_policy: FailurePolicy,
}

impl NetworkConfig {
    /// Create a new config bounded by `max_rounds` refinement rounds per
    /// response feature.
    ///
    /// # Errors
    ///
    /// Returns [`NetError::InvalidIterationBound`] if `max_rounds` is zero.
    pub fn new(max_rounds: usize) -> Result<Self, NetError> {
        Ok(Self {
            refine: RefineConfig::new(max_rounds)?.with_history(HistoryMode::BestOnly),
            feature_range: None,
            failure_policy: FailurePolicy::Abort,
        })
    }

    /// Set the split-candidate policy.
    #[must_use]
    pub fn with_mtry(mut self, mtry: MtryPolicy) -> Self {
        self.refine = self.refine.with_mtry(mtry);
        self
    }

    /// Set the modeling task.
    #[must_use]
    pub fn with_task(mut self, task: TaskKind) -> Self {
        self.refine = self.refine.with_task(task);
        self
    }

    /// Set the p-value culling mode.
    #[must_use]
    pub fn with_pvalue_culling(mut self, pvalue_culling: PvalueCulling) -> Self {
        self.refine = self.refine.with_pvalue_culling(pvalue_culling);
        self
    }

    /// Restrict which columns act as response.
    #[must_use]
    pub fn with_feature_range(mut self, range: FeatureRange) -> Self {
        self.feature_range = Some(range);
        self
    }

    /// Set the per-response failure policy.
    #[must_use]
    pub fn with_failure_policy(mut self, failure_policy: FailurePolicy) -> Self {
        self.failure_policy = failure_policy;
        self
    }

    /// Set the master seed (offset per response feature and per round).
    #[must_use]
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.refine = self.refine.with_seed(seed);
        self
    }

    // --- Getters ---

    /// Return the round bound per response feature.
    #[must_use]
    pub fn max_rounds(&self) -> usize {
        self.refine.max_rounds()
    }

    /// Return the response column range, if restricted.
    #[must_use]
    pub fn feature_range(&self) -> Option<FeatureRange> {
        self.feature_range
    }

    /// Return the per-response failure policy.
    #[must_use]
    pub fn failure_policy(&self) -> FailurePolicy {
        self.failure_policy
    }

    /// Return the master seed.
    #[must_use]
    pub fn seed(&self) -> u64 {
        self.refine.seed()
    }

    /// Build the directed predictive network for the whole matrix.
    ///
    /// Edges arrive ordered by response column ascending, then by predictor
    /// column order within each response, independent of worker scheduling.
    ///
    /// # Errors
    ///
    /// | Variant | Condition |
    /// |---|---|
    /// | [`NetError::TooFewColumns`] | Matrix has fewer than 2 columns |
    /// | [`NetError::InvalidRange`] | Range leaves [1, n] or first > last |
    /// | [`NetError::FeatureTask`] | A per-response run failed (policy `Abort`) |
    #[instrument(skip_all, fields(n_features = matrix.n_features(), n_samples = matrix.n_samples()))]
    pub fn build<E>(&self, matrix: &FeatureMatrix, engine: &E) -> Result<Vec<Edge>, NetError>
    where
        E: ForestEngine + Sync,
    {
        let n_features = matrix.n_features();
        if n_features < 2 {
            return Err(NetError::TooFewColumns { n_features });
        }

        let (first, last) = match self.feature_range {
            Some(range) => (range.first(), range.last()),
            None => (1, n_features),
        };
        if first < 1 || last > n_features || first > last {
            return Err(NetError::InvalidRange {
                first,
                last,
                n_features,
            });
        }

        info!(first, last, "building network");

        let outcomes: Vec<(usize, Result<Vec<Edge>, NetError>)> = (first..=last)
            .into_par_iter()
            .map(|g| (g, self.infer_for_response(matrix, g, engine)))
            .collect();

        let mut edges = Vec::new();
        for (g, outcome) in outcomes {
            match outcome {
                Ok(mut feature_edges) => edges.append(&mut feature_edges),
                Err(err) => {
                    let name = matrix.feature_names()[g - 1].clone();
                    match self.failure_policy {
                        FailurePolicy::Abort => {
                            return Err(NetError::FeatureTask {
                                index: g,
                                name,
                                source: Box::new(err),
                            });
                        }
                        FailurePolicy::Skip => {
                            warn!(feature = g, name = %name, error = %err, "response feature failed, skipping");
                        }
                    }
                }
            }
        }

        info!(n_edges = edges.len(), "network assembled");
        Ok(edges)
    }

    /// Run refinement with column `g` (one-based) as response and turn the
    /// best round into edges.
    fn infer_for_response<E: ForestEngine>(
        &self,
        matrix: &FeatureMatrix,
        g: usize,
        engine: &E,
    ) -> Result<Vec<Edge>, NetError> {
        let target = g - 1;
        let (predictor_rows, predictor_names, response_column) = matrix.partition(target);

        let labels;
        let response = match self.refine.task() {
            TaskKind::Regression => ResponseData::Continuous(&response_column),
            TaskKind::Classification => {
                labels = encode_class_labels(&response_column);
                ResponseData::Classes(&labels)
            }
        };

        let refine = self
            .refine
            .clone()
            .with_seed(self.refine.seed().wrapping_add(g as u64));
        let history = refine.run(&predictor_rows, &predictor_names, response, engine)?;
        let best = history
            .into_best()
            .expect("a successful run records at least one round");

        let target_name = &matrix.feature_names()[target];
        let edges: Vec<Edge> = predictor_names
            .iter()
            .zip(best.weights.as_slice())
            .filter(|&(_, &w)| w > 0.0)
            .map(|(source, &weight)| Edge {
                source: source.clone(),
                target: target_name.clone(),
                weight,
                fit_quality: best.fit_quality,
            })
            .collect();
        Ok(edges)
    }
}
