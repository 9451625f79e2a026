//! Iterative reweighted refinement of a single (predictors, response) pair.

use tracing::{debug, info, instrument};

use crate::engine::{ForestEngine, ResponseData, TrainRequest};
use crate::error::NetError;
use crate::fdr::benjamini_hochberg;
use crate::mtry::MtryPolicy;
use crate::result::{HistoryMode, RoundRecord, RunHistory};
use crate::weights::WeightVector;

/// Whether the response is modeled with a regression or classification forest.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TaskKind {
    /// Continuous response, variance-explained fit quality.
    Regression,
    /// Categorical response, OOB-accuracy fit quality.
    Classification,
}

/// Whether predictors are culled by permutation p-values between rounds.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PvalueCulling {
    /// Reweight from raw importances alone.
    Disabled,
    /// Request permutation p-values each round and zero every predictor
    /// whose BH-corrected rate exceeds [`FDR_CULL_THRESHOLD`].
    Enabled {
        /// Permutations used to build the null distribution.
        permutations: usize,
    },
}

/// Corrected-rate ceiling above which a predictor is culled.
pub const FDR_CULL_THRESHOLD: f64 = 0.2;

/// Fixed floor for the stopping rule: a round that leaves fewer than
/// `max(0.01 * total, MIN_ACTIVE_FLOOR)` active predictors is the last.
const MIN_ACTIVE_FLOOR: f64 = 10.0;

/// Configuration for one refinement run.
///
/// Construct via [`RefineConfig::new`], then chain `with_*` methods.
///
/// # Defaults
///
/// | Parameter         | Default              |
/// |-------------------|----------------------|
/// | `mtry`            | `MtryPolicy::Default`|
/// | `task`            | `Regression`         |
/// | `pvalue_culling`  | `Disabled`           |
/// | `history`         | `Full`               |
/// | `seed`            | 42                   |
#[derive(Debug, Clone)]
pub struct RefineConfig {
    max_rounds: usize,
    mtry: MtryPolicy,
    task: TaskKind,
    pvalue_culling: PvalueCulling,
    history: HistoryMode,
    seed: u64,
}

impl RefineConfig {
    /// Create a new config bounded by the given number of rounds.
    ///
    /// # Errors
    ///
    /// Returns [`NetError::InvalidIterationBound`] if `max_rounds` is zero.
    pub fn new(max_rounds: usize) -> Result<Self, NetError> {
        if max_rounds == 0 {
            return Err(NetError::InvalidIterationBound { max_rounds });
        }
        Ok(Self {
            max_rounds,
            mtry: MtryPolicy::Default,
            task: TaskKind::Regression,
            pvalue_culling: PvalueCulling::Disabled,
            history: HistoryMode::Full,
            seed: 42,
        })
    }

    /// Set the split-candidate policy.
    #[must_use]
    pub fn with_mtry(mut self, mtry: MtryPolicy) -> Self {
        self.mtry = mtry;
        self
    }

    /// Set the modeling task.
    #[must_use]
    pub fn with_task(mut self, task: TaskKind) -> Self {
        self.task = task;
        self
    }

    /// Set the p-value culling mode.
    #[must_use]
    pub fn with_pvalue_culling(mut self, pvalue_culling: PvalueCulling) -> Self {
        self.pvalue_culling = pvalue_culling;
        self
    }

    /// Set the history retention mode.
    #[must_use]
    pub fn with_history(mut self, history: HistoryMode) -> Self {
        self.history = history;
        self
    }

    /// Set the base seed handed to the engine (offset per round).
    #[must_use]
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }

    // --- Getters ---

    /// Return the round bound.
    #[must_use]
    pub fn max_rounds(&self) -> usize {
        self.max_rounds
    }

    /// Return the split-candidate policy.
    #[must_use]
    pub fn mtry(&self) -> MtryPolicy {
        self.mtry
    }

    /// Return the modeling task.
    #[must_use]
    pub fn task(&self) -> TaskKind {
        self.task
    }

    /// Return the p-value culling mode.
    #[must_use]
    pub fn pvalue_culling(&self) -> PvalueCulling {
        self.pvalue_culling
    }

    /// Return the history retention mode.
    #[must_use]
    pub fn history(&self) -> HistoryMode {
        self.history
    }

    /// Return the base seed.
    #[must_use]
    pub fn seed(&self) -> u64 {
        self.seed
    }

    /// Run the refinement loop against one (predictors, response) pair.
    ///
    /// Starting from uniform weights, each round trains one weighted forest,
    /// replaces the weight vector with that forest's normalized importances,
    /// and records the round. The loop stops at the round bound, at the
    /// active-predictor floor, or when the importance sum degenerates to
    /// zero (in which case the degenerate round is discarded and the rounds
    /// recorded so far stand).
    ///
    /// # Errors
    ///
    /// | Variant | Condition |
    /// |---|---|
    /// | [`NetError::EmptyPredictors`] | Zero predictor columns |
    /// | [`NetError::NoSamples`] | Zero sample rows |
    /// | [`NetError::PredictorRowMismatch`] | Row length differs from the name count |
    /// | [`NetError::ResponseLengthMismatch`] | Response not sample-aligned |
    /// | [`NetError::DegenerateWeights`] | Zero importance sum before any round completed |
    /// | [`NetError::Engine`] | The forest engine failed (never retried) |
    #[instrument(skip_all, fields(n_predictors = feature_names.len(), max_rounds = self.max_rounds))]
    pub fn run<E: ForestEngine>(
        &self,
        features: &[Vec<f64>],
        feature_names: &[String],
        response: ResponseData<'_>,
        engine: &E,
    ) -> Result<RunHistory, NetError> {
        validate_inputs(features, feature_names, response)?;

        let n_predictors = feature_names.len();
        let stop_floor = (0.01 * n_predictors as f64).max(MIN_ACTIVE_FLOOR);

        let mut weights = WeightVector::uniform(n_predictors);
        let mut history = RunHistory::new(self.history);

        for round in 1..=self.max_rounds {
            let active = weights.active_count();
            let mtry = self.mtry.resolve(active)?;
            let request = TrainRequest {
                features,
                feature_names,
                response,
                weights: weights.as_slice(),
                mtry,
                seed: self.seed.wrapping_add(round as u64),
            };

            let (model, fit) = engine.train(&request)?;
            debug!(
                round,
                active,
                mtry,
                fit_quality = fit.fit_quality,
                "round trained"
            );

            let next = match self.pvalue_culling {
                PvalueCulling::Disabled => WeightVector::from_signed_importances(&fit.importances),
                PvalueCulling::Enabled { permutations } => {
                    let scored = engine.importance_pvalues(&model, &request, permutations)?;
                    let rates =
                        benjamini_hochberg(&scored.iter().map(|s| s.p_value).collect::<Vec<_>>());
                    let culled: Vec<f64> = scored
                        .iter()
                        .zip(&rates)
                        .map(|(s, &rate)| {
                            if rate > FDR_CULL_THRESHOLD {
                                0.0
                            } else {
                                s.importance.max(0.0)
                            }
                        })
                        .collect();
                    WeightVector::from_culled_importances(&culled)
                }
            };

            let Some(next) = next else {
                if history.rounds_completed() == 0 {
                    return Err(NetError::DegenerateWeights { round });
                }
                debug!(round, "importance sum degenerate, discarding round");
                break;
            };

            let active_after = next.active_count();
            history.push(RoundRecord {
                round,
                weights: next.clone(),
                fit_quality: fit.fit_quality,
                prediction_error: fit.prediction_error,
                oob_predictions: fit.oob_predictions,
                confusion: fit.confusion,
                mtry,
                active_predictors: active_after,
            });
            weights = next;

            if (active_after as f64) < stop_floor {
                debug!(round, active_after, stop_floor, "active floor reached");
                break;
            }
        }

        info!(
            rounds = history.rounds_completed(),
            best_fit = history.best().map(|r| r.fit_quality),
            "refinement complete"
        );
        Ok(history)
    }
}

fn validate_inputs(
    features: &[Vec<f64>],
    feature_names: &[String],
    response: ResponseData<'_>,
) -> Result<(), NetError> {
    if feature_names.is_empty() {
        return Err(NetError::EmptyPredictors);
    }
    if features.is_empty() {
        return Err(NetError::NoSamples);
    }
    let n_predictors = feature_names.len();
    for (sample_index, row) in features.iter().enumerate() {
        if row.len() != n_predictors {
            return Err(NetError::PredictorRowMismatch {
                expected: n_predictors,
                got: row.len(),
                sample_index,
            });
        }
    }
    if response.len() != features.len() {
        return Err(NetError::ResponseLengthMismatch {
            expected: features.len(),
            got: response.len(),
        });
    }
    Ok(())
}
