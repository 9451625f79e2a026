//! [`ForestEngine`] implementation backed by the weighted forest.

use arachne_net::{EngineFailure, ForestEngine, ForestFit, ImportancePValue, TrainRequest};

use crate::config::WeightedForestConfig;
use crate::error::ForestError;
use crate::forest::{self, TrainedForest};
use crate::pvalue;

/// The in-workspace forest engine: a CART forest whose split candidates are
/// drawn in proportion to the request's weight vector.
#[derive(Debug, Clone)]
pub struct WeightedForestEngine {
    config: WeightedForestConfig,
}

impl WeightedForestEngine {
    /// Create an engine from a forest configuration.
    #[must_use]
    pub fn new(config: WeightedForestConfig) -> Self {
        Self { config }
    }

    /// Return the forest configuration.
    #[must_use]
    pub fn config(&self) -> &WeightedForestConfig {
        &self.config
    }
}

impl ForestEngine for WeightedForestEngine {
    type Model = TrainedForest;

    fn train(
        &self,
        request: &TrainRequest<'_>,
    ) -> Result<(TrainedForest, ForestFit), EngineFailure> {
        forest::train(&self.config, request).map_err(failure)
    }

    fn importance_pvalues(
        &self,
        model: &TrainedForest,
        request: &TrainRequest<'_>,
        permutations: usize,
    ) -> Result<Vec<ImportancePValue>, EngineFailure> {
        pvalue::importance_pvalues(&self.config, model, request, permutations).map_err(failure)
    }
}

fn failure(err: ForestError) -> EngineFailure {
    EngineFailure::with_source("weighted forest training failed", err)
}
