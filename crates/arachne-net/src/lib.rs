//! Iteratively reweighted random-forest network inference.
//!
//! Turns a numeric feature matrix into a directed, weighted predictive
//! network. Each feature takes a turn as the response of a forest model
//! whose split-selection weights sharpen over repeated rounds; the resulting
//! importance vectors become the network's edges. Forest training itself is
//! delegated to a [`ForestEngine`] collaborator.

mod engine;
mod error;
mod fdr;
mod matrix;
mod mtry;
mod network;
mod refine;
mod result;
mod weights;

pub use engine::{
    ConfusionSummary, EngineFailure, ForestEngine, ForestFit, ImportancePValue, ResponseData,
    TrainRequest,
};
pub use error::NetError;
pub use fdr::benjamini_hochberg;
pub use matrix::{FeatureMatrix, encode_class_labels};
pub use mtry::MtryPolicy;
pub use network::{Edge, FailurePolicy, FeatureRange, NetworkConfig};
pub use refine::{FDR_CULL_THRESHOLD, PvalueCulling, RefineConfig, TaskKind};
pub use result::{HistoryMode, RoundRecord, RunHistory};
pub use weights::WeightVector;
