//! Weighted Random Forest engine for network inference.
//!
//! Provides CART forests (regression and classification) whose per-split
//! candidate features are drawn with probability proportional to an external
//! weight vector, plus out-of-bag fit statistics, impurity and permutation
//! importances, and permuted-response importance p-values. Implements
//! [`arachne_net::ForestEngine`].

mod config;
mod engine;
mod error;
mod forest;
mod node;
mod oob;
mod pvalue;
mod sample;
mod split;
mod tree;

pub use config::{ImportanceMode, WeightedForestConfig};
pub use engine::WeightedForestEngine;
pub use error::ForestError;
pub use forest::TrainedForest;
