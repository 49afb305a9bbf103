//! Training configuration

use super::random_forest::MaxFeatures;
use super::EstimatorKind;
use crate::dataset::TARGET_COLUMN;
use serde::{Deserialize, Serialize};

/// Tree and forest hyperparameters
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ForestParams {
    /// Maximum tree depth (None = unlimited)
    pub max_depth: Option<usize>,
    /// Minimum samples to split a node
    pub min_samples_split: usize,
    /// Minimum samples in a leaf
    pub min_samples_leaf: usize,
    /// Number of trees (forest only)
    pub n_estimators: usize,
    /// Features considered per split
    pub max_features: MaxFeatures,
}

impl Default for ForestParams {
    fn default() -> Self {
        Self {
            max_depth: None,
            min_samples_split: 2,
            min_samples_leaf: 1,
            n_estimators: 100,
            max_features: MaxFeatures::All,
        }
    }
}

/// Configuration for a training run
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrainingConfig {
    pub estimator: EstimatorKind,
    pub target_column: String,
    pub forest: ForestParams,
    pub random_state: u64,
}

impl Default for TrainingConfig {
    fn default() -> Self {
        Self {
            estimator: EstimatorKind::LinearRegression,
            target_column: TARGET_COLUMN.to_string(),
            forest: ForestParams::default(),
            random_state: 42,
        }
    }
}

impl TrainingConfig {
    pub fn new(estimator: EstimatorKind) -> Self {
        Self {
            estimator,
            ..Self::default()
        }
    }

    pub fn with_max_depth(mut self, max_depth: Option<usize>) -> Self {
        self.forest.max_depth = max_depth;
        self
    }

    pub fn with_min_samples_split(mut self, min_samples: usize) -> Self {
        self.forest.min_samples_split = min_samples;
        self
    }

    pub fn with_min_samples_leaf(mut self, min_samples: usize) -> Self {
        self.forest.min_samples_leaf = min_samples;
        self
    }

    pub fn with_n_estimators(mut self, n_estimators: usize) -> Self {
        self.forest.n_estimators = n_estimators;
        self
    }

    pub fn with_max_features(mut self, max_features: MaxFeatures) -> Self {
        self.forest.max_features = max_features;
        self
    }

    pub fn with_random_state(mut self, seed: u64) -> Self {
        self.random_state = seed;
        self
    }
}
