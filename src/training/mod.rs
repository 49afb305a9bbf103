//! Model training module
//!
//! Provides the regression estimators used by the train stage:
//! - Ordinary least squares linear regression
//! - Decision tree regressor (CART)
//! - Random forest regressor
//!
//! All estimators implement [`Estimator`] and are wrapped by [`Regressor`]
//! for serialization inside a model artifact.

mod config;
mod engine;
pub mod decision_tree;
pub mod linear_models;
pub mod metrics;
pub mod random_forest;

pub use config::{ForestParams, TrainingConfig};
pub use decision_tree::{DecisionTree, TreeNode};
pub use engine::TrainEngine;
pub use linear_models::LinearRegression;
pub use metrics::{rmse, RegressionMetrics};
pub use random_forest::{MaxFeatures, RandomForest};

use crate::error::{HousingError, Result};
use ndarray::{Array1, Array2};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Common interface for regression estimators
pub trait Estimator {
    /// Fit the estimator on a feature matrix and target vector
    fn fit(&mut self, x: &Array2<f64>, y: &Array1<f64>) -> Result<()>;

    /// Predict one value per row of `x`
    fn predict(&self, x: &Array2<f64>) -> Result<Array1<f64>>;

    /// Normalized feature importances, if the estimator records them
    fn feature_importances(&self) -> Option<Array1<f64>> {
        None
    }

    /// Whether `fit` has completed
    fn is_fitted(&self) -> bool;
}

/// Estimator families available to the train stage
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EstimatorKind {
    LinearRegression,
    DecisionTree,
    RandomForest,
}

impl EstimatorKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            EstimatorKind::LinearRegression => "linear_regression",
            EstimatorKind::DecisionTree => "decision_tree",
            EstimatorKind::RandomForest => "random_forest",
        }
    }
}

impl fmt::Display for EstimatorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for EstimatorKind {
    type Err = HousingError;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_lowercase().replace('-', "_").as_str() {
            "linear" | "linear_regression" => Ok(EstimatorKind::LinearRegression),
            "tree" | "decision_tree" => Ok(EstimatorKind::DecisionTree),
            "forest" | "random_forest" => Ok(EstimatorKind::RandomForest),
            other => Err(HousingError::InvalidParameter {
                name: "model".to_string(),
                value: other.to_string(),
                reason: "expected linear_regression, decision_tree or random_forest".to_string(),
            }),
        }
    }
}

/// A fitted (or fittable) regressor of any supported family
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "model", rename_all = "snake_case")]
pub enum Regressor {
    LinearRegression(LinearRegression),
    DecisionTree(DecisionTree),
    RandomForest(RandomForest),
}

impl Regressor {
    /// Build an unfitted regressor from a training configuration
    pub fn from_config(config: &TrainingConfig) -> Self {
        let params = &config.forest;
        match config.estimator {
            EstimatorKind::LinearRegression => Regressor::LinearRegression(LinearRegression::new()),
            EstimatorKind::DecisionTree => {
                let mut tree = DecisionTree::new()
                    .with_min_samples_split(params.min_samples_split)
                    .with_min_samples_leaf(params.min_samples_leaf)
                    .with_random_state(config.random_state);
                if let Some(d) = params.max_depth {
                    tree = tree.with_max_depth(d);
                }
                Regressor::DecisionTree(tree)
            }
            EstimatorKind::RandomForest => {
                let mut forest = RandomForest::new(params.n_estimators)
                    .with_min_samples_split(params.min_samples_split)
                    .with_min_samples_leaf(params.min_samples_leaf)
                    .with_max_features(params.max_features)
                    .with_random_state(config.random_state);
                if let Some(d) = params.max_depth {
                    forest = forest.with_max_depth(d);
                }
                Regressor::RandomForest(forest)
            }
        }
    }

    pub fn kind(&self) -> EstimatorKind {
        match self {
            Regressor::LinearRegression(_) => EstimatorKind::LinearRegression,
            Regressor::DecisionTree(_) => EstimatorKind::DecisionTree,
            Regressor::RandomForest(_) => EstimatorKind::RandomForest,
        }
    }

    fn inner(&self) -> &dyn Estimator {
        match self {
            Regressor::LinearRegression(m) => m,
            Regressor::DecisionTree(m) => m,
            Regressor::RandomForest(m) => m,
        }
    }

    fn inner_mut(&mut self) -> &mut dyn Estimator {
        match self {
            Regressor::LinearRegression(m) => m,
            Regressor::DecisionTree(m) => m,
            Regressor::RandomForest(m) => m,
        }
    }
}

impl Estimator for Regressor {
    fn fit(&mut self, x: &Array2<f64>, y: &Array1<f64>) -> Result<()> {
        self.inner_mut().fit(x, y)
    }

    fn predict(&self, x: &Array2<f64>) -> Result<Array1<f64>> {
        self.inner().predict(x)
    }

    fn feature_importances(&self) -> Option<Array1<f64>> {
        self.inner().feature_importances()
    }

    fn is_fitted(&self) -> bool {
        self.inner().is_fitted()
    }
}
