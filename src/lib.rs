//! Housing Pipeline - median house value regression in three stages
//!
//! The pipeline is split into independent programs that hand data to each
//! other through files:
//! - `ingest_data` downloads the California housing archive and writes
//!   `train.csv` / `val.csv`
//! - `train` fits a regressor on `train.csv` and writes `model.pkl`
//! - `score` evaluates `model.pkl` on `val.csv` and writes `score.txt`
//!
//! # Modules
//!
//! ## Data
//! - [`dataset`] - Target separation, income categories, train/validation splits
//! - [`preprocessing`] - Median imputation and one-hot encoding into a feature matrix
//! - [`utils`] - CSV loading/saving and staged output files
//!
//! ## Models
//! - [`training`] - Linear regression, decision tree and random forest regressors
//! - [`export`] - Model artifact serialization
//!
//! ## Programs
//! - [`stages`] - Ingest, train and score stage logic
//! - [`cli`] - Command-line arguments for the stage binaries
//! - [`logging`] - Per-stage `tracing` dispatchers

// Core error handling
pub mod error;
pub mod logging;

// Data
pub mod dataset;
pub mod preprocessing;
pub mod utils;

// Models
pub mod export;
pub mod training;

// Programs
pub mod cli;
pub mod stages;

pub use error::{HousingError, Result};

/// Prelude for convenient imports
pub mod prelude {
    pub use crate::dataset::{separate_target, stratified_split, train_val_split, TARGET_COLUMN};
    pub use crate::error::{HousingError, Result};
    pub use crate::export::{load_model, save_model, TrainedModel};
    pub use crate::logging::{LogConfig, LogLevel, Logger};
    pub use crate::preprocessing::FeaturePipeline;
    pub use crate::training::{
        DecisionTree, Estimator, EstimatorKind, LinearRegression, RandomForest, Regressor,
        RegressionMetrics, TrainEngine, TrainingConfig,
    };
    pub use crate::utils::{DataLoader, DataSaver};
}
