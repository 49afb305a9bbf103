//! Data preprocessing module
//!
//! Provides the feature pipeline shared by training and scoring:
//! - Median imputation of missing numeric values
//! - One-hot encoding of string columns

pub mod encoder;
pub mod imputer;
mod pipeline;

pub use encoder::OneHotEncoder;
pub use imputer::MedianImputer;
pub use pipeline::{ColumnTransform, FeatureColumn, FeaturePipeline};
