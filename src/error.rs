//! Error types for the housing pipeline

use thiserror::Error;

/// Result type alias for pipeline operations
pub type Result<T> = std::result::Result<T, HousingError>;

/// Main error type for the pipeline
#[derive(Error, Debug)]
pub enum HousingError {
    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Data error: {0}")]
    DataError(String),

    #[error("Schema error: {0}")]
    SchemaError(String),

    #[error("Column not found: {0}")]
    ColumnNotFound(String),

    #[error("Feature mismatch: missing {missing:?}, unexpected {unexpected:?}")]
    FeatureMismatch {
        missing: Vec<String>,
        unexpected: Vec<String>,
    },

    #[error("Network error: {0}")]
    NetworkError(String),

    #[error("Extraction error: {0}")]
    ExtractionError(String),

    #[error("Serialization error: {0}")]
    SerializationError(String),

    #[error("Unsupported model artifact version {found} (newest supported: {supported})")]
    UnsupportedArtifact { found: u32, supported: u32 },

    #[error("Invalid shape: expected {expected}, got {actual}")]
    ShapeError { expected: String, actual: String },

    #[error("Model not fitted")]
    ModelNotFitted,

    #[error("Invalid parameter: {name} = {value}, {reason}")]
    InvalidParameter {
        name: String,
        value: String,
        reason: String,
    },

    #[error("Computation error: {0}")]
    ComputationError(String),
}

impl HousingError {
    /// True for errors caused by the shape of the input data rather than the environment
    pub fn is_schema_error(&self) -> bool {
        matches!(
            self,
            HousingError::SchemaError(_)
                | HousingError::ColumnNotFound(_)
                | HousingError::FeatureMismatch { .. }
        )
    }
}

impl From<polars::error::PolarsError> for HousingError {
    fn from(err: polars::error::PolarsError) -> Self {
        HousingError::DataError(err.to_string())
    }
}

impl From<serde_json::Error> for HousingError {
    fn from(err: serde_json::Error) -> Self {
        HousingError::SerializationError(err.to_string())
    }
}

impl From<ndarray::ShapeError> for HousingError {
    fn from(err: ndarray::ShapeError) -> Self {
        HousingError::ShapeError {
            expected: "valid shape".to_string(),
            actual: err.to_string(),
        }
    }
}

impl From<reqwest::Error> for HousingError {
    fn from(err: reqwest::Error) -> Self {
        HousingError::NetworkError(err.to_string())
    }
}
