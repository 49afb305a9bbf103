//! Model artifact serialization
//!
//! A trained model is stored as a self-describing JSON document holding
//! metadata, the fitted feature pipeline and the fitted regressor.

use crate::dataset::separate_target;
use crate::error::{HousingError, Result};
use crate::preprocessing::FeaturePipeline;
use crate::training::{Estimator, EstimatorKind, Regressor};
use crate::utils::StagedFile;
use chrono::{DateTime, Utc};
use ndarray::Array1;
use polars::prelude::*;
use serde::{Deserialize, Serialize};
use std::fs;
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

/// File name of the persisted model inside a model directory
pub const MODEL_FILE_NAME: &str = "model.pkl";

/// Current artifact format version
pub const ARTIFACT_VERSION: u32 = 1;

/// Model metadata
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModelMetadata {
    /// Artifact format version
    pub format_version: u32,
    /// Version of the crate that wrote the artifact
    pub crate_version: String,
    pub estimator: EstimatorKind,
    pub target_column: String,
    /// Training rows
    pub n_samples: usize,
    /// Width of the encoded feature matrix
    pub n_features: usize,
    pub trained_at: DateTime<Utc>,
    /// In-sample RMSE
    pub training_rmse: Option<f64>,
}

impl ModelMetadata {
    pub fn new(estimator: EstimatorKind, target_column: impl Into<String>) -> Self {
        Self {
            format_version: ARTIFACT_VERSION,
            crate_version: env!("CARGO_PKG_VERSION").to_string(),
            estimator,
            target_column: target_column.into(),
            n_samples: 0,
            n_features: 0,
            trained_at: Utc::now(),
            training_rmse: None,
        }
    }
}

/// A fitted model ready for scoring
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrainedModel {
    pub metadata: ModelMetadata,
    features: FeaturePipeline,
    regressor: Regressor,
}

impl TrainedModel {
    /// Assemble a model from a fitted pipeline and regressor
    pub fn from_parts(
        metadata: ModelMetadata,
        features: FeaturePipeline,
        regressor: Regressor,
    ) -> Result<Self> {
        if !regressor.is_fitted() {
            return Err(HousingError::ModelNotFitted);
        }
        Ok(Self {
            metadata,
            features,
            regressor,
        })
    }

    /// Predict one value per row of a feature frame
    pub fn predict(&self, features: &DataFrame) -> Result<Array1<f64>> {
        let x = self.features.transform(features)?;
        self.regressor.predict(&x)
    }

    /// Split `df` into features and target, then predict the features
    pub fn predict_with_target(&self, df: &DataFrame) -> Result<(Array1<f64>, Array1<f64>)> {
        let (features, y) = separate_target(df, &self.metadata.target_column)?;
        let predictions = self.predict(&features)?;
        Ok((y, predictions))
    }

    pub fn features(&self) -> &FeaturePipeline {
        &self.features
    }

    pub fn regressor(&self) -> &Regressor {
        &self.regressor
    }

    /// Encoded feature names paired with their importances, most important first
    pub fn ranked_importances(&self) -> Option<Vec<(String, f64)>> {
        let importances = self.regressor.feature_importances()?;
        let mut ranked: Vec<(String, f64)> = self
            .features
            .feature_names()
            .into_iter()
            .zip(importances.iter().copied())
            .collect();
        ranked.sort_by(|a, b| b.1.total_cmp(&a.1));
        Some(ranked)
    }

    /// Serialize as compact JSON into `writer`
    pub fn write_json<W: Write>(&self, writer: W) -> Result<()> {
        serde_json::to_writer(writer, self)?;
        Ok(())
    }

    /// Deserialize from JSON, rejecting artifacts newer than this build understands
    pub fn from_json(json: &str) -> Result<Self> {
        let header: ArtifactHeader = serde_json::from_str(json)?;
        let found = header.metadata.format_version.ok_or_else(|| {
            HousingError::SerializationError("model artifact has no format version".to_string())
        })?;
        if found > u64::from(ARTIFACT_VERSION) {
            return Err(HousingError::UnsupportedArtifact {
                found: u32::try_from(found).unwrap_or(u32::MAX),
                supported: ARTIFACT_VERSION,
            });
        }

        let model: Self = serde_json::from_str(json)?;
        if !model.regressor.is_fitted() {
            return Err(HousingError::SerializationError(
                "model artifact holds an unfitted regressor".to_string(),
            ));
        }
        Ok(model)
    }
}

/// Just enough of an artifact to read its format version; every other field is skipped
#[derive(Deserialize)]
struct ArtifactHeader {
    metadata: HeaderMetadata,
}

#[derive(Deserialize)]
struct HeaderMetadata {
    format_version: Option<u64>,
}

/// Write `model` to `dir/model.pkl`, creating `dir` if needed
pub fn save_model(model: &TrainedModel, dir: &Path) -> Result<PathBuf> {
    fs::create_dir_all(dir)?;

    let (staged, file) = StagedFile::create(&dir.join(MODEL_FILE_NAME))?;
    let mut writer = BufWriter::new(file);
    model.write_json(&mut writer)?;
    writer.flush()?;
    drop(writer);

    staged.commit()
}

/// Load a model from a file, or from `model.pkl` inside a directory
pub fn load_model(path: &Path) -> Result<TrainedModel> {
    let file = if path.is_dir() {
        path.join(MODEL_FILE_NAME)
    } else {
        path.to_path_buf()
    };

    let json = fs::read_to_string(&file).map_err(|e| {
        HousingError::IoError(std::io::Error::new(
            e.kind(),
            format!("cannot read model {}: {}", file.display(), e),
        ))
    })?;
    TrainedModel::from_json(&json)
}
