//! Training engine implementation

use super::{rmse, Estimator, Regressor, TrainingConfig};
use crate::dataset::separate_target;
use crate::error::{HousingError, Result};
use crate::export::{ModelMetadata, TrainedModel};
use crate::preprocessing::FeaturePipeline;
use polars::prelude::*;
use std::time::Instant;
use tracing::{debug, info};

/// Number of top features logged after fitting a tree model
const TOP_FEATURES_LOGGED: usize = 5;

/// Fits a feature pipeline and regressor on a training frame
#[derive(Debug, Clone)]
pub struct TrainEngine {
    config: TrainingConfig,
}

impl TrainEngine {
    /// Create a new training engine
    pub fn new(config: TrainingConfig) -> Self {
        Self { config }
    }

    /// Fit a model on `df`, which must contain the target column
    pub fn fit(&self, df: &DataFrame) -> Result<TrainedModel> {
        let start = Instant::now();

        if df.height() == 0 {
            return Err(HousingError::DataError(
                "training dataset has no rows".to_string(),
            ));
        }

        let (features, y) = separate_target(df, &self.config.target_column)?;

        let mut pipeline = FeaturePipeline::new();
        let x = pipeline.fit_transform(&features)?;
        debug!(
            features = ?pipeline.feature_names(),
            "Encoded {} raw columns into {} features",
            pipeline.columns().len(),
            x.ncols()
        );

        let mut regressor = Regressor::from_config(&self.config);
        regressor.fit(&x, &y)?;

        let training_rmse = rmse(&y, &regressor.predict(&x)?)?;

        let mut metadata = ModelMetadata::new(self.config.estimator, &self.config.target_column);
        metadata.n_samples = x.nrows();
        metadata.n_features = x.ncols();
        metadata.training_rmse = Some(training_rmse);

        let model = TrainedModel::from_parts(metadata, pipeline, regressor)?;

        info!(
            estimator = %self.config.estimator,
            rows = x.nrows(),
            features = x.ncols(),
            training_rmse,
            elapsed_secs = start.elapsed().as_secs_f64(),
            "Model fitted"
        );

        if let Some(ranked) = model.ranked_importances() {
            for (name, importance) in ranked.iter().take(TOP_FEATURES_LOGGED) {
                debug!(feature = %name, importance, "Feature importance");
            }
        }

        Ok(model)
    }
}
