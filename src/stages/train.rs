//! Train stage: fit a regressor on the training CSV and persist it

use crate::error::Result;
use crate::export::{save_model, TrainedModel};
use crate::training::{TrainEngine, TrainingConfig};
use crate::utils::DataLoader;
use polars::prelude::*;
use std::path::{Path, PathBuf};
use tracing::info;

/// Load the training CSV at `path`
pub fn load(path: &Path) -> Result<DataFrame> {
    info!(path = %path.display(), "Loading training data");
    DataLoader::new().load_csv(path)
}

/// Fit a model on a labelled dataset
pub fn fit(df: &DataFrame, config: &TrainingConfig) -> Result<TrainedModel> {
    info!(estimator = %config.estimator, "Training model");
    TrainEngine::new(config.clone()).fit(df)
}

/// Write the model to `path/model.pkl`
pub fn persist(model: &TrainedModel, path: &Path) -> Result<PathBuf> {
    let written = save_model(model, path)?;
    info!(path = %written.display(), "Model saved");
    Ok(written)
}

/// Run the full train stage
pub fn run(input_path: &Path, output_path: &Path, config: &TrainingConfig) -> Result<PathBuf> {
    let df = load(input_path)?;
    let model = fit(&df, config)?;
    persist(&model, output_path)
}
