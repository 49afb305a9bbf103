//! Score stage: evaluate a persisted model on the validation CSV

use crate::error::{HousingError, Result};
use crate::export::{self, TrainedModel};
use crate::training::RegressionMetrics;
use crate::utils::{DataLoader, StagedFile};
use polars::prelude::*;
use std::fs;
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};
use tracing::info;

/// File the score is written to inside the output directory
pub const SCORE_FILE: &str = "score.txt";

/// Load a model from a file, or from `model.pkl` inside a directory
pub fn load_model(path: &Path) -> Result<TrainedModel> {
    info!(path = %path.display(), "Loading model");
    let model = export::load_model(path)?;
    info!(
        estimator = %model.metadata.estimator,
        trained_at = %model.metadata.trained_at,
        "Model loaded"
    );
    Ok(model)
}

/// Load the validation CSV at `path`
pub fn load(path: &Path) -> Result<DataFrame> {
    info!(path = %path.display(), "Loading validation data");
    DataLoader::new().load_csv(path)
}

/// All regression metrics of `model` on a labelled dataset
pub fn evaluate_metrics(model: &TrainedModel, df: &DataFrame) -> Result<RegressionMetrics> {
    if df.height() == 0 {
        return Err(HousingError::DataError(
            "validation dataset has no rows".to_string(),
        ));
    }
    let (y_true, y_pred) = model.predict_with_target(df)?;
    RegressionMetrics::compute(&y_true, &y_pred)
}

/// Root mean squared error of `model` on a labelled dataset
pub fn evaluate(model: &TrainedModel, df: &DataFrame) -> Result<f64> {
    evaluate_metrics(model, df).map(|m| m.rmse)
}

/// The single line written to the score file
pub fn format_score(rmse: f64) -> String {
    format!("RMSE: {:?}", rmse)
}

/// Write `RMSE: <value>` to `path/score.txt`, replacing any prior content
pub fn persist_score(rmse: f64, path: &Path) -> Result<PathBuf> {
    fs::create_dir_all(path)?;
    let (staged, file) = StagedFile::create(&path.join(SCORE_FILE))?;
    let mut writer = BufWriter::new(file);
    writer.write_all(format_score(rmse).as_bytes())?;
    writer.flush()?;
    drop(writer);

    let written = staged.commit()?;
    info!(path = %written.display(), "Score saved");
    Ok(written)
}

/// Run the full score stage
pub fn run(model_path: &Path, dataset_path: &Path, output_path: &Path) -> Result<f64> {
    let model = load_model(model_path)?;
    let df = load(dataset_path)?;

    let metrics = evaluate_metrics(&model, &df)?;
    info!(
        rmse = metrics.rmse,
        mae = metrics.mae,
        r2 = metrics.r2,
        rows = metrics.n_samples,
        "Model evaluated"
    );

    persist_score(metrics.rmse, output_path)?;
    Ok(metrics.rmse)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_format_score() {
        assert_eq!(format_score(0.0), "RMSE: 0.0");
        assert_eq!(format_score(70710.67811865476), "RMSE: 70710.67811865476");
    }

    #[test]
    fn test_persist_score_overwrites() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join(SCORE_FILE);
        fs::write(&path, "RMSE: 1.0\nleftover\n").unwrap();

        persist_score(12.5, dir.path()).unwrap();
        assert_eq!(fs::read_to_string(&path).unwrap(), "RMSE: 12.5");
    }

    #[test]
    fn test_persist_score_creates_directory() {
        let dir = TempDir::new().unwrap();
        let out = dir.path().join("results");
        let written = persist_score(3.0, &out).unwrap();
        assert_eq!(written, out.join(SCORE_FILE));
    }
}
