//! Command-line interface for the three pipeline stages

use clap::{Args, Parser};
use std::path::PathBuf;

use crate::error::HousingError;
use crate::logging::{LogConfig, LogLevel, Logger};
use crate::stages::{ingest, score, train};
use crate::training::{EstimatorKind, TrainingConfig};

// ─── Shared flags ──────────────────────────────────────────────────────────────

/// Logging flags shared by every stage
#[derive(Args, Debug, Clone)]
pub struct LogArgs {
    /// Logging level (DEBUG, INFO, WARNING, ERROR, CRITICAL)
    #[arg(long = "log_level", default_value = "INFO", value_parser = parse_log_level)]
    pub log_level: LogLevel,

    /// Log file path [default: <stage>.log]
    #[arg(long = "log_file")]
    pub log_file: Option<PathBuf>,

    /// Enable console logging
    #[arg(long)]
    pub console: bool,
}

impl LogArgs {
    /// Logging configuration, with the log file defaulting to `<stage>.log`
    pub fn to_config(&self, stage: &str) -> LogConfig {
        let file = self
            .log_file
            .clone()
            .unwrap_or_else(|| PathBuf::from(format!("{}.log", stage)));
        LogConfig::new(self.log_level)
            .with_file(file)
            .with_console(self.console)
    }
}

fn parse_log_level(s: &str) -> Result<LogLevel, HousingError> {
    s.parse()
}

fn parse_estimator(s: &str) -> Result<EstimatorKind, HousingError> {
    s.parse()
}

fn parse_fraction(s: &str) -> Result<f64, String> {
    let value: f64 = s.parse().map_err(|e| format!("{}", e))?;
    if (0.0..=1.0).contains(&value) {
        Ok(value)
    } else {
        Err(format!("{} is not in [0, 1]", value))
    }
}

// ─── Stage arguments ───────────────────────────────────────────────────────────

#[derive(Parser, Debug)]
#[command(name = "ingest_data", version, about = "Download and split the housing dataset")]
pub struct IngestArgs {
    /// Output folder path for the datasets
    #[arg(long = "output_path")]
    pub output_path: PathBuf,

    /// URL of the housing archive
    #[arg(long = "housing_url", default_value = ingest::HOUSING_URL)]
    pub housing_url: String,

    /// Fraction of rows held out for validation
    #[arg(long = "test_fraction", default_value_t = 0.2, value_parser = parse_fraction)]
    pub test_fraction: f64,

    /// Seed for the row shuffle
    #[arg(long, default_value_t = 42)]
    pub seed: u64,

    /// Preserve income-category proportions in both subsets
    #[arg(long)]
    pub stratified: bool,

    /// Reuse an already extracted <output_path>/housing/housing.csv
    #[arg(long = "skip_download")]
    pub skip_download: bool,

    #[command(flatten)]
    pub log: LogArgs,
}

impl IngestArgs {
    pub fn to_config(&self) -> ingest::IngestConfig {
        ingest::IngestConfig::new(&self.output_path)
            .with_housing_url(&self.housing_url)
            .with_test_fraction(self.test_fraction)
            .with_seed(self.seed)
            .with_stratified(self.stratified)
            .with_skip_download(self.skip_download)
    }
}

#[derive(Parser, Debug)]
#[command(name = "train", version, about = "Train a housing price model")]
pub struct TrainArgs {
    /// Input training dataset CSV
    #[arg(long = "input_path")]
    pub input_path: PathBuf,

    /// Output folder for the model
    #[arg(long = "output_path")]
    pub output_path: PathBuf,

    /// Estimator (linear_regression, decision_tree, random_forest)
    #[arg(long, default_value = "linear_regression", value_parser = parse_estimator)]
    pub model: EstimatorKind,

    /// Maximum tree depth
    #[arg(long = "max_depth")]
    pub max_depth: Option<usize>,

    /// Minimum samples in a tree leaf
    #[arg(long = "min_samples_leaf", default_value_t = 1)]
    pub min_samples_leaf: usize,

    /// Number of trees in the forest
    #[arg(long = "n_estimators", default_value_t = 100)]
    pub n_estimators: usize,

    /// Seed for tree feature sampling and forest bootstraps
    #[arg(long, default_value_t = 42)]
    pub seed: u64,

    #[command(flatten)]
    pub log: LogArgs,
}

impl TrainArgs {
    pub fn to_config(&self) -> TrainingConfig {
        TrainingConfig::new(self.model)
            .with_max_depth(self.max_depth)
            .with_min_samples_leaf(self.min_samples_leaf)
            .with_n_estimators(self.n_estimators)
            .with_random_state(self.seed)
    }
}

#[derive(Parser, Debug)]
#[command(name = "score", version, about = "Score a trained housing price model")]
pub struct ScoreArgs {
    /// Model file, or a folder containing model.pkl
    #[arg(long = "model_path")]
    pub model_path: PathBuf,

    /// Validation dataset CSV
    #[arg(long = "dataset_path")]
    pub dataset_path: PathBuf,

    /// Output folder for score.txt
    #[arg(long = "output_path")]
    pub output_path: PathBuf,

    #[command(flatten)]
    pub log: LogArgs,
}

// ─── Commands ──────────────────────────────────────────────────────────────────

pub fn cmd_ingest(args: &IngestArgs) -> anyhow::Result<()> {
    let logger = Logger::new(&args.log.to_config("ingest_data"))?;
    let config = args.to_config();
    logger.run("ingest_data", || ingest::run(&config))?;
    Ok(())
}

pub fn cmd_train(args: &TrainArgs) -> anyhow::Result<()> {
    let logger = Logger::new(&args.log.to_config("train"))?;
    let config = args.to_config();
    logger.run("train", || {
        train::run(&args.input_path, &args.output_path, &config)
    })?;
    Ok(())
}

pub fn cmd_score(args: &ScoreArgs) -> anyhow::Result<()> {
    let logger = Logger::new(&args.log.to_config("score"))?;
    logger.run("score", || {
        score::run(&args.model_path, &args.dataset_path, &args.output_path)
    })?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_argument_definitions() {
        IngestArgs::command().debug_assert();
        TrainArgs::command().debug_assert();
        ScoreArgs::command().debug_assert();
    }

    #[test]
    fn test_ingest_defaults() {
        let args = IngestArgs::try_parse_from(["ingest_data", "--output_path", "data"]).unwrap();
        let config = args.to_config();
        assert_eq!(config.output_path, PathBuf::from("data"));
        assert_eq!(config.test_fraction, 0.2);
        assert_eq!(config.seed, 42);
        assert!(!config.stratified);
        assert_eq!(args.log.log_level, LogLevel::Info);

        let log = args.log.to_config("ingest_data");
        assert_eq!(log.file, Some(PathBuf::from("ingest_data.log")));
        assert!(!log.console);
    }

    #[test]
    fn test_output_path_required() {
        assert!(IngestArgs::try_parse_from(["ingest_data"]).is_err());
        assert!(TrainArgs::try_parse_from(["train", "--input_path", "train.csv"]).is_err());
    }

    #[test]
    fn test_train_flags() {
        let args = TrainArgs::try_parse_from([
            "train",
            "--input_path",
            "data/train.csv",
            "--output_path",
            "artifacts",
            "--model",
            "random_forest",
            "--n_estimators",
            "25",
            "--max_depth",
            "8",
            "--log_level",
            "WARNING",
            "--log_file",
            "logs/train.log",
            "--console",
        ])
        .unwrap();

        let config = args.to_config();
        assert_eq!(config.estimator, EstimatorKind::RandomForest);
        assert_eq!(config.forest.n_estimators, 25);
        assert_eq!(config.forest.max_depth, Some(8));
        assert_eq!(args.log.log_level, LogLevel::Warning);
        assert!(args.log.console);
        assert_eq!(
            args.log.to_config("train").file,
            Some(PathBuf::from("logs/train.log"))
        );
    }

    #[test]
    fn test_invalid_values_rejected() {
        assert!(TrainArgs::try_parse_from([
            "train", "--input_path", "a.csv", "--output_path", "out", "--model", "svm",
        ])
        .is_err());
        assert!(IngestArgs::try_parse_from([
            "ingest_data", "--output_path", "data", "--test_fraction", "1.5",
        ])
        .is_err());
        assert!(ScoreArgs::try_parse_from([
            "score", "--model_path", "m", "--dataset_path", "d", "--output_path", "o",
            "--log_level", "LOUD",
        ])
        .is_err());
    }
}
