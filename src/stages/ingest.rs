//! Ingest stage: fetch the housing archive, split it and write train/val CSVs

use crate::dataset::{income_cat_proportions, stratified_split, train_val_split, INCOME_COLUMN};
use crate::error::{HousingError, Result};
use crate::utils::{commit_all, DataLoader, DataSaver, StagedFile};
use flate2::read::GzDecoder;
use polars::prelude::*;
use serde::{Deserialize, Serialize};
use std::fs::{self, File};
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};
use tracing::{debug, info};

/// Public copy of the California housing archive
pub const HOUSING_URL: &str =
    "https://raw.githubusercontent.com/ageron/handson-ml/master/datasets/housing/housing.tgz";

/// Sub-directory of the output directory the archive is extracted into
pub const HOUSING_DIR: &str = "housing";
pub const ARCHIVE_FILE: &str = "housing.tgz";
pub const HOUSING_CSV: &str = "housing.csv";
pub const TRAIN_FILE: &str = "train.csv";
pub const VALIDATION_FILE: &str = "val.csv";

/// Options for an ingest run
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IngestConfig {
    pub output_path: PathBuf,
    pub housing_url: String,
    pub test_fraction: f64,
    pub seed: u64,
    /// Preserve income-category proportions in both subsets
    pub stratified: bool,
    /// Reuse `<output>/housing/housing.csv` instead of downloading
    pub skip_download: bool,
}

impl IngestConfig {
    pub fn new(output_path: impl Into<PathBuf>) -> Self {
        Self {
            output_path: output_path.into(),
            housing_url: HOUSING_URL.to_string(),
            test_fraction: 0.2,
            seed: 42,
            stratified: false,
            skip_download: false,
        }
    }

    pub fn with_housing_url(mut self, url: impl Into<String>) -> Self {
        self.housing_url = url.into();
        self
    }

    pub fn with_test_fraction(mut self, test_fraction: f64) -> Self {
        self.test_fraction = test_fraction;
        self
    }

    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }

    pub fn with_stratified(mut self, stratified: bool) -> Self {
        self.stratified = stratified;
        self
    }

    pub fn with_skip_download(mut self, skip_download: bool) -> Self {
        self.skip_download = skip_download;
        self
    }

    /// Directory holding the extracted `housing.csv`
    pub fn housing_path(&self) -> PathBuf {
        self.output_path.join(HOUSING_DIR)
    }
}

/// Download the archive at `url` into `destination` and extract it there
pub fn fetch(url: &str, destination: &Path) -> Result<PathBuf> {
    info!(url, destination = %destination.display(), "Fetching housing data");
    fs::create_dir_all(destination)?;

    let client = reqwest::blocking::Client::builder()
        .user_agent(concat!("housing-pipeline/", env!("CARGO_PKG_VERSION")))
        .build()?;
    let mut response = client.get(url).send()?.error_for_status()?;

    let archive_path = destination.join(ARCHIVE_FILE);
    let mut writer = BufWriter::new(File::create(&archive_path)?);
    let bytes = response
        .copy_to(&mut writer)
        .map_err(|e| HousingError::NetworkError(format!("{}: {}", url, e)))?;
    writer.flush()?;
    debug!(bytes, path = %archive_path.display(), "Archive downloaded");

    extract(&archive_path, destination)?;
    info!("Housing data fetched successfully");
    Ok(archive_path)
}

/// Extract a gzip-compressed tar archive into `destination`
pub fn extract(archive_path: &Path, destination: &Path) -> Result<()> {
    let file = File::open(archive_path)?;
    let mut archive = tar::Archive::new(GzDecoder::new(file));
    archive.unpack(destination).map_err(|e| {
        HousingError::ExtractionError(format!("{}: {}", archive_path.display(), e))
    })?;
    debug!(archive = %archive_path.display(), "Archive extracted");
    Ok(())
}

/// Load `housing.csv` from the directory `path`
pub fn load(path: &Path) -> Result<DataFrame> {
    info!("Loading housing data");
    let df = DataLoader::new().load_csv(&path.join(HOUSING_CSV))?;
    info!(rows = df.height(), cols = df.width(), "Housing data loaded");
    Ok(df)
}

/// Random split into (train, validation) with `round((1 - test_fraction) * N)` training rows
pub fn split(df: &DataFrame, test_fraction: f64, seed: u64) -> Result<(DataFrame, DataFrame)> {
    train_val_split(df, test_fraction, seed)
}

/// Write `df` to `path/filename`, overwriting any existing file
pub fn save(df: &mut DataFrame, path: &Path, filename: &str) -> Result<PathBuf> {
    stage_csv(df, path, filename)?.commit()
}

fn stage_csv(df: &mut DataFrame, dir: &Path, filename: &str) -> Result<StagedFile> {
    let (staged, file) = StagedFile::create(&dir.join(filename))?;
    let mut writer = BufWriter::new(file);
    DataSaver::write_csv(df, &mut writer)?;
    writer.flush()?;
    Ok(staged)
}

fn log_proportions(label: &str, df: &DataFrame) -> Result<()> {
    if df.get_column_names().iter().any(|c| c.as_str() == INCOME_COLUMN) {
        let proportions = income_cat_proportions(df)?;
        debug!(set = label, ?proportions, "Income category proportions");
    }
    Ok(())
}

/// Run the full ingest stage
pub fn run(config: &IngestConfig) -> Result<Vec<PathBuf>> {
    let housing_path = config.housing_path();
    if config.skip_download {
        info!(path = %housing_path.display(), "Skipping download");
    } else {
        fetch(&config.housing_url, &housing_path)?;
    }

    let housing = load(&housing_path)?;

    let (mut train_set, mut val_set) = if config.stratified {
        stratified_split(&housing, config.test_fraction, config.seed)?
    } else {
        split(&housing, config.test_fraction, config.seed)?
    };
    info!(
        train_rows = train_set.height(),
        val_rows = val_set.height(),
        seed = config.seed,
        stratified = config.stratified,
        "Dataset split"
    );

    log_proportions("full", &housing)?;
    log_proportions("train", &train_set)?;
    log_proportions("validation", &val_set)?;

    fs::create_dir_all(&config.output_path)?;
    let staged = vec![
        stage_csv(&mut train_set, &config.output_path, TRAIN_FILE)?,
        stage_csv(&mut val_set, &config.output_path, VALIDATION_FILE)?,
    ];
    let written = commit_all(staged)?;
    for path in &written {
        info!(path = %path.display(), "Data saved");
    }
    Ok(written)
}

#[cfg(test)]
mod tests {
    use super::*;
    use flate2::write::GzEncoder;
    use flate2::Compression;
    use tempfile::TempDir;

    const HOUSING_SAMPLE: &str = "\
longitude,latitude,median_income,ocean_proximity,median_house_value
-122.23,37.88,8.3252,NEAR BAY,452600.0
-122.22,37.86,8.3014,NEAR BAY,358500.0
-122.24,37.85,7.2574,NEAR BAY,352100.0
-122.25,37.85,5.6431,NEAR BAY,341300.0
-122.25,37.85,3.8462,NEAR BAY,342200.0
-121.92,36.62,2.0,<1H OCEAN,183000.0
-119.02,36.06,1.2,INLAND,46300.0
-118.99,35.40,2.9,INLAND,72300.0
-117.16,32.72,4.4,NEAR OCEAN,201000.0
-117.03,32.70,3.1,NEAR OCEAN,148800.0
";

    fn write_archive(dir: &Path) -> PathBuf {
        let archive_path = dir.join(ARCHIVE_FILE);
        let encoder = GzEncoder::new(File::create(&archive_path).unwrap(), Compression::default());
        let mut builder = tar::Builder::new(encoder);

        let mut header = tar::Header::new_gnu();
        header.set_size(HOUSING_SAMPLE.len() as u64);
        header.set_mode(0o644);
        header.set_cksum();
        builder
            .append_data(&mut header, HOUSING_CSV, HOUSING_SAMPLE.as_bytes())
            .unwrap();
        builder.into_inner().unwrap().finish().unwrap();
        archive_path
    }

    #[test]
    fn test_extract_and_load() {
        let dir = TempDir::new().unwrap();
        let archive = write_archive(dir.path());
        let housing = dir.path().join(HOUSING_DIR);

        extract(&archive, &housing).unwrap();
        let df = load(&housing).unwrap();
        assert_eq!(df.shape(), (10, 5));
    }

    #[test]
    fn test_extract_corrupt_archive() {
        let dir = TempDir::new().unwrap();
        let archive = dir.path().join(ARCHIVE_FILE);
        fs::write(&archive, b"definitely not gzip").unwrap();

        assert!(matches!(
            extract(&archive, dir.path()),
            Err(HousingError::ExtractionError(_))
        ));
    }

    #[test]
    fn test_load_missing_csv() {
        let dir = TempDir::new().unwrap();
        assert!(load(dir.path()).is_err());
    }

    #[test]
    fn test_run_with_local_archive() {
        let dir = TempDir::new().unwrap();
        let config = IngestConfig::new(dir.path()).with_skip_download(true);
        extract(&write_archive(dir.path()), &config.housing_path()).unwrap();

        let written = run(&config).unwrap();
        assert_eq!(
            written,
            vec![dir.path().join(TRAIN_FILE), dir.path().join(VALIDATION_FILE)]
        );

        let train = DataLoader::new().load_csv(&written[0]).unwrap();
        let val = DataLoader::new().load_csv(&written[1]).unwrap();
        assert_eq!(train.height(), 8);
        assert_eq!(val.height(), 2);
    }

    #[test]
    fn test_run_stratified() {
        let dir = TempDir::new().unwrap();
        let config = IngestConfig::new(dir.path())
            .with_skip_download(true)
            .with_stratified(true);
        extract(&write_archive(dir.path()), &config.housing_path()).unwrap();

        let written = run(&config).unwrap();
        let train = DataLoader::new().load_csv(&written[0]).unwrap();
        assert_eq!(train.height(), 8);
    }

    #[test]
    fn test_failed_run_leaves_no_output() {
        let dir = TempDir::new().unwrap();
        let config = IngestConfig::new(dir.path())
            .with_skip_download(true)
            .with_test_fraction(1.5);
        extract(&write_archive(dir.path()), &config.housing_path()).unwrap();

        assert!(run(&config).is_err());
        assert!(!dir.path().join(TRAIN_FILE).exists());
        assert!(!dir.path().join(VALIDATION_FILE).exists());
    }

    #[test]
    fn test_unreachable_url() {
        let dir = TempDir::new().unwrap();
        let err = fetch("http://127.0.0.1:9/housing.tgz", dir.path()).unwrap_err();
        assert!(matches!(err, HousingError::NetworkError(_)));
    }

    #[test]
    fn test_http_error_status() {
        use std::io::{BufRead, BufReader};
        use std::net::TcpListener;

        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        let addr = listener.local_addr().unwrap();
        let server = std::thread::spawn(move || {
            let (stream, _) = listener.accept().unwrap();
            let mut reader = BufReader::new(stream.try_clone().unwrap());
            let mut line = String::new();
            while reader.read_line(&mut line).unwrap() > 0 && line != "\r\n" {
                line.clear();
            }
            let mut stream = stream;
            stream
                .write_all(b"HTTP/1.1 404 Not Found\r\nContent-Length: 0\r\nConnection: close\r\n\r\n")
                .unwrap();
        });

        let dir = TempDir::new().unwrap();
        let url = format!("http://{}/housing.tgz", addr);
        let err = fetch(&url, dir.path()).unwrap_err();
        server.join().unwrap();

        assert!(matches!(err, HousingError::NetworkError(_)));
        assert!(!dir.path().join(HOUSING_CSV).exists());
        assert!(!dir.path().join(ARCHIVE_FILE).exists());
    }
}
