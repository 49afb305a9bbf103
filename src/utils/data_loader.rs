//! CSV loading and saving for pipeline datasets

use crate::error::{HousingError, Result};
use polars::prelude::*;
use std::fs::File;
use std::io::{BufRead, BufReader, Write};
use std::path::Path;
use tracing::debug;

/// Data loader for comma-separated files with a header row
#[derive(Debug, Clone, Default)]
pub struct DataLoader;

impl DataLoader {
    /// Create a new data loader that infers the schema from the whole file
    pub fn new() -> Self {
        Self
    }

    /// Load a CSV file
    pub fn load_csv(&self, path: &Path) -> Result<DataFrame> {
        let file = File::open(path).map_err(|e| {
            HousingError::IoError(std::io::Error::new(
                e.kind(),
                format!("{}: {}", path.display(), e),
            ))
        })?;

        let df = CsvReadOptions::default()
            .with_has_header(true)
            .with_infer_schema_length(None)
            .into_reader_with_file_handle(file)
            .finish()
            .map_err(|e| HousingError::DataError(format!("{}: {}", path.display(), e)))?;

        debug!(path = %path.display(), rows = df.height(), cols = df.width(), "Loaded CSV");
        Ok(df)
    }

    /// Read only the header row of a CSV file
    pub fn read_header(&self, path: &Path) -> Result<Vec<String>> {
        let file = File::open(path)?;
        let mut header = String::new();
        BufReader::new(file).read_line(&mut header)?;

        Ok(header
            .trim_end_matches(['\r', '\n'])
            .split(',')
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .collect())
    }
}

/// Save a DataFrame to CSV
pub struct DataSaver;

impl DataSaver {
    /// Write `df` as CSV (header, comma-delimited, no index column) into `writer`
    pub fn write_csv<W: Write>(df: &mut DataFrame, writer: &mut W) -> Result<()> {
        CsvWriter::new(writer)
            .include_header(true)
            .with_separator(b',')
            .finish(df)
            .map_err(|e| HousingError::DataError(e.to_string()))
    }

    /// Save to a CSV file, overwriting any existing file
    pub fn save_csv(df: &mut DataFrame, path: &Path) -> Result<()> {
        let mut file = File::create(path)?;
        Self::write_csv(df, &mut file)?;
        file.flush()?;
        Ok(())
    }
}
