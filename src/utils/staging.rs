//! Staged output files
//!
//! A stage writes each output to a hidden temporary sibling and renames it
//! into place only once every output of the stage has been written. A staged
//! file that is dropped without being committed is removed.

use crate::error::{HousingError, Result};
use std::fs::{self, File};
use std::path::{Path, PathBuf};

/// An output file being written next to its final location
#[derive(Debug)]
pub struct StagedFile {
    tmp_path: PathBuf,
    final_path: PathBuf,
    committed: bool,
}

impl StagedFile {
    /// Create the temporary file for `final_path`
    pub fn create(final_path: &Path) -> Result<(Self, File)> {
        let file_name = final_path
            .file_name()
            .and_then(|n| n.to_str())
            .ok_or_else(|| HousingError::InvalidParameter {
                name: "path".to_string(),
                value: final_path.display().to_string(),
                reason: "must name a file".to_string(),
            })?;

        let tmp_path = final_path.with_file_name(format!(".{}.tmp", file_name));
        let file = File::create(&tmp_path)?;

        Ok((
            Self {
                tmp_path,
                final_path: final_path.to_path_buf(),
                committed: false,
            },
            file,
        ))
    }

    /// Move the temporary file into place, overwriting any existing file
    pub fn commit(mut self) -> Result<PathBuf> {
        fs::rename(&self.tmp_path, &self.final_path)?;
        self.committed = true;
        Ok(self.final_path.clone())
    }
}

impl Drop for StagedFile {
    fn drop(&mut self) {
        if !self.committed {
            let _ = fs::remove_file(&self.tmp_path);
        }
    }
}

/// Commit a group of staged files in order.
///
/// If any rename fails, the files already moved into place are removed and the
/// remaining temporary files are dropped, so the group leaves no outputs behind.
pub fn commit_all(staged: Vec<StagedFile>) -> Result<Vec<PathBuf>> {
    let mut committed = Vec::with_capacity(staged.len());
    for file in staged {
        match file.commit() {
            Ok(path) => committed.push(path),
            Err(e) => {
                for path in &committed {
                    let _ = fs::remove_file(path);
                }
                return Err(e);
            }
        }
    }
    Ok(committed)
}
