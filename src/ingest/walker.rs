use walkdir::WalkDir;
use std::path::{Path, PathBuf};
use crate::error::{Result, StaffloadError};
use super::orchestrator::UploadedFile;
use super::schema::EntityKind;

/// A CSV file found under a data folder
#[derive(Debug, Clone)]
pub struct CsvFile {
    pub relative_path: String,
    pub absolute_path: PathBuf,
    /// Entity the file name maps to, if any
    pub kind: Option<EntityKind>,
    pub file_size: u64,
}

impl CsvFile {
    /// File name without directories, as used for entity matching
    pub fn file_name(&self) -> String {
        self.absolute_path
            .file_name()
            .map(|n| n.to_string_lossy().to_string())
            .unwrap_or_else(|| self.relative_path.clone())
    }

    /// Read the file into an upload for an ingestion run.
    pub fn read(&self) -> Result<UploadedFile> {
        let contents = std::fs::read(&self.absolute_path).map_err(StaffloadError::Io)?;
        Ok(UploadedFile::new(self.file_name(), contents))
    }
}

/// Discover `.csv` files under `root`, sorted by relative path.
///
/// Files whose names match no entity are still returned with `kind: None` so the caller can
/// report them; run validation rejects them.
pub fn discover_csv_files(root: &Path) -> Result<Vec<CsvFile>> {
    if !root.is_dir() {
        return Err(StaffloadError::Config(format!(
            "Data folder not found: {}",
            root.display()
        )));
    }

    let mut files = Vec::new();

    for entry in WalkDir::new(root)
        .follow_links(true)
        .into_iter()
        .filter_map(|e| e.ok())
    {
        let path = entry.path();

        if !path.is_file() {
            continue;
        }

        let is_csv = path
            .extension()
            .and_then(|s| s.to_str())
            .is_some_and(|ext| ext.eq_ignore_ascii_case("csv"));
        if !is_csv {
            continue;
        }

        let metadata = std::fs::metadata(path).map_err(StaffloadError::Io)?;

        let relative_path = path
            .strip_prefix(root)
            .map_err(|_| StaffloadError::Config(
                format!("Failed to compute relative path for: {}", path.display())
            ))?
            .to_string_lossy()
            .to_string();

        let kind = path
            .file_name()
            .and_then(|n| n.to_str())
            .and_then(EntityKind::from_filename);

        files.push(CsvFile {
            relative_path,
            absolute_path: path.to_path_buf(),
            kind,
            file_size: metadata.len(),
        });
    }

    files.sort_by(|a, b| a.relative_path.cmp(&b.relative_path));
    log::info!("Discovered {} CSV files in {}", files.len(), root.display());
    Ok(files)
}
