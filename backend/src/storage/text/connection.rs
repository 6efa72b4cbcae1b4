use anyhow::{Context, Result};
use chrono::{DateTime, Local};
use log::info;
use std::fs;
use std::path::{Path, PathBuf};

use crate::config::{AppConfig, DEFAULT_BACKUP_DIR_NAME};

/// Timestamp pattern embedded in backup file names
pub const BACKUP_TIMESTAMP_FORMAT: &str = "%Y%m%d_%H%M%S";

/// TextConnection knows where the data file and its backups live
#[derive(Debug, Clone)]
pub struct TextConnection {
    data_file: PathBuf,
    backup_directory: Option<PathBuf>,
}

impl TextConnection {
    /// Connection with backups in a `backups` directory beside the data file
    pub fn new<P: AsRef<Path>>(data_file: P) -> Self {
        let data_file = data_file.as_ref().to_path_buf();
        let backup_directory = data_file
            .parent()
            .map(|dir| dir.join(DEFAULT_BACKUP_DIR_NAME))
            .unwrap_or_else(|| PathBuf::from(DEFAULT_BACKUP_DIR_NAME));
        Self {
            data_file,
            backup_directory: Some(backup_directory),
        }
    }

    /// Connection that never writes backups
    pub fn without_backups<P: AsRef<Path>>(data_file: P) -> Self {
        Self {
            data_file: data_file.as_ref().to_path_buf(),
            backup_directory: None,
        }
    }

    pub fn from_config(config: &AppConfig) -> Self {
        Self {
            data_file: config.data_file.clone(),
            backup_directory: config.backup_directory(),
        }
    }

    pub fn data_file(&self) -> &Path {
        &self.data_file
    }

    pub fn backup_directory(&self) -> Option<&Path> {
        self.backup_directory.as_deref()
    }

    pub fn backups_enabled(&self) -> bool {
        self.backup_directory.is_some()
    }

    /// Create the data file (and its parent directories) if it does not exist.
    /// Returns true when a new file was created.
    pub fn ensure_data_file_exists(&self) -> Result<bool> {
        if self.data_file.exists() {
            return Ok(false);
        }

        if let Some(parent) = self.data_file.parent() {
            if !parent.as_os_str().is_empty() && !parent.exists() {
                fs::create_dir_all(parent).with_context(|| {
                    format!("Failed to create data directory {}", parent.display())
                })?;
            }
        }

        fs::write(&self.data_file, "").with_context(|| {
            format!("Failed to create data file {}", self.data_file.display())
        })?;
        info!("Created new data file: {}", self.data_file.display());
        Ok(true)
    }

    /// `<backup_dir>/<file stem>_<YYYYMMDD_HHMMSS>.txt`, or None with backups disabled
    pub fn backup_path_at(&self, timestamp: DateTime<Local>) -> Option<PathBuf> {
        let directory = self.backup_directory.as_ref()?;
        let stem = self
            .data_file
            .file_stem()
            .and_then(|s| s.to_str())
            .unwrap_or("students");
        Some(directory.join(format!(
            "{}_{}.txt",
            stem,
            timestamp.format(BACKUP_TIMESTAMP_FORMAT)
        )))
    }
}
