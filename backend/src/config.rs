//! # Application Configuration
//!
//! Configuration is a single YAML file. Every field has a default, so an empty
//! file (or no file at all) yields a working configuration with backups enabled
//! and an empty credential table.
//!
//! ```yaml
//! data_file: "students.txt"
//! undo_limit: 10
//! backups:
//!   enabled: true
//!   directory: "backups"
//! credentials:
//!   admin:
//!     username: "admin"
//!     secret: "..."
//!   teacher:
//!     username: "teacher"
//!     secret: "..."
//! ```

use anyhow::{Context, Result};
use log::{debug, info};
use serde::{Deserialize, Serialize};
use shared::Role;
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use crate::domain::undo_log::DEFAULT_UNDO_LIMIT;

/// Environment variable consulted when no explicit config path is given
pub const CONFIG_ENV_VAR: &str = "STUDENT_RECORDS_CONFIG";

pub const DEFAULT_DATA_FILE: &str = "students.txt";
pub const DEFAULT_BACKUP_DIR_NAME: &str = "backups";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    /// Path of the backing text file
    pub data_file: PathBuf,
    /// Maximum number of undoable operations kept in memory
    pub undo_limit: usize,
    pub backups: BackupConfig,
    /// Role -> login credentials. Empty means nobody can sign in.
    pub credentials: BTreeMap<Role, Credential>,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            data_file: PathBuf::from(DEFAULT_DATA_FILE),
            undo_limit: DEFAULT_UNDO_LIMIT,
            backups: BackupConfig::default(),
            credentials: BTreeMap::new(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BackupConfig {
    pub enabled: bool,
    /// Backup directory. Relative paths resolve against the data file's directory;
    /// `None` means a `backups` directory beside the data file.
    pub directory: Option<PathBuf>,
}

impl Default for BackupConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            directory: None,
        }
    }
}

#[derive(Clone, PartialEq, Serialize, Deserialize)]
pub struct Credential {
    pub username: String,
    pub secret: String,
}

// Keep secrets out of debug logs
impl std::fmt::Debug for Credential {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Credential")
            .field("username", &self.username)
            .field("secret", &"***")
            .finish()
    }
}

impl AppConfig {
    /// Load configuration from a YAML file
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let yaml_content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file {}", path.display()))?;
        let config = Self::from_yaml_str(&yaml_content)
            .with_context(|| format!("Failed to parse config file {}", path.display()))?;
        info!("Loaded configuration from {}", path.display());
        Ok(config)
    }

    pub fn from_yaml_str(yaml_content: &str) -> Result<Self> {
        if yaml_content.trim().is_empty() {
            return Ok(Self::default());
        }
        Ok(serde_yaml::from_str(yaml_content)?)
    }

    /// Resolve configuration: explicit path, then `STUDENT_RECORDS_CONFIG`, then defaults
    pub fn load(explicit_path: Option<&Path>) -> Result<Self> {
        if let Some(path) = explicit_path {
            return Self::from_file(path);
        }

        match std::env::var_os(CONFIG_ENV_VAR) {
            Some(env_path) => Self::from_file(PathBuf::from(env_path)),
            None => {
                debug!("No config file given, using defaults");
                Ok(Self::default())
            }
        }
    }

    /// Directory that receives backups, if backups are enabled
    pub fn backup_directory(&self) -> Option<PathBuf> {
        if !self.backups.enabled {
            return None;
        }

        let data_dir = self
            .data_file
            .parent()
            .map(Path::to_path_buf)
            .unwrap_or_default();

        Some(match &self.backups.directory {
            Some(dir) if dir.is_absolute() => dir.clone(),
            Some(dir) => data_dir.join(dir),
            None => data_dir.join(DEFAULT_BACKUP_DIR_NAME),
        })
    }
}
