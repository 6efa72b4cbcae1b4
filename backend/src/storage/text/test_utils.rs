//! Test utilities for file-backed tests
//!
//! `TestEnvironment` owns a temporary directory, so everything a test writes
//! is removed when the environment drops, even if the test panics.

use anyhow::Result;
use std::fs;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

use super::connection::TextConnection;
use super::student_repository::TextStudentRepository;

pub struct TestEnvironment {
    /// Kept alive until drop
    _temp_dir: TempDir,
    pub base_path: PathBuf,
}

impl TestEnvironment {
    pub fn new() -> Result<Self> {
        let temp_dir = TempDir::with_prefix("student_records_")?;
        let base_path = temp_dir.path().to_path_buf();
        Ok(Self {
            _temp_dir: temp_dir,
            base_path,
        })
    }

    pub fn data_file(&self) -> PathBuf {
        self.base_path.join("students.txt")
    }

    pub fn backup_dir(&self) -> PathBuf {
        self.base_path.join("backups")
    }

    pub fn connection(&self) -> TextConnection {
        TextConnection::new(self.data_file())
    }

    pub fn repository(&self) -> TextStudentRepository {
        TextStudentRepository::new(self.connection())
    }

    /// Backup files currently on disk, sorted by name
    pub fn backup_files(&self) -> Vec<PathBuf> {
        list_files(&self.backup_dir())
    }
}

fn list_files(dir: &Path) -> Vec<PathBuf> {
    let mut files: Vec<PathBuf> = match fs::read_dir(dir) {
        Ok(entries) => entries
            .filter_map(|entry| entry.ok().map(|e| e.path()))
            .filter(|path| path.is_file())
            .collect(),
        Err(_) => Vec::new(),
    };
    files.sort();
    files
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_environment_cleanup() -> Result<()> {
        let base_path;
        {
            let env = TestEnvironment::new()?;
            base_path = env.base_path.clone();
            assert!(base_path.exists());
        }
        assert!(!base_path.exists());
        Ok(())
    }
}
