use anyhow::{Context, Result};
use chrono::Local;
use log::{debug, info, warn};
use std::fs;
use std::path::PathBuf;

use super::connection::TextConnection;
use super::record_codec::{student_from_line, student_to_line};
use crate::domain::errors::RecordParseError;
use crate::domain::models::Student;
use crate::storage::traits::{LoadReport, SkippedLine, StudentStorage};

/// Text-file student repository: the whole collection lives in one file,
/// one record per line, rewritten on every save.
#[derive(Debug, Clone)]
pub struct TextStudentRepository {
    connection: TextConnection,
}

impl TextStudentRepository {
    pub fn new(connection: TextConnection) -> Self {
        Self { connection }
    }

    pub fn connection(&self) -> &TextConnection {
        &self.connection
    }

    /// Copy the current data file into the backup directory.
    /// Returns the backup path, or None if backups are off or there is nothing to copy.
    pub fn create_backup(&self) -> Result<Option<PathBuf>> {
        let data_file = self.connection.data_file();
        if !data_file.exists() {
            return Ok(None);
        }

        let backup_path = match self.connection.backup_path_at(Local::now()) {
            Some(path) => path,
            None => return Ok(None),
        };

        if let Some(backup_dir) = backup_path.parent() {
            fs::create_dir_all(backup_dir).with_context(|| {
                format!("Failed to create backup directory {}", backup_dir.display())
            })?;
        }

        fs::copy(data_file, &backup_path)
            .with_context(|| format!("Failed to copy data file to {}", backup_path.display()))?;
        info!("Backup created: {}", backup_path.display());
        Ok(Some(backup_path))
    }

    fn write_data_file(&self, students: &[Student]) -> Result<()> {
        let data_file = self.connection.data_file();

        let mut content = String::new();
        for student in students {
            content.push_str(&student_to_line(student));
            content.push('\n');
        }

        // Atomic write using temp file
        let temp_path = data_file.with_extension("tmp");
        fs::write(&temp_path, content)
            .with_context(|| format!("Failed to write {}", temp_path.display()))?;
        fs::rename(&temp_path, data_file)
            .with_context(|| format!("Failed to replace {}", data_file.display()))?;
        Ok(())
    }
}

impl StudentStorage for TextStudentRepository {
    fn load_students(&self) -> Result<LoadReport> {
        let data_file = self.connection.data_file();

        if self.connection.ensure_data_file_exists()? {
            return Ok(LoadReport::default());
        }

        let bytes = fs::read(data_file)
            .with_context(|| format!("Failed to read {}", data_file.display()))?;

        // Lines are decoded one at a time; invalid UTF-8 is just another malformed line
        let mut report = LoadReport::default();
        for (index, raw_line) in bytes.split(|b| *b == b'\n').enumerate() {
            let parsed = match std::str::from_utf8(raw_line) {
                Ok(line) if line.trim().is_empty() => continue,
                Ok(line) => student_from_line(line),
                Err(_) => Err(RecordParseError::InvalidUtf8),
            };

            match parsed {
                Ok(student) => report.students.push(student),
                Err(reason) => {
                    warn!("Skipping invalid record on line {}: {}", index + 1, reason);
                    report.skipped.push(SkippedLine {
                        line_number: index + 1,
                        reason,
                    });
                }
            }
        }

        info!(
            "Loaded {} student records from {}",
            report.students.len(),
            data_file.display()
        );
        Ok(report)
    }

    fn save_students(&self, students: &[Student]) -> Result<()> {
        if self.connection.backups_enabled() {
            // A failed backup does not block the save
            if let Err(e) = self.create_backup() {
                warn!("Could not create backup: {:#}", e);
            }
        } else {
            debug!("Backups disabled, overwriting in place");
        }

        self.write_data_file(students)?;
        info!(
            "Saved {} student records to {}",
            students.len(),
            self.connection.data_file().display()
        );
        Ok(())
    }
}
