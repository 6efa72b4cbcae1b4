//! # Student Records Backend
//!
//! Contains all non-UI logic for the student records application.
//!
//! The backend brings together:
//! - **Domain**: the student manager, undo log, statistics and access gate
//! - **Storage**: the line-oriented text file format and timestamped backups
//! - **Config**: YAML application configuration, including the credential table
//!
//! Everything here is synchronous and single-owner. A presentation layer holds
//! one [`Backend`] for the lifetime of the process and calls into it directly.
//!
//! ## Architecture
//!
//! ```text
//! Presentation (CLI / GUI)
//!     ↓
//! Domain (StudentManager, AccessService)
//!     ↓
//! Storage (StudentStorage -> TextStudentRepository)
//! ```

pub mod config;
pub mod domain;
pub mod storage;

use anyhow::Result;
use log::info;

pub use config::AppConfig;
pub use domain::{
    AccessError, AccessService, CompletedSubject, RecordParseError, Session, Student,
    StudentError, StudentManager, UndoOutcome,
};
pub use storage::{LoadReport, StudentStorage, TextConnection, TextStudentRepository};

/// Main backend struct that owns the live services
pub struct Backend {
    pub student_manager: StudentManager<TextStudentRepository>,
    pub access_service: AccessService,
}

impl Backend {
    /// Build the backend from configuration, loading the data file
    pub fn new(config: &AppConfig) -> Result<Self> {
        info!("Setting up storage at {}", config.data_file.display());
        let connection = TextConnection::from_config(config);
        let repository = TextStudentRepository::new(connection);

        info!("Setting up domain services");
        let student_manager = StudentManager::with_undo_limit(repository, config.undo_limit)?;
        let access_service = AccessService::new(config.credentials.clone());

        Ok(Backend {
            student_manager,
            access_service,
        })
    }
}
