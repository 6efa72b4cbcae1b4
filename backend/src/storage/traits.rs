//! # Storage Traits
//!
//! The student manager only talks to storage through [`StudentStorage`], so the
//! domain layer never sees file paths or the line format.

use anyhow::Result;

use crate::domain::errors::RecordParseError;
use crate::domain::models::Student;

/// A line that was skipped during load
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SkippedLine {
    /// 1-based line number in the data file
    pub line_number: usize,
    pub reason: RecordParseError,
}

/// Result of loading the backing store
#[derive(Debug, Clone, Default, PartialEq)]
pub struct LoadReport {
    pub students: Vec<Student>,
    pub skipped: Vec<SkippedLine>,
}

/// Trait defining whole-collection persistence for students
pub trait StudentStorage: Send + Sync {
    /// Read every well-formed record, creating an empty store if none exists.
    /// Malformed records are skipped and reported, never fatal.
    fn load_students(&self) -> Result<LoadReport>;

    /// Replace the stored collection with `students`, in order
    fn save_students(&self, students: &[Student]) -> Result<()>;
}
