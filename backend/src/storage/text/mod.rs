//! # Text File Storage
//!
//! The whole student collection lives in one UTF-8 text file (`students.txt`
//! by default), one record per line. Every save rewrites the file; with backups
//! enabled the previous file is first copied to
//! `<backup_dir>/<stem>_<YYYYMMDD_HHMMSS>.txt`.
//!
//! ```text
//! data/
//! ├── students.txt                        ← current records
//! └── backups/
//!     ├── students_20250301_101500.txt    ← copy taken before a save
//!     └── students_20250301_101742.txt
//! ```

pub mod connection;
pub mod record_codec;
pub mod student_repository;

#[cfg(test)]
pub mod test_utils;

pub use connection::TextConnection;
pub use record_codec::{student_from_line, student_to_line};
pub use student_repository::TextStudentRepository;
