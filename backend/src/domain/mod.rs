//! Domain layer: student records, the manager that owns them, and the sign-in gate.

pub mod access_service;
pub mod errors;
pub mod models;
pub mod statistics;
pub mod student_service;
pub mod undo_log;

pub use access_service::{AccessService, Session};
pub use errors::{AccessError, RecordParseError, StudentError};
pub use models::{CompletedSubject, Student};
pub use statistics::compute_statistics;
pub use student_service::{StudentManager, UndoOutcome};
pub use undo_log::{UndoAction, UndoEntry, UndoLog, DEFAULT_UNDO_LIMIT};
