use shared::Role;

/// Failures returned by [`StudentManager`](super::StudentManager) operations.
///
/// Every variant except `Persistence` is raised before any state changes.
/// `Persistence` on save is raised after the in-memory mutation was applied:
/// the change is logically done but not confirmed on disk.
#[derive(Debug, thiserror::Error)]
pub enum StudentError {
    #[error("Student ID {0} already exists")]
    DuplicateId(String),
    #[error("Student ID {0} not found")]
    NotFound(String),
    #[error("Student {id} is already enrolled in {subject}")]
    AlreadyEnrolled { id: String, subject: String },
    #[error("Student {id} has already completed {subject}")]
    AlreadyCompleted { id: String, subject: String },
    #[error("Student {id} is not enrolled in {subject}")]
    NotEnrolled { id: String, subject: String },
    #[error("Mark must be between 0 and 100, got {0}")]
    InvalidMark(i64),
    #[error("No actions to undo")]
    NothingToUndo,
    #[error("Invalid student record: {0}")]
    InvalidRecord(String),
    #[error("Persistence failure: {0:#}")]
    Persistence(anyhow::Error),
}

/// Why a stored record could not be turned into a student
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum RecordParseError {
    #[error("record is not valid UTF-8")]
    InvalidUtf8,
    #[error("expected at least 2 fields, found {found}")]
    TooFewFields { found: usize },
    #[error("invalid mark '{value}' (must be an integer from 0 to 100)")]
    InvalidMark { value: String },
    #[error("{completed} completed subjects but {marks} marks")]
    MarkCountMismatch { completed: usize, marks: usize },
}

/// Failures from the sign-in gate
#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum AccessError {
    #[error("Invalid username or password")]
    InvalidCredentials,
    #[error("Invalid role {selected} selected for this user")]
    RoleMismatch { selected: Role },
    #[error("{role} accounts may not {action}")]
    Forbidden { role: Role, action: String },
}
