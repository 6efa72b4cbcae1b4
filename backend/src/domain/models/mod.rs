pub mod student;

pub use student::{contains_reserved, CompletedSubject, Student, RESERVED_CHARS};
