use serde::{Deserialize, Serialize};
use std::fmt;

/// Characters no id, name or subject may contain, since stored records use
/// them as separators
pub const RESERVED_CHARS: [char; 4] = [',', ';', '\n', '\r'];

/// True if `value` contains one of [`RESERVED_CHARS`]
pub fn contains_reserved(value: &str) -> bool {
    value.contains(&RESERVED_CHARS[..])
}

/// A subject the student has finished, with its mark (0-100)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CompletedSubject {
    pub subject: String,
    pub mark: u8,
}

impl CompletedSubject {
    pub fn new(subject: impl Into<String>, mark: u8) -> Self {
        Self {
            subject: subject.into(),
            mark,
        }
    }
}

/// Domain model representing one student's record.
///
/// A subject code lives in at most one of `enrolled` / `completed` at a time;
/// the student manager is the only code that moves subjects between them.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Student {
    pub id: String,
    pub name: String,
    pub enrolled: Vec<String>,
    pub completed: Vec<CompletedSubject>,
}

impl Student {
    pub fn new(id: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            enrolled: Vec::new(),
            completed: Vec::new(),
        }
    }

    pub fn with_enrolled<I, S>(id: impl Into<String>, name: impl Into<String>, subjects: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut student = Self::new(id, name);
        student.enrolled = subjects.into_iter().map(Into::into).collect();
        student
    }

    pub fn is_enrolled(&self, subject: &str) -> bool {
        self.enrolled.iter().any(|s| s == subject)
    }

    pub fn has_completed(&self, subject: &str) -> bool {
        self.completed.iter().any(|c| c.subject == subject)
    }

    pub fn mark_for(&self, subject: &str) -> Option<u8> {
        self.completed
            .iter()
            .find(|c| c.subject == subject)
            .map(|c| c.mark)
    }

    pub fn average_mark(&self) -> Option<f64> {
        if self.completed.is_empty() {
            return None;
        }
        let total: u32 = self.completed.iter().map(|c| u32::from(c.mark)).sum();
        Some(f64::from(total) / self.completed.len() as f64)
    }

    /// Label used for per-student statistics, e.g. "John Doe (S001)"
    pub fn display_name(&self) -> String {
        format!("{} ({})", self.name, self.id)
    }
}

impl fmt::Display for Student {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let enrolled = if self.enrolled.is_empty() {
            "None".to_string()
        } else {
            self.enrolled.join(", ")
        };
        let completed = if self.completed.is_empty() {
            "None".to_string()
        } else {
            self.completed
                .iter()
                .map(|c| c.subject.as_str())
                .collect::<Vec<_>>()
                .join(", ")
        };
        write!(
            f,
            "ID: {} | Name: {} | Enrolled: {} | Completed: {}",
            self.id, self.name, enrolled, completed
        )
    }
}
