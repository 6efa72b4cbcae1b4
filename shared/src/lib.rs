use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

/// Login role selected on the sign-in screen
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Admin,
    Teacher,
    Viewer,
}

impl Role {
    /// Access level granted to a successfully authenticated user of this role
    pub fn access_level(&self) -> AccessLevel {
        match self {
            Role::Admin => AccessLevel::Admin,
            Role::Teacher => AccessLevel::Write,
            Role::Viewer => AccessLevel::Read,
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Role::Admin => write!(f, "Admin"),
            Role::Teacher => write!(f, "Teacher"),
            Role::Viewer => write!(f, "Viewer"),
        }
    }
}

impl FromStr for Role {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "admin" => Ok(Role::Admin),
            "teacher" => Ok(Role::Teacher),
            "viewer" => Ok(Role::Viewer),
            other => Err(format!("Invalid role: {}", other)),
        }
    }
}

/// Capability tier a presentation layer uses to enable or disable its controls.
/// Ordered so that a higher level includes everything a lower one allows.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AccessLevel {
    Read,
    Write,
    Admin,
}

impl AccessLevel {
    pub fn allows(&self, capability: Capability) -> bool {
        *self >= capability.required_level()
    }
}

/// Individual actions gated by access level
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Capability {
    View,
    Enroll,
    Complete,
    Undo,
    AddStudent,
    RemoveStudent,
}

impl Capability {
    pub fn required_level(&self) -> AccessLevel {
        match self {
            Capability::View => AccessLevel::Read,
            Capability::Enroll | Capability::Complete | Capability::Undo => AccessLevel::Write,
            Capability::AddStudent | Capability::RemoveStudent => AccessLevel::Admin,
        }
    }
}

/// Aggregate view over the current student collection
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct StatisticsResponse {
    pub total_students: usize,
    /// Subject code -> number of students currently enrolled in it
    pub subjects_enrollment_count: BTreeMap<String, usize>,
    /// "Name (id)" -> number of completed subjects
    pub students_by_completed_count: BTreeMap<String, usize>,
}

impl StatisticsResponse {
    /// Subjects ordered by enrollment count, busiest first
    pub fn top_subjects(&self) -> Vec<(&str, usize)> {
        sorted_by_count(&self.subjects_enrollment_count)
    }

    /// Students ordered by number of completed subjects, most first
    pub fn top_students(&self) -> Vec<(&str, usize)> {
        sorted_by_count(&self.students_by_completed_count)
    }
}

fn sorted_by_count(counts: &BTreeMap<String, usize>) -> Vec<(&str, usize)> {
    let mut entries: Vec<(&str, usize)> = counts.iter().map(|(k, v)| (k.as_str(), *v)).collect();
    // BTreeMap iteration is key-ordered and sort_by is stable, so ties stay alphabetical
    entries.sort_by(|a, b| b.1.cmp(&a.1));
    entries
}
