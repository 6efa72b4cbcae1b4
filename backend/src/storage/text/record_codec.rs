//! # Student Line Format
//!
//! One student per line, five comma-separated fields:
//!
//! ```text
//! id,name,enrolled,completed,marks
//! S001,John Doe,COMP101;MATH201,PHYS101,85
//! S002,Jane Smith,COMP101;CHEM101,,
//! ```
//!
//! The last three fields are `;`-joined lists and are empty when the list is.
//! `completed` and `marks` are positionally paired.

use crate::domain::errors::RecordParseError;
use crate::domain::models::{CompletedSubject, Student};

pub const FIELD_SEPARATOR: char = ',';
pub const LIST_SEPARATOR: char = ';';

/// Render a student as one line, without the trailing newline
pub fn student_to_line(student: &Student) -> String {
    let enrolled = student.enrolled.join(";");
    let completed = student
        .completed
        .iter()
        .map(|c| c.subject.as_str())
        .collect::<Vec<_>>()
        .join(";");
    let marks = student
        .completed
        .iter()
        .map(|c| c.mark.to_string())
        .collect::<Vec<_>>()
        .join(";");

    format!(
        "{},{},{},{},{}",
        student.id, student.name, enrolled, completed, marks
    )
}

/// Parse one line. Missing trailing fields read as empty lists; fields past
/// the fifth are ignored.
pub fn student_from_line(line: &str) -> Result<Student, RecordParseError> {
    let parts: Vec<&str> = line.trim().split(FIELD_SEPARATOR).collect();
    if parts.len() < 2 {
        return Err(RecordParseError::TooFewFields { found: parts.len() });
    }

    let field = |index: usize| parts.get(index).copied().unwrap_or("");

    let enrolled = split_list(field(2));
    let completed_subjects = split_list(field(3));
    let marks = split_list(field(4))
        .into_iter()
        .map(|value| parse_mark(&value))
        .collect::<Result<Vec<u8>, _>>()?;

    if completed_subjects.len() != marks.len() {
        return Err(RecordParseError::MarkCountMismatch {
            completed: completed_subjects.len(),
            marks: marks.len(),
        });
    }

    let completed = completed_subjects
        .into_iter()
        .zip(marks)
        .map(|(subject, mark)| CompletedSubject { subject, mark })
        .collect();

    Ok(Student {
        id: parts[0].to_string(),
        name: parts[1].to_string(),
        enrolled,
        completed,
    })
}

fn split_list(field: &str) -> Vec<String> {
    if field.is_empty() {
        return Vec::new();
    }
    field.split(LIST_SEPARATOR).map(str::to_string).collect()
}

/// Marks must be written in canonical form (no sign, no leading zeros) so that
/// a parsed line serializes back to the same text
fn parse_mark(value: &str) -> Result<u8, RecordParseError> {
    value
        .parse::<u8>()
        .ok()
        .filter(|mark| *mark <= 100 && mark.to_string() == value)
        .ok_or_else(|| RecordParseError::InvalidMark {
            value: value.to_string(),
        })
}
