//! Bounded history of invertible operations.
//!
//! Each entry carries exactly the data needed to reverse one mutation. The log
//! holds at most `limit` entries; recording past the limit evicts the oldest.

use chrono::{DateTime, Utc};
use std::collections::VecDeque;

use super::models::Student;

pub const DEFAULT_UNDO_LIMIT: usize = 10;

/// One reversible mutation
#[derive(Debug, Clone, PartialEq)]
pub enum UndoAction {
    Add {
        id: String,
    },
    Remove {
        snapshot: Student,
        /// Index the student occupied before removal
        position: usize,
    },
    Enroll {
        id: String,
        subject: String,
    },
    Complete {
        id: String,
        subject: String,
        mark: u8,
    },
}

impl UndoAction {
    pub fn describe(&self) -> String {
        match self {
            UndoAction::Add { id } => format!("Add student {}", id),
            UndoAction::Remove { snapshot, .. } => format!("Remove student {}", snapshot.id),
            UndoAction::Enroll { id, subject } => format!("Enrollment of {} in {}", id, subject),
            UndoAction::Complete { id, subject, mark } => {
                format!("Completion of {} by {} with mark {}", subject, id, mark)
            }
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct UndoEntry {
    pub action: UndoAction,
    pub recorded_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct UndoLog {
    entries: VecDeque<UndoEntry>,
    limit: usize,
}

impl Default for UndoLog {
    fn default() -> Self {
        Self::new(DEFAULT_UNDO_LIMIT)
    }
}

impl UndoLog {
    pub fn new(limit: usize) -> Self {
        Self {
            entries: VecDeque::with_capacity(limit),
            limit,
        }
    }

    pub fn record(&mut self, action: UndoAction) {
        if self.limit == 0 {
            return;
        }
        if self.entries.len() == self.limit {
            self.entries.pop_front();
        }
        self.entries.push_back(UndoEntry {
            action,
            recorded_at: Utc::now(),
        });
    }

    /// Take the most recent entry
    pub fn pop(&mut self) -> Option<UndoEntry> {
        self.entries.pop_back()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }
}
