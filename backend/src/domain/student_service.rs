use log::{debug, info, warn};
use shared::StatisticsResponse;

use super::errors::StudentError;
use super::models::{contains_reserved, CompletedSubject, Student};
use super::statistics::compute_statistics;
use super::undo_log::{UndoAction, UndoLog, DEFAULT_UNDO_LIMIT};
use crate::storage::{SkippedLine, StudentStorage};

/// What an `undo` call reverted
#[derive(Debug, Clone, PartialEq)]
pub struct UndoOutcome {
    pub reverted: UndoAction,
    /// False when the inverse found nothing to act on
    pub applied: bool,
}

/// In-memory student collection with undo and write-through persistence.
///
/// Every successful mutation records an undo entry and then saves the whole
/// collection. A save failure is returned as `StudentError::Persistence` but the
/// mutation stays applied in memory.
pub struct StudentManager<S: StudentStorage> {
    storage: S,
    students: Vec<Student>,
    undo_log: UndoLog,
    skipped_on_load: Vec<SkippedLine>,
}

impl<S: StudentStorage> StudentManager<S> {
    /// Open the store, loading whatever the backing storage holds
    pub fn new(storage: S) -> Result<Self, StudentError> {
        Self::with_undo_limit(storage, DEFAULT_UNDO_LIMIT)
    }

    pub fn with_undo_limit(storage: S, undo_limit: usize) -> Result<Self, StudentError> {
        let mut manager = Self {
            storage,
            students: Vec::new(),
            undo_log: UndoLog::new(undo_limit),
            skipped_on_load: Vec::new(),
        };
        manager.reload()?;
        Ok(manager)
    }

    /// Re-read the backing storage, replacing the collection and clearing undo history.
    /// Returns the number of records loaded.
    pub fn reload(&mut self) -> Result<usize, StudentError> {
        let report = self
            .storage
            .load_students()
            .map_err(StudentError::Persistence)?;

        if !report.skipped.is_empty() {
            warn!("Skipped {} malformed records while loading", report.skipped.len());
        }

        self.students = report.students;
        self.skipped_on_load = report.skipped;
        self.undo_log.clear();
        Ok(self.students.len())
    }

    /// Add a new student
    pub fn add(&mut self, mut student: Student) -> Result<(), StudentError> {
        student.id = student.id.trim().to_string();
        student.name = student.name.trim().to_string();
        for subject in &mut student.enrolled {
            *subject = subject.trim().to_string();
        }
        for completed in &mut student.completed {
            completed.subject = completed.subject.trim().to_string();
        }
        validate_new_student(&student)?;

        if self.search(&student.id).is_some() {
            warn!("Student ID {} already exists", student.id);
            return Err(StudentError::DuplicateId(student.id));
        }

        info!("Adding student {} ({})", student.name, student.id);
        self.undo_log.record(UndoAction::Add {
            id: student.id.clone(),
        });
        self.students.push(student);
        self.persist()
    }

    /// Remove a student, returning the removed record
    pub fn remove(&mut self, id: &str) -> Result<Student, StudentError> {
        let position = self.position_of(id)?;
        let student = self.students.remove(position);

        info!("Removed student {} ({})", student.name, student.id);
        self.undo_log.record(UndoAction::Remove {
            snapshot: student.clone(),
            position,
        });
        self.persist()?;
        Ok(student)
    }

    pub fn search(&self, id: &str) -> Option<&Student> {
        self.students.iter().find(|s| s.id == id)
    }

    /// Enroll a student in a subject they have neither taken nor finished
    pub fn enroll(&mut self, id: &str, subject: &str) -> Result<(), StudentError> {
        let position = self.position_of(id)?;
        let subject = subject.trim();
        validate_subject(subject)?;

        let student = &mut self.students[position];
        if student.is_enrolled(subject) {
            return Err(StudentError::AlreadyEnrolled {
                id: id.to_string(),
                subject: subject.to_string(),
            });
        }
        if student.has_completed(subject) {
            return Err(StudentError::AlreadyCompleted {
                id: id.to_string(),
                subject: subject.to_string(),
            });
        }

        student.enrolled.push(subject.to_string());
        info!("Student {} enrolled in {}", student.name, subject);
        self.undo_log.record(UndoAction::Enroll {
            id: id.to_string(),
            subject: subject.to_string(),
        });
        self.persist()
    }

    /// Move an enrolled subject to completed with the given mark
    pub fn complete(&mut self, id: &str, subject: &str, mark: i64) -> Result<(), StudentError> {
        let position = self.position_of(id)?;
        let subject = subject.trim();

        let student = &mut self.students[position];
        let enrolled_index = student
            .enrolled
            .iter()
            .position(|s| s == subject)
            .ok_or_else(|| StudentError::NotEnrolled {
                id: id.to_string(),
                subject: subject.to_string(),
            })?;

        let mark = u8::try_from(mark)
            .ok()
            .filter(|m| *m <= 100)
            .ok_or(StudentError::InvalidMark(mark))?;

        student.enrolled.remove(enrolled_index);
        student.completed.push(CompletedSubject::new(subject, mark));
        info!(
            "Subject {} marked as completed for {} with mark {}",
            subject, student.name, mark
        );
        self.undo_log.record(UndoAction::Complete {
            id: id.to_string(),
            subject: subject.to_string(),
            mark,
        });
        self.persist()
    }

    /// All students in insertion order
    pub fn list(&self) -> &[Student] {
        &self.students
    }

    pub fn statistics(&self) -> StatisticsResponse {
        compute_statistics(&self.students)
    }

    /// Revert the most recent mutation
    pub fn undo(&mut self) -> Result<UndoOutcome, StudentError> {
        let entry = self.undo_log.pop().ok_or(StudentError::NothingToUndo)?;
        debug!("Undoing action recorded at {}", entry.recorded_at.to_rfc3339());

        let applied = self.apply_inverse(&entry.action);
        if applied {
            info!("Undid: {}", entry.action.describe());
        } else {
            warn!("Nothing to revert for: {}", entry.action.describe());
        }

        self.persist()?;
        Ok(UndoOutcome {
            reverted: entry.action,
            applied,
        })
    }

    /// Number of operations that can currently be undone
    pub fn undo_depth(&self) -> usize {
        self.undo_log.len()
    }

    pub fn len(&self) -> usize {
        self.students.len()
    }

    pub fn is_empty(&self) -> bool {
        self.students.is_empty()
    }

    /// Lines skipped as malformed by the most recent load
    pub fn skipped_on_load(&self) -> &[SkippedLine] {
        &self.skipped_on_load
    }

    pub fn storage(&self) -> &S {
        &self.storage
    }

    fn apply_inverse(&mut self, action: &UndoAction) -> bool {
        match action {
            UndoAction::Add { id } => match self.students.iter().position(|s| &s.id == id) {
                Some(position) => {
                    self.students.remove(position);
                    true
                }
                None => false,
            },
            UndoAction::Remove { snapshot, position } => {
                if self.search(&snapshot.id).is_some() {
                    return false;
                }
                let position = (*position).min(self.students.len());
                self.students.insert(position, snapshot.clone());
                true
            }
            UndoAction::Enroll { id, subject } => {
                let Some(student) = self.students.iter_mut().find(|s| &s.id == id) else {
                    return false;
                };
                match student.enrolled.iter().position(|s| s == subject) {
                    Some(index) => {
                        student.enrolled.remove(index);
                        true
                    }
                    None => false,
                }
            }
            UndoAction::Complete { id, subject, .. } => {
                let Some(student) = self.students.iter_mut().find(|s| &s.id == id) else {
                    return false;
                };
                match student.completed.iter().position(|c| &c.subject == subject) {
                    Some(index) => {
                        let completed = student.completed.remove(index);
                        student.enrolled.push(completed.subject);
                        true
                    }
                    None => false,
                }
            }
        }
    }

    fn position_of(&self, id: &str) -> Result<usize, StudentError> {
        self.students
            .iter()
            .position(|s| s.id == id)
            .ok_or_else(|| {
                warn!("Student ID {} not found", id);
                StudentError::NotFound(id.to_string())
            })
    }

    fn persist(&self) -> Result<(), StudentError> {
        self.storage
            .save_students(&self.students)
            .map_err(StudentError::Persistence)
    }
}

fn validate_new_student(student: &Student) -> Result<(), StudentError> {
    if student.id.is_empty() {
        return Err(StudentError::InvalidRecord("Student ID cannot be empty".to_string()));
    }
    if student.name.is_empty() {
        return Err(StudentError::InvalidRecord("Student name cannot be empty".to_string()));
    }
    if contains_reserved(&student.id) || contains_reserved(&student.name) {
        return Err(StudentError::InvalidRecord(
            "Student ID and name cannot contain ',' ';' or line breaks".to_string(),
        ));
    }

    for (index, subject) in student.enrolled.iter().enumerate() {
        validate_subject(subject)?;
        if student.enrolled[..index].contains(subject) {
            return Err(StudentError::InvalidRecord(format!(
                "Subject {} is listed twice",
                subject
            )));
        }
    }

    for completed in &student.completed {
        validate_subject(&completed.subject)?;
        if completed.mark > 100 {
            return Err(StudentError::InvalidMark(i64::from(completed.mark)));
        }
        if student.is_enrolled(&completed.subject) {
            return Err(StudentError::InvalidRecord(format!(
                "Subject {} cannot be both enrolled and completed",
                completed.subject
            )));
        }
    }

    Ok(())
}

fn validate_subject(subject: &str) -> Result<(), StudentError> {
    if subject.trim().is_empty() {
        return Err(StudentError::InvalidRecord("Subject cannot be empty".to_string()));
    }
    if contains_reserved(subject) {
        return Err(StudentError::InvalidRecord(format!(
            "Subject '{}' cannot contain ',' ';' or line breaks",
            subject
        )));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use anyhow::{anyhow, Result};
    use std::sync::Mutex;

    use crate::storage::LoadReport;

    /// In-memory storage recording every save; can be told to fail saves
    #[derive(Default)]
    struct MemoryStorage {
        initial: Vec<Student>,
        saves: Mutex<Vec<Vec<Student>>>,
        fail_saves: bool,
    }

    impl MemoryStorage {
        fn save_count(&self) -> usize {
            self.saves.lock().unwrap().len()
        }

        fn last_saved(&self) -> Option<Vec<Student>> {
            self.saves.lock().unwrap().last().cloned()
        }
    }

    impl StudentStorage for MemoryStorage {
        fn load_students(&self) -> Result<LoadReport> {
            Ok(LoadReport {
                students: self.initial.clone(),
                skipped: Vec::new(),
            })
        }

        fn save_students(&self, students: &[Student]) -> Result<()> {
            if self.fail_saves {
                return Err(anyhow!("disk full"));
            }
            self.saves.lock().unwrap().push(students.to_vec());
            Ok(())
        }
    }

    fn setup_manager() -> StudentManager<MemoryStorage> {
        StudentManager::new(MemoryStorage::default()).expect("Failed to open manager")
    }

    fn john() -> Student {
        Student::with_enrolled("S001", "John Doe", ["COMP101", "MATH201"])
    }

    #[test]
    fn test_add_then_search() {
        let mut manager = setup_manager();
        manager.add(john()).unwrap();

        assert_eq!(manager.search("S001"), Some(&john()));
        assert_eq!(manager.search("S999"), None);
        assert_eq!(manager.storage().save_count(), 1);
    }

    #[test]
    fn test_add_duplicate_leaves_collection_unchanged() {
        let mut manager = setup_manager();
        manager.add(john()).unwrap();

        let duplicate = Student::new("S001", "Someone Else");
        let err = manager.add(duplicate).unwrap_err();
        assert!(matches!(err, StudentError::DuplicateId(id) if id == "S001"));
        assert_eq!(manager.list(), &[john()]);
        assert_eq!(manager.undo_depth(), 1);
        assert_eq!(manager.storage().save_count(), 1);
    }

    #[test]
    fn test_add_rejects_reserved_characters() {
        let mut manager = setup_manager();

        let err = manager.add(Student::new("S001", "Doe, John")).unwrap_err();
        assert!(matches!(err, StudentError::InvalidRecord(_)));

        let err = manager.add(Student::new("  ", "Nobody")).unwrap_err();
        assert!(matches!(err, StudentError::InvalidRecord(_)));

        let err = manager
            .add(Student::with_enrolled("S002", "Jane", ["A;B"]))
            .unwrap_err();
        assert!(matches!(err, StudentError::InvalidRecord(_)));
        assert!(manager.is_empty());
    }

    #[test]
    fn test_add_rejects_subject_both_enrolled_and_completed() {
        let mut manager = setup_manager();
        let mut student = john();
        student.completed.push(CompletedSubject::new("COMP101", 70));

        let err = manager.add(student).unwrap_err();
        assert!(matches!(err, StudentError::InvalidRecord(_)));
    }

    #[test]
    fn test_add_trims_id_and_name() {
        let mut manager = setup_manager();
        manager.add(Student::new(" S005 ", " Ann Lee ")).unwrap();
        assert_eq!(manager.search("S005").unwrap().name, "Ann Lee");
    }

    #[test]
    fn test_add_trims_subjects() {
        let mut manager = setup_manager();
        let mut student = Student::with_enrolled("S001", "John Doe", [" COMP101", "MATH201 "]);
        student.completed.push(CompletedSubject::new(" PHYS101 ", 85));
        manager.add(student).unwrap();

        let stored = manager.search("S001").unwrap();
        assert_eq!(stored.enrolled, vec!["COMP101", "MATH201"]);
        assert_eq!(stored.mark_for("PHYS101"), Some(85));

        let err = manager.enroll("S001", "COMP101").unwrap_err();
        assert!(matches!(err, StudentError::AlreadyEnrolled { .. }));
        manager.complete("S001", " COMP101", 90).unwrap();
        assert_eq!(manager.search("S001").unwrap().mark_for("COMP101"), Some(90));
    }

    #[test]
    fn test_add_rejects_subject_listed_twice_after_trimming() {
        let mut manager = setup_manager();
        let err = manager
            .add(Student::with_enrolled("S001", "John Doe", ["COMP101", " COMP101"]))
            .unwrap_err();
        assert!(matches!(err, StudentError::InvalidRecord(_)));
        assert!(manager.is_empty());
    }

    #[test]
    fn test_remove_and_not_found() {
        let mut manager = setup_manager();
        manager.add(john()).unwrap();

        let removed = manager.remove("S001").unwrap();
        assert_eq!(removed, john());
        assert!(manager.is_empty());

        let err = manager.remove("S001").unwrap_err();
        assert!(matches!(err, StudentError::NotFound(_)));
    }

    #[test]
    fn test_enroll_rules() {
        let mut manager = setup_manager();
        manager.add(john()).unwrap();

        manager.enroll("S001", "ENG201").unwrap();
        assert_eq!(
            manager.search("S001").unwrap().enrolled,
            vec!["COMP101", "MATH201", "ENG201"]
        );

        let err = manager.enroll("S001", "COMP101").unwrap_err();
        assert!(matches!(err, StudentError::AlreadyEnrolled { .. }));

        manager.complete("S001", "COMP101", 92).unwrap();
        let err = manager.enroll("S001", "COMP101").unwrap_err();
        assert!(matches!(err, StudentError::AlreadyCompleted { .. }));

        let err = manager.enroll("S404", "COMP101").unwrap_err();
        assert!(matches!(err, StudentError::NotFound(_)));
    }

    #[test]
    fn test_complete_requires_enrollment() {
        let mut manager = setup_manager();
        manager.add(john()).unwrap();

        let err = manager.complete("S001", "PHYS101", 80).unwrap_err();
        assert!(matches!(err, StudentError::NotEnrolled { .. }));

        manager.complete("S001", "COMP101", 92).unwrap();
        let err = manager.complete("S001", "COMP101", 92).unwrap_err();
        assert!(matches!(err, StudentError::NotEnrolled { .. }));

        let err = manager.complete("S404", "COMP101", 92).unwrap_err();
        assert!(matches!(err, StudentError::NotFound(id) if id == "S404"));
    }

    #[test]
    fn test_invalid_mark_does_not_mutate() {
        let mut manager = setup_manager();
        manager.add(john()).unwrap();

        for mark in [150, -1, 101] {
            let err = manager.complete("S001", "COMP101", mark).unwrap_err();
            assert!(matches!(err, StudentError::InvalidMark(m) if m == mark));
        }

        let student = manager.search("S001").unwrap();
        assert_eq!(student.enrolled, vec!["COMP101", "MATH201"]);
        assert!(student.completed.is_empty());
        assert_eq!(manager.undo_depth(), 1);
    }

    #[test]
    fn test_complete_boundary_marks() {
        let mut manager = setup_manager();
        manager.add(john()).unwrap();

        manager.complete("S001", "COMP101", 0).unwrap();
        manager.complete("S001", "MATH201", 100).unwrap();
        let student = manager.search("S001").unwrap();
        assert_eq!(student.mark_for("COMP101"), Some(0));
        assert_eq!(student.mark_for("MATH201"), Some(100));
    }

    #[test]
    fn test_enroll_complete_undo_scenario() {
        let mut manager = setup_manager();
        manager.add(john()).unwrap();
        manager.enroll("S001", "ENG201").unwrap();
        manager.complete("S001", "COMP101", 92).unwrap();

        let student = manager.search("S001").unwrap();
        assert_eq!(student.enrolled, vec!["MATH201", "ENG201"]);
        assert_eq!(student.completed, vec![CompletedSubject::new("COMP101", 92)]);

        let outcome = manager.undo().unwrap();
        assert!(outcome.applied);
        assert!(matches!(outcome.reverted, UndoAction::Complete { mark: 92, .. }));

        let student = manager.search("S001").unwrap();
        assert_eq!(student.enrolled, vec!["MATH201", "ENG201", "COMP101"]);
        assert!(student.completed.is_empty());
    }

    #[test]
    fn test_undo_enroll_restores_subjects() {
        let mut manager = setup_manager();
        manager.add(john()).unwrap();
        manager.enroll("S001", "ENG201").unwrap();

        manager.undo().unwrap();
        assert_eq!(manager.search("S001").unwrap().enrolled, vec!["COMP101", "MATH201"]);
    }

    #[test]
    fn test_undo_add_and_remove() {
        let mut manager = setup_manager();
        manager.add(john()).unwrap();
        manager.add(Student::new("S002", "Jane Smith")).unwrap();
        manager.add(Student::new("S003", "Ann Lee")).unwrap();

        manager.remove("S002").unwrap();
        manager.undo().unwrap();
        let ids: Vec<&str> = manager.list().iter().map(|s| s.id.as_str()).collect();
        assert_eq!(ids, vec!["S001", "S002", "S003"]);

        manager.undo().unwrap();
        assert!(manager.search("S003").is_none());
        assert_eq!(manager.len(), 2);
    }

    #[test]
    fn test_undo_on_empty_log() {
        let mut manager = setup_manager();
        assert!(matches!(manager.undo(), Err(StudentError::NothingToUndo)));
    }

    #[test]
    fn test_undo_is_not_undoable() {
        let mut manager = setup_manager();
        manager.add(john()).unwrap();
        manager.undo().unwrap();

        assert_eq!(manager.undo_depth(), 0);
        assert!(matches!(manager.undo(), Err(StudentError::NothingToUndo)));
        assert!(manager.is_empty());
    }

    #[test]
    fn test_undo_log_keeps_ten_most_recent() {
        let mut manager = setup_manager();
        for i in 0..11 {
            manager.add(Student::new(format!("S{:03}", i), "Student")).unwrap();
        }
        assert_eq!(manager.undo_depth(), 10);

        for _ in 0..10 {
            manager.undo().unwrap();
        }
        assert!(matches!(manager.undo(), Err(StudentError::NothingToUndo)));
        // The first add fell off the log and is still present
        let ids: Vec<&str> = manager.list().iter().map(|s| s.id.as_str()).collect();
        assert_eq!(ids, vec!["S000"]);
    }

    #[test]
    fn test_every_mutation_persists_full_snapshot() {
        let mut manager = setup_manager();
        manager.add(john()).unwrap();
        manager.enroll("S001", "ENG201").unwrap();
        manager.undo().unwrap();

        assert_eq!(manager.storage().save_count(), 3);
        assert_eq!(manager.storage().last_saved(), Some(vec![john()]));
    }

    #[test]
    fn test_save_failure_keeps_mutation() {
        let storage = MemoryStorage {
            fail_saves: true,
            ..Default::default()
        };
        let mut manager = StudentManager::new(storage).unwrap();

        let err = manager.add(john()).unwrap_err();
        assert!(matches!(err, StudentError::Persistence(_)));
        assert!(err.to_string().contains("disk full"));
        assert_eq!(manager.search("S001"), Some(&john()));
        assert_eq!(manager.undo_depth(), 1);
    }

    #[test]
    fn test_statistics() {
        let mut manager = setup_manager();
        manager.add(john()).unwrap();
        manager
            .add(Student::with_enrolled("S002", "Jane Smith", ["COMP101"]))
            .unwrap();

        let stats = manager.statistics();
        assert_eq!(stats.total_students, 2);
        assert_eq!(stats.subjects_enrollment_count["COMP101"], 2);
    }

    #[test]
    fn test_loads_initial_records_and_reload_clears_undo() {
        let storage = MemoryStorage {
            initial: vec![john()],
            ..Default::default()
        };
        let mut manager = StudentManager::new(storage).unwrap();
        assert_eq!(manager.len(), 1);

        manager.enroll("S001", "ENG201").unwrap();
        assert_eq!(manager.reload().unwrap(), 1);
        assert_eq!(manager.undo_depth(), 0);
        assert_eq!(manager.search("S001"), Some(&john()));
    }
}
