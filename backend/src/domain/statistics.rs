use shared::StatisticsResponse;

use super::models::Student;

/// Derive enrollment and completion counts from the current collection.
/// Nothing is cached; callers get a fresh view each time.
pub fn compute_statistics(students: &[Student]) -> StatisticsResponse {
    let mut stats = StatisticsResponse {
        total_students: students.len(),
        ..Default::default()
    };

    for student in students {
        for subject in &student.enrolled {
            *stats
                .subjects_enrollment_count
                .entry(subject.clone())
                .or_insert(0) += 1;
        }
        stats
            .students_by_completed_count
            .insert(student.display_name(), student.completed.len());
    }

    stats
}
