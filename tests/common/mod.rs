#![allow(dead_code)]

use std::sync::Arc;
use students_stats::{Mark, MarkBounds, MemoryStore, Student, StudentsService, Subject};

pub fn service() -> (Arc<MemoryStore>, StudentsService<MemoryStore>) {
    let store = Arc::new(MemoryStore::new());
    let service = StudentsService::new(store.clone(), MarkBounds::default());
    (store, service)
}

/// Subjects 1=Math, 2=Art; each student gets its marks in order, alternating subjects.
pub async fn seed<S: students_stats::domain::ports::FactStore>(
    service: &StudentsService<S>,
    students: &[(i64, &str, &[i64])],
) {
    service.add_subject(Subject::new(1, "Math")).await.unwrap();
    service.add_subject(Subject::new(2, "Art")).await.unwrap();
    for (stid, name, marks) in students {
        service.add_student(Student::new(*stid, *name)).await.unwrap();
        for (i, mark) in marks.iter().enumerate() {
            let suid = if i % 2 == 0 { 1 } else { 2 };
            let recorded = service
                .add_mark(Mark::new(*stid, suid, *mark))
                .await
                .unwrap();
            assert!(recorded.is_some());
        }
    }
}
