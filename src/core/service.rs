use crate::core::removal::RemovalCoordinator;
use crate::core::stats::StatisticsEngine;
use crate::domain::filter::Filter;
use crate::domain::model::{
    Dataset, IntervalBucket, Mark, MarkBounds, Student, StudentAverage, StudentDoc,
    StudentSubjectMark, Subject, SubjectDoc, SubjectMark,
};
use crate::domain::ports::{FactStore, STUDENTS, SUBJECTS};
use crate::utils::error::Result;
use std::sync::Arc;

pub const STRUCTURED_QUERY_UNSUPPORTED: &str = "Structured query language is not supported";

/// Operations exposed to callers: writes, statistics and removal.
pub struct StudentsService<S: FactStore> {
    store: Arc<S>,
    stats: StatisticsEngine<S>,
    removal: RemovalCoordinator<S>,
}

impl<S: FactStore> StudentsService<S> {
    pub fn new(store: Arc<S>, bounds: MarkBounds) -> Self {
        Self {
            stats: StatisticsEngine::new(store.clone(), bounds),
            removal: RemovalCoordinator::new(store.clone()),
            store,
        }
    }

    pub fn stats(&self) -> &StatisticsEngine<S> {
        &self.stats
    }

    pub async fn add_student(&self, student: Student) -> Result<()> {
        let doc = StudentDoc::new(student.stid, student.name);
        tracing::debug!(stid = doc.stid, "adding student");
        self.store
            .insert(STUDENTS, doc.stid, serde_json::to_value(&doc)?)
            .await
    }

    pub async fn add_subject(&self, subject: Subject) -> Result<()> {
        let doc = SubjectDoc {
            suid: subject.suid,
            subject: subject.subject,
        };
        tracing::debug!(suid = doc.suid, "adding subject");
        self.store
            .insert(SUBJECTS, doc.suid, serde_json::to_value(&doc)?)
            .await
    }

    /// Store a student document as-is, marks included.
    pub async fn import_student(&self, student: StudentDoc) -> Result<()> {
        self.store
            .insert(STUDENTS, student.stid, serde_json::to_value(&student)?)
            .await
    }

    /// Record a mark. `None` when the student or the subject does not exist.
    ///
    /// The subject's current name is copied into the mark.
    pub async fn add_mark(&self, mark: Mark) -> Result<Option<Mark>> {
        if self.store.find_by_key(STUDENTS, mark.stid).await?.is_none() {
            tracing::debug!(stid = mark.stid, "mark skipped: no such student");
            return Ok(None);
        }
        let Some(subject) = self.store.find_by_key(SUBJECTS, mark.suid).await? else {
            tracing::debug!(suid = mark.suid, "mark skipped: no such subject");
            return Ok(None);
        };
        let subject: SubjectDoc = serde_json::from_value(subject)?;
        let entry = SubjectMark {
            subject: subject.subject,
            mark: mark.mark,
        };

        let appended = self
            .store
            .push(STUDENTS, mark.stid, "marks", serde_json::to_value(&entry)?)
            .await?;
        Ok(appended.then_some(mark))
    }

    pub async fn best_students(&self) -> Result<Vec<StudentAverage>> {
        self.stats.best_students().await
    }

    pub async fn top_best_students(&self, n: i64) -> Result<Vec<StudentAverage>> {
        self.stats.top_best_students(n).await
    }

    pub async fn top_best_students_by_subject(&self, n: i64, subject: &str) -> Result<Vec<Student>> {
        self.stats.top_best_students_by_subject(n, subject).await
    }

    pub async fn worst_students(&self, n: i64) -> Result<Vec<StudentSubjectMark>> {
        self.stats.worst_students(n).await
    }

    pub async fn mark_distribution(&self, interval: i64) -> Result<Vec<IntervalBucket>> {
        self.stats.mark_distribution(interval).await
    }

    pub async fn marks_by_student_subject(
        &self,
        name: &str,
        subject: &str,
    ) -> Result<Vec<StudentSubjectMark>> {
        self.stats.marks_by_student_subject(name, subject).await
    }

    /// Students matching a raw filter document, one line each.
    ///
    /// Never fails: any error becomes the single line of the result.
    pub async fn raw_query(&self, query: &str) -> Vec<String> {
        match self.stats.query_students(query).await {
            Ok(students) => students.iter().map(ToString::to_string).collect(),
            Err(e) => {
                tracing::warn!("raw query failed: {}", e);
                vec![e.to_string()]
            }
        }
    }

    pub fn structured_query(&self, _query: &str) -> Vec<String> {
        vec![STRUCTURED_QUERY_UNSUPPORTED.to_string()]
    }

    pub async fn remove_underperformers(
        &self,
        avg_mark_ceiling: i64,
        mark_count_ceiling: i64,
    ) -> Result<Vec<Student>> {
        self.removal
            .remove_underperformers(avg_mark_ceiling, mark_count_ceiling)
            .await
    }

    /// Load a dataset: subjects, then students, then loose marks.
    ///
    /// Marks referencing a missing student or subject are skipped; the count
    /// of recorded marks is returned.
    pub async fn load(&self, dataset: Dataset) -> Result<usize> {
        for subject in dataset.subjects {
            self.add_subject(subject).await?;
        }
        for student in dataset.students {
            self.import_student(student).await?;
        }
        let mut recorded = 0;
        for mark in dataset.marks {
            let (stid, suid) = (mark.stid, mark.suid);
            match self.add_mark(mark).await? {
                Some(_) => recorded += 1,
                None => tracing::warn!(stid, suid, "skipping mark for unknown student or subject"),
            }
        }
        Ok(recorded)
    }

    pub async fn export(&self) -> Result<Dataset> {
        let everything = Filter::new();
        let subjects = self
            .store
            .find_by_predicate(SUBJECTS, &everything)
            .await?
            .into_iter()
            .map(|doc| {
                let doc: SubjectDoc = serde_json::from_value(doc)?;
                Ok(Subject::new(doc.suid, doc.subject))
            })
            .collect::<Result<Vec<_>>>()?;
        let students = self
            .store
            .find_by_predicate(STUDENTS, &everything)
            .await?
            .into_iter()
            .map(|doc| Ok(serde_json::from_value(doc)?))
            .collect::<Result<Vec<StudentDoc>>>()?;
        Ok(Dataset {
            subjects,
            students,
            marks: Vec::new(),
        })
    }
}
