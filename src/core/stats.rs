use crate::core::mapper;
use crate::core::pipeline;
use crate::domain::filter::Filter;
use crate::domain::model::{
    IntervalBucket, MarkBounds, Student, StudentAverage, StudentDoc, StudentSubjectMark,
};
use crate::domain::ports::{FactStore, STUDENTS};
use crate::domain::stage::SortDirection;
use crate::utils::error::{Result, StatsError};
use std::sync::Arc;

/// Read-only statistics over the students collection.
pub struct StatisticsEngine<S: FactStore> {
    store: Arc<S>,
    bounds: MarkBounds,
}

impl<S: FactStore> StatisticsEngine<S> {
    pub fn new(store: Arc<S>, bounds: MarkBounds) -> Self {
        Self { store, bounds }
    }

    /// Mean over every recorded mark, `None` when nothing has been recorded.
    pub async fn class_average(&self) -> Result<Option<f64>> {
        let rows = self
            .store
            .run_aggregation(STUDENTS, &pipeline::class_average())
            .await?;
        rows.first().map(mapper::class_average).transpose()
    }

    /// Students averaging strictly above the class average, best first.
    pub async fn best_students(&self) -> Result<Vec<StudentAverage>> {
        let Some(class_average) = self.class_average().await? else {
            return Ok(Vec::new());
        };
        tracing::debug!(class_average, "computing students above class average");

        let mut stages = pipeline::average_per_student(SortDirection::Descending);
        stages.push(pipeline::above_average(class_average));
        let rows = self.store.run_aggregation(STUDENTS, &stages).await?;
        mapper::map_all(&rows, mapper::student_average)
    }

    pub async fn top_best_students(&self, n: i64) -> Result<Vec<StudentAverage>> {
        let mut stages = pipeline::average_per_student(SortDirection::Descending);
        stages.push(pipeline::limit(n));
        let rows = self.store.run_aggregation(STUDENTS, &stages).await?;
        mapper::map_all(&rows, mapper::student_average)
    }

    /// Best `n` students by their average in `subject` (exact, case-sensitive match).
    pub async fn top_best_students_by_subject(&self, n: i64, subject: &str) -> Result<Vec<Student>> {
        let stages = pipeline::average_per_student_subject(subject, n);
        let rows = self.store.run_aggregation(STUDENTS, &stages).await?;
        mapper::map_all(&rows, mapper::student_key)
    }

    /// Every recorded mark of the `n` lowest-averaging students.
    ///
    /// Students are matched back by name, so a namesake of a worst student
    /// contributes its marks too.
    pub async fn worst_students(&self, n: i64) -> Result<Vec<StudentSubjectMark>> {
        let mut stages = pipeline::average_per_student(SortDirection::Ascending);
        stages.push(pipeline::limit(n));
        let rows = self.store.run_aggregation(STUDENTS, &stages).await?;
        let names = mapper::map_all(&rows, mapper::student_name)?;
        if names.is_empty() {
            return Ok(Vec::new());
        }

        let students = self.students_by_names(&names).await?;
        Ok(students
            .iter()
            .flat_map(|student| mapper::subject_marks(student, None))
            .collect())
    }

    /// Name-based join back to full student documents.
    async fn students_by_names(&self, names: &[String]) -> Result<Vec<StudentDoc>> {
        self.store
            .find_by_name_set(STUDENTS, names)
            .await?
            .into_iter()
            .map(mapper::student_doc)
            .collect()
    }

    /// Number of buckets `interval` splits the mark bounds into, truncated.
    pub fn bucket_count(&self, interval: i64) -> Result<usize> {
        if interval <= 0 {
            return Err(StatsError::invalid_argument(format!(
                "interval must be positive, got {}",
                interval
            )));
        }
        let span = self.bounds.max - self.bounds.min;
        let buckets = span / interval;
        if span % interval != 0 || buckets == 0 {
            tracing::warn!(
                interval,
                span,
                buckets,
                "interval does not divide the mark range; bucket count truncated"
            );
        }
        usize::try_from(buckets).map_err(|_| {
            StatsError::invalid_argument(format!("mark bounds {:?} are inverted", self.bounds))
        })
    }

    /// Mark distribution over store-chosen, population-balanced buckets.
    pub async fn mark_distribution(&self, interval: i64) -> Result<Vec<IntervalBucket>> {
        let buckets = self.bucket_count(interval)?;
        let rows = self
            .store
            .run_aggregation(STUDENTS, &pipeline::distribution(buckets))
            .await?;
        mapper::map_all(&rows, mapper::interval_bucket)
    }

    /// Marks in `subject` of the first student named `name`.
    pub async fn marks_by_student_subject(
        &self,
        name: &str,
        subject: &str,
    ) -> Result<Vec<StudentSubjectMark>> {
        let filter = Filter::new().eq(pipeline::NAME, name);
        let Some(doc) = self
            .store
            .find_by_predicate(STUDENTS, &filter)
            .await?
            .into_iter()
            .next()
        else {
            return Ok(Vec::new());
        };
        let student = mapper::student_doc(doc)?;
        Ok(mapper::subject_marks(&student, Some(subject)))
    }

    /// Students matching a raw filter document.
    pub async fn query_students(&self, query: &str) -> Result<Vec<StudentDoc>> {
        let filter = Filter::parse(query)?;
        self.store
            .find_by_predicate(STUDENTS, &filter)
            .await?
            .into_iter()
            .map(mapper::student_doc)
            .collect()
    }
}
