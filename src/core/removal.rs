use crate::core::mapper;
use crate::core::pipeline;
use crate::domain::model::Student;
use crate::domain::ports::{FactStore, StoreTransaction, STUDENTS};
use crate::utils::error::{Result, StatsError};
use std::sync::Arc;

/// Runs the batch removal of underperforming students as one transaction.
pub struct RemovalCoordinator<S: FactStore> {
    store: Arc<S>,
}

impl<S: FactStore> RemovalCoordinator<S> {
    pub fn new(store: Arc<S>) -> Self {
        Self { store }
    }

    /// Remove every student averaging below `avg_mark_ceiling` with fewer than
    /// `mark_count_ceiling` marks, returning the removed students.
    ///
    /// Either the whole candidate set is deleted or nothing is.
    pub async fn remove_underperformers(
        &self,
        avg_mark_ceiling: i64,
        mark_count_ceiling: i64,
    ) -> Result<Vec<Student>> {
        let mut tx = self.store.begin().await?;
        match Self::remove_in(tx.as_mut(), avg_mark_ceiling, mark_count_ceiling).await {
            Ok(removed) => {
                tx.commit().await?;
                tracing::info!(removed = removed.len(), "removed underperforming students");
                Ok(removed)
            }
            Err(e) => {
                if let Err(rollback_err) = tx.rollback().await {
                    tracing::error!("rollback after failed removal also failed: {}", rollback_err);
                }
                tracing::warn!("student removal aborted: {}", e);
                Err(e)
            }
        }
    }

    async fn remove_in(
        tx: &mut dyn StoreTransaction,
        avg_mark_ceiling: i64,
        mark_count_ceiling: i64,
    ) -> Result<Vec<Student>> {
        let stages = pipeline::threshold_candidates(avg_mark_ceiling, mark_count_ceiling);
        let rows = tx.run_aggregation(STUDENTS, &stages).await?;
        let candidates = mapper::map_all(&rows, mapper::student_key)?;
        if candidates.is_empty() {
            return Ok(candidates);
        }

        let keys: Vec<i64> = candidates.iter().map(|s| s.stid).collect();
        let deleted = tx.delete_by_keys(STUDENTS, &keys).await?;
        if deleted != keys.len() as u64 {
            return Err(StatsError::transaction(format!(
                "expected to delete {} students, deleted {}",
                keys.len(),
                deleted
            )));
        }
        Ok(candidates)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::memory::MemoryStore;
    use serde_json::json;

    #[test]
    fn test_removal_with_no_students_is_empty() {
        let coordinator = RemovalCoordinator::new(Arc::new(MemoryStore::new()));
        let removed = tokio_test::block_on(coordinator.remove_underperformers(60, 3)).unwrap();
        assert!(removed.is_empty());
    }

    #[tokio::test]
    async fn test_removal_bounds_are_strict() {
        let store = Arc::new(MemoryStore::new());
        let marks = json!([{"subject": "Math", "mark": 60}, {"subject": "Art", "mark": 60}]);
        store
            .insert(STUDENTS, 1, json!({"stid": 1, "name": "Ann", "marks": marks}))
            .await
            .unwrap();
        let coordinator = RemovalCoordinator::new(store.clone());

        // average equals the ceiling
        assert!(coordinator.remove_underperformers(60, 3).await.unwrap().is_empty());
        // mark count equals the ceiling
        assert!(coordinator.remove_underperformers(61, 2).await.unwrap().is_empty());

        let removed = coordinator.remove_underperformers(61, 3).await.unwrap();
        assert_eq!(removed, vec![Student::new(1, "Ann")]);
        assert_eq!(store.count(STUDENTS).await, 0);
    }
}
