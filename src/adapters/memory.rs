use crate::adapters::aggregate;
use crate::domain::filter::Filter;
use crate::domain::ports::{FactStore, StoreTransaction};
use crate::domain::stage::Stage;
use crate::utils::error::{Result, StatsError};
use async_trait::async_trait;
use serde_json::Value;
use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;
use tokio::sync::{OwnedRwLockWriteGuard, RwLock};

type Collection = BTreeMap<i64, Value>;

#[derive(Debug, Clone, Default)]
struct Collections {
    data: HashMap<String, Collection>,
}

impl Collections {
    fn documents(&self, collection: &str) -> Vec<Value> {
        self.data
            .get(collection)
            .map(|docs| docs.values().cloned().collect())
            .unwrap_or_default()
    }

    fn delete(&mut self, collection: &str, keys: &[i64]) -> u64 {
        let Some(docs) = self.data.get_mut(collection) else {
            return 0;
        };
        keys.iter().filter(|key| docs.remove(*key).is_some()).count() as u64
    }
}

/// Fact store keeping every collection in memory.
///
/// Clones share the same data. A transaction holds the write lock from
/// `begin` until it is committed, rolled back or dropped.
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    inner: Arc<RwLock<Collections>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn count(&self, collection: &str) -> usize {
        let guard = self.inner.read().await;
        guard.data.get(collection).map_or(0, |docs| docs.len())
    }
}

#[async_trait]
impl FactStore for MemoryStore {
    async fn insert(&self, collection: &str, key: i64, document: Value) -> Result<()> {
        if !document.is_object() {
            return Err(StatsError::store(format!(
                "document for key {} in '{}' is not an object",
                key, collection
            )));
        }
        let mut guard = self.inner.write().await;
        guard
            .data
            .entry(collection.to_string())
            .or_default()
            .insert(key, document);
        Ok(())
    }

    async fn find_by_key(&self, collection: &str, key: i64) -> Result<Option<Value>> {
        let guard = self.inner.read().await;
        Ok(guard
            .data
            .get(collection)
            .and_then(|docs| docs.get(&key))
            .cloned())
    }

    async fn find_by_predicate(&self, collection: &str, filter: &Filter) -> Result<Vec<Value>> {
        let guard = self.inner.read().await;
        Ok(guard
            .data
            .get(collection)
            .map(|docs| docs.values().filter(|d| filter.matches(d)).cloned().collect())
            .unwrap_or_default())
    }

    async fn push(&self, collection: &str, key: i64, field: &str, value: Value) -> Result<bool> {
        let mut guard = self.inner.write().await;
        let Some(doc) = guard.data.get_mut(collection).and_then(|docs| docs.get_mut(&key)) else {
            return Ok(false);
        };
        let Some(obj) = doc.as_object_mut() else {
            return Err(StatsError::store(format!("document {} is not an object", key)));
        };
        match obj
            .entry(field.to_string())
            .or_insert_with(|| Value::Array(Vec::new()))
        {
            Value::Array(items) => {
                items.push(value);
                Ok(true)
            }
            _ => Err(StatsError::store(format!(
                "field '{}' of document {} is not an array",
                field, key
            ))),
        }
    }

    async fn delete_by_keys(&self, collection: &str, keys: &[i64]) -> Result<u64> {
        let mut guard = self.inner.write().await;
        Ok(guard.delete(collection, keys))
    }

    async fn run_aggregation(&self, collection: &str, stages: &[Stage]) -> Result<Vec<Value>> {
        let documents = self.inner.read().await.documents(collection);
        aggregate::execute(documents, stages)
    }

    async fn begin(&self) -> Result<Box<dyn StoreTransaction>> {
        let guard = self.inner.clone().write_owned().await;
        let staged = Collections::clone(&guard);
        tracing::debug!("transaction started");
        Ok(Box::new(MemoryTransaction { guard, staged }))
    }
}

/// Works on a staged copy of the data; `commit` swaps it in.
pub struct MemoryTransaction {
    guard: OwnedRwLockWriteGuard<Collections>,
    staged: Collections,
}

#[async_trait]
impl StoreTransaction for MemoryTransaction {
    async fn run_aggregation(&mut self, collection: &str, stages: &[Stage]) -> Result<Vec<Value>> {
        aggregate::execute(self.staged.documents(collection), stages)
    }

    async fn delete_by_keys(&mut self, collection: &str, keys: &[i64]) -> Result<u64> {
        Ok(self.staged.delete(collection, keys))
    }

    async fn commit(self: Box<Self>) -> Result<()> {
        let MemoryTransaction { mut guard, staged } = *self;
        *guard = staged;
        tracing::debug!("transaction committed");
        Ok(())
    }

    async fn rollback(self: Box<Self>) -> Result<()> {
        tracing::debug!("transaction rolled back");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    async fn seeded() -> MemoryStore {
        let store = MemoryStore::new();
        for (stid, name) in [(1, "Ann"), (2, "Bob"), (3, "Ann")] {
            store
                .insert("students", stid, json!({"stid": stid, "name": name, "marks": []}))
                .await
                .unwrap();
        }
        store
    }

    #[tokio::test]
    async fn test_insert_replaces_same_key() {
        let store = seeded().await;
        store
            .insert("students", 2, json!({"stid": 2, "name": "Rob"}))
            .await
            .unwrap();
        let doc = store.find_by_key("students", 2).await.unwrap().unwrap();
        assert_eq!(doc["name"], "Rob");
        assert_eq!(store.count("students").await, 3);
    }

    #[tokio::test]
    async fn test_insert_rejects_non_objects() {
        let store = MemoryStore::new();
        assert!(store.insert("students", 1, json!([1])).await.is_err());
    }

    #[tokio::test]
    async fn test_find_by_name_set_returns_every_match_in_key_order() {
        let store = seeded().await;
        let docs = store
            .find_by_name_set("students", &["Ann".to_string()])
            .await
            .unwrap();
        let keys: Vec<i64> = docs.iter().map(|d| d["stid"].as_i64().unwrap()).collect();
        assert_eq!(keys, vec![1, 3]);
    }

    #[tokio::test]
    async fn test_push_appends_and_reports_missing_documents() {
        let store = seeded().await;
        let mark = json!({"subject": "Math", "mark": 90});
        assert!(store.push("students", 1, "marks", mark.clone()).await.unwrap());
        assert!(!store.push("students", 9, "marks", mark).await.unwrap());
        let doc = store.find_by_key("students", 1).await.unwrap().unwrap();
        assert_eq!(doc["marks"].as_array().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_delete_by_keys_counts_removed_documents() {
        let store = seeded().await;
        let removed = store.delete_by_keys("students", &[1, 7]).await.unwrap();
        assert_eq!(removed, 1);
        assert_eq!(store.count("students").await, 2);
    }

    #[tokio::test]
    async fn test_dropped_transaction_discards_changes() {
        let store = seeded().await;
        {
            let mut tx = store.begin().await.unwrap();
            assert_eq!(tx.delete_by_keys("students", &[1, 2]).await.unwrap(), 2);
        }
        assert_eq!(store.count("students").await, 3);

        let mut tx = store.begin().await.unwrap();
        tx.delete_by_keys("students", &[1]).await.unwrap();
        tx.commit().await.unwrap();
        assert_eq!(store.count("students").await, 2);
    }

    #[tokio::test]
    async fn test_writes_wait_for_open_transaction() {
        let store = seeded().await;
        let mut tx = store.begin().await.unwrap();
        tx.delete_by_keys("students", &[2]).await.unwrap();

        let writer = {
            let store = store.clone();
            tokio::spawn(async move {
                store
                    .push("students", 2, "marks", json!({"subject": "Art", "mark": 99}))
                    .await
                    .unwrap()
            })
        };
        tokio::task::yield_now().await;
        assert!(!writer.is_finished());

        tx.commit().await.unwrap();
        // the student was gone by the time the write ran
        assert!(!writer.await.unwrap());
    }
}
