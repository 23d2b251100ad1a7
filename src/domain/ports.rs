use crate::domain::filter::Filter;
use crate::domain::model::MarkBounds;
use crate::domain::stage::Stage;
use crate::utils::error::Result;
use async_trait::async_trait;
use serde_json::Value;

pub const STUDENTS: &str = "students";
pub const SUBJECTS: &str = "subjects";

/// Document store holding keyed JSON documents in named collections.
#[async_trait]
pub trait FactStore: Send + Sync {
    /// Insert a document, replacing any document stored under the same key.
    async fn insert(&self, collection: &str, key: i64, document: Value) -> Result<()>;

    async fn find_by_key(&self, collection: &str, key: i64) -> Result<Option<Value>>;

    /// Matching documents in ascending key order.
    async fn find_by_predicate(&self, collection: &str, filter: &Filter) -> Result<Vec<Value>>;

    async fn find_by_name_set(&self, collection: &str, names: &[String]) -> Result<Vec<Value>> {
        let filter = Filter::new().in_set("name", names.iter().cloned());
        self.find_by_predicate(collection, &filter).await
    }

    /// Append `value` to the array at `field`. Returns false when no document has `key`.
    async fn push(&self, collection: &str, key: i64, field: &str, value: Value) -> Result<bool>;

    async fn delete_by_keys(&self, collection: &str, keys: &[i64]) -> Result<u64>;

    async fn run_aggregation(&self, collection: &str, stages: &[Stage]) -> Result<Vec<Value>>;

    /// Open a unit of work. No other write becomes visible while it is open.
    async fn begin(&self) -> Result<Box<dyn StoreTransaction>>;
}

/// Scoped unit of work. Dropping it without `commit` discards its changes.
#[async_trait]
pub trait StoreTransaction: Send {
    async fn run_aggregation(&mut self, collection: &str, stages: &[Stage]) -> Result<Vec<Value>>;

    async fn delete_by_keys(&mut self, collection: &str, keys: &[i64]) -> Result<u64>;

    async fn commit(self: Box<Self>) -> Result<()>;

    async fn rollback(self: Box<Self>) -> Result<()>;
}

pub trait ConfigProvider: Send + Sync {
    fn mark_bounds(&self) -> MarkBounds;
    fn data_path(&self) -> Option<&str>;
}
