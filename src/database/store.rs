use async_trait::async_trait;
use serde::Serialize;
use serde_json::Value;

use super::manager::DatabaseError;
use super::update::Update;
use crate::filter::Filter;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct InsertOneResult {
    pub acknowledged: bool,
    pub inserted_id: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateResult {
    pub acknowledged: bool,
    pub matched_count: u64,
    pub modified_count: u64,
    pub upserted_count: u64,
    pub upserted_id: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DeleteResult {
    pub acknowledged: bool,
    pub deleted_count: u64,
}

impl InsertOneResult {
    pub fn new(inserted_id: impl Into<String>) -> Self {
        Self { acknowledged: true, inserted_id: inserted_id.into() }
    }
}

impl UpdateResult {
    pub fn updated(matched_count: u64, modified_count: u64) -> Self {
        Self { acknowledged: true, matched_count, modified_count, ..Default::default() }
    }

    pub fn upserted(id: impl Into<String>) -> Self {
        Self { acknowledged: true, upserted_count: 1, upserted_id: Some(id.into()), ..Default::default() }
    }
}

impl DeleteResult {
    pub fn new(deleted_count: u64) -> Self {
        Self { acknowledged: true, deleted_count }
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct UpdateOptions {
    /// Insert a document built from the filter's equality fields when nothing matches
    pub upsert: bool,
}

impl UpdateOptions {
    pub fn upsert() -> Self {
        Self { upsert: true }
    }
}

/// Document collections addressed by name. Documents are JSON objects; the
/// store assigns every inserted document a string `_id`.
#[async_trait]
pub trait DocumentStore: Send + Sync {
    async fn find(&self, collection: &str, filter: &Filter) -> Result<Vec<Value>, DatabaseError>;

    async fn find_one(&self, collection: &str, filter: &Filter) -> Result<Option<Value>, DatabaseError> {
        let mut first = filter.clone();
        first.limit(1, filter.offset_value())?;
        Ok(self.find(collection, &first).await?.into_iter().next())
    }

    async fn insert_one(&self, collection: &str, document: Value) -> Result<InsertOneResult, DatabaseError>;

    async fn update_one(
        &self,
        collection: &str,
        filter: &Filter,
        update: &Update,
        options: UpdateOptions,
    ) -> Result<UpdateResult, DatabaseError>;

    async fn update_many(&self, collection: &str, filter: &Filter, update: &Update) -> Result<UpdateResult, DatabaseError>;

    async fn delete_one(&self, collection: &str, filter: &Filter) -> Result<DeleteResult, DatabaseError>;

    async fn delete_many(&self, collection: &str, filter: &Filter) -> Result<DeleteResult, DatabaseError>;

    async fn count(&self, collection: &str, filter: &Filter) -> Result<u64, DatabaseError>;

    async fn ping(&self) -> Result<(), DatabaseError>;
}
