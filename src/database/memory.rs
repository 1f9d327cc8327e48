use std::collections::HashMap;

use async_trait::async_trait;
use serde_json::Value;
use tokio::sync::RwLock;
use uuid::Uuid;

use super::document::{check_unique, into_body, validate_collection, with_id};
use super::manager::DatabaseError;
use super::store::{DeleteResult, DocumentStore, InsertOneResult, UpdateOptions, UpdateResult};
use super::update::Update;
use crate::filter::{filter_order::FilterOrder, Filter};

/// In-process document store used by `--memory` runs and tests.
///
/// Collections keep insertion order, which stands in for the `seq` tiebreak
/// the Postgres store sorts by.
#[derive(Default)]
pub struct MemoryDocumentStore {
    collections: RwLock<HashMap<String, Vec<Value>>>,
}

impl MemoryDocumentStore {
    pub fn new() -> Self {
        Self::default()
    }

    async fn update_matching(
        &self,
        collection: &str,
        filter: &Filter,
        update: &Update,
        single: bool,
    ) -> Result<(u64, u64), DatabaseError> {
        validate_collection(collection)?;

        let mut collections = self.collections.write().await;
        let docs = collections.entry(collection.to_string()).or_default();

        let (mut matched, mut modified) = (0, 0);
        for index in 0..docs.len() {
            if !filter.matches(&docs[index]) {
                continue;
            }
            matched += 1;
            if let Value::Object(body) = &docs[index] {
                let mut body = body.clone();
                if update.apply(&mut body)? {
                    let updated = Value::Object(body);
                    check_unique(collection, docs.as_slice(), &updated, Some(index))?;
                    docs[index] = updated;
                    modified += 1;
                }
            }
            if single {
                break;
            }
        }
        Ok((matched, modified))
    }
}

#[async_trait]
impl DocumentStore for MemoryDocumentStore {
    async fn find(&self, collection: &str, filter: &Filter) -> Result<Vec<Value>, DatabaseError> {
        validate_collection(collection)?;

        let collections = self.collections.read().await;
        let mut matched: Vec<Value> = collections
            .get(collection)
            .map(|docs| docs.iter().filter(|d| filter.matches(d)).cloned().collect())
            .unwrap_or_default();
        drop(collections);

        if !filter.order_info().is_empty() {
            // Stable, so ties keep insertion order
            matched.sort_by(|a, b| FilterOrder::compare(filter.order_info(), a, b));
        }

        let offset = filter.offset_value().unwrap_or(0).max(0) as usize;
        let page = matched.into_iter().skip(offset);
        let page: Vec<Value> = match filter.limit_value() {
            Some(limit) => page.take(limit.max(0) as usize).collect(),
            None => page.collect(),
        };

        Ok(page.into_iter().map(|doc| filter.project(doc)).collect())
    }

    async fn insert_one(&self, collection: &str, document: Value) -> Result<InsertOneResult, DatabaseError> {
        validate_collection(collection)?;
        let body = into_body(document)?;
        let id = Uuid::new_v4().to_string();
        let document = with_id(body, &id);

        let mut collections = self.collections.write().await;
        let docs = collections.entry(collection.to_string()).or_default();
        check_unique(collection, docs.as_slice(), &document, None)?;
        docs.push(document);

        Ok(InsertOneResult::new(id))
    }

    async fn update_one(
        &self,
        collection: &str,
        filter: &Filter,
        update: &Update,
        options: UpdateOptions,
    ) -> Result<UpdateResult, DatabaseError> {
        let (matched, modified) = self.update_matching(collection, filter, update, true).await?;
        if matched == 0 && options.upsert {
            let (id, body) = update.upsert_document(filter)?;
            let id = id.to_string();
            let document = with_id(body, &id);
            let mut collections = self.collections.write().await;
            let docs = collections.entry(collection.to_string()).or_default();
            check_unique(collection, docs.as_slice(), &document, None)?;
            docs.push(document);
            return Ok(UpdateResult::upserted(id));
        }
        Ok(UpdateResult::updated(matched, modified))
    }

    async fn update_many(&self, collection: &str, filter: &Filter, update: &Update) -> Result<UpdateResult, DatabaseError> {
        let (matched, modified) = self.update_matching(collection, filter, update, false).await?;
        Ok(UpdateResult::updated(matched, modified))
    }

    async fn delete_one(&self, collection: &str, filter: &Filter) -> Result<DeleteResult, DatabaseError> {
        validate_collection(collection)?;

        let mut collections = self.collections.write().await;
        let Some(docs) = collections.get_mut(collection) else {
            return Ok(DeleteResult::new(0));
        };
        match docs.iter().position(|d| filter.matches(d)) {
            Some(index) => {
                docs.remove(index);
                Ok(DeleteResult::new(1))
            }
            None => Ok(DeleteResult::new(0)),
        }
    }

    async fn delete_many(&self, collection: &str, filter: &Filter) -> Result<DeleteResult, DatabaseError> {
        validate_collection(collection)?;

        let mut collections = self.collections.write().await;
        let Some(docs) = collections.get_mut(collection) else {
            return Ok(DeleteResult::new(0));
        };
        let before = docs.len();
        docs.retain(|d| !filter.matches(d));
        Ok(DeleteResult::new((before - docs.len()) as u64))
    }

    async fn count(&self, collection: &str, filter: &Filter) -> Result<u64, DatabaseError> {
        validate_collection(collection)?;

        let collections = self.collections.read().await;
        let count = collections
            .get(collection)
            .map(|docs| docs.iter().filter(|d| filter.matches(d)).count())
            .unwrap_or(0);
        Ok(count as u64)
    }

    async fn ping(&self) -> Result<(), DatabaseError> {
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    async fn seeded() -> MemoryDocumentStore {
        let store = MemoryDocumentStore::new();
        for (name, enrolled, status) in [("Hatha", 4, "approved"), ("Yin", 9, "pending"), ("Vinyasa", 9, "approved")] {
            store
                .insert_one("classes", json!({ "name": name, "totalEnrolled": enrolled, "status": status }))
                .await
                .unwrap();
        }
        store
    }

    fn names(docs: &[Value]) -> Vec<&str> {
        docs.iter().filter_map(|d| d["name"].as_str()).collect()
    }

    #[tokio::test]
    async fn find_sorts_pages_and_projects() {
        let store = seeded().await;

        let mut filter = Filter::new();
        filter
            .order(json!({ "totalEnrolled": -1 }))
            .unwrap()
            .limit(2, None)
            .unwrap()
            .select(json!({ "name": 1 }))
            .unwrap();
        let docs = store.find("classes", &filter).await.unwrap();

        // Ties keep insertion order
        assert_eq!(names(&docs), vec!["Yin", "Vinyasa"]);
        assert!(docs[0].get("status").is_none());
        assert!(docs[0].get("_id").is_some());
    }

    #[tokio::test]
    async fn find_one_by_id() {
        let store = seeded().await;
        let inserted = store.insert_one("classes", json!({ "_id": "forged", "name": "Kundalini" })).await.unwrap();
        assert_ne!(inserted.inserted_id, "forged");

        let filter = Filter::matching(json!({ "_id": inserted.inserted_id })).unwrap();
        let doc = store.find_one("classes", &filter).await.unwrap().unwrap();
        assert_eq!(doc["name"], "Kundalini");

        let missing = Filter::matching(json!({ "_id": "forged" })).unwrap();
        assert!(store.find_one("classes", &missing).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn update_reports_matched_and_modified() {
        let store = seeded().await;
        let approved = Filter::matching(json!({ "status": "approved" })).unwrap();

        let update = Update::parse(&json!({ "$inc": { "totalEnrolled": 1 } })).unwrap();
        let result = store.update_many("classes", &approved, &update).await.unwrap();
        assert_eq!((result.matched_count, result.modified_count), (2, 2));

        let noop = Update::parse(&json!({ "$set": { "status": "approved" } })).unwrap();
        let result = store.update_one("classes", &approved, &noop, UpdateOptions::default()).await.unwrap();
        assert_eq!((result.matched_count, result.modified_count), (1, 0));

        let filter = Filter::matching(json!({ "name": "Vinyasa" })).unwrap();
        let doc = store.find_one("classes", &filter).await.unwrap().unwrap();
        assert_eq!(doc["totalEnrolled"], 10);
    }

    #[tokio::test]
    async fn upsert_inserts_when_nothing_matches() {
        let store = MemoryDocumentStore::new();
        let filter = Filter::matching(json!({ "email": "ana@yoga.io" })).unwrap();
        let update = Update::parse(&json!({ "$set": { "role": "instructor" } })).unwrap();

        let result = store.update_one("users", &filter, &update, UpdateOptions::upsert()).await.unwrap();
        assert_eq!(result.upserted_count, 1);

        let doc = store.find_one("users", &filter).await.unwrap().unwrap();
        assert_eq!(doc["role"], "instructor");
        assert_eq!(doc["_id"].as_str(), result.upserted_id.as_deref());

        let result = store.update_one("users", &filter, &update, UpdateOptions::upsert()).await.unwrap();
        assert_eq!((result.matched_count, result.upserted_count), (1, 0));
    }

    #[tokio::test]
    async fn user_emails_stay_unique() {
        let store = MemoryDocumentStore::new();
        store.insert_one("users", json!({ "email": "ana@yoga.io" })).await.unwrap();
        let kim = store.insert_one("users", json!({ "email": "kim@yoga.io" })).await.unwrap();

        let again = store.insert_one("users", json!({ "email": "ana@yoga.io" })).await;
        assert!(matches!(again, Err(DatabaseError::Duplicate(_))));

        // Renaming onto a taken email leaves the document untouched
        let by_id = Filter::matching(json!({ "_id": kim.inserted_id })).unwrap();
        let rename = Update::parse(&json!({ "$set": { "email": "ana@yoga.io" } })).unwrap();
        let renamed = store.update_one("users", &by_id, &rename, UpdateOptions::default()).await;
        assert!(matches!(renamed, Err(DatabaseError::Duplicate(_))));
        assert_eq!(store.find_one("users", &by_id).await.unwrap().unwrap()["email"], "kim@yoga.io");

        // Rewriting a document with its own email is fine
        let same = Update::parse(&json!({ "$set": { "email": "kim@yoga.io", "name": "Kim" } })).unwrap();
        assert_eq!(store.update_one("users", &by_id, &same, UpdateOptions::default()).await.unwrap().modified_count, 1);

        // Other collections have no unique keys
        store.insert_one("cart", json!({ "email": "ana@yoga.io" })).await.unwrap();
        store.insert_one("cart", json!({ "email": "ana@yoga.io" })).await.unwrap();
    }

    #[tokio::test]
    async fn deletes_and_counts() {
        let store = seeded().await;
        let approved = Filter::matching(json!({ "status": "approved" })).unwrap();

        assert_eq!(store.count("classes", &approved).await.unwrap(), 2);
        assert_eq!(store.delete_one("classes", &approved).await.unwrap().deleted_count, 1);
        assert_eq!(store.delete_many("classes", &Filter::new()).await.unwrap().deleted_count, 2);
        assert_eq!(store.count("classes", &Filter::new()).await.unwrap(), 0);
        assert_eq!(store.delete_many("cart", &Filter::new()).await.unwrap().deleted_count, 0);
    }

    #[tokio::test]
    async fn rejects_bad_collection_names() {
        let store = MemoryDocumentStore::new();
        assert!(matches!(
            store.find("drop table", &Filter::new()).await,
            Err(DatabaseError::InvalidCollection(_))
        ));
    }
}
