use std::collections::HashMap;
use std::sync::Arc;

use serde::Serialize;
use serde_json::{json, Value};
use tracing::instrument;

use crate::database::document::id_of;
use crate::database::models::PreparedPayment;
use crate::database::{
    collections, DatabaseError, DeleteResult, DocumentStore, InsertOneResult, Update, UpdateResult,
};
use crate::filter::Filter;

/// One purchased class with the instructor teaching it
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EnrolledClass {
    pub classes: Value,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub instructor: Option<Value>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PaymentOutcome {
    pub payment_result: InsertOneResult,
    pub updated_result: UpdateResult,
    pub enrolled_result: InsertOneResult,
    pub deleted_result: DeleteResult,
}

pub struct EnrollmentService {
    store: Arc<dyn DocumentStore>,
}

impl EnrollmentService {
    pub fn new(store: Arc<dyn DocumentStore>) -> Self {
        Self { store }
    }

    /// Every class referenced by the user's enrollments, in enrollment order.
    /// Ids that no longer resolve to a class are skipped.
    #[instrument(skip(self))]
    pub async fn enrolled_classes(&self, email: &str) -> Result<Vec<EnrolledClass>, DatabaseError> {
        let mine = Filter::matching(json!({ "userEmail": email }))?;
        let records = self.store.find(collections::ENROLLED, &mine).await?;

        let class_ids: Vec<String> = records
            .iter()
            .filter_map(|r| r.get("classesId").and_then(Value::as_array))
            .flatten()
            .filter_map(|id| id.as_str().map(str::to_string))
            .collect();
        if class_ids.is_empty() {
            return Ok(Vec::new());
        }

        let classes = Filter::matching(json!({ "_id": { "$in": class_ids } }))?;
        let classes: HashMap<String, Value> = self
            .store
            .find(collections::CLASSES, &classes)
            .await?
            .into_iter()
            .filter_map(|class| Some((id_of(&class)?.to_string(), class)))
            .collect();

        let emails: Vec<&str> = classes
            .values()
            .filter_map(|c| c.get("instructorEmail").and_then(Value::as_str))
            .collect();
        let instructors = Filter::matching(json!({ "email": { "$in": emails } }))?;
        let instructors: HashMap<String, Value> = self
            .store
            .find(collections::USERS, &instructors)
            .await?
            .into_iter()
            .filter_map(|user| Some((user.get("email")?.as_str()?.to_string(), user)))
            .collect();

        Ok(class_ids
            .iter()
            .filter_map(|id| classes.get(id))
            .map(|class| EnrolledClass {
                instructor: class
                    .get("instructorEmail")
                    .and_then(Value::as_str)
                    .and_then(|email| instructors.get(email))
                    .cloned(),
                classes: class.clone(),
            })
            .collect())
    }

    /// Records a payment: stores it, takes a seat in each purchased class,
    /// enrolls the buyer and clears the purchased items from their cart.
    #[instrument(skip(self, prepared), fields(user = %prepared.user_email, classes = prepared.class_ids.len()))]
    pub async fn record_payment(&self, prepared: PreparedPayment) -> Result<PaymentOutcome, DatabaseError> {
        let PreparedPayment { user_email, class_ids, payment, enrolled } = prepared;

        let payment_result = self.store.insert_one(collections::PAYMENTS, payment).await?;

        let purchased = Filter::matching(json!({ "_id": { "$in": class_ids } }))?;
        let seat_taken = Update::default().inc("totalEnrolled", 1)?.inc("availableSeats", -1)?;
        let updated_result = self
            .store
            .update_many(collections::CLASSES, &purchased, &seat_taken)
            .await?;

        let enrolled = serde_json::to_value(&enrolled)
            .map_err(|e| DatabaseError::InvalidDocument(e.to_string()))?;
        let enrolled_result = self.store.insert_one(collections::ENROLLED, enrolled).await?;

        let cart_items = Filter::matching(json!({ "userMail": user_email, "classId": { "$in": class_ids } }))?;
        let deleted_result = self.store.delete_many(collections::CART, &cart_items).await?;

        tracing::info!(
            "Recorded payment {} ({} classes updated, {} cart items cleared)",
            payment_result.inserted_id,
            updated_result.modified_count,
            deleted_result.deleted_count
        );

        Ok(PaymentOutcome {
            payment_result,
            updated_result,
            enrolled_result,
            deleted_result,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::database::models::PaymentInfo;
    use crate::database::MemoryDocumentStore;

    async fn insert(store: &Arc<dyn DocumentStore>, collection: &str, doc: Value) -> String {
        store.insert_one(collection, doc).await.unwrap().inserted_id
    }

    #[tokio::test]
    async fn payment_takes_seats_and_clears_cart() {
        let store: Arc<dyn DocumentStore> = Arc::new(MemoryDocumentStore::new());
        let hatha = insert(&store, collections::CLASSES, json!({ "name": "Hatha", "availableSeats": 10, "totalEnrolled": 0 })).await;
        let yin = insert(&store, collections::CLASSES, json!({ "name": "Yin", "availableSeats": 3, "totalEnrolled": 7 })).await;
        insert(&store, collections::CART, json!({ "classId": hatha, "userMail": "ana@yoga.io" })).await;
        insert(&store, collections::CART, json!({ "classId": yin, "userMail": "ana@yoga.io" })).await;
        insert(&store, collections::CART, json!({ "classId": hatha, "userMail": "kim@yoga.io" })).await;

        let info: PaymentInfo = serde_json::from_value(json!({
            "transactionId": "tx_42",
            "price": 55,
            "classesId": [hatha.clone(), yin.clone()]
        }))
        .unwrap();
        let prepared = info.prepare("ana@yoga.io", None, "2026-10-17T10:00:00+00:00").unwrap();

        let service = EnrollmentService::new(store.clone());
        let outcome = service.record_payment(prepared).await.unwrap();
        assert_eq!(outcome.updated_result.modified_count, 2);
        assert_eq!(outcome.deleted_result.deleted_count, 2);

        let by_id = Filter::matching(json!({ "_id": yin })).unwrap();
        let class = store.find_one(collections::CLASSES, &by_id).await.unwrap().unwrap();
        assert_eq!((class["availableSeats"].as_i64(), class["totalEnrolled"].as_i64()), (Some(2), Some(8)));

        // Other users' carts are untouched
        assert_eq!(store.count(collections::CART, &Filter::new()).await.unwrap(), 1);
        assert_eq!(store.count(collections::PAYMENTS, &Filter::new()).await.unwrap(), 1);
    }

    #[tokio::test]
    async fn enrolled_classes_join_instructors() {
        let store: Arc<dyn DocumentStore> = Arc::new(MemoryDocumentStore::new());
        let hatha = insert(&store, collections::CLASSES, json!({ "name": "Hatha", "instructorEmail": "lee@yoga.io" })).await;
        let yin = insert(&store, collections::CLASSES, json!({ "name": "Yin", "instructorEmail": "gone@yoga.io" })).await;
        insert(&store, collections::USERS, json!({ "email": "lee@yoga.io", "name": "Lee", "role": "instructor" })).await;
        insert(
            &store,
            collections::ENROLLED,
            json!({ "userEmail": "ana@yoga.io", "classesId": [hatha, yin, "missing-class"] }),
        )
        .await;

        let service = EnrollmentService::new(store);
        let enrolled = service.enrolled_classes("ana@yoga.io").await.unwrap();

        assert_eq!(enrolled.len(), 2);
        assert_eq!(enrolled[0].classes["name"], "Hatha");
        assert_eq!(enrolled[0].instructor.as_ref().unwrap()["name"], "Lee");
        assert_eq!(enrolled[1].classes["name"], "Yin");
        assert!(enrolled[1].instructor.is_none());

        assert!(service.enrolled_classes("nobody@yoga.io").await.unwrap().is_empty());
    }
}
