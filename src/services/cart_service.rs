use std::sync::Arc;

use serde_json::{json, Value};
use tracing::instrument;

use crate::database::{collections, DatabaseError, DocumentStore};
use crate::filter::Filter;

pub struct CartService {
    store: Arc<dyn DocumentStore>,
}

impl CartService {
    pub fn new(store: Arc<dyn DocumentStore>) -> Self {
        Self { store }
    }

    /// Classes referenced by the user's cart items
    #[instrument(skip(self))]
    pub async fn cart_classes(&self, email: &str) -> Result<Vec<Value>, DatabaseError> {
        let mut items = Filter::matching(json!({ "userMail": email }))?;
        items.select(json!({ "classId": 1 }))?;
        let class_ids: Vec<Value> = self
            .store
            .find(collections::CART, &items)
            .await?
            .into_iter()
            .filter_map(|item| item.get("classId").cloned())
            .collect();

        if class_ids.is_empty() {
            return Ok(Vec::new());
        }

        let classes = Filter::matching(json!({ "_id": { "$in": class_ids } }))?;
        self.store.find(collections::CLASSES, &classes).await
    }
}
