use std::collections::HashMap;
use std::sync::Arc;

use serde::Serialize;
use serde_json::{json, Value};
use tracing::instrument;

use crate::database::{collections, DatabaseError, DocumentStore};
use crate::filter::Filter;

/// Instructor ranked by the enrollments of all their classes
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PopularInstructor {
    pub instructor_email: String,
    pub total_enrolled: i64,
    pub total_classes: u64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub instructor: Option<Value>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AdminStats {
    pub approved_classes: u64,
    pub pending_classes: u64,
    pub instructors: u64,
    pub total_classes: u64,
    pub total_enrolled: u64,
}

pub struct ClassService {
    store: Arc<dyn DocumentStore>,
}

impl ClassService {
    pub fn new(store: Arc<dyn DocumentStore>) -> Self {
        Self { store }
    }

    #[instrument(skip(self))]
    pub async fn popular_classes(&self, limit: i64) -> Result<Vec<Value>, DatabaseError> {
        let mut filter = Filter::new();
        filter.order(json!({ "totalEnrolled": -1 }))?.limit(limit, None)?;
        self.store.find(collections::CLASSES, &filter).await
    }

    /// Groups classes by `instructorEmail`, sums their enrollments and joins
    /// the instructor's user document when one exists.
    #[instrument(skip(self))]
    pub async fn popular_instructors(&self, limit: usize) -> Result<Vec<PopularInstructor>, DatabaseError> {
        let mut filter = Filter::new();
        filter.select(json!({ "instructorEmail": 1, "totalEnrolled": 1 }))?;
        let classes = self.store.find(collections::CLASSES, &filter).await?;

        let mut groups: HashMap<String, (i64, u64)> = HashMap::new();
        for class in &classes {
            let Some(email) = class.get("instructorEmail").and_then(Value::as_str) else {
                continue;
            };
            let entry = groups.entry(email.to_string()).or_default();
            entry.0 += enrolled_count(class);
            entry.1 += 1;
        }

        let mut ranked: Vec<PopularInstructor> = groups
            .into_iter()
            .map(|(instructor_email, (total_enrolled, total_classes))| PopularInstructor {
                instructor_email,
                total_enrolled,
                total_classes,
                instructor: None,
            })
            .collect();
        ranked.sort_by(|a, b| {
            b.total_enrolled
                .cmp(&a.total_enrolled)
                .then_with(|| a.instructor_email.cmp(&b.instructor_email))
        });
        ranked.truncate(limit);

        let emails: Vec<&str> = ranked.iter().map(|r| r.instructor_email.as_str()).collect();
        let users = Filter::matching(json!({ "email": { "$in": emails } }))?;
        let mut by_email: HashMap<String, Value> = self
            .store
            .find(collections::USERS, &users)
            .await?
            .into_iter()
            .filter_map(|user| {
                let email = user.get("email")?.as_str()?.to_string();
                Some((email, user))
            })
            .collect();

        for entry in &mut ranked {
            entry.instructor = by_email.remove(&entry.instructor_email);
        }
        Ok(ranked)
    }

    #[instrument(skip(self))]
    pub async fn admin_stats(&self) -> Result<AdminStats, DatabaseError> {
        let approved = Filter::matching(json!({ "status": "approved" }))?;
        let pending = Filter::matching(json!({ "status": "pending" }))?;
        let instructors = Filter::matching(json!({ "role": "instructor" }))?;
        let everything = Filter::new();

        let (approved_classes, pending_classes, instructors, total_classes, total_enrolled) = futures::try_join!(
            self.store.count(collections::CLASSES, &approved),
            self.store.count(collections::CLASSES, &pending),
            self.store.count(collections::USERS, &instructors),
            self.store.count(collections::CLASSES, &everything),
            self.store.count(collections::ENROLLED, &everything),
        )?;

        Ok(AdminStats {
            approved_classes,
            pending_classes,
            instructors,
            total_classes,
            total_enrolled,
        })
    }
}

fn enrolled_count(class: &Value) -> i64 {
    match class.get("totalEnrolled") {
        Some(Value::Number(n)) => n.as_i64().or_else(|| n.as_f64().map(|f| f as i64)).unwrap_or(0),
        _ => 0,
    }
}
