use serde_json::{Map, Number, Value};
use uuid::Uuid;

use super::document::parse_id;
use super::manager::DatabaseError;
use crate::filter::{types::validate_field_name, Filter, ID_FIELD};

/// Update document: `{ "$set": {...}, "$inc": {...}, "$unset": {...} }`
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Update {
    set: Map<String, Value>,
    inc: Map<String, Value>,
    unset: Vec<String>,
}

impl Update {
    pub fn parse(update: &Value) -> Result<Self, DatabaseError> {
        let obj = update
            .as_object()
            .ok_or_else(|| DatabaseError::InvalidUpdate("update must be an object".to_string()))?;

        let mut parsed = Self::default();
        for (op, fields) in obj {
            let fields = fields
                .as_object()
                .ok_or_else(|| DatabaseError::InvalidUpdate(format!("{} requires an object", op)))?;
            match op.as_str() {
                "$set" => parsed.set.extend(fields.clone()),
                "$inc" => {
                    for (field, amount) in fields {
                        if !amount.is_number() {
                            return Err(DatabaseError::InvalidUpdate(format!("$inc of {} must be a number", field)));
                        }
                        parsed.inc.insert(field.clone(), amount.clone());
                    }
                }
                "$unset" => parsed.unset.extend(fields.keys().cloned()),
                other if other.starts_with('$') => {
                    return Err(DatabaseError::InvalidUpdate(format!("unsupported update operator {}", other)));
                }
                // Replacement documents are not supported
                other => {
                    return Err(DatabaseError::InvalidUpdate(format!("update field {} must be inside an operator", other)));
                }
            }
        }
        parsed.validate()?;
        Ok(parsed)
    }

    pub fn set(fields: Map<String, Value>) -> Result<Self, DatabaseError> {
        let update = Self { set: fields, ..Default::default() };
        update.validate()?;
        Ok(update)
    }

    pub fn inc(mut self, field: impl Into<String>, amount: i64) -> Result<Self, DatabaseError> {
        self.inc.insert(field.into(), Value::from(amount));
        self.validate()?;
        Ok(self)
    }

    fn validate(&self) -> Result<(), DatabaseError> {
        let mut seen = std::collections::HashSet::new();
        let fields = self.set.keys().chain(self.inc.keys()).chain(self.unset.iter());
        for field in fields {
            validate_field_name(field)?;
            if field == ID_FIELD {
                return Err(DatabaseError::InvalidUpdate("_id cannot be modified".to_string()));
            }
            if !seen.insert(field.as_str()) {
                return Err(DatabaseError::InvalidUpdate(format!("conflicting operators on {}", field)));
            }
        }
        Ok(())
    }

    /// Applies the update in place; returns whether the document changed
    pub fn apply(&self, document: &mut Map<String, Value>) -> Result<bool, DatabaseError> {
        let before = document.clone();

        for (field, value) in &self.set {
            document.insert(field.clone(), value.clone());
        }
        for (field, amount) in &self.inc {
            let current = document
                .get(field)
                .filter(|v| !v.is_null())
                .cloned()
                .unwrap_or_else(|| Value::from(0));
            let sum = add_numbers(&current, amount).ok_or_else(|| {
                DatabaseError::InvalidUpdate(format!("cannot apply $inc to non-numeric field {}", field))
            })?;
            document.insert(field.clone(), sum);
        }
        for field in &self.unset {
            document.remove(field);
        }

        Ok(*document != before)
    }

    /// Document inserted by an upsert that matched nothing: the filter's equality
    /// fields with the update applied. An `_id` in the filter is kept as the id and
    /// must be a UUID.
    pub fn upsert_document(&self, filter: &Filter) -> Result<(Uuid, Map<String, Value>), DatabaseError> {
        let mut seed = filter.equality_fields();
        let id = match seed.remove(ID_FIELD) {
            None => Uuid::new_v4(),
            Some(v) => v.as_str().and_then(parse_id).ok_or_else(|| {
                DatabaseError::InvalidUpdate(format!("cannot upsert with _id {}, ids are UUIDs", v))
            })?,
        };
        self.apply(&mut seed)?;
        Ok((id, seed))
    }

    /// Predicate over `"doc"` that holds when some `$inc` target is present but not
    /// a number. `None` when the update has no `$inc`.
    pub fn inc_conflict_sql(&self) -> Option<String> {
        if self.inc.is_empty() {
            return None;
        }
        let checks: Vec<String> = self
            .inc
            .keys()
            .map(|f| format!("jsonb_typeof(\"doc\" -> '{}') NOT IN ('number', 'null')", f))
            .collect();
        Some(checks.join(" OR "))
    }

    /// JSONB expression producing the updated `doc`. Parameters are appended to `params`
    /// and numbered after the ones already there.
    pub fn to_sql_expr(&self, params: &mut Vec<Value>) -> String {
        let mut expr = "\"doc\"".to_string();

        if !self.set.is_empty() {
            params.push(Value::Object(self.set.clone()));
            expr = format!("({} || ${}::jsonb)", expr, params.len());
        }
        for (field, amount) in &self.inc {
            params.push(amount.clone());
            expr = format!(
                "jsonb_set({}, '{{{f}}}', to_jsonb(COALESCE((\"doc\" ->> '{f}')::numeric, 0) + (${n}::jsonb #>> '{{}}')::numeric))",
                expr,
                f = field,
                n = params.len()
            );
        }
        for field in &self.unset {
            expr = format!("({} - '{}')", expr, field);
        }

        expr
    }
}

fn add_numbers(current: &Value, amount: &Value) -> Option<Value> {
    let (Value::Number(a), Value::Number(b)) = (current, amount) else {
        return None;
    };
    if let (Some(x), Some(y)) = (a.as_i64(), b.as_i64()) {
        return x.checked_add(y).map(Value::from);
    }
    Number::from_f64(a.as_f64()? + b.as_f64()?).map(Value::Number)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn applies_set_inc_and_unset() {
        let update = Update::parse(&json!({
            "$set": { "status": "approved" },
            "$inc": { "totalEnrolled": 1, "availableSeats": -1 },
            "$unset": { "reason": "" }
        }))
        .unwrap();

        let mut doc = json!({ "status": "pending", "availableSeats": 10, "reason": "x" })
            .as_object()
            .cloned()
            .unwrap();
        assert!(update.apply(&mut doc).unwrap());
        assert_eq!(
            Value::Object(doc),
            json!({ "status": "approved", "availableSeats": 9, "totalEnrolled": 1 })
        );
    }

    #[test]
    fn reports_unchanged_documents() {
        let update = Update::parse(&json!({ "$set": { "status": "approved" } })).unwrap();
        let mut doc = json!({ "status": "approved" }).as_object().cloned().unwrap();
        assert!(!update.apply(&mut doc).unwrap());
    }

    #[test]
    fn rejects_invalid_updates() {
        assert!(Update::parse(&json!({ "name": "raw replacement" })).is_err());
        assert!(Update::parse(&json!({ "$push": { "skills": "yin" } })).is_err());
        assert!(Update::parse(&json!({ "$inc": { "price": "5" } })).is_err());
        assert!(Update::parse(&json!({ "$set": { "_id": "x" } })).is_err());
        assert!(Update::parse(&json!({ "$set": { "a": 1 }, "$inc": { "a": 1 } })).is_err());
    }

    #[test]
    fn inc_on_text_fails() {
        let update = Update::default().inc("price", 1).unwrap();
        let mut doc = json!({ "price": "free" }).as_object().cloned().unwrap();
        assert!(matches!(update.apply(&mut doc), Err(DatabaseError::InvalidUpdate(_))));

        // Null counts as zero, like a missing field
        let mut doc = json!({ "price": null }).as_object().cloned().unwrap();
        assert!(update.apply(&mut doc).unwrap());
        assert_eq!(doc["price"], 1);
    }

    #[test]
    fn upsert_seeds_from_filter() {
        let id = Uuid::new_v4();
        let filter = Filter::matching(json!({ "_id": id.to_string(), "email": "lee@yoga.io" })).unwrap();
        let update = Update::parse(&json!({ "$set": { "role": "instructor" } })).unwrap();
        let (seed_id, body) = update.upsert_document(&filter).unwrap();
        assert_eq!(seed_id, id);
        assert_eq!(Value::Object(body), json!({ "email": "lee@yoga.io", "role": "instructor" }));

        let filter = Filter::matching(json!({ "email": "kim@yoga.io" })).unwrap();
        let (seed_id, body) = update.upsert_document(&filter).unwrap();
        assert_ne!(seed_id, id);
        assert_eq!(body["email"], "kim@yoga.io");

        // Never mint a fresh document for an id that cannot exist
        let filter = Filter::matching(json!({ "_id": "not-a-uuid" })).unwrap();
        assert!(matches!(update.upsert_document(&filter), Err(DatabaseError::InvalidUpdate(_))));
    }

    #[test]
    fn inc_conflict_predicate() {
        let update = Update::parse(&json!({ "$set": { "status": "pending" } })).unwrap();
        assert_eq!(update.inc_conflict_sql(), None);

        let update = Update::default().inc("availableSeats", -1).unwrap();
        assert_eq!(
            update.inc_conflict_sql().as_deref(),
            Some("jsonb_typeof(\"doc\" -> 'availableSeats') NOT IN ('number', 'null')")
        );
    }

    #[test]
    fn renders_jsonb_expression() {
        let update = Update::parse(&json!({
            "$set": { "status": "pending" },
            "$inc": { "totalEnrolled": 1 }
        }))
        .unwrap();
        let mut params = vec![json!("existing-param")];
        let expr = update.to_sql_expr(&mut params);
        assert_eq!(
            expr,
            "jsonb_set((\"doc\" || $2::jsonb), '{totalEnrolled}', to_jsonb(COALESCE((\"doc\" ->> 'totalEnrolled')::numeric, 0) + ($3::jsonb #>> '{}')::numeric))"
        );
        assert_eq!(params.len(), 3);
    }
}
