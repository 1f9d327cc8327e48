use serde_json::{Map, Value};
use uuid::Uuid;

use super::manager::DatabaseError;
use crate::filter::ID_FIELD;

/// Collection names used by the marketplace
pub mod collections {
    pub const USERS: &str = "users";
    pub const CLASSES: &str = "classes";
    pub const CART: &str = "cart";
    pub const PAYMENTS: &str = "payments";
    pub const ENROLLED: &str = "enrolled";
    pub const APPLIED: &str = "applied";

    pub const ALL: &[&str] = &[USERS, CLASSES, CART, PAYMENTS, ENROLLED, APPLIED];
}

/// Fields whose values must be unique within a collection
pub fn unique_fields(collection: &str) -> &'static [&'static str] {
    match collection {
        collections::USERS => &["email"],
        _ => &[],
    }
}

/// Checks `document` against the unique fields of its collection. `skip` is the
/// position of the document itself when it is being updated in place.
pub fn check_unique(collection: &str, existing: &[Value], document: &Value, skip: Option<usize>) -> Result<(), DatabaseError> {
    for field in unique_fields(collection) {
        let Some(value) = document.get(*field).filter(|v| !v.is_null()) else {
            continue;
        };
        let taken = existing
            .iter()
            .enumerate()
            .any(|(i, other)| Some(i) != skip && other.get(*field) == Some(value));
        if taken {
            return Err(DatabaseError::Duplicate(format!("{}.{}", collection, field)));
        }
    }
    Ok(())
}

/// Collection names double as Postgres table names, so keep them to identifiers
pub fn validate_collection(name: &str) -> Result<(), DatabaseError> {
    let mut chars = name.chars();
    let valid_start = matches!(chars.next(), Some(c) if c.is_ascii_lowercase() || c == '_');
    if !valid_start || !chars.all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '_') {
        return Err(DatabaseError::InvalidCollection(name.to_string()));
    }
    Ok(())
}

/// Body of a document about to be stored. The store owns `_id`, so any
/// client-sent id is dropped.
pub fn into_body(document: Value) -> Result<Map<String, Value>, DatabaseError> {
    match document {
        Value::Object(mut obj) => {
            obj.remove(ID_FIELD);
            Ok(obj)
        }
        other => Err(DatabaseError::InvalidDocument(format!("expected an object, got {}", kind(&other)))),
    }
}

pub fn with_id(mut body: Map<String, Value>, id: &str) -> Value {
    body.insert(ID_FIELD.to_string(), Value::String(id.to_string()));
    Value::Object(body)
}

/// Ids are UUIDs; anything else can never address a stored document
pub fn parse_id(id: &str) -> Option<Uuid> {
    Uuid::parse_str(id.trim()).ok()
}

pub fn id_of(document: &Value) -> Option<&str> {
    document.get(ID_FIELD).and_then(Value::as_str)
}

fn kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn collection_names_are_identifiers() {
        for name in collections::ALL {
            assert!(validate_collection(name).is_ok());
        }
        assert!(validate_collection("Users").is_err());
        assert!(validate_collection("cart; drop table cart").is_err());
        assert!(validate_collection("").is_err());
    }

    #[test]
    fn body_drops_client_id() {
        let body = into_body(json!({ "_id": "forged", "name": "Vinyasa" })).unwrap();
        assert!(!body.contains_key("_id"));
        assert_eq!(id_of(&with_id(body, "abc")), Some("abc"));
        assert!(matches!(into_body(json!([1, 2])), Err(DatabaseError::InvalidDocument(_))));
    }
}
