use serde_json::{Map, Value};

use super::error::FilterError;
use super::types::{validate_field_name, ID_FIELD};

/// Inclusive projection: `{ "classId": 1 }` keeps `classId` and `_id`.
#[derive(Debug, Clone, PartialEq)]
pub struct Projection {
    fields: Vec<String>,
    include_id: bool,
}

impl Projection {
    pub fn parse(spec: &Value) -> Result<Self, FilterError> {
        let mut projection = Self { fields: vec![], include_id: true };
        match spec {
            Value::Object(obj) => {
                for (field, flag) in obj {
                    validate_field_name(field)?;
                    let include = match flag {
                        Value::Bool(b) => *b,
                        Value::Number(n) => n.as_i64() != Some(0),
                        other => return Err(FilterError::InvalidProjection(format!("invalid flag for {}: {}", field, other))),
                    };
                    if field == ID_FIELD {
                        projection.include_id = include;
                    } else if include {
                        projection.fields.push(field.clone());
                    } else {
                        return Err(FilterError::InvalidProjection(format!("cannot exclude {} in an inclusive projection", field)));
                    }
                }
            }
            // ["classId", "userMail"]
            Value::Array(arr) => {
                for v in arr {
                    let field = v.as_str().ok_or_else(|| FilterError::InvalidProjection(format!("expected string, got {}", v)))?;
                    validate_field_name(field)?;
                    if field != ID_FIELD {
                        projection.fields.push(field.to_string());
                    }
                }
            }
            other => return Err(FilterError::InvalidProjection(format!("unsupported projection: {}", other))),
        }
        Ok(projection)
    }

    pub fn apply(&self, document: Value) -> Value {
        let mut obj = match document {
            Value::Object(obj) => obj,
            other => return other,
        };

        if self.fields.is_empty() {
            if !self.include_id {
                obj.remove(ID_FIELD);
            }
            return Value::Object(obj);
        }

        let mut projected = Map::new();
        if self.include_id {
            if let Some(id) = obj.remove(ID_FIELD) {
                projected.insert(ID_FIELD.to_string(), id);
            }
        }
        for field in &self.fields {
            if let Some(value) = obj.remove(field) {
                projected.insert(field.clone(), value);
            }
        }
        Value::Object(projected)
    }
}
