use std::cmp::Ordering;

use serde_json::Value;

use super::types::{Condition, FilterOp, FilterWhereInfo};

/// Evaluates parsed where-clauses against in-memory documents with the same
/// semantics `FilterWhere` renders for Postgres.
pub struct FilterMatch;

impl FilterMatch {
    pub fn matches(conditions: &[Condition], document: &Value) -> bool {
        conditions.iter().all(|condition| Self::matches_condition(condition, document))
    }

    fn matches_condition(condition: &Condition, document: &Value) -> bool {
        match condition {
            Condition::Field(info) => Self::matches_field(info, document),
            Condition::And(branches) => Self::matches(branches, document),
            Condition::Or(branches) => branches.iter().any(|b| Self::matches_condition(b, document)),
            Condition::Not(inner) => !Self::matches_condition(inner, document),
        }
    }

    fn matches_field(condition: &FilterWhereInfo, document: &Value) -> bool {
        let value = document.get(&condition.field);
        match condition.operator {
            FilterOp::Eq => Self::equals(value, &condition.data),
            FilterOp::Ne => !Self::equals(value, &condition.data),
            FilterOp::Gt | FilterOp::Gte | FilterOp::Lt | FilterOp::Lte => {
                let ordering = value.and_then(|v| compare_same_type(v, &condition.data));
                match (condition.operator, ordering) {
                    (_, None) => false,
                    (FilterOp::Gt, Some(o)) => o == Ordering::Greater,
                    (FilterOp::Gte, Some(o)) => o != Ordering::Less,
                    (FilterOp::Lt, Some(o)) => o == Ordering::Less,
                    (_, Some(o)) => o != Ordering::Greater,
                }
            }
            FilterOp::In => Self::any_equals(value, &condition.data),
            FilterOp::NIn => !Self::any_equals(value, &condition.data),
            FilterOp::Exists => value.is_some() == condition.data.as_bool().unwrap_or(true),
        }
    }

    /// Null matches both a missing field and an explicit null
    fn equals(value: Option<&Value>, expected: &Value) -> bool {
        match value {
            None => expected.is_null(),
            Some(v) => json_eq(v, expected),
        }
    }

    fn any_equals(value: Option<&Value>, candidates: &Value) -> bool {
        candidates
            .as_array()
            .map(|arr| arr.iter().any(|candidate| Self::equals(value, candidate)))
            .unwrap_or(false)
    }
}

/// JSON equality with numbers compared by value (`1 == 1.0`), as JSONB does
pub fn json_eq(a: &Value, b: &Value) -> bool {
    match (a, b) {
        (Value::Number(x), Value::Number(y)) => match (x.as_i64(), y.as_i64()) {
            (Some(i), Some(j)) => i == j,
            _ => x.as_f64() == y.as_f64(),
        },
        (Value::Array(xs), Value::Array(ys)) => {
            xs.len() == ys.len() && xs.iter().zip(ys).all(|(x, y)| json_eq(x, y))
        }
        (Value::Object(xs), Value::Object(ys)) => {
            xs.len() == ys.len()
                && xs.iter().all(|(k, x)| ys.get(k).map_or(false, |y| json_eq(x, y)))
        }
        _ => a == b,
    }
}

/// Orders two scalars of the same JSON type; `None` for mixed or composite types
pub fn compare_same_type(a: &Value, b: &Value) -> Option<Ordering> {
    match (a, b) {
        (Value::Null, Value::Null) => Some(Ordering::Equal),
        (Value::Bool(x), Value::Bool(y)) => Some(x.cmp(y)),
        (Value::Number(x), Value::Number(y)) => x.as_f64()?.partial_cmp(&y.as_f64()?),
        (Value::String(x), Value::String(y)) => Some(x.cmp(y)),
        _ => None,
    }
}
