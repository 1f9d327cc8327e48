use std::cmp::Ordering;

use serde_json::Value;

use super::error::FilterError;
use super::filter_match::compare_same_type;
use super::filter_where::FilterWhere;
use super::types::{validate_field_name, FilterOrderInfo, SortDirection};

pub struct FilterOrder;

impl FilterOrder {
    pub fn validate_and_parse(order: &Value) -> Result<Vec<FilterOrderInfo>, FilterError> {
        let infos = match order {
            Value::Null => vec![],
            Value::String(s) => Self::parse_order_string(s)?,
            Value::Array(arr) => {
                // Expect array of strings like ["date desc", "name asc"]
                let mut out = Vec::new();
                for v in arr {
                    let s = v.as_str().ok_or_else(|| FilterError::InvalidSort(format!("expected string, got {}", v)))?;
                    out.extend(Self::parse_order_string(s)?);
                }
                out
            }
            Value::Object(obj) => {
                // { "totalEnrolled": -1, "name": "asc" }
                let mut out = Vec::new();
                for (k, v) in obj {
                    out.push(FilterOrderInfo { field: k.clone(), sort: Self::parse_direction(v)? });
                }
                out
            }
            other => return Err(FilterError::InvalidSort(format!("unsupported sort spec: {}", other))),
        };

        for info in &infos {
            validate_field_name(&info.field)?;
        }
        Ok(infos)
    }

    fn parse_direction(value: &Value) -> Result<SortDirection, FilterError> {
        match value {
            Value::Number(n) if n.as_i64() == Some(1) => Ok(SortDirection::Asc),
            Value::Number(n) if n.as_i64() == Some(-1) => Ok(SortDirection::Desc),
            Value::String(s) if s.eq_ignore_ascii_case("asc") => Ok(SortDirection::Asc),
            Value::String(s) if s.eq_ignore_ascii_case("desc") => Ok(SortDirection::Desc),
            other => Err(FilterError::InvalidSort(format!("invalid direction: {}", other))),
        }
    }

    fn parse_order_string(s: &str) -> Result<Vec<FilterOrderInfo>, FilterError> {
        // split on commas, then each token into field and direction
        let mut out = Vec::new();
        for part in s.split(',') {
            let trimmed = part.trim();
            if trimmed.is_empty() { continue; }
            let mut it = trimmed.split_whitespace();
            if let Some(field) = it.next() {
                let sort = match it.next() {
                    Some(dir) => Self::parse_direction(&Value::String(dir.to_string()))?,
                    None => SortDirection::Asc,
                };
                out.push(FilterOrderInfo { field: field.to_string(), sort });
            }
        }
        Ok(out)
    }

    /// ORDER BY clause; insertion order (`seq`) breaks ties
    pub fn generate(infos: &[FilterOrderInfo]) -> String {
        let mut parts: Vec<String> = infos
            .iter()
            .map(|i| format!("{} {} NULLS LAST", FilterWhere::field_expr(&i.field), i.sort.to_sql()))
            .collect();
        parts.push("\"seq\" ASC".to_string());
        format!("ORDER BY {}", parts.join(", "))
    }

    /// In-memory equivalent of `generate`. Callers sort stably so insertion order breaks ties.
    pub fn compare(infos: &[FilterOrderInfo], a: &Value, b: &Value) -> Ordering {
        for info in infos {
            let ordering = match (a.get(&info.field), b.get(&info.field)) {
                (None, None) => Ordering::Equal,
                // Missing fields sort last in either direction
                (None, Some(_)) => Ordering::Greater,
                (Some(_), None) => Ordering::Less,
                (Some(x), Some(y)) => {
                    let ordering = compare_jsonb(x, y);
                    match info.sort {
                        SortDirection::Asc => ordering,
                        SortDirection::Desc => ordering.reverse(),
                    }
                }
            };
            if ordering != Ordering::Equal {
                return ordering;
            }
        }
        Ordering::Equal
    }
}

/// Total order across JSON types matching JSONB: null < string < number < boolean < array < object
fn compare_jsonb(a: &Value, b: &Value) -> Ordering {
    fn rank(v: &Value) -> u8 {
        match v {
            Value::Null => 0,
            Value::String(_) => 1,
            Value::Number(_) => 2,
            Value::Bool(_) => 3,
            Value::Array(_) => 4,
            Value::Object(_) => 5,
        }
    }
    rank(a)
        .cmp(&rank(b))
        .then_with(|| compare_same_type(a, b).unwrap_or(Ordering::Equal))
}
