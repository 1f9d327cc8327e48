use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::error::FilterError;

/// Name of the field that addresses the store-assigned document id
pub const ID_FIELD: &str = "_id";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum FilterOp {
    #[serde(rename = "$eq")] Eq,
    #[serde(rename = "$ne")] Ne,
    #[serde(rename = "$gt")] Gt,
    #[serde(rename = "$gte")] Gte,
    #[serde(rename = "$lt")] Lt,
    #[serde(rename = "$lte")] Lte,
    #[serde(rename = "$in")] In,
    #[serde(rename = "$nin")] NIn,
    #[serde(rename = "$exists")] Exists,
}

impl FilterOp {
    pub fn parse(op_key: &str) -> Result<Self, FilterError> {
        Ok(match op_key {
            "$eq" => FilterOp::Eq,
            "$ne" | "$neq" => FilterOp::Ne,
            "$gt" => FilterOp::Gt,
            "$gte" => FilterOp::Gte,
            "$lt" => FilterOp::Lt,
            "$lte" => FilterOp::Lte,
            "$in" => FilterOp::In,
            "$nin" => FilterOp::NIn,
            "$exists" => FilterOp::Exists,
            other => return Err(FilterError::UnsupportedOperator(other.to_string())),
        })
    }
}

/// Raw query document pieces, as they arrive from callers
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct FilterData {
    pub select: Option<Value>,
    pub where_clause: Option<Value>,
    pub order: Option<Value>,
    pub limit: Option<i64>,
    pub offset: Option<i64>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct FilterWhereInfo {
    pub field: String,
    pub operator: FilterOp,
    pub data: Value,
}

/// Parsed where-clause tree. Top-level conditions are implicitly AND-ed.
#[derive(Debug, Clone, PartialEq)]
pub enum Condition {
    Field(FilterWhereInfo),
    And(Vec<Condition>),
    Or(Vec<Condition>),
    Not(Box<Condition>),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortDirection {
    Asc,
    Desc,
}

impl SortDirection {
    pub fn to_sql(&self) -> &'static str {
        match self {
            SortDirection::Asc => "ASC",
            SortDirection::Desc => "DESC",
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct FilterOrderInfo {
    pub field: String,
    pub sort: SortDirection,
}

#[derive(Debug, Clone)]
pub struct SqlResult {
    pub query: String,
    pub params: Vec<Value>,
}

/// Field names are plain identifiers; `_id` is the document id.
pub fn validate_field_name(field: &str) -> Result<(), FilterError> {
    if field == ID_FIELD {
        return Ok(());
    }
    let mut chars = field.chars();
    let valid_start = matches!(chars.next(), Some(c) if c.is_ascii_alphabetic() || c == '_');
    if !valid_start || !chars.all(|c| c.is_ascii_alphanumeric() || c == '_') {
        return Err(FilterError::InvalidField(field.to_string()));
    }
    Ok(())
}
