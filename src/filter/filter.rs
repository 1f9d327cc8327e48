use serde_json::{Map, Value};

use super::error::FilterError;
use super::filter_match::FilterMatch;
use super::filter_order::FilterOrder;
use super::filter_select::Projection;
use super::filter_where::FilterWhere;
use super::types::{Condition, FilterData, FilterOp, FilterOrderInfo, SqlResult};

/// Compiled query document: where-clause, sort, projection and paging.
///
/// The same `Filter` drives both document store backends: `to_sql` renders it
/// against the Postgres `doc` column and `matches` evaluates it in memory.
#[derive(Debug, Clone, Default)]
pub struct Filter {
    conditions: Vec<Condition>,
    order: Vec<FilterOrderInfo>,
    projection: Option<Projection>,
    limit: Option<i64>,
    offset: Option<i64>,
}

impl Filter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Filter with only a where-clause, e.g. `{ "status": "approved" }`
    pub fn matching(conditions: Value) -> Result<Self, FilterError> {
        let mut filter = Self::new();
        filter.where_clause(conditions)?;
        Ok(filter)
    }

    pub fn from_data(data: FilterData) -> Result<Self, FilterError> {
        let mut filter = Self::new();
        filter.assign(data)?;
        Ok(filter)
    }

    pub fn assign(&mut self, data: FilterData) -> Result<&mut Self, FilterError> {
        if let Some(select) = data.select { self.select(select)?; }
        if let Some(where_clause) = data.where_clause { self.where_clause(where_clause)?; }
        if let Some(order) = data.order { self.order(order)?; }
        if let Some(limit) = data.limit { self.limit(limit, data.offset)?; }
        Ok(self)
    }

    pub fn select(&mut self, projection: Value) -> Result<&mut Self, FilterError> {
        self.projection = Some(Projection::parse(&projection)?);
        Ok(self)
    }

    pub fn where_clause(&mut self, conditions: Value) -> Result<&mut Self, FilterError> {
        self.conditions = FilterWhere::parse(&conditions)?;
        Ok(self)
    }

    pub fn order(&mut self, order_spec: Value) -> Result<&mut Self, FilterError> {
        self.order = FilterOrder::validate_and_parse(&order_spec)?;
        Ok(self)
    }

    pub fn limit(&mut self, limit: i64, offset: Option<i64>) -> Result<&mut Self, FilterError> {
        if limit < 0 { return Err(FilterError::InvalidLimit("Limit must be non-negative".to_string())); }
        if let Some(off) = offset { if off < 0 { return Err(FilterError::InvalidOffset("Offset must be non-negative".to_string())); } }

        // A zero limit means "no limit", as in the document store drivers
        self.limit = if limit == 0 { None } else { Some(limit) };
        self.offset = offset;
        Ok(self)
    }

    pub fn order_info(&self) -> &[FilterOrderInfo] {
        &self.order
    }

    pub fn limit_value(&self) -> Option<i64> {
        self.limit
    }

    pub fn offset_value(&self) -> Option<i64> {
        self.offset
    }

    /// Top-level equality conditions, used to seed documents created by upserts
    pub fn equality_fields(&self) -> Map<String, Value> {
        self.conditions
            .iter()
            .filter_map(|condition| match condition {
                Condition::Field(info) if info.operator == FilterOp::Eq => {
                    Some((info.field.clone(), info.data.clone()))
                }
                _ => None,
            })
            .collect()
    }

    pub fn matches(&self, document: &Value) -> bool {
        FilterMatch::matches(&self.conditions, document)
    }

    pub fn project(&self, document: Value) -> Value {
        match &self.projection {
            Some(projection) => projection.apply(document),
            None => document,
        }
    }

    /// `SELECT` returning each matching document (with `_id` merged in) as JSONB
    pub fn to_sql(&self, table_name: &str) -> SqlResult {
        let (where_clause, params) = FilterWhere::generate(&self.conditions, 0);
        let order_clause = FilterOrder::generate(&self.order);
        let limit_clause = self.build_limit_clause();

        let query = [
            format!("SELECT {} AS \"document\"", FilterWhere::DOCUMENT_EXPR),
            format!("FROM \"{}\"", table_name),
            format!("WHERE {}", where_clause),
            order_clause,
            limit_clause,
        ].into_iter().filter(|s| !s.is_empty()).collect::<Vec<_>>().join(" ");

        SqlResult { query, params }
    }

    pub fn to_where_sql(&self, starting_param_index: usize) -> SqlResult {
        let (query, params) = FilterWhere::generate(&self.conditions, starting_param_index);
        SqlResult { query, params }
    }

    pub fn to_count_sql(&self, table_name: &str) -> SqlResult {
        let where_result = self.to_where_sql(0);
        let query = format!("SELECT COUNT(*) AS count FROM \"{}\" WHERE {}", table_name, where_result.query);
        SqlResult { query, params: where_result.params }
    }

    fn build_limit_clause(&self) -> String {
        match (self.limit, self.offset) {
            (Some(l), Some(o)) => format!("LIMIT {} OFFSET {}", l, o),
            (Some(l), None) => format!("LIMIT {}", l),
            (None, Some(o)) => format!("OFFSET {}", o),
            (None, None) => String::new(),
        }
    }
}
