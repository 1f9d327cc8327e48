use serde_json::Value;

use super::error::FilterError;
use super::types::{validate_field_name, Condition, FilterOp, FilterWhereInfo, ID_FIELD};

/// Parses where-clause documents and renders them as SQL over the JSONB `doc` column.
///
/// Every parameter is bound as JSONB, so comparisons follow JSONB semantics:
/// numbers compare numerically and range operators only apply to values of the
/// same JSON type.
pub struct FilterWhere {
    param_values: Vec<Value>,
    param_index: usize,
}

impl FilterWhere {
    /// Stored document with its id exposed as `_id`
    pub const DOCUMENT_EXPR: &'static str = "\"doc\" || jsonb_build_object('_id', \"id\"::text)";

    pub fn new(starting_param_index: usize) -> Self {
        Self {
            param_values: vec![],
            param_index: starting_param_index,
        }
    }

    pub fn generate(conditions: &[Condition], starting_param_index: usize) -> (String, Vec<Value>) {
        let mut filter_where = Self::new(starting_param_index);
        let sql = filter_where.build_all(conditions);
        (sql, filter_where.param_values)
    }

    /// SQL expression addressing a document field
    pub fn field_expr(field: &str) -> String {
        if field == ID_FIELD {
            "to_jsonb(\"id\"::text)".to_string()
        } else {
            format!("(\"doc\" -> '{}')", field)
        }
    }

    pub fn parse(where_data: &Value) -> Result<Vec<Condition>, FilterError> {
        match where_data {
            Value::Null => Ok(vec![]),
            Value::Object(obj) => {
                let mut conditions = Vec::with_capacity(obj.len());
                for (key, value) in obj {
                    if key.starts_with('$') {
                        conditions.push(Self::parse_logical_operator(key, value)?);
                    } else {
                        conditions.extend(Self::parse_field_condition(key, value)?);
                    }
                }
                Ok(conditions)
            }
            _ => Err(FilterError::InvalidWhereClause("WHERE must be an object".to_string())),
        }
    }

    fn parse_logical_operator(op: &str, value: &Value) -> Result<Condition, FilterError> {
        match op {
            "$and" | "$or" => {
                let arr = value
                    .as_array()
                    .filter(|arr| !arr.is_empty())
                    .ok_or_else(|| FilterError::InvalidOperatorData(format!("{} requires a non-empty array", op)))?;
                let branches = arr
                    .iter()
                    .map(|v| Self::parse(v).map(Condition::And))
                    .collect::<Result<Vec<_>, _>>()?;
                Ok(if op == "$and" { Condition::And(branches) } else { Condition::Or(branches) })
            }
            "$not" => {
                if !value.is_object() {
                    return Err(FilterError::InvalidOperatorData("$not requires an object".to_string()));
                }
                Ok(Condition::Not(Box::new(Condition::And(Self::parse(value)?))))
            }
            _ => Err(FilterError::UnsupportedOperator(op.to_string())),
        }
    }

    fn parse_field_condition(field: &str, value: &Value) -> Result<Vec<Condition>, FilterError> {
        validate_field_name(field)?;

        let operators = match value {
            Value::Object(obj) if obj.keys().any(|k| k.starts_with('$')) => obj,
            // Implicit equality: { field: value }
            _ => {
                return Ok(vec![Condition::Field(FilterWhereInfo {
                    field: field.to_string(),
                    operator: FilterOp::Eq,
                    data: value.clone(),
                })])
            }
        };

        let mut conditions = Vec::with_capacity(operators.len());
        for (op_key, op_val) in operators {
            let operator = FilterOp::parse(op_key)?;
            match operator {
                FilterOp::In | FilterOp::NIn if !op_val.is_array() => {
                    return Err(FilterError::InvalidOperatorData(format!("{} requires an array", op_key)));
                }
                FilterOp::Exists if !op_val.is_boolean() => {
                    return Err(FilterError::InvalidOperatorData("$exists requires a boolean".to_string()));
                }
                _ => {}
            }
            conditions.push(Condition::Field(FilterWhereInfo {
                field: field.to_string(),
                operator,
                data: op_val.clone(),
            }));
        }
        Ok(conditions)
    }

    fn build_all(&mut self, conditions: &[Condition]) -> String {
        if conditions.is_empty() {
            return "TRUE".to_string();
        }
        conditions
            .iter()
            .map(|condition| self.build(condition))
            .collect::<Vec<_>>()
            .join(" AND ")
    }

    fn build(&mut self, condition: &Condition) -> String {
        match condition {
            Condition::Field(info) => self.build_field_condition(info),
            Condition::And(branches) => format!("({})", self.build_all(branches)),
            Condition::Or(branches) => {
                if branches.is_empty() {
                    return "FALSE".to_string();
                }
                let parts: Vec<String> = branches.iter().map(|b| self.build(b)).collect();
                format!("({})", parts.join(" OR "))
            }
            // Missing fields yield NULL, which NOT would keep as NULL
            Condition::Not(inner) => format!("NOT COALESCE({}, FALSE)", self.build(inner)),
        }
    }

    fn build_field_condition(&mut self, condition: &FilterWhereInfo) -> String {
        let expr = Self::field_expr(&condition.field);
        match condition.operator {
            FilterOp::Eq => {
                if condition.data.is_null() { format!("({e} IS NULL OR {e} = 'null'::jsonb)", e = expr) }
                else { format!("{} = {}", expr, self.param(condition.data.clone())) }
            }
            FilterOp::Ne => {
                if condition.data.is_null() { format!("({e} IS NOT NULL AND {e} <> 'null'::jsonb)", e = expr) }
                else { format!("{} IS DISTINCT FROM {}", expr, self.param(condition.data.clone())) }
            }
            FilterOp::Gt | FilterOp::Gte | FilterOp::Lt | FilterOp::Lte => {
                let sql_op = match condition.operator {
                    FilterOp::Gt => ">",
                    FilterOp::Gte => ">=",
                    FilterOp::Lt => "<",
                    _ => "<=",
                };
                let param = self.param(condition.data.clone());
                format!("(jsonb_typeof({e}) = jsonb_typeof({p}) AND {e} {op} {p})", e = expr, p = param, op = sql_op)
            }
            FilterOp::In => {
                let values = condition.data.as_array().cloned().unwrap_or_default();
                if values.is_empty() { return "FALSE".to_string(); }
                let includes_null = values.iter().any(Value::is_null);
                let params: Vec<String> = values.into_iter().map(|v| self.param(v)).collect();
                if includes_null {
                    format!("({e} IN ({p}) OR {e} IS NULL)", e = expr, p = params.join(", "))
                } else {
                    format!("{} IN ({})", expr, params.join(", "))
                }
            }
            FilterOp::NIn => {
                let values = condition.data.as_array().cloned().unwrap_or_default();
                if values.is_empty() { return "TRUE".to_string(); }
                let includes_null = values.iter().any(Value::is_null);
                let params: Vec<String> = values.into_iter().map(|v| self.param(v)).collect();
                if includes_null {
                    format!("({e} IS NOT NULL AND {e} NOT IN ({p}))", e = expr, p = params.join(", "))
                } else {
                    format!("({e} IS NULL OR {e} NOT IN ({p}))", e = expr, p = params.join(", "))
                }
            }
            FilterOp::Exists => {
                if condition.data.as_bool().unwrap_or(true) { format!("{} IS NOT NULL", expr) }
                else { format!("{} IS NULL", expr) }
            }
        }
    }

    fn param(&mut self, value: Value) -> String {
        self.param_values.push(value);
        self.param_index += 1;
        format!("${}::jsonb", self.param_index)
    }
}
