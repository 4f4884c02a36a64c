use serde_json::Value;

use super::error::FilterError;
use super::filter::validate_identifier;
use super::types::{ColumnType, FilterOp, FilterWhereInfo, FilterWhereOptions};

/// Renders a Mongo-style condition object into a parameterised SQL predicate.
pub struct FilterWhere {
    param_values: Vec<Value>,
    param_index: usize,
    conditions: Vec<FilterWhereInfo>,
}

impl FilterWhere {
    pub fn new(starting_param_index: usize) -> Self {
        Self {
            param_values: vec![],
            param_index: starting_param_index,
            conditions: vec![],
        }
    }

    /// Returns the predicate (empty when there are no conditions) and the
    /// values for placeholders `$starting+1 ..`.
    pub fn generate(
        where_data: &Value,
        starting_param_index: usize,
        options: &FilterWhereOptions,
    ) -> Result<(String, Vec<Value>), FilterError> {
        let mut filter_where = Self::new(starting_param_index);
        filter_where.build(where_data, options)
    }

    pub fn validate(where_data: &Value) -> Result<(), FilterError> {
        match where_data {
            Value::Null | Value::Object(_) => Ok(()),
            _ => Err(FilterError::InvalidWhereClause("WHERE must be an object".to_string())),
        }
    }

    fn build(&mut self, where_data: &Value, options: &FilterWhereOptions) -> Result<(String, Vec<Value>), FilterError> {
        self.parse_where_data(where_data, options)?;

        let conditions = std::mem::take(&mut self.conditions);
        let mut sql_conditions = vec![];
        for condition in &conditions {
            if let Some(sql) = self.build_sql_condition(condition, options)? {
                sql_conditions.push(sql);
            }
        }
        Ok((sql_conditions.join(" AND "), std::mem::take(&mut self.param_values)))
    }

    fn parse_where_data(&mut self, where_data: &Value, options: &FilterWhereOptions) -> Result<(), FilterError> {
        match where_data {
            Value::Null => Ok(()),
            Value::Object(obj) => {
                for (key, value) in obj {
                    if key.starts_with('$') {
                        self.parse_logical_operator(key, value, options)?;
                    } else {
                        self.parse_field_condition(key, value, options)?;
                    }
                }
                Ok(())
            }
            _ => Err(FilterError::InvalidWhereClause("Unsupported WHERE format".to_string())),
        }
    }

    fn parse_logical_operator(&mut self, op: &str, value: &Value, options: &FilterWhereOptions) -> Result<(), FilterError> {
        match op {
            "$and" | "$or" => {
                let arr = value
                    .as_array()
                    .ok_or_else(|| FilterError::InvalidOperatorData(format!("{} requires array", op)))?;
                let mut sql_parts = Vec::new();
                for v in arr {
                    let (sql, params) = Self::generate(v, self.param_index, options)?;
                    self.param_index += params.len();
                    self.param_values.extend(params);
                    if !sql.is_empty() {
                        sql_parts.push(format!("({})", sql));
                    }
                }
                if sql_parts.is_empty() {
                    return Ok(());
                }
                let joiner = if op == "$and" { " AND " } else { " OR " };
                self.push_fragment(format!("({})", sql_parts.join(joiner)));
                Ok(())
            }
            "$not" => {
                let (sql, params) = Self::generate(value, self.param_index, options)?;
                self.param_index += params.len();
                self.param_values.extend(params);
                if !sql.is_empty() {
                    self.push_fragment(format!("NOT ({})", sql));
                }
                Ok(())
            }
            _ => Err(FilterError::UnsupportedOperator(op.to_string())),
        }
    }

    fn push_fragment(&mut self, sql: String) {
        self.conditions.push(FilterWhereInfo { column: sql, operator: FilterOp::Fragment, data: Value::Null });
    }

    fn parse_field_condition(&mut self, field: &str, value: &Value, options: &FilterWhereOptions) -> Result<(), FilterError> {
        validate_identifier(field).map_err(FilterError::InvalidColumn)?;
        if options.is_restricted() && options.column_type(field).is_none() {
            return Err(FilterError::InvalidColumn(format!("Column '{}' cannot be filtered", field)));
        }

        match value {
            Value::Object(obj) if obj.keys().all(|k| k.starts_with('$')) && !obj.is_empty() => {
                for (op_key, op_val) in obj {
                    let operator = Self::map_operator(op_key)?;
                    self.conditions.push(FilterWhereInfo { column: field.to_string(), operator, data: op_val.clone() });
                }
            }
            _ => {
                // Implicit equality: { field: value }
                self.conditions.push(FilterWhereInfo { column: field.to_string(), operator: FilterOp::Eq, data: value.clone() });
            }
        }
        Ok(())
    }

    fn map_operator(op_key: &str) -> Result<FilterOp, FilterError> {
        Ok(match op_key {
            "$eq" => FilterOp::Eq,
            "$ne" | "$neq" => FilterOp::Ne,
            "$gt" => FilterOp::Gt,
            "$gte" => FilterOp::Gte,
            "$lt" => FilterOp::Lt,
            "$lte" => FilterOp::Lte,
            "$like" => FilterOp::Like,
            "$ilike" => FilterOp::ILike,
            "$in" => FilterOp::In,
            "$nin" => FilterOp::NIn,
            "$between" => FilterOp::Between,
            "$any" => FilterOp::Any,
            other => return Err(FilterError::UnsupportedOperator(other.to_string())),
        })
    }

    fn build_sql_condition(&mut self, condition: &FilterWhereInfo, options: &FilterWhereOptions) -> Result<Option<String>, FilterError> {
        if condition.operator == FilterOp::Fragment {
            return Ok(Some(condition.column.clone()));
        }

        let column_type = options.column_type(&condition.column);
        let cast = column_type.map(|t| t.cast()).unwrap_or("");
        let quoted_column = format!("\"{}\"", condition.column);

        // Array columns compare by containment rather than equality
        if column_type == Some(ColumnType::UuidArray) {
            return match condition.operator {
                FilterOp::Eq | FilterOp::Any | FilterOp::In => {
                    let values = Self::as_list(&condition.data);
                    if values.is_empty() {
                        return Ok(Some("1=0".to_string()));
                    }
                    let params: Vec<String> = values.into_iter().map(|v| self.param(v, cast)).collect();
                    Ok(Some(format!("{} && ARRAY[{}]", quoted_column, params.join(", "))))
                }
                _ => Err(FilterError::InvalidOperatorData(format!(
                    "Column '{}' only supports membership filters",
                    condition.column
                ))),
            };
        }

        match condition.operator {
            FilterOp::Eq => {
                if condition.data.is_null() { Ok(Some(format!("{} IS NULL", quoted_column))) }
                else { Ok(Some(format!("{} = {}", quoted_column, self.param(condition.data.clone(), cast)))) }
            }
            FilterOp::Ne => {
                if condition.data.is_null() { Ok(Some(format!("{} IS NOT NULL", quoted_column))) }
                else { Ok(Some(format!("{} <> {}", quoted_column, self.param(condition.data.clone(), cast)))) }
            }
            FilterOp::Gt => Ok(Some(format!("{} > {}", quoted_column, self.param(condition.data.clone(), cast)))),
            FilterOp::Gte => Ok(Some(format!("{} >= {}", quoted_column, self.param(condition.data.clone(), cast)))),
            FilterOp::Lt => Ok(Some(format!("{} < {}", quoted_column, self.param(condition.data.clone(), cast)))),
            FilterOp::Lte => Ok(Some(format!("{} <= {}", quoted_column, self.param(condition.data.clone(), cast)))),
            FilterOp::Like => Ok(Some(format!("{}::text LIKE {}", quoted_column, self.param(condition.data.clone(), "::text")))),
            FilterOp::ILike => Ok(Some(format!("{}::text ILIKE {}", quoted_column, self.param(condition.data.clone(), "::text")))),
            FilterOp::In | FilterOp::NIn => {
                let values = Self::as_list(&condition.data);
                let negate = condition.operator == FilterOp::NIn;
                if values.is_empty() {
                    return Ok(Some(if negate { "1=1" } else { "1=0" }.to_string()));
                }
                let params: Vec<String> = values.into_iter().map(|v| self.param(v, cast)).collect();
                let keyword = if negate { "NOT IN" } else { "IN" };
                Ok(Some(format!("{} {} ({})", quoted_column, keyword, params.join(", "))))
            }
            FilterOp::Between => {
                if let Value::Array(values) = &condition.data {
                    if values.len() != 2 { return Err(FilterError::InvalidOperatorData("$between requires exactly 2 values".to_string())); }
                    let low = self.param(values[0].clone(), cast);
                    let high = self.param(values[1].clone(), cast);
                    Ok(Some(format!("{} BETWEEN {} AND {}", quoted_column, low, high)))
                } else { Err(FilterError::InvalidOperatorData("$between requires array with 2 values".to_string())) }
            }
            FilterOp::Any => Err(FilterError::InvalidOperatorData(format!(
                "$any requires an array column, '{}' is not one",
                condition.column
            ))),
            FilterOp::Fragment => Ok(None),
        }
    }

    fn as_list(data: &Value) -> Vec<Value> {
        match data {
            Value::Array(values) => values.clone(),
            other => vec![other.clone()],
        }
    }

    fn param(&mut self, value: Value, cast: &str) -> String {
        self.param_values.push(value);
        self.param_index += 1;
        format!("${}{}", self.param_index, cast)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::filter::types::ColumnSpec;
    use serde_json::json;

    const COLUMNS: &[ColumnSpec] = &[
        ColumnSpec::new("status", ColumnType::Text),
        ColumnSpec::new("client_id", ColumnType::Uuid),
        ColumnSpec::new("total", ColumnType::Numeric),
        ColumnSpec::new("people", ColumnType::UuidArray),
        ColumnSpec::new("name", ColumnType::Text),
        ColumnSpec::new("email", ColumnType::Text),
    ];

    fn options() -> FilterWhereOptions {
        FilterWhereOptions { columns: COLUMNS, search: &[] }
    }

    #[test]
    fn implicit_equality_casts_by_column_type() {
        let (sql, params) = FilterWhere::generate(&json!({ "client_id": "7d4c3f4e-8a43-4d5e-9f8e-1d2c3b4a5f60" }), 0, &options()).unwrap();
        assert_eq!(sql, "\"client_id\" = $1::uuid");
        assert_eq!(params.len(), 1);
    }

    #[test]
    fn numbering_continues_through_nested_or() {
        let where_data = json!({
            "$and": [
                { "status": { "$in": ["sent", "overdue"] } },
                { "$or": [
                    { "name": { "$ilike": "%acme%" } },
                    { "email": { "$ilike": "%acme%" } }
                ] },
                { "total": { "$gte": 100 } }
            ]
        });
        let (sql, params) = FilterWhere::generate(&where_data, 0, &options()).unwrap();
        assert_eq!(
            sql,
            "((\"status\" IN ($1::text, $2::text)) AND (((\"name\"::text ILIKE $3::text) OR (\"email\"::text ILIKE $4::text))) AND (\"total\" >= $5::numeric))"
        );
        assert_eq!(params, vec![json!("sent"), json!("overdue"), json!("%acme%"), json!("%acme%"), json!(100)]);
    }

    #[test]
    fn array_columns_use_overlap() {
        let (sql, _) = FilterWhere::generate(&json!({ "people": "7d4c3f4e-8a43-4d5e-9f8e-1d2c3b4a5f60" }), 0, &options()).unwrap();
        assert_eq!(sql, "\"people\" && ARRAY[$1::uuid]");
    }

    #[test]
    fn empty_in_matches_nothing() {
        let (sql, params) = FilterWhere::generate(&json!({ "status": { "$in": [] } }), 0, &options()).unwrap();
        assert_eq!(sql, "1=0");
        assert!(params.is_empty());
    }

    #[test]
    fn null_equality_renders_is_null() {
        let (sql, params) = FilterWhere::generate(&json!({ "client_id": null, "status": { "$ne": null } }), 0, &options()).unwrap();
        assert_eq!(sql, "\"client_id\" IS NULL AND \"status\" IS NOT NULL");
        assert!(params.is_empty());
    }

    #[test]
    fn unknown_column_is_rejected() {
        let err = FilterWhere::generate(&json!({ "password_hash": "x" }), 0, &options()).unwrap_err();
        assert!(matches!(err, FilterError::InvalidColumn(_)));
    }

    #[test]
    fn injection_in_column_name_is_rejected() {
        let err = FilterWhere::generate(&json!({ "name\" OR 1=1 --": "x" }), 0, &FilterWhereOptions::default()).unwrap_err();
        assert!(matches!(err, FilterError::InvalidColumn(_)));
    }

    #[test]
    fn between_requires_two_values() {
        let err = FilterWhere::generate(&json!({ "total": { "$between": [1] } }), 0, &options()).unwrap_err();
        assert!(matches!(err, FilterError::InvalidOperatorData(_)));
    }

    #[test]
    fn not_wraps_nested_clause() {
        let (sql, params) = FilterWhere::generate(&json!({ "$not": { "status": "paid" } }), 2, &options()).unwrap();
        assert_eq!(sql, "NOT (\"status\" = $3::text)");
        assert_eq!(params, vec![json!("paid")]);
    }
}
