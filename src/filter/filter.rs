use serde_json::Value;

use super::error::FilterError;
use super::filter_order::FilterOrder;
use super::filter_where::FilterWhere;
use super::types::{FilterData, FilterOrderInfo, FilterWhereOptions, ResourceSpec, SqlResult};

/// Compiles `FilterData` into SELECT / COUNT statements for one table.
pub struct Filter {
    table_name: String,
    where_data: Option<Value>,
    order_data: Vec<FilterOrderInfo>,
    limit: Option<i64>,
    offset: Option<i64>,
    options: FilterWhereOptions,
}

impl Filter {
    pub fn new(table_name: impl Into<String>) -> Result<Self, FilterError> {
        let table_name = table_name.into();
        validate_identifier(&table_name).map_err(FilterError::InvalidTableName)?;
        Ok(Self {
            table_name,
            where_data: None,
            order_data: vec![],
            limit: None,
            offset: None,
            options: FilterWhereOptions::default(),
        })
    }

    /// Filter restricted to the columns a resource exposes.
    pub fn for_spec(spec: &ResourceSpec) -> Result<Self, FilterError> {
        let mut filter = Self::new(spec.table)?;
        filter.options = FilterWhereOptions::for_spec(spec);
        Ok(filter)
    }

    pub fn assign(&mut self, data: FilterData) -> Result<&mut Self, FilterError> {
        if let Some(where_clause) = data.where_clause { self.where_clause(where_clause)?; }
        if let Some(order) = data.order { self.order(order)?; }
        if let Some(limit) = data.limit { self.limit(limit, data.offset)?; }
        Ok(self)
    }

    pub fn where_clause(&mut self, conditions: Value) -> Result<&mut Self, FilterError> {
        FilterWhere::validate(&conditions)?;
        self.where_data = Some(conditions);
        Ok(self)
    }

    pub fn order(&mut self, order_spec: Value) -> Result<&mut Self, FilterError> {
        self.order_data = FilterOrder::validate_and_parse(&order_spec)?;
        Ok(self)
    }

    pub fn limit(&mut self, limit: i64, offset: Option<i64>) -> Result<&mut Self, FilterError> {
        if limit < 0 { return Err(FilterError::InvalidLimit("Limit must be non-negative".to_string())); }
        if let Some(off) = offset { if off < 0 { return Err(FilterError::InvalidOffset("Offset must be non-negative".to_string())); } }
        self.limit = Some(limit);
        self.offset = offset;
        Ok(self)
    }

    pub fn to_sql(&self) -> Result<SqlResult, FilterError> {
        let where_result = self.to_where_sql()?;
        let order_clause = FilterOrder::generate(&self.order_data)?;
        let limit_clause = self.build_limit_clause();

        let query = [
            "SELECT *".to_string(),
            format!("FROM \"{}\"", self.table_name),
            if where_result.query.is_empty() { String::new() } else { format!("WHERE {}", where_result.query) },
            order_clause,
            limit_clause,
        ].into_iter().filter(|s| !s.is_empty()).collect::<Vec<_>>().join(" ");

        Ok(SqlResult { query, params: where_result.params })
    }

    pub fn to_where_sql(&self) -> Result<SqlResult, FilterError> {
        let (query, params) = match self.where_data {
            Some(ref where_data) => FilterWhere::generate(where_data, 0, &self.options)?,
            None => (String::new(), vec![]),
        };
        Ok(SqlResult { query, params })
    }

    pub fn to_count_sql(&self) -> Result<SqlResult, FilterError> {
        let where_result = self.to_where_sql()?;
        let query = if where_result.query.is_empty() {
            format!("SELECT COUNT(*) AS count FROM \"{}\"", self.table_name)
        } else {
            format!("SELECT COUNT(*) AS count FROM \"{}\" WHERE {}", self.table_name, where_result.query)
        };
        Ok(SqlResult { query, params: where_result.params })
    }

    fn build_limit_clause(&self) -> String {
        match (self.limit, self.offset) {
            (Some(l), Some(o)) if o > 0 => format!("LIMIT {} OFFSET {}", l, o),
            (Some(l), _) => format!("LIMIT {}", l),
            _ => String::new(),
        }
    }
}

/// Accepts `[A-Za-z_][A-Za-z0-9_]*`; identifiers are always double-quoted as well.
pub fn validate_identifier(name: &str) -> Result<(), String> {
    let mut chars = name.chars();
    match chars.next() {
        None => Err("Identifier cannot be empty".to_string()),
        Some(first) if !(first.is_ascii_alphabetic() || first == '_') => {
            Err(format!("Invalid identifier format: {}", name))
        }
        Some(_) if !chars.all(|c| c.is_ascii_alphanumeric() || c == '_') => {
            Err(format!("Invalid identifier format: {}", name))
        }
        Some(_) => Ok(()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::filter::types::{ColumnSpec, ColumnType};
    use serde_json::json;

    const SPEC: ResourceSpec = ResourceSpec {
        table: "invoices",
        label: "Invoice",
        columns: &[
            ColumnSpec::new("status", ColumnType::Text),
            ColumnSpec::new("issue_date", ColumnType::Date),
        ],
        search: &["invoice_number"],
        sortable: &["issue_date"],
        default_sort: "issue_date",
    };

    #[test]
    fn renders_select_with_where_order_and_paging() {
        let mut filter = Filter::for_spec(&SPEC).unwrap();
        filter
            .assign(FilterData {
                where_clause: Some(json!({ "status": "sent", "issue_date": { "$gte": "2024-01-01" } })),
                order: Some(json!("issue_date desc")),
                limit: Some(20),
                offset: Some(40),
            })
            .unwrap();

        let sql = filter.to_sql().unwrap();
        assert_eq!(
            sql.query,
            "SELECT * FROM \"invoices\" WHERE \"issue_date\" >= $1::date AND \"status\" = $2::text ORDER BY \"issue_date\" DESC LIMIT 20 OFFSET 40"
        );
        assert_eq!(sql.params, vec![json!("2024-01-01"), json!("sent")]);
    }

    #[test]
    fn count_shares_where_clause() {
        let mut filter = Filter::for_spec(&SPEC).unwrap();
        filter.where_clause(json!({ "status": "paid" })).unwrap();
        let sql = filter.to_count_sql().unwrap();
        assert_eq!(sql.query, "SELECT COUNT(*) AS count FROM \"invoices\" WHERE \"status\" = $1::text");
    }

    #[test]
    fn no_conditions_omits_where() {
        let filter = Filter::new("clients").unwrap();
        assert_eq!(filter.to_sql().unwrap().query, "SELECT * FROM \"clients\"");
        assert_eq!(filter.to_count_sql().unwrap().query, "SELECT COUNT(*) AS count FROM \"clients\"");
    }

    #[test]
    fn rejects_bad_table_names() {
        assert!(Filter::new("clients; DROP TABLE users").is_err());
        assert!(Filter::new("").is_err());
        assert!(Filter::new("1clients").is_err());
    }

    #[test]
    fn rejects_negative_paging() {
        let mut filter = Filter::new("clients").unwrap();
        assert!(matches!(filter.limit(-1, None), Err(FilterError::InvalidLimit(_))));
        assert!(matches!(filter.limit(10, Some(-5)), Err(FilterError::InvalidOffset(_))));
    }
}
