use std::collections::HashMap;

use chrono::{DateTime, NaiveDate};
use rust_decimal::Decimal;
use serde::Serialize;
use serde_json::{json, Map, Value};
use uuid::Uuid;

use super::types::{ColumnType, FilterData, ResourceSpec};
use crate::config;
use crate::error::FieldErrors;

const RESERVED: &[&str] = &["page", "limit", "search", "sort", "order"];

/// Parsed `?page=&limit=&search=&sort=&order=&<column>=` query string.
#[derive(Debug, Clone)]
pub struct ListParams {
    pub page: u32,
    pub limit: u32,
    pub filter: FilterData,
}

impl ListParams {
    pub fn from_query(query: &HashMap<String, String>, spec: &ResourceSpec) -> Result<Self, FieldErrors> {
        let api = &config::config().api;
        Self::parse(query, spec, api.default_page_size, api.max_page_size)
    }

    pub fn parse(
        query: &HashMap<String, String>,
        spec: &ResourceSpec,
        default_limit: u32,
        max_limit: u32,
    ) -> Result<Self, FieldErrors> {
        let mut errors = FieldErrors::new();

        let page = match query.get("page").map(|s| s.trim()) {
            None | Some("") => 1,
            Some(raw) => match raw.parse::<u32>() {
                Ok(p) if p >= 1 => p,
                _ => {
                    errors.insert("page".into(), "must be a positive integer".into());
                    1
                }
            },
        };

        let limit = match query.get("limit").map(|s| s.trim()) {
            None | Some("") => default_limit,
            Some(raw) => match raw.parse::<u32>() {
                Ok(l) if l >= 1 => l.min(max_limit),
                _ => {
                    errors.insert("limit".into(), "must be a positive integer".into());
                    default_limit
                }
            },
        };

        let sort = match query.get("sort").map(|s| s.trim()).filter(|s| !s.is_empty()) {
            None => spec.default_sort,
            Some(column) if spec.is_sortable(column) => spec.sortable.iter().copied().find(|c| *c == column).unwrap_or(spec.default_sort),
            Some(column) => {
                errors.insert("sort".into(), format!("cannot sort by '{}'", column));
                spec.default_sort
            }
        };

        let direction = match query.get("order").map(|s| s.trim().to_ascii_lowercase()) {
            None => "desc",
            Some(ref d) if d.is_empty() || d == "desc" || d == "-1" => "desc",
            Some(ref d) if d == "asc" || d == "1" => "asc",
            Some(_) => {
                errors.insert("order".into(), "must be 'asc' or 'desc'".into());
                "desc"
            }
        };

        let mut clauses: Vec<Value> = Vec::new();

        if let Some(term) = query.get("search").map(|s| s.trim()).filter(|s| !s.is_empty()) {
            if !spec.search.is_empty() {
                let pattern = format!("%{}%", escape_like(term));
                let alternatives: Vec<Value> = spec
                    .search
                    .iter()
                    .map(|column| json!({ *column: { "$ilike": pattern } }))
                    .collect();
                clauses.push(json!({ "$or": alternatives }));
            }
        }

        // Deterministic clause order regardless of HashMap iteration
        let mut keys: Vec<&String> = query.keys().filter(|k| !RESERVED.contains(&k.as_str())).collect();
        keys.sort();

        for key in keys {
            let raw = query[key].trim();
            if raw.is_empty() {
                continue;
            }

            let (column_name, operator) = if let Some(col) = key.strip_suffix("_from") {
                (col, Some("$gte"))
            } else if let Some(col) = key.strip_suffix("_to") {
                (col, Some("$lte"))
            } else {
                (key.as_str(), None)
            };

            let Some(column) = spec.column(column_name).or_else(|| spec.column(key)) else {
                errors.insert(key.clone(), "unknown filter".into());
                continue;
            };

            // A column literally named e.g. "valid_to" wins over a range bound
            let operator = if column.name == key.as_str() { None } else { operator };

            if let Some(op) = operator {
                if !column.kind.is_ordered() {
                    errors.insert(key.clone(), "range filters need a date or numeric column".into());
                    continue;
                }
                // A bare date as the upper bound of a timestamp covers that whole day
                let next_day = (op == "$lte" && column.kind == ColumnType::Timestamp)
                    .then(|| NaiveDate::parse_from_str(raw, "%Y-%m-%d").ok())
                    .flatten()
                    .and_then(|day| day.succ_opt());
                if let Some(next_day) = next_day {
                    clauses.push(json!({ column.name: { "$lt": next_day.to_string() } }));
                    continue;
                }
                match coerce(raw, column.kind) {
                    Ok(value) => clauses.push(json!({ column.name: { op: value } })),
                    Err(msg) => { errors.insert(key.clone(), msg); }
                }
                continue;
            }

            let parts: Vec<&str> = raw.split(',').map(|p| p.trim()).filter(|p| !p.is_empty()).collect();
            let mut values = Vec::with_capacity(parts.len());
            for part in parts {
                match coerce(part, column.kind) {
                    Ok(v) => values.push(v),
                    Err(msg) => {
                        errors.insert(key.clone(), msg);
                        break;
                    }
                }
            }
            if errors.contains_key(key) {
                continue;
            }
            let condition = if values.len() == 1 {
                values.remove(0)
            } else {
                json!({ "$in": values })
            };
            clauses.push(json!({ column.name: condition }));
        }

        if !errors.is_empty() {
            return Err(errors);
        }

        let where_clause = match clauses.len() {
            0 => None,
            1 => clauses.pop(),
            _ => Some(json!({ "$and": clauses })),
        };

        Ok(Self {
            page,
            limit,
            filter: FilterData {
                where_clause,
                order: Some(Value::String(order_by(sort, direction))),
                limit: Some(limit as i64),
                offset: Some(((page - 1) as i64) * limit as i64),
            },
        })
    }

    /// Adds a fixed equality condition, e.g. scoping rate cards to one person.
    pub fn scope(mut self, column: &str, value: Value) -> Self {
        let mut condition = Map::new();
        condition.insert(column.to_string(), value);
        let scoped = Value::Object(condition);
        self.filter.where_clause = Some(match self.filter.where_clause.take() {
            None => scoped,
            Some(existing) => json!({ "$and": [existing, scoped] }),
        });
        self
    }
}

/// One page of results plus the numbers the dashboard needs to page through.
#[derive(Debug, Clone, Serialize)]
pub struct Page<T> {
    pub items: Vec<T>,
    pub page: u32,
    pub limit: u32,
    pub total: i64,
}

impl<T> Page<T> {
    pub fn pages(&self) -> i64 {
        if self.limit == 0 {
            return 0;
        }
        let limit = self.limit as i64;
        (self.total + limit - 1) / limit
    }
}

/// `id` breaks ties so pages neither overlap nor skip rows with equal sort values.
fn order_by(sort: &str, direction: &str) -> String {
    if sort == "id" {
        format!("id {}", direction)
    } else {
        format!("{} {}, id asc", sort, direction)
    }
}

fn escape_like(term: &str) -> String {
    let mut out = String::with_capacity(term.len());
    for c in term.chars() {
        if matches!(c, '%' | '_' | '\\') {
            out.push('\\');
        }
        out.push(c);
    }
    out
}

/// Validates a query-string value against the column type so bad input is a
/// 400 rather than a database cast error.
fn coerce(raw: &str, kind: ColumnType) -> Result<Value, String> {
    match kind {
        ColumnType::Text => Ok(Value::String(raw.to_string())),
        ColumnType::Uuid | ColumnType::UuidArray => raw
            .parse::<Uuid>()
            .map(|u| Value::String(u.to_string()))
            .map_err(|_| format!("'{}' is not a valid id", raw)),
        ColumnType::Numeric => raw
            .parse::<Decimal>()
            .map(|d| Value::String(d.to_string()))
            .map_err(|_| format!("'{}' is not a number", raw)),
        ColumnType::Integer => raw
            .parse::<i64>()
            .map(|i| json!(i))
            .map_err(|_| format!("'{}' is not an integer", raw)),
        ColumnType::Boolean => match raw.to_ascii_lowercase().as_str() {
            "true" | "1" | "yes" => Ok(Value::Bool(true)),
            "false" | "0" | "no" => Ok(Value::Bool(false)),
            _ => Err(format!("'{}' is not a boolean", raw)),
        },
        ColumnType::Date => NaiveDate::parse_from_str(raw, "%Y-%m-%d")
            .map(|d| Value::String(d.to_string()))
            .map_err(|_| format!("'{}' is not a date (YYYY-MM-DD)", raw)),
        ColumnType::Timestamp => {
            if let Ok(ts) = DateTime::parse_from_rfc3339(raw) {
                return Ok(Value::String(ts.to_rfc3339()));
            }
            NaiveDate::parse_from_str(raw, "%Y-%m-%d")
                .map(|d| Value::String(d.to_string()))
                .map_err(|_| format!("'{}' is not a timestamp", raw))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::filter::filter::Filter;
    use crate::filter::types::ColumnSpec;

    const SPEC: ResourceSpec = ResourceSpec {
        table: "invoices",
        label: "Invoice",
        columns: &[
            ColumnSpec::new("status", ColumnType::Text),
            ColumnSpec::new("client_id", ColumnType::Uuid),
            ColumnSpec::new("issue_date", ColumnType::Date),
            ColumnSpec::new("total", ColumnType::Numeric),
            ColumnSpec::new("invoice_number", ColumnType::Text),
        ],
        search: &["invoice_number", "notes"],
        sortable: &["issue_date", "total", "created_at"],
        default_sort: "created_at",
    };

    fn query(pairs: &[(&str, &str)]) -> HashMap<String, String> {
        pairs.iter().map(|(k, v)| (k.to_string(), v.to_string())).collect()
    }

    #[test]
    fn defaults_to_first_page_newest_first() {
        let params = ListParams::parse(&HashMap::new(), &SPEC, 10, 100).unwrap();
        assert_eq!(params.page, 1);
        assert_eq!(params.limit, 10);
        assert_eq!(params.filter.offset, Some(0));
        assert_eq!(params.filter.order, Some(json!("created_at desc, id asc")));
        assert!(params.filter.where_clause.is_none());
    }

    #[test]
    fn skip_is_page_minus_one_times_limit() {
        let params = ListParams::parse(&query(&[("page", "3"), ("limit", "25")]), &SPEC, 10, 100).unwrap();
        assert_eq!(params.filter.offset, Some(50));
        assert_eq!(params.filter.limit, Some(25));
    }

    #[test]
    fn limit_is_capped() {
        let params = ListParams::parse(&query(&[("limit", "5000")]), &SPEC, 10, 100).unwrap();
        assert_eq!(params.limit, 100);
    }

    #[test]
    fn invalid_paging_reports_field_errors() {
        let errors = ListParams::parse(&query(&[("page", "0"), ("limit", "abc")]), &SPEC, 10, 100).unwrap_err();
        assert!(errors.contains_key("page"));
        assert!(errors.contains_key("limit"));
    }

    #[test]
    fn unknown_filters_and_sorts_are_rejected() {
        let errors = ListParams::parse(&query(&[("password_hash", "x"), ("sort", "secret")]), &SPEC, 10, 100).unwrap_err();
        assert_eq!(errors.get("password_hash").map(String::as_str), Some("unknown filter"));
        assert!(errors.contains_key("sort"));
    }

    #[test]
    fn comma_values_become_in_and_ranges_become_bounds() {
        let params = ListParams::parse(
            &query(&[("status", "sent,overdue"), ("issue_date_from", "2024-01-01"), ("issue_date_to", "2024-01-31")]),
            &SPEC,
            10,
            100,
        )
        .unwrap();
        assert_eq!(
            params.filter.where_clause,
            Some(json!({ "$and": [
                { "issue_date": { "$gte": "2024-01-01" } },
                { "issue_date": { "$lte": "2024-01-31" } },
                { "status": { "$in": ["sent", "overdue"] } }
            ] }))
        );
    }

    #[test]
    fn typed_values_are_validated() {
        let errors = ListParams::parse(
            &query(&[("client_id", "not-a-uuid"), ("total_from", "ten"), ("issue_date", "31/01/2024")]),
            &SPEC,
            10,
            100,
        )
        .unwrap_err();
        assert_eq!(errors.len(), 3);
    }

    #[test]
    fn range_on_text_column_is_rejected() {
        let errors = ListParams::parse(&query(&[("status_from", "a")]), &SPEC, 10, 100).unwrap_err();
        assert!(errors.contains_key("status_from"));
    }

    #[test]
    fn search_escapes_wildcards_and_spans_columns() {
        let params = ListParams::parse(&query(&[("search", "50%_off")]), &SPEC, 10, 100).unwrap();
        assert_eq!(
            params.filter.where_clause,
            Some(json!({ "$or": [
                { "invoice_number": { "$ilike": "%50\\%\\_off%" } },
                { "notes": { "$ilike": "%50\\%\\_off%" } }
            ] }))
        );
    }

    #[test]
    fn scope_combines_with_existing_filters() {
        let params = ListParams::parse(&query(&[("status", "paid")]), &SPEC, 10, 100)
            .unwrap()
            .scope("client_id", json!("7d4c3f4e-8a43-4d5e-9f8e-1d2c3b4a5f60"));
        assert_eq!(
            params.filter.where_clause,
            Some(json!({ "$and": [
                { "status": "paid" },
                { "client_id": "7d4c3f4e-8a43-4d5e-9f8e-1d2c3b4a5f60" }
            ] }))
        );
    }

    #[test]
    fn parsed_params_compile_to_sql() {
        let params = ListParams::parse(&query(&[("status", "paid"), ("sort", "total"), ("order", "asc"), ("page", "2")]), &SPEC, 10, 100).unwrap();
        let mut filter = Filter::for_spec(&SPEC).unwrap();
        filter.assign(params.filter).unwrap();
        assert_eq!(
            filter.to_sql().unwrap().query,
            "SELECT * FROM \"invoices\" WHERE \"status\" = $1::text ORDER BY \"total\" ASC, \"id\" ASC LIMIT 10 OFFSET 10"
        );
    }

    #[test]
    fn date_only_upper_bound_on_a_timestamp_covers_the_whole_day() {
        const CLIENTS: ResourceSpec = ResourceSpec {
            table: "clients",
            label: "Client",
            columns: &[ColumnSpec::new("created_at", ColumnType::Timestamp)],
            search: &["name"],
            sortable: &["created_at"],
            default_sort: "created_at",
        };

        let params = ListParams::parse(
            &query(&[("created_at_from", "2026-10-16"), ("created_at_to", "2026-10-16")]),
            &CLIENTS,
            10,
            100,
        )
        .unwrap();
        assert_eq!(
            params.filter.where_clause,
            Some(json!({ "$and": [
                { "created_at": { "$gte": "2026-10-16" } },
                { "created_at": { "$lt": "2026-10-17" } }
            ] }))
        );

        // A full timestamp is kept as an inclusive bound
        let params =
            ListParams::parse(&query(&[("created_at_to", "2026-10-16T12:00:00Z")]), &CLIENTS, 10, 100).unwrap();
        let clause = serde_json::to_string(&params.filter.where_clause).unwrap();
        assert!(clause.contains("$lte"), "{clause}");
    }

    #[test]
    fn page_count_rounds_up() {
        let page: Page<u8> = Page { items: vec![], page: 1, limit: 10, total: 21 };
        assert_eq!(page.pages(), 3);
        let empty: Page<u8> = Page { items: vec![], page: 1, limit: 10, total: 0 };
        assert_eq!(empty.pages(), 0);
    }
}
