use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum FilterOp {
    #[serde(rename = "$eq")] Eq,
    #[serde(rename = "$ne")] Ne,
    #[serde(rename = "$gt")] Gt,
    #[serde(rename = "$gte")] Gte,
    #[serde(rename = "$lt")] Lt,
    #[serde(rename = "$lte")] Lte,

    #[serde(rename = "$like")] Like,
    #[serde(rename = "$ilike")] ILike,

    #[serde(rename = "$in")] In,
    #[serde(rename = "$nin")] NIn,

    #[serde(rename = "$any")] Any,

    #[serde(rename = "$between")] Between,

    // Already-rendered SQL fragment produced by $and / $or / $not
    #[serde(skip)] Fragment,
}

/// Postgres type of a filterable column, used to cast bound parameters.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ColumnType {
    Text,
    Uuid,
    Numeric,
    Integer,
    Boolean,
    Date,
    Timestamp,
    /// `UUID[]`; comparisons are made element-wise
    UuidArray,
}

impl ColumnType {
    /// Cast appended to a placeholder so text-bound values compare correctly.
    pub fn cast(&self) -> &'static str {
        match self {
            ColumnType::Text => "::text",
            ColumnType::Uuid | ColumnType::UuidArray => "::uuid",
            ColumnType::Numeric => "::numeric",
            ColumnType::Integer => "::bigint",
            ColumnType::Boolean => "::boolean",
            ColumnType::Date => "::date",
            ColumnType::Timestamp => "::timestamptz",
        }
    }

    /// Whether range bounds (`_from` / `_to`) make sense for this column.
    pub fn is_ordered(&self) -> bool {
        matches!(
            self,
            ColumnType::Numeric | ColumnType::Integer | ColumnType::Date | ColumnType::Timestamp
        )
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ColumnSpec {
    pub name: &'static str,
    pub kind: ColumnType,
}

impl ColumnSpec {
    pub const fn new(name: &'static str, kind: ColumnType) -> Self {
        Self { name, kind }
    }
}

/// Listing metadata for one table: which columns clients may filter,
/// search and sort on.
#[derive(Debug, Clone, Copy)]
pub struct ResourceSpec {
    pub table: &'static str,
    /// Human readable singular name used in messages ("Client", "Invoice")
    pub label: &'static str,
    pub columns: &'static [ColumnSpec],
    pub search: &'static [&'static str],
    pub sortable: &'static [&'static str],
    pub default_sort: &'static str,
}

impl ResourceSpec {
    pub fn column(&self, name: &str) -> Option<&ColumnSpec> {
        self.columns.iter().find(|c| c.name == name)
    }

    pub fn is_sortable(&self, name: &str) -> bool {
        self.sortable.contains(&name)
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct FilterData {
    pub where_clause: Option<serde_json::Value>,
    pub order: Option<serde_json::Value>,
    pub limit: Option<i64>,
    pub offset: Option<i64>,
}

#[derive(Debug, Clone)]
pub struct FilterWhereInfo {
    pub column: String,
    pub operator: FilterOp,
    pub data: serde_json::Value,
}

/// Column typing available while rendering a WHERE clause. An empty column
/// list accepts any valid identifier and binds values uncast.
#[derive(Debug, Clone, Copy, Default)]
pub struct FilterWhereOptions {
    pub columns: &'static [ColumnSpec],
    /// Free-text columns, matched as `Text` when not listed in `columns`
    pub search: &'static [&'static str],
}

impl FilterWhereOptions {
    pub fn for_spec(spec: &ResourceSpec) -> Self {
        Self { columns: spec.columns, search: spec.search }
    }

    pub fn is_restricted(&self) -> bool {
        !self.columns.is_empty() || !self.search.is_empty()
    }

    pub fn column_type(&self, column: &str) -> Option<ColumnType> {
        self.columns
            .iter()
            .find(|c| c.name == column)
            .map(|c| c.kind)
            .or_else(|| self.search.contains(&column).then_some(ColumnType::Text))
    }
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

#[derive(Debug, Clone)]
pub struct FilterOrderInfo {
    pub column: String,
    pub sort: SortDirection,
}

#[derive(Debug, Clone)]
pub struct SqlResult {
    pub query: String,
    pub params: Vec<serde_json::Value>,
}
