use chrono::{DateTime, Utc};
use serde::Serialize;
use sqlx::FromRow;
use uuid::Uuid;

use super::Resource;
use crate::filter::{ColumnSpec, ColumnType, ResourceSpec};

/// Reusable net-days and terms text applied to new invoices.
#[derive(Debug, Clone, Serialize, FromRow)]
pub struct PaymentTerm {
    pub id: Uuid,
    pub name: String,
    pub due_days: i32,
    pub terms: Option<String>,
    pub is_default: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Resource for PaymentTerm {
    const SPEC: ResourceSpec = ResourceSpec {
        table: "payment_terms",
        label: "Payment terms",
        columns: &[
            ColumnSpec::new("is_default", ColumnType::Boolean),
            ColumnSpec::new("due_days", ColumnType::Integer),
        ],
        search: &["name", "terms"],
        sortable: &["name", "due_days", "created_at"],
        default_sort: "created_at",
    };
}
