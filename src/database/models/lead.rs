use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::Serialize;
use sqlx::FromRow;
use uuid::Uuid;

use super::Resource;
use crate::filter::{ColumnSpec, ColumnType, ResourceSpec};
use crate::types::text_enum;

text_enum! {
    /// Sales pipeline stage; `won` and `lost` close the lead.
    pub enum LeadStatus {
        New => "new",
        Contacted => "contacted",
        Qualified => "qualified",
        Proposal => "proposal",
        Won => "won",
        Lost => "lost",
    }
}

impl LeadStatus {
    pub fn is_open(&self) -> bool {
        !matches!(self, LeadStatus::Won | LeadStatus::Lost)
    }
}

#[derive(Debug, Clone, Serialize, FromRow)]
pub struct Lead {
    pub id: Uuid,
    pub name: String,
    pub company: Option<String>,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub source: Option<String>,
    #[sqlx(try_from = "String")]
    pub status: LeadStatus,
    pub estimated_value: Option<Decimal>,
    pub notes: Option<String>,
    pub assigned_to: Option<Uuid>,
    pub converted_client_id: Option<Uuid>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Resource for Lead {
    const SPEC: ResourceSpec = ResourceSpec {
        table: "leads",
        label: "Lead",
        columns: &[
            ColumnSpec::new("status", ColumnType::Text),
            ColumnSpec::new("source", ColumnType::Text),
            ColumnSpec::new("assigned_to", ColumnType::Uuid),
            ColumnSpec::new("converted_client_id", ColumnType::Uuid),
            ColumnSpec::new("estimated_value", ColumnType::Numeric),
            ColumnSpec::new("created_at", ColumnType::Timestamp),
        ],
        search: &["name", "company", "email"],
        sortable: &["name", "status", "estimated_value", "created_at"],
        default_sort: "created_at",
    };
}
