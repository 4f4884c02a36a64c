use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::Serialize;
use sqlx::FromRow;
use uuid::Uuid;

use super::Resource;
use crate::filter::{ColumnSpec, ColumnType, ResourceSpec};
use crate::types::text_enum;

text_enum! {
    pub enum ProjectStatus {
        Planning => "planning",
        Active => "active",
        OnHold => "on_hold",
        Completed => "completed",
        Cancelled => "cancelled",
    }
}

/// A client campaign and the influencers booked on it.
#[derive(Debug, Clone, Serialize, FromRow)]
pub struct Project {
    pub id: Uuid,
    pub name: String,
    pub client_id: Uuid,
    pub description: Option<String>,
    #[sqlx(try_from = "String")]
    pub status: ProjectStatus,
    pub start_date: Option<NaiveDate>,
    pub end_date: Option<NaiveDate>,
    pub budget: Option<Decimal>,
    pub people: Vec<Uuid>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Resource for Project {
    const SPEC: ResourceSpec = ResourceSpec {
        table: "projects",
        label: "Project",
        columns: &[
            ColumnSpec::new("status", ColumnType::Text),
            ColumnSpec::new("client_id", ColumnType::Uuid),
            ColumnSpec::new("people", ColumnType::UuidArray),
            ColumnSpec::new("start_date", ColumnType::Date),
            ColumnSpec::new("end_date", ColumnType::Date),
            ColumnSpec::new("budget", ColumnType::Numeric),
        ],
        search: &["name", "description"],
        sortable: &["name", "status", "start_date", "end_date", "budget", "created_at"],
        default_sort: "created_at",
    };
}
