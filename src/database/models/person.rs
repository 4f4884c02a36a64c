use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::Serialize;
use sqlx::FromRow;
use uuid::Uuid;

use super::Resource;
use crate::filter::{ColumnSpec, ColumnType, ResourceSpec};
use crate::types::text_enum;

text_enum! {
    pub enum PersonStatus {
        Active => "active",
        Inactive => "inactive",
    }
}

/// An influencer on the agency's roster.
#[derive(Debug, Clone, Serialize, FromRow)]
pub struct Person {
    pub id: Uuid,
    pub name: String,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub platform: Option<String>,
    pub handle: Option<String>,
    pub followers: i64,
    pub engagement_rate: Option<Decimal>,
    pub category: Option<String>,
    pub location: Option<String>,
    pub notes: Option<String>,
    #[sqlx(try_from = "String")]
    pub status: PersonStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Resource for Person {
    const SPEC: ResourceSpec = ResourceSpec {
        table: "people",
        label: "Person",
        columns: &[
            ColumnSpec::new("status", ColumnType::Text),
            ColumnSpec::new("platform", ColumnType::Text),
            ColumnSpec::new("category", ColumnType::Text),
            ColumnSpec::new("location", ColumnType::Text),
            ColumnSpec::new("followers", ColumnType::Integer),
            ColumnSpec::new("engagement_rate", ColumnType::Numeric),
            ColumnSpec::new("created_at", ColumnType::Timestamp),
        ],
        search: &["name", "handle", "email", "category"],
        sortable: &["name", "followers", "engagement_rate", "created_at"],
        default_sort: "created_at",
    };
}
