use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::Serialize;
use sqlx::FromRow;
use uuid::Uuid;

use super::Resource;
use crate::filter::{ColumnSpec, ColumnType, ResourceSpec};

#[derive(Debug, Clone, Serialize, FromRow)]
pub struct RateCard {
    pub id: Uuid,
    pub person_id: Uuid,
    pub platform: String,
    pub deliverable: String,
    pub rate: Decimal,
    pub currency: String,
    pub notes: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Resource for RateCard {
    const SPEC: ResourceSpec = ResourceSpec {
        table: "rate_cards",
        label: "Rate card",
        columns: &[
            ColumnSpec::new("person_id", ColumnType::Uuid),
            ColumnSpec::new("platform", ColumnType::Text),
            ColumnSpec::new("currency", ColumnType::Text),
            ColumnSpec::new("rate", ColumnType::Numeric),
            ColumnSpec::new("created_at", ColumnType::Timestamp),
        ],
        search: &["platform", "deliverable"],
        sortable: &["platform", "deliverable", "rate", "created_at"],
        default_sort: "created_at",
    };
}
