use chrono::{DateTime, Utc};
use serde::Serialize;
use sqlx::FromRow;
use uuid::Uuid;

use super::Resource;
use crate::filter::{ColumnSpec, ColumnType, ResourceSpec};
use crate::types::text_enum;

text_enum! {
    pub enum ClientStatus {
        Active => "active",
        Inactive => "inactive",
        Prospect => "prospect",
    }
}

#[derive(Debug, Clone, Serialize, FromRow)]
pub struct Client {
    pub id: Uuid,
    pub name: String,
    pub company: Option<String>,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub address: Option<String>,
    pub gst_number: Option<String>,
    pub notes: Option<String>,
    #[sqlx(try_from = "String")]
    pub status: ClientStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Resource for Client {
    const SPEC: ResourceSpec = ResourceSpec {
        table: "clients",
        label: "Client",
        columns: &[
            ColumnSpec::new("status", ColumnType::Text),
            ColumnSpec::new("company", ColumnType::Text),
            ColumnSpec::new("created_at", ColumnType::Timestamp),
        ],
        search: &["name", "company", "email", "phone"],
        sortable: &["name", "company", "status", "created_at"],
        default_sort: "created_at",
    };
}
