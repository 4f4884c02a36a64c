use chrono::{DateTime, Utc};
use serde::Serialize;
use sqlx::FromRow;
use uuid::Uuid;

use super::Resource;
use crate::filter::{ColumnSpec, ColumnType, ResourceSpec};
use crate::types::text_enum;

text_enum! {
    /// Access level, ordered from least to most privileged.
    pub enum Role {
        Staff => "staff",
        Manager => "manager",
        Admin => "admin",
    }
}

impl Role {
    /// True when this role may perform actions that require `required`.
    pub fn allows(&self, required: Role) -> bool {
        *self >= required
    }
}

#[derive(Debug, Clone, Serialize, FromRow)]
pub struct User {
    pub id: Uuid,
    pub name: String,
    pub email: String,
    #[serde(skip_serializing)]
    pub password_hash: String,
    #[sqlx(try_from = "String")]
    pub role: Role,
    pub is_active: bool,
    pub last_login_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Resource for User {
    const SPEC: ResourceSpec = ResourceSpec {
        table: "users",
        label: "User",
        columns: &[
            ColumnSpec::new("role", ColumnType::Text),
            ColumnSpec::new("is_active", ColumnType::Boolean),
            ColumnSpec::new("created_at", ColumnType::Timestamp),
            ColumnSpec::new("last_login_at", ColumnType::Timestamp),
        ],
        search: &["name", "email"],
        sortable: &["name", "email", "role", "created_at", "last_login_at"],
        default_sort: "created_at",
    };
}
