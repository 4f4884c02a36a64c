use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::Serialize;
use sqlx::{types::Json, FromRow};
use uuid::Uuid;

use super::Resource;
use crate::filter::{ColumnSpec, ColumnType, ResourceSpec};

pub use crate::billing::{DiscountType, InvoiceStatus, LineItem};

#[derive(Debug, Clone, Serialize, FromRow)]
pub struct Invoice {
    pub id: Uuid,
    pub invoice_number: String,
    pub client_id: Uuid,
    pub project_id: Option<Uuid>,
    pub payment_term_id: Option<Uuid>,
    pub issue_date: NaiveDate,
    pub due_date: NaiveDate,
    pub line_items: Json<Vec<LineItem>>,
    pub subtotal: Decimal,
    #[sqlx(try_from = "String")]
    pub discount_type: DiscountType,
    pub discount_value: Decimal,
    pub discount_amount: Decimal,
    pub tax_rate: Decimal,
    pub tax_amount: Decimal,
    pub total: Decimal,
    pub amount_paid: Decimal,
    pub balance_due: Decimal,
    pub currency: String,
    #[sqlx(try_from = "String")]
    pub status: InvoiceStatus,
    pub notes: Option<String>,
    pub terms: Option<String>,
    pub sent_at: Option<DateTime<Utc>>,
    pub paid_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Resource for Invoice {
    const SPEC: ResourceSpec = ResourceSpec {
        table: "invoices",
        label: "Invoice",
        columns: &[
            ColumnSpec::new("status", ColumnType::Text),
            ColumnSpec::new("client_id", ColumnType::Uuid),
            ColumnSpec::new("project_id", ColumnType::Uuid),
            ColumnSpec::new("invoice_number", ColumnType::Text),
            ColumnSpec::new("issue_date", ColumnType::Date),
            ColumnSpec::new("due_date", ColumnType::Date),
            ColumnSpec::new("total", ColumnType::Numeric),
            ColumnSpec::new("balance_due", ColumnType::Numeric),
            ColumnSpec::new("currency", ColumnType::Text),
        ],
        search: &["invoice_number", "notes"],
        sortable: &["invoice_number", "issue_date", "due_date", "total", "balance_due", "status", "created_at"],
        default_sort: "created_at",
    };
}
