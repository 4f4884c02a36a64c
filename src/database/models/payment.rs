use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::Serialize;
use sqlx::FromRow;
use uuid::Uuid;

use super::Resource;
use crate::filter::{ColumnSpec, ColumnType, ResourceSpec};
use crate::types::text_enum;

text_enum! {
    pub enum PaymentMethod {
        BankTransfer => "bank_transfer",
        Cash => "cash",
        Check => "check",
        Card => "card",
        Upi => "upi",
        Other => "other",
    }
}

#[derive(Debug, Clone, Serialize, FromRow)]
pub struct Payment {
    pub id: Uuid,
    pub payment_number: String,
    pub invoice_id: Uuid,
    pub client_id: Uuid,
    pub amount: Decimal,
    pub payment_date: NaiveDate,
    #[sqlx(try_from = "String")]
    pub method: PaymentMethod,
    pub reference: Option<String>,
    pub notes: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Resource for Payment {
    const SPEC: ResourceSpec = ResourceSpec {
        table: "payments",
        label: "Payment",
        columns: &[
            ColumnSpec::new("invoice_id", ColumnType::Uuid),
            ColumnSpec::new("client_id", ColumnType::Uuid),
            ColumnSpec::new("method", ColumnType::Text),
            ColumnSpec::new("payment_date", ColumnType::Date),
            ColumnSpec::new("amount", ColumnType::Numeric),
        ],
        search: &["payment_number", "reference", "notes"],
        sortable: &["payment_number", "payment_date", "amount", "created_at"],
        default_sort: "payment_date",
    };
}
