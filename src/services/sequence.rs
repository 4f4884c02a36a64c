use chrono::NaiveDate;
use sqlx::PgConnection;

use super::ServiceError;
use crate::billing::{month_prefix, next_number, suffix_pattern};

/// Documents numbered `PREFIX-YYYYMM-NNNN`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Sequence {
    Invoice,
    Payment,
}

impl Sequence {
    fn table(&self) -> &'static str {
        match self {
            Sequence::Invoice => "invoices",
            Sequence::Payment => "payments",
        }
    }

    fn column(&self) -> &'static str {
        match self {
            Sequence::Invoice => "invoice_number",
            Sequence::Payment => "payment_number",
        }
    }
}

/// Allocates the next number for the month of `date`. Must run inside a
/// transaction: the advisory lock is held until it commits, so two
/// concurrent saves cannot read the same highest suffix.
pub async fn allocate(
    conn: &mut PgConnection,
    sequence: Sequence,
    prefix: &str,
    date: NaiveDate,
) -> Result<String, ServiceError> {
    sqlx::query("SELECT pg_advisory_xact_lock(hashtext($1))")
        .bind(format!("{}:{}", sequence.table(), month_prefix(prefix, date)))
        .execute(&mut *conn)
        .await?;

    // Only all-digit suffixes count, so a hand-entered `INV-202610-0001-R`
    // cannot hide the real high-water mark
    let sql = format!(
        "SELECT MAX(substring({col} FROM char_length($2) + 1)::bigint) FROM {table} WHERE {col} ~ $1",
        col = sequence.column(),
        table = sequence.table(),
    );
    let highest: Option<i64> = sqlx::query_scalar(&sql)
        .bind(suffix_pattern(prefix, date))
        .bind(month_prefix(prefix, date))
        .fetch_one(&mut *conn)
        .await?;

    Ok(next_number(prefix, date, highest))
}
