use std::collections::BTreeMap;

use chrono::{Datelike, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::Serialize;
use sqlx::PgPool;

use super::ServiceError;
use crate::config;
use crate::database::models::LeadStatus;

#[derive(Debug, Serialize)]
pub struct DashboardSummary {
    pub clients: ClientCounts,
    pub active_projects: i64,
    pub active_people: i64,
    pub leads: LeadPipeline,
    pub invoices: InvoiceTotals,
    pub payments_this_month: PaymentTotals,
}

#[derive(Debug, Serialize, sqlx::FromRow)]
pub struct ClientCounts {
    pub total: i64,
    pub active: i64,
}

#[derive(Debug, Serialize, PartialEq, Eq)]
pub struct LeadPipeline {
    pub open: i64,
    pub by_status: BTreeMap<&'static str, i64>,
}

impl LeadPipeline {
    /// Builds the pipeline from `(status, count)` rows, listing every status.
    fn from_rows(rows: Vec<(String, i64)>) -> Self {
        let mut by_status: BTreeMap<&'static str, i64> = LeadStatus::ALL.iter().map(|s| (s.as_str(), 0)).collect();
        let mut open = 0;
        for (status, count) in rows {
            let Ok(status) = status.parse::<LeadStatus>() else {
                continue;
            };
            *by_status.entry(status.as_str()).or_insert(0) += count;
            if status.is_open() {
                open += count;
            }
        }
        Self { open, by_status }
    }
}

/// Money over issued invoices, i.e. everything except drafts and cancellations.
#[derive(Debug, Serialize, sqlx::FromRow)]
pub struct InvoiceTotals {
    pub invoiced: Decimal,
    pub collected: Decimal,
    pub outstanding: Decimal,
    pub overdue_count: i64,
    pub overdue_amount: Decimal,
    #[sqlx(skip)]
    pub currency: String,
}

#[derive(Debug, Serialize, sqlx::FromRow)]
pub struct PaymentTotals {
    pub count: i64,
    pub amount: Decimal,
}

fn month_start(today: NaiveDate) -> NaiveDate {
    today.with_day(1).unwrap_or(today)
}

pub struct DashboardService {
    pool: PgPool,
}

impl DashboardService {
    pub fn new() -> Result<Self, ServiceError> {
        Ok(Self::with_pool(super::pool()?))
    }

    pub fn with_pool(pool: PgPool) -> Self {
        Self { pool }
    }

    pub async fn summary(&self) -> Result<DashboardSummary, ServiceError> {
        let since = month_start(Utc::now().date_naive());

        let clients = sqlx::query_as::<_, ClientCounts>(
            "SELECT COUNT(*) AS total, COUNT(*) FILTER (WHERE status = 'active') AS active FROM clients",
        )
        .fetch_one(&self.pool);

        let active_projects = sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM projects WHERE status = 'active'")
            .fetch_one(&self.pool);

        let active_people = sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM people WHERE status = 'active'")
            .fetch_one(&self.pool);

        let leads = sqlx::query_as::<_, (String, i64)>("SELECT status, COUNT(*) FROM leads GROUP BY status")
            .fetch_all(&self.pool);

        let invoices = sqlx::query_as::<_, InvoiceTotals>(
            r#"
            SELECT COALESCE(SUM(total), 0)                                        AS invoiced,
                   COALESCE(SUM(amount_paid), 0)                                  AS collected,
                   COALESCE(SUM(balance_due), 0)                                  AS outstanding,
                   COUNT(*) FILTER (WHERE status = 'overdue')                     AS overdue_count,
                   COALESCE(SUM(balance_due) FILTER (WHERE status = 'overdue'), 0) AS overdue_amount
              FROM invoices
             WHERE status NOT IN ('draft', 'cancelled')
            "#,
        )
        .fetch_one(&self.pool);

        let payments = sqlx::query_as::<_, PaymentTotals>(
            "SELECT COUNT(*) AS count, COALESCE(SUM(amount), 0) AS amount FROM payments WHERE payment_date >= $1",
        )
        .bind(since)
        .fetch_one(&self.pool);

        let (clients, active_projects, active_people, leads, mut invoices, payments_this_month) =
            futures::try_join!(clients, active_projects, active_people, leads, invoices, payments)?;
        invoices.currency = config::config().billing.currency.clone();

        Ok(DashboardSummary {
            clients,
            active_projects,
            active_people,
            leads: LeadPipeline::from_rows(leads),
            invoices,
            payments_this_month,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pipeline_counts_open_leads_and_fills_gaps() {
        let pipeline = LeadPipeline::from_rows(vec![
            ("new".into(), 4),
            ("proposal".into(), 2),
            ("won".into(), 7),
            ("lost".into(), 1),
        ]);
        assert_eq!(pipeline.open, 6);
        assert_eq!(pipeline.by_status["contacted"], 0);
        assert_eq!(pipeline.by_status["won"], 7);
        assert_eq!(pipeline.by_status.len(), LeadStatus::ALL.len());
    }

    #[test]
    fn month_starts_on_the_first() {
        let today = NaiveDate::from_ymd_opt(2026, 10, 16).unwrap();
        assert_eq!(month_start(today), NaiveDate::from_ymd_opt(2026, 10, 1).unwrap());
    }
}
