//! Service-level flows against a real Postgres. Each test returns early unless
//! `AGENCY_TEST_DATABASE_URL` points at a database the tests may write to.

mod common;

use std::collections::HashMap;
use std::time::Duration;

use agency_portal::billing::{month_prefix, InvoiceStatus};
use agency_portal::database::models::{Client, Invoice};
use agency_portal::database::Resource;
use agency_portal::filter::ListParams;
use agency_portal::services::sequence::{self, Sequence};
use agency_portal::services::{
    ClientService, InvoiceService, LeadService, PaymentService, PaymentTermService, ServiceError,
};
use anyhow::Result;
use chrono::{Months, NaiveDate, Utc};
use rust_decimal_macros::dec;
use serde::de::DeserializeOwned;
use serde_json::{json, Value};
use sqlx::postgres::{PgPool, PgPoolOptions};
use uuid::Uuid;

async fn database() -> Result<Option<PgPool>> {
    let Some(url) = common::test_database_url() else {
        eprintln!("AGENCY_TEST_DATABASE_URL not set; skipping");
        return Ok(None);
    };
    let pool = PgPoolOptions::new().max_connections(5).connect(&url).await?;
    sqlx::migrate!("./migrations").run(&pool).await?;
    Ok(Some(pool))
}

fn input<T: DeserializeOwned>(value: Value) -> T {
    serde_json::from_value(value).expect("valid input")
}

fn unique(label: &str) -> String {
    format!("{} {}", label, Uuid::new_v4().simple())
}

async fn client(pool: &PgPool) -> Result<Client> {
    Ok(ClientService::with_pool(pool.clone())
        .create(input(json!({ "name": unique("Client") })))
        .await?)
}

/// A sent invoice for 1000.00, due in a month.
async fn sent_invoice(pool: &PgPool) -> Result<Invoice> {
    let client = client(pool).await?;
    let today = Utc::now().date_naive();
    let service = InvoiceService::with_pool(pool.clone());
    let invoice = service
        .create(input(json!({
            "client_id": client.id,
            "payment_term_id": null,
            "issue_date": today,
            "due_date": today.checked_add_months(Months::new(1)),
            "line_items": [{ "description": "Campaign", "quantity": "1", "unit_price": "1000.00" }]
        })))
        .await?;
    Ok(service.send(invoice.id).await?)
}

fn field_error(err: ServiceError, field: &str) -> String {
    match err {
        ServiceError::Validation(fields) => fields.get(field).cloned().unwrap_or_default(),
        other => panic!("expected a validation error on {field}, got {other:?}"),
    }
}

#[tokio::test]
async fn numbering_ignores_hand_entered_suffixes() -> Result<()> {
    let Some(pool) = database().await? else { return Ok(()) };
    let prefix = format!("T{}", &Uuid::new_v4().simple().to_string()[..8]).to_uppercase();
    let date = NaiveDate::from_ymd_opt(2026, 10, 16).unwrap();
    let month = month_prefix(&prefix, date);
    let client = client(&pool).await?;
    let invoices = InvoiceService::with_pool(pool.clone());

    for number in [format!("{month}0001"), format!("{month}0002"), format!("{month}0001-R")] {
        invoices
            .create(input(json!({ "client_id": client.id, "invoice_number": number, "issue_date": date })))
            .await?;
    }

    let mut tx = pool.begin().await?;
    let next = sequence::allocate(&mut tx, Sequence::Invoice, &prefix, date).await?;
    tx.rollback().await?;
    assert_eq!(next, format!("{month}0003"));

    // The configured prefix keeps allocating after a manual number lands in this month
    let today = Utc::now().date_naive();
    let manual = format!("{}0001-R{}", month_prefix("INV", today), &Uuid::new_v4().simple().to_string()[..6]);
    invoices
        .create(input(json!({ "client_id": client.id, "invoice_number": manual })))
        .await?;
    let allocated = invoices.create(input(json!({ "client_id": client.id }))).await?;
    let suffix = allocated
        .invoice_number
        .strip_prefix(&month_prefix("INV", today))
        .expect("number in the current month");
    assert!(suffix.len() >= 4 && suffix.chars().all(|c| c.is_ascii_digit()), "{}", allocated.invoice_number);
    Ok(())
}

#[tokio::test]
async fn payments_recompute_the_invoice() -> Result<()> {
    let Some(pool) = database().await? else { return Ok(()) };
    let invoice = sent_invoice(&pool).await?;
    assert_eq!(invoice.status, InvoiceStatus::Sent);
    let payments = PaymentService::with_pool(pool.clone());

    let receipt = payments
        .create(input(json!({ "invoice_id": invoice.id, "amount": "400.00" })))
        .await?;
    assert!(receipt.payment.payment_number.starts_with("PAY-"));
    assert_eq!(receipt.invoice.amount_paid, dec!(400.00));
    assert_eq!(receipt.invoice.balance_due, dec!(600.00));
    assert_eq!(receipt.invoice.status, InvoiceStatus::PartiallyPaid);

    let receipt = payments
        .update(receipt.payment.id, input(json!({ "amount": "1000.00" })))
        .await?;
    assert_eq!(receipt.invoice.balance_due, dec!(0));
    assert_eq!(receipt.invoice.status, InvoiceStatus::Paid);
    assert!(receipt.invoice.paid_at.is_some());

    let restored = payments.delete(receipt.payment.id).await?;
    assert_eq!(restored.amount_paid, dec!(0));
    assert_eq!(restored.balance_due, dec!(1000.00));
    assert_eq!(restored.status, InvoiceStatus::Sent);
    Ok(())
}

#[tokio::test]
async fn overpayment_is_a_field_error() -> Result<()> {
    let Some(pool) = database().await? else { return Ok(()) };
    let invoice = sent_invoice(&pool).await?;
    let payments = PaymentService::with_pool(pool.clone());

    let err = payments
        .create(input(json!({ "invoice_id": invoice.id, "amount": "1000.01" })))
        .await
        .unwrap_err();
    assert!(field_error(err, "amount").starts_with("exceeds the balance due"));

    let unchanged = InvoiceService::with_pool(pool.clone()).get(invoice.id).await?;
    assert_eq!(unchanged.amount_paid, dec!(0));
    Ok(())
}

#[tokio::test]
async fn invoices_with_payments_cannot_be_deleted() -> Result<()> {
    let Some(pool) = database().await? else { return Ok(()) };
    let invoice = sent_invoice(&pool).await?;
    let receipt = PaymentService::with_pool(pool.clone())
        .create(input(json!({ "invoice_id": invoice.id, "amount": "10.00" })))
        .await?;

    let invoices = InvoiceService::with_pool(pool.clone());
    assert!(matches!(invoices.delete(invoice.id).await, Err(ServiceError::Conflict(_))));

    PaymentService::with_pool(pool.clone()).delete(receipt.payment.id).await?;
    invoices.delete(invoice.id).await?;
    assert!(matches!(invoices.get(invoice.id).await, Err(ServiceError::Database(_) | ServiceError::NotFound(_))));
    Ok(())
}

#[tokio::test]
async fn leads_convert_once() -> Result<()> {
    let Some(pool) = database().await? else { return Ok(()) };
    let leads = LeadService::with_pool(pool.clone());
    let company = unique("Brand");
    let lead = leads
        .create(input(json!({ "name": "Asha", "company": company })))
        .await?;

    let conversion = leads.convert(lead.id).await?;
    assert_eq!(conversion.client.name, company);
    assert_eq!(conversion.lead.converted_client_id, Some(conversion.client.id));

    assert!(matches!(leads.convert(lead.id).await, Err(ServiceError::InvalidState(_))));
    Ok(())
}

#[tokio::test]
async fn default_terms_apply_only_when_the_template_is_omitted() -> Result<()> {
    let Some(pool) = database().await? else { return Ok(()) };
    let terms = PaymentTermService::with_pool(pool.clone());

    let first = terms
        .create(input(json!({ "name": unique("Net 15"), "due_days": 15, "is_default": true })))
        .await?;
    let second = terms
        .create(input(json!({ "name": unique("Net 30"), "due_days": 30, "is_default": true })))
        .await?;
    assert!(!terms.get(first.id).await?.is_default);
    assert_eq!(terms.default_term().await?.map(|t| t.id), Some(second.id));
    let defaults: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM payment_terms WHERE is_default")
        .fetch_one(&pool)
        .await?;
    assert_eq!(defaults, 1);

    let client = client(&pool).await?;
    let invoices = InvoiceService::with_pool(pool.clone());
    let issue = NaiveDate::from_ymd_opt(2026, 10, 1).unwrap();

    let defaulted = invoices
        .create(input(json!({ "client_id": client.id, "issue_date": issue })))
        .await?;
    assert_eq!(defaulted.payment_term_id, Some(second.id));
    assert_eq!(defaulted.due_date, NaiveDate::from_ymd_opt(2026, 10, 31).unwrap());

    let opted_out = invoices
        .create(input(json!({ "client_id": client.id, "issue_date": issue, "payment_term_id": null })))
        .await?;
    assert_eq!(opted_out.payment_term_id, None);
    assert_eq!(opted_out.due_date, issue);

    // Clearing the template on an existing invoice must not bring the default back
    let cleared = invoices
        .update(defaulted.id, input(json!({ "payment_term_id": null })))
        .await?;
    assert_eq!(cleared.payment_term_id, None);
    assert_eq!(cleared.due_date, defaulted.due_date);

    terms.update(second.id, input(json!({ "is_default": false }))).await?;
    Ok(())
}

#[tokio::test]
async fn overdue_sweep_flags_past_due_invoices() -> Result<()> {
    let Some(pool) = database().await? else { return Ok(()) };
    let invoice = sent_invoice(&pool).await?;
    sqlx::query("UPDATE invoices SET issue_date = '2020-01-01', due_date = '2020-01-31' WHERE id = $1")
        .bind(invoice.id)
        .execute(&pool)
        .await?;

    let invoices = InvoiceService::with_pool(pool.clone());
    assert!(invoices.mark_overdue().await? >= 1);
    assert_eq!(invoices.get(invoice.id).await?.status, InvoiceStatus::Overdue);

    // Drafts are left alone
    let draft = invoices
        .create(input(json!({ "client_id": invoice.client_id, "issue_date": "2020-01-01", "due_date": "2020-01-02" })))
        .await?;
    invoices.mark_overdue().await?;
    assert_eq!(invoices.get(draft.id).await?.status, InvoiceStatus::Draft);
    Ok(())
}

#[tokio::test]
async fn invoice_update_fits_in_a_single_connection() -> Result<()> {
    let Some(pool) = database().await? else { return Ok(()) };
    let invoice = sent_invoice(&pool).await?;

    let url = common::test_database_url().unwrap_or_default();
    let narrow = PgPoolOptions::new()
        .max_connections(1)
        .acquire_timeout(Duration::from_secs(5))
        .connect(&url)
        .await?;
    let updated = InvoiceService::with_pool(narrow.clone())
        .update(invoice.id, input(json!({ "client_id": invoice.client_id, "notes": "Thanks!" })))
        .await?;
    assert_eq!(updated.notes.as_deref(), Some("Thanks!"));
    narrow.close().await;
    Ok(())
}

#[tokio::test]
async fn created_to_today_includes_todays_records() -> Result<()> {
    let Some(pool) = database().await? else { return Ok(()) };
    let client = client(&pool).await?;
    // The filter's date is read in the session time zone, so ask the database for today
    let today: NaiveDate = sqlx::query_scalar("SELECT CURRENT_DATE").fetch_one(&pool).await?;

    let query: HashMap<String, String> = [
        ("search".to_string(), client.name.clone()),
        ("created_at_from".to_string(), today.to_string()),
        ("created_at_to".to_string(), today.to_string()),
    ]
    .into_iter()
    .collect();
    let params = ListParams::parse(&query, &Client::SPEC, 10, 100).expect("valid list params");
    let page = ClientService::with_pool(pool.clone()).list(params).await?;
    assert_eq!(page.total, 1);
    assert_eq!(page.items[0].id, client.id);
    Ok(())
}
