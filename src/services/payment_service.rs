use chrono::{NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::PgPool;
use uuid::Uuid;

use super::invoice_service;
use super::sequence::{self, Sequence};
use super::validation::{merge_text, Validator};
use super::ServiceError;
use crate::billing::InvoiceStatus;
use crate::config;
use crate::database::models::{Invoice, Payment, PaymentMethod};
use crate::database::Repository;
use crate::filter::{ListParams, Page};

#[derive(Debug, Default, Deserialize)]
pub struct PaymentInput {
    pub payment_number: Option<String>,
    pub invoice_id: Option<Uuid>,
    pub amount: Option<Decimal>,
    pub payment_date: Option<NaiveDate>,
    pub method: Option<String>,
    pub reference: Option<String>,
    pub notes: Option<String>,
}

/// A saved payment together with the invoice it changed.
#[derive(Debug, Serialize)]
pub struct Receipt {
    pub payment: Payment,
    pub invoice: Invoice,
}

#[derive(Debug)]
struct PaymentFields {
    payment_number: Option<String>,
    invoice_id: Uuid,
    amount: Decimal,
    payment_date: NaiveDate,
    method: PaymentMethod,
    reference: Option<String>,
    notes: Option<String>,
}

impl PaymentFields {
    fn merge(input: PaymentInput, current: Option<&Payment>, today: NaiveDate) -> (Self, Validator) {
        let mut v = Validator::new();
        let invoice_id = v.required_id("invoice_id", input.invoice_id.or(current.map(|c| c.invoice_id)));
        if let (Some(requested), Some(c)) = (input.invoice_id, current) {
            if requested != c.invoice_id {
                v.add("invoice_id", "cannot be changed; delete the payment and record it again");
            }
        }
        let amount = input.amount.or(current.map(|c| c.amount));
        match amount {
            None => v.add("amount", "is required"),
            Some(a) => v.positive("amount", a),
        }
        let method = v.choice(
            "method",
            input.method.as_deref(),
            current.map(|c| c.method).unwrap_or(PaymentMethod::BankTransfer),
        );

        let fields = Self {
            payment_number: input
                .payment_number
                .map(|n| n.trim().to_string())
                .filter(|n| !n.is_empty())
                .or(current.map(|c| c.payment_number.clone())),
            invoice_id,
            amount: amount.unwrap_or_default(),
            payment_date: input.payment_date.or(current.map(|c| c.payment_date)).unwrap_or(today),
            method,
            reference: merge_text(input.reference, current.and_then(|c| c.reference.as_ref())),
            notes: merge_text(input.notes, current.and_then(|c| c.notes.as_ref())),
        };
        (fields, v)
    }
}

/// Checks the payment fits the invoice. `previous` is the amount this payment
/// already contributes when it is being edited.
fn check_invoice(v: &mut Validator, invoice: &Invoice, amount: Decimal, previous: Decimal) {
    match invoice.status {
        InvoiceStatus::Draft => v.add("invoice_id", "invoice has not been sent yet"),
        InvoiceStatus::Cancelled => v.add("invoice_id", "invoice is cancelled"),
        _ => {}
    }
    let available = invoice.balance_due + previous;
    if !v.has("amount") && amount > available {
        v.add("amount", format!("exceeds the balance due of {}", available));
    }
}

pub struct PaymentService {
    pool: PgPool,
}

impl PaymentService {
    pub fn new() -> Result<Self, ServiceError> {
        Ok(Self::with_pool(super::pool()?))
    }

    pub fn with_pool(pool: PgPool) -> Self {
        Self { pool }
    }

    fn repo(&self) -> Repository<Payment> {
        Repository::new(self.pool.clone())
    }

    pub async fn list(&self, params: ListParams) -> Result<Page<Payment>, ServiceError> {
        Ok(self.repo().select_page(params).await?)
    }

    pub async fn get(&self, id: Uuid) -> Result<Payment, ServiceError> {
        Ok(self.repo().select_404(id).await?)
    }

    pub async fn create(&self, input: PaymentInput) -> Result<Receipt, ServiceError> {
        let today = Utc::now().date_naive();
        let (f, mut v) = PaymentFields::merge(input, None, today);
        if v.has("invoice_id") {
            return Err(v.into_error());
        }

        let mut tx = self.pool.begin().await?;
        let invoice = lock_invoice(&mut tx, f.invoice_id, &mut v).await?;
        if let Some(ref invoice) = invoice {
            check_invoice(&mut v, invoice, f.amount, Decimal::ZERO);
        }
        v.finish()?;
        let Some(invoice) = invoice else {
            return Err(ServiceError::field("invoice_id", "invoice does not exist"));
        };

        let number = match f.payment_number {
            Some(ref n) => n.clone(),
            None => {
                let prefix = &config::config().billing.payment_prefix;
                sequence::allocate(&mut tx, Sequence::Payment, prefix, f.payment_date).await?
            }
        };

        let payment = sqlx::query_as::<_, Payment>(
            r#"
            INSERT INTO payments (payment_number, invoice_id, client_id, amount, payment_date, method, reference, notes)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
            RETURNING *
            "#,
        )
        .bind(&number)
        .bind(invoice.id)
        .bind(invoice.client_id)
        .bind(f.amount)
        .bind(f.payment_date)
        .bind(f.method.as_str())
        .bind(&f.reference)
        .bind(&f.notes)
        .fetch_one(&mut *tx)
        .await?;

        let invoice = invoice_service::apply_payments(&mut tx, invoice.id).await?;
        tx.commit().await?;

        tracing::info!(
            payment_id = %payment.id,
            number = %payment.payment_number,
            invoice_id = %invoice.id,
            status = %invoice.status,
            "Recorded payment"
        );
        Ok(Receipt { payment, invoice })
    }

    pub async fn update(&self, id: Uuid, patch: PaymentInput) -> Result<Receipt, ServiceError> {
        let today = Utc::now().date_naive();
        let current = self.get(id).await?;
        let (f, mut v) = PaymentFields::merge(patch, Some(&current), today);

        let mut tx = self.pool.begin().await?;
        let invoice = lock_invoice(&mut tx, current.invoice_id, &mut v).await?;
        if let Some(ref invoice) = invoice {
            // Editing only has to respect the balance, not the send state
            if !v.has("amount") && f.amount > invoice.balance_due + current.amount {
                v.add("amount", format!("exceeds the balance due of {}", invoice.balance_due + current.amount));
            }
        }
        v.finish()?;

        let payment = sqlx::query_as::<_, Payment>(
            r#"
            UPDATE payments
               SET payment_number = $2, amount = $3, payment_date = $4, method = $5, reference = $6,
                   notes = $7, updated_at = now()
             WHERE id = $1
         RETURNING *
            "#,
        )
        .bind(id)
        .bind(f.payment_number.as_deref().unwrap_or(&current.payment_number))
        .bind(f.amount)
        .bind(f.payment_date)
        .bind(f.method.as_str())
        .bind(&f.reference)
        .bind(&f.notes)
        .fetch_one(&mut *tx)
        .await?;

        let invoice = invoice_service::apply_payments(&mut tx, current.invoice_id).await?;
        tx.commit().await?;
        Ok(Receipt { payment, invoice })
    }

    /// Deletes the payment and returns the invoice with its balance restored.
    pub async fn delete(&self, id: Uuid) -> Result<Invoice, ServiceError> {
        let mut tx = self.pool.begin().await?;
        let invoice_id: Uuid = sqlx::query_scalar("DELETE FROM payments WHERE id = $1 RETURNING invoice_id")
            .bind(id)
            .fetch_optional(&mut *tx)
            .await?
            .ok_or_else(|| ServiceError::NotFound("Payment not found".to_string()))?;

        let invoice = invoice_service::apply_payments(&mut tx, invoice_id).await?;
        tx.commit().await?;
        tracing::info!(payment_id = %id, invoice_id = %invoice_id, status = %invoice.status, "Deleted payment");
        Ok(invoice)
    }
}

async fn lock_invoice(
    conn: &mut sqlx::PgConnection,
    invoice_id: Uuid,
    v: &mut Validator,
) -> Result<Option<Invoice>, ServiceError> {
    let invoice = sqlx::query_as::<_, Invoice>("SELECT * FROM invoices WHERE id = $1 FOR UPDATE")
        .bind(invoice_id)
        .fetch_optional(&mut *conn)
        .await?;
    if invoice.is_none() {
        v.add("invoice_id", "invoice does not exist");
    }
    Ok(invoice)
}
