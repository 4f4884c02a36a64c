use chrono::{NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::Deserialize;
use sqlx::{types::Json, PgConnection, PgPool};
use uuid::Uuid;

use super::sequence::{self, Sequence};
use super::validation::{double_option, merge_text, merge_value, Validator};
use super::ServiceError;
use crate::billing::{self, Discount, DiscountType, InvoiceStatus, LineItem, Totals};
use crate::config;
use crate::database::models::{Invoice, PaymentTerm};
use crate::database::Repository;
use crate::filter::{ListParams, Page};

#[derive(Debug, Default, Deserialize)]
pub struct InvoiceInput {
    pub invoice_number: Option<String>,
    pub client_id: Option<Uuid>,
    #[serde(default, deserialize_with = "double_option")]
    pub project_id: Option<Option<Uuid>>,
    #[serde(default, deserialize_with = "double_option")]
    pub payment_term_id: Option<Option<Uuid>>,
    pub issue_date: Option<NaiveDate>,
    pub due_date: Option<NaiveDate>,
    pub line_items: Option<Vec<LineItem>>,
    pub discount_type: Option<String>,
    pub discount_value: Option<Decimal>,
    pub tax_rate: Option<Decimal>,
    pub currency: Option<String>,
    pub notes: Option<String>,
    pub terms: Option<String>,
}

impl InvoiceInput {
    /// Whether the patch touches anything that feeds the totals.
    fn changes_amounts(&self) -> bool {
        self.line_items.is_some()
            || self.discount_type.is_some()
            || self.discount_value.is_some()
            || self.tax_rate.is_some()
    }
}

#[derive(Debug)]
struct InvoiceFields {
    invoice_number: Option<String>,
    client_id: Uuid,
    project_id: Option<Uuid>,
    payment_term_id: Option<Uuid>,
    issue_date: NaiveDate,
    due_date: Option<NaiveDate>,
    line_items: Vec<LineItem>,
    discount: Discount,
    tax_rate: Decimal,
    currency: String,
    notes: Option<String>,
    terms: Option<String>,
}

impl InvoiceFields {
    fn merge(input: InvoiceInput, current: Option<&Invoice>, today: NaiveDate, default_currency: &str) -> (Self, Validator) {
        let mut v = Validator::new();

        let invoice_number = match input.invoice_number {
            Some(n) if n.trim().is_empty() => {
                if current.is_some() {
                    v.add("invoice_number", "cannot be blank");
                }
                current.map(|c| c.invoice_number.clone())
            }
            Some(n) => Some(n.trim().to_string()),
            None => current.map(|c| c.invoice_number.clone()),
        };
        let client_id = v.required_id("client_id", input.client_id.or(current.map(|c| c.client_id)));
        let issue_date = input.issue_date.or(current.map(|c| c.issue_date)).unwrap_or(today);

        let payment_term_id = merge_value(input.payment_term_id, current.and_then(|c| c.payment_term_id.as_ref()));

        // A new template or issue date re-derives the due date from the template
        // unless one is given. Clearing the template keeps the current due date.
        let rederive = payment_term_id.is_some() && (input.payment_term_id.is_some() || input.issue_date.is_some());
        let due_date = match (input.due_date, current) {
            (Some(d), _) => Some(d),
            (None, Some(c)) if !rederive => Some(c.due_date),
            _ => None,
        };
        if let Some(due) = due_date {
            if due < issue_date {
                v.add("due_date", "must not be before the issue date");
            }
        }

        let mut line_items = input
            .line_items
            .or_else(|| current.map(|c| c.line_items.0.clone()))
            .unwrap_or_default();
        validate_lines(&mut v, &line_items);
        billing::price_lines(&mut line_items);

        let kind = v.choice(
            "discount_type",
            input.discount_type.as_deref(),
            current.map(|c| c.discount_type).unwrap_or(DiscountType::Fixed),
        );
        let discount_value = input.discount_value.or(current.map(|c| c.discount_value)).unwrap_or_default();
        v.non_negative("discount_value", Some(discount_value));
        if kind == DiscountType::Percentage {
            v.percentage("discount_value", Some(discount_value));
        }
        let tax_rate = input.tax_rate.or(current.map(|c| c.tax_rate)).unwrap_or_default();
        v.percentage("tax_rate", Some(tax_rate));

        let currency = input
            .currency
            .map(|c| c.trim().to_uppercase())
            .filter(|c| !c.is_empty())
            .or(current.map(|c| c.currency.clone()))
            .unwrap_or_else(|| default_currency.to_string());
        if currency.len() != 3 || !currency.chars().all(|c| c.is_ascii_alphabetic()) {
            v.add("currency", "must be a 3 letter currency code");
        }

        let fields = Self {
            invoice_number,
            client_id,
            project_id: merge_value(input.project_id, current.and_then(|c| c.project_id.as_ref())),
            payment_term_id,
            issue_date,
            due_date,
            line_items,
            discount: Discount { kind, value: discount_value },
            tax_rate,
            currency,
            notes: merge_text(input.notes, current.and_then(|c| c.notes.as_ref())),
            terms: merge_text(input.terms, current.and_then(|c| c.terms.as_ref())),
        };
        (fields, v)
    }

    /// Fills the due date and terms text from a payment-terms template.
    fn apply_term(&mut self, term: &PaymentTerm) {
        if self.due_date.is_none() {
            self.due_date = Some(billing::due_date_for(self.issue_date, term.due_days));
        }
        if self.terms.is_none() {
            self.terms = term.terms.clone();
        }
    }

    fn totals(&self, amount_paid: Decimal) -> Totals {
        billing::compute_totals(&self.line_items, self.discount, self.tax_rate, amount_paid)
    }
}

fn validate_lines(v: &mut Validator, items: &[LineItem]) {
    for (i, item) in items.iter().enumerate() {
        if item.description.trim().is_empty() {
            v.add(&format!("line_items[{}].description", i), "is required");
        }
        if item.quantity <= Decimal::ZERO {
            v.add(&format!("line_items[{}].quantity", i), "must be greater than zero");
        }
        if item.unit_price < Decimal::ZERO {
            v.add(&format!("line_items[{}].unit_price", i), "must not be negative");
        }
    }
}

pub struct InvoiceService {
    pool: PgPool,
}

impl InvoiceService {
    pub fn new() -> Result<Self, ServiceError> {
        Ok(Self::with_pool(super::pool()?))
    }

    pub fn with_pool(pool: PgPool) -> Self {
        Self { pool }
    }

    fn repo(&self) -> Repository<Invoice> {
        Repository::new(self.pool.clone())
    }

    pub async fn list(&self, params: ListParams) -> Result<Page<Invoice>, ServiceError> {
        Ok(self.repo().select_page(params).await?)
    }

    pub async fn get(&self, id: Uuid) -> Result<Invoice, ServiceError> {
        Ok(self.repo().select_404(id).await?)
    }

    pub async fn create(&self, input: InvoiceInput) -> Result<Invoice, ServiceError> {
        let billing_config = &config::config().billing;
        let today = Utc::now().date_naive();
        // An explicit `"payment_term_id": null` opts out of the default template
        let use_default = input.payment_term_id.is_none();
        let (mut f, mut v) = InvoiceFields::merge(input, None, today, &billing_config.currency);

        let mut tx = self.pool.begin().await?;
        resolve_references(&mut tx, &mut v, &mut f, use_default).await?;
        v.finish()?;

        let due_date = f.due_date.unwrap_or(f.issue_date);
        let totals = f.totals(Decimal::ZERO);

        let number = match f.invoice_number.take() {
            Some(n) => n,
            None => sequence::allocate(&mut tx, Sequence::Invoice, &billing_config.invoice_prefix, f.issue_date).await?,
        };

        let invoice = sqlx::query_as::<_, Invoice>(
            r#"
            INSERT INTO invoices (invoice_number, client_id, project_id, payment_term_id, issue_date, due_date,
                                  line_items, subtotal, discount_type, discount_value, discount_amount,
                                  tax_rate, tax_amount, total, amount_paid, balance_due, currency, status,
                                  notes, terms)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, 0, $15, $16, $17, $18, $19)
            RETURNING *
            "#,
        )
        .bind(&number)
        .bind(f.client_id)
        .bind(f.project_id)
        .bind(f.payment_term_id)
        .bind(f.issue_date)
        .bind(due_date)
        .bind(Json(&f.line_items))
        .bind(totals.subtotal)
        .bind(f.discount.kind.as_str())
        .bind(f.discount.value)
        .bind(totals.discount_amount)
        .bind(f.tax_rate)
        .bind(totals.tax_amount)
        .bind(totals.total)
        .bind(totals.balance_due)
        .bind(&f.currency)
        .bind(InvoiceStatus::Draft.as_str())
        .bind(&f.notes)
        .bind(&f.terms)
        .fetch_one(&mut *tx)
        .await?;
        tx.commit().await?;

        tracing::info!(invoice_id = %invoice.id, number = %invoice.invoice_number, total = %invoice.total, "Created invoice");
        Ok(invoice)
    }

    pub async fn update(&self, id: Uuid, patch: InvoiceInput) -> Result<Invoice, ServiceError> {
        let billing_config = &config::config().billing;
        let today = Utc::now().date_naive();
        let mut tx = self.pool.begin().await?;
        let current = lock(&mut tx, id).await?;

        if current.status.is_locked() && patch.changes_amounts() {
            return Err(ServiceError::InvalidState(format!(
                "Line items of a {} invoice cannot be changed",
                current.status
            )));
        }

        let (mut f, mut v) = InvoiceFields::merge(patch, Some(&current), today, &billing_config.currency);
        resolve_references(&mut tx, &mut v, &mut f, false).await?;
        v.finish()?;

        let due_date = f.due_date.unwrap_or(f.issue_date);
        let invoice_number = f.invoice_number.clone().unwrap_or_else(|| current.invoice_number.clone());
        let totals = f.totals(current.amount_paid);
        let status = billing::derive_status(current.status, totals.total, current.amount_paid, due_date, today);

        let invoice = sqlx::query_as::<_, Invoice>(
            r#"
            UPDATE invoices
               SET invoice_number = $2, client_id = $3, project_id = $4, payment_term_id = $5,
                   issue_date = $6, due_date = $7, line_items = $8, subtotal = $9, discount_type = $10,
                   discount_value = $11, discount_amount = $12, tax_rate = $13, tax_amount = $14,
                   total = $15, balance_due = $16, currency = $17, status = $18, notes = $19, terms = $20,
                   paid_at = CASE WHEN $18 = 'paid' THEN COALESCE(paid_at, now()) ELSE NULL END,
                   updated_at = now()
             WHERE id = $1
         RETURNING *
            "#,
        )
        .bind(id)
        .bind(&invoice_number)
        .bind(f.client_id)
        .bind(f.project_id)
        .bind(f.payment_term_id)
        .bind(f.issue_date)
        .bind(due_date)
        .bind(Json(&f.line_items))
        .bind(totals.subtotal)
        .bind(f.discount.kind.as_str())
        .bind(f.discount.value)
        .bind(totals.discount_amount)
        .bind(f.tax_rate)
        .bind(totals.tax_amount)
        .bind(totals.total)
        .bind(totals.balance_due)
        .bind(&f.currency)
        .bind(status.as_str())
        .bind(&f.notes)
        .bind(&f.terms)
        .fetch_one(&mut *tx)
        .await?;
        tx.commit().await?;
        Ok(invoice)
    }

    /// Invoices with payments recorded against them cannot be deleted.
    pub async fn delete(&self, id: Uuid) -> Result<(), ServiceError> {
        let payments: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM payments WHERE invoice_id = $1")
            .bind(id)
            .fetch_one(&self.pool)
            .await?;
        if payments > 0 {
            return Err(ServiceError::Conflict(format!(
                "Invoice has {} payment(s); delete them first",
                payments
            )));
        }
        self.repo().delete_by_id(id).await?;
        tracing::info!(invoice_id = %id, "Deleted invoice");
        Ok(())
    }

    /// Moves a draft to `sent` and re-derives its status from payments and due date.
    pub async fn send(&self, id: Uuid) -> Result<Invoice, ServiceError> {
        let today = Utc::now().date_naive();
        let mut tx = self.pool.begin().await?;
        let current = lock(&mut tx, id).await?;

        if current.status != InvoiceStatus::Draft {
            return Err(ServiceError::InvalidState(format!(
                "Only draft invoices can be sent; this one is {}",
                current.status
            )));
        }
        if current.line_items.0.is_empty() {
            return Err(ServiceError::InvalidState("Invoice has no line items".to_string()));
        }

        let status = billing::derive_status(InvoiceStatus::Sent, current.total, current.amount_paid, current.due_date, today);
        let invoice = set_status(&mut tx, id, status, true).await?;
        tx.commit().await?;
        tracing::info!(invoice_id = %id, status = %status, "Sent invoice");
        Ok(invoice)
    }

    /// Cancels an invoice that has no payments.
    pub async fn cancel(&self, id: Uuid) -> Result<Invoice, ServiceError> {
        let mut tx = self.pool.begin().await?;
        let current = lock(&mut tx, id).await?;

        if current.status == InvoiceStatus::Cancelled {
            return Err(ServiceError::InvalidState("Invoice is already cancelled".to_string()));
        }
        if current.amount_paid > Decimal::ZERO {
            return Err(ServiceError::InvalidState(
                "Invoices with payments cannot be cancelled".to_string(),
            ));
        }

        let invoice = set_status(&mut tx, id, InvoiceStatus::Cancelled, false).await?;
        tx.commit().await?;
        tracing::info!(invoice_id = %id, "Cancelled invoice");
        Ok(invoice)
    }

    /// Flags every sent or partially paid invoice whose due date has passed.
    pub async fn mark_overdue(&self) -> Result<u64, ServiceError> {
        let today = Utc::now().date_naive();
        let result = sqlx::query(
            r#"
            UPDATE invoices
               SET status = $1, updated_at = now()
             WHERE status IN ($2, $3) AND due_date < $4
            "#,
        )
        .bind(InvoiceStatus::Overdue.as_str())
        .bind(InvoiceStatus::Sent.as_str())
        .bind(InvoiceStatus::PartiallyPaid.as_str())
        .bind(today)
        .execute(&self.pool)
        .await?;
        Ok(result.rows_affected())
    }
}

/// Checks the client, project and template references of `f` on the caller's
/// connection. With `use_default`, an invoice with neither a template nor a
/// due date picks up the default template.
async fn resolve_references(
    conn: &mut PgConnection,
    v: &mut Validator,
    f: &mut InvoiceFields,
    use_default: bool,
) -> Result<(), ServiceError> {
    if !v.has("client_id") {
        let exists: bool = sqlx::query_scalar("SELECT EXISTS (SELECT 1 FROM clients WHERE id = $1)")
            .bind(f.client_id)
            .fetch_one(&mut *conn)
            .await?;
        if !exists {
            v.add("client_id", "client does not exist");
        }
    }

    if let Some(project_id) = f.project_id {
        let owner: Option<Uuid> = sqlx::query_scalar("SELECT client_id FROM projects WHERE id = $1")
            .bind(project_id)
            .fetch_optional(&mut *conn)
            .await?;
        match owner {
            None => v.add("project_id", "project does not exist"),
            Some(owner) if owner != f.client_id && !v.has("client_id") => {
                v.add("project_id", "project belongs to a different client")
            }
            _ => {}
        }
    }

    let term = match f.payment_term_id {
        Some(term_id) => {
            let term = sqlx::query_as::<_, PaymentTerm>("SELECT * FROM payment_terms WHERE id = $1")
                .bind(term_id)
                .fetch_optional(&mut *conn)
                .await?;
            if term.is_none() {
                v.add("payment_term_id", "payment terms template does not exist");
            }
            term
        }
        None if use_default && f.due_date.is_none() => {
            let term = sqlx::query_as::<_, PaymentTerm>("SELECT * FROM payment_terms WHERE is_default LIMIT 1")
                .fetch_optional(&mut *conn)
                .await?;
            if let Some(ref t) = term {
                f.payment_term_id = Some(t.id);
            }
            term
        }
        None => None,
    };
    if let Some(term) = term {
        f.apply_term(&term);
        if let Some(due) = f.due_date {
            if due < f.issue_date {
                v.add("due_date", "must not be before the issue date");
            }
        }
    }
    Ok(())
}

async fn lock(conn: &mut PgConnection, id: Uuid) -> Result<Invoice, ServiceError> {
    sqlx::query_as::<_, Invoice>("SELECT * FROM invoices WHERE id = $1 FOR UPDATE")
        .bind(id)
        .fetch_optional(&mut *conn)
        .await?
        .ok_or_else(|| ServiceError::NotFound("Invoice not found".to_string()))
}

async fn set_status(conn: &mut PgConnection, id: Uuid, status: InvoiceStatus, sent: bool) -> Result<Invoice, ServiceError> {
    let invoice = sqlx::query_as::<_, Invoice>(
        r#"
        UPDATE invoices
           SET status = $2,
               sent_at = CASE WHEN $3 THEN now() ELSE sent_at END,
               paid_at = CASE WHEN $2 = 'paid' THEN COALESCE(paid_at, now()) ELSE paid_at END,
               updated_at = now()
         WHERE id = $1
     RETURNING *
        "#,
    )
    .bind(id)
    .bind(status.as_str())
    .bind(sent)
    .fetch_one(&mut *conn)
    .await?;
    Ok(invoice)
}

/// Recomputes `amount_paid` from the invoice's payments and re-derives its
/// totals and status. Runs inside the caller's transaction.
pub(crate) async fn apply_payments(conn: &mut PgConnection, invoice_id: Uuid) -> Result<Invoice, ServiceError> {
    let today = Utc::now().date_naive();
    let current = lock(&mut *conn, invoice_id).await?;

    let amount_paid: Decimal = sqlx::query_scalar("SELECT COALESCE(SUM(amount), 0) FROM payments WHERE invoice_id = $1")
        .bind(invoice_id)
        .fetch_one(&mut *conn)
        .await?;

    let discount = Discount { kind: current.discount_type, value: current.discount_value };
    let totals = billing::compute_totals(&current.line_items.0, discount, current.tax_rate, amount_paid);
    let status = billing::derive_status(current.status, totals.total, amount_paid, current.due_date, today);

    let invoice = sqlx::query_as::<_, Invoice>(
        r#"
        UPDATE invoices
           SET amount_paid = $2, subtotal = $3, discount_amount = $4, tax_amount = $5, total = $6,
               balance_due = $7, status = $8,
               paid_at = CASE WHEN $8 = 'paid' THEN COALESCE(paid_at, now()) ELSE NULL END,
               updated_at = now()
         WHERE id = $1
     RETURNING *
        "#,
    )
    .bind(invoice_id)
    .bind(amount_paid)
    .bind(totals.subtotal)
    .bind(totals.discount_amount)
    .bind(totals.tax_amount)
    .bind(totals.total)
    .bind(totals.balance_due)
    .bind(status.as_str())
    .fetch_one(&mut *conn)
    .await?;
    Ok(invoice)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn today() -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 6, 10).unwrap()
    }

    fn line(description: &str, quantity: Decimal, unit_price: Decimal) -> LineItem {
        LineItem { description: description.into(), quantity, unit_price, amount: Decimal::ZERO }
    }

    fn input() -> InvoiceInput {
        InvoiceInput {
            client_id: Some(Uuid::new_v4()),
            line_items: Some(vec![line("Reel", dec!(2), dec!(15000)), line("Story", dec!(3), dec!(2500))]),
            discount_type: Some("percentage".into()),
            discount_value: Some(dec!(5)),
            tax_rate: Some(dec!(18)),
            ..Default::default()
        }
    }

    #[test]
    fn new_invoice_defaults_and_totals() {
        let (f, v) = InvoiceFields::merge(input(), None, today(), "INR");
        assert!(v.finish().is_ok());
        assert_eq!(f.issue_date, today());
        assert_eq!(f.currency, "INR");
        assert_eq!(f.line_items[0].amount, dec!(30000));

        let totals = f.totals(Decimal::ZERO);
        assert_eq!(totals.subtotal, dec!(37500));
        assert_eq!(totals.discount_amount, dec!(1875));
        assert_eq!(totals.tax_amount, dec!(6412.50));
        assert_eq!(totals.total, dec!(42037.50));
    }

    #[test]
    fn line_item_errors_are_indexed() {
        let mut bad = input();
        bad.line_items = Some(vec![line("", dec!(0), dec!(-1))]);
        bad.tax_rate = Some(dec!(150));
        let (_, v) = InvoiceFields::merge(bad, None, today(), "INR");
        assert!(v.has("line_items[0].description"));
        assert!(v.has("line_items[0].quantity"));
        assert!(v.has("line_items[0].unit_price"));
        assert!(v.has("tax_rate"));
    }

    #[test]
    fn due_date_cannot_precede_issue_date() {
        let mut early = input();
        early.issue_date = Some(today());
        early.due_date = NaiveDate::from_ymd_opt(2024, 6, 1);
        let (_, v) = InvoiceFields::merge(early, None, today(), "INR");
        assert!(v.has("due_date"));
    }

    #[test]
    fn template_fills_due_date_and_terms() {
        let (mut f, _) = InvoiceFields::merge(input(), None, today(), "INR");
        let now = Utc::now();
        let term = PaymentTerm {
            id: Uuid::new_v4(),
            name: "Net 15".into(),
            due_days: 15,
            terms: Some("Payable within 15 days by bank transfer".into()),
            is_default: true,
            created_at: now,
            updated_at: now,
        };
        f.apply_term(&term);
        assert_eq!(f.due_date, NaiveDate::from_ymd_opt(2024, 6, 25));
        assert_eq!(f.terms.as_deref(), Some("Payable within 15 days by bank transfer"));

        // An explicit due date wins over the template
        let mut explicit = input();
        explicit.due_date = NaiveDate::from_ymd_opt(2024, 7, 1);
        let (mut f, _) = InvoiceFields::merge(explicit, None, today(), "INR");
        f.apply_term(&term);
        assert_eq!(f.due_date, NaiveDate::from_ymd_opt(2024, 7, 1));
    }

    #[test]
    fn percentage_discount_above_100_is_rejected() {
        let mut bad = input();
        bad.discount_value = Some(dec!(120));
        let (_, v) = InvoiceFields::merge(bad, None, today(), "INR");
        assert!(v.has("discount_value"));
    }

    #[test]
    fn amount_changes_are_detected() {
        assert!(input().changes_amounts());
        let notes_only = InvoiceInput { notes: Some("Thanks!".into()), ..Default::default() };
        assert!(!notes_only.changes_amounts());
    }

    fn stored(term: Option<Uuid>) -> Invoice {
        let (f, _) = InvoiceFields::merge(input(), None, today(), "INR");
        let totals = f.totals(Decimal::ZERO);
        let now = Utc::now();
        Invoice {
            id: Uuid::new_v4(),
            invoice_number: "INV-202406-0001".into(),
            client_id: f.client_id,
            project_id: None,
            payment_term_id: term,
            issue_date: today(),
            due_date: NaiveDate::from_ymd_opt(2024, 6, 25).unwrap(),
            line_items: Json(f.line_items),
            subtotal: totals.subtotal,
            discount_type: f.discount.kind,
            discount_value: f.discount.value,
            discount_amount: totals.discount_amount,
            tax_rate: f.tax_rate,
            tax_amount: totals.tax_amount,
            total: totals.total,
            amount_paid: Decimal::ZERO,
            balance_due: totals.balance_due,
            currency: "INR".into(),
            status: InvoiceStatus::Draft,
            notes: None,
            terms: None,
            sent_at: None,
            paid_at: None,
            created_at: now,
            updated_at: now,
        }
    }

    #[test]
    fn clearing_the_template_keeps_the_due_date() {
        let current = stored(Some(Uuid::new_v4()));
        let patch: InvoiceInput = serde_json::from_str(r#"{"payment_term_id": null}"#).unwrap();
        let (f, v) = InvoiceFields::merge(patch, Some(&current), today(), "INR");
        assert!(v.finish().is_ok());
        assert_eq!(f.payment_term_id, None);
        assert_eq!(f.due_date, Some(current.due_date));
    }

    #[test]
    fn new_issue_date_rederives_due_date_only_with_a_template() {
        let moved = || InvoiceInput { issue_date: NaiveDate::from_ymd_opt(2024, 6, 12), ..Default::default() };

        let (f, _) = InvoiceFields::merge(moved(), Some(&stored(Some(Uuid::new_v4()))), today(), "INR");
        assert_eq!(f.due_date, None);

        let untemplated = stored(None);
        let (f, _) = InvoiceFields::merge(moved(), Some(&untemplated), today(), "INR");
        assert_eq!(f.due_date, Some(untemplated.due_date));
    }
}
