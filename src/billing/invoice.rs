use chrono::NaiveDate;
use rust_decimal::{Decimal, RoundingStrategy};
use serde::{Deserialize, Serialize};

use crate::types::text_enum;

text_enum! {
    pub enum InvoiceStatus {
        Draft => "draft",
        Sent => "sent",
        PartiallyPaid => "partially_paid",
        Paid => "paid",
        Overdue => "overdue",
        Cancelled => "cancelled",
    }
}

impl InvoiceStatus {
    /// Statuses whose line items and totals are frozen.
    pub fn is_locked(&self) -> bool {
        matches!(self, InvoiceStatus::Paid | InvoiceStatus::Cancelled)
    }
}

text_enum! {
    pub enum DiscountType {
        Percentage => "percentage",
        Fixed => "fixed",
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LineItem {
    pub description: String,
    pub quantity: Decimal,
    pub unit_price: Decimal,
    /// Always recomputed from quantity and unit price
    #[serde(default)]
    pub amount: Decimal,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Discount {
    pub kind: DiscountType,
    pub value: Decimal,
}

impl Discount {
    pub fn none() -> Self {
        Self { kind: DiscountType::Fixed, value: Decimal::ZERO }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Totals {
    pub subtotal: Decimal,
    pub discount_amount: Decimal,
    pub tax_amount: Decimal,
    pub total: Decimal,
    pub balance_due: Decimal,
}

/// Rounds money to cents, halves away from zero.
pub fn round2(value: Decimal) -> Decimal {
    value.round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero)
}

/// Sets each line's `amount` to `quantity * unit_price`.
pub fn price_lines(items: &mut [LineItem]) {
    for item in items.iter_mut() {
        item.amount = round2(item.quantity * item.unit_price);
    }
}

pub fn compute_totals(items: &[LineItem], discount: Discount, tax_rate: Decimal, amount_paid: Decimal) -> Totals {
    let subtotal: Decimal = items.iter().map(|i| round2(i.quantity * i.unit_price)).sum();

    let discount_amount = match discount.kind {
        DiscountType::Percentage => round2(subtotal * discount.value / Decimal::ONE_HUNDRED),
        DiscountType::Fixed => round2(discount.value),
    }
    .clamp(Decimal::ZERO, subtotal.max(Decimal::ZERO));

    let taxable = subtotal - discount_amount;
    let tax_amount = round2(taxable * tax_rate / Decimal::ONE_HUNDRED);
    let total = taxable + tax_amount;
    let balance_due = (total - amount_paid).max(Decimal::ZERO);

    Totals { subtotal, discount_amount, tax_amount, total, balance_due }
}

/// Status after a change to totals or payments. `cancelled` never changes
/// and a `draft` only leaves draft by being paid in full or sent.
pub fn derive_status(
    current: InvoiceStatus,
    total: Decimal,
    amount_paid: Decimal,
    due_date: NaiveDate,
    today: NaiveDate,
) -> InvoiceStatus {
    if current == InvoiceStatus::Cancelled {
        return InvoiceStatus::Cancelled;
    }
    if total > Decimal::ZERO && amount_paid >= total {
        return InvoiceStatus::Paid;
    }
    if current == InvoiceStatus::Draft {
        return InvoiceStatus::Draft;
    }
    let past_due = due_date < today;
    if amount_paid > Decimal::ZERO {
        if past_due { InvoiceStatus::Overdue } else { InvoiceStatus::PartiallyPaid }
    } else if past_due {
        InvoiceStatus::Overdue
    } else {
        InvoiceStatus::Sent
    }
}
