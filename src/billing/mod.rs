//! Invoice arithmetic, status rules, document numbering and payment-terms
//! dates. Nothing here touches the database.

pub mod invoice;
pub mod numbering;
pub mod terms;

pub use invoice::{
    compute_totals, derive_status, price_lines, round2, Discount, DiscountType, InvoiceStatus,
    LineItem, Totals,
};
pub use numbering::{month_prefix, next_number, suffix_pattern};
pub use terms::due_date_for;
