pub mod user;
pub mod client;
pub mod lead;
pub mod person;
pub mod rate_card;
pub mod payment_term;
pub mod project;
pub mod invoice;
pub mod payment;

use serde::Serialize;
use sqlx::{postgres::PgRow, FromRow};

use crate::filter::ResourceSpec;

pub use client::{Client, ClientStatus};
pub use invoice::{DiscountType, Invoice, InvoiceStatus, LineItem};
pub use lead::{Lead, LeadStatus};
pub use payment::{Payment, PaymentMethod};
pub use payment_term::PaymentTerm;
pub use person::{Person, PersonStatus};
pub use project::{Project, ProjectStatus};
pub use rate_card::RateCard;
pub use user::{Role, User};

/// A row type backed by one table, with the listing rules for that table.
pub trait Resource: for<'r> FromRow<'r, PgRow> + Serialize + Send + Unpin {
    const SPEC: ResourceSpec;
}
