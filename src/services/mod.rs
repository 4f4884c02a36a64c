pub mod error;
pub mod sequence;
pub mod validation;

pub mod client_service;
pub mod dashboard_service;
pub mod invoice_service;
pub mod lead_service;
pub mod payment_service;
pub mod payment_term_service;
pub mod person_service;
pub mod project_service;
pub mod rate_card_service;
pub mod user_service;

pub use client_service::ClientService;
pub use dashboard_service::DashboardService;
pub use error::ServiceError;
pub use invoice_service::InvoiceService;
pub use lead_service::LeadService;
pub use payment_service::PaymentService;
pub use payment_term_service::PaymentTermService;
pub use person_service::PersonService;
pub use project_service::ProjectService;
pub use rate_card_service::RateCardService;
pub use user_service::UserService;
pub use validation::Validator;

use sqlx::PgPool;

use crate::database::DatabaseManager;

/// Shared pool lookup for services constructed per request.
pub(crate) fn pool() -> Result<PgPool, ServiceError> {
    Ok(DatabaseManager::pool()?)
}
