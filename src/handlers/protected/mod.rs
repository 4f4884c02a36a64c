// Protected handlers: every route here sits behind jwt_auth_middleware and
// the rate limiter, so an `AuthUser` is always available.

pub mod account;
pub mod clients;
pub mod dashboard;
pub mod invoices;
pub mod leads;
pub mod payment_terms;
pub mod payments;
pub mod people;
pub mod projects;
pub mod rate_cards;
pub mod users;
