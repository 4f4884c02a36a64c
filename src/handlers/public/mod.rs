// Public handlers: token acquisition, service index and health.

pub mod auth;
pub mod system;
