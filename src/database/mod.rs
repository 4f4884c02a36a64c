pub mod manager;
pub mod models;
pub mod query_builder;
pub mod repository;

pub use manager::{quote_identifier, DatabaseError, DatabaseManager};
pub use models::Resource;
pub use query_builder::QueryBuilder;
pub use repository::Repository;
