pub mod extract;

pub use extract::{ApiJson, IdPath, ListQuery};
