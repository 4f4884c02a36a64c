pub mod auth;
pub mod rate_limit;
pub mod response;
pub mod role;

pub use auth::{jwt_auth_middleware, AccountStatus, Accounts, AuthUser, UserTable};
pub use rate_limit::{rate_limit_middleware, RateLimiter};
pub use response::{ApiResponse, ApiResult, Deleted, Paginated};
pub use role::require_role;
