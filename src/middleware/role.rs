use axum::{extract::Request, middleware::Next, response::Response};

use super::AuthUser;
use crate::database::models::Role;
use crate::error::ApiError;

/// Route-level gate: `route_layer(from_fn_with_state(Role::Admin, require_role))`.
/// Runs after `jwt_auth_middleware` has stored the `AuthUser`.
pub async fn require_role(
    axum::extract::State(required): axum::extract::State<Role>,
    request: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let user = request
        .extensions()
        .get::<AuthUser>()
        .ok_or_else(|| ApiError::unauthorized("Authentication required"))?;
    user.require(required)?;
    Ok(next.run(request).await)
}
