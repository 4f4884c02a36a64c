use std::sync::Arc;

use axum::{
    async_trait,
    extract::{FromRequestParts, Request, State},
    http::{header, request::Parts, HeaderMap},
    middleware::Next,
    response::Response,
};
use serde::Serialize;
use uuid::Uuid;

use crate::auth::{validate_jwt, Claims};
use crate::database::models::Role;
use crate::database::{DatabaseError, DatabaseManager};
use crate::error::ApiError;

/// Authenticated user context extracted from JWT
#[derive(Clone, Debug, Serialize)]
pub struct AuthUser {
    pub id: Uuid,
    pub email: String,
    pub role: Role,
}

impl AuthUser {
    /// 403 unless this user's role is at least `required`.
    pub fn require(&self, required: Role) -> Result<(), ApiError> {
        if self.role.allows(required) {
            return Ok(());
        }
        tracing::warn!(user_id = %self.id, role = %self.role, required = %required, "Role check failed");
        Err(ApiError::forbidden(format!("This action requires the {} role", required)))
    }
}

impl From<Claims> for AuthUser {
    fn from(claims: Claims) -> Self {
        Self {
            id: claims.sub,
            email: claims.email,
            role: claims.role,
        }
    }
}

#[async_trait]
impl<S: Send + Sync> FromRequestParts<S> for AuthUser {
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<AuthUser>()
            .cloned()
            .ok_or_else(|| ApiError::unauthorized("Authentication required"))
    }
}

/// Answers whether the user behind a token may still use the API.
#[async_trait]
pub trait AccountStatus: Send + Sync {
    /// False for deactivated and deleted users.
    async fn is_active(&self, id: Uuid) -> Result<bool, ApiError>;
}

pub type Accounts = Arc<dyn AccountStatus>;

/// Looks the flag up in the `users` table on every request.
pub struct UserTable;

#[async_trait]
impl AccountStatus for UserTable {
    async fn is_active(&self, id: Uuid) -> Result<bool, ApiError> {
        let pool = DatabaseManager::pool()?;
        let active: Option<bool> = sqlx::query_scalar("SELECT is_active FROM users WHERE id = $1")
            .bind(id)
            .fetch_optional(&pool)
            .await
            .map_err(DatabaseError::from)?;
        Ok(active.unwrap_or(false))
    }
}

/// JWT authentication middleware that validates tokens and extracts user context.
/// Tokens outlive deactivation, so the account is checked as well.
pub async fn jwt_auth_middleware(
    State(accounts): State<Accounts>,
    headers: HeaderMap,
    mut request: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let token = extract_jwt_from_headers(&headers).map_err(ApiError::unauthorized)?;
    let claims = validate_jwt(&token).map_err(|e| {
        tracing::warn!(error = %e, path = %request.uri().path(), "Rejected bearer token");
        ApiError::from(e)
    })?;

    if !accounts.is_active(claims.sub).await? {
        tracing::warn!(user_id = %claims.sub, "Token presented for an inactive account");
        return Err(ApiError::unauthorized("Account is disabled"));
    }

    request.extensions_mut().insert(AuthUser::from(claims));
    Ok(next.run(request).await)
}

/// Extract JWT token from Authorization header
fn extract_jwt_from_headers(headers: &HeaderMap) -> Result<String, String> {
    let auth_header = headers
        .get(header::AUTHORIZATION)
        .ok_or_else(|| "Missing Authorization header".to_string())?;

    let auth_str = auth_header
        .to_str()
        .map_err(|_| "Invalid Authorization header format".to_string())?;

    match auth_str.strip_prefix("Bearer ") {
        Some(token) if !token.trim().is_empty() => Ok(token.trim().to_string()),
        Some(_) => Err("Empty JWT token".to_string()),
        None => Err("Authorization header must use Bearer token format".to_string()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    fn headers(value: &str) -> HeaderMap {
        let mut headers = HeaderMap::new();
        headers.insert(header::AUTHORIZATION, HeaderValue::from_str(value).unwrap());
        headers
    }

    #[test]
    fn extracts_bearer_tokens() {
        assert_eq!(extract_jwt_from_headers(&headers("Bearer abc.def.ghi")).unwrap(), "abc.def.ghi");
        assert!(extract_jwt_from_headers(&headers("Basic dXNlcjpwYXNz")).is_err());
        assert!(extract_jwt_from_headers(&headers("Bearer   ")).is_err());
        assert!(extract_jwt_from_headers(&HeaderMap::new()).is_err());
    }

    #[test]
    fn require_checks_role_order() {
        let user = AuthUser { id: Uuid::new_v4(), email: "s@agency.test".into(), role: Role::Staff };
        assert!(user.require(Role::Staff).is_ok());
        let err = user.require(Role::Manager).unwrap_err();
        assert_eq!(err.status_code(), axum::http::StatusCode::FORBIDDEN);
    }
}
