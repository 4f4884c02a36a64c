use serde::{Deserialize, Serialize};

use crate::api::ApiJson;
use crate::auth::generate_jwt;
use crate::database::models::User;
use crate::middleware::{ApiResponse, ApiResult};
use crate::services::{UserService, Validator};

#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub email: Option<String>,
    pub password: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct LoginResponse {
    pub token: String,
    pub expires_in: i64,
    pub user: User,
}

/// POST /auth/login - exchange email and password for a bearer token
pub async fn login(ApiJson(body): ApiJson<LoginRequest>) -> ApiResult<LoginResponse> {
    let mut v = Validator::new();
    let email = v.required("email", body.email.as_deref());
    let password = body.password.unwrap_or_default();
    if password.is_empty() {
        v.add("password", "is required");
    }
    v.finish()?;

    let user = UserService::new()?.authenticate(&email, &password).await?;
    let (token, expires_in) = generate_jwt(&user)?;
    tracing::info!(user_id = %user.id, role = %user.role, "User logged in");

    Ok(ApiResponse::success(LoginResponse { token, expires_in, user }))
}
