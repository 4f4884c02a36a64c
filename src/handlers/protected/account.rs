use serde_json::{json, Value};

use crate::api::ApiJson;
use crate::database::models::User;
use crate::middleware::{ApiResponse, ApiResult, AuthUser};
use crate::services::user_service::PasswordChange;
use crate::services::UserService;

/// GET /api/auth/me
pub async fn me(user: AuthUser) -> ApiResult<User> {
    let user = UserService::new()?.get(user.id).await?;
    Ok(ApiResponse::success(user))
}

/// PUT /api/auth/password
pub async fn change_password(user: AuthUser, ApiJson(body): ApiJson<PasswordChange>) -> ApiResult<Value> {
    UserService::new()?.change_password(user.id, body).await?;
    Ok(ApiResponse::success(json!({ "message": "Password updated" })))
}
