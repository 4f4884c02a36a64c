// Mounted behind require_role(Role::Admin).

use crate::api::{ApiJson, IdPath, ListQuery};
use crate::database::models::User;
use crate::database::Resource;
use crate::error::ApiError;
use crate::filter::ListParams;
use crate::middleware::{ApiResponse, ApiResult, AuthUser, Deleted, Paginated};
use crate::services::user_service::UserInput;
use crate::services::UserService;

pub async fn list(ListQuery(query): ListQuery) -> Result<Paginated<User>, ApiError> {
    let params = ListParams::from_query(&query, &User::SPEC)?;
    Ok(Paginated(UserService::new()?.list(params).await?))
}

pub async fn show(IdPath(id): IdPath) -> ApiResult<User> {
    Ok(ApiResponse::success(UserService::new()?.get(id).await?))
}

pub async fn create(ApiJson(body): ApiJson<UserInput>) -> ApiResult<User> {
    Ok(ApiResponse::created(UserService::new()?.create(body).await?))
}

pub async fn update(actor: AuthUser, IdPath(id): IdPath, ApiJson(body): ApiJson<UserInput>) -> ApiResult<User> {
    Ok(ApiResponse::success(UserService::new()?.update(id, body, actor.id).await?))
}

pub async fn delete(actor: AuthUser, IdPath(id): IdPath) -> ApiResult<Deleted> {
    UserService::new()?.delete(id, actor.id).await?;
    Ok(ApiResponse::success(Deleted::new(id)))
}
