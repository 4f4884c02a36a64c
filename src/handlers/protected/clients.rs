use crate::api::{ApiJson, IdPath, ListQuery};
use crate::database::models::{Client, Role};
use crate::database::Resource;
use crate::error::ApiError;
use crate::filter::ListParams;
use crate::middleware::{ApiResponse, ApiResult, AuthUser, Deleted, Paginated};
use crate::services::client_service::ClientInput;
use crate::services::ClientService;

pub async fn list(ListQuery(query): ListQuery) -> Result<Paginated<Client>, ApiError> {
    let params = ListParams::from_query(&query, &Client::SPEC)?;
    Ok(Paginated(ClientService::new()?.list(params).await?))
}

pub async fn show(IdPath(id): IdPath) -> ApiResult<Client> {
    Ok(ApiResponse::success(ClientService::new()?.get(id).await?))
}

pub async fn create(ApiJson(body): ApiJson<ClientInput>) -> ApiResult<Client> {
    Ok(ApiResponse::created(ClientService::new()?.create(body).await?))
}

pub async fn update(IdPath(id): IdPath, ApiJson(body): ApiJson<ClientInput>) -> ApiResult<Client> {
    Ok(ApiResponse::success(ClientService::new()?.update(id, body).await?))
}

pub async fn delete(user: AuthUser, IdPath(id): IdPath) -> ApiResult<Deleted> {
    user.require(Role::Manager)?;
    ClientService::new()?.delete(id).await?;
    Ok(ApiResponse::success(Deleted::new(id)))
}
