use crate::api::{ApiJson, IdPath, ListQuery};
use crate::database::models::{Project, Role};
use crate::database::Resource;
use crate::error::ApiError;
use crate::filter::ListParams;
use crate::middleware::{ApiResponse, ApiResult, AuthUser, Deleted, Paginated};
use crate::services::project_service::ProjectInput;
use crate::services::ProjectService;

pub async fn list(ListQuery(query): ListQuery) -> Result<Paginated<Project>, ApiError> {
    let params = ListParams::from_query(&query, &Project::SPEC)?;
    Ok(Paginated(ProjectService::new()?.list(params).await?))
}

pub async fn show(IdPath(id): IdPath) -> ApiResult<Project> {
    Ok(ApiResponse::success(ProjectService::new()?.get(id).await?))
}

pub async fn create(ApiJson(body): ApiJson<ProjectInput>) -> ApiResult<Project> {
    Ok(ApiResponse::created(ProjectService::new()?.create(body).await?))
}

pub async fn update(IdPath(id): IdPath, ApiJson(body): ApiJson<ProjectInput>) -> ApiResult<Project> {
    Ok(ApiResponse::success(ProjectService::new()?.update(id, body).await?))
}

pub async fn delete(user: AuthUser, IdPath(id): IdPath) -> ApiResult<Deleted> {
    user.require(Role::Manager)?;
    ProjectService::new()?.delete(id).await?;
    Ok(ApiResponse::success(Deleted::new(id)))
}
