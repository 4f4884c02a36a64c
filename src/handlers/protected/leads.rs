use crate::api::{ApiJson, IdPath, ListQuery};
use crate::database::models::{Lead, Role};
use crate::database::Resource;
use crate::error::ApiError;
use crate::filter::ListParams;
use crate::middleware::{ApiResponse, ApiResult, AuthUser, Deleted, Paginated};
use crate::services::lead_service::{Conversion, LeadInput};
use crate::services::LeadService;

pub async fn list(ListQuery(query): ListQuery) -> Result<Paginated<Lead>, ApiError> {
    let params = ListParams::from_query(&query, &Lead::SPEC)?;
    Ok(Paginated(LeadService::new()?.list(params).await?))
}

pub async fn show(IdPath(id): IdPath) -> ApiResult<Lead> {
    Ok(ApiResponse::success(LeadService::new()?.get(id).await?))
}

pub async fn create(ApiJson(body): ApiJson<LeadInput>) -> ApiResult<Lead> {
    Ok(ApiResponse::created(LeadService::new()?.create(body).await?))
}

pub async fn update(IdPath(id): IdPath, ApiJson(body): ApiJson<LeadInput>) -> ApiResult<Lead> {
    Ok(ApiResponse::success(LeadService::new()?.update(id, body).await?))
}

pub async fn delete(user: AuthUser, IdPath(id): IdPath) -> ApiResult<Deleted> {
    user.require(Role::Manager)?;
    LeadService::new()?.delete(id).await?;
    Ok(ApiResponse::success(Deleted::new(id)))
}

/// POST /api/leads/:id/convert
pub async fn convert(IdPath(id): IdPath) -> ApiResult<Conversion> {
    Ok(ApiResponse::created(LeadService::new()?.convert(id).await?))
}
