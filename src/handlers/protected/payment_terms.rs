use crate::api::{ApiJson, IdPath, ListQuery};
use crate::database::models::{PaymentTerm, Role};
use crate::database::Resource;
use crate::error::ApiError;
use crate::filter::ListParams;
use crate::middleware::{ApiResponse, ApiResult, AuthUser, Deleted, Paginated};
use crate::services::payment_term_service::PaymentTermInput;
use crate::services::PaymentTermService;

pub async fn list(ListQuery(query): ListQuery) -> Result<Paginated<PaymentTerm>, ApiError> {
    let params = ListParams::from_query(&query, &PaymentTerm::SPEC)?;
    Ok(Paginated(PaymentTermService::new()?.list(params).await?))
}

pub async fn show(IdPath(id): IdPath) -> ApiResult<PaymentTerm> {
    Ok(ApiResponse::success(PaymentTermService::new()?.get(id).await?))
}

/// GET /api/payment-terms/default; `data` is null when no template is marked default
pub async fn default_term() -> ApiResult<Option<PaymentTerm>> {
    Ok(ApiResponse::success(PaymentTermService::new()?.default_term().await?))
}

pub async fn create(user: AuthUser, ApiJson(body): ApiJson<PaymentTermInput>) -> ApiResult<PaymentTerm> {
    user.require(Role::Manager)?;
    Ok(ApiResponse::created(PaymentTermService::new()?.create(body).await?))
}

pub async fn update(user: AuthUser, IdPath(id): IdPath, ApiJson(body): ApiJson<PaymentTermInput>) -> ApiResult<PaymentTerm> {
    user.require(Role::Manager)?;
    Ok(ApiResponse::success(PaymentTermService::new()?.update(id, body).await?))
}

pub async fn delete(user: AuthUser, IdPath(id): IdPath) -> ApiResult<Deleted> {
    user.require(Role::Manager)?;
    PaymentTermService::new()?.delete(id).await?;
    Ok(ApiResponse::success(Deleted::new(id)))
}
