use crate::api::{ApiJson, IdPath, ListQuery};
use crate::database::models::{Payment, Role};
use crate::database::Resource;
use crate::error::ApiError;
use crate::filter::ListParams;
use crate::middleware::{ApiResponse, ApiResult, AuthUser, Deleted, Paginated};
use crate::services::payment_service::{PaymentInput, Receipt};
use crate::services::PaymentService;

pub async fn list(ListQuery(query): ListQuery) -> Result<Paginated<Payment>, ApiError> {
    let params = ListParams::from_query(&query, &Payment::SPEC)?;
    Ok(Paginated(PaymentService::new()?.list(params).await?))
}

pub async fn show(IdPath(id): IdPath) -> ApiResult<Payment> {
    Ok(ApiResponse::success(PaymentService::new()?.get(id).await?))
}

/// Responds with the payment and the invoice it was applied to.
pub async fn create(user: AuthUser, ApiJson(body): ApiJson<PaymentInput>) -> ApiResult<Receipt> {
    user.require(Role::Manager)?;
    Ok(ApiResponse::created(PaymentService::new()?.create(body).await?))
}

pub async fn update(user: AuthUser, IdPath(id): IdPath, ApiJson(body): ApiJson<PaymentInput>) -> ApiResult<Receipt> {
    user.require(Role::Manager)?;
    Ok(ApiResponse::success(PaymentService::new()?.update(id, body).await?))
}

pub async fn delete(user: AuthUser, IdPath(id): IdPath) -> ApiResult<Deleted> {
    user.require(Role::Manager)?;
    PaymentService::new()?.delete(id).await?;
    Ok(ApiResponse::success(Deleted::new(id)))
}
