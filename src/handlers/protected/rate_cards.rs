use crate::api::{ApiJson, IdPath, ListQuery};
use crate::database::models::{RateCard, Role};
use crate::database::Resource;
use crate::error::ApiError;
use crate::filter::ListParams;
use crate::middleware::{ApiResponse, ApiResult, AuthUser, Deleted, Paginated};
use crate::services::rate_card_service::RateCardInput;
use crate::services::RateCardService;

pub async fn list(ListQuery(query): ListQuery) -> Result<Paginated<RateCard>, ApiError> {
    let params = ListParams::from_query(&query, &RateCard::SPEC)?;
    Ok(Paginated(RateCardService::new()?.list(params).await?))
}

pub async fn show(IdPath(id): IdPath) -> ApiResult<RateCard> {
    Ok(ApiResponse::success(RateCardService::new()?.get(id).await?))
}

pub async fn create(ApiJson(body): ApiJson<RateCardInput>) -> ApiResult<RateCard> {
    Ok(ApiResponse::created(RateCardService::new()?.create(body).await?))
}

pub async fn update(IdPath(id): IdPath, ApiJson(body): ApiJson<RateCardInput>) -> ApiResult<RateCard> {
    Ok(ApiResponse::success(RateCardService::new()?.update(id, body).await?))
}

pub async fn delete(user: AuthUser, IdPath(id): IdPath) -> ApiResult<Deleted> {
    user.require(Role::Manager)?;
    RateCardService::new()?.delete(id).await?;
    Ok(ApiResponse::success(Deleted::new(id)))
}
