use serde_json::json;

use crate::api::{ApiJson, IdPath, ListQuery};
use crate::database::models::{Person, RateCard, Role};
use crate::database::Resource;
use crate::error::ApiError;
use crate::filter::ListParams;
use crate::middleware::{ApiResponse, ApiResult, AuthUser, Deleted, Paginated};
use crate::services::person_service::PersonInput;
use crate::services::{PersonService, RateCardService};

pub async fn list(ListQuery(query): ListQuery) -> Result<Paginated<Person>, ApiError> {
    let params = ListParams::from_query(&query, &Person::SPEC)?;
    Ok(Paginated(PersonService::new()?.list(params).await?))
}

pub async fn show(IdPath(id): IdPath) -> ApiResult<Person> {
    Ok(ApiResponse::success(PersonService::new()?.get(id).await?))
}

pub async fn create(ApiJson(body): ApiJson<PersonInput>) -> ApiResult<Person> {
    Ok(ApiResponse::created(PersonService::new()?.create(body).await?))
}

pub async fn update(IdPath(id): IdPath, ApiJson(body): ApiJson<PersonInput>) -> ApiResult<Person> {
    Ok(ApiResponse::success(PersonService::new()?.update(id, body).await?))
}

pub async fn delete(user: AuthUser, IdPath(id): IdPath) -> ApiResult<Deleted> {
    user.require(Role::Manager)?;
    PersonService::new()?.delete(id).await?;
    Ok(ApiResponse::success(Deleted::new(id)))
}

/// GET /api/people/:id/rate-cards
pub async fn rate_cards(IdPath(id): IdPath, ListQuery(query): ListQuery) -> Result<Paginated<RateCard>, ApiError> {
    let params = ListParams::from_query(&query, &RateCard::SPEC)?.scope("person_id", json!(id));
    PersonService::new()?.get(id).await?;
    Ok(Paginated(RateCardService::new()?.list(params).await?))
}
