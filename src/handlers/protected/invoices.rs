use serde_json::json;

use crate::api::{ApiJson, IdPath, ListQuery};
use crate::database::models::{Invoice, Payment, Role};
use crate::database::Resource;
use crate::error::ApiError;
use crate::filter::ListParams;
use crate::middleware::{ApiResponse, ApiResult, AuthUser, Deleted, Paginated};
use crate::services::invoice_service::InvoiceInput;
use crate::services::{InvoiceService, PaymentService};

pub async fn list(ListQuery(query): ListQuery) -> Result<Paginated<Invoice>, ApiError> {
    let params = ListParams::from_query(&query, &Invoice::SPEC)?;
    Ok(Paginated(InvoiceService::new()?.list(params).await?))
}

pub async fn show(IdPath(id): IdPath) -> ApiResult<Invoice> {
    Ok(ApiResponse::success(InvoiceService::new()?.get(id).await?))
}

pub async fn create(user: AuthUser, ApiJson(body): ApiJson<InvoiceInput>) -> ApiResult<Invoice> {
    user.require(Role::Manager)?;
    Ok(ApiResponse::created(InvoiceService::new()?.create(body).await?))
}

pub async fn update(user: AuthUser, IdPath(id): IdPath, ApiJson(body): ApiJson<InvoiceInput>) -> ApiResult<Invoice> {
    user.require(Role::Manager)?;
    Ok(ApiResponse::success(InvoiceService::new()?.update(id, body).await?))
}

pub async fn delete(user: AuthUser, IdPath(id): IdPath) -> ApiResult<Deleted> {
    user.require(Role::Manager)?;
    InvoiceService::new()?.delete(id).await?;
    Ok(ApiResponse::success(Deleted::new(id)))
}

/// POST /api/invoices/:id/send
pub async fn send(user: AuthUser, IdPath(id): IdPath) -> ApiResult<Invoice> {
    user.require(Role::Manager)?;
    Ok(ApiResponse::success(InvoiceService::new()?.send(id).await?))
}

/// POST /api/invoices/:id/cancel
pub async fn cancel(user: AuthUser, IdPath(id): IdPath) -> ApiResult<Invoice> {
    user.require(Role::Manager)?;
    Ok(ApiResponse::success(InvoiceService::new()?.cancel(id).await?))
}

/// GET /api/invoices/:id/payments
pub async fn payments(IdPath(id): IdPath, ListQuery(query): ListQuery) -> Result<Paginated<Payment>, ApiError> {
    let params = ListParams::from_query(&query, &Payment::SPEC)?.scope("invoice_id", json!(id));
    InvoiceService::new()?.get(id).await?;
    Ok(Paginated(PaymentService::new()?.list(params).await?))
}
