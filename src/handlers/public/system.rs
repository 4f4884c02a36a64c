use serde_json::{json, Value};

use crate::database::DatabaseManager;
use crate::error::ApiError;
use crate::middleware::{ApiResponse, ApiResult};

/// GET / - service name, version and endpoint index
pub async fn root() -> ApiResponse<Value> {
    ApiResponse::success(json!({
        "name": "Agency Portal API",
        "version": env!("CARGO_PKG_VERSION"),
        "description": env!("CARGO_PKG_DESCRIPTION"),
        "endpoints": {
            "health": "GET /health",
            "login": "POST /auth/login",
            "account": "GET /api/auth/me, PUT /api/auth/password",
            "users": "/api/users[/:id] (admin)",
            "clients": "/api/clients[/:id]",
            "leads": "/api/leads[/:id], POST /api/leads/:id/convert",
            "people": "/api/people[/:id], GET /api/people/:id/rate-cards",
            "rate_cards": "/api/rate-cards[/:id]",
            "payment_terms": "/api/payment-terms[/:id]",
            "projects": "/api/projects[/:id]",
            "invoices": "/api/invoices[/:id], POST /api/invoices/:id/send|cancel, GET /api/invoices/:id/payments",
            "payments": "/api/payments[/:id]",
            "dashboard": "GET /api/dashboard/summary"
        }
    }))
}

/// GET /health - 200 when the database answers, 503 otherwise
pub async fn health() -> ApiResult<Value> {
    match DatabaseManager::health_check().await {
        Ok(()) => Ok(ApiResponse::success(json!({
            "status": "ok",
            "database": "connected",
            "version": env!("CARGO_PKG_VERSION"),
        }))),
        Err(e) => {
            tracing::warn!(error = %e, "Health check failed");
            Err(ApiError::service_unavailable("Database unavailable"))
        }
    }
}
