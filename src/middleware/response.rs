use axum::{
    http::StatusCode,
    response::{IntoResponse, Json, Response},
};
use serde::Serialize;
use serde_json::{json, Value};
use uuid::Uuid;

use crate::filter::Page;

/// Wrapper for API responses that automatically adds success envelope
#[derive(Debug)]
pub struct ApiResponse<T: Serialize> {
    pub data: T,
    pub status_code: Option<StatusCode>,
}

impl<T: Serialize> ApiResponse<T> {
    /// Create a successful API response with default 200 status
    pub fn success(data: T) -> Self {
        Self { data, status_code: None }
    }

    /// Create a 201 Created response
    pub fn created(data: T) -> Self {
        Self {
            data,
            status_code: Some(StatusCode::CREATED),
        }
    }
}

fn serialize<T: Serialize>(data: &T) -> Result<Value, Response> {
    serde_json::to_value(data).map_err(|e| {
        tracing::error!("Failed to serialize response data: {}", e);
        crate::error::ApiError::internal_server_error("Failed to serialize response data").into_response()
    })
}

impl<T: Serialize> IntoResponse for ApiResponse<T> {
    fn into_response(self) -> Response {
        let status = self.status_code.unwrap_or(StatusCode::OK);
        match serialize(&self.data) {
            Ok(data) => (status, Json(json!({ "success": true, "data": data }))).into_response(),
            Err(response) => response,
        }
    }
}

/// List envelope: `data` is the page of items, `pagination` the counts.
#[derive(Debug)]
pub struct Paginated<T: Serialize>(pub Page<T>);

impl<T: Serialize> IntoResponse for Paginated<T> {
    fn into_response(self) -> Response {
        let page = self.0;
        let pages = page.pages();
        match serialize(&page.items) {
            Ok(items) => Json(json!({
                "success": true,
                "data": items,
                "pagination": {
                    "page": page.page,
                    "limit": page.limit,
                    "total": page.total,
                    "pages": pages,
                }
            }))
            .into_response(),
            Err(response) => response,
        }
    }
}

/// Body returned by every DELETE.
#[derive(Debug, Serialize)]
pub struct Deleted {
    pub id: Uuid,
    pub deleted: bool,
}

impl Deleted {
    pub fn new(id: Uuid) -> Self {
        Self { id, deleted: true }
    }
}

// Convenience type aliases
pub type ApiResult<T> = Result<ApiResponse<T>, crate::error::ApiError>;
