use crate::middleware::{ApiResponse, ApiResult};
use crate::services::dashboard_service::DashboardSummary;
use crate::services::DashboardService;

/// GET /api/dashboard/summary
pub async fn summary() -> ApiResult<DashboardSummary> {
    Ok(ApiResponse::success(DashboardService::new()?.summary().await?))
}
