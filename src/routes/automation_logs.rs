//! Automation log routes: single and batch ingestion, lookup and history.

use axum::{
    extract::{Path, Query, State},
    Json,
};
use serde::Deserialize;
use serde_json::Value;
use uuid::Uuid;

use crate::errors::{ApiResponse, AppError};
use crate::models::automation_log::{AutomationLog, NewLogEntry};
use crate::models::pagination::{PagedResult, Pagination};
use crate::services::automation_log::{self as log_service, AutomationLogFilters, LogBatchResult};
use crate::AppState;

/// Body of the batch ingestion action.
///
/// Entries stay untyped here so a malformed entry fails on its own index
/// instead of rejecting the whole request.
#[derive(Debug, Deserialize)]
pub struct LogBatchRequest {
    #[serde(default)]
    pub logs: Option<Value>,
}

/// GET /api/v1/automation-logs
pub async fn list(
    State(state): State<AppState>,
    Query(pagination): Query<Pagination>,
    Query(filters): Query<AutomationLogFilters>,
) -> Result<Json<ApiResponse<PagedResult<AutomationLog>>>, AppError> {
    let result = log_service::list(&state.db, &filters, &pagination).await?;
    Ok(ApiResponse::success(result))
}

/// GET /api/v1/automation-logs/{id}
pub async fn get_by_id(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<ApiResponse<AutomationLog>>, AppError> {
    let log = log_service::get(&state.db, id).await?;
    Ok(ApiResponse::success(log))
}

/// POST /api/v1/automation-logs
pub async fn add_log(
    State(state): State<AppState>,
    Json(body): Json<NewLogEntry>,
) -> Result<Json<ApiResponse<AutomationLog>>, AppError> {
    let log = log_service::add_log(&state.db, &body, state.config.default_severity).await?;
    Ok(ApiResponse::success(log))
}

/// POST /api/v1/automation-logs/batch
pub async fn add_logs(
    State(state): State<AppState>,
    Json(body): Json<LogBatchRequest>,
) -> Result<Json<ApiResponse<LogBatchResult>>, AppError> {
    let Some(Value::Array(entries)) = body.logs else {
        return Err(AppError::Validation("Logs must be a non-empty array".to_string()));
    };
    let result = log_service::add_logs(&state.db, &entries, state.config.default_severity).await?;
    Ok(ApiResponse::success(result))
}
