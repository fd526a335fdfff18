//! Rule type reference data routes.

use axum::{
    extract::{Path, State},
    Json,
};

use crate::errors::{ApiResponse, AppError};
use crate::models::rule_type::RuleType;
use crate::services::rule_type as rule_type_service;
use crate::AppState;

/// GET /api/v1/rule-types
pub async fn list(State(state): State<AppState>) -> Result<Json<ApiResponse<Vec<RuleType>>>, AppError> {
    let rule_types = rule_type_service::list(&state.db).await?;
    Ok(ApiResponse::success(rule_types))
}

/// GET /api/v1/rule-types/{code}
pub async fn get_by_code(
    State(state): State<AppState>,
    Path(code): Path<String>,
) -> Result<Json<ApiResponse<RuleType>>, AppError> {
    let rule_type = rule_type_service::get(&state.db, &code).await?;
    Ok(ApiResponse::success(rule_type))
}
