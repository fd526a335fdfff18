//! Single user-rule assignment routes.

use axum::{
    extract::{Path, State},
    Json,
};
use uuid::Uuid;

use crate::errors::{ApiResponse, AppError};
use crate::models::user_rule::{CreateUserRule, UpdateUserRule, UserRule};
use crate::services::user_rule as assignment_service;
use crate::AppState;

/// GET /api/v1/users/{id}/rules
pub async fn list_for_user(
    State(state): State<AppState>,
    Path(user_id): Path<String>,
) -> Result<Json<ApiResponse<Vec<UserRule>>>, AppError> {
    let rules = assignment_service::list_for_user(&state.db, &user_id).await?;
    Ok(ApiResponse::success(rules))
}

/// POST /api/v1/users/{id}/rules
pub async fn create(
    State(state): State<AppState>,
    Path(user_id): Path<String>,
    Json(body): Json<CreateUserRule>,
) -> Result<Json<ApiResponse<UserRule>>, AppError> {
    let today = state.config.today();
    let rule = assignment_service::create(&state.db, &user_id, &body, today).await?;
    Ok(ApiResponse::success(rule))
}

/// GET /api/v1/user-rules/{id}
pub async fn get_by_id(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<ApiResponse<UserRule>>, AppError> {
    let rule = assignment_service::get(&state.db, id).await?;
    Ok(ApiResponse::success(rule))
}

/// PUT /api/v1/user-rules/{id}
pub async fn update(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(body): Json<UpdateUserRule>,
) -> Result<Json<ApiResponse<UserRule>>, AppError> {
    let rule = assignment_service::update(&state.db, id, &body).await?;
    Ok(ApiResponse::success(rule))
}

/// DELETE /api/v1/user-rules/{id}
pub async fn delete(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<ApiResponse<Uuid>>, AppError> {
    assignment_service::delete(&state.db, id).await?;
    Ok(ApiResponse::success(id))
}
