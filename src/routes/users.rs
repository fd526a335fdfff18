//! Code user routes: lookup, trust toggle, rule application and rule views.

use axum::{
    extract::{Path, Query, State},
    Json,
};

use crate::errors::{ApiResponse, AppError};
use crate::models::code_user::{CodeUser, SetTrusted};
use crate::models::notification::Notified;
use crate::models::pagination::{PagedResult, Pagination};
use crate::models::user_rule::AssignedRule;
use crate::services::code_user::{self as user_service, CodeUserFilters};
use crate::services::user_rule::{self as assignment_service, ApplyRulesResult, OverdueRulesResult};
use crate::AppState;

/// GET /api/v1/users
pub async fn list(
    State(state): State<AppState>,
    Query(pagination): Query<Pagination>,
    Query(filters): Query<CodeUserFilters>,
) -> Result<Json<ApiResponse<PagedResult<CodeUser>>>, AppError> {
    let result = user_service::list(&state.db, &filters, &pagination).await?;
    Ok(ApiResponse::success(result))
}

/// GET /api/v1/users/{id}
pub async fn get_by_id(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<ApiResponse<CodeUser>>, AppError> {
    let user = user_service::get(&state.db, &id).await?;
    Ok(ApiResponse::success(user))
}

/// POST /api/v1/users/{id}/make-trusted
pub async fn make_trusted(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<ApiResponse<Notified<CodeUser>>>, AppError> {
    Ok(ApiResponse::success(user_service::make_trusted(&state.db, &id).await?))
}

/// POST /api/v1/users/{id}/make-untrusted
pub async fn make_untrusted(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<ApiResponse<Notified<CodeUser>>>, AppError> {
    Ok(ApiResponse::success(user_service::make_untrusted(&state.db, &id).await?))
}

/// PUT /api/v1/users/{id}/trusted
pub async fn set_trusted(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(body): Json<SetTrusted>,
) -> Result<Json<ApiResponse<String>>, AppError> {
    let status = user_service::set_trusted_user(&state.db, &id, body.trusted).await?;
    Ok(ApiResponse::success(status))
}

/// POST /api/v1/users/{id}/apply-all-rules
pub async fn apply_all_rules(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<ApiResponse<ApplyRulesResult>>, AppError> {
    let today = state.config.today();
    let result = assignment_service::apply_all_rules(&state.db, &id, today).await?;
    Ok(ApiResponse::success(result))
}

/// POST /api/v1/users/{id}/init-rules
pub async fn init_rules(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<ApiResponse<ApplyRulesResult>>, AppError> {
    let today = state.config.today();
    let result = assignment_service::init_new_user_rules(&state.db, &id, today).await?;
    Ok(ApiResponse::success(result))
}

/// POST /api/v1/users/{id}/check-overdue-rules
pub async fn check_overdue_rules(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<ApiResponse<OverdueRulesResult>>, AppError> {
    let today = state.config.today();
    let result = assignment_service::check_for_overdue_rules(&state.db, &id, today).await?;
    Ok(ApiResponse::success(result))
}

/// GET /api/v1/users/{id}/applicable-rules: rules in force today on active object types.
pub async fn applicable_rules(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<ApiResponse<Vec<AssignedRule>>>, AppError> {
    let today = state.config.today();
    let rules = assignment_service::get_applicable_rules(&state.db, &id, today).await?;
    Ok(ApiResponse::success(rules))
}

/// GET /api/v1/users/{id}/all-rules
pub async fn all_rules(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<ApiResponse<Vec<AssignedRule>>>, AppError> {
    let rules = assignment_service::get_all_rules(&state.db, &id).await?;
    Ok(ApiResponse::success(rules))
}
