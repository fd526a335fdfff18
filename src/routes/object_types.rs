//! Object type routes: CRUD and the active/manual flag actions.

use axum::{
    extract::{Path, Query, State},
    Json,
};

use crate::errors::{ApiResponse, AppError};
use crate::models::notification::Notified;
use crate::models::object_type::{CreateObjectType, ObjectType, UpdateObjectType};
use crate::models::pagination::{PagedResult, Pagination};
use crate::services::object_type::{self as object_type_service, ObjectTypeFilters};
use crate::AppState;

type FlagResponse = Result<Json<ApiResponse<Notified<ObjectType>>>, AppError>;

/// GET /api/v1/object-types
pub async fn list(
    State(state): State<AppState>,
    Query(pagination): Query<Pagination>,
    Query(filters): Query<ObjectTypeFilters>,
) -> Result<Json<ApiResponse<PagedResult<ObjectType>>>, AppError> {
    let result = object_type_service::list(&state.db, &filters, &pagination).await?;
    Ok(ApiResponse::success(result))
}

/// POST /api/v1/object-types
pub async fn create(
    State(state): State<AppState>,
    Json(body): Json<CreateObjectType>,
) -> Result<Json<ApiResponse<ObjectType>>, AppError> {
    let object_type = object_type_service::create(&state.db, &body).await?;
    Ok(ApiResponse::success(object_type))
}

/// GET /api/v1/object-types/{code}
pub async fn get_by_code(
    State(state): State<AppState>,
    Path(code): Path<String>,
) -> Result<Json<ApiResponse<ObjectType>>, AppError> {
    let object_type = object_type_service::get(&state.db, &code).await?;
    Ok(ApiResponse::success(object_type))
}

/// PUT /api/v1/object-types/{code}
pub async fn update(
    State(state): State<AppState>,
    Path(code): Path<String>,
    Json(body): Json<UpdateObjectType>,
) -> Result<Json<ApiResponse<ObjectType>>, AppError> {
    let object_type = object_type_service::update(&state.db, &code, &body).await?;
    Ok(ApiResponse::success(object_type))
}

/// DELETE /api/v1/object-types/{code}
pub async fn delete(
    State(state): State<AppState>,
    Path(code): Path<String>,
) -> Result<Json<ApiResponse<String>>, AppError> {
    object_type_service::delete(&state.db, &code).await?;
    Ok(ApiResponse::success(code))
}

/// POST /api/v1/object-types/{code}/make-active
pub async fn make_active(State(state): State<AppState>, Path(code): Path<String>) -> FlagResponse {
    Ok(ApiResponse::success(object_type_service::make_active(&state.db, &code).await?))
}

/// POST /api/v1/object-types/{code}/make-inactive
pub async fn make_inactive(State(state): State<AppState>, Path(code): Path<String>) -> FlagResponse {
    Ok(ApiResponse::success(object_type_service::make_inactive(&state.db, &code).await?))
}

/// POST /api/v1/object-types/{code}/add-programmable
pub async fn add_programmable(
    State(state): State<AppState>,
    Path(code): Path<String>,
) -> FlagResponse {
    Ok(ApiResponse::success(
        object_type_service::add_programmable_type(&state.db, &code).await?,
    ))
}

/// POST /api/v1/object-types/{code}/make-manual
pub async fn make_manual(State(state): State<AppState>, Path(code): Path<String>) -> FlagResponse {
    Ok(ApiResponse::success(object_type_service::make_manual(&state.db, &code).await?))
}
