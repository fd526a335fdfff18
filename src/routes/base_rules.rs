//! Base rule routes: CRUD, JSON bulk upload, and CSV/XLSX sheet import.

use axum::{
    extract::{Multipart, Path, Query, State},
    Json,
};
use serde::Deserialize;
use serde_json::Value;
use uuid::Uuid;

use crate::errors::{ApiResponse, AppError};
use crate::models::base_rule::{BaseRule, CreateBaseRule, UpdateBaseRule};
use crate::models::pagination::{PagedResult, Pagination};
use crate::services::base_rule::{self as rule_service, BaseRuleFilters};
use crate::services::rule_import::{self, SheetFormat};
use crate::AppState;

/// Body of the bulk upload action. `rules` holds a JSON-encoded array.
#[derive(Debug, Deserialize)]
pub struct UploadRulesRequest {
    #[serde(default)]
    pub rules: Option<Value>,
}

impl UploadRulesRequest {
    /// The payload as text. An inline array is accepted as well as a string.
    fn payload(&self) -> Option<String> {
        match &self.rules {
            None | Some(Value::Null) => None,
            Some(Value::String(s)) => Some(s.clone()),
            Some(other) => Some(other.to_string()),
        }
    }
}

/// GET /api/v1/base-rules: list with filters and pagination.
pub async fn list(
    State(state): State<AppState>,
    Query(pagination): Query<Pagination>,
    Query(filters): Query<BaseRuleFilters>,
) -> Result<Json<ApiResponse<PagedResult<BaseRule>>>, AppError> {
    let result = rule_service::list(&state.db, &filters, &pagination).await?;
    Ok(ApiResponse::success(result))
}

/// POST /api/v1/base-rules
pub async fn create(
    State(state): State<AppState>,
    Json(body): Json<CreateBaseRule>,
) -> Result<Json<ApiResponse<BaseRule>>, AppError> {
    let rule = rule_service::create(&state.db, &body, state.config.default_severity).await?;
    Ok(ApiResponse::success(rule))
}

/// GET /api/v1/base-rules/{id}
pub async fn get_by_id(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<ApiResponse<BaseRule>>, AppError> {
    let rule = rule_service::get(&state.db, id).await?;
    Ok(ApiResponse::success(rule))
}

/// PUT /api/v1/base-rules/{id}
pub async fn update(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(body): Json<UpdateBaseRule>,
) -> Result<Json<ApiResponse<BaseRule>>, AppError> {
    let rule = rule_service::update(&state.db, id, &body).await?;
    Ok(ApiResponse::success(rule))
}

/// DELETE /api/v1/base-rules/{id}
pub async fn delete(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<ApiResponse<Uuid>>, AppError> {
    rule_service::delete(&state.db, id).await?;
    Ok(ApiResponse::success(id))
}

/// POST /api/v1/base-rules/upload: all-or-nothing bulk upload.
pub async fn upload(
    State(state): State<AppState>,
    Json(body): Json<UploadRulesRequest>,
) -> Result<Json<ApiResponse<String>>, AppError> {
    let payload = body.payload();
    let message =
        rule_service::bulk_upload(&state.db, payload.as_deref(), state.config.default_severity)
            .await?;
    Ok(ApiResponse::success(message))
}

/// POST /api/v1/base-rules/import: bulk upload from a CSV/XLSX sheet (multipart).
pub async fn import_sheet(
    State(state): State<AppState>,
    mut multipart: Multipart,
) -> Result<Json<ApiResponse<String>>, AppError> {
    let mut file_data: Option<Vec<u8>> = None;
    let mut filename: Option<String> = None;

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| AppError::Validation(format!("Multipart error: {e}")))?
    {
        if field.name() == Some("file") {
            filename = field.file_name().map(|s| s.to_string());
            file_data = Some(
                field
                    .bytes()
                    .await
                    .map_err(|e| AppError::Validation(format!("Failed to read file: {e}")))?
                    .to_vec(),
            );
        }
    }

    let data = file_data.ok_or_else(|| {
        AppError::Validation("Missing 'file' field in multipart request".to_string())
    })?;

    let format = filename
        .as_deref()
        .and_then(SheetFormat::from_filename)
        .unwrap_or(SheetFormat::Csv);

    let message =
        rule_import::import_sheet(&state.db, &data, format, state.config.default_severity).await?;
    Ok(ApiResponse::success(message))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn request(body: Value) -> UploadRulesRequest {
        serde_json::from_value(body).unwrap()
    }

    #[test]
    fn payload_string_passes_through() {
        let req = request(json!({ "rules": "[{\"objectType\":\"PROG\"}]" }));
        assert_eq!(req.payload().as_deref(), Some("[{\"objectType\":\"PROG\"}]"));
    }

    #[test]
    fn inline_array_is_reencoded() {
        let req = request(json!({ "rules": [{ "objectType": "PROG" }] }));
        assert_eq!(req.payload().as_deref(), Some("[{\"objectType\":\"PROG\"}]"));
    }

    #[test]
    fn missing_or_null_payload() {
        assert!(request(json!({})).payload().is_none());
        assert!(request(json!({ "rules": null })).payload().is_none());
    }
}
