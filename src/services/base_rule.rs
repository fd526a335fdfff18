//! Base rule store: CRUD, uniqueness of (object type, rule type, value), and
//! all-or-nothing bulk upload.

use std::collections::HashSet;

use serde::Deserialize;
use serde_json::Value;
use sqlx::postgres::PgExecutor;
use sqlx::{PgConnection, PgPool};
use uuid::Uuid;

use crate::errors::AppError;
use crate::models::base_rule::{rule_key, BaseRule, CreateBaseRule, UpdateBaseRule};
use crate::models::lenient::scalar_to_string;
use crate::models::pagination::{PagedResult, Pagination};
use crate::services::{object_type, validator};

const COLUMNS: &str = "id, object_type_code, rule_type_code, value, severity_rating, \
                       description, created_at, updated_at";

/// Filters for listing base rules.
#[derive(Debug, Clone, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct BaseRuleFilters {
    pub object_type: Option<String>,
    pub rule_type: Option<String>,
    pub search: Option<String>,
}

/// A fully specified rule ready for insertion.
#[derive(Debug, Clone, PartialEq)]
pub struct NewBaseRule {
    pub object_type: String,
    pub rule_type: String,
    pub value: String,
    pub severity_rating: i32,
    pub description: Option<String>,
}

/// One normalized row of a bulk upload.
#[derive(Debug, Clone, PartialEq)]
pub struct BulkRuleRow {
    /// 1-based position in the uploaded payload.
    pub row: usize,
    pub object_type: String,
    pub rule_type: String,
    pub value: String,
    pub description: Option<String>,
    pub severity_rating: Option<i32>,
}

impl BulkRuleRow {
    pub fn key(&self) -> String {
        rule_key(&self.object_type, &self.rule_type, &self.value)
    }
}

fn non_blank(value: Option<&str>) -> Option<String> {
    value
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(str::to_string)
}

/// Merge one key field of an update: absent keeps the stored value, blank is rejected.
pub fn merge_key_field(incoming: Option<&str>, stored: &str, name: &str) -> Result<String, AppError> {
    match incoming {
        None => Ok(stored.to_string()),
        Some(v) => non_blank(Some(v))
            .ok_or_else(|| AppError::Validation(format!("{name} must not be blank."))),
    }
}

/// Find a base rule by ID.
pub async fn find_by_id<'e>(
    executor: impl PgExecutor<'e>,
    id: Uuid,
) -> Result<Option<BaseRule>, AppError> {
    let rule = sqlx::query_as::<_, BaseRule>(&format!(
        "SELECT {COLUMNS} FROM base_rules WHERE id = $1"
    ))
    .bind(id)
    .fetch_optional(executor)
    .await?;
    Ok(rule)
}

/// Find a base rule by ID, failing with `NotFound` when absent.
pub async fn get<'e>(executor: impl PgExecutor<'e>, id: Uuid) -> Result<BaseRule, AppError> {
    find_by_id(executor, id)
        .await?
        .ok_or_else(|| AppError::NotFound("Rule not found.".to_string()))
}

/// Find a base rule by its uniqueness key.
pub async fn find_by_key<'e>(
    executor: impl PgExecutor<'e>,
    object_type: &str,
    rule_type: &str,
    value: &str,
) -> Result<Option<BaseRule>, AppError> {
    let rule = sqlx::query_as::<_, BaseRule>(&format!(
        "SELECT {COLUMNS} FROM base_rules \
         WHERE object_type_code = $1 AND rule_type_code = $2 AND value = $3"
    ))
    .bind(object_type)
    .bind(rule_type)
    .bind(value)
    .fetch_optional(executor)
    .await?;
    Ok(rule)
}

/// List base rules with filters and pagination.
pub async fn list(
    pool: &PgPool,
    filters: &BaseRuleFilters,
    pagination: &Pagination,
) -> Result<PagedResult<BaseRule>, AppError> {
    let where_clause = "WHERE ($1::TEXT IS NULL OR object_type_code = $1) \
                        AND ($2::TEXT IS NULL OR rule_type_code = $2) \
                        AND ($3::TEXT IS NULL OR value ILIKE $3 OR description ILIKE $3)";
    let search = filters.search.as_ref().map(|s| format!("%{s}%"));

    let total = sqlx::query_scalar::<_, i64>(&format!(
        "SELECT COUNT(*) FROM base_rules {where_clause}"
    ))
    .bind(&filters.object_type)
    .bind(&filters.rule_type)
    .bind(&search)
    .fetch_one(pool)
    .await?;

    let items = sqlx::query_as::<_, BaseRule>(&format!(
        "SELECT {COLUMNS} FROM base_rules {where_clause} \
         ORDER BY object_type_code, rule_type_code, value LIMIT $4 OFFSET $5"
    ))
    .bind(&filters.object_type)
    .bind(&filters.rule_type)
    .bind(&search)
    .bind(pagination.limit())
    .bind(pagination.offset())
    .fetch_all(pool)
    .await?;

    Ok(PagedResult::new(items, total, pagination))
}

/// Validate and insert a rule on an open connection or transaction.
///
/// The object type must exist, the value must satisfy its rule type, and the
/// (object type, rule type, value) key must be unused.
pub async fn insert_validated(
    conn: &mut PgConnection,
    rule: &NewBaseRule,
) -> Result<BaseRule, AppError> {
    object_type::get(&mut *conn, &rule.object_type).await?;
    validator::validate_rule_data(&mut *conn, Some(&rule.rule_type), Some(&rule.value)).await?;

    if let Some(duplicate) =
        find_by_key(&mut *conn, &rule.object_type, &rule.rule_type, &rule.value).await?
    {
        return Err(AppError::Conflict(format!(
            "A rule already exists with objectType ({}), ruleType ({}) and value ({}). Existing ID: {}",
            rule.object_type, rule.rule_type, rule.value, duplicate.id
        )));
    }

    let created = sqlx::query_as::<_, BaseRule>(&format!(
        "INSERT INTO base_rules (object_type_code, rule_type_code, value, severity_rating, description) \
         VALUES ($1, $2, $3, $4, $5) RETURNING {COLUMNS}"
    ))
    .bind(&rule.object_type)
    .bind(&rule.rule_type)
    .bind(&rule.value)
    .bind(rule.severity_rating)
    .bind(&rule.description)
    .fetch_one(&mut *conn)
    .await
    .map_err(|e| {
        AppError::from_write(
            e,
            format!(
                "A rule already exists with key {}",
                rule_key(&rule.object_type, &rule.rule_type, &rule.value)
            ),
        )
    })?;

    tracing::debug!(rule_id = %created.id, key = %created.key(), "Base rule inserted");
    Ok(created)
}

/// Create a base rule.
pub async fn create(
    pool: &PgPool,
    input: &CreateBaseRule,
    default_severity: i32,
) -> Result<BaseRule, AppError> {
    let (Some(object_type), Some(rule_type), Some(value)) = (
        non_blank(input.object_type.as_deref()),
        non_blank(input.rule_type.as_deref()),
        non_blank(input.value.as_deref()),
    ) else {
        return Err(AppError::Validation(
            "objectType, ruleType and value are required fields.".to_string(),
        ));
    };

    let new_rule = NewBaseRule {
        object_type,
        rule_type,
        value,
        severity_rating: input.severity_rating.unwrap_or(default_severity),
        description: non_blank(input.description.as_deref()),
    };

    let mut tx = pool.begin().await?;
    let created = insert_validated(&mut tx, &new_rule).await?;
    tx.commit().await?;

    tracing::info!(rule_id = %created.id, key = %created.key(), "Base rule created");
    Ok(created)
}

/// Update a base rule, re-validating the merged state.
pub async fn update(pool: &PgPool, id: Uuid, input: &UpdateBaseRule) -> Result<BaseRule, AppError> {
    let mut tx = pool.begin().await?;
    let existing = get(&mut *tx, id).await?;

    let merged = NewBaseRule {
        object_type: merge_key_field(
            input.object_type.as_deref(),
            &existing.object_type_code,
            "objectType",
        )?,
        rule_type: merge_key_field(input.rule_type.as_deref(), &existing.rule_type_code, "ruleType")?,
        value: merge_key_field(input.value.as_deref(), &existing.value, "value")?,
        severity_rating: input.severity_rating.unwrap_or(existing.severity_rating),
        description: input
            .description
            .as_deref()
            .map(|d| d.trim().to_string())
            .or_else(|| existing.description.clone()),
    };

    if merged.object_type != existing.object_type_code {
        object_type::get(&mut *tx, &merged.object_type).await?;
    }
    validator::validate_rule_data(&mut tx, Some(&merged.rule_type), Some(&merged.value)).await?;

    if input.changes_key() {
        let duplicate = sqlx::query_scalar::<_, Uuid>(
            "SELECT id FROM base_rules \
             WHERE object_type_code = $1 AND rule_type_code = $2 AND value = $3 AND id <> $4",
        )
        .bind(&merged.object_type)
        .bind(&merged.rule_type)
        .bind(&merged.value)
        .bind(id)
        .fetch_optional(&mut *tx)
        .await?;

        if let Some(other) = duplicate {
            return Err(AppError::Conflict(format!(
                "An update would cause a conflict with existing rule {other} ({}).",
                rule_key(&merged.object_type, &merged.rule_type, &merged.value)
            )));
        }
    }

    let updated = sqlx::query_as::<_, BaseRule>(&format!(
        "UPDATE base_rules SET \
            object_type_code = $2, rule_type_code = $3, value = $4, \
            severity_rating = $5, description = $6, updated_at = NOW() \
         WHERE id = $1 RETURNING {COLUMNS}"
    ))
    .bind(id)
    .bind(&merged.object_type)
    .bind(&merged.rule_type)
    .bind(&merged.value)
    .bind(merged.severity_rating)
    .bind(&merged.description)
    .fetch_one(&mut *tx)
    .await
    .map_err(|e| {
        AppError::from_write(
            e,
            format!(
                "An update would cause a conflict with key {}",
                rule_key(&merged.object_type, &merged.rule_type, &merged.value)
            ),
        )
    })?;

    tx.commit().await?;
    tracing::info!(rule_id = %updated.id, key = %updated.key(), "Base rule updated");
    Ok(updated)
}

/// Delete a base rule. Its user assignments go with it; logged results keep it alive.
pub async fn delete(pool: &PgPool, id: Uuid) -> Result<(), AppError> {
    let result = sqlx::query("DELETE FROM base_rules WHERE id = $1")
        .bind(id)
        .execute(pool)
        .await
        .map_err(|e| {
            AppError::from_write(e, format!("Rule {id} is referenced by automation logs"))
        })?;

    if result.rows_affected() == 0 {
        return Err(AppError::NotFound("Rule not found.".to_string()));
    }
    tracing::info!(rule_id = %id, "Base rule deleted");
    Ok(())
}

/// Parse the JSON string payload of a bulk upload into raw rows.
pub fn parse_upload_payload(payload: Option<&str>) -> Result<Vec<Value>, AppError> {
    let payload = payload
        .filter(|p| !p.trim().is_empty())
        .ok_or_else(|| AppError::Validation("No rules payload found.".to_string()))?;

    let parsed: Value = serde_json::from_str(payload)
        .map_err(|e| AppError::Validation(format!("Invalid JSON payload: {e}")))?;

    match parsed {
        Value::Array(rows) if !rows.is_empty() => Ok(rows),
        _ => Err(AppError::Validation(
            "Payload must be a non-empty array of rules.".to_string(),
        )),
    }
}

fn field<'a>(row: &'a Value, names: &[&str]) -> Option<&'a Value> {
    names.iter().find_map(|name| row.get(*name)).filter(|v| !v.is_null())
}

fn text_field(row: &Value, names: &[&str]) -> Option<String> {
    field(row, names)
        .and_then(scalar_to_string)
        .and_then(|s| non_blank(Some(&s)))
}

/// Trim every row and drop the ones missing object type, rule type or value.
///
/// A present but non-integer severity is rejected rather than dropped.
pub fn normalize_rows(raw: &[Value]) -> Result<Vec<BulkRuleRow>, AppError> {
    let mut rows = Vec::with_capacity(raw.len());

    for (i, row) in raw.iter().enumerate() {
        let object_type = text_field(row, &["objectType", "objectType_code"]);
        let rule_type = text_field(row, &["ruleType", "ruleType_code"]);
        let value = text_field(row, &["value"]);

        let (Some(object_type), Some(rule_type), Some(value)) = (object_type, rule_type, value)
        else {
            continue;
        };

        let severity_rating = match text_field(row, &["severityRating", "severity"]) {
            None => None,
            Some(raw_severity) => Some(raw_severity.parse::<i32>().map_err(|_| {
                AppError::Validation(format!(
                    "Row {}: severity '{raw_severity}' is not an integer.",
                    i + 1
                ))
            })?),
        };

        rows.push(BulkRuleRow {
            row: i + 1,
            object_type,
            rule_type,
            value,
            description: text_field(row, &["description"]),
            severity_rating,
        });
    }

    Ok(rows)
}

/// Return the first key that appears more than once in the batch.
pub fn find_batch_duplicate(rows: &[BulkRuleRow]) -> Option<String> {
    let mut seen = HashSet::with_capacity(rows.len());
    rows.iter()
        .map(BulkRuleRow::key)
        .find(|key| !seen.insert(key.clone()))
}

fn prefix_row(err: AppError, row: usize) -> AppError {
    match err {
        AppError::Validation(msg) => AppError::Validation(format!("Row {row}: {msg}")),
        AppError::NotFound(msg) => AppError::NotFound(format!("Row {row}: {msg}")),
        AppError::Conflict(msg) => AppError::Conflict(format!("Row {row}: {msg}")),
        other => other,
    }
}

/// Insert a batch of raw rows atomically. Either every row is stored or none is.
pub async fn upload_rows(
    pool: &PgPool,
    raw: &[Value],
    default_severity: i32,
) -> Result<String, AppError> {
    let rows = normalize_rows(raw)?;
    if rows.is_empty() {
        return Err(AppError::Validation(
            "All uploaded rows were empty or invalid.".to_string(),
        ));
    }

    if let Some(key) = find_batch_duplicate(&rows) {
        return Err(AppError::Conflict(format!(
            "Duplicate detected within uploaded file: ({key})"
        )));
    }

    let mut tx = pool.begin().await?;

    let mut existing = Vec::new();
    for row in &rows {
        if let Some(rule) =
            find_by_key(&mut *tx, &row.object_type, &row.rule_type, &row.value).await?
        {
            existing.push(rule.key());
        }
    }
    if !existing.is_empty() {
        return Err(AppError::Conflict(format!(
            "The following rules already exist in the system: {}",
            existing.join(", ")
        )));
    }

    for row in &rows {
        let new_rule = NewBaseRule {
            object_type: row.object_type.clone(),
            rule_type: row.rule_type.clone(),
            value: row.value.clone(),
            severity_rating: row.severity_rating.unwrap_or(default_severity),
            description: row.description.clone(),
        };
        insert_validated(&mut tx, &new_rule)
            .await
            .map_err(|e| prefix_row(e, row.row))?;
    }

    tx.commit().await?;

    tracing::info!(count = rows.len(), "Bulk uploaded base rules");
    Ok(format!("Successfully uploaded {} Base Rules.", rows.len()))
}

/// Bulk upload from the JSON string payload of the upload action.
pub async fn bulk_upload(
    pool: &PgPool,
    payload: Option<&str>,
    default_severity: i32,
) -> Result<String, AppError> {
    let raw = parse_upload_payload(payload)?;
    upload_rows(pool, &raw, default_severity).await
}
