//! Automation log ingestion.
//!
//! Each entry reports the outcome of checking one object against a base rule
//! during a transport review. Entries referencing a rule that does not exist
//! yet create it on the fly. Batches are processed entry by entry: a failing
//! entry is recorded by index and the rest of the batch carries on.

use chrono::{DateTime, NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use sqlx::postgres::PgExecutor;
use sqlx::{PgConnection, PgPool};
use uuid::Uuid;

use crate::errors::AppError;
use crate::models::automation_log::{AutomationLog, CheckResult, NewLogEntry};
use crate::models::pagination::{PagedResult, Pagination};
use crate::services::base_rule::{self, NewBaseRule};
use crate::services::{code_user, object_type, rule_type};

const COLUMNS: &str = "id, user_id, base_rule_id, transport_request, sub_request, check_date, \
                       result, severity, object_name, created_at";

/// A log entry whose required fields are present and well-formed.
#[derive(Debug, Clone, PartialEq)]
pub struct ValidatedEntry {
    pub user: String,
    pub transport_request: String,
    pub sub_request: Option<String>,
    pub check_date: NaiveDate,
    pub object_type: String,
    pub rule_type: String,
    pub value: String,
    pub result: CheckResult,
    pub severity: Option<i32>,
    pub object_name: String,
}

/// A batch entry that could not be stored.
#[derive(Debug, Clone, Serialize)]
pub struct LogFailure {
    pub index: usize,
    pub message: String,
}

/// Summary of a batch ingestion.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LogBatchResult {
    pub total: usize,
    pub successful: usize,
    pub failed_indices: Vec<usize>,
    pub failures: Vec<LogFailure>,
    pub message: String,
}

/// Filters for listing automation logs.
#[derive(Debug, Clone, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct AutomationLogFilters {
    pub user: Option<String>,
    pub result: Option<CheckResult>,
    pub transport_request: Option<String>,
}

/// Parse a check date given as `YYYY-MM-DD` or as a full timestamp.
pub fn parse_check_date(raw: &str) -> Option<NaiveDate> {
    let raw = raw.trim();
    NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        .ok()
        .or_else(|| DateTime::parse_from_rfc3339(raw).ok().map(|dt| dt.date_naive()))
        .or_else(|| {
            NaiveDateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M:%S")
                .ok()
                .map(|dt| dt.date())
        })
}

fn required<'a>(value: &'a Option<String>, name: &'static str, missing: &mut Vec<&'static str>) -> &'a str {
    match value.as_deref().map(str::trim) {
        Some(v) if !v.is_empty() => v,
        _ => {
            missing.push(name);
            ""
        }
    }
}

/// Check that every required field is present and well-formed.
pub fn validate_entry(entry: &NewLogEntry) -> Result<ValidatedEntry, AppError> {
    let mut missing = Vec::new();
    let user = required(&entry.user, "user", &mut missing);
    let transport_request = required(&entry.transport_request, "transportRequest", &mut missing);
    let check_date = required(&entry.check_date, "checkDate", &mut missing);
    let object_type = required(&entry.object_type, "objectType", &mut missing);
    let rule_type = required(&entry.rule_type, "ruleType", &mut missing);
    let value = required(&entry.value, "value", &mut missing);
    let result = required(&entry.result, "result", &mut missing);
    let object_name = required(&entry.object_name, "objectName", &mut missing);

    if !missing.is_empty() {
        return Err(AppError::Validation(format!(
            "Missing required field(s): {}",
            missing.join(", ")
        )));
    }

    let parsed_result = CheckResult::parse(result)
        .ok_or_else(|| AppError::Validation(format!("Invalid result '{result}'")))?;
    let parsed_date = parse_check_date(check_date)
        .ok_or_else(|| AppError::Validation(format!("Invalid checkDate '{check_date}'")))?;

    Ok(ValidatedEntry {
        user: user.to_string(),
        transport_request: transport_request.to_string(),
        sub_request: entry
            .sub_request
            .as_deref()
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(str::to_string),
        check_date: parsed_date,
        object_type: object_type.to_string(),
        rule_type: rule_type.to_string(),
        value: value.to_string(),
        result: parsed_result,
        severity: entry.severity,
        object_name: object_name.to_string(),
    })
}

/// Human-readable batch summary.
pub fn summarize(total: usize, successful: usize, failed_indices: &[usize]) -> String {
    let mut message = format!("{successful} of {total} logs added successfully.");
    if !failed_indices.is_empty() {
        let indices: Vec<String> = failed_indices.iter().map(|i| i.to_string()).collect();
        message.push_str(&format!(" Failed indices: [{}]", indices.join(", ")));
    }
    message
}

/// Store one validated entry on an open transaction.
async fn record_entry(
    conn: &mut PgConnection,
    entry: &ValidatedEntry,
    default_severity: i32,
) -> Result<AutomationLog, AppError> {
    rule_type::get(&mut *conn, &entry.rule_type).await?;
    let user = code_user::ensure_exists(&mut *conn, &entry.user).await?;
    object_type::find_or_register_detected(&mut *conn, &entry.object_type).await?;

    let severity = entry.severity.unwrap_or(default_severity);
    let rule = match base_rule::find_by_key(
        &mut *conn,
        &entry.object_type,
        &entry.rule_type,
        &entry.value,
    )
    .await?
    {
        Some(rule) => rule,
        None => {
            let created = base_rule::insert_validated(
                &mut *conn,
                &NewBaseRule {
                    object_type: entry.object_type.clone(),
                    rule_type: entry.rule_type.clone(),
                    value: entry.value.clone(),
                    severity_rating: severity,
                    description: None,
                },
            )
            .await?;
            tracing::info!(rule_id = %created.id, key = %created.key(), "Auto-created base rule from log");
            created
        }
    };

    let log = sqlx::query_as::<_, AutomationLog>(&format!(
        "INSERT INTO automation_logs (user_id, base_rule_id, transport_request, sub_request, \
            check_date, result, severity, object_name) \
         VALUES ($1, $2, $3, $4, $5, $6, $7, $8) RETURNING {COLUMNS}"
    ))
    .bind(&user.id)
    .bind(rule.id)
    .bind(&entry.transport_request)
    .bind(&entry.sub_request)
    .bind(entry.check_date)
    .bind(entry.result)
    .bind(severity)
    .bind(&entry.object_name)
    .fetch_one(&mut *conn)
    .await?;

    Ok(log)
}

/// Ingest a single log entry in its own transaction.
pub async fn add_log(
    pool: &PgPool,
    entry: &NewLogEntry,
    default_severity: i32,
) -> Result<AutomationLog, AppError> {
    let validated = validate_entry(entry)?;

    let mut tx = pool.begin().await?;
    let log = record_entry(&mut tx, &validated, default_severity).await?;
    tx.commit().await?;

    tracing::info!(
        log_id = %log.id,
        user_id = %log.user_id,
        transport = %log.transport_request,
        result = %log.result,
        "Automation log added"
    );
    Ok(log)
}

/// Ingest a batch. Each entry is independent; failures are reported by index.
pub async fn add_logs(
    pool: &PgPool,
    logs: &[Value],
    default_severity: i32,
) -> Result<LogBatchResult, AppError> {
    if logs.is_empty() {
        return Err(AppError::Validation("Logs must be a non-empty array".to_string()));
    }

    let mut successful = 0usize;
    let mut failures = Vec::new();

    for (i, raw) in logs.iter().enumerate() {
        let outcome = match serde_json::from_value::<NewLogEntry>(raw.clone()) {
            Ok(entry) => add_log(pool, &entry, default_severity).await.map(|_| ()),
            Err(e) => Err(AppError::Validation(format!("Malformed log entry: {e}"))),
        };

        match outcome {
            Ok(()) => successful += 1,
            Err(e) => {
                tracing::warn!(index = i, error = %e, "Failed to process log entry");
                failures.push(LogFailure {
                    index: i,
                    message: e.to_string(),
                });
            }
        }
    }

    let failed_indices: Vec<usize> = failures.iter().map(|f| f.index).collect();
    let message = summarize(logs.len(), successful, &failed_indices);
    tracing::info!(total = logs.len(), successful, failed = failures.len(), "Automation log batch processed");

    Ok(LogBatchResult {
        total: logs.len(),
        successful,
        failed_indices,
        failures,
        message,
    })
}

/// Find a log by ID.
pub async fn get<'e>(executor: impl PgExecutor<'e>, id: Uuid) -> Result<AutomationLog, AppError> {
    sqlx::query_as::<_, AutomationLog>(&format!(
        "SELECT {COLUMNS} FROM automation_logs WHERE id = $1"
    ))
    .bind(id)
    .fetch_optional(executor)
    .await?
    .ok_or_else(|| AppError::NotFound(format!("AutomationLog {id} not found")))
}

/// List logs, newest first.
pub async fn list(
    pool: &PgPool,
    filters: &AutomationLogFilters,
    pagination: &Pagination,
) -> Result<PagedResult<AutomationLog>, AppError> {
    let where_clause = "WHERE ($1::TEXT IS NULL OR user_id = $1) \
                        AND ($2::check_result IS NULL OR result = $2) \
                        AND ($3::TEXT IS NULL OR transport_request = $3)";

    let total = sqlx::query_scalar::<_, i64>(&format!(
        "SELECT COUNT(*) FROM automation_logs {where_clause}"
    ))
    .bind(&filters.user)
    .bind(filters.result)
    .bind(&filters.transport_request)
    .fetch_one(pool)
    .await?;

    let items = sqlx::query_as::<_, AutomationLog>(&format!(
        "SELECT {COLUMNS} FROM automation_logs {where_clause} \
         ORDER BY created_at DESC LIMIT $4 OFFSET $5"
    ))
    .bind(&filters.user)
    .bind(filters.result)
    .bind(&filters.transport_request)
    .bind(pagination.limit())
    .bind(pagination.offset())
    .fetch_all(pool)
    .await?;

    Ok(PagedResult::new(items, total, pagination))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn sample_entry() -> NewLogEntry {
        serde_json::from_value(json!({
            "user": "U1",
            "transportRequest": "TR1",
            "checkDate": "2024-01-01",
            "objectType": "PROG",
            "ruleType": "COMMAND",
            "value": "DELETE",
            "result": "fail",
            "severity": 2,
            "objectName": "Z_FOO"
        }))
        .unwrap()
    }

    #[test]
    fn valid_entry_is_normalized() {
        let validated = validate_entry(&sample_entry()).unwrap();
        assert_eq!(validated.result, CheckResult::Fail);
        assert_eq!(validated.check_date, NaiveDate::from_ymd_opt(2024, 1, 1).unwrap());
        assert_eq!(validated.severity, Some(2));
        assert!(validated.sub_request.is_none());
    }

    #[test]
    fn missing_fields_are_listed() {
        let mut entry = sample_entry();
        entry.user = None;
        entry.object_name = Some("   ".to_string());
        let err = validate_entry(&entry).unwrap_err();
        assert_eq!(
            err.to_string(),
            "Validation error: Missing required field(s): user, objectName"
        );
    }

    #[test]
    fn result_must_be_pass_or_fail() {
        let mut entry = sample_entry();
        entry.result = Some("PASS ".to_string());
        assert_eq!(validate_entry(&entry).unwrap().result, CheckResult::Pass);

        entry.result = Some("skipped".to_string());
        let err = validate_entry(&entry).unwrap_err();
        assert!(err.to_string().contains("Invalid result 'skipped'"));
    }

    #[test]
    fn severity_is_optional() {
        let mut entry = sample_entry();
        entry.severity = None;
        assert!(validate_entry(&entry).unwrap().severity.is_none());
    }

    #[test]
    fn check_date_formats() {
        let expected = NaiveDate::from_ymd_opt(2024, 6, 30).unwrap();
        assert_eq!(parse_check_date("2024-06-30"), Some(expected));
        assert_eq!(parse_check_date("2024-06-30T23:10:00Z"), Some(expected));
        assert_eq!(parse_check_date("2024-06-30T08:00:00"), Some(expected));
        assert_eq!(parse_check_date("30/06/2024"), None);
    }

    #[test]
    fn invalid_check_date_is_rejected() {
        let mut entry = sample_entry();
        entry.check_date = Some("yesterday".to_string());
        assert!(validate_entry(&entry).is_err());
    }

    #[test]
    fn summary_message() {
        assert_eq!(summarize(2, 2, &[]), "2 of 2 logs added successfully.");
        assert_eq!(
            summarize(3, 1, &[0, 2]),
            "1 of 3 logs added successfully. Failed indices: [0, 2]"
        );
    }
}
