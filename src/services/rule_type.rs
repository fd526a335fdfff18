//! Rule type lookups. Rule types are reference data and never written here.

use sqlx::postgres::PgExecutor;

use crate::errors::AppError;
use crate::models::rule_type::RuleType;

/// Find a rule type by code.
pub async fn find_by_code<'e>(
    executor: impl PgExecutor<'e>,
    code: &str,
) -> Result<Option<RuleType>, AppError> {
    let rule_type = sqlx::query_as::<_, RuleType>(
        "SELECT code, description, value_type FROM rule_types WHERE code = $1",
    )
    .bind(code)
    .fetch_optional(executor)
    .await?;
    Ok(rule_type)
}

/// Find a rule type by code, failing with `NotFound` when absent.
pub async fn get<'e>(executor: impl PgExecutor<'e>, code: &str) -> Result<RuleType, AppError> {
    find_by_code(executor, code)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("RuleType '{code}' not found")))
}

/// List all rule types ordered by code.
pub async fn list<'e>(executor: impl PgExecutor<'e>) -> Result<Vec<RuleType>, AppError> {
    let rule_types = sqlx::query_as::<_, RuleType>(
        "SELECT code, description, value_type FROM rule_types ORDER BY code",
    )
    .fetch_all(executor)
    .await?;
    Ok(rule_types)
}
