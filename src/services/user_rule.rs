//! User rule assignment: applying base rules to users inside effective-date
//! windows, pruning elapsed assignments, and the flattened rule views.

use std::collections::HashSet;

use chrono::NaiveDate;
use serde::Serialize;
use sqlx::postgres::PgExecutor;
use sqlx::PgPool;
use uuid::Uuid;

use crate::errors::AppError;
use crate::models::user_rule::{
    open_end_date, AssignedRule, CreateUserRule, UpdateUserRule, UserRule,
};
use crate::services::{base_rule, code_user};

const COLUMNS: &str = "id, user_id, base_rule_id, effective_date, end_date, created_at";

const ASSIGNED_RULE_SELECT: &str = r#"
    SELECT ur.id AS user_rule_id,
           ur.user_id,
           cu.trusted,
           br.id AS base_rule_id,
           br.object_type_code AS object_type,
           ot.active AS object_type_active,
           br.rule_type_code AS rule_type,
           rt.description AS rule_type_description,
           rt.value_type,
           br.value,
           br.severity_rating,
           br.description,
           ur.effective_date,
           ur.end_date
    FROM user_rules ur
    JOIN code_users cu ON cu.id = ur.user_id
    JOIN base_rules br ON br.id = ur.base_rule_id
    JOIN rule_types rt ON rt.code = br.rule_type_code
    JOIN object_types ot ON ot.code = br.object_type_code
    WHERE ur.user_id = $1
"#;

/// Outcome of applying all base rules to a user.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ApplyRulesResult {
    pub user_id: String,
    pub added: usize,
    pub message: String,
}

/// Outcome of pruning a user's elapsed assignments.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OverdueRulesResult {
    pub user_id: String,
    pub removed: u64,
    pub message: String,
}

/// Base rule IDs from `all` that are not in `assigned`, in the order of `all`.
pub fn missing_rule_ids(all: &[Uuid], assigned: &[Uuid]) -> Vec<Uuid> {
    let assigned: HashSet<&Uuid> = assigned.iter().collect();
    all.iter()
        .filter(|id| !assigned.contains(id))
        .copied()
        .collect()
}

/// Resolve an assignment window, defaulting to `[today, 9999-12-31]`.
pub fn resolve_window(
    effective: Option<NaiveDate>,
    end: Option<NaiveDate>,
    today: NaiveDate,
) -> Result<(NaiveDate, NaiveDate), AppError> {
    let effective = effective.unwrap_or(today);
    let end = end.unwrap_or_else(open_end_date);
    if effective > end {
        return Err(AppError::Validation(format!(
            "effectiveDate ({effective}) must not be after endDate ({end})."
        )));
    }
    Ok((effective, end))
}

/// Assign every base rule the user does not have yet, starting today.
///
/// Creates the user (untrusted) when unknown. All inserts share one
/// transaction, so a failure leaves the user's assignments unchanged.
pub async fn apply_all_rules(
    pool: &PgPool,
    user_id: &str,
    today: NaiveDate,
) -> Result<ApplyRulesResult, AppError> {
    let mut tx = pool.begin().await?;
    let user = code_user::ensure_exists(&mut tx, user_id).await?;

    let all: Vec<Uuid> = sqlx::query_scalar("SELECT id FROM base_rules ORDER BY created_at, id")
        .fetch_all(&mut *tx)
        .await?;
    let assigned: Vec<Uuid> =
        sqlx::query_scalar("SELECT base_rule_id FROM user_rules WHERE user_id = $1")
            .bind(&user.id)
            .fetch_all(&mut *tx)
            .await?;

    let missing = missing_rule_ids(&all, &assigned);
    if missing.is_empty() {
        tx.commit().await?;
        tracing::debug!(user_id = %user.id, "No new rules to apply");
        return Ok(ApplyRulesResult {
            message: format!("No new rules to apply for user {}.", user.id),
            user_id: user.id,
            added: 0,
        });
    }

    let inserted = sqlx::query(
        "INSERT INTO user_rules (user_id, base_rule_id, effective_date, end_date) \
         SELECT $1, rule_id, $3, $4 FROM UNNEST($2::UUID[]) AS t(rule_id)",
    )
    .bind(&user.id)
    .bind(&missing)
    .bind(today)
    .bind(open_end_date())
    .execute(&mut *tx)
    .await
    .map_err(|e| AppError::from_write(e, "Rules changed while applying them; retry"))?;

    tx.commit().await?;

    let added = inserted.rows_affected() as usize;
    tracing::info!(user_id = %user.id, added, "Applied base rules to user");
    Ok(ApplyRulesResult {
        message: format!("Applied {added} new rules to user {}.", user.id),
        user_id: user.id,
        added,
    })
}

/// Initialise a (possibly new) user's rules. Same semantics as [`apply_all_rules`].
pub async fn init_new_user_rules(
    pool: &PgPool,
    user_id: &str,
    today: NaiveDate,
) -> Result<ApplyRulesResult, AppError> {
    tracing::info!(user_id, "Initialising user rules");
    apply_all_rules(pool, user_id, today).await
}

/// Delete the user's assignments whose window no longer contains today.
pub async fn check_for_overdue_rules(
    pool: &PgPool,
    user_id: &str,
    today: NaiveDate,
) -> Result<OverdueRulesResult, AppError> {
    let user = code_user::get(pool, user_id).await?;

    let result = sqlx::query(
        "DELETE FROM user_rules \
         WHERE user_id = $1 AND ($2 < effective_date OR $2 > end_date)",
    )
    .bind(&user.id)
    .bind(today)
    .execute(pool)
    .await?;

    let removed = result.rows_affected();
    tracing::info!(user_id = %user.id, removed, "Removed overdue user rules");
    Ok(OverdueRulesResult {
        message: format!("Removed {removed} overdue rules for user {}.", user.id),
        user_id: user.id,
        removed,
    })
}

/// Rules currently in force for a user: inside today's window and on active object types.
pub async fn get_applicable_rules(
    pool: &PgPool,
    user_id: &str,
    today: NaiveDate,
) -> Result<Vec<AssignedRule>, AppError> {
    code_user::get(pool, user_id).await?;
    let rules = sqlx::query_as::<_, AssignedRule>(&format!(
        "{ASSIGNED_RULE_SELECT} \
         AND ot.active \
         AND $2 BETWEEN ur.effective_date AND ur.end_date \
         ORDER BY br.object_type_code, br.rule_type_code, br.value"
    ))
    .bind(user_id)
    .bind(today)
    .fetch_all(pool)
    .await?;
    Ok(rules)
}

/// Every rule assigned to a user, regardless of window or object type state.
pub async fn get_all_rules(pool: &PgPool, user_id: &str) -> Result<Vec<AssignedRule>, AppError> {
    code_user::get(pool, user_id).await?;
    let rules = sqlx::query_as::<_, AssignedRule>(&format!(
        "{ASSIGNED_RULE_SELECT} ORDER BY br.object_type_code, br.rule_type_code, br.value"
    ))
    .bind(user_id)
    .fetch_all(pool)
    .await?;
    Ok(rules)
}

/// Find an assignment by ID.
pub async fn find_by_id<'e>(
    executor: impl PgExecutor<'e>,
    id: Uuid,
) -> Result<Option<UserRule>, AppError> {
    let rule = sqlx::query_as::<_, UserRule>(&format!(
        "SELECT {COLUMNS} FROM user_rules WHERE id = $1"
    ))
    .bind(id)
    .fetch_optional(executor)
    .await?;
    Ok(rule)
}

/// Find an assignment by ID, failing with `NotFound` when absent.
pub async fn get<'e>(executor: impl PgExecutor<'e>, id: Uuid) -> Result<UserRule, AppError> {
    find_by_id(executor, id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("UserRule {id} not found")))
}

/// List a user's assignments.
pub async fn list_for_user(pool: &PgPool, user_id: &str) -> Result<Vec<UserRule>, AppError> {
    code_user::get(pool, user_id).await?;
    let rules = sqlx::query_as::<_, UserRule>(&format!(
        "SELECT {COLUMNS} FROM user_rules WHERE user_id = $1 ORDER BY effective_date, created_at"
    ))
    .bind(user_id)
    .fetch_all(pool)
    .await?;
    Ok(rules)
}

/// Assign a single base rule to a user.
pub async fn create(
    pool: &PgPool,
    user_id: &str,
    input: &CreateUserRule,
    today: NaiveDate,
) -> Result<UserRule, AppError> {
    let (effective, end) = resolve_window(input.effective_date, input.end_date, today)?;

    let mut tx = pool.begin().await?;
    let user = code_user::ensure_exists(&mut tx, user_id).await?;
    base_rule::get(&mut *tx, input.base_rule_id).await?;

    let created = sqlx::query_as::<_, UserRule>(&format!(
        "INSERT INTO user_rules (user_id, base_rule_id, effective_date, end_date) \
         VALUES ($1, $2, $3, $4) RETURNING {COLUMNS}"
    ))
    .bind(&user.id)
    .bind(input.base_rule_id)
    .bind(effective)
    .bind(end)
    .fetch_one(&mut *tx)
    .await
    .map_err(|e| {
        AppError::from_write(
            e,
            format!(
                "Rule {} is already assigned to user {}",
                input.base_rule_id, user.id
            ),
        )
    })?;

    tx.commit().await?;
    tracing::info!(user_rule_id = %created.id, user_id = %created.user_id, "User rule created");
    Ok(created)
}

/// Change an assignment's window.
pub async fn update(pool: &PgPool, id: Uuid, input: &UpdateUserRule) -> Result<UserRule, AppError> {
    let mut tx = pool.begin().await?;
    let existing = get(&mut *tx, id).await?;

    let effective = input.effective_date.unwrap_or(existing.effective_date);
    let end = input.end_date.unwrap_or(existing.end_date);
    let (effective, end) = resolve_window(Some(effective), Some(end), effective)?;

    let updated = sqlx::query_as::<_, UserRule>(&format!(
        "UPDATE user_rules SET effective_date = $2, end_date = $3 WHERE id = $1 RETURNING {COLUMNS}"
    ))
    .bind(id)
    .bind(effective)
    .bind(end)
    .fetch_one(&mut *tx)
    .await?;

    tx.commit().await?;
    tracing::info!(user_rule_id = %updated.id, "User rule updated");
    Ok(updated)
}

/// Remove an assignment.
pub async fn delete(pool: &PgPool, id: Uuid) -> Result<(), AppError> {
    let result = sqlx::query("DELETE FROM user_rules WHERE id = $1")
        .bind(id)
        .execute(pool)
        .await?;
    if result.rows_affected() == 0 {
        return Err(AppError::NotFound(format!("UserRule {id} not found")));
    }
    tracing::info!(user_rule_id = %id, "User rule deleted");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ids(n: u128) -> Vec<Uuid> {
        (1..=n).map(Uuid::from_u128).collect()
    }

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn missing_rules_are_set_difference() {
        let all = ids(5);
        let assigned = vec![all[1], all[3]];
        assert_eq!(missing_rule_ids(&all, &assigned), vec![all[0], all[2], all[4]]);
    }

    #[test]
    fn applying_twice_adds_nothing_the_second_time() {
        let all = ids(3);
        let first = missing_rule_ids(&all, &[]);
        assert_eq!(first.len(), 3);
        assert!(missing_rule_ids(&all, &first).is_empty());
    }

    #[test]
    fn assignments_to_deleted_rules_are_ignored() {
        let all = ids(2);
        let assigned = vec![Uuid::from_u128(99)];
        assert_eq!(missing_rule_ids(&all, &assigned), all);
    }

    #[test]
    fn window_defaults_to_open_ended_from_today() {
        let today = date(2024, 3, 1);
        let (effective, end) = resolve_window(None, None, today).unwrap();
        assert_eq!(effective, today);
        assert_eq!(end, date(9999, 12, 31));
    }

    #[test]
    fn inverted_window_is_rejected() {
        let err = resolve_window(Some(date(2024, 5, 1)), Some(date(2024, 4, 1)), date(2024, 1, 1))
            .unwrap_err();
        assert!(matches!(err, AppError::Validation(_)));
    }

    #[test]
    fn single_day_window_is_valid() {
        let day = date(2024, 5, 1);
        assert_eq!(resolve_window(Some(day), Some(day), day).unwrap(), (day, day));
    }
}
