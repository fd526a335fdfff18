//! Code users and the trust toggle.

use serde::Deserialize;
use sqlx::postgres::PgExecutor;
use sqlx::{PgConnection, PgPool};

use crate::errors::AppError;
use crate::models::code_user::CodeUser;
use crate::models::notification::Notified;
use crate::models::pagination::{PagedResult, Pagination};

/// Filters for listing code users.
#[derive(Debug, Clone, Deserialize, Default)]
pub struct CodeUserFilters {
    pub trusted: Option<bool>,
}

/// Find a user by external id.
pub async fn find_by_id<'e>(
    executor: impl PgExecutor<'e>,
    id: &str,
) -> Result<Option<CodeUser>, AppError> {
    let user = sqlx::query_as::<_, CodeUser>(
        "SELECT id, trusted, created_at, updated_at FROM code_users WHERE id = $1",
    )
    .bind(id)
    .fetch_optional(executor)
    .await?;
    Ok(user)
}

/// Find a user by external id, failing with `NotFound` when absent.
pub async fn get<'e>(executor: impl PgExecutor<'e>, id: &str) -> Result<CodeUser, AppError> {
    find_by_id(executor, id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("User '{id}' not found")))
}

/// List users.
pub async fn list(
    pool: &PgPool,
    filters: &CodeUserFilters,
    pagination: &Pagination,
) -> Result<PagedResult<CodeUser>, AppError> {
    let total = sqlx::query_scalar::<_, i64>(
        "SELECT COUNT(*) FROM code_users WHERE ($1::BOOLEAN IS NULL OR trusted = $1)",
    )
    .bind(filters.trusted)
    .fetch_one(pool)
    .await?;

    let items = sqlx::query_as::<_, CodeUser>(
        "SELECT id, trusted, created_at, updated_at FROM code_users \
         WHERE ($1::BOOLEAN IS NULL OR trusted = $1) \
         ORDER BY id LIMIT $2 OFFSET $3",
    )
    .bind(filters.trusted)
    .bind(pagination.limit())
    .bind(pagination.offset())
    .fetch_all(pool)
    .await?;

    Ok(PagedResult::new(items, total, pagination))
}

/// Return the user, creating an untrusted one if it does not exist yet.
pub async fn ensure_exists(conn: &mut PgConnection, id: &str) -> Result<CodeUser, AppError> {
    let id = id.trim();
    if id.is_empty() {
        return Err(AppError::Validation("User ID is required".to_string()));
    }

    let created = sqlx::query_as::<_, CodeUser>(
        "INSERT INTO code_users (id, trusted) VALUES ($1, FALSE) \
         ON CONFLICT (id) DO NOTHING \
         RETURNING id, trusted, created_at, updated_at",
    )
    .bind(id)
    .fetch_optional(&mut *conn)
    .await?;

    match created {
        Some(user) => {
            tracing::info!(user_id = %user.id, "Created code user");
            Ok(user)
        }
        None => get(&mut *conn, id).await,
    }
}

async fn update_trust(pool: &PgPool, id: &str, trusted: bool) -> Result<CodeUser, AppError> {
    let user = sqlx::query_as::<_, CodeUser>(
        "UPDATE code_users SET trusted = $2, updated_at = NOW() WHERE id = $1 \
         RETURNING id, trusted, created_at, updated_at",
    )
    .bind(id)
    .bind(trusted)
    .fetch_optional(pool)
    .await?
    .ok_or_else(|| AppError::NotFound(format!("User '{id}' not found")))?;

    tracing::info!(user_id = %user.id, trusted, "Updated user trust");
    Ok(user)
}

async fn toggle_trust(pool: &PgPool, id: &str, trusted: bool) -> Result<Notified<CodeUser>, AppError> {
    let user = update_trust(pool, id, trusted).await?;
    let verb = if trusted { "trusted" } else { "untrusted" };
    let message = format!("Successfully set user {} to {verb}.", user.id);
    Ok(Notified::success(user, message))
}

/// Mark a user trusted.
pub async fn make_trusted(pool: &PgPool, id: &str) -> Result<Notified<CodeUser>, AppError> {
    toggle_trust(pool, id, true).await
}

/// Mark a user untrusted.
pub async fn make_untrusted(pool: &PgPool, id: &str) -> Result<Notified<CodeUser>, AppError> {
    toggle_trust(pool, id, false).await
}

/// Set the trusted flag explicitly. Returns `"OK"` on success.
pub async fn set_trusted_user(pool: &PgPool, id: &str, trusted: bool) -> Result<String, AppError> {
    if id.trim().is_empty() {
        return Err(AppError::Validation("User ID is required".to_string()));
    }
    update_trust(pool, id.trim(), trusted).await?;
    Ok("OK".to_string())
}
