//! Object type store: CRUD plus the active/manual flag actions.

use serde::Deserialize;
use sqlx::postgres::PgExecutor;
use sqlx::PgPool;
use validator::Validate;

use crate::errors::AppError;
use crate::models::notification::Notified;
use crate::models::object_type::{CreateObjectType, ObjectType, UpdateObjectType};
use crate::models::pagination::{PagedResult, Pagination};

const COLUMNS: &str = "code, description, active, manual, created_at, updated_at";

/// Filters for listing object types.
#[derive(Debug, Clone, Deserialize, Default)]
pub struct ObjectTypeFilters {
    pub active: Option<bool>,
    pub manual: Option<bool>,
}

/// Create an admin-entered object type.
pub async fn create(pool: &PgPool, input: &CreateObjectType) -> Result<ObjectType, AppError> {
    input.validate()?;
    let code = input.code.trim();

    let object_type = sqlx::query_as::<_, ObjectType>(&format!(
        "INSERT INTO object_types (code, description, active, manual) \
         VALUES ($1, $2, COALESCE($3, TRUE), COALESCE($4, TRUE)) \
         RETURNING {COLUMNS}"
    ))
    .bind(code)
    .bind(&input.description)
    .bind(input.active)
    .bind(input.manual)
    .fetch_one(pool)
    .await
    .map_err(|e| AppError::from_write(e, format!("ObjectType '{code}' already exists")))?;

    tracing::info!(code = %object_type.code, "Object type created");
    Ok(object_type)
}

/// Find an object type by code.
pub async fn find_by_code<'e>(
    executor: impl PgExecutor<'e>,
    code: &str,
) -> Result<Option<ObjectType>, AppError> {
    let object_type = sqlx::query_as::<_, ObjectType>(&format!(
        "SELECT {COLUMNS} FROM object_types WHERE code = $1"
    ))
    .bind(code)
    .fetch_optional(executor)
    .await?;
    Ok(object_type)
}

/// Find an object type by code, failing with `NotFound` when absent.
pub async fn get<'e>(executor: impl PgExecutor<'e>, code: &str) -> Result<ObjectType, AppError> {
    find_by_code(executor, code)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("ObjectType '{code}' not found")))
}

/// List object types with optional flag filters.
pub async fn list(
    pool: &PgPool,
    filters: &ObjectTypeFilters,
    pagination: &Pagination,
) -> Result<PagedResult<ObjectType>, AppError> {
    let where_clause = "WHERE ($1::BOOLEAN IS NULL OR active = $1) \
                        AND ($2::BOOLEAN IS NULL OR manual = $2)";

    let total = sqlx::query_scalar::<_, i64>(&format!(
        "SELECT COUNT(*) FROM object_types {where_clause}"
    ))
    .bind(filters.active)
    .bind(filters.manual)
    .fetch_one(pool)
    .await?;

    let items = sqlx::query_as::<_, ObjectType>(&format!(
        "SELECT {COLUMNS} FROM object_types {where_clause} ORDER BY code LIMIT $3 OFFSET $4"
    ))
    .bind(filters.active)
    .bind(filters.manual)
    .bind(pagination.limit())
    .bind(pagination.offset())
    .fetch_all(pool)
    .await?;

    Ok(PagedResult::new(items, total, pagination))
}

/// Update an object type's description.
pub async fn update(
    pool: &PgPool,
    code: &str,
    input: &UpdateObjectType,
) -> Result<ObjectType, AppError> {
    input.validate()?;
    sqlx::query_as::<_, ObjectType>(&format!(
        "UPDATE object_types SET description = COALESCE($2, description), updated_at = NOW() \
         WHERE code = $1 RETURNING {COLUMNS}"
    ))
    .bind(code)
    .bind(&input.description)
    .fetch_optional(pool)
    .await?
    .ok_or_else(|| AppError::NotFound(format!("ObjectType '{code}' not found")))
}

/// Delete an object type that no base rule references.
pub async fn delete(pool: &PgPool, code: &str) -> Result<(), AppError> {
    let result = sqlx::query("DELETE FROM object_types WHERE code = $1")
        .bind(code)
        .execute(pool)
        .await
        .map_err(|e| {
            AppError::from_write(e, format!("ObjectType '{code}' is still used by base rules"))
        })?;

    if result.rows_affected() == 0 {
        return Err(AppError::NotFound(format!("ObjectType '{code}' not found")));
    }
    tracing::info!(code, "Object type deleted");
    Ok(())
}

/// Set both flags in one statement; `None` leaves a flag untouched.
async fn set_flags(
    pool: &PgPool,
    code: &str,
    active: Option<bool>,
    manual: Option<bool>,
) -> Result<ObjectType, AppError> {
    let object_type = sqlx::query_as::<_, ObjectType>(&format!(
        "UPDATE object_types SET \
            active = COALESCE($2, active), \
            manual = COALESCE($3, manual), \
            updated_at = NOW() \
         WHERE code = $1 RETURNING {COLUMNS}"
    ))
    .bind(code)
    .bind(active)
    .bind(manual)
    .fetch_optional(pool)
    .await?
    .ok_or_else(|| AppError::NotFound(format!("ObjectType '{code}' not found")))?;

    tracing::info!(
        code = %object_type.code,
        active = object_type.active,
        manual = object_type.manual,
        "Object type flags updated"
    );
    Ok(object_type)
}

/// Mark an object type active so its rules become applicable.
pub async fn make_active(pool: &PgPool, code: &str) -> Result<Notified<ObjectType>, AppError> {
    let object_type = set_flags(pool, code, Some(true), None).await?;
    let message = format!("Successfully set ObjectType {} to active.", object_type.code);
    Ok(Notified::success(object_type, message))
}

/// Mark an object type inactive, hiding its rules from applicable-rule views.
pub async fn make_inactive(pool: &PgPool, code: &str) -> Result<Notified<ObjectType>, AppError> {
    let object_type = set_flags(pool, code, Some(false), None).await?;
    let message = format!("Successfully set ObjectType {} to inactive.", object_type.code);
    Ok(Notified::success(object_type, message))
}

/// Mark an object type as programmable (system-detected).
pub async fn add_programmable_type(
    pool: &PgPool,
    code: &str,
) -> Result<Notified<ObjectType>, AppError> {
    let object_type = set_flags(pool, code, None, Some(false)).await?;
    let message = format!("ObjectType {} is now programmable.", object_type.code);
    Ok(Notified::success(object_type, message))
}

/// Mark an object type as manual. Manual types start out inactive.
pub async fn make_manual(pool: &PgPool, code: &str) -> Result<Notified<ObjectType>, AppError> {
    let object_type = set_flags(pool, code, Some(false), Some(true)).await?;
    let message = format!(
        "ObjectType {} is now manual and inactive.",
        object_type.code
    );
    Ok(Notified::success(object_type, message))
}

/// Return the object type, registering it as a system-detected type if unknown.
///
/// Used by log ingestion, where automation may report object types no admin
/// has entered yet.
pub async fn find_or_register_detected(
    conn: &mut sqlx::PgConnection,
    code: &str,
) -> Result<ObjectType, AppError> {
    if let Some(existing) = find_by_code(&mut *conn, code).await? {
        return Ok(existing);
    }

    let object_type = sqlx::query_as::<_, ObjectType>(&format!(
        "INSERT INTO object_types (code, active, manual) VALUES ($1, TRUE, FALSE) \
         ON CONFLICT (code) DO UPDATE SET updated_at = object_types.updated_at \
         RETURNING {COLUMNS}"
    ))
    .bind(code)
    .fetch_one(&mut *conn)
    .await?;

    tracing::info!(code, "Registered detected object type");
    Ok(object_type)
}
