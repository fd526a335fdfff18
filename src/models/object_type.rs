//! Object type model: the kind of development object a rule targets.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use validator::Validate;

/// An object type. `active` gates whether its rules are applicable;
/// `manual` separates admin-entered types from system-detected ones.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct ObjectType {
    pub code: String,
    pub description: Option<String>,
    pub active: bool,
    pub manual: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct CreateObjectType {
    #[validate(length(min = 1, max = 40, message = "code must be 1-40 characters"))]
    pub code: String,
    #[validate(length(max = 255))]
    pub description: Option<String>,
    pub active: Option<bool>,
    pub manual: Option<bool>,
}

#[derive(Debug, Clone, Serialize, Deserialize, Default, Validate)]
#[serde(rename_all = "camelCase")]
pub struct UpdateObjectType {
    #[validate(length(max = 255))]
    pub description: Option<String>,
}
