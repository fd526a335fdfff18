//! User rule model: a time-bounded assignment of a base rule to a user.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

use crate::models::rule_type::ValueType;

/// End date of an open-ended assignment.
pub fn open_end_date() -> NaiveDate {
    NaiveDate::from_ymd_opt(9999, 12, 31).unwrap_or(NaiveDate::MAX)
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct UserRule {
    pub id: Uuid,
    pub user_id: String,
    pub base_rule_id: Uuid,
    pub effective_date: NaiveDate,
    pub end_date: NaiveDate,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateUserRule {
    #[serde(alias = "baseRule_ID")]
    pub base_rule_id: Uuid,
    pub effective_date: Option<NaiveDate>,
    pub end_date: Option<NaiveDate>,
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct UpdateUserRule {
    pub effective_date: Option<NaiveDate>,
    pub end_date: Option<NaiveDate>,
}

/// Flattened join of an assignment with its base rule, rule type and the
/// user's trust flag.
#[derive(Debug, Clone, Serialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct AssignedRule {
    pub user_rule_id: Uuid,
    pub user_id: String,
    pub trusted: bool,
    pub base_rule_id: Uuid,
    pub object_type: String,
    pub object_type_active: bool,
    pub rule_type: String,
    pub rule_type_description: String,
    pub value_type: ValueType,
    pub value: String,
    pub severity_rating: i32,
    pub description: Option<String>,
    pub effective_date: NaiveDate,
    pub end_date: NaiveDate,
}
