//! Base rule model: object type + rule type + expected value + severity.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

use crate::models::lenient;

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct BaseRule {
    pub id: Uuid,
    #[serde(rename = "objectType")]
    pub object_type_code: String,
    #[serde(rename = "ruleType")]
    pub rule_type_code: String,
    pub value: String,
    pub severity_rating: i32,
    pub description: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl BaseRule {
    /// Uniqueness key rendered as `objectType::ruleType::value`.
    pub fn key(&self) -> String {
        rule_key(&self.object_type_code, &self.rule_type_code, &self.value)
    }
}

/// Render a rule's uniqueness key.
pub fn rule_key(object_type: &str, rule_type: &str, value: &str) -> String {
    format!("{object_type}::{rule_type}::{value}")
}

/// Payload for creating a base rule. Required fields are optional here so
/// that a missing field is reported with a domain message, not a JSON error.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct CreateBaseRule {
    #[serde(alias = "objectType_code", alias = "object_type_code")]
    pub object_type: Option<String>,
    #[serde(alias = "ruleType_code", alias = "rule_type_code")]
    pub rule_type: Option<String>,
    #[serde(default, deserialize_with = "lenient::opt_string")]
    pub value: Option<String>,
    #[serde(default, deserialize_with = "lenient::opt_int")]
    pub severity_rating: Option<i32>,
    pub description: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct UpdateBaseRule {
    #[serde(alias = "objectType_code", alias = "object_type_code")]
    pub object_type: Option<String>,
    #[serde(alias = "ruleType_code", alias = "rule_type_code")]
    pub rule_type: Option<String>,
    #[serde(default, deserialize_with = "lenient::opt_string")]
    pub value: Option<String>,
    #[serde(default, deserialize_with = "lenient::opt_int")]
    pub severity_rating: Option<i32>,
    pub description: Option<String>,
}

impl UpdateBaseRule {
    /// Whether the update touches any field of the uniqueness key.
    pub fn changes_key(&self) -> bool {
        self.object_type.is_some() || self.rule_type.is_some() || self.value.is_some()
    }
}
