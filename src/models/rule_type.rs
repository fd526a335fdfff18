//! Rule type reference data.

use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// Declared type of the values rules of a given rule type carry.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, sqlx::Type, PartialEq, Eq)]
#[sqlx(type_name = "value_type", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum ValueType {
    Integer,
    Float,
    Boolean,
    String,
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct RuleType {
    pub code: String,
    pub description: String,
    pub value_type: ValueType,
}
