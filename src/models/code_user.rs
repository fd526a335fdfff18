//! Code user model: an external developer identity with a trust flag.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

#[derive(Debug, Clone, Serialize, Deserialize, FromRow, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct CodeUser {
    pub id: String,
    pub trusted: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Body of the explicit trust update.
#[derive(Debug, Clone, Deserialize)]
pub struct SetTrusted {
    pub trusted: bool,
}
