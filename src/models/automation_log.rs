//! Automation log model: pass/fail outcomes of rule checks on transports.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

use crate::models::lenient;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, sqlx::Type, PartialEq, Eq)]
#[sqlx(type_name = "check_result", rename_all = "UPPERCASE")]
#[serde(rename_all = "UPPERCASE")]
pub enum CheckResult {
    Pass,
    Fail,
}

impl CheckResult {
    /// Parse `pass`/`fail` in any case, ignoring surrounding whitespace.
    pub fn parse(raw: &str) -> Option<Self> {
        match raw.trim().to_lowercase().as_str() {
            "pass" => Some(Self::Pass),
            "fail" => Some(Self::Fail),
            _ => None,
        }
    }
}

impl std::fmt::Display for CheckResult {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Pass => write!(f, "PASS"),
            Self::Fail => write!(f, "FAIL"),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct AutomationLog {
    pub id: Uuid,
    pub user_id: String,
    pub base_rule_id: Uuid,
    pub transport_request: String,
    pub sub_request: Option<String>,
    pub check_date: NaiveDate,
    pub result: CheckResult,
    pub severity: i32,
    pub object_name: String,
    pub created_at: DateTime<Utc>,
}

/// One incoming check result as posted by an automation job.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct NewLogEntry {
    #[serde(default, deserialize_with = "lenient::opt_string")]
    pub user: Option<String>,
    #[serde(default, deserialize_with = "lenient::opt_string")]
    pub transport_request: Option<String>,
    #[serde(default, deserialize_with = "lenient::opt_string")]
    pub sub_request: Option<String>,
    #[serde(default, deserialize_with = "lenient::opt_string")]
    pub check_date: Option<String>,
    #[serde(default, deserialize_with = "lenient::opt_string")]
    pub object_type: Option<String>,
    #[serde(default, deserialize_with = "lenient::opt_string")]
    pub rule_type: Option<String>,
    #[serde(default, deserialize_with = "lenient::opt_string")]
    pub value: Option<String>,
    #[serde(default, deserialize_with = "lenient::opt_string")]
    pub result: Option<String>,
    #[serde(default, deserialize_with = "lenient::opt_int")]
    pub severity: Option<i32>,
    #[serde(default, deserialize_with = "lenient::opt_string")]
    pub object_name: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn check_result_parse_is_case_insensitive() {
        assert_eq!(CheckResult::parse("fail"), Some(CheckResult::Fail));
        assert_eq!(CheckResult::parse(" PASS "), Some(CheckResult::Pass));
        assert_eq!(CheckResult::parse("Pass"), Some(CheckResult::Pass));
        assert_eq!(CheckResult::parse("skipped"), None);
    }

    #[test]
    fn check_result_serializes_uppercase() {
        let json = serde_json::to_string(&CheckResult::Fail).unwrap();
        assert_eq!(json, "\"FAIL\"");
    }

    #[test]
    fn new_log_entry_from_camel_case() {
        let entry: NewLogEntry = serde_json::from_value(serde_json::json!({
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
        .unwrap();
        assert_eq!(entry.transport_request.as_deref(), Some("TR1"));
        assert_eq!(entry.severity, Some(2));
        assert!(entry.sub_request.is_none());
    }
}
