//! Rule value validation.
//!
//! A value is checked first against the value type its rule type declares,
//! then against any constraint specific to the rule type itself. The first
//! violation is reported as a validation error.

use std::sync::OnceLock;

use regex::Regex;
use sqlx::PgConnection;

use crate::errors::AppError;
use crate::models::rule_type::{RuleType, ValueType};
use crate::services::rule_type;

fn command_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    // Constant pattern: compilation cannot fail at runtime.
    PATTERN.get_or_init(|| Regex::new(r"^[a-zA-Z]+$").expect("command pattern is valid"))
}

/// Parse a value as a finite number.
fn as_finite_number(value: &str) -> Option<f64> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return None;
    }
    trimmed.parse::<f64>().ok().filter(|n| n.is_finite())
}

/// Whether a value denotes an integer (`12`, `-3`, `1e3`, `4.0`).
pub fn is_integer(value: &str) -> bool {
    let trimmed = value.trim();
    trimmed.parse::<i64>().is_ok() || as_finite_number(trimmed).is_some_and(|n| n.fract() == 0.0)
}

/// Whether a value denotes a finite number.
pub fn is_number(value: &str) -> bool {
    as_finite_number(value).is_some()
}

/// Whether a value is one of `true`, `false`, `1`, `0` in any case.
pub fn is_boolean(value: &str) -> bool {
    matches!(
        value.trim().to_lowercase().as_str(),
        "true" | "false" | "1" | "0"
    )
}

/// Check a value against a declared value type.
pub fn check_value_type(value_type: ValueType, rule_type: &str, value: &str) -> Result<(), AppError> {
    let message = match value_type {
        ValueType::Integer if !is_integer(value) => {
            format!("Value '{value}' must be an integer for ruleType '{rule_type}'.")
        }
        ValueType::Float if !is_number(value) => {
            format!("Value '{value}' must be numeric for ruleType '{rule_type}'.")
        }
        ValueType::Boolean if !is_boolean(value) => {
            format!("Value '{value}' must be boolean for ruleType '{rule_type}'.")
        }
        ValueType::String if is_integer(value) => {
            format!("Value '{value}' must not be an integer for ruleType '{rule_type}'.")
        }
        _ => return Ok(()),
    };
    Err(AppError::Validation(message))
}

/// Check the constraints attached to specific rule types.
pub fn check_rule_constraint(rule_type: &str, value: &str) -> Result<(), AppError> {
    match rule_type {
        "COMMAND" if !command_pattern().is_match(value) => Err(AppError::Validation(format!(
            "COMMAND value '{value}' must contain letters only."
        ))),
        "LINE_WIDTH" | "LINE_COUNT" if !as_finite_number(value).is_some_and(|n| n > 0.0) => {
            Err(AppError::Validation(format!(
                "{rule_type} value '{value}' must be a number greater than 0."
            )))
        }
        _ => Ok(()),
    }
}

/// Validate a value against an already loaded rule type.
pub fn validate_value(rule_type: &RuleType, value: &str) -> Result<(), AppError> {
    check_value_type(rule_type.value_type, &rule_type.code, value)?;
    check_rule_constraint(&rule_type.code, value)
}

/// Validate a candidate rule's rule type and value, loading the rule type.
///
/// Returns the rule type on success so callers do not look it up twice.
pub async fn validate_rule_data(
    conn: &mut PgConnection,
    rule_type_code: Option<&str>,
    value: Option<&str>,
) -> Result<RuleType, AppError> {
    let (Some(code), Some(value)) = (
        rule_type_code.filter(|c| !c.trim().is_empty()),
        value.filter(|v| !v.trim().is_empty()),
    ) else {
        return Err(AppError::Validation(
            "ruleType and value are required.".to_string(),
        ));
    };

    let rule_type = rule_type::find_by_code(&mut *conn, code)
        .await?
        .ok_or_else(|| AppError::Validation(format!("Unknown ruleType '{code}'")))?;

    validate_value(&rule_type, value)?;
    Ok(rule_type)
}
