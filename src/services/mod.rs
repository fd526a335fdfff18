//! Business logic services.

pub mod automation_log;
pub mod base_rule;
pub mod code_user;
pub mod object_type;
pub mod rule_import;
pub mod rule_type;
pub mod user_rule;
pub mod validator;
