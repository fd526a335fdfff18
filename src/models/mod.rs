//! Database models and DTOs for all domain entities.

pub mod automation_log;
pub mod base_rule;
pub mod code_user;
pub mod lenient;
pub mod notification;
pub mod object_type;
pub mod pagination;
pub mod rule_type;
pub mod user_rule;
