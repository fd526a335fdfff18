use std::env;

use chrono::{FixedOffset, NaiveDate, Offset, Utc};

/// Application configuration loaded from environment variables.
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub database_url: String,
    pub database_max_connections: u32,
    pub host: String,
    pub port: u16,
    /// Fixed offset used to decide what "today" is for rule windows.
    pub rules_utc_offset_minutes: i32,
    /// Severity given to base rules auto-created during log ingestion.
    pub default_severity: i32,
    pub frontend_url: String,
}

impl AppConfig {
    pub fn from_env() -> Result<Self, env::VarError> {
        Ok(Self {
            database_url: env::var("DATABASE_URL")?,
            database_max_connections: env::var("DATABASE_MAX_CONNECTIONS")
                .unwrap_or_else(|_| "10".to_string())
                .parse()
                .unwrap_or(10),
            host: env::var("BACKEND_HOST").unwrap_or_else(|_| "0.0.0.0".to_string()),
            port: env::var("BACKEND_PORT")
                .unwrap_or_else(|_| "3000".to_string())
                .parse()
                .unwrap_or(3000),
            rules_utc_offset_minutes: env::var("RULES_UTC_OFFSET_MINUTES")
                .unwrap_or_else(|_| "60".to_string())
                .parse()
                .unwrap_or(60),
            default_severity: env::var("DEFAULT_SEVERITY")
                .unwrap_or_else(|_| "1".to_string())
                .parse()
                .unwrap_or(1),
            frontend_url: env::var("FRONTEND_URL")
                .unwrap_or_else(|_| "http://localhost:5173".to_string()),
        })
    }

    /// The configured rules timezone. Out-of-range offsets fall back to UTC.
    pub fn rules_timezone(&self) -> FixedOffset {
        FixedOffset::east_opt(self.rules_utc_offset_minutes.saturating_mul(60))
            .unwrap_or_else(|| Utc.fix())
    }

    /// Current calendar date in the rules timezone.
    pub fn today(&self) -> NaiveDate {
        Utc::now().with_timezone(&self.rules_timezone()).date_naive()
    }
}
