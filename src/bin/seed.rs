//! Seed script for development: populates a fresh database with sample data.
//!
//! Usage: `cargo run --bin seed`
//!
//! Requires the `DATABASE_URL` environment variable (reads .env).

use rulekeeper::config::AppConfig;
use rulekeeper::models::object_type::CreateObjectType;
use rulekeeper::services::{base_rule, object_type, user_rule};
use serde_json::json;
use sqlx::PgPool;

const SAMPLE_USER: &str = "DEV01";

const OBJECT_TYPES: &[(&str, &str, bool)] = &[
    ("PROG", "ABAP program", true),
    ("CLAS", "Class", true),
    ("FUGR", "Function group", true),
    ("TABL", "Table definition", false),
];

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    let config = AppConfig::from_env()?;
    let pool = rulekeeper::db::create_pool(&config.database_url, 5).await?;

    // Run migrations first
    rulekeeper::db::run_migrations(&pool).await?;

    println!("=== rulekeeper Seed Script ===");

    seed_object_types(&pool).await?;
    seed_base_rules(&pool, config.default_severity).await?;

    let result = user_rule::apply_all_rules(&pool, SAMPLE_USER, config.today()).await?;
    println!("[done] {}", result.message);

    println!("\n=== Seed complete! ===");
    Ok(())
}

async fn seed_object_types(pool: &PgPool) -> anyhow::Result<()> {
    let mut created = 0;
    for (code, description, active) in OBJECT_TYPES {
        if object_type::find_by_code(pool, code).await?.is_some() {
            continue;
        }
        object_type::create(
            pool,
            &CreateObjectType {
                code: code.to_string(),
                description: Some(description.to_string()),
                active: Some(*active),
                manual: Some(true),
            },
        )
        .await?;
        created += 1;
    }

    println!("[done] Created {created} object types");
    Ok(())
}

async fn seed_base_rules(pool: &PgPool, default_severity: i32) -> anyhow::Result<()> {
    let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM base_rules")
        .fetch_one(pool)
        .await?;
    if count > 0 {
        println!("[skip] Base rules already present ({count})");
        return Ok(());
    }

    let rows = vec![
        json!({ "objectType": "PROG", "ruleType": "COMMAND", "value": "DELETE", "severityRating": 3, "description": "No direct DELETE statements" }),
        json!({ "objectType": "PROG", "ruleType": "COMMAND", "value": "SUBMIT", "severityRating": 2 }),
        json!({ "objectType": "PROG", "ruleType": "LINE_WIDTH", "value": "120" }),
        json!({ "objectType": "CLAS", "ruleType": "LINE_COUNT", "value": "2000", "severityRating": 2 }),
        json!({ "objectType": "CLAS", "ruleType": "NAMING_PREFIX", "value": "ZCL_" }),
        json!({ "objectType": "FUGR", "ruleType": "RUNTIME_LIMIT", "value": "2.5" }),
        json!({ "objectType": "TABL", "ruleType": "HARDCODE_ALLOWED", "value": "false" }),
    ];

    let message = base_rule::upload_rows(pool, &rows, default_severity).await?;
    println!("[done] {message}");
    Ok(())
}
