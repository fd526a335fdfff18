//! Route definitions for the rulekeeper API.
//!
//! [`router`] is the single routing table: every action and CRUD endpoint maps
//! to a typed handler, and every route passes through the request-log
//! middleware.

pub mod automation_logs;
pub mod base_rules;
pub mod health;
pub mod object_types;
pub mod rule_types;
pub mod user_rules;
pub mod users;

use axum::{
    http::HeaderValue,
    middleware,
    routing::{get, post, put},
    Router,
};
use tower_http::{
    compression::CompressionLayer,
    cors::{Any, CorsLayer},
    limit::RequestBodyLimitLayer,
    trace::TraceLayer,
};

use crate::middleware::request_log;
use crate::AppState;

/// Upper bound on request bodies, sized for sheet imports.
const MAX_BODY_BYTES: usize = 10 * 1024 * 1024;

fn cors_layer(frontend_url: &str) -> CorsLayer {
    let cors = CorsLayer::new().allow_methods(Any).allow_headers(Any);
    match HeaderValue::from_str(frontend_url) {
        Ok(origin) => cors.allow_origin(origin),
        Err(_) => {
            tracing::warn!(frontend_url, "Invalid FRONTEND_URL, allowing any origin");
            cors.allow_origin(Any)
        }
    }
}

fn rule_routes() -> Router<AppState> {
    Router::new()
        .route("/rule-types", get(rule_types::list))
        .route("/rule-types/{code}", get(rule_types::get_by_code))
        .route("/base-rules", get(base_rules::list).post(base_rules::create))
        .route("/base-rules/upload", post(base_rules::upload))
        .route("/base-rules/import", post(base_rules::import_sheet))
        .route(
            "/base-rules/{id}",
            get(base_rules::get_by_id)
                .put(base_rules::update)
                .delete(base_rules::delete),
        )
}

fn object_type_routes() -> Router<AppState> {
    Router::new()
        .route(
            "/object-types",
            get(object_types::list).post(object_types::create),
        )
        .route(
            "/object-types/{code}",
            get(object_types::get_by_code)
                .put(object_types::update)
                .delete(object_types::delete),
        )
        .route("/object-types/{code}/make-active", post(object_types::make_active))
        .route("/object-types/{code}/make-inactive", post(object_types::make_inactive))
        .route(
            "/object-types/{code}/add-programmable",
            post(object_types::add_programmable),
        )
        .route("/object-types/{code}/make-manual", post(object_types::make_manual))
}

fn user_routes() -> Router<AppState> {
    Router::new()
        .route("/users", get(users::list))
        .route("/users/{id}", get(users::get_by_id))
        .route("/users/{id}/make-trusted", post(users::make_trusted))
        .route("/users/{id}/make-untrusted", post(users::make_untrusted))
        .route("/users/{id}/trusted", put(users::set_trusted))
        .route("/users/{id}/apply-all-rules", post(users::apply_all_rules))
        .route("/users/{id}/init-rules", post(users::init_rules))
        .route("/users/{id}/check-overdue-rules", post(users::check_overdue_rules))
        .route("/users/{id}/applicable-rules", get(users::applicable_rules))
        .route("/users/{id}/all-rules", get(users::all_rules))
        .route(
            "/users/{id}/rules",
            get(user_rules::list_for_user).post(user_rules::create),
        )
        .route(
            "/user-rules/{id}",
            get(user_rules::get_by_id)
                .put(user_rules::update)
                .delete(user_rules::delete),
        )
}

fn log_routes() -> Router<AppState> {
    Router::new()
        .route(
            "/automation-logs",
            get(automation_logs::list).post(automation_logs::add_log),
        )
        .route("/automation-logs/batch", post(automation_logs::add_logs))
        .route("/automation-logs/{id}", get(automation_logs::get_by_id))
}

/// Build the full application router.
pub fn router(state: AppState) -> Router {
    let cors = cors_layer(&state.config.frontend_url);

    Router::new()
        .route("/health/live", get(health::live))
        .route("/health/ready", get(health::ready))
        .nest("/api/v1", rule_routes())
        .nest("/api/v1", object_type_routes())
        .nest("/api/v1", user_routes())
        .nest("/api/v1", log_routes())
        .layer(middleware::from_fn(request_log::log_request))
        .layer(TraceLayer::new_for_http())
        .layer(CompressionLayer::new())
        .layer(RequestBodyLimitLayer::new(MAX_BODY_BYTES))
        .layer(cors)
        .with_state(state)
}
