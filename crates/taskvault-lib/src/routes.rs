// ============================
// crates/taskvault-lib/src/routes.rs
// ============================
//! Router assembly: routes, per-route rate-limit stages, global layers.
use axum::{
    middleware::{from_fn, from_fn_with_state},
    routing::{get, post},
    Json, Router,
};
use tower_http::{cors::CorsLayer, trace::TraceLayer};

use crate::handlers::{auth, tasks};
use crate::middleware::rate_limit::{
    limit_account_reads, limit_login, limit_register, limit_tasks,
};
use crate::middleware::security_headers::security_headers;
use crate::AppState;

/// Build the application router.
pub fn create_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health))
        .route(
            "/auth/register",
            post(auth::register)
                .layer(from_fn_with_state(state.clone(), limit_register)),
        )
        .route(
            "/auth/login",
            post(auth::login).layer(from_fn_with_state(state.clone(), limit_login)),
        )
        .route(
            "/auth/me",
            get(auth::me).layer(from_fn_with_state(state.clone(), limit_account_reads)),
        )
        .route(
            "/tasks",
            get(tasks::list_tasks)
                .post(tasks::create_task)
                .layer(from_fn_with_state(state.clone(), limit_tasks)),
        )
        .route(
            "/tasks/{id}",
            get(tasks::get_task)
                .put(tasks::update_task)
                .delete(tasks::delete_task)
                .layer(from_fn_with_state(state.clone(), limit_tasks)),
        )
        .layer(from_fn(security_headers))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}

async fn health() -> Json<serde_json::Value> {
    Json(serde_json::json!({ "status": "ok" }))
}
