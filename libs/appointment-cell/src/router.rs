// libs/appointment-cell/src/router.rs
use std::sync::Arc;

use axum::{
    middleware,
    routing::{get, post},
    Router,
};

use shared_config::AppConfig;
use shared_utils::extractor::auth_middleware;

use crate::handlers;

pub fn appointment_routes(state: Arc<AppConfig>) -> Router {
    // All booking and ledger operations require an operator token
    let protected_routes = Router::new()
        // Draft state machine; the caller holds the draft between steps
        .route("/drafts", post(handlers::start_draft))
        .route("/drafts/classify", post(handlers::classify_draft))
        .route("/drafts/select-slot", post(handlers::select_slot))
        .route("/drafts/confirm", post(handlers::confirm_draft))
        // Ledger
        .route("/", get(handlers::list_appointments))
        .route("/export.csv", get(handlers::export_appointments))
        .route("/consistency", get(handlers::check_consistency))
        .layer(middleware::from_fn_with_state(state.clone(), auth_middleware));

    Router::new()
        .merge(protected_routes)
        .with_state(state)
}
