use std::sync::Arc;

use axum::{middleware, routing::get, Router};

use shared_config::AppConfig;
use shared_utils::extractor::auth_middleware;

use crate::handlers;

pub fn schedule_routes(state: Arc<AppConfig>) -> Router {
    Router::new()
        .route("/doctors", get(handlers::list_doctors))
        .route("/dates", get(handlers::get_available_dates))
        .route("/available-slots", get(handlers::get_available_slots))
        .layer(middleware::from_fn_with_state(state.clone(), auth_middleware))
        .with_state(state)
}
