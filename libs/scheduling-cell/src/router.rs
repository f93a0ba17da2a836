// libs/scheduling-cell/src/router.rs
use std::sync::Arc;

use axum::{routing::get, Router};

use shared_config::AppConfig;

use crate::handlers;

pub fn scheduling_routes(state: Arc<AppConfig>) -> Router {
    // Public: the booking page is unauthenticated
    Router::new()
        .route("/availability/{professional_id}", get(handlers::get_public_availability))
        .with_state(state)
}
