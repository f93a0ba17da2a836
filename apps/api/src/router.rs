use std::sync::Arc;

use axum::{
    Router,
    routing::get,
};

use billing_cell::router::billing_routes;
use booking_cell::router::booking_routes;
use scheduling_cell::router::scheduling_routes;
use shared_config::AppConfig;

pub fn create_router(state: Arc<AppConfig>) -> Router {
    let public = Router::new()
        .merge(scheduling_routes(state.clone()))
        .merge(booking_routes(state.clone()));

    Router::new()
        .route("/", get(|| async { "Booking core API is running!" }))
        .nest("/public", public)
        .nest("/webhooks", billing_routes(state))
}
