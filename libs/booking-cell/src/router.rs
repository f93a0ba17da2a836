// libs/booking-cell/src/router.rs
use std::sync::Arc;

use axum::{routing::post, Router};

use shared_config::AppConfig;

use crate::handlers;

pub fn booking_routes(state: Arc<AppConfig>) -> Router {
    // Public: anonymous visitors book from the professional's page
    Router::new()
        .route("/bookings", post(handlers::create_public_booking))
        .with_state(state)
}
