// libs/billing-cell/src/router.rs
use std::sync::Arc;

use axum::{routing::post, Router};

use shared_config::AppConfig;

use crate::handlers;

pub fn billing_routes(state: Arc<AppConfig>) -> Router {
    // Called by the payment provider; authenticated by signature, not by session
    Router::new()
        .route("/payments", post(handlers::receive_payment_webhook))
        .with_state(state)
}
