// libs/billing-cell/src/handlers.rs
use std::sync::Arc;

use axum::{
    body::Bytes,
    extract::State,
    http::HeaderMap,
    Json,
};
use serde_json::{json, Value};
use tracing::error;

use shared_config::AppConfig;
use shared_models::error::AppError;

use crate::models::{WebhookError, WebhookHeaders};
use crate::services::webhook::WebhookProcessor;

/// Provider callback. The raw body is kept intact for signature verification.
#[axum::debug_handler]
pub async fn receive_payment_webhook(
    State(state): State<Arc<AppConfig>>,
    headers: HeaderMap,
    body: Bytes,
) -> Result<Json<Value>, AppError> {
    let processor = WebhookProcessor::new(&state).map_err(webhook_error_response)?;

    processor
        .process(&body, &WebhookHeaders::from_headers(&headers))
        .await
        .map_err(webhook_error_response)?;

    Ok(Json(json!({ "received": true })))
}

fn webhook_error_response(err: WebhookError) -> AppError {
    match err {
        WebhookError::InvalidPayload(_) => AppError::BadRequest("Invalid webhook payload".to_string()),
        WebhookError::SignatureInvalid => AppError::Auth("Invalid signature".to_string()),
        WebhookError::InvalidReference(_) | WebhookError::AmountMismatch { .. } => {
            AppError::BadRequest("Payment rejected".to_string())
        }
        WebhookError::UpstreamUnavailable(err) | WebhookError::Store(err) => {
            error!(error = ?err, "Payment webhook failed");
            AppError::Internal("Webhook processing failed".to_string())
        }
    }
}
