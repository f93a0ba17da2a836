// libs/booking-cell/src/handlers.rs
use std::sync::Arc;

use axum::{
    extract::{rejection::JsonRejection, State},
    Json,
};
use serde_json::{json, Value};
use tracing::{error, warn};

use shared_config::AppConfig;
use shared_models::error::AppError;
use shared_utils::ClientIp;

use crate::models::{BookingError, PublicBookingRequest};
use crate::services::booking::PublicBookingService;

#[axum::debug_handler]
pub async fn create_public_booking(
    State(state): State<Arc<AppConfig>>,
    client_ip: ClientIp,
    payload: Result<Json<PublicBookingRequest>, JsonRejection>,
) -> Result<Json<Value>, AppError> {
    let Json(request) = payload.map_err(|rejection| {
        warn!(error = %rejection, "Malformed booking payload");
        AppError::ValidationError("Request body must be a JSON booking".to_string())
    })?;

    let service = PublicBookingService::new(&state);

    let confirmation = service
        .book(request, client_ip.as_str())
        .await
        .map_err(booking_error_response)?;

    Ok(Json(json!(confirmation)))
}

/// Client-facing messages stay generic; the detail goes to the log.
fn booking_error_response(err: BookingError) -> AppError {
    match err {
        BookingError::Validation(msg) => AppError::ValidationError(msg),
        BookingError::RateLimited => AppError::TooManyRequests(
            "Too many booking attempts. Please try again later.".to_string(),
        ),
        BookingError::ProfessionalNotFound => AppError::NotFound("Professional not found".to_string()),
        BookingError::PlanLimitReached => AppError::Forbidden(
            "This professional is not accepting online bookings right now".to_string(),
        ),
        BookingError::SlotTaken | BookingError::OutsideWorkingHours => AppError::Conflict(
            "This time is no longer available. Please choose another slot.".to_string(),
        ),
        BookingError::ProfessionalLookup(err)
        | BookingError::AuditPersistence(err)
        | BookingError::ClientPersistence(err)
        | BookingError::AppointmentPersistence(err) => {
            error!(error = ?err, "Public booking failed");
            AppError::Internal("Unable to complete booking".to_string())
        }
    }
}
