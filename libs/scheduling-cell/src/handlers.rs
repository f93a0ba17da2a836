// libs/scheduling-cell/src/handlers.rs
use std::sync::Arc;

use axum::{
    extract::{
        rejection::{PathRejection, QueryRejection},
        Path, Query, State,
    },
    Json,
};
use chrono::Utc;
use serde_json::{json, Value};
use tracing::{error, warn};
use uuid::Uuid;

use shared_config::AppConfig;
use shared_models::error::AppError;

use crate::models::{AvailabilityQuery, SchedulingError};
use crate::services::availability::{AvailabilityService, DEFAULT_HORIZON_DAYS};

/// Public, read-only: open slots for the next days of a professional's calendar.
#[axum::debug_handler]
pub async fn get_public_availability(
    State(state): State<Arc<AppConfig>>,
    path: Result<Path<Uuid>, PathRejection>,
    query: Result<Query<AvailabilityQuery>, QueryRejection>,
) -> Result<Json<Value>, AppError> {
    let Path(professional_id) = path.map_err(|rejection| {
        warn!(error = %rejection, "Malformed professional id");
        AppError::ValidationError("Professional id must be a UUID".to_string())
    })?;
    let Query(query) = query.map_err(|rejection| {
        warn!(error = %rejection, "Malformed availability query");
        AppError::ValidationError("from must be YYYY-MM-DD and days a positive number".to_string())
    })?;

    let service = AvailabilityService::new(&state);

    let from = query.from.unwrap_or_else(|| Utc::now().date_naive());
    let days = query.days.unwrap_or(DEFAULT_HORIZON_DAYS);

    let availability = service
        .get_public_availability(professional_id, from, days)
        .await
        .map_err(|e| match e {
            SchedulingError::ProfessionalNotFound => {
                AppError::NotFound("Professional not found".to_string())
            }
            SchedulingError::InvalidRange(msg) => AppError::ValidationError(msg),
            SchedulingError::Store(err) => {
                error!(professional_id = %professional_id, error = ?err, "Availability query failed");
                AppError::Internal("Unable to load availability".to_string())
            }
        })?;

    Ok(Json(json!(availability)))
}
