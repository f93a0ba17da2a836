// libs/booking-cell/src/models.rs
use chrono::{NaiveDate, NaiveTime};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

use shared_models::time_of_day;

pub const MAX_CLIENT_NAME_CHARS: usize = 120;
const MIN_WHATSAPP_DIGITS: usize = 8;
const MAX_WHATSAPP_DIGITS: usize = 15;

// ==============================================================================
// REQUEST / RESPONSE
// ==============================================================================

/// Body of the anonymous booking form. Every field defaults so that missing
/// values surface as validation errors rather than extractor rejections.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct PublicBookingRequest {
    #[serde(rename = "userId")]
    pub user_id: String,
    #[serde(rename = "clientName")]
    pub client_name: String,
    #[serde(rename = "clientEmail")]
    pub client_email: Option<String>,
    #[serde(rename = "clientWhatsApp")]
    pub client_whatsapp: Option<String>,
    #[serde(rename = "selectedDate")]
    pub selected_date: String,
    #[serde(rename = "selectedTime")]
    pub selected_time: String,
}

/// Contact details exactly as submitted, trimmed and with blanks dropped.
#[derive(Debug, Clone, PartialEq)]
pub struct SubmittedContact {
    pub name: String,
    pub email: Option<String>,
    pub whatsapp: Option<String>,
}

#[derive(Debug, Clone)]
pub struct BookingSubmission {
    pub professional_id: Uuid,
    pub date: NaiveDate,
    pub time: NaiveTime,
    pub contact: SubmittedContact,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct BookingConfirmation {
    pub success: bool,
    pub appointment_id: Uuid,
    #[serde(rename = "professionalWhatsApp")]
    pub professional_whatsapp: Option<String>,
    pub professional_name: String,
    pub client_id: Uuid,
}

impl PublicBookingRequest {
    /// Shape checks that need no I/O.
    pub fn validate(&self) -> Result<BookingSubmission, BookingError> {
        let professional_id = Uuid::parse_str(self.user_id.trim())
            .map_err(|_| BookingError::Validation("userId must be a valid id".to_string()))?;

        let date = NaiveDate::parse_from_str(self.selected_date.trim(), "%Y-%m-%d").map_err(|_| {
            BookingError::Validation("selectedDate must be formatted as YYYY-MM-DD".to_string())
        })?;

        let time = time_of_day::parse(&self.selected_time).ok_or_else(|| {
            BookingError::Validation("selectedTime must be formatted as HH:MM".to_string())
        })?;

        let name = self.client_name.trim();
        if name.is_empty() {
            return Err(BookingError::Validation("clientName is required".to_string()));
        }
        if name.chars().count() > MAX_CLIENT_NAME_CHARS {
            return Err(BookingError::Validation(format!(
                "clientName must be at most {} characters",
                MAX_CLIENT_NAME_CHARS
            )));
        }

        let email = non_blank(self.client_email.as_deref());
        if let Some(email) = &email {
            if !email.contains('@') {
                return Err(BookingError::Validation("clientEmail is not a valid address".to_string()));
            }
        }

        let whatsapp = non_blank(self.client_whatsapp.as_deref());
        if let Some(whatsapp) = &whatsapp {
            let digits = whatsapp.chars().filter(|c| c.is_ascii_digit()).count();
            if !(MIN_WHATSAPP_DIGITS..=MAX_WHATSAPP_DIGITS).contains(&digits) {
                return Err(BookingError::Validation("clientWhatsApp is not a valid number".to_string()));
            }
        }

        Ok(BookingSubmission {
            professional_id,
            date,
            time,
            contact: SubmittedContact {
                name: name.to_string(),
                email,
                whatsapp,
            },
        })
    }
}

fn non_blank(value: Option<&str>) -> Option<String> {
    value
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(str::to_string)
}

// ==============================================================================
// ERRORS
// ==============================================================================

#[derive(Error, Debug)]
pub enum BookingError {
    #[error("Invalid booking request: {0}")]
    Validation(String),

    #[error("Too many booking attempts")]
    RateLimited,

    #[error("Professional not found")]
    ProfessionalNotFound,

    #[error("Requested time is outside working hours")]
    OutsideWorkingHours,

    #[error("Monthly booking limit reached for the professional's plan")]
    PlanLimitReached,

    #[error("Slot already taken")]
    SlotTaken,

    #[error("Failed to load professional: {0}")]
    ProfessionalLookup(anyhow::Error),

    #[error("Failed to record booking attempt: {0}")]
    AuditPersistence(anyhow::Error),

    #[error("Failed to persist client: {0}")]
    ClientPersistence(anyhow::Error),

    #[error("Failed to persist appointment: {0}")]
    AppointmentPersistence(anyhow::Error),
}
