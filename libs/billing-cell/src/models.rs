// =====================================================================================
// BILLING CELL MODELS
// =====================================================================================

use axum::http::HeaderMap;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;
use uuid::Uuid;

pub const SIGNATURE_HEADER: &str = "x-signature";
pub const REQUEST_ID_HEADER: &str = "x-request-id";
const DEFAULT_ACTION: &str = "default";

// =====================================================================================
// INBOUND NOTIFICATION
// =====================================================================================

/// The two provider headers the signature covers.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct WebhookHeaders {
    pub signature: Option<String>,
    pub request_id: Option<String>,
}

impl WebhookHeaders {
    pub fn new(signature: impl Into<String>, request_id: impl Into<String>) -> Self {
        Self {
            signature: Some(signature.into()),
            request_id: Some(request_id.into()),
        }
    }

    pub fn from_headers(headers: &HeaderMap) -> Self {
        let read = |name: &str| {
            headers
                .get(name)
                .and_then(|value| value.to_str().ok())
                .map(str::to_string)
        };

        Self {
            signature: read(SIGNATURE_HEADER),
            request_id: read(REQUEST_ID_HEADER),
        }
    }
}

/// `{ type, data: { id }, action? }` extracted from a provider callback.
#[derive(Debug, Clone, PartialEq)]
pub struct WebhookNotification {
    pub event_type: String,
    pub data_id: String,
    pub action: Option<String>,
}

impl WebhookNotification {
    pub fn from_value(payload: &Value) -> Result<Self, WebhookError> {
        let object = payload
            .as_object()
            .ok_or_else(|| WebhookError::InvalidPayload("body must be a JSON object".to_string()))?;

        let event_type = object
            .get("type")
            .and_then(Value::as_str)
            .filter(|t| !t.is_empty())
            .ok_or_else(|| WebhookError::InvalidPayload("missing type".to_string()))?;

        let data_id = object
            .get("data")
            .and_then(|data| data.get("id"))
            .and_then(data_id_text)
            .ok_or_else(|| WebhookError::InvalidPayload("missing data.id".to_string()))?;

        let action = object
            .get("action")
            .and_then(Value::as_str)
            .filter(|a| !a.is_empty())
            .map(str::to_string);

        Ok(Self {
            event_type: event_type.to_string(),
            data_id,
            action,
        })
    }

    /// Ledger key: `{type}_{dataId}_{action|default}`.
    pub fn event_id(&self) -> String {
        format!(
            "{}_{}_{}",
            self.event_type,
            self.data_id,
            self.action.as_deref().unwrap_or(DEFAULT_ACTION)
        )
    }

    pub fn is_payment(&self) -> bool {
        self.event_type == "payment"
    }
}

/// Providers send `data.id` as either a string or a number.
pub fn data_id_text(value: &Value) -> Option<String> {
    match value {
        Value::String(id) if !id.is_empty() => Some(id.clone()),
        Value::Number(id) => Some(id.to_string()),
        _ => None,
    }
}

// =====================================================================================
// LEDGER & PROVIDER RECORDS
// =====================================================================================

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct WebhookEvent {
    pub id: String,
    pub event_type: String,
    pub payload: Value,
    #[serde(default)]
    pub processed: bool,
    pub processed_at: Option<DateTime<Utc>>,
}

impl WebhookEvent {
    pub fn received(notification: &WebhookNotification, payload: Value) -> Self {
        Self {
            id: notification.event_id(),
            event_type: notification.event_type.clone(),
            payload,
            processed: false,
            processed_at: None,
        }
    }
}

/// Payment as reported by the provider's payments API.
#[derive(Debug, Clone, Deserialize, PartialEq)]
pub struct PaymentDetails {
    pub status: String,
    pub external_reference: Option<String>,
    pub transaction_amount: Option<f64>,
}

impl PaymentDetails {
    pub fn is_approved(&self) -> bool {
        self.status == "approved"
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum WebhookOutcome {
    AlreadyProcessed,
    Ignored(String),
    PlanUpgraded { professional_id: Uuid },
}

// =====================================================================================
// ERRORS
// =====================================================================================

#[derive(Error, Debug)]
pub enum WebhookError {
    #[error("Invalid webhook payload: {0}")]
    InvalidPayload(String),

    #[error("Invalid webhook signature")]
    SignatureInvalid,

    #[error("Payment reference does not match a professional: {0}")]
    InvalidReference(String),

    #[error("Paid amount {actual:?} does not match plan price {expected}")]
    AmountMismatch { expected: f64, actual: Option<f64> },

    #[error("Payment provider unavailable: {0}")]
    UpstreamUnavailable(anyhow::Error),

    #[error("Data store error: {0}")]
    Store(anyhow::Error),
}

impl WebhookError {
    /// Business rejections are final; redelivery must not retry them.
    pub fn is_final(&self) -> bool {
        matches!(
            self,
            WebhookError::InvalidReference(_) | WebhookError::AmountMismatch { .. }
        )
    }
}
