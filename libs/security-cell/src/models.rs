// =====================================================================================
// SECURITY CELL MODELS
// =====================================================================================

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::fmt;
use thiserror::Error;

// =====================================================================================
// AUDIT MODELS
// =====================================================================================

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum AuditAction {
    PublicBookingAttempt,
    PublicBookingBlocked,
    LoginAttempt,
    LoginBlocked,
}

impl AuditAction {
    pub fn as_str(&self) -> &'static str {
        match self {
            AuditAction::PublicBookingAttempt => "public_booking_attempt",
            AuditAction::PublicBookingBlocked => "public_booking_blocked",
            AuditAction::LoginAttempt => "login_attempt",
            AuditAction::LoginBlocked => "login_blocked",
        }
    }

    pub fn is_denial(&self) -> bool {
        matches!(self, AuditAction::PublicBookingBlocked | AuditAction::LoginBlocked)
    }
}

impl fmt::Display for AuditAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuditEntry {
    pub action: AuditAction,
    pub table_name: String,
    pub ip_address: Option<String>,
    pub actor: Option<String>,
    pub metadata: Map<String, Value>,
    pub created_at: DateTime<Utc>,
}

impl AuditEntry {
    pub fn new(action: AuditAction, table_name: impl Into<String>) -> Self {
        Self {
            action,
            table_name: table_name.into(),
            ip_address: None,
            actor: None,
            metadata: Map::new(),
            created_at: Utc::now(),
        }
    }

    pub fn with_ip(mut self, ip_address: impl Into<String>) -> Self {
        self.ip_address = Some(ip_address.into());
        self
    }

    pub fn with_actor(mut self, actor: impl Into<String>) -> Self {
        self.actor = Some(actor.into());
        self
    }

    pub fn with_metadata(mut self, metadata: Map<String, Value>) -> Self {
        self.metadata.extend(metadata);
        self
    }

    pub fn add_context<T: Serialize>(mut self, key: &str, value: T) -> Self {
        if let Ok(serialized) = serde_json::to_value(value) {
            self.metadata.insert(key.to_string(), serialized);
        }
        self
    }

    pub fn at(mut self, created_at: DateTime<Utc>) -> Self {
        self.created_at = created_at;
        self
    }

    /// The value a rate-limit policy keys on for this entry.
    pub fn subject(&self, key: RateLimitKey) -> Option<&str> {
        match key {
            RateLimitKey::IpAddress => self.ip_address.as_deref(),
            RateLimitKey::Actor => self.actor.as_deref(),
        }
    }
}

// =====================================================================================
// RATE LIMIT MODELS
// =====================================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RateLimitKey {
    IpAddress,
    Actor,
}

impl RateLimitKey {
    pub fn column(&self) -> &'static str {
        match self {
            RateLimitKey::IpAddress => "ip_address",
            RateLimitKey::Actor => "actor",
        }
    }
}

#[derive(Debug, Clone)]
pub struct RateLimitPolicy {
    pub attempt_action: AuditAction,
    pub blocked_action: AuditAction,
    pub table_name: &'static str,
    pub key: RateLimitKey,
    pub max_attempts: usize,
    pub window: Duration,
}

impl RateLimitPolicy {
    /// Five public booking submissions per network address per trailing hour.
    pub fn public_booking() -> Self {
        Self {
            attempt_action: AuditAction::PublicBookingAttempt,
            blocked_action: AuditAction::PublicBookingBlocked,
            table_name: "appointments",
            key: RateLimitKey::IpAddress,
            max_attempts: 5,
            window: Duration::hours(1),
        }
    }

    /// Five sign-in attempts per email per trailing 15 minutes.
    pub fn login() -> Self {
        Self {
            attempt_action: AuditAction::LoginAttempt,
            blocked_action: AuditAction::LoginBlocked,
            table_name: "auth",
            key: RateLimitKey::Actor,
            max_attempts: 5,
            window: Duration::minutes(15),
        }
    }
}

#[derive(Error, Debug)]
pub enum RateLimitError {
    #[error("Too many attempts from {subject}")]
    Limited { subject: String, retry_after: Duration },

    #[error("Audit store error: {0}")]
    Store(#[from] anyhow::Error),
}
