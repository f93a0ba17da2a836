use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Client {
    pub id: Uuid,
    pub professional_id: Uuid,
    pub name: String,
    pub email: Option<String>,
    pub whatsapp: Option<String>,
    pub created_at: Option<DateTime<Utc>>,
}

/// Contact fields written when a client is created or refreshed.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ClientContact {
    pub name: String,
    pub email: Option<String>,
    pub whatsapp: Option<String>,
}
