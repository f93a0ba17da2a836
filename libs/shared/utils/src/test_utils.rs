use std::sync::Arc;
use chrono::Utc;
use serde_json::{json, Value};
use uuid::Uuid;

use shared_config::AppConfig;

pub struct TestConfig {
    pub supabase_url: String,
    pub supabase_service_role_key: String,
    pub payment_webhook_secret: String,
    pub payment_access_token: String,
    pub payment_api_base_url: String,
}

impl Default for TestConfig {
    fn default() -> Self {
        Self {
            supabase_url: "http://localhost:54321".to_string(),
            supabase_service_role_key: "test-service-role-key".to_string(),
            payment_webhook_secret: "test-webhook-secret".to_string(),
            payment_access_token: "test-access-token".to_string(),
            payment_api_base_url: "http://localhost:54399".to_string(),
        }
    }
}

impl TestConfig {
    pub fn with_supabase_url(mut self, url: &str) -> Self {
        self.supabase_url = url.to_string();
        self
    }

    pub fn with_payment_api(mut self, url: &str) -> Self {
        self.payment_api_base_url = url.to_string();
        self
    }

    pub fn to_app_config(&self) -> AppConfig {
        AppConfig {
            supabase_url: self.supabase_url.clone(),
            supabase_service_role_key: self.supabase_service_role_key.clone(),
            payment_webhook_secret: self.payment_webhook_secret.clone(),
            payment_access_token: self.payment_access_token.clone(),
            payment_api_base_url: self.payment_api_base_url.clone(),
            payment_timeout_secs: 2,
            ..AppConfig::default()
        }
    }

    pub fn to_arc(&self) -> Arc<AppConfig> {
        Arc::new(self.to_app_config())
    }
}

/// Row shapes as PostgREST returns them, for wiremock bodies.
pub struct MockSupabaseResponses;

impl MockSupabaseResponses {
    pub fn professional_response(professional_id: &str, plan: &str) -> Value {
        json!({
            "id": professional_id,
            "full_name": "Ana Souza",
            "whatsapp": "5511988887777",
            "availability": {
                "monday": { "start": "09:00", "end": "11:00", "active": true },
                "tuesday": { "start": "09:00", "end": "18:00", "active": false }
            },
            "plan": plan,
            "subscription_status": null,
            "trial_ends_at": null,
            "monthly_appointment_count": 0
        })
    }

    pub fn client_response(client_id: &str, professional_id: &str, name: &str, whatsapp: Option<&str>) -> Value {
        json!({
            "id": client_id,
            "professional_id": professional_id,
            "name": name,
            "email": null,
            "whatsapp": whatsapp,
            "created_at": Utc::now().to_rfc3339()
        })
    }

    pub fn appointment_response(professional_id: &str, client_id: &str, date: &str, time: &str) -> Value {
        json!({
            "id": Uuid::new_v4(),
            "professional_id": professional_id,
            "client_id": client_id,
            "date": date,
            "time": time,
            "duration_minutes": 60,
            "status": "agendado",
            "service": null,
            "price": null,
            "reminder_channel": "whatsapp",
            "created_at": Utc::now().to_rfc3339()
        })
    }

    pub fn unique_violation_response() -> Value {
        json!({
            "code": "23505",
            "details": "Key already exists.",
            "hint": null,
            "message": "duplicate key value violates unique constraint \"appointments_active_slot_key\""
        })
    }

    pub fn error_response(message: &str, code: &str) -> Value {
        json!({
            "message": message,
            "code": code
        })
    }
}
