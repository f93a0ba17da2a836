// libs/billing-cell/src/services/ledger.rs
use std::sync::Arc;

use anyhow::{Context, Result};
use async_trait::async_trait;
use chrono::{DateTime, SecondsFormat, Utc};
use reqwest::Method;
use serde_json::{json, Value};

use shared_config::AppConfig;
use shared_database::SupabaseClient;

use crate::models::WebhookEvent;

/// Idempotency ledger for provider callbacks.
#[async_trait]
pub trait WebhookLedger: Send + Sync {
    async fn find(&self, event_id: &str) -> Result<Option<WebhookEvent>>;

    /// Inserts the event unprocessed. An existing row with the same id is left untouched.
    async fn record_received(&self, event: &WebhookEvent) -> Result<()>;

    async fn mark_processed(&self, event_id: &str, processed_at: DateTime<Utc>) -> Result<()>;
}

pub struct SupabaseWebhookLedger {
    supabase: Arc<SupabaseClient>,
}

impl SupabaseWebhookLedger {
    pub fn new(config: &AppConfig) -> Self {
        Self::from_client(Arc::new(SupabaseClient::new(config)))
    }

    pub fn from_client(supabase: Arc<SupabaseClient>) -> Self {
        Self { supabase }
    }
}

#[async_trait]
impl WebhookLedger for SupabaseWebhookLedger {
    async fn find(&self, event_id: &str) -> Result<Option<WebhookEvent>> {
        let path = format!(
            "/rest/v1/webhook_events?id=eq.{}&select=id,event_type,payload,processed,processed_at",
            urlencoding::encode(event_id)
        );

        let rows: Vec<WebhookEvent> = self
            .supabase
            .request(Method::GET, &path, None, None)
            .await
            .with_context(|| format!("Failed to look up webhook event {}", event_id))?;

        Ok(rows.into_iter().next())
    }

    async fn record_received(&self, event: &WebhookEvent) -> Result<()> {
        let body = json!({
            "id": event.id,
            "event_type": event.event_type,
            "payload": event.payload,
            "processed": false,
        });

        let _: Vec<Value> = self
            .supabase
            .request_with_headers(
                Method::POST,
                "/rest/v1/webhook_events?on_conflict=id",
                None,
                Some(body),
                Some(SupabaseClient::prefer(
                    "resolution=ignore-duplicates,return=representation",
                )),
            )
            .await
            .with_context(|| format!("Failed to record webhook event {}", event.id))?;

        Ok(())
    }

    async fn mark_processed(&self, event_id: &str, processed_at: DateTime<Utc>) -> Result<()> {
        let path = format!("/rest/v1/webhook_events?id=eq.{}", urlencoding::encode(event_id));
        let body = json!({
            "processed": true,
            "processed_at": processed_at.to_rfc3339_opts(SecondsFormat::Millis, true),
        });

        let _: Vec<Value> = self
            .supabase
            .request_with_headers(
                Method::PATCH,
                &path,
                None,
                Some(body),
                Some(SupabaseClient::prefer("return=representation")),
            )
            .await
            .with_context(|| format!("Failed to mark webhook event {} processed", event_id))?;

        Ok(())
    }
}
