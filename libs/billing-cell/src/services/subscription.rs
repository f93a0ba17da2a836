// libs/billing-cell/src/services/subscription.rs
use std::sync::Arc;

use anyhow::{Context, Result};
use async_trait::async_trait;
use reqwest::Method;
use serde_json::{json, Value};
use uuid::Uuid;

use shared_config::AppConfig;
use shared_database::SupabaseClient;
use shared_models::SubscriptionPlan;

#[async_trait]
pub trait SubscriptionStore: Send + Sync {
    async fn professional_exists(&self, professional_id: Uuid) -> Result<bool>;

    /// Sets the plan to premium with an active subscription.
    async fn promote_to_premium(&self, professional_id: Uuid) -> Result<()>;
}

pub struct SupabaseSubscriptionStore {
    supabase: Arc<SupabaseClient>,
}

impl SupabaseSubscriptionStore {
    pub fn new(config: &AppConfig) -> Self {
        Self::from_client(Arc::new(SupabaseClient::new(config)))
    }

    pub fn from_client(supabase: Arc<SupabaseClient>) -> Self {
        Self { supabase }
    }
}

#[async_trait]
impl SubscriptionStore for SupabaseSubscriptionStore {
    async fn professional_exists(&self, professional_id: Uuid) -> Result<bool> {
        let path = format!("/rest/v1/profiles?id=eq.{}&select=id", professional_id);

        let rows: Vec<Value> = self
            .supabase
            .request(Method::GET, &path, None, None)
            .await
            .with_context(|| format!("Failed to look up professional {}", professional_id))?;

        Ok(!rows.is_empty())
    }

    async fn promote_to_premium(&self, professional_id: Uuid) -> Result<()> {
        let path = format!("/rest/v1/profiles?id=eq.{}", professional_id);
        let body = json!({
            "plan": SubscriptionPlan::Premium,
            "subscription_status": "active",
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
            .with_context(|| format!("Failed to promote professional {}", professional_id))?;

        Ok(())
    }
}
