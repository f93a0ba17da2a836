// libs/billing-cell/src/services/payment_provider.rs
use std::time::Duration;

use anyhow::{bail, Context, Result};
use async_trait::async_trait;
use reqwest::Client;
use tracing::{debug, error};

use shared_config::AppConfig;

use crate::models::PaymentDetails;

#[async_trait]
pub trait PaymentGateway: Send + Sync {
    async fn fetch_payment(&self, payment_id: &str) -> Result<PaymentDetails>;
}

/// Mercado Pago payments API.
pub struct MercadoPagoGateway {
    client: Client,
    base_url: String,
    access_token: String,
}

impl MercadoPagoGateway {
    pub fn new(config: &AppConfig) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.payment_timeout_secs))
            .build()
            .context("Failed to build payment provider client")?;

        Ok(Self {
            client,
            base_url: config.payment_api_base_url.trim_end_matches('/').to_string(),
            access_token: config.payment_access_token.clone(),
        })
    }
}

#[async_trait]
impl PaymentGateway for MercadoPagoGateway {
    /// GET /v1/payments/{id}
    async fn fetch_payment(&self, payment_id: &str) -> Result<PaymentDetails> {
        let url = format!("{}/v1/payments/{}", self.base_url, urlencoding::encode(payment_id));
        debug!("Fetching payment details from {}", url);

        let response = self
            .client
            .get(&url)
            .bearer_auth(&self.access_token)
            .send()
            .await
            .with_context(|| format!("Payment provider request failed for {}", payment_id))?;

        let status = response.status();
        let body = response.text().await.context("Failed to read payment provider response")?;

        if !status.is_success() {
            error!("Payment provider error ({}): {}", status, body);
            bail!("Payment provider returned {} for payment {}", status, payment_id);
        }

        serde_json::from_str::<PaymentDetails>(&body)
            .with_context(|| format!("Malformed payment details for {}", payment_id))
    }
}
