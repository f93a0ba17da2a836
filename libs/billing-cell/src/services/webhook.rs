// libs/billing-cell/src/services/webhook.rs
use std::sync::Arc;

use chrono::Utc;
use serde_json::Value;
use tracing::{error, info, instrument, warn};
use uuid::Uuid;

use shared_config::AppConfig;
use shared_database::SupabaseClient;

use crate::models::{
    PaymentDetails, WebhookError, WebhookEvent, WebhookHeaders, WebhookNotification, WebhookOutcome,
};
use crate::services::ledger::{SupabaseWebhookLedger, WebhookLedger};
use crate::services::payment_provider::{MercadoPagoGateway, PaymentGateway};
use crate::services::signature::verify_signature;
use crate::services::subscription::{SubscriptionStore, SupabaseSubscriptionStore};

#[derive(Debug, Clone)]
pub struct PlanPricing {
    pub premium_price: f64,
    pub epsilon: f64,
}

impl PlanPricing {
    pub fn from_config(config: &AppConfig) -> Self {
        Self {
            premium_price: config.premium_plan_price,
            epsilon: config.plan_price_epsilon,
        }
    }

    pub fn matches(&self, amount: f64) -> bool {
        (amount - self.premium_price).abs() <= self.epsilon
    }
}

pub struct WebhookProcessor {
    ledger: Arc<dyn WebhookLedger>,
    subscriptions: Arc<dyn SubscriptionStore>,
    gateway: Arc<dyn PaymentGateway>,
    secret: String,
    pricing: PlanPricing,
}

impl WebhookProcessor {
    pub fn new(config: &AppConfig) -> Result<Self, WebhookError> {
        let supabase = Arc::new(SupabaseClient::new(config));
        let gateway = MercadoPagoGateway::new(config).map_err(WebhookError::UpstreamUnavailable)?;

        Ok(Self::with_parts(
            config,
            Arc::new(SupabaseWebhookLedger::from_client(Arc::clone(&supabase))),
            Arc::new(SupabaseSubscriptionStore::from_client(supabase)),
            Arc::new(gateway),
        ))
    }

    pub fn with_parts(
        config: &AppConfig,
        ledger: Arc<dyn WebhookLedger>,
        subscriptions: Arc<dyn SubscriptionStore>,
        gateway: Arc<dyn PaymentGateway>,
    ) -> Self {
        Self {
            ledger,
            subscriptions,
            gateway,
            secret: config.payment_webhook_secret.clone(),
            pricing: PlanPricing::from_config(config),
        }
    }

    /// Verifies, deduplicates and applies one provider callback.
    #[instrument(skip(self, raw_body, headers))]
    pub async fn process(
        &self,
        raw_body: &[u8],
        headers: &WebhookHeaders,
    ) -> Result<WebhookOutcome, WebhookError> {
        let payload: Value = serde_json::from_slice(raw_body)
            .map_err(|_| WebhookError::InvalidPayload("body is not valid JSON".to_string()))?;
        let notification = WebhookNotification::from_value(&payload)?;

        if !verify_signature(raw_body, headers, &self.secret) {
            warn!(
                event_type = %notification.event_type,
                data_id = %notification.data_id,
                request_id = ?headers.request_id,
                "Rejected webhook with invalid signature"
            );
            return Err(WebhookError::SignatureInvalid);
        }

        let event_id = notification.event_id();

        if let Some(existing) = self.ledger.find(&event_id).await.map_err(WebhookError::Store)? {
            if existing.processed {
                info!(event_id = %event_id, "Webhook already processed");
                return Ok(WebhookOutcome::AlreadyProcessed);
            }
        }

        self.ledger
            .record_received(&WebhookEvent::received(&notification, payload))
            .await
            .map_err(WebhookError::Store)?;

        let result = self.apply(&notification).await;

        // Retryable failures leave the event open so the provider's redelivery gets another go
        let settled = match &result {
            Ok(_) => true,
            Err(err) => err.is_final(),
        };
        if settled {
            self.ledger
                .mark_processed(&event_id, Utc::now())
                .await
                .map_err(WebhookError::Store)?;
        }

        match &result {
            Ok(outcome) => info!(event_id = %event_id, outcome = ?outcome, "Webhook processed"),
            Err(err) if err.is_final() => warn!(event_id = %event_id, error = %err, "Payment rejected"),
            Err(err) => error!(event_id = %event_id, error = ?err, "Webhook processing failed"),
        }

        result
    }

    async fn apply(&self, notification: &WebhookNotification) -> Result<WebhookOutcome, WebhookError> {
        if !notification.is_payment() {
            return Ok(WebhookOutcome::Ignored(format!(
                "event type {}",
                notification.event_type
            )));
        }

        let payment = self
            .gateway
            .fetch_payment(&notification.data_id)
            .await
            .map_err(WebhookError::UpstreamUnavailable)?;

        if !payment.is_approved() {
            return Ok(WebhookOutcome::Ignored(format!("payment status {}", payment.status)));
        }

        let professional_id = self.authorize(&payment).await?;

        self.subscriptions
            .promote_to_premium(professional_id)
            .await
            .map_err(WebhookError::Store)?;

        info!(professional_id = %professional_id, payment_id = %notification.data_id, "Plan upgraded to premium");
        Ok(WebhookOutcome::PlanUpgraded { professional_id })
    }

    /// The reference must name a real professional and the amount must be the plan price.
    async fn authorize(&self, payment: &PaymentDetails) -> Result<Uuid, WebhookError> {
        let reference = payment.external_reference.as_deref().unwrap_or_default().trim();
        let professional_id = Uuid::parse_str(reference)
            .map_err(|_| WebhookError::InvalidReference(reference.to_string()))?;

        let exists = self
            .subscriptions
            .professional_exists(professional_id)
            .await
            .map_err(WebhookError::Store)?;
        if !exists {
            return Err(WebhookError::InvalidReference(reference.to_string()));
        }

        match payment.transaction_amount {
            Some(amount) if self.pricing.matches(amount) => Ok(professional_id),
            actual => Err(WebhookError::AmountMismatch {
                expected: self.pricing.premium_price,
                actual,
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn price_matches_within_epsilon() {
        let pricing = PlanPricing { premium_price: 29.90, epsilon: 0.01 };
        assert!(pricing.matches(29.90));
        assert!(pricing.matches(29.895));
        assert!(!pricing.matches(29.80));
        assert!(!pricing.matches(0.0));
    }
}
