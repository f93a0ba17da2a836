// =====================================================================================
// BILLING CELL - PAYMENT PROVIDER WEBHOOKS
// =====================================================================================
//
// Verifies provider callbacks, records them in an idempotency ledger, re-fetches the
// payment from the provider and promotes the paying professional to the premium plan.
//
// =====================================================================================

pub mod handlers;
pub mod models;
pub mod router;
pub mod services;

pub use models::{PaymentDetails, WebhookError, WebhookEvent, WebhookHeaders, WebhookNotification, WebhookOutcome};
pub use router::billing_routes;
pub use services::{
    MercadoPagoGateway, PaymentGateway, SubscriptionStore, SupabaseSubscriptionStore, SupabaseWebhookLedger,
    WebhookLedger, WebhookProcessor,
};
