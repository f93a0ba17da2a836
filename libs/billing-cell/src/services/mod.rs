pub mod ledger;
pub mod payment_provider;
pub mod signature;
pub mod subscription;
pub mod webhook;

pub use ledger::{SupabaseWebhookLedger, WebhookLedger};
pub use payment_provider::{MercadoPagoGateway, PaymentGateway};
pub use signature::verify_signature;
pub use subscription::{SubscriptionStore, SupabaseSubscriptionStore};
pub use webhook::{PlanPricing, WebhookProcessor};
