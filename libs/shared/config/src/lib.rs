use std::env;
use std::str::FromStr;
use tracing::warn;

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub supabase_url: String,
    pub supabase_service_role_key: String,
    pub payment_webhook_secret: String,
    pub payment_access_token: String,
    pub payment_api_base_url: String,
    pub payment_timeout_secs: u64,
    pub premium_plan_price: f64,
    pub plan_price_epsilon: f64,
    pub free_plan_monthly_limit: u32,
    pub default_country_code: String,
    pub port: u16,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            supabase_url: String::new(),
            supabase_service_role_key: String::new(),
            payment_webhook_secret: String::new(),
            payment_access_token: String::new(),
            payment_api_base_url: "https://api.mercadopago.com".to_string(),
            payment_timeout_secs: 10,
            premium_plan_price: 29.90,
            plan_price_epsilon: 0.01,
            free_plan_monthly_limit: 50,
            default_country_code: "55".to_string(),
            port: 3000,
        }
    }
}

impl AppConfig {
    pub fn from_env() -> Self {
        let defaults = Self::default();

        let config = Self {
            supabase_url: required_var("SUPABASE_URL"),
            supabase_service_role_key: required_var("SUPABASE_SERVICE_ROLE_KEY"),
            payment_webhook_secret: required_var("PAYMENT_WEBHOOK_SECRET"),
            payment_access_token: required_var("PAYMENT_ACCESS_TOKEN"),
            payment_api_base_url: env::var("PAYMENT_API_BASE_URL")
                .unwrap_or(defaults.payment_api_base_url),
            payment_timeout_secs: parsed_var("PAYMENT_TIMEOUT_SECS", defaults.payment_timeout_secs),
            premium_plan_price: parsed_var("PREMIUM_PLAN_PRICE", defaults.premium_plan_price),
            plan_price_epsilon: parsed_var("PLAN_PRICE_EPSILON", defaults.plan_price_epsilon),
            free_plan_monthly_limit: parsed_var(
                "FREE_PLAN_MONTHLY_LIMIT",
                defaults.free_plan_monthly_limit,
            ),
            default_country_code: env::var("DEFAULT_COUNTRY_CODE")
                .unwrap_or(defaults.default_country_code),
            port: parsed_var("PORT", defaults.port),
        };

        if !config.is_configured() {
            warn!("Application not fully configured - missing data store credentials");
        }
        if !config.is_billing_configured() {
            warn!("Billing not configured - payment webhooks will be rejected");
        }

        config
    }

    pub fn is_configured(&self) -> bool {
        !self.supabase_url.is_empty() && !self.supabase_service_role_key.is_empty()
    }

    pub fn is_billing_configured(&self) -> bool {
        !self.payment_webhook_secret.is_empty() && !self.payment_access_token.is_empty()
    }
}

fn required_var(name: &str) -> String {
    env::var(name).unwrap_or_else(|_| {
        warn!("{} not set, using empty value", name);
        String::new()
    })
}

fn parsed_var<T: FromStr + Copy + std::fmt::Display>(name: &str, default: T) -> T {
    match env::var(name) {
        Ok(raw) => raw.trim().parse().unwrap_or_else(|_| {
            warn!("{} has invalid value {:?}, using default {}", name, raw, default);
            default
        }),
        Err(_) => default,
    }
}
