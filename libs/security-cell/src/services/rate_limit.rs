// =====================================================================================
// RATE LIMITER - SLIDING WINDOW COUNTED FROM THE AUDIT TRAIL
// =====================================================================================

use std::sync::Arc;

use chrono::Utc;
use serde_json::{Map, Value};
use tracing::{error, instrument, warn};

use shared_config::AppConfig;

use crate::models::{AuditAction, AuditEntry, RateLimitError, RateLimitKey, RateLimitPolicy};
use crate::services::audit::{AuditService, AuditStore, SupabaseAuditStore};

pub struct RateLimiter {
    audit: AuditService,
    store: Arc<dyn AuditStore>,
    policy: RateLimitPolicy,
}

impl RateLimiter {
    pub fn new(config: &AppConfig, policy: RateLimitPolicy) -> Self {
        Self::with_store(Arc::new(SupabaseAuditStore::new(config)), policy)
    }

    pub fn with_store(store: Arc<dyn AuditStore>, policy: RateLimitPolicy) -> Self {
        Self {
            audit: AuditService::with_store(Arc::clone(&store)),
            store,
            policy,
        }
    }

    /// Counts prior attempts by `subject` in the trailing window. At the limit, records a
    /// blocked entry and refuses; otherwise records the attempt before the caller proceeds,
    /// so attempts that later fail for other reasons still count.
    #[instrument(skip(self, context), fields(attempt_action = %self.policy.attempt_action))]
    pub async fn check_and_record(
        &self,
        subject: &str,
        context: Map<String, Value>,
    ) -> Result<(), RateLimitError> {
        let since = Utc::now() - self.policy.window;
        let attempts = self
            .store
            .count_since(self.policy.attempt_action, self.policy.key, subject, since)
            .await?;

        if attempts >= self.policy.max_attempts {
            warn!(
                subject = %subject,
                attempts,
                max_attempts = self.policy.max_attempts,
                "Rate limit reached"
            );

            let blocked = self
                .entry_for(self.policy.blocked_action, subject)
                .with_metadata(context)
                .add_context("attempts", attempts);
            if let Err(err) = self.audit.log_audit_entry(blocked).await {
                error!(subject = %subject, error = ?err, "Failed to record blocked attempt");
            }

            return Err(RateLimitError::Limited {
                subject: subject.to_string(),
                retry_after: self.policy.window,
            });
        }

        let attempt = self
            .entry_for(self.policy.attempt_action, subject)
            .with_metadata(context);
        self.audit.log_audit_entry(attempt).await?;

        Ok(())
    }

    fn entry_for(&self, action: AuditAction, subject: &str) -> AuditEntry {
        let entry = AuditEntry::new(action, self.policy.table_name);
        match self.policy.key {
            RateLimitKey::IpAddress => entry.with_ip(subject),
            RateLimitKey::Actor => entry.with_actor(subject),
        }
    }
}
