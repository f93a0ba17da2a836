// =====================================================================================
// AUDIT SERVICE - APPEND-ONLY AUDIT TRAIL
// =====================================================================================

use std::sync::Arc;

use anyhow::{Context, Result};
use async_trait::async_trait;
use chrono::{DateTime, SecondsFormat, Utc};
use reqwest::Method;
use serde_json::{json, Value};
use tracing::{info, instrument, warn};

use shared_config::AppConfig;
use shared_database::SupabaseClient;

use crate::models::{AuditAction, AuditEntry, RateLimitKey};

#[async_trait]
pub trait AuditStore: Send + Sync {
    async fn append(&self, entry: &AuditEntry) -> Result<()>;

    /// Entries with `action` whose `key` column equals `subject`, created at or after `since`.
    async fn count_since(
        &self,
        action: AuditAction,
        key: RateLimitKey,
        subject: &str,
        since: DateTime<Utc>,
    ) -> Result<usize>;
}

pub struct SupabaseAuditStore {
    supabase: Arc<SupabaseClient>,
}

impl SupabaseAuditStore {
    pub fn new(config: &AppConfig) -> Self {
        Self::from_client(Arc::new(SupabaseClient::new(config)))
    }

    pub fn from_client(supabase: Arc<SupabaseClient>) -> Self {
        Self { supabase }
    }
}

#[async_trait]
impl AuditStore for SupabaseAuditStore {
    async fn append(&self, entry: &AuditEntry) -> Result<()> {
        let row = json!({
            "action": entry.action,
            "table_name": entry.table_name,
            "ip_address": entry.ip_address,
            "actor": entry.actor,
            "metadata": entry.metadata,
            "created_at": entry.created_at.to_rfc3339_opts(SecondsFormat::Millis, true),
        });

        let _: Vec<Value> = self
            .supabase
            .request_with_headers(
                Method::POST,
                "/rest/v1/audit_logs",
                None,
                Some(row),
                Some(SupabaseClient::prefer("return=representation")),
            )
            .await
            .with_context(|| format!("Failed to append audit entry {}", entry.action))?;

        Ok(())
    }

    async fn count_since(
        &self,
        action: AuditAction,
        key: RateLimitKey,
        subject: &str,
        since: DateTime<Utc>,
    ) -> Result<usize> {
        let path = format!(
            "/rest/v1/audit_logs?select=id&action=eq.{}&{}=eq.{}&created_at=gte.{}",
            action,
            key.column(),
            urlencoding::encode(subject),
            urlencoding::encode(&since.to_rfc3339_opts(SecondsFormat::Secs, true)),
        );

        let rows: Vec<Value> = self
            .supabase
            .request(Method::GET, &path, None, None)
            .await
            .with_context(|| format!("Failed to count {} entries", action))?;

        Ok(rows.len())
    }
}

pub struct AuditService {
    store: Arc<dyn AuditStore>,
}

impl AuditService {
    pub fn new(config: &AppConfig) -> Self {
        Self::with_store(Arc::new(SupabaseAuditStore::new(config)))
    }

    pub fn with_store(store: Arc<dyn AuditStore>) -> Self {
        Self { store }
    }

    #[instrument(skip(self, entry), fields(action = %entry.action))]
    pub async fn log_audit_entry(&self, entry: AuditEntry) -> Result<()> {
        // Mirror to structured logging before persisting
        self.log_to_tracing(&entry);
        self.store.append(&entry).await
    }

    fn log_to_tracing(&self, entry: &AuditEntry) {
        if entry.action.is_denial() {
            warn!(
                action = %entry.action,
                table_name = %entry.table_name,
                ip_address = ?entry.ip_address,
                actor = ?entry.actor,
                "AUDIT DENIED: {}", entry.action
            );
        } else {
            info!(
                action = %entry.action,
                table_name = %entry.table_name,
                ip_address = ?entry.ip_address,
                actor = ?entry.actor,
                "AUDIT: {}", entry.action
            );
        }
    }
}
