// libs/scheduling-cell/src/services/store.rs
use std::sync::Arc;

use anyhow::{Context, Result};
use async_trait::async_trait;
use chrono::NaiveDate;
use reqwest::Method;
use uuid::Uuid;

use shared_config::AppConfig;
use shared_database::SupabaseClient;
use shared_models::{Appointment, Professional};

/// Read side of the data store needed to publish availability.
#[async_trait]
pub trait AvailabilityStore: Send + Sync {
    async fn find_professional(&self, professional_id: Uuid) -> Result<Option<Professional>>;

    /// Appointments dated within `[from, to]` that still occupy their slot.
    async fn list_appointments_between(
        &self,
        professional_id: Uuid,
        from: NaiveDate,
        to: NaiveDate,
    ) -> Result<Vec<Appointment>>;
}

pub struct SupabaseAvailabilityStore {
    supabase: Arc<SupabaseClient>,
}

impl SupabaseAvailabilityStore {
    pub fn new(config: &AppConfig) -> Self {
        Self::from_client(Arc::new(SupabaseClient::new(config)))
    }

    pub fn from_client(supabase: Arc<SupabaseClient>) -> Self {
        Self { supabase }
    }
}

#[async_trait]
impl AvailabilityStore for SupabaseAvailabilityStore {
    async fn find_professional(&self, professional_id: Uuid) -> Result<Option<Professional>> {
        let path = format!("/rest/v1/profiles?id=eq.{}&select=*", professional_id);

        let rows: Vec<Professional> = self
            .supabase
            .request(Method::GET, &path, None, None)
            .await
            .with_context(|| format!("Failed to load professional {}", professional_id))?;

        Ok(rows.into_iter().next())
    }

    async fn list_appointments_between(
        &self,
        professional_id: Uuid,
        from: NaiveDate,
        to: NaiveDate,
    ) -> Result<Vec<Appointment>> {
        let path = format!(
            "/rest/v1/appointments?professional_id=eq.{}&date=gte.{}&date=lte.{}&status=neq.cancelado&order=date.asc,time.asc",
            professional_id, from, to
        );

        let appointments: Vec<Appointment> = self
            .supabase
            .request(Method::GET, &path, None, None)
            .await
            .with_context(|| format!("Failed to load appointments for {}", professional_id))?;

        Ok(appointments)
    }
}
