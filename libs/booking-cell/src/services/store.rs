// libs/booking-cell/src/services/store.rs
use std::sync::Arc;

use anyhow::{anyhow, Context, Result};
use async_trait::async_trait;
use chrono::{NaiveDate, NaiveTime};
use reqwest::Method;
use serde_json::{json, Map, Value};
use uuid::Uuid;

use shared_config::AppConfig;
use shared_database::SupabaseClient;
use shared_models::{Appointment, Client, ClientContact, NewAppointment, Professional};

/// Outcome of the conditional appointment insert.
#[derive(Debug, Clone)]
pub enum SlotInsert {
    Inserted(Appointment),
    /// Another non-cancelled appointment already holds the slot.
    SlotTaken,
}

/// Everything the public booking pipeline reads and writes, besides the audit trail.
#[async_trait]
pub trait BookingStore: Send + Sync {
    async fn find_professional(&self, professional_id: Uuid) -> Result<Option<Professional>>;

    async fn list_clients(&self, professional_id: Uuid) -> Result<Vec<Client>>;

    async fn insert_client(&self, professional_id: Uuid, contact: &ClientContact) -> Result<Client>;

    /// Overwrites the name and any contact channel present in `contact`.
    /// Channels that are `None` keep their stored value.
    async fn update_client(&self, client_id: Uuid, contact: &ClientContact) -> Result<()>;

    /// Non-cancelled appointments at exactly this date and start time.
    async fn find_active_appointments_at(
        &self,
        professional_id: Uuid,
        date: NaiveDate,
        time: NaiveTime,
    ) -> Result<Vec<Appointment>>;

    /// Inserts unless a non-cancelled appointment holds the same
    /// (professional, date, time). The check and the write are one atomic step.
    async fn insert_appointment_if_free(&self, appointment: &NewAppointment) -> Result<SlotInsert>;

    async fn increment_monthly_appointments(&self, professional_id: Uuid) -> Result<()>;
}

pub struct SupabaseBookingStore {
    supabase: Arc<SupabaseClient>,
}

impl SupabaseBookingStore {
    pub fn new(config: &AppConfig) -> Self {
        Self::from_client(Arc::new(SupabaseClient::new(config)))
    }

    pub fn from_client(supabase: Arc<SupabaseClient>) -> Self {
        Self { supabase }
    }
}

fn client_update_body(contact: &ClientContact) -> Value {
    let mut body = Map::new();
    body.insert("name".to_string(), json!(contact.name));
    if let Some(email) = &contact.email {
        body.insert("email".to_string(), json!(email));
    }
    if let Some(whatsapp) = &contact.whatsapp {
        body.insert("whatsapp".to_string(), json!(whatsapp));
    }
    Value::Object(body)
}

#[async_trait]
impl BookingStore for SupabaseBookingStore {
    async fn find_professional(&self, professional_id: Uuid) -> Result<Option<Professional>> {
        let path = format!("/rest/v1/profiles?id=eq.{}&select=*", professional_id);

        let rows: Vec<Professional> = self
            .supabase
            .request(Method::GET, &path, None, None)
            .await
            .with_context(|| format!("Failed to load professional {}", professional_id))?;

        Ok(rows.into_iter().next())
    }

    async fn list_clients(&self, professional_id: Uuid) -> Result<Vec<Client>> {
        let path = format!(
            "/rest/v1/clients?professional_id=eq.{}&select=id,professional_id,name,email,whatsapp,created_at&order=created_at.asc",
            professional_id
        );

        let clients: Vec<Client> = self
            .supabase
            .request(Method::GET, &path, None, None)
            .await
            .with_context(|| format!("Failed to list clients for {}", professional_id))?;

        Ok(clients)
    }

    async fn insert_client(&self, professional_id: Uuid, contact: &ClientContact) -> Result<Client> {
        let body = json!({
            "professional_id": professional_id,
            "name": contact.name,
            "email": contact.email,
            "whatsapp": contact.whatsapp,
        });

        let rows: Vec<Client> = self
            .supabase
            .request_with_headers(
                Method::POST,
                "/rest/v1/clients",
                None,
                Some(body),
                Some(SupabaseClient::prefer("return=representation")),
            )
            .await
            .context("Failed to insert client")?;

        rows.into_iter()
            .next()
            .ok_or_else(|| anyhow!("Client insert returned no row"))
    }

    async fn update_client(&self, client_id: Uuid, contact: &ClientContact) -> Result<()> {
        let path = format!("/rest/v1/clients?id=eq.{}", client_id);

        let _: Vec<Value> = self
            .supabase
            .request_with_headers(
                Method::PATCH,
                &path,
                None,
                Some(client_update_body(contact)),
                Some(SupabaseClient::prefer("return=representation")),
            )
            .await
            .with_context(|| format!("Failed to update client {}", client_id))?;

        Ok(())
    }

    async fn find_active_appointments_at(
        &self,
        professional_id: Uuid,
        date: NaiveDate,
        time: NaiveTime,
    ) -> Result<Vec<Appointment>> {
        let path = format!(
            "/rest/v1/appointments?professional_id=eq.{}&date=eq.{}&time=eq.{}&status=neq.cancelado",
            professional_id,
            date,
            time.format("%H:%M:%S")
        );

        let appointments: Vec<Appointment> = self
            .supabase
            .request(Method::GET, &path, None, None)
            .await
            .context("Failed to re-check slot")?;

        Ok(appointments)
    }

    async fn insert_appointment_if_free(&self, appointment: &NewAppointment) -> Result<SlotInsert> {
        // The partial unique index on (professional_id, date, time) where status <> 'cancelado'
        // rejects the losing writer with 23505, which the client maps to Conflict.
        let body = serde_json::to_value(appointment).context("Failed to encode appointment")?;

        let result: shared_database::DbResult<Vec<Appointment>> = self
            .supabase
            .request_with_headers(
                Method::POST,
                "/rest/v1/appointments",
                None,
                Some(body),
                Some(SupabaseClient::prefer("return=representation")),
            )
            .await;

        match result {
            Ok(rows) => rows
                .into_iter()
                .next()
                .map(SlotInsert::Inserted)
                .ok_or_else(|| anyhow!("Appointment insert returned no row")),
            Err(err) if err.is_conflict() => Ok(SlotInsert::SlotTaken),
            Err(err) => Err(anyhow::Error::new(err).context("Failed to insert appointment")),
        }
    }

    async fn increment_monthly_appointments(&self, professional_id: Uuid) -> Result<()> {
        let body = json!({ "p_professional_id": professional_id });

        let _: Value = self
            .supabase
            .request(
                Method::POST,
                "/rest/v1/rpc/increment_monthly_appointments",
                None,
                Some(body),
            )
            .await
            .with_context(|| format!("Failed to bump appointment counter for {}", professional_id))?;

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use shared_models::time_of_day;

    #[test]
    fn update_body_keeps_absent_channels() {
        let body = client_update_body(&ClientContact {
            name: "Maria Silva".into(),
            email: None,
            whatsapp: Some("11988887777".into()),
        });

        assert_eq!(body["name"], "Maria Silva");
        assert_eq!(body["whatsapp"], "11988887777");
        assert!(body.get("email").is_none());
    }

    #[test]
    fn slot_time_is_rendered_for_postgres() {
        let time = time_of_day::parse("09:00").unwrap();
        assert_eq!(time.format("%H:%M:%S").to_string(), "09:00:00");
    }
}
