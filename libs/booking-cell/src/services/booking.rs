// libs/booking-cell/src/services/booking.rs
use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde_json::{json, Map, Value};
use tracing::{error, info, instrument, warn};

use scheduling_cell::services::availability::{is_candidate_slot, SLOT_GRANULARITY_MINUTES};
use security_cell::{AuditStore, RateLimitError, RateLimitPolicy, RateLimiter, SupabaseAuditStore};
use shared_config::AppConfig;
use shared_database::SupabaseClient;
use shared_models::{AppointmentStatus, NewAppointment, Professional, ReminderChannel, SubscriptionPlan};

use crate::models::{BookingConfirmation, BookingError, BookingSubmission, PublicBookingRequest};
use crate::services::identity::ClientIdentityResolver;
use crate::services::store::{BookingStore, SlotInsert, SupabaseBookingStore};

pub struct PublicBookingService {
    store: Arc<dyn BookingStore>,
    rate_limiter: RateLimiter,
    resolver: ClientIdentityResolver,
    free_plan_monthly_limit: u32,
}

impl PublicBookingService {
    pub fn new(config: &AppConfig) -> Self {
        let supabase = Arc::new(SupabaseClient::new(config));
        Self::with_stores(
            config,
            Arc::new(SupabaseBookingStore::from_client(Arc::clone(&supabase))),
            Arc::new(SupabaseAuditStore::from_client(supabase)),
        )
    }

    pub fn with_stores(
        config: &AppConfig,
        store: Arc<dyn BookingStore>,
        audit_store: Arc<dyn AuditStore>,
    ) -> Self {
        Self {
            resolver: ClientIdentityResolver::new(Arc::clone(&store), config.default_country_code.clone()),
            rate_limiter: RateLimiter::with_store(audit_store, RateLimitPolicy::public_booking()),
            store,
            free_plan_monthly_limit: config.free_plan_monthly_limit,
        }
    }

    /// Admits an anonymous booking: throttle, resolve the client, then claim the slot.
    #[instrument(skip(self, request))]
    pub async fn book(
        &self,
        request: PublicBookingRequest,
        client_ip: &str,
    ) -> Result<BookingConfirmation, BookingError> {
        let submission = request.validate()?;

        // Counted before anything else so failed attempts still consume quota
        self.rate_limiter
            .check_and_record(client_ip, attempt_context(&submission))
            .await
            .map_err(|e| match e {
                RateLimitError::Limited { .. } => BookingError::RateLimited,
                RateLimitError::Store(err) => BookingError::AuditPersistence(err),
            })?;

        let professional = self
            .store
            .find_professional(submission.professional_id)
            .await
            .map_err(BookingError::ProfessionalLookup)?
            .ok_or(BookingError::ProfessionalNotFound)?;

        if !is_candidate_slot(&professional.weekly_availability(), submission.date, submission.time) {
            warn!(
                professional_id = %professional.id,
                date = %submission.date,
                time = %submission.time,
                "Requested time is not an offered slot"
            );
            return Err(BookingError::OutsideWorkingHours);
        }

        self.ensure_plan_allows(&professional, Utc::now())?;

        let client = self
            .resolver
            .resolve(professional.id, &submission.contact)
            .await?;

        let existing = self
            .store
            .find_active_appointments_at(professional.id, submission.date, submission.time)
            .await
            .map_err(BookingError::AppointmentPersistence)?;
        if !existing.is_empty() {
            warn!(
                professional_id = %professional.id,
                date = %submission.date,
                time = %submission.time,
                "Slot already booked"
            );
            return Err(BookingError::SlotTaken);
        }

        let appointment = NewAppointment {
            professional_id: professional.id,
            client_id: client.client_id,
            date: submission.date,
            time: submission.time,
            duration_minutes: SLOT_GRANULARITY_MINUTES as i32,
            status: AppointmentStatus::Agendado,
            service: None,
            price: None,
            reminder_channel: ReminderChannel::Whatsapp,
        };

        let appointment = match self
            .store
            .insert_appointment_if_free(&appointment)
            .await
            .map_err(BookingError::AppointmentPersistence)?
        {
            SlotInsert::Inserted(appointment) => appointment,
            SlotInsert::SlotTaken => {
                warn!(
                    professional_id = %professional.id,
                    date = %submission.date,
                    time = %submission.time,
                    "Lost the race for the slot"
                );
                return Err(BookingError::SlotTaken);
            }
        };

        // The appointment stands even if the usage counter lags behind.
        if let Err(err) = self.store.increment_monthly_appointments(professional.id).await {
            error!(professional_id = %professional.id, error = ?err, "Failed to bump monthly appointment count");
        }

        info!(
            appointment_id = %appointment.id,
            professional_id = %professional.id,
            client_id = %client.client_id,
            new_client = client.created,
            "Public booking confirmed"
        );

        Ok(BookingConfirmation {
            success: true,
            appointment_id: appointment.id,
            professional_whatsapp: professional.whatsapp.clone(),
            professional_name: professional.display_name().to_string(),
            client_id: client.client_id,
        })
    }

    fn ensure_plan_allows(&self, professional: &Professional, now: DateTime<Utc>) -> Result<(), BookingError> {
        match professional.effective_plan(now) {
            SubscriptionPlan::Free
                if i64::from(professional.monthly_appointment_count) >= i64::from(self.free_plan_monthly_limit) =>
            {
                warn!(
                    professional_id = %professional.id,
                    count = professional.monthly_appointment_count,
                    limit = self.free_plan_monthly_limit,
                    "Free plan monthly limit reached"
                );
                Err(BookingError::PlanLimitReached)
            }
            _ => Ok(()),
        }
    }
}

fn attempt_context(submission: &BookingSubmission) -> Map<String, Value> {
    let mut context = Map::new();
    context.insert("professional_id".to_string(), json!(submission.professional_id));
    context.insert("date".to_string(), json!(submission.date));
    context.insert("time".to_string(), json!(submission.time.format("%H:%M").to_string()));
    context
}
