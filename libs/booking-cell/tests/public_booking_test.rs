// libs/booking-cell/tests/public_booking_test.rs
//
// Drives the booking pipeline and the availability query against one in-memory
// backend that enforces the same slot uniqueness as the database index.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use anyhow::Result;
use assert_matches::assert_matches;
use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, NaiveTime, Utc, Weekday};
use uuid::Uuid;

use booking_cell::{BookingError, BookingStore, PublicBookingRequest, PublicBookingService, SlotInsert};
use scheduling_cell::{AvailabilityService, AvailabilityStore};
use security_cell::{AuditAction, AuditEntry, AuditStore, RateLimitKey};
use shared_config::AppConfig;
use shared_models::{
    Appointment, AppointmentStatus, Client, ClientContact, DayRule, NewAppointment, Professional,
    ReminderChannel, SubscriptionPlan, WeeklyAvailability,
};

const MONDAY: &str = "2026-10-19";
const TUESDAY: &str = "2026-10-20";

// ==============================================================================
// IN-MEMORY BACKEND
// ==============================================================================

#[derive(Default)]
struct MemoryState {
    professionals: HashMap<Uuid, Professional>,
    clients: Vec<Client>,
    appointments: Vec<Appointment>,
    audit: Vec<AuditEntry>,
}

#[derive(Default)]
struct MemoryBackend {
    state: Mutex<MemoryState>,
    /// Re-check always sees an empty slot and yields, so concurrent bookings
    /// both reach the insert.
    stale_recheck: bool,
}

impl MemoryBackend {
    fn with_professional(professional: Professional) -> Self {
        let backend = Self::default();
        backend.state.lock().unwrap().professionals.insert(professional.id, professional);
        backend
    }

    fn racing(professional: Professional) -> Self {
        Self {
            stale_recheck: true,
            ..Self::with_professional(professional)
        }
    }

    fn seed_appointment(&self, appointment: Appointment) {
        self.state.lock().unwrap().appointments.push(appointment);
    }

    fn professional(&self, id: Uuid) -> Option<Professional> {
        self.state.lock().unwrap().professionals.get(&id).cloned()
    }

    fn clients(&self) -> Vec<Client> {
        self.state.lock().unwrap().clients.clone()
    }

    fn appointments(&self) -> Vec<Appointment> {
        self.state.lock().unwrap().appointments.clone()
    }

    fn audit_actions(&self) -> Vec<AuditAction> {
        self.state.lock().unwrap().audit.iter().map(|e| e.action).collect()
    }
}

fn occupies(appointment: &Appointment, professional_id: Uuid, date: NaiveDate, time: NaiveTime) -> bool {
    appointment.professional_id == professional_id
        && appointment.date == date
        && appointment.time == time
        && appointment.status.occupies_slot()
}

#[async_trait]
impl BookingStore for MemoryBackend {
    async fn find_professional(&self, professional_id: Uuid) -> Result<Option<Professional>> {
        Ok(self.professional(professional_id))
    }

    async fn list_clients(&self, professional_id: Uuid) -> Result<Vec<Client>> {
        Ok(self
            .clients()
            .into_iter()
            .filter(|c| c.professional_id == professional_id)
            .collect())
    }

    async fn insert_client(&self, professional_id: Uuid, contact: &ClientContact) -> Result<Client> {
        let client = Client {
            id: Uuid::new_v4(),
            professional_id,
            name: contact.name.clone(),
            email: contact.email.clone(),
            whatsapp: contact.whatsapp.clone(),
            created_at: Some(Utc::now()),
        };
        self.state.lock().unwrap().clients.push(client.clone());
        Ok(client)
    }

    async fn update_client(&self, client_id: Uuid, contact: &ClientContact) -> Result<()> {
        let mut state = self.state.lock().unwrap();
        if let Some(client) = state.clients.iter_mut().find(|c| c.id == client_id) {
            client.name = contact.name.clone();
            if contact.email.is_some() {
                client.email = contact.email.clone();
            }
            if contact.whatsapp.is_some() {
                client.whatsapp = contact.whatsapp.clone();
            }
        }
        Ok(())
    }

    async fn find_active_appointments_at(
        &self,
        professional_id: Uuid,
        date: NaiveDate,
        time: NaiveTime,
    ) -> Result<Vec<Appointment>> {
        if self.stale_recheck {
            tokio::task::yield_now().await;
            return Ok(Vec::new());
        }
        Ok(self
            .appointments()
            .into_iter()
            .filter(|a| occupies(a, professional_id, date, time))
            .collect())
    }

    async fn insert_appointment_if_free(&self, appointment: &NewAppointment) -> Result<SlotInsert> {
        let mut state = self.state.lock().unwrap();
        let taken = state.appointments.iter().any(|a| {
            occupies(a, appointment.professional_id, appointment.date, appointment.time)
        });
        if taken {
            return Ok(SlotInsert::SlotTaken);
        }

        let stored = Appointment {
            id: Uuid::new_v4(),
            professional_id: appointment.professional_id,
            client_id: appointment.client_id,
            date: appointment.date,
            time: appointment.time,
            duration_minutes: appointment.duration_minutes,
            status: appointment.status,
            service: appointment.service.clone(),
            price: appointment.price,
            reminder_channel: appointment.reminder_channel,
            created_at: Some(Utc::now()),
        };
        state.appointments.push(stored.clone());
        Ok(SlotInsert::Inserted(stored))
    }

    async fn increment_monthly_appointments(&self, professional_id: Uuid) -> Result<()> {
        if let Some(p) = self.state.lock().unwrap().professionals.get_mut(&professional_id) {
            p.monthly_appointment_count += 1;
        }
        Ok(())
    }
}

#[async_trait]
impl AvailabilityStore for MemoryBackend {
    async fn find_professional(&self, professional_id: Uuid) -> Result<Option<Professional>> {
        Ok(self.professional(professional_id))
    }

    async fn list_appointments_between(
        &self,
        professional_id: Uuid,
        from: NaiveDate,
        to: NaiveDate,
    ) -> Result<Vec<Appointment>> {
        Ok(self
            .appointments()
            .into_iter()
            .filter(|a| a.professional_id == professional_id && a.date >= from && a.date <= to)
            .collect())
    }
}

#[async_trait]
impl AuditStore for MemoryBackend {
    async fn append(&self, entry: &AuditEntry) -> Result<()> {
        self.state.lock().unwrap().audit.push(entry.clone());
        Ok(())
    }

    async fn count_since(
        &self,
        action: AuditAction,
        key: RateLimitKey,
        subject: &str,
        since: DateTime<Utc>,
    ) -> Result<usize> {
        Ok(self
            .state
            .lock()
            .unwrap()
            .audit
            .iter()
            .filter(|e| e.action == action && e.subject(key) == Some(subject) && e.created_at >= since)
            .count())
    }
}

// ==============================================================================
// HELPERS
// ==============================================================================

fn at(hour: u32) -> NaiveTime {
    NaiveTime::from_hms_opt(hour, 0, 0).unwrap()
}

fn day(raw: &str) -> NaiveDate {
    NaiveDate::parse_from_str(raw, "%Y-%m-%d").unwrap()
}

fn professional_with(plan: SubscriptionPlan, count: i32, monday: DayRule) -> Professional {
    Professional {
        id: Uuid::new_v4(),
        full_name: Some("Ana Souza".to_string()),
        whatsapp: Some("5511988887777".to_string()),
        availability: Some(WeeklyAvailability::default().with_rule(Weekday::Mon, monday)),
        plan,
        subscription_status: None,
        trial_ends_at: None,
        monthly_appointment_count: count,
    }
}

fn professional() -> Professional {
    professional_with(SubscriptionPlan::Premium, 0, DayRule::new(at(9), at(11), true))
}

fn request(professional_id: Uuid, date: &str, time: &str, name: &str, whatsapp: Option<&str>) -> PublicBookingRequest {
    PublicBookingRequest {
        user_id: professional_id.to_string(),
        client_name: name.to_string(),
        client_email: None,
        client_whatsapp: whatsapp.map(str::to_string),
        selected_date: date.to_string(),
        selected_time: time.to_string(),
    }
}

fn services(backend: &Arc<MemoryBackend>) -> (PublicBookingService, AvailabilityService) {
    let config = AppConfig::default();
    (
        PublicBookingService::with_stores(&config, backend.clone(), backend.clone()),
        AvailabilityService::with_store(backend.clone()),
    )
}

// ==============================================================================
// TESTS
// ==============================================================================

#[tokio::test]
async fn booked_slot_disappears_from_public_availability() {
    let pro = professional();
    let backend = Arc::new(MemoryBackend::with_professional(pro.clone()));
    let (booking, availability) = services(&backend);

    let before = availability.get_public_availability(pro.id, day(MONDAY), 1).await.unwrap();
    assert_eq!(before.slots_on(day(MONDAY)), vec!["09:00", "10:00"]);

    let confirmation = booking
        .book(request(pro.id, MONDAY, "09:00", "Maria Silva", Some("(11) 98888-7777")), "203.0.113.7")
        .await
        .unwrap();

    assert!(confirmation.success);
    assert_eq!(confirmation.professional_name, "Ana Souza");
    assert_eq!(confirmation.professional_whatsapp.as_deref(), Some("5511988887777"));

    let after = availability.get_public_availability(pro.id, day(MONDAY), 1).await.unwrap();
    assert_eq!(after.slots_on(day(MONDAY)), vec!["10:00"]);

    let appointments = backend.appointments();
    assert_eq!(appointments.len(), 1);
    assert_eq!(appointments[0].id, confirmation.appointment_id);
    assert_eq!(appointments[0].client_id, confirmation.client_id);
    assert_eq!(appointments[0].status, AppointmentStatus::Agendado);
    assert_eq!(appointments[0].duration_minutes, 60);
    assert_eq!(appointments[0].reminder_channel, ReminderChannel::Whatsapp);
    assert_eq!(backend.professional(pro.id).unwrap().monthly_appointment_count, 1);
}

#[tokio::test]
async fn repeat_client_is_recognised_across_phone_formats() {
    let pro = professional();
    let backend = Arc::new(MemoryBackend::with_professional(pro.clone()));
    let (booking, _) = services(&backend);

    let first = booking
        .book(request(pro.id, MONDAY, "09:00", "Maria", Some("(11) 98888-7777")), "203.0.113.7")
        .await
        .unwrap();
    let second = booking
        .book(request(pro.id, MONDAY, "10:00", "Maria Silva", Some("+55 11 98888-7777")), "203.0.113.7")
        .await
        .unwrap();

    assert_eq!(first.client_id, second.client_id);

    let clients = backend.clients();
    assert_eq!(clients.len(), 1);
    assert_eq!(clients[0].name, "Maria Silva");
    assert_eq!(clients[0].whatsapp.as_deref(), Some("11988887777"));
}

#[tokio::test]
async fn unmatched_name_only_submission_creates_one_client() {
    let pro = professional();
    let backend = Arc::new(MemoryBackend::with_professional(pro.clone()));
    let (booking, _) = services(&backend);

    booking
        .book(request(pro.id, MONDAY, "09:00", "Joana", Some("11911112222")), "203.0.113.7")
        .await
        .unwrap();
    let confirmation = booking
        .book(request(pro.id, MONDAY, "10:00", "Maria", None), "203.0.113.7")
        .await
        .unwrap();

    let clients = backend.clients();
    assert_eq!(clients.len(), 2);
    assert!(clients.iter().any(|c| c.id == confirmation.client_id && c.name == "Maria"));
}

#[tokio::test]
async fn sixth_attempt_within_the_hour_is_refused() {
    let pro = professional_with(SubscriptionPlan::Premium, 0, DayRule::new(at(8), at(18), true));
    let backend = Arc::new(MemoryBackend::with_professional(pro.clone()));
    let (booking, _) = services(&backend);

    for hour in 8..13 {
        let time = format!("{:02}:00", hour);
        booking
            .book(request(pro.id, MONDAY, &time, "Maria", Some("11988887777")), "203.0.113.7")
            .await
            .unwrap();
    }

    let refused = booking
        .book(request(pro.id, MONDAY, "14:00", "Maria", Some("11988887777")), "203.0.113.7")
        .await;
    assert_matches!(refused, Err(BookingError::RateLimited));

    let actions = backend.audit_actions();
    assert_eq!(actions.iter().filter(|a| **a == AuditAction::PublicBookingAttempt).count(), 5);
    assert_eq!(actions.iter().filter(|a| **a == AuditAction::PublicBookingBlocked).count(), 1);
    assert_eq!(backend.appointments().len(), 5);

    // Another address is unaffected.
    booking
        .book(request(pro.id, MONDAY, "14:00", "Joana", Some("11911112222")), "198.51.100.4")
        .await
        .unwrap();
}

#[tokio::test]
async fn failed_attempts_still_consume_quota() {
    let pro = professional();
    let backend = Arc::new(MemoryBackend::with_professional(pro.clone()));
    let (booking, _) = services(&backend);

    booking
        .book(request(pro.id, MONDAY, "09:00", "Maria", None), "203.0.113.7")
        .await
        .unwrap();
    for _ in 0..4 {
        let taken = booking
            .book(request(pro.id, MONDAY, "09:00", "Joana", None), "203.0.113.7")
            .await;
        assert_matches!(taken, Err(BookingError::SlotTaken));
    }

    let refused = booking
        .book(request(pro.id, MONDAY, "10:00", "Joana", None), "203.0.113.7")
        .await;
    assert_matches!(refused, Err(BookingError::RateLimited));
}

#[tokio::test]
async fn invalid_submission_is_rejected_before_being_counted() {
    let pro = professional();
    let backend = Arc::new(MemoryBackend::with_professional(pro.clone()));
    let (booking, _) = services(&backend);

    let result = booking
        .book(request(pro.id, "19-10-2026", "09:00", "Maria", None), "203.0.113.7")
        .await;

    assert_matches!(result, Err(BookingError::Validation(_)));
    assert!(backend.audit_actions().is_empty());
}

#[tokio::test]
async fn concurrent_bookings_for_one_slot_admit_exactly_one() {
    let pro = professional();
    let backend = Arc::new(MemoryBackend::racing(pro.clone()));
    let (booking, _) = services(&backend);

    let (first, second) = tokio::join!(
        booking.book(request(pro.id, MONDAY, "09:00", "Maria", Some("11988887777")), "203.0.113.7"),
        booking.book(request(pro.id, MONDAY, "09:00", "Joana", Some("11911112222")), "198.51.100.4"),
    );

    let outcomes = [first, second];
    assert_eq!(outcomes.iter().filter(|r| r.is_ok()).count(), 1);
    assert_eq!(
        outcomes
            .iter()
            .filter(|r| matches!(r, Err(BookingError::SlotTaken)))
            .count(),
        1
    );
    assert_eq!(backend.appointments().len(), 1);
}

#[tokio::test]
async fn recheck_refuses_an_already_booked_slot() {
    let pro = professional();
    let backend = Arc::new(MemoryBackend::with_professional(pro.clone()));
    let (booking, _) = services(&backend);

    booking
        .book(request(pro.id, MONDAY, "10:00", "Maria", None), "203.0.113.7")
        .await
        .unwrap();
    let second = booking
        .book(request(pro.id, MONDAY, "10:00", "Joana", None), "198.51.100.4")
        .await;

    assert_matches!(second, Err(BookingError::SlotTaken));
    assert_eq!(backend.appointments().len(), 1);
}

#[tokio::test]
async fn cancelled_appointment_frees_its_slot() {
    let pro = professional();
    let backend = Arc::new(MemoryBackend::with_professional(pro.clone()));
    backend.seed_appointment(Appointment {
        id: Uuid::new_v4(),
        professional_id: pro.id,
        client_id: Uuid::new_v4(),
        date: day(MONDAY),
        time: at(9),
        duration_minutes: 60,
        status: AppointmentStatus::Cancelado,
        service: None,
        price: None,
        reminder_channel: ReminderChannel::Whatsapp,
        created_at: None,
    });
    let (booking, availability) = services(&backend);

    let open = availability.get_public_availability(pro.id, day(MONDAY), 1).await.unwrap();
    assert_eq!(open.slots_on(day(MONDAY)), vec!["09:00", "10:00"]);

    booking
        .book(request(pro.id, MONDAY, "09:00", "Maria", None), "203.0.113.7")
        .await
        .unwrap();
}

#[tokio::test]
async fn times_outside_working_hours_are_refused() {
    let pro = professional();
    let backend = Arc::new(MemoryBackend::with_professional(pro.clone()));
    let (booking, _) = services(&backend);

    let closed_day = booking
        .book(request(pro.id, TUESDAY, "09:00", "Maria", None), "203.0.113.7")
        .await;
    assert_matches!(closed_day, Err(BookingError::OutsideWorkingHours));

    let at_closing = booking
        .book(request(pro.id, MONDAY, "11:00", "Maria", None), "203.0.113.7")
        .await;
    assert_matches!(at_closing, Err(BookingError::OutsideWorkingHours));

    let off_grid = booking
        .book(request(pro.id, MONDAY, "09:30", "Maria", None), "203.0.113.7")
        .await;
    assert_matches!(off_grid, Err(BookingError::OutsideWorkingHours));

    assert!(backend.appointments().is_empty());
}

#[tokio::test]
async fn unknown_professional_is_not_found() {
    let backend = Arc::new(MemoryBackend::default());
    let (booking, _) = services(&backend);

    let result = booking
        .book(request(Uuid::new_v4(), MONDAY, "09:00", "Maria", None), "203.0.113.7")
        .await;

    assert_matches!(result, Err(BookingError::ProfessionalNotFound));
}

#[tokio::test]
async fn free_plan_stops_at_the_monthly_limit() {
    let rule = DayRule::new(at(9), at(11), true);

    let capped = professional_with(SubscriptionPlan::Free, 50, rule.clone());
    let backend = Arc::new(MemoryBackend::with_professional(capped.clone()));
    let (booking, _) = services(&backend);
    let result = booking
        .book(request(capped.id, MONDAY, "09:00", "Maria", None), "203.0.113.7")
        .await;
    assert_matches!(result, Err(BookingError::PlanLimitReached));
    assert!(backend.clients().is_empty());

    let mut expired_trial = professional_with(SubscriptionPlan::Trial, 50, rule.clone());
    expired_trial.trial_ends_at = Some(Utc::now() - chrono::Duration::days(1));
    let backend = Arc::new(MemoryBackend::with_professional(expired_trial.clone()));
    let (booking, _) = services(&backend);
    let result = booking
        .book(request(expired_trial.id, MONDAY, "09:00", "Maria", None), "203.0.113.7")
        .await;
    assert_matches!(result, Err(BookingError::PlanLimitReached));

    let premium = professional_with(SubscriptionPlan::Premium, 500, rule);
    let backend = Arc::new(MemoryBackend::with_professional(premium.clone()));
    let (booking, _) = services(&backend);
    booking
        .book(request(premium.id, MONDAY, "09:00", "Maria", None), "203.0.113.7")
        .await
        .unwrap();
    assert_eq!(backend.professional(premium.id).unwrap().monthly_appointment_count, 501);
}

#[tokio::test]
async fn free_plan_limit_above_i32_range_admits_bookings() {
    let free = professional_with(SubscriptionPlan::Free, 50, DayRule::new(at(9), at(11), true));
    let backend = Arc::new(MemoryBackend::with_professional(free.clone()));
    let config = AppConfig {
        free_plan_monthly_limit: u32::MAX,
        ..AppConfig::default()
    };
    let booking = PublicBookingService::with_stores(&config, backend.clone(), backend.clone());

    booking
        .book(request(free.id, MONDAY, "09:00", "Maria", None), "203.0.113.7")
        .await
        .unwrap();
    assert_eq!(backend.professional(free.id).unwrap().monthly_appointment_count, 51);
}
