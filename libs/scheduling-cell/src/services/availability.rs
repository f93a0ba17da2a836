// libs/scheduling-cell/src/services/availability.rs
use std::sync::Arc;

use chrono::{Datelike, Duration, NaiveDate, NaiveTime};
use tracing::{debug, instrument};
use uuid::Uuid;

use shared_config::AppConfig;
use shared_models::{DayRule, WeeklyAvailability};

use crate::models::{PublicAvailability, SchedulingError};
use crate::services::occupancy::{occupied_by_date, publishable_days};
use crate::services::store::{AvailabilityStore, SupabaseAvailabilityStore};

/// Fixed slot step. Service duration does not influence slot generation.
pub const SLOT_GRANULARITY_MINUTES: i64 = 60;
pub const DEFAULT_HORIZON_DAYS: u32 = 7;
pub const MAX_HORIZON_DAYS: u32 = 31;

/// `days` consecutive calendar dates starting at `from`.
pub fn upcoming_dates(from: NaiveDate, days: u32) -> Vec<NaiveDate> {
    from.iter_days().take(days as usize).collect()
}

/// Slot start times for one working-hours rule, walking `[start, end)` in fixed steps.
/// A slot starting at or after `end` is never produced.
pub fn candidate_slots(rule: &DayRule) -> Vec<NaiveTime> {
    if !rule.active {
        return Vec::new();
    }

    let step = Duration::minutes(SLOT_GRANULARITY_MINUTES);
    let mut slots = Vec::new();
    let mut current = rule.start;

    while current < rule.end {
        slots.push(current);

        let (next, wrapped_secs) = current.overflowing_add_signed(step);
        if wrapped_secs != 0 {
            break;
        }
        current = next;
    }

    slots
}

pub fn candidate_slots_for_dates(
    weekly: &WeeklyAvailability,
    dates: &[NaiveDate],
) -> Vec<(NaiveDate, Vec<NaiveTime>)> {
    dates
        .iter()
        .map(|date| (*date, candidate_slots(weekly.rule_for(date.weekday()))))
        .collect()
}

/// Whether `time` is a slot the professional's working hours produce on `date`.
pub fn is_candidate_slot(weekly: &WeeklyAvailability, date: NaiveDate, time: NaiveTime) -> bool {
    candidate_slots(weekly.rule_for(date.weekday())).contains(&time)
}

pub struct AvailabilityService {
    store: Arc<dyn AvailabilityStore>,
}

impl AvailabilityService {
    pub fn new(config: &AppConfig) -> Self {
        Self::with_store(Arc::new(SupabaseAvailabilityStore::new(config)))
    }

    pub fn with_store(store: Arc<dyn AvailabilityStore>) -> Self {
        Self { store }
    }

    /// Open slots per date for the public booking page. Read-only.
    #[instrument(skip(self))]
    pub async fn get_public_availability(
        &self,
        professional_id: Uuid,
        from: NaiveDate,
        days: u32,
    ) -> Result<PublicAvailability, SchedulingError> {
        if days == 0 || days > MAX_HORIZON_DAYS {
            return Err(SchedulingError::InvalidRange(format!(
                "days must be between 1 and {}",
                MAX_HORIZON_DAYS
            )));
        }

        let professional = self
            .store
            .find_professional(professional_id)
            .await?
            .ok_or(SchedulingError::ProfessionalNotFound)?;

        let dates = upcoming_dates(from, days);
        let candidates = candidate_slots_for_dates(&professional.weekly_availability(), &dates);

        let has_candidates = candidates.iter().any(|(_, slots)| !slots.is_empty());
        let days = match (has_candidates, dates.first(), dates.last()) {
            (true, Some(first), Some(last)) => {
                let appointments = self
                    .store
                    .list_appointments_between(professional_id, *first, *last)
                    .await?;
                publishable_days(candidates, &occupied_by_date(&appointments))
            }
            _ => Vec::new(),
        };

        debug!(
            professional_id = %professional_id,
            open_days = days.len(),
            "Computed public availability"
        );

        Ok(PublicAvailability {
            professional_id,
            professional_name: professional.display_name().to_string(),
            days,
        })
    }
}
