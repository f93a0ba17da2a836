// libs/scheduling-cell/src/services/occupancy.rs
use std::collections::{HashMap, HashSet};

use chrono::{NaiveDate, NaiveTime};

use shared_models::Appointment;

use crate::models::DayAvailability;

pub type OccupiedTimes = HashMap<NaiveDate, HashSet<NaiveTime>>;

/// Start times held by appointments that still occupy their slot, grouped by date.
pub fn occupied_by_date(appointments: &[Appointment]) -> OccupiedTimes {
    let mut occupied = OccupiedTimes::new();
    for appointment in appointments.iter().filter(|apt| apt.status.occupies_slot()) {
        occupied
            .entry(appointment.date)
            .or_default()
            .insert(appointment.time);
    }
    occupied
}

/// Candidates minus occupied start times. Exact time-of-day match only; an appointment's
/// duration does not reserve the following slots.
pub fn filter_occupied(candidates: &[NaiveTime], occupied: &HashSet<NaiveTime>) -> Vec<NaiveTime> {
    candidates
        .iter()
        .filter(|slot| !occupied.contains(*slot))
        .copied()
        .collect()
}

/// Applies the filter per date and drops dates left with no open slot.
pub fn publishable_days(
    candidates: Vec<(NaiveDate, Vec<NaiveTime>)>,
    occupied: &OccupiedTimes,
) -> Vec<DayAvailability> {
    let none = HashSet::new();

    candidates
        .into_iter()
        .filter_map(|(date, slots)| {
            let open = filter_occupied(&slots, occupied.get(&date).unwrap_or(&none));
            (!open.is_empty()).then_some(DayAvailability { date, slots: open })
        })
        .collect()
}
