// libs/scheduling-cell/src/models.rs
use chrono::{NaiveDate, NaiveTime};
use serde::{Deserialize, Serialize, Serializer};
use thiserror::Error;
use uuid::Uuid;

use shared_models::time_of_day;

#[derive(Debug, Clone, Deserialize, Default)]
pub struct AvailabilityQuery {
    pub from: Option<NaiveDate>,
    pub days: Option<u32>,
}

/// Open slots for one calendar day, as published to the booking page.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DayAvailability {
    pub date: NaiveDate,
    #[serde(serialize_with = "serialize_slots")]
    pub slots: Vec<NaiveTime>,
}

impl DayAvailability {
    pub fn slot_labels(&self) -> Vec<String> {
        self.slots.iter().map(time_of_day::format).collect()
    }
}

#[allow(clippy::ptr_arg)]
fn serialize_slots<S>(slots: &Vec<NaiveTime>, serializer: S) -> Result<S::Ok, S::Error>
where
    S: Serializer,
{
    serializer.collect_seq(slots.iter().map(time_of_day::format))
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PublicAvailability {
    pub professional_id: Uuid,
    pub professional_name: String,
    pub days: Vec<DayAvailability>,
}

impl PublicAvailability {
    pub fn slots_on(&self, date: NaiveDate) -> Vec<String> {
        self.days
            .iter()
            .find(|day| day.date == date)
            .map(DayAvailability::slot_labels)
            .unwrap_or_default()
    }
}

#[derive(Error, Debug)]
pub enum SchedulingError {
    #[error("Professional not found")]
    ProfessionalNotFound,

    #[error("Invalid range: {0}")]
    InvalidRange(String),

    #[error("Data store error: {0}")]
    Store(#[from] anyhow::Error),
}
