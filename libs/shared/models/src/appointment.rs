use chrono::{DateTime, NaiveDate, NaiveTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

use crate::time_of_day;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum AppointmentStatus {
    Agendado,
    Confirmado,
    Concluido,
    Cancelado,
}

impl AppointmentStatus {
    /// Every status except `cancelado` holds its slot.
    pub fn occupies_slot(&self) -> bool {
        !matches!(self, AppointmentStatus::Cancelado)
    }
}

impl fmt::Display for AppointmentStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AppointmentStatus::Agendado => write!(f, "agendado"),
            AppointmentStatus::Confirmado => write!(f, "confirmado"),
            AppointmentStatus::Concluido => write!(f, "concluido"),
            AppointmentStatus::Cancelado => write!(f, "cancelado"),
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum ReminderChannel {
    #[default]
    Whatsapp,
    Email,
    None,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Appointment {
    pub id: Uuid,
    pub professional_id: Uuid,
    pub client_id: Uuid,
    pub date: NaiveDate,
    #[serde(with = "time_of_day")]
    pub time: NaiveTime,
    pub duration_minutes: i32,
    pub status: AppointmentStatus,
    pub service: Option<String>,
    pub price: Option<f64>,
    #[serde(default)]
    pub reminder_channel: ReminderChannel,
    pub created_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewAppointment {
    pub professional_id: Uuid,
    pub client_id: Uuid,
    pub date: NaiveDate,
    #[serde(with = "time_of_day")]
    pub time: NaiveTime,
    pub duration_minutes: i32,
    pub status: AppointmentStatus,
    pub service: Option<String>,
    pub price: Option<f64>,
    pub reminder_channel: ReminderChannel,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn only_cancelled_frees_the_slot() {
        assert!(AppointmentStatus::Agendado.occupies_slot());
        assert!(AppointmentStatus::Confirmado.occupies_slot());
        assert!(AppointmentStatus::Concluido.occupies_slot());
        assert!(!AppointmentStatus::Cancelado.occupies_slot());
    }

    #[test]
    fn appointment_reads_postgres_time_column() {
        let appointment: Appointment = serde_json::from_value(json!({
            "id": Uuid::new_v4(),
            "professional_id": Uuid::new_v4(),
            "client_id": Uuid::new_v4(),
            "date": "2026-10-19",
            "time": "09:00:00",
            "duration_minutes": 60,
            "status": "agendado",
            "service": null,
            "price": null,
            "reminder_channel": "whatsapp",
            "created_at": null
        }))
        .unwrap();

        assert_eq!(appointment.time, NaiveTime::from_hms_opt(9, 0, 0).unwrap());
        assert_eq!(appointment.status, AppointmentStatus::Agendado);
    }
}
