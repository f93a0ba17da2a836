pub mod appointment;
pub mod client;
pub mod error;
pub mod professional;
pub mod time_of_day;

pub use appointment::{Appointment, AppointmentStatus, NewAppointment, ReminderChannel};
pub use client::{Client, ClientContact};
pub use error::AppError;
pub use professional::{DayRule, Professional, SubscriptionPlan, WeeklyAvailability};
