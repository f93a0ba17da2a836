pub mod handlers;
pub mod models;
pub mod router;
pub mod services;

pub use models::{AvailabilityQuery, DayAvailability, PublicAvailability, SchedulingError};
pub use router::scheduling_routes;
pub use services::{AvailabilityService, AvailabilityStore, SupabaseAvailabilityStore};
