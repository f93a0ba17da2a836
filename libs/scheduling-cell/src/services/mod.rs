pub mod availability;
pub mod occupancy;
pub mod store;

pub use availability::AvailabilityService;
pub use store::{AvailabilityStore, SupabaseAvailabilityStore};
