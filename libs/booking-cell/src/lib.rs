pub mod handlers;
pub mod models;
pub mod router;
pub mod services;

pub use models::{BookingConfirmation, BookingError, PublicBookingRequest};
pub use router::booking_routes;
pub use services::{BookingStore, ClientIdentityResolver, PublicBookingService, SlotInsert, SupabaseBookingStore};
