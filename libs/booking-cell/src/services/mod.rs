pub mod booking;
pub mod identity;
pub mod store;

pub use booking::PublicBookingService;
pub use identity::{ClientIdentityResolver, MatchPolicy, ResolvedClient};
pub use store::{BookingStore, SlotInsert, SupabaseBookingStore};
