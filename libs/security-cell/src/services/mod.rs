pub mod audit;
pub mod rate_limit;

pub use audit::{AuditService, AuditStore, SupabaseAuditStore};
pub use rate_limit::RateLimiter;
