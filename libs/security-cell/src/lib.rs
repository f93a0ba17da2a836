// =====================================================================================
// SECURITY CELL - AUDIT TRAIL & ABUSE THROTTLING
// =====================================================================================
//
// Append-only audit log entries and the rate-limit policies that are counted
// from them: public booking attempts per network address, login attempts per email.
//
// =====================================================================================

pub mod models;
pub mod services;

pub use models::{AuditAction, AuditEntry, RateLimitError, RateLimitKey, RateLimitPolicy};
pub use services::{AuditService, AuditStore, RateLimiter, SupabaseAuditStore};
