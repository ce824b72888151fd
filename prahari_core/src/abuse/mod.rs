//! Abuse prevention module
//!
//! Provides advisory, in-process protection for sensitive actions:
//! - Keyed rate limiting with punitive blocks (login, applications, search, contact)
//! - Named policy presets matching the reference deployment
//!
//! Everything here is UX-level throttling. Attempt history lives in process
//! memory only and is never shared or persisted; the authoritative limits are
//! enforced server-side.

pub mod policies;
pub mod rate_limit;

pub use policies::{Action, PolicySet};
pub use rate_limit::{RateLimitConfig, RateLimiter};
