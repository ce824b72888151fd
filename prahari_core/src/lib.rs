//! Prahari Core - Abuse-prevention and upload-safety layer
//!
//! This crate contains the client-side guard rails used before a sensitive
//! action leaves the frontend: keyed rate limiting with named per-action
//! policies, and file-content validation for uploads.
//!
//! Everything here is advisory. Attempt history is in-process and
//! non-persistent, and a validation pass is not a security guarantee; the
//! authoritative checks run server-side. This layer exists to save wasted
//! round-trips and deter casual abuse.

pub mod abuse;
pub mod clock;
pub mod upload;

pub use abuse::policies::{spawn_cleanup, Action, PolicySet, CLEANUP_INTERVAL};
pub use abuse::rate_limit::{RateLimitConfig, RateLimiter};
pub use clock::{Clock, ManualClock, SystemClock};
pub use upload::{
    generate_secure_file_name, sanitize_file_name, validate_file, FileCheck, FileInfo,
    RejectReason, UploadRules, UploadWarning, ValidateError,
};
