//! Upload safety module
//!
//! Gates a file before it is attached to a submission payload:
//! - Size, declared-type, and extension allowlists
//! - Byte-signature verification against the declared type
//! - Heuristic scan for executable and script signatures
//! - Storage-safe filename helpers
//!
//! A pass here is advisory. The server re-validates everything; this layer
//! exists to reject obviously bad files before a round-trip is wasted.

pub mod filename;
mod signatures;
pub mod validate;

pub use filename::{generate_secure_file_name, sanitize_file_name};
pub use validate::{
    validate_file, FileCheck, FileInfo, RejectReason, UploadRules, UploadWarning, ValidateError,
};
