//! Prahari Client - security-wrapped request layer
//!
//! Wraps outgoing HTTP requests with the Prahari core checks:
//! - Consults the rate-limit policy matching the request's endpoint class
//! - Attaches the session anti-forgery token and informational headers
//! - Shallow-sanitizes string fields of a JSON body
//!
//! On the response side it only observes (logging when expected security
//! headers are absent); it never mutates or blocks a response.

pub mod client;
pub mod sanitize;
pub mod token;

pub use client::{classify_endpoint, SecureClient, SecurityConfig, SecurityError};
pub use sanitize::{sanitize_input, sanitize_json, validate_url};
pub use token::SessionToken;

/// Constants for the security layer
pub mod constants {
    /// Marker header identifying programmatic requests
    pub const REQUESTED_WITH_HEADER: &str = "X-Requested-With";

    /// Conventional value for the marker header
    pub const REQUESTED_WITH_VALUE: &str = "XMLHttpRequest";

    /// Anti-forgery token header
    pub const CSRF_TOKEN_HEADER: &str = "X-CSRF-Token";

    /// Echo of the rate-limit key the request was checked under
    pub const RATE_LIMIT_KEY_HEADER: &str = "X-Rate-Limit-Key";

    /// Content Security Policy header
    pub const CSP_HEADER: &str = "Content-Security-Policy";

    /// Server-reported remaining request budget
    pub const RATE_LIMIT_REMAINING_HEADER: &str = "X-RateLimit-Remaining";

    /// Warn when the server reports fewer remaining requests than this
    pub const LOW_REMAINING_THRESHOLD: u32 = 5;

    /// Rate-limit key used when the caller supplies none
    pub const ANONYMOUS_KEY: &str = "anonymous";

    /// CSP directives attached to outgoing requests (informational)
    pub const CSP_DIRECTIVES: &str = "default-src 'self'; \
        script-src 'self' 'unsafe-inline'; \
        style-src 'self' 'unsafe-inline'; \
        img-src 'self' data: https:; \
        connect-src 'self'; \
        object-src 'none'; \
        frame-ancestors 'none'";
}
