//! Input sanitation
//!
//! Defense-in-depth scrubbing of user-supplied strings before they leave the
//! client. This is not a substitute for output encoding at render time or
//! for server-side validation; it strips the patterns most often smuggled
//! into form fields.

use std::net::IpAddr;

use once_cell::sync::Lazy;
use regex::Regex;
use serde_json::Value;

static JAVASCRIPT_SCHEME: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)javascript:").expect("javascript-scheme pattern is valid"));

static EVENT_HANDLER: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)on\w+=").expect("event-handler pattern is valid"));

/// Strip angle brackets, `javascript:` scheme prefixes, and inline
/// event-handler patterns from a string, then trim it.
pub fn sanitize_input(input: &str) -> String {
    let without_brackets: String = input.chars().filter(|c| !matches!(c, '<' | '>')).collect();
    let without_scheme = JAVASCRIPT_SCHEME.replace_all(&without_brackets, "");
    let without_handlers = EVENT_HANDLER.replace_all(&without_scheme, "");
    without_handlers.trim().to_string()
}

/// Shallow-sanitize the top-level string fields of a JSON object.
///
/// Deliberately shallow: nested objects and arrays pass through untouched,
/// matching what the form layer actually submits (flat field maps). Non-object
/// values are left as they are.
pub fn sanitize_json(value: &mut Value) {
    if let Value::Object(fields) = value {
        for field in fields.values_mut() {
            if let Value::String(s) = field {
                *field = Value::String(sanitize_input(s));
            }
        }
    }
}

/// SSRF guard for user-influenced URLs.
///
/// Accepts http/https only, and rejects hosts that are literal loopback,
/// private, link-local, or unspecified addresses. Hostnames are allowed:
/// resolving them is the server's concern, this only stops the obvious
/// literal-address cases.
pub fn validate_url(url: &str) -> bool {
    let parsed = match reqwest::Url::parse(url) {
        Ok(parsed) => parsed,
        Err(_) => return false,
    };

    if !matches!(parsed.scheme(), "http" | "https") {
        return false;
    }

    let host = match parsed.host_str() {
        Some(host) => host,
        None => return false,
    };

    // IPv6 literals arrive bracketed
    let literal = host.trim_start_matches('[').trim_end_matches(']');
    if let Ok(ip) = literal.parse::<IpAddr>() {
        return !is_internal(ip);
    }

    true
}

fn is_internal(ip: IpAddr) -> bool {
    match ip {
        IpAddr::V4(v4) => {
            v4.is_loopback() || v4.is_private() || v4.is_link_local() || v4.is_unspecified()
        }
        IpAddr::V6(v6) => {
            let first = v6.segments()[0];
            // fc00::/7 unique-local, fe80::/10 link-local
            v6.is_loopback() || v6.is_unspecified() || (first & 0xfe00) == 0xfc00 || (first & 0xffc0) == 0xfe80
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_strips_angle_brackets() {
        assert_eq!(sanitize_input("<script>alert(1)</script>"), "scriptalert(1)/script");
    }

    #[test]
    fn test_strips_javascript_scheme_case_insensitive() {
        assert_eq!(sanitize_input("JaVaScRiPt:alert(1)"), "alert(1)");
        assert_eq!(sanitize_input("javascript:void(0)"), "void(0)");
    }

    #[test]
    fn test_strips_event_handlers() {
        assert_eq!(sanitize_input("img onerror=alert(1)"), "img alert(1)");
        assert_eq!(sanitize_input("a ONCLICK=x"), "a x");
    }

    #[test]
    fn test_trims_whitespace() {
        assert_eq!(sanitize_input("  hello  "), "hello");
    }

    #[test]
    fn test_plain_text_unchanged() {
        assert_eq!(sanitize_input("Senior Rust Engineer"), "Senior Rust Engineer");
    }

    #[test]
    fn test_json_sanitation_is_shallow() {
        let mut body = json!({
            "title": "<b>hi</b>",
            "count": 3,
            "nested": { "html": "<i>kept</i>" },
        });

        sanitize_json(&mut body);

        assert_eq!(body["title"], "bhi/b");
        assert_eq!(body["count"], 3);
        assert_eq!(body["nested"]["html"], "<i>kept</i>");
    }

    #[test]
    fn test_url_schemes() {
        assert!(validate_url("https://api.example.com/jobs"));
        assert!(validate_url("http://example.com"));
        assert!(!validate_url("ftp://example.com/file"));
        assert!(!validate_url("javascript:alert(1)"));
        assert!(!validate_url("not a url"));
    }

    #[test]
    fn test_url_rejects_internal_addresses() {
        assert!(!validate_url("http://127.0.0.1/admin"));
        assert!(!validate_url("http://10.0.0.8/"));
        assert!(!validate_url("http://192.168.1.1/router"));
        assert!(!validate_url("http://169.254.169.254/latest/meta-data"));
        assert!(!validate_url("http://[::1]/"));
        assert!(!validate_url("http://[fe80::1]/"));
    }
}
