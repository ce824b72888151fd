//! Security-wrapped HTTP client

use std::sync::Arc;
use std::time::Duration;

use reqwest::header::{HeaderMap, HeaderValue};
use serde_json::Value;

use prahari_core::{Action, PolicySet};

use crate::constants;
use crate::sanitize;
use crate::token::SessionToken;

/// Behavior switches for the security wrapper
#[derive(Debug, Clone)]
pub struct SecurityConfig {
    /// Consult the policy registry before sending
    pub enable_rate_limit: bool,
    /// Attach the session anti-forgery token
    pub enable_csrf: bool,
    /// Rate-limit key (user id, email); anonymous when unset
    pub rate_limit_key: Option<String>,
}

impl Default for SecurityConfig {
    fn default() -> Self {
        Self {
            enable_rate_limit: true,
            enable_csrf: true,
            rate_limit_key: None,
        }
    }
}

/// Map a request URL to its rate-limited action class.
///
/// Unmatched endpoints are not throttled client-side.
pub fn classify_endpoint(url: &str) -> Option<Action> {
    if url.contains("/login") || url.contains("/auth") {
        Some(Action::Auth)
    } else if url.contains("/applications") || url.contains("/apply") {
        Some(Action::Application)
    } else if url.contains("/search") {
        Some(Action::Search)
    } else if url.contains("/contact") {
        Some(Action::Contact)
    } else {
        None
    }
}

/// Errors surfaced by the secure client
#[derive(Debug, thiserror::Error)]
pub enum SecurityError {
    /// Denied locally by the policy registry; nothing was sent.
    #[error("rate limit exceeded, try again in {}s", retry_after.as_secs())]
    RateLimited { retry_after: Duration },

    /// Transport-level failure from the underlying client.
    #[error(transparent)]
    Http(#[from] reqwest::Error),
}

/// HTTP client wrapper applying the Prahari checks around each request.
pub struct SecureClient {
    http: reqwest::Client,
    policies: Arc<PolicySet>,
    token: SessionToken,
    config: SecurityConfig,
}

impl SecureClient {
    pub fn new(policies: Arc<PolicySet>, config: SecurityConfig) -> Self {
        Self {
            http: reqwest::Client::new(),
            policies,
            token: SessionToken::new(),
            config,
        }
    }

    /// Send a JSON request through the security checks.
    ///
    /// A local rate-limit denial returns [`SecurityError::RateLimited`]
    /// without touching the network. The body's top-level string fields are
    /// sanitized before dispatch; the response is observed for missing
    /// security headers but never blocked.
    pub async fn send_json(
        &self,
        method: reqwest::Method,
        url: &str,
        body: Option<Value>,
    ) -> Result<reqwest::Response, SecurityError> {
        self.check_rate_limit(url)?;

        let mut request = self.http.request(method, url).headers(self.security_headers());
        if let Some(mut body) = body {
            sanitize::sanitize_json(&mut body);
            request = request.json(&body);
        }

        let response = request.send().await?;
        self.observe_response(&response);
        Ok(response)
    }

    /// The key all policy checks run under.
    fn rate_limit_key(&self) -> &str {
        self.config
            .rate_limit_key
            .as_deref()
            .unwrap_or(constants::ANONYMOUS_KEY)
    }

    fn check_rate_limit(&self, url: &str) -> Result<(), SecurityError> {
        if !self.config.enable_rate_limit {
            return Ok(());
        }
        let Some(action) = classify_endpoint(url) else {
            return Ok(());
        };

        let limiter = self.policies.limiter(action);
        let key = self.rate_limit_key();
        if limiter.is_allowed(key) {
            Ok(())
        } else {
            Err(SecurityError::RateLimited {
                retry_after: limiter.time_until_unblocked(key),
            })
        }
    }

    /// Informational headers attached to every request.
    fn security_headers(&self) -> HeaderMap {
        let mut headers = HeaderMap::new();
        headers.insert(
            constants::REQUESTED_WITH_HEADER,
            HeaderValue::from_static(constants::REQUESTED_WITH_VALUE),
        );

        if self.config.enable_csrf {
            if let Ok(value) = HeaderValue::from_str(self.token.get()) {
                headers.insert(constants::CSRF_TOKEN_HEADER, value);
            }
        }

        if let Ok(value) = HeaderValue::from_str(self.rate_limit_key()) {
            headers.insert(constants::RATE_LIMIT_KEY_HEADER, value);
        }

        headers.insert(
            constants::CSP_HEADER,
            HeaderValue::from_static(constants::CSP_DIRECTIVES),
        );

        headers
    }

    /// Response-side pass: observe and log, never mutate or block.
    fn observe_response(&self, response: &reqwest::Response) {
        if response.headers().get(constants::CSP_HEADER).is_none() {
            tracing::warn!(
                url = %response.url(),
                "response missing Content-Security-Policy header"
            );
        }

        let remaining = response
            .headers()
            .get(constants::RATE_LIMIT_REMAINING_HEADER)
            .and_then(|value| value.to_str().ok())
            .and_then(|value| value.parse::<u32>().ok());
        if let Some(remaining) = remaining {
            if remaining < constants::LOW_REMAINING_THRESHOLD {
                tracing::warn!(remaining, "approaching server-side rate limit");
            }
        }
    }
}
