//! Named rate-limit policies
//!
//! One preconfigured limiter per sensitive action class, with the reference
//! deployment's budgets. Hosts own the cleanup lifecycle: either call
//! [`PolicySet::cleanup`] on their own schedule or spawn the optional sweep
//! task via [`spawn_cleanup`].

use std::sync::Arc;
use std::time::Duration;

use crate::clock::Clock;
use crate::abuse::rate_limit::{RateLimitConfig, RateLimiter};

/// Suggested cadence for the periodic cleanup sweep
pub const CLEANUP_INTERVAL: Duration = Duration::from_secs(5 * 60);

/// Sensitive action classes with dedicated rate-limit budgets
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Action {
    /// Credential submission
    Auth,
    /// Job application submission
    Application,
    /// Listing search
    Search,
    /// Contact/enquiry form
    Contact,
}

impl Action {
    /// Get string representation
    pub fn as_str(&self) -> &'static str {
        match self {
            Action::Auth => "auth",
            Action::Application => "application",
            Action::Search => "search",
            Action::Contact => "contact",
        }
    }
}

/// Pre-configured rate limits for the sensitive action classes
pub mod limits {
    use super::*;

    /// Login attempts: 5 per 15 minutes, 30 minute block
    pub fn auth() -> RateLimitConfig {
        RateLimitConfig::new(5, Duration::from_secs(15 * 60))
            .with_block_duration(Duration::from_secs(30 * 60))
    }

    /// Job applications: 10 per hour, 2 hour block
    pub fn application() -> RateLimitConfig {
        RateLimitConfig::new(10, Duration::from_secs(60 * 60))
            .with_block_duration(Duration::from_secs(2 * 60 * 60))
    }

    /// Searches: 100 per minute, 5 minute block
    pub fn search() -> RateLimitConfig {
        RateLimitConfig::new(100, Duration::from_secs(60))
            .with_block_duration(Duration::from_secs(5 * 60))
    }

    /// Contact messages: 3 per hour, 24 hour block
    pub fn contact() -> RateLimitConfig {
        RateLimitConfig::new(3, Duration::from_secs(60 * 60))
            .with_block_duration(Duration::from_secs(24 * 60 * 60))
    }
}

/// The registry of named limiter instances
pub struct PolicySet {
    auth: RateLimiter,
    application: RateLimiter,
    search: RateLimiter,
    contact: RateLimiter,
}

impl PolicySet {
    /// Build the registry on the system clock.
    pub fn new() -> Self {
        Self {
            auth: RateLimiter::new(limits::auth()),
            application: RateLimiter::new(limits::application()),
            search: RateLimiter::new(limits::search()),
            contact: RateLimiter::new(limits::contact()),
        }
    }

    /// Build the registry on an injected clock shared by all four limiters.
    pub fn with_clock(clock: Arc<dyn Clock>) -> Self {
        Self {
            auth: RateLimiter::with_clock(limits::auth(), clock.clone()),
            application: RateLimiter::with_clock(limits::application(), clock.clone()),
            search: RateLimiter::with_clock(limits::search(), clock.clone()),
            contact: RateLimiter::with_clock(limits::contact(), clock),
        }
    }

    /// The limiter for an action class.
    pub fn limiter(&self, action: Action) -> &RateLimiter {
        match action {
            Action::Auth => &self.auth,
            Action::Application => &self.application,
            Action::Search => &self.search,
            Action::Contact => &self.contact,
        }
    }

    /// Sweep expired records from every policy.
    pub fn cleanup(&self) {
        self.auth.cleanup();
        self.application.cleanup();
        self.search.cleanup();
        self.contact.cleanup();
    }
}

impl Default for PolicySet {
    fn default() -> Self {
        Self::new()
    }
}

/// Start a periodic cleanup sweep over a policy set.
///
/// The host owns the lifecycle: flip the watch channel to stop, or abort the
/// returned handle.
pub fn spawn_cleanup(
    policies: Arc<PolicySet>,
    period: Duration,
    mut shutdown_rx: tokio::sync::watch::Receiver<bool>,
) -> tokio::task::JoinHandle<()> {
    tokio::spawn(async move {
        loop {
            tokio::select! {
                _ = tokio::time::sleep(period) => {
                    policies.cleanup();
                }
                _ = shutdown_rx.changed() => {
                    if *shutdown_rx.borrow() {
                        tracing::info!("rate limit cleanup task shutting down");
                        break;
                    }
                }
            }
        }
    })
}
