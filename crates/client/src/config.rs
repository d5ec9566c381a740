//! Client configuration.

use std::time::Duration;

/// Connection settings for a Dokploy instance.
#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// Base URL of the Dokploy API, e.g. `https://dokploy.example.com/api`.
    pub base_url: String,
    /// Static API key attached to every request as `x-api-key`.
    pub api_key: String,
    /// Per-request deadline.
    pub timeout: Duration,
    /// Retry knobs for the environment merge loop.
    pub retry: RetryPolicy,
}

impl ClientConfig {
    /// Config with the default timeout and retry policy.
    pub fn new(base_url: impl Into<String>, api_key: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            api_key: api_key.into(),
            timeout: Duration::from_secs(30),
            retry: RetryPolicy::default(),
        }
    }
}

/// Bounded-retry parameters for optimistic read-modify-write cycles.
///
/// Injected rather than hard-coded so tests can run with near-zero delays.
#[derive(Debug, Clone, Copy)]
pub struct RetryPolicy {
    /// Maximum number of full read-modify-write-verify cycles.
    pub max_attempts: u32,
    /// Sleep between attempts is `backoff_base * attempt_number`.
    pub backoff_base: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 5,
            backoff_base: Duration::from_millis(100),
        }
    }
}
