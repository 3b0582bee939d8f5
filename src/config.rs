//! Configuration for the client.
//!
//! Supports:
//! - CLI arguments via clap (flattened into a binary's own parser)
//! - Environment variable overrides
//! - Sensible defaults for the hosted endpoint

use std::time::Duration;

use clap::Args;

use crate::api::{HttpConfig, DEFAULT_ENDPOINT};

/// Connection settings for a [`Client`](crate::Client).
#[derive(Args, Debug, Clone)]
pub struct Config {
    /// Base URL of the REST endpoint
    #[arg(long, env = "PUBSUB_ENDPOINT", default_value = DEFAULT_ENDPOINT)]
    pub endpoint: String,

    /// Project that owns the topics and subscriptions
    #[arg(short, long, env = "PUBSUB_PROJECT")]
    pub project: String,

    /// OAuth bearer token; requests are sent unsigned when absent
    #[arg(long, env = "PUBSUB_TOKEN", hide_env_values = true)]
    pub token: Option<String>,

    /// Per-request timeout in seconds (0 disables it)
    #[arg(long, env = "PUBSUB_REQUEST_TIMEOUT_SECS", default_value_t = 0)]
    pub request_timeout_secs: u64,

    /// User-Agent header sent with every request
    #[arg(long, env = "PUBSUB_USER_AGENT", default_value = concat!("pubsub-rs/", env!("CARGO_PKG_VERSION")))]
    pub user_agent: String,
}

impl Config {
    /// Transport settings derived from this configuration.
    pub fn to_http_config(&self) -> HttpConfig {
        HttpConfig {
            endpoint: self.endpoint.clone(),
            user_agent: self.user_agent.clone(),
            request_timeout: (self.request_timeout_secs > 0)
                .then(|| Duration::from_secs(self.request_timeout_secs)),
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        let http = HttpConfig::default();
        Self {
            endpoint: http.endpoint,
            project: String::new(),
            token: None,
            request_timeout_secs: 0,
            user_agent: http.user_agent,
        }
    }
}

/// Tuning for a listener session.
#[derive(Debug, Clone)]
pub struct ListenerConfig {
    /// Messages buffered between the background task and the caller.
    pub buffer: usize,
    /// Upper bound on the pause after consecutive empty pulls.
    pub max_backoff: Duration,
}

impl Default for ListenerConfig {
    fn default() -> Self {
        Self {
            buffer: 32,
            max_backoff: Duration::from_secs(5),
        }
    }
}
