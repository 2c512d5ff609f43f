use reqwest::Client;
use reqwest_middleware::{ClientBuilder, ClientWithMiddleware};
use reqwest_retry::{RetryTransientMiddleware, policies::ExponentialBackoff};
use std::time::Duration;

const USER_AGENT: &str = concat!("cyclewatch/", env!("CARGO_PKG_VERSION"));

pub struct HttpClientFactory;

impl HttpClientFactory {
    /// Creates an HTTP client for live indicator sources.
    ///
    /// `call_budget` bounds one logical call including every retry. It is split
    /// into `max_retries + 1` attempts plus one attempt's worth of backoff, so
    /// a caller enforcing the same budget from outside still sees the retries.
    pub fn create_client(call_budget: Duration, max_retries: u32) -> ClientWithMiddleware {
        let attempt_timeout = Self::attempt_timeout(call_budget, max_retries);
        let max_backoff = Self::max_backoff(call_budget, max_retries);
        let retry_policy = ExponentialBackoff::builder()
            .retry_bounds(max_backoff / 4, max_backoff)
            .build_with_max_retries(max_retries);

        let client = Client::builder()
            .user_agent(USER_AGENT)
            .pool_max_idle_per_host(2)
            .timeout(attempt_timeout)
            .connect_timeout(attempt_timeout.min(Duration::from_secs(10)))
            .build()
            .unwrap_or_else(|_| Client::new());

        ClientBuilder::new(client)
            .with(RetryTransientMiddleware::new_with_policy(retry_policy))
            .build()
    }

    pub fn attempt_timeout(call_budget: Duration, max_retries: u32) -> Duration {
        call_budget / (max_retries + 2)
    }

    /// Longest single backoff wait; all waits together fit in one attempt slot.
    pub fn max_backoff(call_budget: Duration, max_retries: u32) -> Duration {
        Self::attempt_timeout(call_budget, max_retries) / max_retries.max(1)
    }
}
