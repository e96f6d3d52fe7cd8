//! The reqwest client every remote API call goes through.

use std::time::Duration;

use reqwest::Client;

/// User agent sent with every remote API call.
pub const USER_AGENT: &str = concat!("psdash/", env!("CARGO_PKG_VERSION"));

pub const CONNECT_TIMEOUT: Duration = Duration::from_secs(10);

/// Whole-request timeout when the configuration does not set one.
pub const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// A reqwest client pinned to the dashboard's user agent and a fixed
/// per-request timeout. Expired requests are not retried.
#[derive(Debug, Clone)]
pub struct HttpClient {
    inner: Client,
}

impl HttpClient {
    pub fn new() -> Result<Self, reqwest::Error> {
        Self::with_timeout(REQUEST_TIMEOUT)
    }

    /// Build a client whose requests give up after `timeout`.
    pub fn with_timeout(timeout: Duration) -> Result<Self, reqwest::Error> {
        let inner = Client::builder()
            .user_agent(USER_AGENT)
            .connect_timeout(CONNECT_TIMEOUT.min(timeout))
            .timeout(timeout)
            .build()?;
        Ok(Self { inner })
    }

    pub fn inner(&self) -> &Client {
        &self.inner
    }
}
