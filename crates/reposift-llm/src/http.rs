//! Shared HTTP client construction used by embedding backends and the repository fetcher.

use std::time::Duration;

const CONNECT_TIMEOUT_SECS: u64 = 30;
const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 60;

/// Client with the default 60s request timeout.
#[must_use]
pub fn default_client() -> reqwest::Client {
    client_with_timeout(Duration::from_secs(DEFAULT_REQUEST_TIMEOUT_SECS))
}

/// Build a client with a 30s connect timeout, the given request timeout,
/// rustls TLS, a `reposift/{version}` user-agent and at most 10 redirects.
///
/// # Panics
///
/// Panics if the TLS backend cannot be initialized, which only happens on a
/// broken build.
#[must_use]
pub fn client_with_timeout(request_timeout: Duration) -> reqwest::Client {
    reqwest::Client::builder()
        .connect_timeout(Duration::from_secs(CONNECT_TIMEOUT_SECS))
        .timeout(request_timeout)
        .user_agent(concat!("reposift/", env!("CARGO_PKG_VERSION")))
        .redirect(reqwest::redirect::Policy::limited(10))
        .build()
        .expect("HTTP client construction must not fail")
}
