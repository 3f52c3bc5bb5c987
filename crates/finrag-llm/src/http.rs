//! Shared HTTP client construction for consistent timeout and TLS configuration.

use std::time::Duration;

pub const DEFAULT_CONNECT_TIMEOUT: Duration = Duration::from_secs(30);
pub const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(60);

/// Create an HTTP client with the given connect and request timeouts.
///
/// Config: rustls TLS, `finrag/{version}` user-agent, redirect limit 10.
///
/// # Errors
///
/// Returns an error if the TLS backend cannot be initialized.
pub fn client_with_timeouts(
    connect: Duration,
    request: Duration,
) -> Result<reqwest::Client, crate::LlmError> {
    let client = reqwest::Client::builder()
        .connect_timeout(connect)
        .timeout(request)
        .user_agent(concat!("finrag/", env!("CARGO_PKG_VERSION")))
        .redirect(reqwest::redirect::Policy::limited(10))
        .build()?;
    Ok(client)
}

/// Create a shared HTTP client with the default 30s connect / 60s request timeouts.
#[must_use]
pub fn default_client() -> reqwest::Client {
    client_with_timeouts(DEFAULT_CONNECT_TIMEOUT, DEFAULT_REQUEST_TIMEOUT)
        .expect("default HTTP client construction must not fail")
}
