// --- File: crates/slotbook_common/src/http.rs ---
use reqwest::{Client, Error as ReqwestError};
use slotbook_config::BackendConfig;
use std::time::Duration;

/// Creates a new HTTP client with custom configuration.
///
/// # Arguments
///
/// * `timeout_secs` - The timeout in seconds for the client
/// * `follow_redirects` - Whether the client should follow redirects
///
/// # Returns
///
/// A new reqwest::Client instance with the specified configuration
pub fn create_client(timeout_secs: u64, follow_redirects: bool) -> Result<Client, ReqwestError> {
    Client::builder()
        .timeout(Duration::from_secs(timeout_secs))
        .redirect(if follow_redirects {
            reqwest::redirect::Policy::default()
        } else {
            reqwest::redirect::Policy::none()
        })
        .build()
}

/// Client used to talk to the booking backend.
///
/// Redirects are not followed: a redirect from the backend is reported as a
/// non-2xx status rather than silently turned into another request.
pub fn client_for_backend(config: &BackendConfig) -> Result<Client, ReqwestError> {
    create_client(config.timeout_secs, false)
}
