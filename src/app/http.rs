// LobbyScout - app/http.rs
//
// Shared HTTP client for the geolocation lookup and webhook delivery.
// Every request carries the configured timeout, so a stalled service can
// delay the tail loop by at most that long per call.

use crate::util::constants;
use std::time::Duration;

/// Build the client used for all outbound calls.
pub fn build_client(timeout: Duration) -> Result<reqwest::Client, reqwest::Error> {
    reqwest::Client::builder()
        .timeout(timeout)
        .user_agent(format!("{}/{}", constants::APP_NAME, constants::APP_VERSION))
        .build()
}
