// File: crates/bodyshop_gcal/src/auth.rs
use bodyshop_common::services::CalendarServiceError;
use bodyshop_config::GcalConfig;
use serde::Deserialize;
use std::time::Duration;
use tracing::{debug, warn};

#[derive(Deserialize, Debug)]
struct TokenResponse {
    access_token: String,
    #[serde(default)]
    expires_in: Option<u64>,
}

/// Builds the HTTP client shared by token refreshes and calendar calls.
pub fn create_http_client(config: &GcalConfig) -> Result<reqwest::Client, CalendarServiceError> {
    reqwest::Client::builder()
        .timeout(Duration::from_secs(config.request_timeout_secs))
        .build()
        .map_err(|e| CalendarServiceError::Transport(e.to_string()))
}

/// Classifies a non-success calendar or token endpoint response.
///
/// 401 and any `invalid_grant` body mean the credentials must be refreshed
/// (or re-authorized); everything else is a plain API error.
pub fn classify_failure(status: u16, body: String) -> CalendarServiceError {
    if status == 401 || body.contains("invalid_grant") {
        CalendarServiceError::CredentialExpired(format!("HTTP {}: {}", status, body))
    } else {
        CalendarServiceError::Api { status, body }
    }
}

/// Exchanges the configured refresh token for a new access token.
pub async fn refresh_access_token(
    http: &reqwest::Client,
    config: &GcalConfig,
) -> Result<String, CalendarServiceError> {
    let params = [
        ("client_id", config.client_id.as_str()),
        ("client_secret", config.client_secret.as_str()),
        ("refresh_token", config.refresh_token.as_str()),
        ("grant_type", "refresh_token"),
    ];

    let response = http
        .post(&config.token_uri)
        .form(&params)
        .send()
        .await
        .map_err(|e| CalendarServiceError::Transport(e.to_string()))?;

    let status = response.status();
    if !status.is_success() {
        let body = response.text().await.unwrap_or_default();
        warn!(status = status.as_u16(), "OAuth token refresh rejected");
        return Err(classify_failure(status.as_u16(), body));
    }

    let token: TokenResponse = response
        .json()
        .await
        .map_err(|e| CalendarServiceError::InvalidResponse(e.to_string()))?;
    debug!(expires_in = ?token.expires_in, "OAuth access token refreshed");
    Ok(token.access_token)
}
