//! Shared HTTP plumbing for the provider clients.

use std::time::Duration;

use reqwest::StatusCode;
use serde::de::DeserializeOwned;
use tracing::warn;

use crate::error::{Service, ToolError};

/// Build a client with a default timeout and the configured user agent.
pub(crate) fn build_client(
    service: Service,
    timeout: Duration,
    user_agent: &str,
) -> Result<reqwest::Client, ToolError> {
    reqwest::Client::builder()
        .timeout(timeout)
        .user_agent(user_agent)
        .build()
        .map_err(|e| {
            warn!(service, error = %e, "Failed to build HTTP client");
            ToolError::Transport(service)
        })
}

/// Classify a transport-level failure.
pub(crate) fn transport_error(service: Service, err: reqwest::Error) -> ToolError {
    warn!(service, error = %err, "Request failed");
    if err.is_timeout() {
        ToolError::Timeout(service)
    } else if err.is_decode() {
        ToolError::Malformed(service)
    } else {
        ToolError::Transport(service)
    }
}

/// Classify a non-success status. 404 is left to the caller since its
/// meaning (no data vs. bad endpoint) differs per provider.
pub(crate) fn status_error(service: Service, status: StatusCode) -> ToolError {
    warn!(service, status = status.as_u16(), "Unexpected response status");
    match status {
        StatusCode::UNAUTHORIZED => ToolError::Unauthorized(service),
        StatusCode::TOO_MANY_REQUESTS => ToolError::RateLimited(service),
        other => ToolError::Status {
            service,
            code: other.as_u16(),
        },
    }
}

/// Send a request and decode a JSON body, mapping failures onto [`ToolError`].
///
/// Returns `Ok(None)` on 404.
pub(crate) async fn fetch_json<T: DeserializeOwned>(
    service: Service,
    request: reqwest::RequestBuilder,
) -> Result<Option<T>, ToolError> {
    let response = request
        .send()
        .await
        .map_err(|e| transport_error(service, e))?;

    let status = response.status();
    if status == StatusCode::NOT_FOUND {
        return Ok(None);
    }
    if !status.is_success() {
        return Err(status_error(service, status));
    }

    response
        .json::<T>()
        .await
        .map(Some)
        .map_err(|e| transport_error(service, e))
}
