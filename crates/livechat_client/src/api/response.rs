use livechat_core::wire::ErrorResponse;
use log::{debug, error};
use reqwest::Response;
use serde::de::DeserializeOwned;

use crate::error::{ClientError, Result, GENERIC_FAILURE};

/// Read a response body, turning non-success statuses into `ClientError::Api`.
pub(crate) async fn read_json<T: DeserializeOwned>(response: Response) -> Result<T> {
    let status = response.status();
    let url = response.url().clone();
    let body = response.text().await?;

    if !status.is_success() {
        let message = failure_message(&body);
        error!("Request to {} failed with status {}: {}", url, status, message);
        return Err(ClientError::Api(message));
    }

    debug!("Got {} from {} ({} bytes)", status, url, body.len());
    serde_json::from_str(&body).map_err(|e| {
        error!("Failed to parse response from {}: {}", url, e);
        ClientError::Json(e)
    })
}

/// Message to surface for a failed request body.
pub(crate) fn failure_message(body: &str) -> String {
    serde_json::from_str::<ErrorResponse>(body)
        .ok()
        .and_then(|response| response.error)
        .filter(|message| !message.is_empty())
        .unwrap_or_else(|| GENERIC_FAILURE.to_string())
}
