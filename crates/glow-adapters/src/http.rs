//! Shared HTTP plumbing: client construction and error classification.

use std::time::Duration;

use glow_core::ServiceError;
use serde::de::DeserializeOwned;
use serde::Serialize;
use tracing::debug;

/// Longest error body echoed into an error message.
const MAX_ERROR_BODY: usize = 300;

pub(crate) fn client(timeout: Duration) -> reqwest::Client {
    reqwest::Client::builder()
        .timeout(timeout)
        .build()
        .unwrap_or_else(|e| {
            debug!("Falling back to default HTTP client: {e}");
            reqwest::Client::new()
        })
}

/// Posts `body` as JSON and decodes a JSON answer.
///
/// Non-2xx statuses are classified by [`ServiceError::from_status`];
/// timeouts and connection failures are transient, undecodable bodies are
/// permanent.
pub(crate) async fn post_json<B, R>(
    request: reqwest::RequestBuilder,
    body: &B,
    what: &str,
) -> Result<R, ServiceError>
where
    B: Serialize + Sync,
    R: DeserializeOwned,
{
    let response = request
        .json(body)
        .send()
        .await
        .map_err(|e| classify(&e, what))?;

    let status = response.status();
    if !status.is_success() {
        let text = response.text().await.unwrap_or_default();
        return Err(ServiceError::from_status(
            status.as_u16(),
            format!("{what} failed: {}", truncate(text.trim())),
        ));
    }

    response
        .json::<R>()
        .await
        .map_err(|e| ServiceError::permanent(format!("{what} returned an unexpected body: {e}")))
}

fn classify(err: &reqwest::Error, what: &str) -> ServiceError {
    if err.is_timeout() {
        ServiceError::timeout(what)
    } else if let Some(status) = err.status() {
        ServiceError::from_status(status.as_u16(), format!("{what} failed: {err}"))
    } else {
        ServiceError::transient(format!("{what} failed: {err}"))
    }
}

fn truncate(text: &str) -> &str {
    match text.char_indices().nth(MAX_ERROR_BODY) {
        Some((idx, _)) => &text[..idx],
        None => text,
    }
}

/// Rejects calls that would go out without credentials.
pub(crate) fn require_key<'a>(key: &'a str, what: &str) -> Result<&'a str, ServiceError> {
    if key.trim().is_empty() {
        Err(ServiceError::permanent(format!("{what}: missing API key")))
    } else {
        Ok(key)
    }
}
