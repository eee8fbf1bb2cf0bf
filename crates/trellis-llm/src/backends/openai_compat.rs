//! Shared request/response plumbing for OpenAI-compatible endpoints. The
//! provider variants differ only in how their error bodies are shaped.

use std::time::Duration;

use reqwest::{Client, StatusCode};

use crate::error::BackendError;
use crate::wire::{outcome_from_response, CompletionOutcome, CompletionRequest, CompletionResponse};

/// Reads a provider-specific error body into a short detail string.
pub(crate) type ErrorBodyReader = fn(&str) -> Option<String>;

const MAX_DETAIL_LEN: usize = 200;

pub(crate) async fn post_chat_completion(
    client: &Client,
    base_url: &str,
    credential: &str,
    body: &CompletionRequest<'_>,
    timeout: Duration,
    read_error: ErrorBodyReader,
) -> Result<CompletionOutcome, BackendError> {
    let url = format!("{}/chat/completions", base_url.trim_end_matches('/'));

    let response = client
        .post(&url)
        .timeout(timeout)
        .header("Authorization", format!("Bearer {credential}"))
        .json(body)
        .send()
        .await
        .map_err(|err| classify_transport(err, timeout))?;

    let status = response.status();
    if !status.is_success() {
        let text = response.text().await.unwrap_or_default();
        return Err(classify_status(status, &text, read_error));
    }

    let text = response
        .text()
        .await
        .map_err(|err| classify_transport(err, timeout))?;
    let decoded: CompletionResponse = serde_json::from_str(&text)
        .map_err(|err| BackendError::MalformedResponse(err.to_string()))?;
    outcome_from_response(decoded)
}

fn classify_transport(err: reqwest::Error, timeout: Duration) -> BackendError {
    if err.is_timeout() {
        BackendError::Timeout(timeout)
    } else {
        BackendError::Http(err)
    }
}

fn classify_status(status: StatusCode, body: &str, read_error: ErrorBodyReader) -> BackendError {
    let detail = read_error(body).unwrap_or_else(|| fallback_detail(status, body));
    match status {
        StatusCode::TOO_MANY_REQUESTS => BackendError::RateLimited(detail),
        StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => BackendError::AuthRejected {
            status: status.as_u16(),
            detail,
        },
        _ => BackendError::Api {
            status: status.as_u16(),
            detail,
        },
    }
}

fn fallback_detail(status: StatusCode, body: &str) -> String {
    let trimmed = body.trim();
    if trimmed.is_empty() {
        return status.canonical_reason().unwrap_or("no detail").to_string();
    }
    if trimmed.chars().count() <= MAX_DETAIL_LEN {
        trimmed.to_string()
    } else {
        trimmed.chars().take(MAX_DETAIL_LEN).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn no_reader(_body: &str) -> Option<String> {
        None
    }

    #[test]
    fn status_429_maps_to_rate_limited() {
        let err = classify_status(StatusCode::TOO_MANY_REQUESTS, "slow down", no_reader);
        assert!(matches!(err, BackendError::RateLimited(detail) if detail == "slow down"));
    }

    #[test]
    fn status_401_and_403_map_to_auth_rejected() {
        for code in [StatusCode::UNAUTHORIZED, StatusCode::FORBIDDEN] {
            let err = classify_status(code, "", no_reader);
            assert!(matches!(err, BackendError::AuthRejected { .. }));
        }
    }

    #[test]
    fn other_statuses_map_to_api_error() {
        let err = classify_status(StatusCode::INTERNAL_SERVER_ERROR, "boom", no_reader);
        assert!(matches!(err, BackendError::Api { status: 500, .. }));
    }

    #[test]
    fn fallback_detail_truncates_long_bodies() {
        let body = "x".repeat(1000);
        let detail = fallback_detail(StatusCode::BAD_GATEWAY, &body);
        assert_eq!(detail.chars().count(), MAX_DETAIL_LEN);
    }

    #[test]
    fn fallback_detail_uses_reason_for_empty_bodies() {
        let detail = fallback_detail(StatusCode::BAD_GATEWAY, "  ");
        assert_eq!(detail, "Bad Gateway");
    }
}
