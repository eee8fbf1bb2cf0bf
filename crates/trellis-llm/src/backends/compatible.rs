use async_trait::async_trait;
use reqwest::Client;

use super::openai_compat;
use super::ChatBackend;
use crate::catalog::ModelDescriptor;
use crate::error::BackendError;
use crate::router::InvokeParams;
use crate::wire::{CompletionOutcome, CompletionRequest, WireMessage};

/// Any other OpenAI-compatible endpoint (local inference servers, gateway
/// proxies). Error bodies vary, so both common shapes are tried.
pub struct CompatibleBackend {
    client: Client,
}

impl CompatibleBackend {
    pub fn new(client: Client) -> Self {
        Self { client }
    }
}

fn read_error_body(body: &str) -> Option<String> {
    let value: serde_json::Value = serde_json::from_str(body).ok()?;
    if let Some(message) = value
        .get("error")
        .and_then(|error| error.get("message"))
        .and_then(|message| message.as_str())
    {
        return Some(message.to_string());
    }
    value
        .get("message")
        .and_then(|message| message.as_str())
        .map(str::to_string)
}

#[async_trait]
impl ChatBackend for CompatibleBackend {
    async fn complete(
        &self,
        descriptor: &ModelDescriptor,
        credential: &str,
        messages: &[WireMessage],
        params: &InvokeParams,
    ) -> Result<CompletionOutcome, BackendError> {
        let body = CompletionRequest {
            model: &descriptor.model_id,
            messages,
            max_tokens: params.max_tokens,
            temperature: params.temperature,
        };
        openai_compat::post_chat_completion(
            &self.client,
            &descriptor.base_url,
            credential,
            &body,
            params.timeout,
            read_error_body,
        )
        .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reads_nested_and_flat_shapes() {
        assert_eq!(
            read_error_body(r#"{"error": {"message": "nested"}}"#).as_deref(),
            Some("nested")
        );
        assert_eq!(
            read_error_body(r#"{"message": "flat"}"#).as_deref(),
            Some("flat")
        );
        assert_eq!(read_error_body("not json"), None);
    }
}
