use async_trait::async_trait;
use reqwest::Client;

use super::openai_compat;
use super::ChatBackend;
use crate::catalog::ModelDescriptor;
use crate::error::BackendError;
use crate::router::InvokeParams;
use crate::wire::{CompletionOutcome, CompletionRequest, WireMessage};

/// The OpenAI API proper. Error bodies arrive as
/// `{"error": {"message": ..., "type": ...}}`.
pub struct OpenAiBackend {
    client: Client,
}

impl OpenAiBackend {
    pub fn new(client: Client) -> Self {
        Self { client }
    }
}

fn read_error_body(body: &str) -> Option<String> {
    let value: serde_json::Value = serde_json::from_str(body).ok()?;
    let error = value.get("error")?;
    let message = error.get("message")?.as_str()?;
    match error.get("type").and_then(|kind| kind.as_str()) {
        Some(kind) => Some(format!("{kind}: {message}")),
        None => Some(message.to_string()),
    }
}

#[async_trait]
impl ChatBackend for OpenAiBackend {
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
