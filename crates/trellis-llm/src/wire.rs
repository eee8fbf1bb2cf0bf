//! The OpenAI-compatible chat-completion wire shapes every supported
//! provider speaks.

use serde::{Deserialize, Serialize};
use trellis_core::TokenUsage;

use crate::error::BackendError;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct WireMessage {
    pub role: String,
    pub content: String,
}

impl WireMessage {
    pub fn system(content: impl Into<String>) -> Self {
        Self {
            role: "system".to_string(),
            content: content.into(),
        }
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: "user".to_string(),
            content: content.into(),
        }
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self {
            role: "assistant".to_string(),
            content: content.into(),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct CompletionRequest<'a> {
    pub model: &'a str,
    pub messages: &'a [WireMessage],
    pub max_tokens: u32,
    pub temperature: f32,
}

#[derive(Debug, Deserialize)]
pub struct CompletionResponse {
    #[serde(default)]
    pub choices: Vec<Choice>,
    pub usage: Option<WireUsage>,
}

#[derive(Debug, Deserialize)]
pub struct Choice {
    pub message: ChoiceMessage,
}

#[derive(Debug, Deserialize)]
pub struct ChoiceMessage {
    pub content: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct WireUsage {
    pub prompt_tokens: u32,
    pub completion_tokens: u32,
}

/// What a successful invocation produced.
#[derive(Debug, Clone)]
pub struct CompletionOutcome {
    pub text: String,
    pub usage: TokenUsage,
}

/// Extracts the reply text and usage from a decoded response. Both are
/// required; a response missing either is a
/// [`BackendError::MalformedResponse`].
pub fn outcome_from_response(
    response: CompletionResponse,
) -> Result<CompletionOutcome, BackendError> {
    let usage = response
        .usage
        .ok_or_else(|| BackendError::MalformedResponse("missing usage block".to_string()))?;
    let text = response
        .choices
        .into_iter()
        .next()
        .and_then(|choice| choice.message.content)
        .ok_or_else(|| {
            BackendError::MalformedResponse("no choice with message content".to_string())
        })?;

    Ok(CompletionOutcome {
        text,
        usage: TokenUsage::new(
            u64::from(usage.prompt_tokens),
            u64::from(usage.completion_tokens),
        ),
    })
}
