use std::fmt;

use serde::{Deserialize, Serialize};

use crate::usage::TokenUsage;

/// Which producer normalized the inbound message.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum RequestOrigin {
    Platform,
    Http,
    Cli,
}

impl fmt::Display for RequestOrigin {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Platform => "platform",
            Self::Http => "http",
            Self::Cli => "cli",
        };
        f.write_str(name)
    }
}

/// The normalized chat request both ingest producers emit. The dispatcher
/// accepts nothing else.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatRequest {
    pub thread_key: String,
    pub user_id: String,
    pub text: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub requested_alias: Option<String>,
    pub origin: RequestOrigin,
}

impl ChatRequest {
    pub fn new(
        origin: RequestOrigin,
        thread_key: impl Into<String>,
        user_id: impl Into<String>,
        text: impl Into<String>,
    ) -> Self {
        Self {
            thread_key: thread_key.into(),
            user_id: user_id.into(),
            text: text.into(),
            requested_alias: None,
            origin,
        }
    }

    pub fn with_alias(mut self, alias: impl Into<String>) -> Self {
        self.requested_alias = Some(alias.into());
        self
    }
}

/// A successful dispatch result: the reply text plus what produced it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatReply {
    pub text: String,
    pub alias: String,
    pub model_id: String,
    pub usage: TokenUsage,
    pub elapsed_ms: u64,
}
