use serde::{Deserialize, Serialize};

/// Token counts for one backend invocation, as reported by the backend.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct TokenUsage {
    pub tokens_in: u64,
    pub tokens_out: u64,
}

impl TokenUsage {
    pub fn new(tokens_in: u64, tokens_out: u64) -> Self {
        Self {
            tokens_in,
            tokens_out,
        }
    }

    pub fn total(self) -> u64 {
        self.tokens_in + self.tokens_out
    }
}
