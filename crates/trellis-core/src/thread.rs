use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::usage::TokenUsage;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "kebab-case")]
pub enum TurnRole {
    User,
    Assistant,
    /// Synthetic turn recording a failed invocation. Never forwarded to a
    /// backend; kept in the thread so the history reflects what happened.
    SystemError,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Turn {
    pub role: TurnRole,
    pub content: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tokens_in: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tokens_out: Option<u64>,
    #[serde(default = "Utc::now")]
    pub created_at: DateTime<Utc>,
}

impl Turn {
    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: TurnRole::User,
            content: content.into(),
            tokens_in: None,
            tokens_out: None,
            created_at: Utc::now(),
        }
    }

    pub fn assistant(content: impl Into<String>, usage: TokenUsage) -> Self {
        Self {
            role: TurnRole::Assistant,
            content: content.into(),
            tokens_in: Some(usage.tokens_in),
            tokens_out: Some(usage.tokens_out),
            created_at: Utc::now(),
        }
    }

    pub fn system_error(content: impl Into<String>) -> Self {
        Self {
            role: TurnRole::SystemError,
            content: content.into(),
            tokens_in: None,
            tokens_out: None,
            created_at: Utc::now(),
        }
    }
}

/// One ongoing conversation. Turns are append-only except for the explicit
/// clear and trim operations; insertion order is never rewritten.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConversationThread {
    pub key: String,
    pub model_alias: String,
    pub turns: Vec<Turn>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl ConversationThread {
    pub fn new(key: impl Into<String>, model_alias: impl Into<String>) -> Self {
        let now = Utc::now();
        Self {
            key: key.into(),
            model_alias: model_alias.into(),
            turns: Vec::new(),
            created_at: now,
            updated_at: now,
        }
    }

    pub fn push_turn(&mut self, turn: Turn) {
        self.turns.push(turn);
        self.updated_at = Utc::now();
    }

    /// Switches the active model. Takes effect on the next invocation only.
    pub fn set_alias(&mut self, alias: impl Into<String>) {
        self.model_alias = alias.into();
        self.updated_at = Utc::now();
    }

    /// Drops turns to zero while keeping the key and the selected alias.
    pub fn clear_turns(&mut self) {
        self.turns.clear();
        self.updated_at = Utc::now();
    }

    /// Enforces the capacity policy: keep at most the `max_turns` most
    /// recent turns, dropping the oldest first. Returns how many were
    /// dropped.
    pub fn trim_oldest(&mut self, max_turns: usize) -> usize {
        if self.turns.len() <= max_turns {
            return 0;
        }
        let excess = self.turns.len() - max_turns;
        self.turns.drain(..excess);
        self.updated_at = Utc::now();
        excess
    }

    pub fn len(&self) -> usize {
        self.turns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.turns.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn push_turn_appends_in_order() {
        let mut thread = ConversationThread::new("t1", "maverick");
        thread.push_turn(Turn::user("first"));
        thread.push_turn(Turn::assistant("second", TokenUsage::new(3, 5)));

        assert_eq!(thread.len(), 2);
        assert_eq!(thread.turns[0].content, "first");
        assert_eq!(thread.turns[1].content, "second");
        assert_eq!(thread.turns[1].tokens_out, Some(5));
    }

    #[test]
    fn trim_oldest_keeps_most_recent() {
        let mut thread = ConversationThread::new("t1", "maverick");
        for i in 0..6 {
            thread.push_turn(Turn::user(format!("turn-{i}")));
        }

        let dropped = thread.trim_oldest(4);

        assert_eq!(dropped, 2);
        assert_eq!(thread.len(), 4);
        assert_eq!(thread.turns[0].content, "turn-2");
        assert_eq!(thread.turns[3].content, "turn-5");
    }

    #[test]
    fn trim_oldest_is_noop_under_capacity() {
        let mut thread = ConversationThread::new("t1", "maverick");
        thread.push_turn(Turn::user("only"));

        assert_eq!(thread.trim_oldest(4), 0);
        assert_eq!(thread.len(), 1);
    }

    #[test]
    fn clear_turns_preserves_key_and_alias() {
        let mut thread = ConversationThread::new("t1", "llama-70b");
        thread.push_turn(Turn::user("hello"));
        thread.clear_turns();

        assert!(thread.is_empty());
        assert_eq!(thread.key, "t1");
        assert_eq!(thread.model_alias, "llama-70b");
    }

    #[test]
    fn turn_role_serializes_kebab_case() {
        let turn = Turn::system_error("backend unavailable");
        let json = serde_json::to_value(&turn).unwrap();
        assert_eq!(json["role"], "system-error");
    }
}
