use std::sync::Arc;
use std::time::Instant;

use trellis_core::{ChatReply, ChatRequest, ConversationThread, TokenUsage, Turn, TurnRole};
use trellis_llm::{BackendError, InvokeParams, ModelRouter, RouterError, WireMessage};
use trellis_metrics::MetricsAggregator;
use trellis_store::SessionStore;

use crate::commands::Command;
use crate::config::DispatchConfig;

/// Classification of a failed dispatch, for callers that map failures to
/// transport-level codes. The user-facing message travels alongside.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DispatchFailure {
    UnknownModel,
    MissingCredential,
    Timeout,
    RateLimited,
    AuthRejected,
    MalformedResponse,
    Upstream,
}

impl DispatchFailure {
    /// Stable identifier used in error payloads.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::UnknownModel => "unknown_model",
            Self::MissingCredential => "missing_credential",
            Self::Timeout => "timeout",
            Self::RateLimited => "rate_limited",
            Self::AuthRejected => "auth_rejected",
            Self::MalformedResponse => "malformed_response",
            Self::Upstream => "upstream_error",
        }
    }

    fn from_router(err: &RouterError) -> Self {
        match err {
            RouterError::UnknownAlias(_) => Self::UnknownModel,
            RouterError::MissingCredential { .. } => Self::MissingCredential,
        }
    }

    fn from_backend(err: &BackendError) -> Self {
        match err {
            BackendError::Timeout(_) => Self::Timeout,
            BackendError::RateLimited(_) => Self::RateLimited,
            BackendError::AuthRejected { .. } => Self::AuthRejected,
            BackendError::MalformedResponse(_) => Self::MalformedResponse,
            BackendError::Api { .. } | BackendError::Http(_) => Self::Upstream,
        }
    }
}

/// What one dispatch produced. Both variants are terminal; nothing below
/// the dispatcher retries or propagates a fault past this boundary.
#[derive(Debug, Clone)]
pub enum DispatchOutcome {
    Reply(ChatReply),
    Failed {
        kind: DispatchFailure,
        message: String,
    },
}

impl DispatchOutcome {
    /// The text to show the person who sent the request, reply or error.
    pub fn text(&self) -> &str {
        match self {
            Self::Reply(reply) => &reply.text,
            Self::Failed { message, .. } => message,
        }
    }

    pub fn is_reply(&self) -> bool {
        matches!(self, Self::Reply(_))
    }
}

/// Turns normalized chat requests into replies.
///
/// For each request the dispatcher holds the conversation's slot lock
/// across the whole append-invoke-append window, so turns within one
/// thread are totally ordered by lock acquisition. The store's structural
/// lock is released before any network call; only the per-thread lock
/// spans the invocation.
pub struct Dispatcher {
    store: Arc<SessionStore>,
    router: Arc<ModelRouter>,
    metrics: Arc<MetricsAggregator>,
    config: DispatchConfig,
}

impl Dispatcher {
    pub fn new(
        store: Arc<SessionStore>,
        router: Arc<ModelRouter>,
        metrics: Arc<MetricsAggregator>,
        config: DispatchConfig,
    ) -> Self {
        Self {
            store,
            router,
            metrics,
            config,
        }
    }

    pub fn config(&self) -> &DispatchConfig {
        &self.config
    }

    /// Runs one request through the pipeline: append the user turn, route
    /// the active alias, invoke the backend, append the result, record the
    /// metric. Every failure is converted into a reply turn plus a failed
    /// metric; nothing escapes as an error.
    pub async fn dispatch(&self, request: ChatRequest) -> DispatchOutcome {
        let started = Instant::now();
        log::info!(
            "[{}] dispatching {} request from {}",
            request.thread_key,
            request.origin,
            request.user_id
        );

        let slot = self.store.get_or_create(&request.thread_key).await;
        let mut thread = slot.lock().await;

        thread.push_turn(Turn::user(&request.text));
        thread.trim_oldest(self.store.config().max_turns);
        slot.touch();

        // A requested alias only sticks once it resolves; an unknown one
        // fails this request without poisoning the thread.
        let alias = request
            .requested_alias
            .clone()
            .unwrap_or_else(|| thread.model_alias.clone());

        let route = match self.router.resolve(&alias) {
            Ok(route) => route,
            Err(err) => {
                log::warn!("[{}] routing failed: {err}", request.thread_key);
                let message = err.user_message();
                thread.push_turn(Turn::system_error(&message));
                slot.touch();
                self.metrics.record_request(
                    &alias,
                    TokenUsage::default(),
                    started.elapsed(),
                    &request.user_id,
                    false,
                );
                return DispatchOutcome::Failed {
                    kind: DispatchFailure::from_router(&err),
                    message,
                };
            }
        };

        if alias != thread.model_alias {
            log::info!(
                "[{}] model switched {} -> {alias}",
                request.thread_key,
                thread.model_alias
            );
            thread.set_alias(&alias);
        }

        let messages = self.assemble_prompt(&thread);
        let params = InvokeParams {
            max_tokens: self.config.max_tokens,
            temperature: self.config.temperature,
            timeout: self.config.request_timeout,
        };
        log::debug!(
            "[{}] invoking {} with {} messages",
            request.thread_key,
            route.descriptor.model_id,
            messages.len()
        );

        match self.router.invoke(&route, &messages, &params).await {
            Ok(outcome) => {
                let elapsed = started.elapsed();
                thread.push_turn(Turn::assistant(&outcome.text, outcome.usage));
                thread.trim_oldest(self.store.config().max_turns);
                slot.touch();
                self.metrics.record_request(
                    &alias,
                    outcome.usage,
                    elapsed,
                    &request.user_id,
                    true,
                );
                log::info!(
                    "[{}] recorded success: {} tokens in {}ms",
                    request.thread_key,
                    outcome.usage.total(),
                    elapsed.as_millis()
                );
                DispatchOutcome::Reply(ChatReply {
                    text: outcome.text,
                    alias,
                    model_id: route.descriptor.model_id.clone(),
                    usage: outcome.usage,
                    elapsed_ms: u64::try_from(elapsed.as_millis()).unwrap_or(u64::MAX),
                })
            }
            Err(err) => {
                let elapsed = started.elapsed();
                log::warn!("[{}] invocation failed: {err}", request.thread_key);
                let message = err.user_message();
                thread.push_turn(Turn::system_error(&message));
                slot.touch();
                self.metrics.record_request(
                    &alias,
                    TokenUsage::default(),
                    elapsed,
                    &request.user_id,
                    false,
                );
                DispatchOutcome::Failed {
                    kind: DispatchFailure::from_backend(&err),
                    message,
                }
            }
        }
    }

    /// Executes a conversation command against `thread_key` and returns the
    /// reply text. Shared by the platform listener and the CLI so both
    /// behave identically.
    pub async fn execute_command(&self, thread_key: &str, command: Command) -> String {
        match command {
            Command::Help => {
                let current = self.describe_current(thread_key).await;
                format!(
                    "*Trellis Help* 🤖\n\n\
                     *Current model:* {current}\n\n\
                     *Commands:*\n\
                     • `help` - Show this message\n\
                     • `models` - List all models\n\
                     • `use [model-name]` - Switch models\n\
                     • `clear` - Clear history\n\n\
                     *Available models:*\n{}",
                    self.model_lines()
                )
            }
            Command::Models => {
                let current = self.describe_current(thread_key).await;
                format!(
                    "*Available models:*\n\n{}\n\n\
                     *Current:* {current}\n\n\
                     Use `use [model-name]` to switch.",
                    self.model_lines()
                )
            }
            Command::Use(alias) => match self.router.catalog().get(&alias) {
                Some(descriptor) => {
                    self.store.switch_model(thread_key, &alias).await;
                    log::info!("[{thread_key}] switched model to {alias}");
                    format!("✅ Switched to {alias} ({})", descriptor.model_id)
                }
                None => "❌ Model not found. Send `models` to see the options.".to_string(),
            },
            Command::Clear => {
                self.store.clear(thread_key).await;
                let alias = self.current_alias(thread_key).await;
                format!("✅ History cleared! (Using: {alias})")
            }
        }
    }

    /// Builds the outbound message list: the configured system prompt,
    /// then the thread's user and assistant turns in order. Error turns
    /// are local annotations and are never forwarded.
    fn assemble_prompt(&self, thread: &ConversationThread) -> Vec<WireMessage> {
        let mut messages = Vec::with_capacity(thread.len() + 1);
        if !self.config.system_prompt.is_empty() {
            messages.push(WireMessage::system(&self.config.system_prompt));
        }
        for turn in &thread.turns {
            match turn.role {
                TurnRole::User => messages.push(WireMessage::user(&turn.content)),
                TurnRole::Assistant => messages.push(WireMessage::assistant(&turn.content)),
                TurnRole::SystemError => {}
            }
        }
        messages
    }

    async fn current_alias(&self, thread_key: &str) -> String {
        match self.store.model_alias(thread_key).await {
            Some(alias) => alias,
            None => self.store.config().default_alias.clone(),
        }
    }

    async fn describe_current(&self, thread_key: &str) -> String {
        let alias = self.current_alias(thread_key).await;
        match self.router.catalog().get(&alias) {
            Some(descriptor) => format!("{alias} ({})", descriptor.model_id),
            None => alias,
        }
    }

    fn model_lines(&self) -> String {
        let default_alias = self.router.catalog().default_alias();
        self.router
            .catalog()
            .alias_table()
            .iter()
            .map(|(alias, model_id)| {
                if alias.as_str() == default_alias {
                    format!("• *{alias}*: {model_id} (default)")
                } else {
                    format!("• *{alias}*: {model_id}")
                }
            })
            .collect::<Vec<_>>()
            .join("\n")
    }
}
