use std::sync::Arc;
use std::time::Duration;

use eventsource_stream::Eventsource;
use futures_util::StreamExt;
use trellis_core::{ChatRequest, RequestOrigin};
use trellis_dispatch::{Command, DispatchOutcome, Dispatcher};

use crate::error::EventError;
use crate::event::{InboundMessage, PlatformEvent};
use crate::poster::MessagePoster;

const INITIAL_BACKOFF: Duration = Duration::from_secs(1);
const MAX_BACKOFF: Duration = Duration::from_secs(60);

#[derive(Clone)]
pub struct ListenerConfig {
    /// Endpoint delivering the platform event feed.
    pub events_url: String,
    /// Bearer token for the feed connection.
    pub app_token: String,
    /// chat.postMessage-shaped endpoint for replies.
    pub post_url: String,
    /// Bearer token for posting replies.
    pub bot_token: String,
}

/// The long-lived event consumer. One instance owns the feed connection;
/// each normalized message is handled on its own task, so a slow backend
/// call never stalls feed consumption. Per-conversation ordering is
/// enforced downstream by the conversation's lock, not here.
pub struct EventListener {
    config: ListenerConfig,
    client: reqwest::Client,
    dispatcher: Arc<Dispatcher>,
    poster: MessagePoster,
}

impl EventListener {
    pub fn new(config: ListenerConfig, dispatcher: Arc<Dispatcher>) -> Self {
        let client = reqwest::Client::new();
        let poster = MessagePoster::new(client.clone(), &config.post_url, &config.bot_token);
        Self {
            config,
            client,
            dispatcher,
            poster,
        }
    }

    /// Consumes the feed until the process stops, reconnecting with capped
    /// backoff. The backoff resets once a connection delivers events.
    pub async fn run(&self) {
        let mut backoff = INITIAL_BACKOFF;
        loop {
            match self.run_once().await {
                Ok(seen) => {
                    log::warn!("event stream closed after {seen} events");
                    if seen > 0 {
                        backoff = INITIAL_BACKOFF;
                    }
                }
                Err(err) => log::error!("event stream failed: {err}"),
            }
            log::info!("reconnecting to event stream in {}s", backoff.as_secs());
            tokio::time::sleep(backoff).await;
            backoff = (backoff * 2).min(MAX_BACKOFF);
        }
    }

    /// One connection lifetime: connect, consume events until the stream
    /// ends, return how many events arrived.
    pub async fn run_once(&self) -> Result<u64, EventError> {
        let response = self
            .client
            .get(&self.config.events_url)
            .bearer_auth(&self.config.app_token)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            return Err(EventError::Connect(status.as_u16()));
        }
        log::info!("connected to event stream");

        let mut stream = response.bytes_stream().eventsource();
        let mut seen = 0u64;
        while let Some(event) = stream.next().await {
            match event {
                Ok(event) => {
                    seen += 1;
                    self.handle_payload(&event.data);
                }
                Err(err) => {
                    log::warn!("event stream decode error: {err}");
                    break;
                }
            }
        }
        Ok(seen)
    }

    /// Decodes one feed payload and spawns its handler. An undecodable
    /// payload is dropped; it must never take the connection down.
    fn handle_payload(&self, data: &str) {
        let event: PlatformEvent = match serde_json::from_str(data) {
            Ok(event) => event,
            Err(err) => {
                log::debug!("ignoring undecodable event payload: {err}");
                return;
            }
        };
        match event.normalize() {
            Some(message) => {
                log::info!(
                    "[{}] {} event from {} in {}",
                    message.thread_key,
                    event.kind,
                    message.user_id,
                    message.channel
                );
                self.spawn_handler(message);
            }
            None => log::debug!("ignoring {} event", event.kind),
        }
    }

    fn spawn_handler(&self, message: InboundMessage) {
        let dispatcher = self.dispatcher.clone();
        let poster = self.poster.clone();
        tokio::spawn(async move {
            let reply = reply_for(&dispatcher, &message).await;
            if let Err(err) = poster
                .post_message(&message.channel, &reply, message.reply_thread_ts.as_deref())
                .await
            {
                log::error!("[{}] failed to post reply: {err}", message.thread_key);
            }
        });
    }
}

/// Produces the reply text for one normalized message: a command reply, a
/// model reply with its footer, or an error line.
pub async fn reply_for(dispatcher: &Dispatcher, message: &InboundMessage) -> String {
    if let Some(command) = Command::parse(&message.text) {
        return dispatcher
            .execute_command(&message.thread_key, command)
            .await;
    }

    let request = ChatRequest::new(
        RequestOrigin::Platform,
        message.thread_key.clone(),
        message.user_id.clone(),
        message.text.clone(),
    );
    match dispatcher.dispatch(request).await {
        DispatchOutcome::Reply(reply) => {
            format!("{}\n\n_Using {} ({})_", reply.text, reply.alias, reply.model_id)
        }
        DispatchOutcome::Failed { message, .. } => format!("❌ {message}"),
    }
}
