use serde::Deserialize;

/// One raw event as delivered on the platform feed. Unknown fields are
/// ignored; absent ones decode as `None`.
#[derive(Debug, Clone, Deserialize)]
pub struct PlatformEvent {
    #[serde(rename = "type")]
    pub kind: String,
    #[serde(default)]
    pub user: Option<String>,
    #[serde(default)]
    pub text: Option<String>,
    #[serde(default)]
    pub channel: Option<String>,
    #[serde(default)]
    pub channel_type: Option<String>,
    #[serde(default)]
    pub ts: Option<String>,
    #[serde(default)]
    pub thread_ts: Option<String>,
    #[serde(default)]
    pub bot_id: Option<String>,
}

/// A filtered, normalized inbound message ready for dispatch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InboundMessage {
    pub channel: String,
    /// Stable conversation key: the thread root timestamp, falling back to
    /// the message's own timestamp.
    pub thread_key: String,
    pub user_id: String,
    pub text: String,
    /// Where the reply threads. `Some` for mentions (reply in-thread),
    /// `None` for direct messages (reply in the open conversation).
    pub reply_thread_ts: Option<String>,
}

impl PlatformEvent {
    /// Normalizes one event, or returns `None` for anything that must not
    /// produce a reply: the gateway's own echoes, channel chatter that is
    /// not a mention, and events missing an address or sender.
    pub fn normalize(&self) -> Option<InboundMessage> {
        if self.bot_id.is_some() {
            return None;
        }
        let mentioned = self.kind == "app_mention";
        let direct = self.kind == "message" && self.channel_type.as_deref() == Some("im");
        if !mentioned && !direct {
            return None;
        }

        let channel = self.channel.clone()?;
        let user_id = self.user.clone()?;
        let ts = self.ts.clone()?;
        let thread_key = self.thread_ts.clone().unwrap_or(ts);

        let raw_text = self.text.as_deref().unwrap_or("");
        let text = if mentioned {
            strip_mention(raw_text)
        } else {
            raw_text.trim()
        };

        Some(InboundMessage {
            channel,
            reply_thread_ts: mentioned.then(|| thread_key.clone()),
            thread_key,
            user_id,
            text: text.to_string(),
        })
    }
}

/// Drops the leading `<@Uxxxx>` token a mention carries.
fn strip_mention(text: &str) -> &str {
    let trimmed = text.trim();
    if trimmed.starts_with("<@") {
        match trimmed.split_once('>') {
            Some((_, rest)) => rest.trim(),
            None => trimmed,
        }
    } else {
        trimmed
    }
}
