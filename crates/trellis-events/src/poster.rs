use serde::{Deserialize, Serialize};

use crate::error::EventError;

/// Posts replies through the platform's message API.
#[derive(Clone)]
pub struct MessagePoster {
    client: reqwest::Client,
    post_url: String,
    bot_token: String,
}

#[derive(Debug, Serialize)]
struct PostMessageBody<'a> {
    channel: &'a str,
    text: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    thread_ts: Option<&'a str>,
}

#[derive(Debug, Deserialize)]
struct PostMessageResponse {
    ok: bool,
    #[serde(default)]
    error: Option<String>,
}

impl MessagePoster {
    pub fn new(
        client: reqwest::Client,
        post_url: impl Into<String>,
        bot_token: impl Into<String>,
    ) -> Self {
        Self {
            client,
            post_url: post_url.into(),
            bot_token: bot_token.into(),
        }
    }

    /// Posts one message. The platform reports failures inside a 200
    /// response, so both the status and the `ok` field are checked.
    pub async fn post_message(
        &self,
        channel: &str,
        text: &str,
        thread_ts: Option<&str>,
    ) -> Result<(), EventError> {
        let body = PostMessageBody {
            channel,
            text,
            thread_ts,
        };
        let response = self
            .client
            .post(&self.post_url)
            .bearer_auth(&self.bot_token)
            .json(&body)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            return Err(EventError::Api(format!("HTTP {}", status.as_u16())));
        }
        let decoded: PostMessageResponse = response.json().await?;
        if !decoded.ok {
            return Err(EventError::Api(
                decoded.error.unwrap_or_else(|| "unspecified error".to_string()),
            ));
        }
        log::debug!("posted reply to {channel}");
        Ok(())
    }
}
