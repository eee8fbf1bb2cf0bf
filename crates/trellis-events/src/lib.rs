//! Platform event ingest for the trellis gateway.
//!
//! One long-lived task consumes the platform's event feed, normalizes each
//! event into an [`InboundMessage`], and hands it to the dispatcher.
//! Replies post back through the platform's message API. A lost connection
//! is repaired with capped backoff; a failed model call is never retried,
//! only reported.

pub mod error;
pub mod event;
pub mod listener;
pub mod poster;

pub use error::EventError;
pub use event::{InboundMessage, PlatformEvent};
pub use listener::{reply_for, EventListener, ListenerConfig};
pub use poster::MessagePoster;
