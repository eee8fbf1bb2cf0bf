//! Shared domain types for the trellis gateway.
//!
//! Everything here is plain data: conversation threads and their turns,
//! the normalized request/reply shapes both ingest producers emit, and
//! token accounting. No I/O, no locking.

pub mod request;
pub mod thread;
pub mod usage;

pub use request::{ChatReply, ChatRequest, RequestOrigin};
pub use thread::{ConversationThread, Turn, TurnRole};
pub use usage::TokenUsage;
