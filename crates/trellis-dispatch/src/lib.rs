//! The dispatch pipeline of the trellis gateway.
//!
//! One entry point, [`Dispatcher::dispatch`], turns a normalized chat
//! request into a reply or a classified failure. It owns the
//! append-invoke-append window for each conversation, records every
//! outcome in the metrics aggregator, and carries the conversation
//! commands (`help`, `models`, `use`, `clear`) that both ingest producers
//! share.

pub mod commands;
pub mod config;
pub mod dispatcher;
pub mod maintenance;

pub use commands::Command;
pub use config::DispatchConfig;
pub use dispatcher::{DispatchFailure, DispatchOutcome, Dispatcher};
pub use maintenance::spawn_maintenance;
