//! Model routing for the trellis gateway.
//!
//! A [`ModelCatalog`] maps short aliases to immutable [`ModelDescriptor`]s.
//! The [`ModelRouter`] resolves an alias to an invocable route and performs
//! the outbound chat-completion call through one of a closed set of
//! [`ChatBackend`] variants, selected once at construction. The router never
//! retries: a failed call is classified and returned, and retry policy is
//! the caller's decision.

pub mod backends;
pub mod catalog;
pub mod error;
pub mod router;
pub mod wire;

pub use backends::ChatBackend;
pub use catalog::{ModelCatalog, ModelDescriptor, ProviderKind};
pub use error::{BackendError, RouterError};
pub use router::{InvokeParams, ModelRouter, Route};
pub use wire::{CompletionOutcome, WireMessage};
