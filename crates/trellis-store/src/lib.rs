//! In-memory conversation storage for the trellis gateway.
//!
//! The store is the one piece of shared mutable state touched by every
//! producer at once, so its locking is deliberately two-level: a structural
//! lock over the key-to-slot map, and one lock per conversation guarding
//! that conversation's turns. See [`SessionStore`] for the rules.

pub mod slot;
pub mod store;

pub use slot::ThreadSlot;
pub use store::{SessionStore, StoreConfig};
