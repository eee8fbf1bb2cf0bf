//! HTTP surface of the trellis gateway: the chat and administration
//! endpoints plus the metrics dashboard.

pub mod error;
pub mod handlers;
pub mod logging;
pub mod server;
pub mod state;

pub use error::AppError;
pub use server::{app_config, run_server};
pub use state::AppState;
