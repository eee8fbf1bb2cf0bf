mod compatible;
mod databricks;
mod openai;
pub(crate) mod openai_compat;

pub use compatible::CompatibleBackend;
pub use databricks::DatabricksBackend;
pub use openai::OpenAiBackend;

use async_trait::async_trait;

use crate::catalog::ModelDescriptor;
use crate::error::BackendError;
use crate::router::InvokeParams;
use crate::wire::{CompletionOutcome, WireMessage};

/// One provider variant. Implementations are constructed once when the
/// router is built and invoked through this contract only; nothing outside
/// this module branches on the provider kind.
#[async_trait]
pub trait ChatBackend: Send + Sync {
    /// Performs exactly one outbound completion call. No retries, no
    /// caching.
    async fn complete(
        &self,
        descriptor: &ModelDescriptor,
        credential: &str,
        messages: &[WireMessage],
        params: &InvokeParams,
    ) -> Result<CompletionOutcome, BackendError>;
}
