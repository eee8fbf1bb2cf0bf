use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use reqwest::Client;

use crate::backends::{ChatBackend, CompatibleBackend, DatabricksBackend, OpenAiBackend};
use crate::catalog::{ModelCatalog, ModelDescriptor, ProviderKind};
use crate::error::{BackendError, RouterError};
use crate::wire::{CompletionOutcome, WireMessage};

/// Per-invocation parameters. Owned by the caller, passed through verbatim.
#[derive(Debug, Clone)]
pub struct InvokeParams {
    pub max_tokens: u32,
    pub temperature: f32,
    pub timeout: Duration,
}

impl Default for InvokeParams {
    fn default() -> Self {
        Self {
            max_tokens: 1024,
            temperature: 0.7,
            timeout: Duration::from_secs(60),
        }
    }
}

/// A resolved invocation target: descriptor plus the credential that was
/// verified to exist at resolution time.
pub struct Route<'a> {
    pub descriptor: &'a ModelDescriptor,
    credential: &'a str,
}

struct BackendSet {
    databricks: Arc<dyn ChatBackend>,
    open_ai: Arc<dyn ChatBackend>,
    compatible: Arc<dyn ChatBackend>,
}

impl BackendSet {
    fn new(client: Client) -> Self {
        Self {
            databricks: Arc::new(DatabricksBackend::new(client.clone())),
            open_ai: Arc::new(OpenAiBackend::new(client.clone())),
            compatible: Arc::new(CompatibleBackend::new(client)),
        }
    }

    fn for_kind(&self, kind: ProviderKind) -> &dyn ChatBackend {
        match kind {
            ProviderKind::Databricks => self.databricks.as_ref(),
            ProviderKind::OpenAi => self.open_ai.as_ref(),
            ProviderKind::Compatible => self.compatible.as_ref(),
        }
    }
}

/// Resolves aliases and performs outbound invocations. Stateless beyond its
/// immutable catalog and credential table, so any number of tasks may call
/// it concurrently.
pub struct ModelRouter {
    catalog: ModelCatalog,
    credentials: HashMap<String, String>,
    backends: BackendSet,
}

impl ModelRouter {
    pub fn new(catalog: ModelCatalog, credentials: HashMap<String, String>) -> Self {
        Self {
            catalog,
            credentials,
            backends: BackendSet::new(Client::new()),
        }
    }

    /// Reads the credential for every distinct `credential_env` the catalog
    /// references from the process environment. Missing variables are
    /// logged; the affected models fail at resolution time.
    pub fn from_env(catalog: ModelCatalog) -> Self {
        let mut credentials = HashMap::new();
        for descriptor in catalog.descriptors() {
            if credentials.contains_key(&descriptor.credential_env) {
                continue;
            }
            match std::env::var(&descriptor.credential_env) {
                Ok(value) if !value.is_empty() => {
                    log::info!("loaded credential from {}", descriptor.credential_env);
                    credentials.insert(descriptor.credential_env.clone(), value);
                }
                _ => {
                    log::warn!(
                        "credential {} not set; models using it will be unavailable",
                        descriptor.credential_env
                    );
                }
            }
        }
        Self::new(catalog, credentials)
    }

    pub fn catalog(&self) -> &ModelCatalog {
        &self.catalog
    }

    pub fn has_credentials(&self) -> bool {
        !self.credentials.is_empty()
    }

    /// Maps an alias to an invocable route. Fails fast on an unknown alias
    /// or an absent credential; no backend is contacted.
    pub fn resolve(&self, alias: &str) -> Result<Route<'_>, RouterError> {
        let descriptor = self
            .catalog
            .get(alias)
            .ok_or_else(|| RouterError::UnknownAlias(alias.to_string()))?;
        let credential = self.credentials.get(&descriptor.credential_env).ok_or_else(|| {
            RouterError::MissingCredential {
                alias: alias.to_string(),
                env: descriptor.credential_env.clone(),
            }
        })?;
        Ok(Route {
            descriptor,
            credential,
        })
    }

    /// Exactly one outbound call. Retry policy belongs to the caller so a
    /// duplicate billable request is always a deliberate decision.
    pub async fn invoke(
        &self,
        route: &Route<'_>,
        messages: &[WireMessage],
        params: &InvokeParams,
    ) -> Result<CompletionOutcome, BackendError> {
        let backend = self.backends.for_kind(route.descriptor.provider);
        backend
            .complete(route.descriptor, route.credential, messages, params)
            .await
    }
}
