use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

use anyhow::Context;
use serde::{Deserialize, Serialize};

/// The closed set of backend variants the gateway can talk to. Chosen per
/// descriptor when the catalog is loaded, never branched on elsewhere.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum ProviderKind {
    Databricks,
    OpenAi,
    Compatible,
}

impl ProviderKind {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Databricks => "databricks",
            Self::OpenAi => "openai",
            Self::Compatible => "compatible",
        }
    }
}

/// One routable model. Immutable once the catalog is built.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ModelDescriptor {
    pub alias: String,
    pub provider: ProviderKind,
    pub base_url: String,
    /// Name of the environment variable holding the bearer credential.
    pub credential_env: String,
    pub model_id: String,
}

#[derive(Debug, Deserialize)]
struct CatalogFile {
    default: String,
    models: Vec<ModelDescriptor>,
}

/// Alias table loaded once at startup and read-only thereafter.
#[derive(Debug, Clone)]
pub struct ModelCatalog {
    default_alias: String,
    entries: BTreeMap<String, ModelDescriptor>,
}

impl ModelCatalog {
    pub fn new(default_alias: impl Into<String>, models: Vec<ModelDescriptor>) -> Self {
        let entries = models
            .into_iter()
            .map(|descriptor| (descriptor.alias.clone(), descriptor))
            .collect();
        Self {
            default_alias: default_alias.into(),
            entries,
        }
    }

    /// The built-in table: the foundation models served by a Databricks
    /// workspace, all authenticated with `DATABRICKS_TOKEN`.
    pub fn builtin(databricks_host: &str) -> Self {
        let base_url = format!("{}/serving-endpoints", databricks_host.trim_end_matches('/'));
        let table = [
            ("maverick", "databricks-llama-4-maverick"),
            ("llama-70b", "databricks-meta-llama-3-3-70b-instruct"),
            ("llama-405b", "databricks-meta-llama-3-1-405b-instruct"),
            ("llama-8b", "databricks-meta-llama-3-1-8b-instruct"),
            ("claude-sonnet", "databricks-claude-sonnet-4-5"),
            ("claude-opus", "databricks-claude-opus-4-1"),
            ("gpt-120b", "databricks-gpt-oss-120b"),
        ];

        let models = table
            .into_iter()
            .map(|(alias, model_id)| ModelDescriptor {
                alias: alias.to_string(),
                provider: ProviderKind::Databricks,
                base_url: base_url.clone(),
                credential_env: "DATABRICKS_TOKEN".to_string(),
                model_id: model_id.to_string(),
            })
            .collect();

        Self::new("maverick", models)
    }

    /// Loads a catalog from a JSON file of the shape
    /// `{"default": alias, "models": [descriptor, ...]}`.
    pub fn from_file(path: &Path) -> anyhow::Result<Self> {
        let raw = fs::read_to_string(path)
            .with_context(|| format!("reading model catalog {}", path.display()))?;
        let file: CatalogFile = serde_json::from_str(&raw)
            .with_context(|| format!("parsing model catalog {}", path.display()))?;

        let catalog = Self::new(file.default, file.models);
        if catalog.entries.is_empty() {
            anyhow::bail!("model catalog {} lists no models", path.display());
        }
        if !catalog.entries.contains_key(&catalog.default_alias) {
            anyhow::bail!(
                "model catalog {} default '{}' is not among its models",
                path.display(),
                catalog.default_alias
            );
        }
        Ok(catalog)
    }

    pub fn get(&self, alias: &str) -> Option<&ModelDescriptor> {
        self.entries.get(alias)
    }

    pub fn default_alias(&self) -> &str {
        &self.default_alias
    }

    pub fn descriptors(&self) -> impl Iterator<Item = &ModelDescriptor> {
        self.entries.values()
    }

    /// Alias to underlying model id, sorted by alias.
    pub fn alias_table(&self) -> BTreeMap<String, String> {
        self.entries
            .iter()
            .map(|(alias, descriptor)| (alias.clone(), descriptor.model_id.clone()))
            .collect()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
