use std::time::Duration;

use thiserror::Error;

/// Resolution-time failures. Fatal to the single request that triggered
/// them; a backend is never contacted.
#[derive(Debug, Error)]
pub enum RouterError {
    #[error("unknown model alias '{0}'")]
    UnknownAlias(String),

    #[error("missing credential for model '{alias}': set {env}")]
    MissingCredential { alias: String, env: String },
}

impl RouterError {
    /// A message safe to show to the person who sent the request.
    pub fn user_message(&self) -> String {
        match self {
            Self::UnknownAlias(alias) => format!(
                "Model '{alias}' not found. Send `models` to see the available options."
            ),
            Self::MissingCredential { alias, .. } => format!(
                "Model '{alias}' is not configured on this gateway. \
                 Ask an administrator to add its credential."
            ),
        }
    }
}

/// Invocation-time failures, classified so the caller can decide how to
/// surface them. None of these trigger an automatic retry: a duplicate
/// call is a duplicate bill.
#[derive(Debug, Error)]
pub enum BackendError {
    #[error("request timed out after {0:?}")]
    Timeout(Duration),

    #[error("backend rejected the credential: HTTP {status}: {detail}")]
    AuthRejected { status: u16, detail: String },

    #[error("backend rate limited the request: {0}")]
    RateLimited(String),

    #[error("malformed backend response: {0}")]
    MalformedResponse(String),

    #[error("backend API error: HTTP {status}: {detail}")]
    Api { status: u16, detail: String },

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),
}

impl BackendError {
    /// A message safe to show to the person who sent the request. Status
    /// codes and raw bodies stay in the logs.
    pub fn user_message(&self) -> String {
        match self {
            Self::Timeout(_) => {
                "The model took too long to respond. Please try again.".to_string()
            }
            Self::AuthRejected { .. } => {
                "The gateway could not authenticate with the model backend. \
                 Ask an administrator to check the credentials."
                    .to_string()
            }
            Self::RateLimited(_) => {
                "The model is handling too many requests right now. \
                 Please wait a moment and try again."
                    .to_string()
            }
            Self::MalformedResponse(_) => {
                "The model returned a response the gateway could not read.".to_string()
            }
            Self::Api { .. } | Self::Http(_) => {
                "The model backend reported an error. Please try again later.".to_string()
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unknown_alias_message_names_the_alias() {
        let err = RouterError::UnknownAlias("gpt-9".to_string());
        assert!(err.user_message().contains("'gpt-9'"));
    }

    #[test]
    fn backend_user_messages_never_leak_detail() {
        let err = BackendError::AuthRejected {
            status: 401,
            detail: "token xyz expired".to_string(),
        };
        assert!(!err.user_message().contains("xyz"));
    }
}
