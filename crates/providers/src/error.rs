use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    #[error("unknown provider: {name}")]
    UnknownProvider { name: String },

    #[error("missing API key for {provider} provider")]
    MissingCredential { provider: String },

    #[error("missing {field} for {provider} provider")]
    MissingConfig {
        provider: String,
        field: &'static str,
    },

    #[error("{provider} request failed: {reason}")]
    FetchFailure { provider: String, reason: String },

    #[error("{provider} returned an unreadable response: {source}")]
    ParseFailure {
        provider: String,
        #[source]
        source: serde_json::Error,
    },
}

impl Error {
    #[must_use]
    pub fn unknown_provider(name: impl Into<String>) -> Self {
        Self::UnknownProvider { name: name.into() }
    }

    #[must_use]
    pub fn missing_credential(provider: impl Into<String>) -> Self {
        Self::MissingCredential {
            provider: provider.into(),
        }
    }

    #[must_use]
    pub fn missing_config(provider: impl Into<String>, field: &'static str) -> Self {
        Self::MissingConfig {
            provider: provider.into(),
            field,
        }
    }

    #[must_use]
    pub fn fetch(provider: impl Into<String>, reason: impl std::fmt::Display) -> Self {
        Self::FetchFailure {
            provider: provider.into(),
            reason: reason.to_string(),
        }
    }

    #[must_use]
    pub fn parse(provider: impl Into<String>, source: serde_json::Error) -> Self {
        Self::ParseFailure {
            provider: provider.into(),
            source,
        }
    }

    /// Failures the catalog and status paths absorb instead of surfacing.
    pub fn is_recoverable(&self) -> bool {
        matches!(self, Self::FetchFailure { .. } | Self::ParseFailure { .. })
    }
}

pub type Result<T> = std::result::Result<T, Error>;
