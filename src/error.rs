use thiserror::Error;

/// An intent rejected before any state transition happened.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("input is empty after trimming")]
    EmptyInput,
    #[error("a request is already in flight")]
    Busy,
}

#[derive(Debug, Error)]
pub enum ProviderError {
    #[error("provider request failed: {0}")]
    Transport(String),
    #[error("provider returned HTTP {status}: {body}")]
    Status { status: u16, body: String },
    #[error("provider returned malformed data: {0}")]
    MalformedResponse(String),
    #[error("provider returned no content")]
    EmptyResponse,
    #[error("provider configuration error: {0}")]
    Configuration(String),
}

impl From<reqwest::Error> for ProviderError {
    fn from(err: reqwest::Error) -> Self {
        ProviderError::Transport(err.to_string())
    }
}

impl From<serde_json::Error> for ProviderError {
    fn from(err: serde_json::Error) -> Self {
        ProviderError::MalformedResponse(err.to_string())
    }
}

/// Why a single keyword was left out of the layout. Never fatal.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum GeometryInputError {
    #[error("item '{label}' has non-positive weight {weight}")]
    NonPositiveWeight { label: String, weight: f64 },
    #[error("item '{label}' has non-finite weight")]
    NonFiniteWeight { label: String },
    #[error("item has an empty label")]
    EmptyLabel,
}
