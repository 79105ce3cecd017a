use thiserror::Error;

/// External service implicated in a fatal upstream failure.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum UpstreamService {
    Hubspot,
    Anthropic,
}

impl std::fmt::Display for UpstreamService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(match self {
            Self::Hubspot => "HubSpot",
            Self::Anthropic => "Anthropic",
        })
    }
}

/// Fatal workflow outcomes. Tolerated partial failures (a single missing
/// contact, a skipped line item) never surface here; they are logged at the
/// call site and excluded from the result.
#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum WorkflowError {
    #[error("configuration error: {0}")]
    Configuration(String),
    #[error("{0}")]
    Validation(String),
    #[error("{0}")]
    PreconditionFailed(String),
    #[error("{service} error: {message}")]
    Upstream { service: UpstreamService, message: String },
}

impl WorkflowError {
    pub fn upstream(service: UpstreamService, message: impl Into<String>) -> Self {
        Self::Upstream { service, message: message.into() }
    }

    /// Stable kind string used in logs and delivery formatting.
    pub fn classification(&self) -> &'static str {
        match self {
            Self::Configuration(_) => "configuration",
            Self::Validation(_) => "validation",
            Self::PreconditionFailed(_) => "precondition_failed",
            Self::Upstream { .. } => "upstream",
        }
    }
}
