//! Domain-level error taxonomy for QA Automator.

use std::path::PathBuf;

/// QA Automator errors.
///
/// Only transport-level problems abort an analysis. Malformed model output is
/// never an error; it is folded into a failing [`CriterionResult`].
///
/// [`CriterionResult`]: crate::domain::CriterionResult
#[derive(Debug, thiserror::Error)]
pub enum QaError {
    #[error("failed to connect to inference backend at {host}: {reason}. Is `ollama serve` running?")]
    BackendUnreachable { host: String, reason: String },

    #[error("inference backend at {host} answered with HTTP {status}")]
    BackendStatus { host: String, status: u16 },

    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("failed to read {path:?}: {source}")]
    ReadInput {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse {path:?}: {source}")]
    ParseInput {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("duplicate criterion id: {0}")]
    DuplicateCriterion(String),

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

impl QaError {
    /// Whether the error came from the inference service rather than local input.
    pub fn is_backend_failure(&self) -> bool {
        matches!(
            self,
            Self::BackendUnreachable { .. } | Self::BackendStatus { .. }
        )
    }
}

/// Result type for QA Automator operations.
pub type Result<T> = std::result::Result<T, QaError>;
