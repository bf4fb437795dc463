//! Error types for the learning path synthesis engine.

use thiserror::Error;

/// Transport-level errors from the generation and persistence collaborators
#[derive(Debug, Error)]
pub enum ServiceError {
    #[error("Service authentication failed: {0}")]
    AuthFailed(String),

    #[error("Service rate limit exceeded: {0}")]
    RateLimited(String),

    #[error("Service endpoint not found: {0}")]
    EndpointNotFound(String),

    #[error("Service request failed: {0}")]
    RequestFailed(String),

    #[error("Invalid response from service: {0}")]
    InvalidResponse(String),

    #[error("Failed to build HTTP client: {0}")]
    ClientBuild(String),
}

/// Engine-level errors raised during flow synthesis
#[derive(Debug, Error)]
pub enum SynthesisError {
    /// External call failed after one retry. Non-fatal: the unit is skipped
    /// and synthesis continues.
    #[error("Generation failed: {0}")]
    GenerationFailed(String),

    /// No transform exists for the requested activity kind. Treated as a
    /// generation failure for the affected unit.
    #[error("Unsupported activity kind: {0}")]
    UnsupportedActivityKind(String),

    /// The assembler found an edge with no defined successor. Fatal: nothing
    /// is persisted.
    #[error("Structural graph error: {0}")]
    StructuralGraph(String),

    /// The storage collaborator rejected the flow. Fatal, surfaced to the
    /// caller, never retried here.
    #[error("Flow persistence rejected: status {status}: {message}")]
    Persistence { status: u16, message: String },

    #[error("Service error: {0}")]
    Service(#[from] ServiceError),

    #[error("Configuration error: {0}")]
    Config(String),

    /// An input document could not be parsed. Raised by the CLI surface
    /// before synthesis starts.
    #[error("Invalid document: {0}")]
    InvalidDocument(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl SynthesisError {
    /// Whether this error aborts the whole synthesis run. Per-unit generation
    /// failures are absorbed by the generator loop; everything else
    /// propagates.
    pub fn is_fatal(&self) -> bool {
        !matches!(
            self,
            SynthesisError::GenerationFailed(_) | SynthesisError::UnsupportedActivityKind(_)
        )
    }
}

impl From<config::ConfigError> for SynthesisError {
    fn from(err: config::ConfigError) -> Self {
        SynthesisError::Config(err.to_string())
    }
}
