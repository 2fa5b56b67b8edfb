// Domain errors - Error types for the trim pipeline

use serde::Serialize;
use thiserror::Error;

/// Failure of one pipeline step, as reported to the caller
#[derive(Error, Debug, Clone, PartialEq)]
pub enum PipelineError {
    /// The identifier does not resolve to a video
    #[error("Source not found: {0}")]
    SourceNotFound(String),

    /// Network or provider failure
    #[error("Source unavailable: {0}")]
    SourceUnavailable(String),

    /// The provider demands credentials the resolver does not hold
    #[error("Authentication required: {0}")]
    AuthRequired(String),

    /// No encoding satisfies the requested capabilities
    #[error("No suitable format found: {0}")]
    NoSuitableFormat(String),

    /// The transcoding backend cannot produce this container
    #[error("Unsupported container: {0}")]
    UnsupportedContainer(String),

    /// The transcoder exited non-zero, crashed, or produced nothing
    #[error("Transcode failed: {0}")]
    TranscodeFailed(String),

    /// A bounded step ran past its deadline
    #[error("{stage} timed out after {seconds}s")]
    Timeout { stage: &'static str, seconds: u64 },

    /// Bad request shape or range
    #[error("Invalid request: {0}")]
    Validation(String),

    /// Local disk failure (temp file, output directory)
    #[error("Storage error: {0}")]
    Storage(String),
}

/// Machine-readable error kind
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum ErrorKind {
    SourceNotFound,
    SourceUnavailable,
    AuthRequired,
    NoSuitableFormat,
    UnsupportedContainer,
    TranscodeFailed,
    Timeout,
    #[serde(rename = "ValidationError")]
    Validation,
    Storage,
}

impl PipelineError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            PipelineError::SourceNotFound(_) => ErrorKind::SourceNotFound,
            PipelineError::SourceUnavailable(_) => ErrorKind::SourceUnavailable,
            PipelineError::AuthRequired(_) => ErrorKind::AuthRequired,
            PipelineError::NoSuitableFormat(_) => ErrorKind::NoSuitableFormat,
            PipelineError::UnsupportedContainer(_) => ErrorKind::UnsupportedContainer,
            PipelineError::TranscodeFailed(_) => ErrorKind::TranscodeFailed,
            PipelineError::Timeout { .. } => ErrorKind::Timeout,
            PipelineError::Validation(_) => ErrorKind::Validation,
            PipelineError::Storage(_) => ErrorKind::Storage,
        }
    }

    /// Short message shown to end users next to the details string
    pub fn user_message(&self) -> &'static str {
        match self {
            PipelineError::SourceNotFound(_)
            | PipelineError::SourceUnavailable(_)
            | PipelineError::AuthRequired(_) => "Failed to fetch video information",
            PipelineError::NoSuitableFormat(_) => "No suitable video format found",
            PipelineError::UnsupportedContainer(_) | PipelineError::TranscodeFailed(_) => {
                "Failed to process media"
            }
            PipelineError::Timeout { .. } | PipelineError::Storage(_) => "Failed to download video",
            PipelineError::Validation(_) => "Invalid request",
        }
    }

    pub fn is_validation(&self) -> bool {
        matches!(self, PipelineError::Validation(_))
    }

    /// Wrap into an I/O error so it can travel through a byte stream
    pub fn into_io(self) -> std::io::Error {
        std::io::Error::other(self)
    }

    /// Recover a pipeline error carried by an I/O error, if any
    pub fn from_io(err: std::io::Error) -> Option<PipelineError> {
        let inner = err.into_inner()?;
        inner.downcast::<PipelineError>().ok().map(|boxed| *boxed)
    }
}
