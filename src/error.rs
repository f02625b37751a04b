use crate::counter::CounterError;
use std::path::PathBuf;
use thiserror::Error;

pub type PipelineResult<T> = Result<T, PipelineError>;

/// Fatal errors for a pipeline run.
///
/// Malformed input lines are never reported here; they are counted by
/// [`RejectionCounter`](crate::metrics::RejectionCounter) instead.
#[derive(Debug, Error)]
pub enum PipelineError {
    #[error("input unavailable at {}: {source}", path.display())]
    SourceUnavailable {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("no input files match {pattern}")]
    NoInputFiles { pattern: String },
    #[error("invalid input pattern {pattern}: {message}")]
    InvalidPattern { pattern: String, message: String },
    #[error("failed to write output to {}: {source}", path.display())]
    SinkWriteFailure {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("invalid configuration: {0}")]
    Config(String),
    #[error("failed to start worker pool: {0}")]
    WorkerPool(String),
    #[error(transparent)]
    Counter(#[from] CounterError),
}

impl PipelineError {
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config(message.into())
    }

    pub fn source_unavailable(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::SourceUnavailable {
            path: path.into(),
            source,
        }
    }

    pub fn sink_write_failure(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::SinkWriteFailure {
            path: path.into(),
            source,
        }
    }

    /// `true` for errors raised while reading input.
    pub fn is_source_error(&self) -> bool {
        matches!(
            self,
            Self::SourceUnavailable { .. } | Self::NoInputFiles { .. } | Self::InvalidPattern { .. }
        )
    }
}
