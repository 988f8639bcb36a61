//! Error types for annopipe.

use crate::keys::KeyId;
use thiserror::Error;

/// Result type for annopipe operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Error type for annopipe operations.
#[derive(Error, Debug)]
#[non_exhaustive]
pub enum Error {
    /// Pipeline construction failed: a stage requires keys no earlier stage
    /// produces. Raised at build time, never at run time.
    #[error("pipeline misconfigured at stage '{stage}': missing required keys {missing:?}")]
    Configuration {
        /// Name of the first offending stage.
        stage: String,
        /// Keys the stage requires that no earlier stage produces.
        missing: Vec<KeyId>,
    },

    /// A stage failed on one document. Recovered at document granularity.
    #[error("annotator '{stage}' failed on document '{doc}': {message}")]
    Annotation {
        /// Name of the failing stage.
        stage: String,
        /// Identifier of the document being processed.
        doc: String,
        /// What went wrong.
        message: String,
    },

    /// Malformed record on read. The position is the 1-based record index
    /// within the stream.
    #[error("malformed record at position {position}: {message}")]
    Serialization {
        /// 1-based record position within the stream.
        position: usize,
        /// What was malformed.
        message: String,
    },

    /// An edge references a node identity absent from the graph's node table.
    #[error("graph inconsistency: {0}")]
    GraphConsistency(String),

    /// A queued document was dropped by cancellation before dispatch.
    #[error("document '{doc}' was cancelled before dispatch")]
    Cancelled {
        /// Identifier of the dropped document.
        doc: String,
    },

    /// The record stream is exhausted (clean end, not corruption).
    #[error("end of record stream")]
    EndOfStream,

    /// Invalid input provided.
    #[error("invalid input: {0}")]
    InvalidInput(String),

    /// IO error.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl Error {
    /// Create a pipeline configuration error.
    #[must_use]
    pub fn configuration(stage: impl Into<String>, missing: Vec<KeyId>) -> Self {
        Self::Configuration {
            stage: stage.into(),
            missing,
        }
    }

    /// Create a per-document annotation error.
    #[must_use]
    pub fn annotation(
        stage: impl Into<String>,
        doc: impl Into<String>,
        message: impl Into<String>,
    ) -> Self {
        Self::Annotation {
            stage: stage.into(),
            doc: doc.into(),
            message: message.into(),
        }
    }

    /// Create a serialization error at a stream position.
    #[must_use]
    pub fn serialization(position: usize, message: impl Into<String>) -> Self {
        Self::Serialization {
            position,
            message: message.into(),
        }
    }

    /// Create a graph consistency error.
    #[must_use]
    pub fn graph(message: impl Into<String>) -> Self {
        Self::GraphConsistency(message.into())
    }

    /// Create a cancellation error for a dropped document.
    #[must_use]
    pub fn cancelled(doc: impl Into<String>) -> Self {
        Self::Cancelled { doc: doc.into() }
    }

    /// Create an invalid input error.
    #[must_use]
    pub fn invalid_input(message: impl Into<String>) -> Self {
        Self::InvalidInput(message.into())
    }

    /// True if this error marks a clean end of a record stream, as opposed
    /// to corruption mid-stream.
    #[must_use]
    pub fn is_end_of_stream(&self) -> bool {
        matches!(self, Self::EndOfStream)
    }
}
