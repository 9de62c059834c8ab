//! Error types for Lithomosaic

use thiserror::Error;

#[derive(Debug, Error)]
pub enum MosaicError {
    // Source errors
    #[error("Adapter failed for source {source_id}: {reason}")]
    Adapter {
        source_id: String,
        reason: String,
        retryable: bool,
    },

    #[error("Source not found: {source_id}")]
    SourceNotFound { source_id: String },

    #[error("Worker failed while processing source {source_id}: {reason}")]
    WorkerFailed { source_id: String, reason: String },

    #[error("Processing of source {source_id} was cancelled")]
    Cancelled { source_id: String },

    // Geometry errors
    #[error("Invalid geometry at feature {feature_id}: {reason}")]
    InvalidGeometry {
        feature_id: String,
        reason: String,
    },

    #[error("Degenerate result for feature {feature_id}: {reason}")]
    DegenerateResult {
        feature_id: String,
        reason: String,
    },

    // Ontology errors
    #[error("No ontology entry matches '{text}'")]
    OntologyMiss { text: String },

    // Mosaic state errors
    #[error("Sources must be merged in priority order: expected source #{expected}, got #{found}")]
    OutOfOrder { expected: usize, found: usize },

    #[error("Mosaic is complete. Reset the job before merging more sources")]
    MosaicComplete,

    // Configuration errors
    #[error("Invalid configuration value for {key}: {reason}")]
    ConfigInvalid { key: String, reason: String },

    // IO errors
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    // Serialization errors
    #[error("Serialization error: {0}")]
    Serialization(String),
}

impl MosaicError {
    /// Build an adapter error for a transient failure worth retrying
    pub fn transient(source_id: impl Into<String>, reason: impl Into<String>) -> Self {
        MosaicError::Adapter {
            source_id: source_id.into(),
            reason: reason.into(),
            retryable: true,
        }
    }

    /// Build an adapter error that retrying cannot fix
    pub fn adapter(source_id: impl Into<String>, reason: impl Into<String>) -> Self {
        MosaicError::Adapter {
            source_id: source_id.into(),
            reason: reason.into(),
            retryable: false,
        }
    }

    /// Whether the operation that produced this error may succeed on retry
    pub fn is_retryable(&self) -> bool {
        matches!(self, MosaicError::Adapter { retryable: true, .. })
    }

    /// Whether this error aborts the source it occurred in.
    ///
    /// Dropped-feature conditions are absorbed where they happen and only
    /// show up in counters.
    pub fn aborts_source(&self) -> bool {
        !matches!(
            self,
            MosaicError::DegenerateResult { .. } | MosaicError::OntologyMiss { .. }
        )
    }
}

pub type Result<T> = std::result::Result<T, MosaicError>;
