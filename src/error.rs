//! Error types for the verification core.

/// Fatal failure while validating fragments or reading a persisted report.
///
/// Anything that is not a `SchemaError` leaves the pipeline with a fully
/// valid report; warnings never take this path.
#[derive(Debug, thiserror::Error)]
pub enum SchemaError {
    #[error("{source_name}: invalid JSON: {detail}")]
    MalformedFragment { source_name: String, detail: String },

    #[error("{source_name}: validation errors:\n{details}")]
    InvalidFragment { source_name: String, details: String },

    /// Aggregate of every failing fragment in one batch. Assembly is
    /// all-or-nothing, so this lists all of them, not just the first.
    #[error("fragment validation errors:\n{details}")]
    InvalidBatch { details: String },

    #[error("{path}: invalid report: {detail}")]
    MalformedReport { path: String, detail: String },

    #[error("failed to read {path}: {detail}")]
    Io { path: String, detail: String },
}

pub type SchemaResult<T> = Result<T, SchemaError>;
