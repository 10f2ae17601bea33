use thiserror::Error;

/// Failures that terminate a pipeline stage.
///
/// Per-item fetch problems never show up here; the collector absorbs them
/// (see `ItemFetchFailure` in `database_ops::steam`).
#[derive(Error, Debug)]
pub enum PipelineError {
    #[error("catalog listing unavailable: {0}")]
    UpstreamUnavailable(String),

    #[error("clean dataset is missing required columns: {missing:?}")]
    SchemaMismatch { missing: Vec<String> },

    #[error("invalid clean dataset row {line}: {message}")]
    InvalidRow { line: u64, message: String },

    #[error("load transaction failed and was rolled back: {0}")]
    PersistenceFailure(#[source] sqlx::Error),

    /// Database errors outside the load transaction (connect, DDL, reads).
    #[error("database error: {0}")]
    Database(#[source] sqlx::Error),

    #[error("configuration error: {0}")]
    Config(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),
}

pub type Result<T> = std::result::Result<T, PipelineError>;
