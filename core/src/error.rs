use std::path::PathBuf;

/// Errors surfaced by the recommendation engine.
#[derive(thiserror::Error, Debug)]
pub enum EngineError {
    /// Neither a persisted index nor the raw dataset could produce an index.
    #[error("data unavailable: {0}")]
    DataUnavailable(String),

    #[error("no title matches {0:?}")]
    NotFound(String),

    /// The title resolved but there is nothing else to rank against.
    #[error("no other rows to rank against")]
    EmptyResult,

    #[error("dataset is missing required column `{0}`")]
    MissingColumn(String),

    #[error("persisted index not found at {0}")]
    IndexNotFound(PathBuf),

    #[error("persisted index is corrupt: {0}")]
    Corrupt(String),

    #[error("csv error: {0}")]
    Csv(#[from] csv::Error),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

impl EngineError {
    /// True for errors that a full rebuild from the raw dataset can recover from.
    pub fn is_rebuildable(&self) -> bool {
        matches!(self, EngineError::IndexNotFound(_) | EngineError::Corrupt(_))
    }
}
