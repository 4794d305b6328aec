use thiserror::Error;

/// Errors that abort the whole batch run.
/// Per-row problems are `RowSkip`s, not errors.
#[derive(Error, Debug)]
pub enum FilingError {
    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("No exchange rate found for pair {pair}")]
    MissingExchangeRate { pair: String },

    #[error("Invalid reference data: {0}")]
    InvalidReference(String),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

pub type FilingResult<T> = Result<T, FilingError>;
