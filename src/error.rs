use thiserror::Error;

/// Failures at the storage edges (high score database, config file)
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("database error: {0}")]
    Sqlite(#[from] rusqlite::Error),

    #[error("i/o error: {0}")]
    Io(#[from] std::io::Error),

    #[error("malformed json: {0}")]
    Json(#[from] serde_json::Error),

    #[error("no usable state directory for {0}")]
    NoStateDir(&'static str),
}

pub type Result<T> = std::result::Result<T, StoreError>;
