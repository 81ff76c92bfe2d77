use thiserror::Error;

/// Errors that can occur when interacting with the storage layer.
#[derive(Debug, Error)]
pub enum StoreError {
    /// A database error occurred.
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    /// A database migration error occurred.
    #[error("migration error: {0}")]
    Migration(#[from] sqlx::migrate::MigrateError),

    /// A stored order carries a status string this build does not know.
    #[error("invalid order status {0:?} stored for order")]
    InvalidStatus(String),
}

/// Result type for storage operations.
pub type Result<T> = std::result::Result<T, StoreError>;
