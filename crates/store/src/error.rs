use thiserror::Error;

/// Errors that can occur when interacting with the stores.
#[derive(Debug, Error)]
pub enum StoreError {
    /// A database error occurred.
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    /// A stored value could not be decoded into its domain type.
    #[error("Invalid stored value in column {column}: {value}")]
    InvalidColumn {
        column: &'static str,
        value: String,
    },
}

/// Result type for store operations.
pub type Result<T> = std::result::Result<T, StoreError>;
