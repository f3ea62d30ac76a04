use thiserror::Error;

/// Errors that can occur when interacting with the inventory store.
#[derive(Debug, Error)]
pub enum StoreError {
    /// The unit of work collided with a concurrent one and was rolled back.
    /// Safe to retry with fresh reads.
    #[error("Concurrent update conflict: {reason}")]
    Conflict { reason: String },

    /// A stored row could not be mapped into a record.
    #[error("Invalid stored data: {reason}")]
    InvalidData { reason: String },

    /// A database error occurred.
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    /// A database migration error occurred.
    #[error("Migration error: {0}")]
    Migration(#[from] sqlx::migrate::MigrateError),
}

/// Result type for store operations.
pub type Result<T> = std::result::Result<T, StoreError>;
