//! Error type for database operations.

/// Error raised by pool management and query functions.
#[derive(Debug, thiserror::Error)]
pub enum DbError {
    /// The requested row was not found.
    #[error("{0} not found")]
    NotFound(&'static str),

    /// A SQL statement failed.
    #[error("Database error: {0}")]
    Database(String),

    /// The connection pool could not hand out a connection.
    #[error("Connection pool error: {0}")]
    Pool(String),
}

impl DbError {
    /// Create a new Database error.
    pub fn database<S: Into<String>>(msg: S) -> Self {
        Self::Database(msg.into())
    }

    /// Create a new Pool error.
    pub fn pool<S: Into<String>>(msg: S) -> Self {
        Self::Pool(msg.into())
    }
}

/// Result type alias using [`DbError`].
pub type Result<T> = std::result::Result<T, DbError>;
