//! Error types for bibman
//!
//! One crate-wide error enum built with thiserror. Storage-level
//! uniqueness violations are not represented here: the query layer
//! resolves them to "reuse the existing row" before an error can
//! surface. What remains is the small set of failures a caller can
//! actually act on, plus `#[from]` conversions for the external
//! libraries underneath.

use thiserror::Error;

/// Result type alias using our Error type
pub type Result<T> = std::result::Result<T, Error>;

#[derive(Error, Debug)]
pub enum Error {
    /// Row looked up by primary key does not exist (update/delete/fetch)
    #[error("Record not found: {0}")]
    RecordNotFound(String),

    /// Registration with a username that is already taken
    #[error("Username already taken: {0}")]
    UsernameTaken(String),

    /// Login with an unknown username or wrong password
    #[error("Invalid username or password")]
    InvalidCredentials,

    /// Caller-supplied data that cannot be stored or parsed
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// Schema creation failed while opening the database
    #[error("Schema initialization failed: {0}")]
    SchemaFailed(String),

    /// Import payload did not match the expected CSL-JSON shape
    #[error("Invalid import payload: {0}")]
    ImportFailed(String),

    /// Database driver error from sqlx
    #[error("Database error: {0}")]
    Sqlx(#[from] sqlx::Error),

    /// JSON deserialization error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Standard I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl Error {
    /// Create a RecordNotFound error with a resource description
    pub fn not_found<S: Into<String>>(resource: S) -> Self {
        Error::RecordNotFound(resource.into())
    }

    /// Create an InvalidInput error with a message
    pub fn invalid_input<S: Into<String>>(message: S) -> Self {
        Error::InvalidInput(message.into())
    }
}
