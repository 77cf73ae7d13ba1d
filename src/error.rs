// Migration error taxonomy
// Fetch failures are reported to the caller, everything else aborts the job

use thiserror::Error;

#[derive(Error, Debug)]
pub enum MigrationError {
    /// Non-200 response, transport failure, unreadable file or rejected upload
    #[error("Fetch error: {0}")]
    Fetch(String),

    /// Payload is not a JSON array of user records
    #[error("Invalid JSON payload: {0}")]
    Parse(#[source] serde_json::Error),

    /// Entity store refused a read or write
    #[error("Persistence error: {0}")]
    Persistence(String),

    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),

    /// Entity fields could not be encoded or decoded
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl From<reqwest::Error> for MigrationError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            MigrationError::Fetch(format!("Request timeout: {}", err))
        } else if err.is_connect() {
            MigrationError::Fetch(format!("Failed to connect to endpoint: {}", err))
        } else {
            MigrationError::Fetch(err.to_string())
        }
    }
}

impl From<std::io::Error> for MigrationError {
    fn from(err: std::io::Error) -> Self {
        MigrationError::Fetch(err.to_string())
    }
}

pub type Result<T> = std::result::Result<T, MigrationError>;
