//! Errors from column-store operations.

use crate::loglake::sql::SqlBuildError;

#[derive(Debug, thiserror::Error)]
pub enum SinkError {
    /// Request never reached the server or the response could not be read.
    #[error("column-store request failed: {0}")]
    Transport(#[from] reqwest::Error),

    /// The server rejected the statement.
    #[error("column store returned status {status}: {message}")]
    Server { status: u16, message: String },

    /// Statement construction failed validation; nothing was sent.
    #[error(transparent)]
    Statement(#[from] SqlBuildError),

    #[error("failed to serialize insert body: {0}")]
    Serialize(#[from] serde_json::Error),
}
