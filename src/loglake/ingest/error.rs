//! Errors raised while reading log files and tracking offsets.

use std::path::PathBuf;

#[derive(Debug, thiserror::Error)]
pub enum IngestError {
    #[error("failed to open log file '{}': {source}", .path.display())]
    Open {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to seek to offset {offset} in '{}': {source}", .path.display())]
    Seek {
        path: PathBuf,
        offset: u64,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to read '{}' past offset {offset}: {source}", .path.display())]
    Read {
        path: PathBuf,
        offset: u64,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to persist offset {offset} to '{}': {source}", .path.display())]
    OffsetWrite {
        path: PathBuf,
        offset: u64,
        #[source]
        source: std::io::Error,
    },
}
