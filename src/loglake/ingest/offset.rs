//! Per-source byte-offset persistence.
//!
//! Each log source owns one offset file whose entire content is the decimal
//! byte count already consumed. The file is overwritten, never appended.
//! Reading is deliberately forgiving: a missing or empty file means "start
//! from the beginning", and unparsable content is logged and treated the same
//! way rather than failing the run. Writing is strict, because losing an
//! offset write silently would re-ingest data on the next run.

use std::fs;
use std::path::Path;

use log::warn;

use super::error::IngestError;

/// Loads and persists the consumed-byte offset for log sources.
#[derive(Debug, Default, Clone)]
pub struct OffsetStore;

impl OffsetStore {
    pub fn new() -> Self {
        Self
    }

    /// Stored offset for `path`; 0 when the file is absent, empty, or holds
    /// anything that does not parse as a non-negative integer.
    pub fn load(&self, path: &Path) -> u64 {
        let content = match fs::read_to_string(path) {
            Ok(content) => content,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return 0,
            Err(e) => {
                warn!(
                    "could not read offset file '{}', starting from 0: {}",
                    path.display(),
                    e
                );
                return 0;
            }
        };
        let trimmed = content.trim();
        if trimmed.is_empty() {
            return 0;
        }
        match trimmed.parse::<u64>() {
            Ok(offset) => offset,
            Err(e) => {
                warn!(
                    "offset file '{}' holds unparsable content ({}), starting from 0",
                    path.display(),
                    e
                );
                0
            }
        }
    }

    /// Overwrite `path` with the new offset.
    pub fn store(&self, path: &Path, offset: u64) -> Result<(), IngestError> {
        fs::write(path, offset.to_string()).map_err(|source| IngestError::OffsetWrite {
            path: path.to_path_buf(),
            offset,
            source,
        })
    }
}
