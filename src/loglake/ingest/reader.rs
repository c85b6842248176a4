//! Offset-tracked incremental file reader.
//!
//! Returns only the lines appended since the previous run, then advances the
//! persisted offset. The offset is written strictly after the read completes;
//! a failure anywhere during the read leaves the previous offset untouched,
//! so no byte range is ever skipped or consumed twice on the happy path.
//!
//! Rotation/truncation policy: a stored offset larger than the current file
//! is taken to mean the file was rotated or truncated underneath us. The
//! reader logs a warning and restarts from 0 instead of silently returning an
//! empty batch.
//!
//! Single-writer, single-reader: no file locking. One ingestion process per
//! source is assumed.

use std::fs::File;
use std::io::{BufRead, BufReader, Seek, SeekFrom};

use log::{debug, info, warn};

use super::error::IngestError;
use super::offset::OffsetStore;
use super::LogSource;

/// Result of one incremental read: the appended lines plus the offsets
/// before and after, so callers can assert offset movement without touching
/// the filesystem again.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReadBatch {
    pub lines: Vec<String>,
    pub start_offset: u64,
    pub end_offset: u64,
}

impl ReadBatch {
    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }
}

/// Reads each log source exactly once per byte range across process restarts.
#[derive(Debug, Default)]
pub struct IncrementalReader {
    offsets: OffsetStore,
}

impl IncrementalReader {
    pub fn new() -> Self {
        Self {
            offsets: OffsetStore::new(),
        }
    }

    /// Read all lines appended to `source` since the last successful read and
    /// persist the new offset.
    ///
    /// A missing source file yields an empty batch with the offset untouched;
    /// one absent log must not abort the remaining sources.
    pub fn read_new(&self, source: &LogSource) -> Result<ReadBatch, IngestError> {
        let stored = self.offsets.load(&source.offset_path);

        let file = match File::open(&source.path) {
            Ok(file) => file,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                warn!(
                    "log file '{}' for source '{}' does not exist, nothing to read",
                    source.path.display(),
                    source.name
                );
                return Ok(ReadBatch {
                    lines: Vec::new(),
                    start_offset: stored,
                    end_offset: stored,
                });
            }
            Err(source_err) => {
                return Err(IngestError::Open {
                    path: source.path.clone(),
                    source: source_err,
                })
            }
        };

        let file_len = file
            .metadata()
            .map_err(|e| IngestError::Open {
                path: source.path.clone(),
                source: e,
            })?
            .len();

        let start_offset = if stored > file_len {
            warn!(
                "source '{}': stored offset {} exceeds file length {}, assuming rotation and \
                 restarting from 0",
                source.name, stored, file_len
            );
            0
        } else {
            stored
        };

        let mut reader = BufReader::new(file);
        reader
            .seek(SeekFrom::Start(start_offset))
            .map_err(|e| IngestError::Seek {
                path: source.path.clone(),
                offset: start_offset,
                source: e,
            })?;

        let mut lines = Vec::new();
        let mut consumed = 0u64;
        loop {
            let mut line = String::new();
            let bytes = reader.read_line(&mut line).map_err(|e| IngestError::Read {
                path: source.path.clone(),
                offset: start_offset + consumed,
                source: e,
            })?;
            if bytes == 0 {
                break;
            }
            consumed += bytes as u64;
            while line.ends_with('\n') || line.ends_with('\r') {
                line.pop();
            }
            lines.push(line);
        }

        let end_offset = start_offset + consumed;
        self.offsets.store(&source.offset_path, end_offset)?;

        if lines.is_empty() {
            debug!("source '{}': no new lines past offset {}", source.name, start_offset);
        } else {
            info!(
                "source '{}': read {} new lines ({} bytes), offset {} -> {}",
                source.name,
                lines.len(),
                consumed,
                start_offset,
                end_offset
            );
        }

        Ok(ReadBatch {
            lines,
            start_offset,
            end_offset,
        })
    }
}
