//! Tests for the offset-tracked incremental reader.

use std::fs::OpenOptions;
use std::io::Write;
use std::path::Path;

use loglake::loglake::ingest::{IncrementalReader, LogSource, OffsetStore};

fn source_in(dir: &Path, name: &str) -> LogSource {
    LogSource::new(
        name,
        dir.join(format!("{}.log", name)),
        dir.join(format!("{}.offset", name)),
    )
}

fn append(path: &Path, content: &str) {
    let mut file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(path)
        .unwrap();
    file.write_all(content.as_bytes()).unwrap();
}

#[test]
fn test_first_read_consumes_whole_file_and_persists_length() {
    let dir = tempfile::tempdir().unwrap();
    let source = source_in(dir.path(), "enrollment");
    let content = "{\"user_id\": 1}\n{\"user_id\": 2}\n{\"user_id\": 3}\n";
    append(&source.path, content);

    let batch = IncrementalReader::new().read_new(&source).unwrap();

    assert_eq!(batch.lines.len(), 3);
    assert_eq!(batch.lines[0], "{\"user_id\": 1}");
    assert_eq!(batch.start_offset, 0);
    assert_eq!(batch.end_offset, content.len() as u64);
    assert_eq!(
        OffsetStore::new().load(&source.offset_path),
        content.len() as u64
    );
}

#[test]
fn test_second_read_without_appends_is_empty_and_offset_unchanged() {
    let dir = tempfile::tempdir().unwrap();
    let source = source_in(dir.path(), "enrollment");
    let content = "{\"user_id\": 1}\n";
    append(&source.path, content);

    let reader = IncrementalReader::new();
    reader.read_new(&source).unwrap();
    let second = reader.read_new(&source).unwrap();

    assert!(second.is_empty());
    assert_eq!(second.start_offset, content.len() as u64);
    assert_eq!(second.end_offset, content.len() as u64);
}

#[test]
fn test_successive_reads_only_return_appended_lines() {
    let dir = tempfile::tempdir().unwrap();
    let source = source_in(dir.path(), "course");
    let reader = IncrementalReader::new();

    append(&source.path, "{\"course_id\": 10}\n");
    let first = reader.read_new(&source).unwrap();
    assert_eq!(first.lines, vec!["{\"course_id\": 10}"]);

    append(&source.path, "{\"course_id\": 11}\n{\"course_id\": 12}\n");
    let second = reader.read_new(&source).unwrap();
    assert_eq!(
        second.lines,
        vec!["{\"course_id\": 11}", "{\"course_id\": 12}"]
    );

    // Offset monotonicity: each read starts where the previous one ended.
    assert_eq!(second.start_offset, first.end_offset);
    assert!(second.end_offset > second.start_offset);
}

#[test]
fn test_missing_log_file_yields_empty_batch() {
    let dir = tempfile::tempdir().unwrap();
    let source = source_in(dir.path(), "absent");

    let batch = IncrementalReader::new().read_new(&source).unwrap();

    assert!(batch.is_empty());
    assert_eq!(batch.end_offset, 0);
    // No offset file is created for a file that was never read.
    assert!(!source.offset_path.exists());
}

#[test]
fn test_failed_read_leaves_offset_untouched() {
    let dir = tempfile::tempdir().unwrap();
    // Point the source at a directory: opening succeeds, reading fails, so
    // the failure happens after open but before the read completes.
    let source = LogSource::new(
        "broken",
        dir.path().to_path_buf(),
        dir.path().join("broken.offset"),
    );
    std::fs::write(&source.offset_path, "5").unwrap();

    let result = IncrementalReader::new().read_new(&source);

    assert!(result.is_err());
    assert_eq!(OffsetStore::new().load(&source.offset_path), 5);
}

#[test]
fn test_truncated_file_resets_to_start() {
    let dir = tempfile::tempdir().unwrap();
    let source = source_in(dir.path(), "rotated");
    append(&source.path, "{\"a\": 1}\n{\"a\": 2}\n");

    let reader = IncrementalReader::new();
    reader.read_new(&source).unwrap();

    // Simulate log rotation: the file is replaced with shorter content.
    std::fs::write(&source.path, "{\"a\": 3}\n").unwrap();
    let batch = reader.read_new(&source).unwrap();

    assert_eq!(batch.start_offset, 0);
    assert_eq!(batch.lines, vec!["{\"a\": 3}"]);
    assert_eq!(OffsetStore::new().load(&source.offset_path), 9);
}

#[test]
fn test_partial_trailing_line_is_consumed() {
    let dir = tempfile::tempdir().unwrap();
    let source = source_in(dir.path(), "partial");
    append(&source.path, "{\"a\": 1}\n{\"a\": 2}");

    let batch = IncrementalReader::new().read_new(&source).unwrap();

    assert_eq!(batch.lines, vec!["{\"a\": 1}", "{\"a\": 2}"]);
    assert_eq!(batch.end_offset, "{\"a\": 1}\n{\"a\": 2}".len() as u64);
}
