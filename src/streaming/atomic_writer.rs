//! Atomic output file with automatic cleanup on failure.
//!
//! Bytes go to a temporary file in the same directory as the destination,
//! which atomically replaces the destination on `persist()`. If dropped
//! before persisting, the temporary file is deleted and the destination is
//! left untouched.

use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use tempfile::NamedTempFile;

use crate::error::AppError;

/// A file writer whose contents only appear at `final_path` once
/// `persist()` succeeds.
///
/// Writes go straight to the temporary file; callers wrap it in a buffering
/// writer (`csv::Writer` in this crate).
pub struct AtomicFileWriter {
    file: NamedTempFile,
    final_path: PathBuf,
}

impl AtomicFileWriter {
    /// Creates a writer targeting `final_path`, creating missing parent
    /// directories first.
    ///
    /// # Errors
    ///
    /// Returns `AppError::SinkWriteError` if the parent directory cannot be
    /// determined or created, or the temporary file cannot be created.
    pub fn create(final_path: impl AsRef<Path>) -> Result<Self, AppError> {
        let final_path = final_path.as_ref().to_path_buf();

        let parent_dir = match final_path.parent() {
            Some(parent) if parent.as_os_str().is_empty() => Path::new("."),
            Some(parent) => parent,
            None => {
                return Err(AppError::sink(
                    &final_path,
                    "cannot determine parent directory",
                ))
            }
        };

        fs::create_dir_all(parent_dir)
            .map_err(|e| AppError::sink(&final_path, format!("failed to create directory: {}", e)))?;

        let temp_file = NamedTempFile::new_in(parent_dir).map_err(|e| {
            AppError::sink(&final_path, format!("failed to create temporary file: {}", e))
        })?;

        Ok(Self {
            file: temp_file,
            final_path,
        })
    }

    /// Destination the contents are persisted to.
    pub fn final_path(&self) -> &Path {
        &self.final_path
    }

    /// Flushes the file and atomically moves it into place.
    ///
    /// # Errors
    ///
    /// Returns `AppError::SinkWriteError` if flushing or renaming fails; the
    /// temporary file is cleaned up in that case.
    pub fn persist(self) -> Result<PathBuf, AppError> {
        let Self {
            mut file,
            final_path,
        } = self;

        file.flush()
            .map_err(|e| AppError::sink(&final_path, format!("failed to flush file: {}", e)))?;

        file.persist(&final_path).map_err(|e| {
            AppError::sink(&final_path, format!("failed to persist file: {}", e.error))
        })?;

        Ok(final_path)
    }
}

impl Write for AtomicFileWriter {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.file.write(buf)
    }

    fn flush(&mut self) -> io::Result<()> {
        self.file.flush()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn dir_entries(dir: &Path) -> Vec<PathBuf> {
        fs::read_dir(dir)
            .expect("Failed to read dir")
            .map(|entry| entry.expect("entry").path())
            .collect()
    }

    #[test]
    fn test_successful_write() {
        let temp_dir = TempDir::new().expect("Failed to create temp dir");
        let final_path = temp_dir.path().join("song_names.csv");

        let mut writer = AtomicFileWriter::create(&final_path).expect("Failed to create writer");
        writer.write_all(b"name\nHey Jude\n").expect("Failed to write");

        let result_path = writer.persist().expect("Failed to persist");

        assert_eq!(result_path, final_path);
        let content = fs::read_to_string(&final_path).expect("Failed to read file");
        assert_eq!(content, "name\nHey Jude\n");
        assert_eq!(dir_entries(temp_dir.path()), vec![final_path]);
    }

    #[test]
    fn test_writes_reach_temp_file_unbuffered() {
        let temp_dir = TempDir::new().expect("Failed to create temp dir");
        let final_path = temp_dir.path().join("song_names.csv");

        let mut writer = AtomicFileWriter::create(&final_path).expect("Failed to create writer");
        writer.write_all(b"name\n").expect("Failed to write");

        let entries = dir_entries(temp_dir.path());
        assert_eq!(entries.len(), 1);
        assert_ne!(entries[0], final_path);
        assert_eq!(fs::read(&entries[0]).expect("read temp"), b"name\n");

        writer.persist().expect("Failed to persist");
        assert_eq!(fs::read(&final_path).expect("read final"), b"name\n");
    }

    #[test]
    fn test_drop_cleanup() {
        let temp_dir = TempDir::new().expect("Failed to create temp dir");
        let final_path = temp_dir.path().join("tracks.csv");

        {
            let mut writer =
                AtomicFileWriter::create(&final_path).expect("Failed to create writer");
            writer.write_all(b"id,name\n1,A\n").expect("Failed to write");
            // Dropped without persist()
        }

        assert!(
            dir_entries(temp_dir.path()).is_empty(),
            "Directory should be empty after drop (temp file cleaned up)"
        );
        assert!(!final_path.exists());
    }

    #[test]
    fn test_drop_keeps_previous_destination() {
        let temp_dir = TempDir::new().expect("Failed to create temp dir");
        let final_path = temp_dir.path().join("song_names.csv");
        fs::write(&final_path, "name\nOld\n").expect("Failed to write old file");

        {
            let mut writer =
                AtomicFileWriter::create(&final_path).expect("Failed to create writer");
            writer.write_all(b"name\nNew\n").expect("Failed to write");
        }

        let content = fs::read_to_string(&final_path).expect("Failed to read file");
        assert_eq!(content, "name\nOld\n");
    }

    #[test]
    fn test_overwrite_behavior() {
        let temp_dir = TempDir::new().expect("Failed to create temp dir");
        let final_path = temp_dir.path().join("output.csv");
        fs::write(&final_path, "OLD_CONTENT").expect("Failed to write dummy file");

        let mut writer = AtomicFileWriter::create(&final_path).expect("Failed to create writer");
        writer.write_all(b"NEW\n").expect("Failed to write");
        writer.persist().expect("Failed to persist");

        let content = fs::read_to_string(&final_path).expect("Failed to read file");
        assert_eq!(content, "NEW\n");
    }

    #[test]
    fn test_creates_missing_parent_directories() {
        let temp_dir = TempDir::new().expect("Failed to create temp dir");
        let final_path = temp_dir.path().join("data").join("nested").join("out.csv");

        let writer = AtomicFileWriter::create(&final_path).expect("Failed to create writer");
        assert_eq!(writer.final_path(), final_path.as_path());
        writer.persist().expect("Failed to persist");

        assert!(final_path.exists());
        let content = fs::read_to_string(&final_path).expect("Failed to read file");
        assert!(content.is_empty());
    }

    #[test]
    fn test_invalid_parent_directory() {
        #[cfg(unix)]
        {
            let result = AtomicFileWriter::create("/");
            assert!(
                matches!(result, Err(AppError::SinkWriteError { .. })),
                "Should fail for path with no parent"
            );
        }
    }

    #[test]
    fn test_parent_is_a_file() {
        let temp_dir = TempDir::new().expect("Failed to create temp dir");
        let blocker = temp_dir.path().join("data");
        fs::write(&blocker, "not a directory").expect("Failed to write blocker");

        let result = AtomicFileWriter::create(blocker.join("out.csv"));
        match result {
            Err(AppError::SinkWriteError { path, .. }) => assert!(path.ends_with("out.csv")),
            Err(other) => panic!("Expected SinkWriteError, got {:?}", other),
            Ok(_) => panic!("Expected an error when the parent is a file"),
        }
    }
}
