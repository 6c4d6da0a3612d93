//! Lazy, record-aware chunked reading of a CSV source.
//!
//! Uses the `csv` crate so embedded commas, quotes and newlines inside quoted
//! fields never split a record. Rows are handed out as `RowChunk`s of at most
//! `chunk_size` records, read on demand until the source is exhausted.

use std::fs::File;
use std::io::{BufReader, Read};
use std::path::{Path, PathBuf};

use csv::{ByteRecord, ReaderBuilder};

use crate::error::AppError;

/// UTF-8 BOM bytes.
const UTF8_BOM: &[u8] = &[0xEF, 0xBB, 0xBF];

/// Label used in errors when the source is not a file.
const IN_MEMORY_SOURCE: &str = "<in-memory source>";

/// One bounded batch of source rows.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RowChunk {
    /// 0-based position of this chunk in the sequence.
    pub index: u64,
    /// 1-based data row number of the first record (the header is row 0).
    pub first_row: u64,
    /// Raw records, in source order.
    pub records: Vec<ByteRecord>,
}

impl RowChunk {
    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Iterates `(row_number, record)` pairs.
    pub fn numbered(&self) -> impl Iterator<Item = (u64, &ByteRecord)> {
        (self.first_row..).zip(self.records.iter())
    }
}

/// Finite, non-restartable sequence of `RowChunk`s over a CSV source.
///
/// The header is read eagerly on construction; data rows are only read
/// as the iterator is advanced. After the first error the iterator is
/// fused and yields `None`.
pub struct ChunkReader<R: Read> {
    reader: csv::Reader<R>,
    headers: ByteRecord,
    chunk_size: usize,
    source: PathBuf,
    next_index: u64,
    rows_read: u64,
    finished: bool,
}

impl ChunkReader<BufReader<File>> {
    /// Opens `path` for chunked reading.
    ///
    /// # Errors
    ///
    /// Returns `AppError::SourceNotFound` if the file cannot be opened, and
    /// `AppError::MalformedRow` if it has no readable header row.
    pub fn open(path: impl AsRef<Path>, chunk_size: usize) -> Result<Self, AppError> {
        let path = path.as_ref();
        let file = File::open(path).map_err(|e| AppError::SourceNotFound {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })?;
        Self::with_source(BufReader::new(file), chunk_size, path)
    }
}

impl<R: Read> ChunkReader<R> {
    /// Wraps an arbitrary reader, e.g. an in-memory `Cursor`.
    pub fn new(reader: R, chunk_size: usize) -> Result<Self, AppError> {
        Self::with_source(reader, chunk_size, Path::new(IN_MEMORY_SOURCE))
    }

    fn with_source(reader: R, chunk_size: usize, source: &Path) -> Result<Self, AppError> {
        if chunk_size == 0 {
            return Err(AppError::InvalidConfig(
                "chunk_size must be greater than zero".to_string(),
            ));
        }

        let mut reader = ReaderBuilder::new()
            .has_headers(true)
            .flexible(false)
            .from_reader(reader);

        let headers = reader
            .byte_headers()
            .map_err(|e| map_read_error(e, source, 0))?
            .clone();

        if headers.is_empty() {
            return Err(AppError::MalformedRow {
                row: 0,
                reason: "CSV file has no header row".to_string(),
            });
        }

        Ok(Self {
            reader,
            headers: strip_bom(&headers),
            chunk_size,
            source: source.to_path_buf(),
            next_index: 0,
            rows_read: 0,
            finished: false,
        })
    }

    /// Header row, with any leading BOM removed.
    pub fn headers(&self) -> &ByteRecord {
        &self.headers
    }

    /// Header names decoded lossily, for messages.
    pub fn header_names(&self) -> Vec<String> {
        self.headers
            .iter()
            .map(|field| String::from_utf8_lossy(field).into_owned())
            .collect()
    }

    /// Position of the first header equal to `column`.
    ///
    /// # Errors
    ///
    /// Returns `AppError::MissingColumn` listing the available headers.
    pub fn column_index(&self, column: &str) -> Result<usize, AppError> {
        self.headers
            .iter()
            .position(|field| field == column.as_bytes())
            .ok_or_else(|| AppError::MissingColumn {
                column: column.to_string(),
                available: self.header_names(),
            })
    }

    /// Total data rows handed out so far.
    pub fn rows_read(&self) -> u64 {
        self.rows_read
    }

    fn read_chunk(&mut self) -> Result<Option<RowChunk>, AppError> {
        let first_row = self.rows_read + 1;
        let mut records = Vec::with_capacity(self.chunk_size.min(4096));

        while records.len() < self.chunk_size {
            let mut record = ByteRecord::new();
            let more = self
                .reader
                .read_byte_record(&mut record)
                .map_err(|e| map_read_error(e, &self.source, self.rows_read + 1))?;
            if !more {
                self.finished = true;
                break;
            }
            self.rows_read += 1;
            records.push(record);
        }

        if records.is_empty() {
            return Ok(None);
        }

        let chunk = RowChunk {
            index: self.next_index,
            first_row,
            records,
        };
        self.next_index += 1;
        Ok(Some(chunk))
    }
}

impl<R: Read> Iterator for ChunkReader<R> {
    type Item = Result<RowChunk, AppError>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.finished {
            return None;
        }
        match self.read_chunk() {
            Ok(chunk) => chunk.map(Ok),
            Err(e) => {
                self.finished = true;
                Some(Err(e))
            }
        }
    }
}

/// I/O failures mean the source became unreadable; everything else is a
/// parse problem at `row`.
fn map_read_error(err: csv::Error, source: &Path, row: u64) -> AppError {
    if err.is_io_error() {
        return AppError::SourceNotFound {
            path: source.to_path_buf(),
            reason: err.to_string(),
        };
    }
    AppError::MalformedRow {
        row,
        reason: err.to_string(),
    }
}

fn strip_bom(headers: &ByteRecord) -> ByteRecord {
    headers
        .iter()
        .enumerate()
        .map(|(i, field)| {
            if i == 0 {
                field.strip_prefix(UTF8_BOM).unwrap_or(field)
            } else {
                field
            }
        })
        .collect()
}
