//! Row-for-row copy of the source, appended one chunk at a time.

use std::io::Write;
use std::path::{Path, PathBuf};

use csv::{ByteRecord, Writer, WriterBuilder};

use crate::error::AppError;
use crate::streaming::chunk_reader::RowChunk;

/// Appends chunks to a CSV sink, writing the header exactly once.
pub struct FullCopySink<W: Write> {
    writer: Writer<W>,
    headers: ByteRecord,
    label: PathBuf,
    header_written: bool,
    rows_written: u64,
}

impl<W: Write> FullCopySink<W> {
    /// `label` names the destination in error messages.
    pub fn new(inner: W, headers: ByteRecord, label: impl AsRef<Path>) -> Self {
        let writer = WriterBuilder::new().has_headers(false).from_writer(inner);
        Self {
            writer,
            headers,
            label: label.as_ref().to_path_buf(),
            header_written: false,
            rows_written: 0,
        }
    }

    pub fn rows_written(&self) -> u64 {
        self.rows_written
    }

    /// Appends every record of `chunk` in order.
    pub fn append(&mut self, chunk: &RowChunk) -> Result<(), AppError> {
        self.ensure_header()?;
        for record in &chunk.records {
            self.writer
                .write_byte_record(record)
                .map_err(|e| AppError::sink(&self.label, e))?;
            self.rows_written += 1;
        }
        Ok(())
    }

    /// Flushes and hands back the inner writer.
    ///
    /// A source without data rows still gets its header here.
    pub fn finish(mut self) -> Result<W, AppError> {
        self.ensure_header()?;
        let label = self.label;
        self.writer
            .into_inner()
            .map_err(|e| AppError::sink(&label, e.error()))
    }

    fn ensure_header(&mut self) -> Result<(), AppError> {
        if self.header_written {
            return Ok(());
        }
        self.writer
            .write_byte_record(&self.headers)
            .map_err(|e| AppError::sink(&self.label, e))?;
        self.header_written = true;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io;

    fn chunk(index: u64, first_row: u64, rows: &[&[&str]]) -> RowChunk {
        RowChunk {
            index,
            first_row,
            records: rows.iter().map(|fields| ByteRecord::from(fields.to_vec())).collect(),
        }
    }

    fn headers() -> ByteRecord {
        ByteRecord::from(vec!["id", "name"])
    }

    fn finish_to_string(sink: FullCopySink<Vec<u8>>) -> String {
        String::from_utf8(sink.finish().expect("finish")).expect("utf-8 output")
    }

    #[test]
    fn test_header_written_once_across_chunks() {
        let mut sink = FullCopySink::new(Vec::new(), headers(), "memory");
        sink.append(&chunk(0, 1, &[&["1", "A"], &["2", "B"]])).expect("append");
        sink.append(&chunk(1, 3, &[&["3", "A"]])).expect("append");
        assert_eq!(sink.rows_written(), 3);

        let output = finish_to_string(sink);
        assert_eq!(output, "id,name\n1,A\n2,B\n3,A\n");
        assert_eq!(output.matches("id,name").count(), 1);
    }

    #[test]
    fn test_no_chunks_writes_header_only() {
        let sink = FullCopySink::new(Vec::new(), headers(), "memory");
        assert_eq!(finish_to_string(sink), "id,name\n");
    }

    #[test]
    fn test_quoting_is_preserved_where_needed() {
        let mut sink = FullCopySink::new(Vec::new(), headers(), "memory");
        sink.append(&chunk(0, 1, &[&["1", "Hey, Jude"], &["2", "Say \"Hi\""]]))
            .expect("append");

        let output = finish_to_string(sink);
        let mut reader = csv::Reader::from_reader(output.as_bytes());
        let names: Vec<String> = reader
            .records()
            .map(|r| r.expect("record")[1].to_string())
            .collect();
        assert_eq!(names, vec!["Hey, Jude", "Say \"Hi\""]);
    }

    #[test]
    fn test_empty_values_are_kept() {
        let mut sink = FullCopySink::new(Vec::new(), headers(), "memory");
        sink.append(&chunk(0, 1, &[&["4", ""]])).expect("append");
        assert_eq!(finish_to_string(sink), "id,name\n4,\n");
    }

    struct FailingWriter;

    impl Write for FailingWriter {
        fn write(&mut self, _buf: &[u8]) -> io::Result<usize> {
            Err(io::Error::new(io::ErrorKind::Other, "disk full"))
        }

        fn flush(&mut self) -> io::Result<()> {
            Err(io::Error::new(io::ErrorKind::Other, "disk full"))
        }
    }

    #[test]
    fn test_write_failure_maps_to_sink_error() {
        let mut sink = FullCopySink::new(FailingWriter, headers(), "data/tracks.csv");
        let rows: Vec<Vec<String>> = (0..10_000)
            .map(|i| vec![i.to_string(), "x".repeat(32)])
            .collect();
        let big = RowChunk {
            index: 0,
            first_row: 1,
            records: rows.into_iter().map(ByteRecord::from).collect(),
        };

        let appended = sink.append(&big);
        let result = match appended {
            Err(e) => Err(e),
            Ok(()) => sink.finish().map(|_| ()),
        };
        match result {
            Err(AppError::SinkWriteError { path, reason }) => {
                assert_eq!(path, PathBuf::from("data/tracks.csv"));
                assert!(reason.contains("disk full"), "got: {}", reason);
            }
            other => panic!("Expected SinkWriteError, got {:?}", other.err()),
        }
    }
}
