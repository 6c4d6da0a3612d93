//! Streaming utilities for processing large CSV sources.
//!
//! This module provides record-aware chunked reading that keeps memory
//! bounded by the chunk size, the two chunk consumers (a full copy and a
//! distinct-value fold), and atomic file writing with automatic cleanup on
//! failure.

mod atomic_writer;
mod chunk_reader;
mod distinct;
mod extractor;
mod full_copy;

pub use atomic_writer::AtomicFileWriter;
pub use chunk_reader::{ChunkReader, RowChunk};
pub use distinct::DistinctNameSet;
pub use extractor::{
    extract, extract_from_reader, extract_paths, ExtractOutcome, ExtractStats, ExtractSummary,
};
pub use full_copy::FullCopySink;
