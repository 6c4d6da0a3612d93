//! Chunked extraction of a distinct column from a large CSV source.
//!
//! One pass over the source feeds every chunk to two consumers: the
//! full-copy sink and the distinct-name fold. Both artifacts are written
//! through `AtomicFileWriter`, so a failed run never leaves a half-written
//! artifact at its destination.

use std::io::{Read, Write};
use std::path::{Path, PathBuf};

use serde::Serialize;
use tracing::{debug, info};

use crate::config::{ExtractConfig, ExtractOptions};
use crate::error::AppError;
use crate::streaming::atomic_writer::AtomicFileWriter;
use crate::streaming::chunk_reader::ChunkReader;
use crate::streaming::distinct::DistinctNameSet;
use crate::streaming::full_copy::FullCopySink;

/// Error label for the full-copy sink when no path is involved.
const FULL_COPY_LABEL: &str = "<full-copy sink>";
/// Error label for the distinct sink when no path is involved.
const DISTINCT_LABEL: &str = "<distinct sink>";

/// Counters for one extraction pass.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct ExtractStats {
    /// Data rows read from the source (and copied).
    pub total_rows: u64,
    /// Chunks processed.
    pub chunks: u64,
    /// Distinct non-null values collected.
    pub distinct_count: usize,
}

/// Result of a file-based run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ExtractSummary {
    pub stats: ExtractStats,
    pub full_copy_path: PathBuf,
    pub distinct_path: PathBuf,
}

/// Sinks handed back from an in-memory run.
#[derive(Debug)]
pub struct ExtractOutcome<F, D> {
    pub stats: ExtractStats,
    pub full_copy: F,
    pub distinct: D,
}

/// Runs the extraction described by `config`.
///
/// The source header is checked for the target column before any output
/// is created. Parent directories of both outputs are created as needed.
///
/// # Errors
///
/// - `AppError::InvalidConfig` - Unusable options
/// - `AppError::SourceNotFound` - Source missing or unreadable
/// - `AppError::MissingColumn` - Target column not in the header
/// - `AppError::MalformedRow` / `AppError::NotUtf8` - Bad source data
/// - `AppError::SinkWriteError` - An output could not be written
pub fn extract(config: &ExtractConfig) -> Result<ExtractSummary, AppError> {
    config.validate()?;
    let options = &config.options;

    info!(
        "[EXTRACT] Reading {} (column '{}', chunk size {})",
        config.source_path.display(),
        options.target_column,
        options.chunk_size
    );

    let chunks = ChunkReader::open(&config.source_path, options.chunk_size)?;
    let column = chunks.column_index(&options.target_column)?;

    // Both destinations are opened before the pass and persisted only after
    // every write succeeded; an early return drops (and deletes) both temps.
    let full_copy_file = AtomicFileWriter::create(&config.full_copy_path)?;
    let distinct_file = AtomicFileWriter::create(&config.distinct_path)?;

    let label = full_copy_file.final_path().to_path_buf();
    let mut full_copy = FullCopySink::new(full_copy_file, chunks.headers().clone(), label);
    let mut names = DistinctNameSet::new();

    let stats = run_pipeline(chunks, column, options, &mut full_copy, &mut names)?;

    let full_copy_file = full_copy.finish()?;
    let distinct_file = names.write_csv(distinct_file, &config.distinct_path)?;

    let full_copy_path = full_copy_file.persist()?;
    let distinct_path = distinct_file.persist()?;

    info!(
        "[EXTRACT] Saved {} unique values from {} rows to {}",
        stats.distinct_count,
        stats.total_rows,
        distinct_path.display()
    );

    Ok(ExtractSummary {
        stats,
        full_copy_path,
        distinct_path,
    })
}

/// Runs the extraction over an arbitrary reader and pair of writers.
///
/// This is the same pipeline as [`extract`] without touching the
/// filesystem; the writers are returned flushed.
pub fn extract_from_reader<R, F, D>(
    reader: R,
    options: &ExtractOptions,
    full_copy: F,
    distinct: D,
) -> Result<ExtractOutcome<F, D>, AppError>
where
    R: Read,
    F: Write,
    D: Write,
{
    options.validate()?;

    let chunks = ChunkReader::new(reader, options.chunk_size)?;
    let column = chunks.column_index(&options.target_column)?;

    let mut full_copy_sink = FullCopySink::new(full_copy, chunks.headers().clone(), FULL_COPY_LABEL);
    let mut names = DistinctNameSet::new();

    let stats = run_pipeline(chunks, column, options, &mut full_copy_sink, &mut names)?;

    let full_copy = full_copy_sink.finish()?;
    let distinct = names.write_csv(distinct, DISTINCT_LABEL)?;

    Ok(ExtractOutcome {
        stats,
        full_copy,
        distinct,
    })
}

/// Feeds every chunk, in order, to both consumers.
fn run_pipeline<R: Read, W: Write>(
    chunks: ChunkReader<R>,
    column: usize,
    options: &ExtractOptions,
    full_copy: &mut FullCopySink<W>,
    names: &mut DistinctNameSet,
) -> Result<ExtractStats, AppError> {
    let mut stats = ExtractStats::default();

    for chunk in chunks {
        let chunk = chunk?;

        full_copy.append(&chunk)?;
        let added = names.absorb(&chunk, column, options)?;

        stats.chunks += 1;
        stats.total_rows += chunk.len() as u64;

        debug!(
            chunk_index = chunk.index,
            rows = chunk.len(),
            new_values = added,
            distinct = names.len(),
            "[EXTRACT] Processed chunk"
        );
    }

    stats.distinct_count = names.len();
    Ok(stats)
}

/// Convenience for callers that only have paths.
pub fn extract_paths(
    source: impl AsRef<Path>,
    target_column: &str,
    chunk_size: usize,
    full_copy_path: impl AsRef<Path>,
    distinct_path: impl AsRef<Path>,
) -> Result<ExtractSummary, AppError> {
    let config = ExtractConfig::new(source)
        .target_column(target_column)
        .chunk_size(chunk_size)
        .full_copy_path(full_copy_path.as_ref())
        .distinct_path(distinct_path.as_ref());
    extract(&config)
}
