//! Running set of distinct, non-null values of one column.

use std::collections::HashMap;
use std::io::Write;
use std::path::Path;

use csv::WriterBuilder;

use crate::config::{ExtractOptions, DISTINCT_HEADER};
use crate::error::AppError;
use crate::streaming::chunk_reader::RowChunk;

/// Distinct values folded from a sequence of chunks.
///
/// Each value remembers when it was first seen, so the written artifact
/// follows first-occurrence order even though lookups are hash based.
#[derive(Debug, Default, Clone)]
pub struct DistinctNameSet {
    first_seen: HashMap<String, u64>,
}

impl DistinctNameSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.first_seen.len()
    }

    pub fn is_empty(&self) -> bool {
        self.first_seen.is_empty()
    }

    pub fn contains(&self, value: &str) -> bool {
        self.first_seen.contains_key(value)
    }

    /// Inserts `value`; returns false if it was already present.
    pub fn insert(&mut self, value: &str) -> bool {
        if self.first_seen.contains_key(value) {
            return false;
        }
        let order = self.first_seen.len() as u64;
        self.first_seen.insert(value.to_string(), order);
        true
    }

    /// Folds the `column` values of `chunk` into the set, skipping nulls.
    ///
    /// Returns the number of values that were new.
    ///
    /// # Errors
    ///
    /// Returns `AppError::NotUtf8` if a non-null value is not valid UTF-8.
    pub fn absorb(
        &mut self,
        chunk: &RowChunk,
        column: usize,
        options: &ExtractOptions,
    ) -> Result<usize, AppError> {
        let mut added = 0;
        for (row, record) in chunk.numbered() {
            let Some(raw) = record.get(column) else {
                continue;
            };
            let value = std::str::from_utf8(raw).map_err(|_| AppError::NotUtf8 { row })?;
            if options.is_null(value) {
                continue;
            }
            if self.insert(value) {
                added += 1;
            }
        }
        Ok(added)
    }

    /// Values in first-occurrence order.
    pub fn to_ordered_vec(&self) -> Vec<&str> {
        let mut values: Vec<(&str, u64)> = self
            .first_seen
            .iter()
            .map(|(value, order)| (value.as_str(), *order))
            .collect();
        values.sort_unstable_by_key(|(_, order)| *order);
        values.into_iter().map(|(value, _)| value).collect()
    }

    /// Writes the set as a single-column CSV with header `name`.
    ///
    /// `label` names the destination in error messages.
    pub fn write_csv<W: Write>(&self, inner: W, label: impl AsRef<Path>) -> Result<W, AppError> {
        let label = label.as_ref();
        let mut writer = WriterBuilder::new().has_headers(false).from_writer(inner);

        writer
            .write_record([DISTINCT_HEADER])
            .map_err(|e| AppError::sink(label, e))?;
        for value in self.to_ordered_vec() {
            writer
                .write_record([value])
                .map_err(|e| AppError::sink(label, e))?;
        }

        writer
            .into_inner()
            .map_err(|e| AppError::sink(label, e.error()))
    }
}

impl<'a> Extend<&'a str> for DistinctNameSet {
    fn extend<I: IntoIterator<Item = &'a str>>(&mut self, iter: I) {
        for value in iter {
            self.insert(value);
        }
    }
}
