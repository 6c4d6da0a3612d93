//! Case-insensitive lookup over the distinct-names artifact.
//!
//! Names are stored lowercased in an ordered set, so prefix suggestions are
//! a range scan rather than a full pass.

use std::collections::BTreeSet;
use std::io::Read;
use std::path::Path;

use tracing::info;

use crate::config::DISTINCT_HEADER;
use crate::error::AppError;
use crate::streaming::ChunkReader;

/// Default number of suggestions returned.
pub const DEFAULT_SUGGESTION_LIMIT: usize = 10;

/// Rows read per step while loading.
const LOAD_CHUNK_SIZE: usize = 50_000;

/// Known song names, lowercased.
#[derive(Debug, Default, Clone)]
pub struct SongCatalog {
    names: BTreeSet<String>,
}

impl SongCatalog {
    /// Loads the `name` column of the CSV at `path`.
    ///
    /// # Errors
    ///
    /// Returns `AppError::CatalogLoad` if the file is missing, malformed or
    /// has no `name` column.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, AppError> {
        let path = path.as_ref();
        let chunks = ChunkReader::open(path, LOAD_CHUNK_SIZE)
            .map_err(|e| AppError::CatalogLoad(e.to_string()))?;
        let catalog = Self::collect(chunks)?;
        info!(
            "[CATALOG] Loaded {} songs from {}",
            catalog.len(),
            path.display()
        );
        Ok(catalog)
    }

    /// Loads a catalog from any CSV reader with a `name` column.
    pub fn from_reader<R: Read>(reader: R) -> Result<Self, AppError> {
        let chunks = ChunkReader::new(reader, LOAD_CHUNK_SIZE)
            .map_err(|e| AppError::CatalogLoad(e.to_string()))?;
        Self::collect(chunks)
    }

    fn collect<R: Read>(chunks: ChunkReader<R>) -> Result<Self, AppError> {
        let column = chunks
            .column_index(DISTINCT_HEADER)
            .map_err(|e| AppError::CatalogLoad(e.to_string()))?;

        let mut catalog = Self::default();
        for chunk in chunks {
            let chunk = chunk.map_err(|e| AppError::CatalogLoad(e.to_string()))?;
            for (row, record) in chunk.numbered() {
                let Some(raw) = record.get(column) else {
                    continue;
                };
                let name = std::str::from_utf8(raw)
                    .map_err(|_| AppError::CatalogLoad(format!("row {} is not UTF-8", row)))?;
                catalog.insert(name);
            }
        }
        Ok(catalog)
    }

    /// Adds `name`; empty names are ignored.
    pub fn insert(&mut self, name: &str) {
        if !name.is_empty() {
            self.names.insert(name.to_lowercase());
        }
    }

    pub fn len(&self) -> usize {
        self.names.len()
    }

    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }

    /// Case-insensitive membership.
    pub fn contains(&self, song: &str) -> bool {
        self.names.contains(&song.to_lowercase())
    }

    /// Names starting with `query`, excluding an exact match.
    ///
    /// Results are lowercased and sorted; an empty query yields nothing.
    pub fn suggestions(&self, query: &str, limit: usize) -> Vec<String> {
        let query = query.to_lowercase();
        if query.is_empty() {
            return Vec::new();
        }

        self.names
            .range(query.clone()..)
            .take_while(|name| name.starts_with(&query))
            .filter(|name| **name != query)
            .take(limit)
            .cloned()
            .collect()
    }
}

impl<'a> FromIterator<&'a str> for SongCatalog {
    fn from_iter<I: IntoIterator<Item = &'a str>>(iter: I) -> Self {
        let mut catalog = Self::default();
        for name in iter {
            catalog.insert(name);
        }
        catalog
    }
}
