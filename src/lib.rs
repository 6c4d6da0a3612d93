//! Song-name extraction from large track datasets.
//!
//! The core is [`streaming::extract`]: a single bounded-memory pass over a
//! CSV source that writes a full copy and a deduplicated single-column table.
//! Around it sit a case-insensitive [`catalog::SongCatalog`] over the result
//! and a small client for the playlist backend in [`api`].

pub mod api;
pub mod catalog;
pub mod config;
pub mod error;
pub mod streaming;

pub use catalog::SongCatalog;
pub use config::{ApiConfig, ExtractConfig, ExtractOptions};
pub use error::{AppError, ErrorPresentation};
pub use streaming::{extract, extract_from_reader, ExtractStats, ExtractSummary};
