use std::path::PathBuf;

use serde::Serialize;
use thiserror::Error;

/// Maximum number of header names echoed back in a `MissingColumn` message.
const MAX_LISTED_COLUMNS: usize = 12;

/// User-friendly error presentation for the terminal.
#[derive(Debug, Clone, Serialize)]
pub struct ErrorPresentation {
    pub title: String,
    pub message: String,
    pub action: Option<String>,
}

/// Crate-wide error type.
#[derive(Debug, Error)]
pub enum AppError {
    // ── Extraction ────────────────────────────────────────────────────────────
    #[error("Source not found: {}: {}", path.display(), reason)]
    SourceNotFound { path: PathBuf, reason: String },

    #[error("Column '{column}' not found in source header")]
    MissingColumn {
        column: String,
        available: Vec<String>,
    },

    #[error("Failed to write {}: {}", path.display(), reason)]
    SinkWriteError { path: PathBuf, reason: String },

    #[error("Malformed CSV at row {row}: {reason}")]
    MalformedRow { row: u64, reason: String },

    #[error("Value at row {row} is not valid UTF-8")]
    NotUtf8 { row: u64 },

    // ── Configuration ─────────────────────────────────────────────────────────
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    // ── Catalog ───────────────────────────────────────────────────────────────
    #[error("Failed to load song catalog: {0}")]
    CatalogLoad(String),

    // ── Network ───────────────────────────────────────────────────────────────
    #[error("Connection failed: {0}")]
    ConnectionFailed(String),

    #[error("Unexpected HTTP status {status}")]
    HttpStatus { status: u16 },

    #[error("Invalid response: {0}")]
    InvalidResponse(String),
}

impl AppError {
    /// Builds a `SinkWriteError` for `path` from any displayable cause.
    pub(crate) fn sink(path: impl Into<PathBuf>, reason: impl std::fmt::Display) -> Self {
        AppError::SinkWriteError {
            path: path.into(),
            reason: reason.to_string(),
        }
    }

    /// Converts the error into a presentation suitable for the terminal.
    pub fn to_presentation(&self) -> ErrorPresentation {
        match self {
            // ── Extraction ────────────────────────────────────────────────────
            AppError::SourceNotFound { path, .. } => ErrorPresentation {
                title: "Dataset Not Found".into(),
                message: format!("Could not open the source dataset at {}.", path.display()),
                action: Some("Check the --source path or SONG_NAMES_SOURCE".into()),
            },

            AppError::MissingColumn { column, available } => {
                let mut listed: Vec<&str> = available
                    .iter()
                    .take(MAX_LISTED_COLUMNS)
                    .map(String::as_str)
                    .collect();
                if available.len() > MAX_LISTED_COLUMNS {
                    listed.push("...");
                }
                ErrorPresentation {
                    title: "Column Not Found".into(),
                    message: format!(
                        "The dataset has no '{}' column. Available columns: {}",
                        column,
                        listed.join(", ")
                    ),
                    action: Some("Pass the right --column name".into()),
                }
            }

            AppError::SinkWriteError { path, .. } => ErrorPresentation {
                title: "Write Failed".into(),
                message: format!("Could not write output file {}.", path.display()),
                action: Some("Check permissions and free disk space".into()),
            },

            AppError::MalformedRow { row, reason } => ErrorPresentation {
                title: "Invalid CSV".into(),
                message: format!("The dataset has a formatting problem at row {}: {}", row, reason),
                action: Some("Fix the CSV file and try again".into()),
            },

            AppError::NotUtf8 { row } => ErrorPresentation {
                title: "Invalid File Encoding".into(),
                message: format!("Row {} contains a value that is not UTF-8 encoded.", row),
                action: Some("Convert the dataset to UTF-8".into()),
            },

            // ── Configuration ─────────────────────────────────────────────────
            AppError::InvalidConfig(msg) => ErrorPresentation {
                title: "Invalid Configuration".into(),
                message: msg.clone(),
                action: Some("Fix the option or environment variable".into()),
            },

            // ── Catalog ───────────────────────────────────────────────────────
            AppError::CatalogLoad(msg) => ErrorPresentation {
                title: "Catalog Unavailable".into(),
                message: format!("Could not load the song catalog: {}", msg),
                action: Some("Run `song-names extract` first".into()),
            },

            // ── Network ───────────────────────────────────────────────────────
            AppError::ConnectionFailed(_) => ErrorPresentation {
                title: "Connection Failed".into(),
                message: "Could not reach the playlist backend.".into(),
                action: Some("Check that the backend is running and retry".into()),
            },

            AppError::HttpStatus { status } => ErrorPresentation {
                title: "Backend Error".into(),
                message: format!("The playlist backend answered with HTTP {}.", status),
                action: None,
            },

            AppError::InvalidResponse(_) => ErrorPresentation {
                title: "Unexpected Response".into(),
                message: "The playlist backend returned a response that could not be read.".into(),
                action: None,
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Returns all AppError variants for exhaustive testing.
    fn all_variants() -> Vec<AppError> {
        vec![
            AppError::SourceNotFound {
                path: "data/tracks.csv".into(),
                reason: "No such file or directory".into(),
            },
            AppError::MissingColumn {
                column: "name".into(),
                available: vec!["id".into(), "artists".into()],
            },
            AppError::SinkWriteError {
                path: "/readonly/out.csv".into(),
                reason: "Permission denied".into(),
            },
            AppError::MalformedRow {
                row: 7,
                reason: "found record with 2 fields, but the previous record has 3 fields".into(),
            },
            AppError::NotUtf8 { row: 3 },
            AppError::InvalidConfig("chunk_size must be greater than zero".into()),
            AppError::CatalogLoad("missing file".into()),
            AppError::ConnectionFailed("refused".into()),
            AppError::HttpStatus { status: 503 },
            AppError::InvalidResponse("expected value at line 1".into()),
        ]
    }

    #[test]
    fn all_variants_have_nonempty_title_and_message() {
        for variant in all_variants() {
            let presentation = variant.to_presentation();
            assert!(
                !presentation.title.trim().is_empty(),
                "Empty title for {:?}",
                variant
            );
            assert!(
                !presentation.message.trim().is_empty(),
                "Empty message for {:?}",
                variant
            );
        }
    }

    #[test]
    fn missing_column_lists_available_columns() {
        let presentation = AppError::MissingColumn {
            column: "title".into(),
            available: vec!["id".into(), "name".into()],
        }
        .to_presentation();

        assert!(presentation.message.contains("'title'"));
        assert!(presentation.message.contains("id, name"));
    }

    #[test]
    fn missing_column_truncates_long_headers() {
        let available: Vec<String> = (0..40).map(|i| format!("col{}", i)).collect();
        let presentation = AppError::MissingColumn {
            column: "name".into(),
            available,
        }
        .to_presentation();

        assert!(presentation.message.contains("col11"));
        assert!(!presentation.message.contains("col12"));
        assert!(presentation.message.ends_with("..."));
    }

    #[test]
    fn display_includes_paths() {
        let err = AppError::sink("data/song_names.csv", "disk full");
        let text = err.to_string();
        assert!(text.contains("data/song_names.csv"), "got: {}", text);
        assert!(text.contains("disk full"), "got: {}", text);
    }

    #[test]
    fn serialization_produces_valid_json_with_required_fields() {
        for variant in all_variants() {
            let json = serde_json::to_string(&variant.to_presentation())
                .unwrap_or_else(|_| panic!("Failed to serialize {:?}", variant));
            let parsed: serde_json::Value = serde_json::from_str(&json)
                .unwrap_or_else(|_| panic!("Failed to parse JSON for {:?}", variant));

            assert!(parsed.get("title").is_some());
            assert!(parsed.get("message").is_some());
            assert!(parsed.get("action").is_some());
        }
    }
}
