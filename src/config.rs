//! Run configuration for the extractor and the playlist backend client.
//!
//! Values come from defaults, then the environment (a `.env` file is loaded
//! when present), then CLI overrides applied through the builder setters.

use std::fs;
use std::path::{Component, Path, PathBuf};

use crate::error::AppError;

// ─────────────────────────────────────────────────────────────────────────────
// Defaults
// ─────────────────────────────────────────────────────────────────────────────

/// Rows per chunked read.
pub const DEFAULT_CHUNK_SIZE: usize = 50_000;

/// Column whose distinct values are collected.
pub const DEFAULT_TARGET_COLUMN: &str = "name";

/// Header of the single column in the distinct-names artifact.
pub const DISTINCT_HEADER: &str = "name";

pub const DEFAULT_SOURCE_PATH: &str = "data/raw/tracks.csv";
pub const DEFAULT_FULL_COPY_PATH: &str = "data/tracks.csv";
pub const DEFAULT_DISTINCT_PATH: &str = "data/song_names.csv";

pub const DEFAULT_API_BASE_URL: &str = "http://localhost:5000";
pub const DEFAULT_API_TIMEOUT_SECS: u64 = 30;

// ─────────────────────────────────────────────────────────────────────────────
// Environment keys
// ─────────────────────────────────────────────────────────────────────────────

pub const ENV_SOURCE: &str = "SONG_NAMES_SOURCE";
pub const ENV_CHUNK_SIZE: &str = "SONG_NAMES_CHUNK_SIZE";
pub const ENV_TARGET_COLUMN: &str = "SONG_NAMES_TARGET_COLUMN";
pub const ENV_FULL_COPY_PATH: &str = "SONG_NAMES_FULL_COPY_PATH";
pub const ENV_DISTINCT_PATH: &str = "SONG_NAMES_DISTINCT_PATH";
pub const ENV_NULL_MARKERS: &str = "SONG_NAMES_NULL_MARKERS";
pub const ENV_API_URL: &str = "SONG_NAMES_API_URL";
pub const ENV_API_TIMEOUT_SECS: &str = "SONG_NAMES_API_TIMEOUT_SECS";

// ─────────────────────────────────────────────────────────────────────────────
// ExtractOptions
// ─────────────────────────────────────────────────────────────────────────────

/// Path-independent extraction settings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExtractOptions {
    /// Maximum rows per chunk.
    pub chunk_size: usize,
    /// Column to deduplicate.
    pub target_column: String,
    /// Literal values treated as null in addition to the empty field.
    pub null_markers: Vec<String>,
}

impl Default for ExtractOptions {
    fn default() -> Self {
        Self {
            chunk_size: DEFAULT_CHUNK_SIZE,
            target_column: DEFAULT_TARGET_COLUMN.to_string(),
            null_markers: Vec::new(),
        }
    }
}

impl ExtractOptions {
    pub fn chunk_size(mut self, rows: usize) -> Self {
        self.chunk_size = rows;
        self
    }

    pub fn target_column(mut self, column: impl Into<String>) -> Self {
        self.target_column = column.into();
        self
    }

    pub fn null_markers(mut self, markers: Vec<String>) -> Self {
        self.null_markers = markers;
        self
    }

    /// Returns true if `value` counts as null for the target column.
    pub fn is_null(&self, value: &str) -> bool {
        value.is_empty() || self.null_markers.iter().any(|marker| marker == value)
    }

    /// Rejects settings the extractor cannot run with.
    pub fn validate(&self) -> Result<(), AppError> {
        if self.chunk_size == 0 {
            return Err(AppError::InvalidConfig(
                "chunk_size must be greater than zero".to_string(),
            ));
        }
        if self.target_column.is_empty() {
            return Err(AppError::InvalidConfig(
                "target_column must not be empty".to_string(),
            ));
        }
        Ok(())
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// ExtractConfig
// ─────────────────────────────────────────────────────────────────────────────

/// Full configuration for one file-based extraction run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExtractConfig {
    pub source_path: PathBuf,
    pub full_copy_path: PathBuf,
    pub distinct_path: PathBuf,
    pub options: ExtractOptions,
}

impl Default for ExtractConfig {
    fn default() -> Self {
        Self {
            source_path: PathBuf::from(DEFAULT_SOURCE_PATH),
            full_copy_path: PathBuf::from(DEFAULT_FULL_COPY_PATH),
            distinct_path: PathBuf::from(DEFAULT_DISTINCT_PATH),
            options: ExtractOptions::default(),
        }
    }
}

impl ExtractConfig {
    /// Creates a config for `source` with default output locations.
    pub fn new(source: impl AsRef<Path>) -> Self {
        Self {
            source_path: source.as_ref().to_path_buf(),
            ..Self::default()
        }
    }

    /// Loads the config from the process environment.
    ///
    /// A `.env` file in the working directory is read first if present.
    pub fn from_env() -> Result<Self, AppError> {
        let _ = dotenvy::dotenv();
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Builds the config from an arbitrary key lookup.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, AppError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = Self::default();

        if let Some(source) = lookup(ENV_SOURCE) {
            config.source_path = PathBuf::from(source);
        }
        if let Some(raw) = lookup(ENV_CHUNK_SIZE) {
            config.options.chunk_size = parse_number(ENV_CHUNK_SIZE, &raw)?;
        }
        if let Some(column) = lookup(ENV_TARGET_COLUMN) {
            config.options.target_column = column;
        }
        if let Some(path) = lookup(ENV_FULL_COPY_PATH) {
            config.full_copy_path = PathBuf::from(path);
        }
        if let Some(path) = lookup(ENV_DISTINCT_PATH) {
            config.distinct_path = PathBuf::from(path);
        }
        if let Some(raw) = lookup(ENV_NULL_MARKERS) {
            config.options.null_markers = split_list(&raw);
        }

        Ok(config)
    }

    pub fn source_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.source_path = path.into();
        self
    }

    pub fn full_copy_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.full_copy_path = path.into();
        self
    }

    pub fn distinct_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.distinct_path = path.into();
        self
    }

    pub fn chunk_size(mut self, rows: usize) -> Self {
        self.options = self.options.chunk_size(rows);
        self
    }

    pub fn target_column(mut self, column: impl Into<String>) -> Self {
        self.options = self.options.target_column(column);
        self
    }

    pub fn null_markers(mut self, markers: Vec<String>) -> Self {
        self.options = self.options.null_markers(markers);
        self
    }

    pub fn validate(&self) -> Result<(), AppError> {
        self.options.validate()?;
        if normalize_output_path(&self.full_copy_path)
            == normalize_output_path(&self.distinct_path)
        {
            return Err(AppError::InvalidConfig(format!(
                "full-copy and distinct outputs both point to {}",
                self.full_copy_path.display()
            )));
        }
        Ok(())
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// ApiConfig
// ─────────────────────────────────────────────────────────────────────────────

/// Settings for the playlist backend client.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ApiConfig {
    pub base_url: String,
    pub timeout_secs: u64,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_API_BASE_URL.to_string(),
            timeout_secs: DEFAULT_API_TIMEOUT_SECS,
        }
    }
}

impl ApiConfig {
    pub fn from_env() -> Result<Self, AppError> {
        let _ = dotenvy::dotenv();
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> Result<Self, AppError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = Self::default();
        if let Some(url) = lookup(ENV_API_URL) {
            config.base_url = url;
        }
        if let Some(raw) = lookup(ENV_API_TIMEOUT_SECS) {
            config.timeout_secs = parse_number(ENV_API_TIMEOUT_SECS, &raw)?;
        }
        Ok(config)
    }

    pub fn base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = url.into();
        self
    }

    pub fn timeout_secs(mut self, secs: u64) -> Self {
        self.timeout_secs = secs;
        self
    }

    pub fn validate(&self) -> Result<(), AppError> {
        if self.timeout_secs == 0 {
            return Err(AppError::InvalidConfig(
                "request timeout must be greater than zero".to_string(),
            ));
        }
        url::Url::parse(&self.base_url).map_err(|e| {
            AppError::InvalidConfig(format!("invalid API URL '{}': {}", self.base_url, e))
        })?;
        Ok(())
    }
}

/// Resolves `path` to an absolute, `.`/`..`-free form so aliases of one
/// destination compare equal. The parent is canonicalized when it exists,
/// which also resolves symlinks; the file itself may not exist yet.
fn normalize_output_path(path: &Path) -> PathBuf {
    let absolute = if path.is_absolute() {
        path.to_path_buf()
    } else {
        match std::env::current_dir() {
            Ok(cwd) => cwd.join(path),
            Err(_) => path.to_path_buf(),
        }
    };

    let mut lexical = PathBuf::new();
    for component in absolute.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => {
                lexical.pop();
            }
            other => lexical.push(other),
        }
    }

    match (lexical.parent(), lexical.file_name()) {
        (Some(parent), Some(name)) => match fs::canonicalize(parent) {
            Ok(parent) => parent.join(name),
            Err(_) => lexical,
        },
        _ => lexical,
    }
}

fn parse_number<T: std::str::FromStr>(key: &str, raw: &str) -> Result<T, AppError> {
    raw.trim()
        .parse()
        .map_err(|_| AppError::InvalidConfig(format!("{} must be a whole number, got '{}'", key, raw)))
}

fn split_list(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|item| !item.is_empty())
        .map(str::to_string)
        .collect()
}
