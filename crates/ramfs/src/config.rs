//! Filesystem configuration.
//!
//! Configuration is plain data, loadable from RON:
//!
//! ```ron
//! (
//!     create_mode: 0o644,
//!     write_past_end: zero_fill,
//!     truncate_extends: true,
//! )
//! ```
//!
//! Every field is optional. The defaults keep tail-append writes and
//! shrink-only truncation.

use serde::{Deserialize, Serialize};
use std::path::Path;
use std::str::FromStr;
use strum::EnumString;
use thiserror::Error;

use crate::types::FileMode;

/// Mode given to files made by [`Filesystem::create`](crate::Filesystem::create).
pub const DEFAULT_CREATE_MODE: FileMode = FileMode::new(0o666);

/// What a write does when the cursor sits at or past the end of the data.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize, EnumString)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case", ascii_case_insensitive)]
pub enum WritePastEnd {
    /// Append at the current end of the data. No gap is created, so the
    /// bytes land before the cursor position the caller asked for.
    #[default]
    AppendAtTail,
    /// Pad with zero bytes up to the cursor, then write there.
    ZeroFill,
}

/// Configuration errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config {path}: {source}")]
    Read {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("config parse error: {0}")]
    Parse(#[from] ron::error::SpannedError),
}

/// Filesystem configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct FsConfig {
    /// Mode used by `create`.
    pub create_mode: FileMode,

    /// Behavior of writes that start at or beyond the end of the data.
    pub write_past_end: WritePastEnd,

    /// Whether `truncate(n)` with `n` past the end grows the file with zeros.
    /// When false it is a no-op.
    pub truncate_extends: bool,
}

impl Default for FsConfig {
    fn default() -> Self {
        Self {
            create_mode: DEFAULT_CREATE_MODE,
            write_past_end: WritePastEnd::AppendAtTail,
            truncate_extends: false,
        }
    }
}

impl FsConfig {
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse a RON document.
    pub fn from_ron(text: &str) -> Result<Self, ConfigError> {
        Ok(ron::from_str(text)?)
    }

    /// Load a RON config file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.display().to_string(),
            source,
        })?;
        let config = Self::from_ron(&text)?;
        tracing::debug!(path = %path.display(), ?config, "loaded ramfs config");
        Ok(config)
    }

    /// Set the mode used by `create`.
    pub fn with_create_mode(mut self, mode: FileMode) -> Self {
        self.create_mode = mode;
        self
    }

    /// Set the write-past-end policy.
    pub fn with_write_past_end(mut self, policy: WritePastEnd) -> Self {
        self.write_past_end = policy;
        self
    }

    /// Allow `truncate` to grow files.
    pub fn with_truncate_extends(mut self, extends: bool) -> Self {
        self.truncate_extends = extends;
        self
    }
}

impl WritePastEnd {
    /// Parse from string (case-insensitive).
    #[allow(clippy::should_implement_trait)]
    pub fn from_str(s: &str) -> Option<Self> {
        <Self as FromStr>::from_str(s).ok()
    }
}
