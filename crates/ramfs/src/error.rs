//! Filesystem error types.
//!
//! Every error that concerns a path carries the operation that failed and
//! the path it failed on, mirroring a conventional path error.

use std::fmt;
use std::io;
use std::str::FromStr;

use strum::EnumString;
use thiserror::Error;

/// Operation a path error was raised from.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, EnumString)]
#[strum(ascii_case_insensitive)]
pub enum Op {
    Open,
    Read,
    Write,
    Seek,
    Truncate,
    Chmod,
    Stat,
    /// Host-side step of an import.
    #[strum(serialize = "import", serialize = "map")]
    Import,
}

impl Op {
    /// Parse from string (case-insensitive).
    #[allow(clippy::should_implement_trait)]
    pub fn from_str(s: &str) -> Option<Self> {
        <Self as FromStr>::from_str(s).ok()
    }

    /// Convert to string representation.
    pub fn as_str(&self) -> &'static str {
        match self {
            Op::Open => "open",
            Op::Read => "read",
            Op::Write => "write",
            Op::Seek => "seek",
            Op::Truncate => "truncate",
            Op::Chmod => "chmod",
            Op::Stat => "stat",
            Op::Import => "import",
        }
    }
}

impl fmt::Display for Op {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Filesystem error type.
#[derive(Debug, Error)]
pub enum FsError {
    /// Path is not present in the registry.
    #[error("{op} {path}: file does not exist")]
    NotFound { op: Op, path: String },

    /// Stored mode does not grant the requested permission bits.
    #[error("{op} {path}: permission denied")]
    PermissionDenied { op: Op, path: String },

    /// No more bytes at the cursor.
    ///
    /// May accompany a successful partial read, see [`ReadOutcome`](crate::ReadOutcome).
    #[error("{op} {path}: EOF")]
    Eof { op: Op, path: String },

    /// Cursor is negative when an I/O operation needs a position.
    #[error("{op} {path}: invalid offset {offset}")]
    InvalidOffset { op: Op, path: String, offset: i64 },

    /// The data would have to grow past what can be allocated.
    #[error("{op} {path}: cannot grow to {size} bytes")]
    NoSpace { op: Op, path: String, size: u64 },

    /// Seek whence other than absolute or relative.
    #[error("seek {whence} not implemented")]
    UnsupportedSeek { whence: i32 },

    /// Error reported by the host filesystem during an import.
    #[error("{op} {path}: {source}")]
    Host {
        op: Op,
        path: String,
        #[source]
        source: io::Error,
    },
}

impl FsError {
    /// Create a NotFound error.
    pub fn not_found(op: Op, path: impl Into<String>) -> Self {
        Self::NotFound {
            op,
            path: path.into(),
        }
    }

    /// Create a PermissionDenied error.
    pub fn permission_denied(op: Op, path: impl Into<String>) -> Self {
        Self::PermissionDenied {
            op,
            path: path.into(),
        }
    }

    /// Create an Eof error.
    pub fn eof(op: Op, path: impl Into<String>) -> Self {
        Self::Eof {
            op,
            path: path.into(),
        }
    }

    /// Create an InvalidOffset error.
    pub fn invalid_offset(op: Op, path: impl Into<String>, offset: i64) -> Self {
        Self::InvalidOffset {
            op,
            path: path.into(),
            offset,
        }
    }

    /// Create a NoSpace error.
    pub fn no_space(op: Op, path: impl Into<String>, size: u64) -> Self {
        Self::NoSpace {
            op,
            path: path.into(),
            size,
        }
    }

    /// Wrap a host I/O error.
    pub fn host(op: Op, path: impl Into<String>, source: io::Error) -> Self {
        Self::Host {
            op,
            path: path.into(),
            source,
        }
    }

    /// Returns true for the end-of-stream sentinel.
    pub fn is_eof(&self) -> bool {
        matches!(self, Self::Eof { .. })
    }

    /// Returns true if the path was missing.
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound { .. })
    }

    /// Returns true if the open was refused by the mode check.
    pub fn is_permission_denied(&self) -> bool {
        matches!(self, Self::PermissionDenied { .. })
    }

    /// The operation this error was raised from, if it is a path error.
    pub fn op(&self) -> Option<Op> {
        match self {
            Self::NotFound { op, .. }
            | Self::PermissionDenied { op, .. }
            | Self::Eof { op, .. }
            | Self::InvalidOffset { op, .. }
            | Self::NoSpace { op, .. }
            | Self::Host { op, .. } => Some(*op),
            Self::UnsupportedSeek { .. } => Some(Op::Seek),
        }
    }

    /// The path this error concerns, if any.
    pub fn path(&self) -> Option<&str> {
        match self {
            Self::NotFound { path, .. }
            | Self::PermissionDenied { path, .. }
            | Self::Eof { path, .. }
            | Self::InvalidOffset { path, .. }
            | Self::NoSpace { path, .. }
            | Self::Host { path, .. } => Some(path),
            Self::UnsupportedSeek { .. } => None,
        }
    }
}

/// Convert FsError to std::io::Error for compatibility.
impl From<FsError> for io::Error {
    fn from(e: FsError) -> Self {
        let kind = match &e {
            FsError::NotFound { .. } => io::ErrorKind::NotFound,
            FsError::PermissionDenied { .. } => io::ErrorKind::PermissionDenied,
            FsError::Eof { .. } => io::ErrorKind::UnexpectedEof,
            FsError::InvalidOffset { .. } | FsError::UnsupportedSeek { .. } => {
                io::ErrorKind::InvalidInput
            }
            FsError::NoSpace { .. } => io::ErrorKind::OutOfMemory,
            FsError::Host { source, .. } => source.kind(),
        };
        io::Error::new(kind, e)
    }
}

/// Filesystem result type.
pub type FsResult<T> = Result<T, FsError>;
