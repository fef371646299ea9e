//! Core filesystem types.
//!
//! These mirror the shapes of conventional file APIs: a mode word with
//! permission bits, an immutable stat snapshot and a set of open flags.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::time::SystemTime;

use crate::error::FsError;

/// File mode: permission bits plus type bits.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct FileMode(pub u32);

impl FileMode {
    /// Directory type bit.
    pub const DIR: u32 = 0o040000;

    /// Mask of the Unix permission bits.
    pub const PERM_MASK: u32 = 0o777;

    /// Permission bits plus setuid, setgid and sticky.
    pub const MODE_MASK: u32 = 0o7777;

    pub const fn new(bits: u32) -> Self {
        Self(bits)
    }

    /// Raw mode bits.
    pub const fn bits(self) -> u32 {
        self.0
    }

    /// The Unix permission bits (`mode & 0o777`).
    pub const fn perm(self) -> u32 {
        self.0 & Self::PERM_MASK
    }

    /// Returns true if the directory type bit is set.
    pub const fn is_dir(self) -> bool {
        self.0 & Self::DIR != 0
    }

    /// Returns true if every permission bit in `requested` is also set here.
    pub const fn grants(self, requested: FileMode) -> bool {
        self.perm() & requested.perm() == requested.perm()
    }
}

impl From<u32> for FileMode {
    fn from(bits: u32) -> Self {
        Self(bits)
    }
}

impl fmt::Display for FileMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:#o}", self.0)
    }
}

/// Immutable snapshot of a node's metadata.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileInfo {
    /// Path the node was created under.
    pub name: String,
    /// Size in bytes at the time of the snapshot.
    pub size: u64,
    /// Mode bits.
    pub mode: FileMode,
    /// Modification time. Set when the node is created.
    pub mod_time: SystemTime,
    /// Directory flag.
    pub is_dir: bool,
}

impl FileInfo {
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn size(&self) -> u64 {
        self.size
    }

    pub fn mode(&self) -> FileMode {
        self.mode
    }

    pub fn mod_time(&self) -> SystemTime {
        self.mod_time
    }

    pub fn is_dir(&self) -> bool {
        self.is_dir
    }
}

/// Open file flags.
///
/// Only `create` and `truncate` change what an open does. `read` and
/// `write` are recorded for callers but not enforced: every handle can both
/// read and write, and access is decided by the `perm` bits passed to
/// [`Filesystem::open_file`](crate::Filesystem::open_file).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OpenFlags {
    /// Read access requested. Not enforced.
    pub read: bool,
    /// Write access requested. Not enforced.
    pub write: bool,
    /// Create if not exists.
    pub create: bool,
    /// Truncate on open.
    pub truncate: bool,
}

impl Default for OpenFlags {
    fn default() -> Self {
        Self {
            read: true,
            write: false,
            create: false,
            truncate: false,
        }
    }
}

impl OpenFlags {
    /// Read-only access.
    pub fn read_only() -> Self {
        Self::default()
    }

    /// Read-write access.
    pub fn read_write() -> Self {
        Self {
            read: true,
            write: true,
            ..Default::default()
        }
    }

    /// Write-only access.
    pub fn write_only() -> Self {
        Self {
            read: false,
            write: true,
            ..Default::default()
        }
    }

    /// Read-write, created if missing.
    pub fn create() -> Self {
        Self {
            create: true,
            ..Self::read_write()
        }
    }

    /// Read-write, created if missing, truncated on open.
    pub fn create_truncate() -> Self {
        Self {
            create: true,
            truncate: true,
            ..Self::read_write()
        }
    }

    /// Add the create flag.
    pub fn with_create(mut self) -> Self {
        self.create = true;
        self
    }

    /// Add the truncate flag.
    pub fn with_truncate(mut self) -> Self {
        self.truncate = true;
        self
    }
}

/// Result of a read through a [`File`](crate::File).
///
/// A read can move bytes and still hit end of file. Both facts are kept:
/// `n` is the number of bytes copied, `error` is set when fewer bytes than
/// requested were available.
#[derive(Debug)]
#[must_use]
pub struct ReadOutcome {
    /// Bytes copied into the caller's buffer.
    pub n: usize,
    /// End-of-stream or offset error, if any.
    pub error: Option<FsError>,
}

impl ReadOutcome {
    pub(crate) fn full(n: usize) -> Self {
        Self { n, error: None }
    }

    pub(crate) fn partial(n: usize, error: FsError) -> Self {
        Self {
            n,
            error: Some(error),
        }
    }

    /// Returns true if the read stopped at end of file.
    pub fn is_eof(&self) -> bool {
        self.error.as_ref().is_some_and(FsError::is_eof)
    }

    /// Collapse into a `Result`, discarding any bytes counted alongside an error.
    pub fn into_result(self) -> Result<usize, FsError> {
        match self.error {
            Some(e) => Err(e),
            None => Ok(self.n),
        }
    }
}
