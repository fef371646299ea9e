//! Host filesystem access for imports.
//!
//! [`Filesystem::map_file`](crate::Filesystem::map_file) copies a host file
//! into the registry. The host side is a trait so imports can be driven
//! from something other than the real filesystem.

use std::fs;
use std::io;
use std::path::Path;

use crate::types::FileMode;

/// Metadata the host reports for a file being imported.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HostMetadata {
    /// Size in bytes when the file was opened.
    pub size: u64,
    /// Mode bits, permissions plus [`FileMode::DIR`] for directories.
    pub mode: FileMode,
}

/// Source of files for imports.
pub trait HostFs {
    /// Open host file.
    type File: io::Read;

    /// Open `path` for reading.
    fn open(&self, path: &Path) -> io::Result<Self::File>;

    /// Stat an opened file.
    fn metadata(&self, file: &Self::File) -> io::Result<HostMetadata>;
}

/// The process's real filesystem.
#[derive(Debug, Clone, Copy, Default)]
pub struct LocalHost;

impl HostFs for LocalHost {
    type File = fs::File;

    fn open(&self, path: &Path) -> io::Result<fs::File> {
        fs::File::open(path)
    }

    fn metadata(&self, file: &fs::File) -> io::Result<HostMetadata> {
        let meta = file.metadata()?;
        Ok(metadata_to_host(&meta))
    }
}

/// Convert std::fs::Metadata to HostMetadata.
fn metadata_to_host(meta: &fs::Metadata) -> HostMetadata {
    let mut bits = permission_bits(meta);
    if meta.is_dir() {
        bits |= FileMode::DIR;
    }
    HostMetadata {
        size: meta.len(),
        mode: FileMode::new(bits),
    }
}

#[cfg(unix)]
fn permission_bits(meta: &fs::Metadata) -> u32 {
    use std::os::unix::fs::PermissionsExt;
    meta.permissions().mode() & FileMode::MODE_MASK
}

#[cfg(not(unix))]
fn permission_bits(meta: &fs::Metadata) -> u32 {
    if meta.permissions().readonly() {
        0o444
    } else {
        0o666
    }
}
