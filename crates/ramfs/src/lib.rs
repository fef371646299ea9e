//! # ramfs
//!
//! In-memory virtual filesystem with positional file handles.
//!
//! Key components:
//!
//! - [`Filesystem`] - Registry mapping path names to nodes
//! - [`Node`] - One file's bytes and metadata behind its own lock
//! - [`File`] - Handle with a private cursor into a node
//! - [`HostFs`] - Host side of [`Filesystem::map_file`] imports
//!
//! ## Design Decisions
//!
//! - **Flat namespace**: paths are opaque keys. There are no directories
//!   to traverse and nodes are never removed.
//! - **Two lock scopes**: the registry lock covers the path table only;
//!   each node has its own lock for data and metadata. Opens serialize with
//!   each other, I/O on different nodes does not.
//! - **Cursor per handle**: `read`, `write` and `seek` take `&mut self`.
//!   Handles on the same node see the same bytes but move independently.
//! - **Reads report count and EOF together**: [`File::read`] returns a
//!   [`ReadOutcome`] so a short read keeps its byte count next to the
//!   end-of-file error.
//!
//! ```
//! use ramfs::{Filesystem, SEEK_SET};
//!
//! let fs = Filesystem::new();
//! let mut file = fs.create("notes.txt")?;
//! file.write(b"hello world")?;
//! file.seek(0, SEEK_SET)?;
//! file.write(b"HELLO")?;
//!
//! assert_eq!(fs.read_all("notes.txt")?, b"HELLO world");
//! # Ok::<(), ramfs::FsError>(())
//! ```

mod config;
mod error;
mod file;
mod filesystem;
mod host;
mod node;
mod types;

pub use config::{ConfigError, FsConfig, WritePastEnd, DEFAULT_CREATE_MODE};
pub use error::{FsError, FsResult, Op};
pub use file::{File, SEEK_CUR, SEEK_END, SEEK_SET};
pub use filesystem::Filesystem;
pub use host::{HostFs, HostMetadata, LocalHost};
pub use node::Node;
pub use types::{FileInfo, FileMode, OpenFlags, ReadOutcome};
