//! Storage node for one virtual file.

use parking_lot::{Mutex, MutexGuard};
use std::time::SystemTime;

use crate::types::{FileInfo, FileMode};

/// Mutable state of a node, guarded by the node's lock.
#[derive(Debug)]
pub(crate) struct NodeState {
    pub(crate) data: Vec<u8>,
    pub(crate) mode: FileMode,
    pub(crate) mod_time: SystemTime,
    pub(crate) is_dir: bool,
}

/// One file's bytes and metadata behind its own lock.
///
/// Nodes are created and owned by a [`Filesystem`](crate::Filesystem);
/// [`File`](crate::File) handles share them. The name is fixed for the
/// node's lifetime, everything else lives under the lock.
#[derive(Debug)]
pub struct Node {
    name: String,
    state: Mutex<NodeState>,
}

impl Node {
    /// Create an empty node. The modification time is taken now and is
    /// not touched by later writes.
    pub fn new(name: impl Into<String>, mode: FileMode) -> Self {
        Self {
            name: name.into(),
            state: Mutex::new(NodeState {
                data: Vec::new(),
                mode,
                mod_time: SystemTime::now(),
                is_dir: mode.is_dir(),
            }),
        }
    }

    /// Path the node was created under.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Snapshot of the node's metadata.
    pub fn stat(&self) -> FileInfo {
        let state = self.state.lock();
        FileInfo {
            name: self.name.clone(),
            size: state.data.len() as u64,
            mode: state.mode,
            mod_time: state.mod_time,
            is_dir: state.is_dir,
        }
    }

    /// Current mode bits.
    pub fn mode(&self) -> FileMode {
        self.state.lock().mode
    }

    /// Current size in bytes.
    pub fn len(&self) -> usize {
        self.state.lock().data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub(crate) fn set_mode(&self, mode: FileMode) {
        self.state.lock().mode = mode;
    }

    /// Copy of the whole contents.
    pub fn contents(&self) -> Vec<u8> {
        self.state.lock().data.clone()
    }

    pub(crate) fn lock(&self) -> MutexGuard<'_, NodeState> {
        self.state.lock()
    }
}
