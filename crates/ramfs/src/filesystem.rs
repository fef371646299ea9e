//! The path registry.
//!
//! [`Filesystem`] maps path names to [`Node`]s under a single lock. Opening
//! a path returns a [`File`] bound to its node; after that, I/O goes
//! through the node's own lock and the registry is not involved.

use parking_lot::Mutex;
use std::collections::HashMap;
use std::io;
use std::path::Path;
use std::sync::Arc;

use crate::config::FsConfig;
use crate::error::{FsError, FsResult, Op};
use crate::file::File;
use crate::host::{HostFs, LocalHost};
use crate::node::Node;
use crate::types::{FileInfo, FileMode, OpenFlags};

/// In-memory filesystem.
///
/// Paths are opaque keys: no normalization, no directories. Nodes are
/// never removed.
#[derive(Debug)]
pub struct Filesystem {
    files: Mutex<HashMap<String, Arc<Node>>>,
    config: FsConfig,
}

impl Default for Filesystem {
    fn default() -> Self {
        Self::new()
    }
}

impl Filesystem {
    /// Create an empty filesystem.
    pub fn new() -> Self {
        Self::with_config(FsConfig::default())
    }

    /// Create an empty filesystem with the given configuration.
    pub fn with_config(config: FsConfig) -> Self {
        Self {
            files: Mutex::new(HashMap::new()),
            config,
        }
    }

    pub fn config(&self) -> &FsConfig {
        &self.config
    }

    /// Open `name` for reading.
    pub fn open(&self, name: &str) -> FsResult<File> {
        self.open_file(name, OpenFlags::read_only(), FileMode::new(0))
    }

    /// Create `name` read-write with the configured create mode, truncating
    /// it if it already exists.
    pub fn create(&self, name: &str) -> FsResult<File> {
        self.open_file(name, OpenFlags::create_truncate(), self.config.create_mode)
    }

    /// Open `name` with explicit flags and permission.
    ///
    /// A missing path is created with mode `perm` when `flags.create` is set.
    /// The stored mode must carry every permission bit in `perm`, otherwise
    /// the open is refused. The registry lock is held for the whole call, so
    /// two opens of the same path never create two nodes.
    pub fn open_file(&self, name: &str, flags: OpenFlags, perm: FileMode) -> FsResult<File> {
        let mut files = self.files.lock();

        let node = match files.get(name) {
            Some(node) => Arc::clone(node),
            None => {
                if !flags.create {
                    return Err(FsError::not_found(Op::Open, name));
                }
                let node = Arc::new(Node::new(name, perm));
                files.insert(name.to_owned(), Arc::clone(&node));
                tracing::debug!(path = name, mode = %perm, "created node");
                node
            }
        };

        let stored = node.mode();
        if !stored.grants(perm) {
            tracing::warn!(
                path = name,
                stored = %FileMode::new(stored.perm()),
                requested = %FileMode::new(perm.perm()),
                "open refused by mode check"
            );
            return Err(FsError::permission_denied(Op::Open, name));
        }

        let file = File::with_config(node, &self.config);
        if flags.truncate {
            file.truncate(0)?;
            tracing::debug!(path = name, "truncated on open");
        }

        Ok(file)
    }

    /// Change the mode of `name`.
    pub fn chmod(&self, name: &str, mode: FileMode) -> FsResult<()> {
        let files = self.files.lock();
        let node = files
            .get(name)
            .ok_or_else(|| FsError::not_found(Op::Chmod, name))?;
        node.set_mode(mode);
        tracing::debug!(path = name, %mode, "chmod");
        Ok(())
    }

    /// Metadata for `name`.
    pub fn stat(&self, name: &str) -> FsResult<FileInfo> {
        self.node(name, Op::Stat).map(|node| node.stat())
    }

    /// Check if a path exists.
    pub fn exists(&self, name: &str) -> bool {
        self.files.lock().contains_key(name)
    }

    /// Number of files.
    pub fn len(&self) -> usize {
        self.files.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Read entire file contents.
    pub fn read_all(&self, name: &str) -> FsResult<Vec<u8>> {
        self.node(name, Op::Read).map(|node| node.contents())
    }

    /// Write entire file contents.
    ///
    /// Convenience method that creates or truncates `name` and writes `data`.
    pub fn write_all(&self, name: &str, data: &[u8]) -> FsResult<()> {
        let mut file = self.create(name)?;
        file.write(data)?;
        Ok(())
    }

    /// Copy a host file into the registry at `guest`.
    ///
    /// The guest file is created (or truncated), filled with the host bytes
    /// and given the host's mode. A failure part way through leaves whatever
    /// was already written in place.
    pub fn map_file(&self, host: impl AsRef<Path>, guest: &str) -> FsResult<()> {
        self.map_file_from(&LocalHost, host, guest)
    }

    /// [`map_file`](Self::map_file) against an arbitrary host.
    pub fn map_file_from<H: HostFs>(
        &self,
        host_fs: &H,
        host: impl AsRef<Path>,
        guest: &str,
    ) -> FsResult<()> {
        let host = host.as_ref();
        let host_name = host.display().to_string();

        let mut source = host_fs
            .open(host)
            .map_err(|e| FsError::host(Op::Open, &host_name, e))?;
        let meta = host_fs
            .metadata(&source)
            .map_err(|e| FsError::host(Op::Stat, &host_name, e))?;

        let mut file = self.create(guest)?;
        let copied = io::copy(&mut source, &mut file)
            .map_err(|e| FsError::host(Op::Import, &host_name, e))?;

        if copied != meta.size {
            tracing::warn!(
                host = %host_name,
                guest,
                expected = meta.size,
                copied,
                "host file changed size during import"
            );
        }

        self.chmod(guest, meta.mode)?;
        tracing::debug!(
            host = %host_name,
            guest,
            bytes = copied,
            mode = %meta.mode,
            "mapped host file"
        );
        Ok(())
    }

    fn node(&self, name: &str, op: Op) -> FsResult<Arc<Node>> {
        self.files
            .lock()
            .get(name)
            .cloned()
            .ok_or_else(|| FsError::not_found(op, name))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::file::SEEK_SET;
    use crate::host::HostMetadata;
    use std::io::{Cursor, Read};
    use std::path::PathBuf;

    /// Host that serves files from memory.
    #[derive(Default)]
    struct FakeHost {
        files: HashMap<PathBuf, (Vec<u8>, u32)>,
    }

    impl FakeHost {
        fn with_file(mut self, path: &str, data: &[u8], mode: u32) -> Self {
            self.files.insert(PathBuf::from(path), (data.to_vec(), mode));
            self
        }
    }

    struct FakeFile {
        data: Cursor<Vec<u8>>,
        meta: HostMetadata,
    }

    impl io::Read for FakeFile {
        fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
            self.data.read(buf)
        }
    }

    impl HostFs for FakeHost {
        type File = FakeFile;

        fn open(&self, path: &Path) -> io::Result<FakeFile> {
            let (data, mode) = self
                .files
                .get(path)
                .ok_or_else(|| io::Error::new(io::ErrorKind::NotFound, "no such file"))?;
            Ok(FakeFile {
                data: Cursor::new(data.clone()),
                meta: HostMetadata {
                    size: data.len() as u64,
                    mode: FileMode::new(*mode),
                },
            })
        }

        fn metadata(&self, file: &FakeFile) -> io::Result<HostMetadata> {
            Ok(file.meta.clone())
        }
    }

    /// Host whose reads fail after a fixed number of bytes.
    struct FlakyHost {
        good: Vec<u8>,
    }

    struct FlakyReader {
        good: Cursor<Vec<u8>>,
    }

    impl io::Read for FlakyReader {
        fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
            match self.good.read(buf)? {
                0 => Err(io::Error::other("device went away")),
                n => Ok(n),
            }
        }
    }

    impl HostFs for FlakyHost {
        type File = FlakyReader;

        fn open(&self, _path: &Path) -> io::Result<FlakyReader> {
            Ok(FlakyReader {
                good: Cursor::new(self.good.clone()),
            })
        }

        fn metadata(&self, _file: &FlakyReader) -> io::Result<HostMetadata> {
            Ok(HostMetadata {
                size: 1 << 20,
                mode: FileMode::new(0o600),
            })
        }
    }

    #[test]
    fn test_open_missing() {
        let fs = Filesystem::new();
        let err = fs.open("missing").unwrap_err();
        assert!(err.is_not_found());
        assert_eq!(err.op(), Some(Op::Open));
        assert_eq!(err.path(), Some("missing"));
        assert!(fs.is_empty());
    }

    #[test]
    fn test_create_then_open() {
        let fs = Filesystem::new();
        fs.create("missing").unwrap();
        fs.open("missing").unwrap();
        assert_eq!(fs.len(), 1);
        assert_eq!(fs.stat("missing").unwrap().mode, FileMode::new(0o666));
    }

    #[test]
    fn test_open_file_create_uses_perm() {
        let fs = Filesystem::new();
        let file = fs
            .open_file("a", OpenFlags::create(), FileMode::new(0o600))
            .unwrap();
        assert_eq!(file.stat().mode.perm(), 0o600);
    }

    #[test]
    fn test_one_node_per_path() {
        let fs = Filesystem::new();
        let a = fs.create("shared").unwrap();
        let b = fs.open("shared").unwrap();
        assert!(Arc::ptr_eq(a.node(), b.node()));
        assert_eq!(fs.len(), 1);
    }

    #[test]
    fn test_permission_check() {
        let fs = Filesystem::new();
        fs.write_all("locked", b"secret").unwrap();
        fs.chmod("locked", FileMode::new(0o400)).unwrap();

        // Asking for no bits always passes.
        fs.open("locked").unwrap();
        fs.open_file("locked", OpenFlags::read_only(), FileMode::new(0o400))
            .unwrap();

        let err = fs
            .open_file("locked", OpenFlags::read_write(), FileMode::new(0o600))
            .unwrap_err();
        assert!(err.is_permission_denied());

        // create asks for 0o666, which the stored mode no longer grants.
        assert!(fs.create("locked").unwrap_err().is_permission_denied());
        assert_eq!(fs.read_all("locked").unwrap(), b"secret");
    }

    #[test]
    fn test_access_flags_are_not_enforced() {
        let fs = Filesystem::new();
        fs.write_all("notes", b"draft").unwrap();

        let mut file = fs.open("notes").unwrap();
        file.write(b"final").unwrap();
        assert_eq!(fs.read_all("notes").unwrap(), b"final");
    }

    #[test]
    fn test_truncate_on_open() {
        let fs = Filesystem::new();
        fs.write_all("t", b"hello").unwrap();

        let kept = fs
            .open_file("t", OpenFlags::read_write(), FileMode::new(0))
            .unwrap();
        assert_eq!(kept.stat().size, 5);

        fs.open_file("t", OpenFlags::read_write().with_truncate(), FileMode::new(0))
            .unwrap();
        assert_eq!(fs.stat("t").unwrap().size, 0);
    }

    #[test]
    fn test_chmod_missing() {
        let fs = Filesystem::new();
        let err = fs.chmod("ghost", FileMode::new(0o644)).unwrap_err();
        assert!(err.is_not_found());
        assert_eq!(err.op(), Some(Op::Chmod));
        assert!(!fs.exists("ghost"));
    }

    #[test]
    fn test_chmod_visible_through_handles() {
        let fs = Filesystem::new();
        let file = fs.create("m").unwrap();
        fs.chmod("m", FileMode::new(0o751)).unwrap();
        assert_eq!(file.stat().mode, FileMode::new(0o751));
    }

    #[test]
    fn test_write_all_read_all() {
        let fs = Filesystem::new();
        fs.write_all("doc", b"first version").unwrap();
        fs.write_all("doc", b"second").unwrap();
        assert_eq!(fs.read_all("doc").unwrap(), b"second");
        assert!(fs.read_all("nope").unwrap_err().is_not_found());
        assert!(fs.stat("nope").unwrap_err().is_not_found());
    }

    #[test]
    fn test_create_mode_from_config() {
        let fs = Filesystem::with_config(FsConfig::new().with_create_mode(FileMode::new(0o644)));
        fs.create("c").unwrap();
        assert_eq!(fs.stat("c").unwrap().mode.perm(), 0o644);
        assert_eq!(fs.config().create_mode.perm(), 0o644);
    }

    #[test]
    fn test_map_file_from_fake_host() {
        let host = FakeHost::default().with_file("/etc/motd", b"welcome\n", 0o640);
        let fs = Filesystem::new();
        fs.map_file_from(&host, "/etc/motd", "motd").unwrap();

        let mut file = fs.open("motd").unwrap();
        let mut buf = [0u8; 8];
        let out = file.read(&mut buf);
        assert_eq!(out.n, 8);
        assert!(out.error.is_none());
        assert_eq!(&buf, b"welcome\n");
        assert_eq!(file.stat().mode, FileMode::new(0o640));
    }

    #[test]
    fn test_map_file_copies_what_the_host_yields() {
        // Metadata promises more bytes than the reader delivers.
        struct ShrunkHost;

        impl HostFs for ShrunkHost {
            type File = Cursor<Vec<u8>>;

            fn open(&self, _path: &Path) -> io::Result<Cursor<Vec<u8>>> {
                Ok(Cursor::new(b"short".to_vec()))
            }

            fn metadata(&self, _file: &Cursor<Vec<u8>>) -> io::Result<HostMetadata> {
                Ok(HostMetadata {
                    size: 64,
                    mode: FileMode::new(0o644),
                })
            }
        }

        let fs = Filesystem::new();
        fs.map_file_from(&ShrunkHost, "/var/log/rotated", "log").unwrap();
        assert_eq!(fs.read_all("log").unwrap(), b"short");
        assert_eq!(fs.stat("log").unwrap().mode, FileMode::new(0o644));
    }

    #[test]
    fn test_map_file_missing_host() {
        let fs = Filesystem::new();
        let err = fs
            .map_file_from(&FakeHost::default(), "/missing", "guest")
            .unwrap_err();
        match err {
            FsError::Host { op, path, source } => {
                assert_eq!(op, Op::Open);
                assert_eq!(path, "/missing");
                assert_eq!(source.kind(), io::ErrorKind::NotFound);
            }
            other => panic!("unexpected error: {other}"),
        }
        assert!(!fs.exists("guest"));
    }

    #[test]
    fn test_map_file_partial_copy_is_kept() {
        let host = FlakyHost {
            good: b"partial".to_vec(),
        };
        let fs = Filesystem::new();
        let err = fs.map_file_from(&host, "/dev/flaky", "guest").unwrap_err();
        assert!(matches!(err, FsError::Host { op: Op::Import, .. }));

        // Bytes copied before the failure stay, and the mode was never applied.
        assert_eq!(fs.read_all("guest").unwrap(), b"partial");
        assert_eq!(fs.stat("guest").unwrap().mode, FileMode::new(0o666));
    }

    #[test]
    fn test_map_file_into_locked_guest_fails() {
        let host = FakeHost::default().with_file("/h", b"x", 0o644);
        let fs = Filesystem::new();
        fs.write_all("g", b"old").unwrap();
        fs.chmod("g", FileMode::new(0o444)).unwrap();

        let err = fs.map_file_from(&host, "/h", "g").unwrap_err();
        assert!(err.is_permission_denied());
        assert_eq!(fs.read_all("g").unwrap(), b"old");
    }

    #[test]
    fn test_handles_seek_independently() {
        let fs = Filesystem::new();
        let mut a = fs.create("f").unwrap();
        let mut b = fs.open("f").unwrap();
        a.write(b"abcdef").unwrap();
        b.seek(2, SEEK_SET).unwrap();
        assert_eq!(a.offset(), 6);
        assert_eq!(b.offset(), 2);
    }
}
