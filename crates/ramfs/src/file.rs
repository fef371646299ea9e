//! Positional file handles.
//!
//! A [`File`] binds a cursor to one [`Node`]. Every operation takes the
//! node's lock for its duration; the cursor itself belongs to the handle.
//! `read`, `write` and `seek` take `&mut self`, so a handle shared between
//! threads needs the caller's own synchronization. Separate handles on the
//! same node each keep their own cursor.

use std::cmp;
use std::io;
use std::sync::Arc;

use crate::config::{FsConfig, WritePastEnd};
use crate::error::{FsError, FsResult, Op};
use crate::node::Node;
use crate::types::{FileInfo, ReadOutcome};

/// Seek relative to the start of the file.
pub const SEEK_SET: i32 = 0;
/// Seek relative to the current cursor.
pub const SEEK_CUR: i32 = 1;
/// Seek relative to the end of the file. Not supported.
pub const SEEK_END: i32 = 2;

/// An open handle on a node.
#[derive(Debug)]
pub struct File {
    node: Arc<Node>,
    offset: i64,
    write_past_end: WritePastEnd,
    truncate_extends: bool,
}

impl File {
    /// Open a handle on `node` with the default configuration.
    pub fn new(node: Arc<Node>) -> Self {
        Self::with_config(node, &FsConfig::default())
    }

    pub(crate) fn with_config(node: Arc<Node>, config: &FsConfig) -> Self {
        Self {
            node,
            offset: 0,
            write_past_end: config.write_past_end,
            truncate_extends: config.truncate_extends,
        }
    }

    /// Name of the underlying node.
    pub fn name(&self) -> &str {
        self.node.name()
    }

    /// Current cursor.
    pub fn offset(&self) -> i64 {
        self.offset
    }

    /// The node this handle is bound to.
    pub fn node(&self) -> &Arc<Node> {
        &self.node
    }

    /// Cursor as a buffer index.
    fn position(&self, op: Op) -> FsResult<usize> {
        usize::try_from(self.offset)
            .map_err(|_| FsError::invalid_offset(op, self.node.name(), self.offset))
    }

    /// Resize the file to `size` bytes.
    ///
    /// Shrinks when `size` is below the current length. Otherwise nothing
    /// changes, unless the handle was opened with `truncate_extends`, in which
    /// case the file is zero-filled up to `size`, or fails with
    /// [`FsError::NoSpace`] if that much cannot be allocated. The cursor does
    /// not move.
    pub fn truncate(&self, size: u64) -> FsResult<()> {
        let mut state = self.node.lock();
        let len = state.data.len();
        match usize::try_from(size) {
            Ok(n) if n < len => state.data.truncate(n),
            Ok(n) if self.truncate_extends => {
                state
                    .data
                    .try_reserve(n - len)
                    .map_err(|_| FsError::no_space(Op::Truncate, self.node.name(), size))?;
                state.data.resize(n, 0);
            }
            Err(_) if self.truncate_extends => {
                return Err(FsError::no_space(Op::Truncate, self.node.name(), size));
            }
            _ => {}
        }
        tracing::trace!(path = %self.node.name(), size, "truncate");
        Ok(())
    }

    /// Write `buf` at the cursor.
    ///
    /// Bytes inside the current data are overwritten in place; whatever is
    /// left is appended to the end of the data. When the cursor is already
    /// at or past the end, the default policy appends `buf` to the end of
    /// the existing data without leaving a gap, so the bytes do not land at
    /// the cursor. The cursor always advances by `buf.len()`; a write that
    /// would move it past `i64::MAX` fails before touching the data.
    pub fn write(&mut self, buf: &[u8]) -> FsResult<usize> {
        let start = self.position(Op::Write)?;
        let end = i64::try_from(buf.len())
            .ok()
            .and_then(|n| self.offset.checked_add(n))
            .ok_or_else(|| FsError::invalid_offset(Op::Write, self.node.name(), self.offset))?;

        let mut state = self.node.lock();
        let data = &mut state.data;

        if start > data.len() && self.write_past_end == WritePastEnd::ZeroFill {
            start
                .checked_add(buf.len())
                .and_then(|total| data.try_reserve(total - data.len()).ok())
                .ok_or_else(|| {
                    FsError::no_space(Op::Write, self.node.name(), end.unsigned_abs())
                })?;
            data.resize(start, 0);
        }

        let overwrite = if start < data.len() {
            cmp::min(buf.len(), data.len() - start)
        } else {
            0
        };
        if overwrite > 0 {
            data[start..start + overwrite].copy_from_slice(&buf[..overwrite]);
        }
        data.extend_from_slice(&buf[overwrite..]);

        self.offset = end;
        tracing::trace!(
            path = %self.node.name(),
            overwrote = overwrite,
            appended = buf.len() - overwrite,
            offset = self.offset,
            "write"
        );
        Ok(buf.len())
    }

    /// Read into `buf` from the cursor.
    ///
    /// Copies as many bytes as are available, up to `buf.len()`. If the
    /// cursor is at or past the end, or fewer bytes than requested were
    /// available, the outcome carries an EOF error next to the count.
    pub fn read(&mut self, buf: &mut [u8]) -> ReadOutcome {
        let start = match self.position(Op::Read) {
            Ok(start) => start,
            Err(e) => return ReadOutcome::partial(0, e),
        };
        let state = self.node.lock();
        let data = &state.data;

        if start >= data.len() {
            return ReadOutcome::partial(0, FsError::eof(Op::Read, self.node.name()));
        }

        let n = cmp::min(buf.len(), data.len() - start);
        let Ok(end) = i64::try_from(start + n) else {
            let err = FsError::invalid_offset(Op::Read, self.node.name(), self.offset);
            return ReadOutcome::partial(0, err);
        };
        buf[..n].copy_from_slice(&data[start..start + n]);
        self.offset = end;
        tracing::trace!(path = %self.node.name(), n, offset = self.offset, "read");

        if n < buf.len() {
            ReadOutcome::partial(n, FsError::eof(Op::Read, self.node.name()))
        } else {
            ReadOutcome::full(n)
        }
    }

    /// Move the cursor.
    ///
    /// `whence` is [`SEEK_SET`] or [`SEEK_CUR`]. The result is not clamped:
    /// it may be negative or past the end. Any other `whence` fails and
    /// leaves the cursor where it was.
    pub fn seek(&mut self, offset: i64, whence: i32) -> FsResult<i64> {
        let target = match whence {
            SEEK_SET => offset,
            SEEK_CUR => self.offset.checked_add(offset).ok_or_else(|| {
                FsError::invalid_offset(Op::Seek, self.node.name(), self.offset)
            })?,
            _ => return Err(FsError::UnsupportedSeek { whence }),
        };
        self.offset = target;
        Ok(target)
    }

    /// Snapshot of the node's metadata.
    pub fn stat(&self) -> FileInfo {
        self.node.stat()
    }

    /// Close the handle. There is nothing to release.
    pub fn close(self) -> FsResult<()> {
        Ok(())
    }
}

impl io::Read for File {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        let outcome = File::read(self, buf);
        match outcome.error {
            None => Ok(outcome.n),
            Some(e) if e.is_eof() => Ok(outcome.n),
            Some(e) => Err(e.into()),
        }
    }
}

impl io::Write for File {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        Ok(File::write(self, buf)?)
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

impl io::Seek for File {
    fn seek(&mut self, pos: io::SeekFrom) -> io::Result<u64> {
        let (offset, whence) = match pos {
            io::SeekFrom::Start(n) => {
                let n = i64::try_from(n).map_err(|_| {
                    io::Error::from(FsError::invalid_offset(Op::Seek, self.name(), i64::MAX))
                })?;
                (n, SEEK_SET)
            }
            io::SeekFrom::Current(n) => (n, SEEK_CUR),
            io::SeekFrom::End(n) => (n, SEEK_END),
        };

        let previous = self.offset;
        let target = File::seek(self, offset, whence)?;
        u64::try_from(target).map_err(|_| {
            self.offset = previous;
            FsError::invalid_offset(Op::Seek, self.node.name(), target).into()
        })
    }
}
