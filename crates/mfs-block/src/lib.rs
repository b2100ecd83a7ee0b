#![forbid(unsafe_code)]
//! Byte-addressed device layer.
//!
//! Provides the `ByteDevice` trait for positioned reads against a raw
//! disk image, a file-backed implementation using `pread`-style I/O,
//! and an in-memory implementation used by tests and the harness.
//!
//! The toolkit is read-only: no write path exists at this layer.

use mfs_error::{MfsError, Result};
use mfs_types::ByteOffset;
use std::fs::File;
use std::os::unix::fs::FileExt;
use std::path::Path;
use std::sync::atomic::{AtomicU64, Ordering};
use tracing::trace;

/// Byte-addressed device for fixed-offset reads (pread semantics).
pub trait ByteDevice {
    /// Total length in bytes.
    fn len_bytes(&self) -> u64;

    /// Read exactly `buf.len()` bytes from `offset` into `buf`.
    fn read_exact_at(&self, offset: ByteOffset, buf: &mut [u8]) -> Result<()>;

    /// Read exactly `len` bytes from `offset` into a fresh buffer.
    fn read_vec_at(&self, offset: ByteOffset, len: usize) -> Result<Vec<u8>> {
        let mut buf = vec![0_u8; len];
        self.read_exact_at(offset, &mut buf)?;
        Ok(buf)
    }
}

fn check_bounds(offset: ByteOffset, len: usize, device_len: u64) -> Result<()> {
    let len64 = u64::try_from(len).map_err(|_| MfsError::OffsetOverflow {
        context: "read length",
    })?;
    let end = offset
        .checked_add(len64)
        .ok_or(MfsError::OffsetOverflow {
            context: "read range end",
        })?;
    if end.0 > device_len {
        return Err(MfsError::OutOfBoundsRead {
            offset: offset.0,
            len: len64,
            device_len,
        });
    }
    Ok(())
}

/// File-backed byte device using `pread`-style positioned I/O.
///
/// Built on `std::os::unix::fs::FileExt`, so reads carry their own
/// offset and no shared seek cursor is involved. The file is opened
/// read-only; the image is never mutated.
#[derive(Debug)]
pub struct FileByteDevice {
    file: File,
    len: u64,
}

impl FileByteDevice {
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let file = File::open(path.as_ref())?;
        let len = file.metadata()?.len();
        trace!(
            target: "mfs::block",
            event = "open",
            path = %path.as_ref().display(),
            len_bytes = len
        );
        Ok(Self { file, len })
    }
}

impl ByteDevice for FileByteDevice {
    fn len_bytes(&self) -> u64 {
        self.len
    }

    fn read_exact_at(&self, offset: ByteOffset, buf: &mut [u8]) -> Result<()> {
        check_bounds(offset, buf.len(), self.len)?;
        self.file.read_exact_at(buf, offset.0)?;
        Ok(())
    }
}

/// In-memory byte device over an owned image.
///
/// Counts positioned reads so tests can assert on I/O behavior (e.g.
/// that a hole never touches the device, or that an indirect table is
/// loaded once per walk).
#[derive(Debug)]
pub struct VecByteDevice {
    bytes: Vec<u8>,
    reads: AtomicU64,
}

impl VecByteDevice {
    #[must_use]
    pub fn new(bytes: Vec<u8>) -> Self {
        Self {
            bytes,
            reads: AtomicU64::new(0),
        }
    }

    /// Number of positioned reads performed so far.
    #[must_use]
    pub fn read_count(&self) -> u64 {
        self.reads.load(Ordering::Relaxed)
    }

    #[must_use]
    pub fn as_slice(&self) -> &[u8] {
        &self.bytes
    }
}

impl ByteDevice for VecByteDevice {
    fn len_bytes(&self) -> u64 {
        self.bytes.len() as u64
    }

    fn read_exact_at(&self, offset: ByteOffset, buf: &mut [u8]) -> Result<()> {
        check_bounds(offset, buf.len(), self.len_bytes())?;
        let start = usize::try_from(offset.0).map_err(|_| MfsError::OffsetOverflow {
            context: "in-memory offset",
        })?;
        buf.copy_from_slice(&self.bytes[start..start + buf.len()]);
        self.reads.fetch_add(1, Ordering::Relaxed);
        Ok(())
    }
}
