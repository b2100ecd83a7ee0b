#![forbid(unsafe_code)]
//! Shared types for the MINIX toolkit.
//!
//! Newtypes for on-disk quantities (inode numbers, zone numbers, byte
//! offsets), the little-endian byte-level decoders used by all parsing
//! code, on-disk layout constants, and POSIX mode bits.

use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

// ── On-disk layout constants ────────────────────────────────────────────────

/// Byte offset of the superblock from the start of the filesystem.
pub const SUPERBLOCK_OFFSET: u64 = 1024;
/// Bytes decoded from the superblock region.
pub const SUPERBLOCK_SIZE: usize = 32;
/// MINIX V3 superblock magic.
pub const MINIX_MAGIC: u16 = 0x4D5A;

/// Size of one disk sector (LBA unit).
pub const SECTOR_SIZE: u64 = 512;
/// Byte offset of the partition table within a boot sector.
pub const PART_TABLE_OFFSET: usize = 0x1BE;
/// Number of entries in a partition table.
pub const PART_TABLE_ENTRIES: usize = 4;
/// Size of one partition table entry.
pub const PART_ENTRY_SIZE: usize = 16;
/// Partition type byte identifying a MINIX partition.
pub const MINIX_PART_TYPE: u8 = 0x81;
/// Boot sector signature bytes at offsets 510 and 511.
pub const BOOT_SIGNATURE: [u8; 2] = [0x55, 0xAA];

/// On-disk inode size in bytes.
pub const INODE_SIZE: usize = 64;
/// Number of direct zone pointers in an inode.
pub const DIRECT_ZONES: usize = 7;
/// On-disk directory entry size in bytes.
pub const DIRENT_SIZE: usize = 64;
/// Width of the directory entry name field.
pub const DIRENT_NAME_LEN: usize = 60;

// ── POSIX file mode constants ───────────────────────────────────────────────

/// File type mask (upper 4 bits of mode).
pub const S_IFMT: u16 = 0o170_000;
/// Named pipe (FIFO).
pub const S_IFIFO: u16 = 0o010_000;
/// Character device.
pub const S_IFCHR: u16 = 0o020_000;
/// Directory.
pub const S_IFDIR: u16 = 0o040_000;
/// Block device.
pub const S_IFBLK: u16 = 0o060_000;
/// Regular file.
pub const S_IFREG: u16 = 0o100_000;
/// Symbolic link.
pub const S_IFLNK: u16 = 0o120_000;
/// Socket.
pub const S_IFSOCK: u16 = 0o140_000;

// ── Newtypes ────────────────────────────────────────────────────────────────

/// MINIX inode number (u32, 1-indexed; 0 marks a free directory slot).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct InodeNumber(pub u32);

impl InodeNumber {
    /// The root directory inode.
    pub const ROOT: Self = Self(1);
}

/// MINIX zone number (u32; 0 denotes a hole, not an error).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct ZoneNumber(pub u32);

impl ZoneNumber {
    /// Whether this zone number denotes a hole (absent storage).
    #[must_use]
    pub fn is_hole(self) -> bool {
        self.0 == 0
    }
}

/// Byte offset within the image (pread semantics).
///
/// A unit-carrying wrapper to prevent mixing bytes with blocks or zones.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct ByteOffset(pub u64);

impl ByteOffset {
    pub const ZERO: Self = Self(0);

    /// Add a byte count, returning `None` on overflow.
    #[must_use]
    pub fn checked_add(self, bytes: u64) -> Option<Self> {
        self.0.checked_add(bytes).map(Self)
    }

    /// Multiply by a scalar, returning `None` on overflow.
    #[must_use]
    pub fn checked_mul(self, factor: u64) -> Option<Self> {
        self.0.checked_mul(factor).map(Self)
    }
}

impl fmt::Display for InodeNumber {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl fmt::Display for ZoneNumber {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl fmt::Display for ByteOffset {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

// ── Parse errors ────────────────────────────────────────────────────────────

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ParseError {
    #[error("insufficient data: need {needed} bytes at offset {offset}, got {actual}")]
    InsufficientData {
        needed: usize,
        offset: usize,
        actual: usize,
    },
    #[error("bad magic number. (0x{actual:04x}) This does not look like a MINIX filesystem.")]
    InvalidMagic { expected: u16, actual: u16 },
    #[error("invalid field: {field} ({reason})")]
    InvalidField {
        field: &'static str,
        reason: &'static str,
    },
    #[error("integer conversion failed: {field}")]
    IntegerConversion { field: &'static str },
}

// ── Byte-level decoders ─────────────────────────────────────────────────────

#[inline]
pub fn ensure_slice(data: &[u8], offset: usize, len: usize) -> Result<&[u8], ParseError> {
    let Some(end) = offset.checked_add(len) else {
        return Err(ParseError::InvalidField {
            field: "offset",
            reason: "overflow",
        });
    };

    if end > data.len() {
        return Err(ParseError::InsufficientData {
            needed: len,
            offset,
            actual: data.len().saturating_sub(offset),
        });
    }

    Ok(&data[offset..end])
}

#[inline]
pub fn read_u8(data: &[u8], offset: usize) -> Result<u8, ParseError> {
    Ok(ensure_slice(data, offset, 1)?[0])
}

#[inline]
pub fn read_le_u16(data: &[u8], offset: usize) -> Result<u16, ParseError> {
    let bytes = ensure_slice(data, offset, 2)?;
    Ok(u16::from_le_bytes([bytes[0], bytes[1]]))
}

#[inline]
pub fn read_le_i16(data: &[u8], offset: usize) -> Result<i16, ParseError> {
    let bytes = ensure_slice(data, offset, 2)?;
    Ok(i16::from_le_bytes([bytes[0], bytes[1]]))
}

#[inline]
pub fn read_le_u32(data: &[u8], offset: usize) -> Result<u32, ParseError> {
    let bytes = ensure_slice(data, offset, 4)?;
    Ok(u32::from_le_bytes([bytes[0], bytes[1], bytes[2], bytes[3]]))
}

#[inline]
pub fn read_le_i32(data: &[u8], offset: usize) -> Result<i32, ParseError> {
    let bytes = ensure_slice(data, offset, 4)?;
    Ok(i32::from_le_bytes([bytes[0], bytes[1], bytes[2], bytes[3]]))
}

#[inline]
pub fn read_fixed<const N: usize>(data: &[u8], offset: usize) -> Result<[u8; N], ParseError> {
    let bytes = ensure_slice(data, offset, N)?;
    let mut out = [0_u8; N];
    out.copy_from_slice(bytes);
    Ok(out)
}

/// Narrow a `u64` to `usize` with an explicit error path.
///
/// On 64-bit platforms this is infallible; on 32-bit it can fail. The
/// `field` label is included in the error for diagnostics.
pub fn u64_to_usize(value: u64, field: &'static str) -> Result<usize, ParseError> {
    usize::try_from(value).map_err(|_| ParseError::IntegerConversion { field })
}
