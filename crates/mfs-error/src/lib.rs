#![forbid(unsafe_code)]
//! Error types for the MINIX toolkit.
//!
//! Defines `MfsError` and a `Result<T>` alias used throughout the
//! workspace. Display strings carry the user-visible diagnostics the
//! front ends print verbatim.

use mfs_types::ParseError;
use thiserror::Error;

/// Unified error type for all toolkit operations.
#[derive(Debug, Error)]
pub enum MfsError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Parse(#[from] ParseError),

    #[error("bad boot sector signature.")]
    BadBootSignature { offset: u64 },

    #[error("invalid partition index {index} (must be 0..=3)")]
    InvalidPartitionIndex { index: u32 },

    #[error("partition {index} is not a MINIX partition (type 0x{type_byte:02x})")]
    NotMinixPartition { index: u32, type_byte: u8 },

    #[error("invalid inode number {inum} (filesystem has {ninodes} inodes)")]
    InvalidInodeNumber { inum: u32, ninodes: u32 },

    #[error("File not found.")]
    FileNotFound,

    #[error("Not a directory while traversing path.")]
    NotADirectory,

    #[error("{path} is not a regular file.")]
    NotARegularFile { path: String },

    #[error("file has {remaining} bytes beyond the addressable zone range")]
    UnaddressableBytes { remaining: u64 },

    #[error("read out of bounds: offset={offset} len={len} device_len={device_len}")]
    OutOfBoundsRead {
        offset: u64,
        len: u64,
        device_len: u64,
    },

    #[error("offset arithmetic overflow: {context}")]
    OffsetOverflow { context: &'static str },
}

/// Result alias using `MfsError`.
pub type Result<T> = std::result::Result<T, MfsError>;
