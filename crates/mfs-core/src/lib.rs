#![forbid(unsafe_code)]
//! Read-only MINIX V3 filesystem decoding.
//!
//! A pipeline of layered decoders over a random-access byte source:
//! partition chain resolution, superblock interpretation, inode table
//! addressing, zone-pointer walking (direct, single-indirect,
//! double-indirect, with holes), directory scanning, path resolution,
//! and file materialization.
//!
//! The filesystem handle is constructed once and then used as an
//! immutable read-only view; inodes, directory entries, and indirect
//! tables are decoded on demand and never cached across operations.

pub mod dir;
pub mod file;
pub mod partition;
pub mod path;
pub mod zone;

pub use partition::{PartitionSelect, locate_filesystem};
pub use path::canonicalize_path;
pub use zone::{MappedZone, ZoneWalker};

use mfs_block::ByteDevice;
use mfs_error::{MfsError, Result};
use mfs_ondisk::{Inode, Superblock};
use mfs_types::{
    ByteOffset, INODE_SIZE, InodeNumber, SUPERBLOCK_OFFSET, SUPERBLOCK_SIZE, ZoneNumber,
    u64_to_usize,
};
use tracing::debug;

/// An opened MINIX filesystem: the device, the byte offset at which the
/// filesystem begins, and the decoded superblock with its derived sizes.
#[derive(Debug)]
pub struct MinixFs<D> {
    dev: D,
    fs_offset: ByteOffset,
    sb: Superblock,
    block_size: u32,
    zone_size: u32,
}

impl<D: ByteDevice> MinixFs<D> {
    /// Open the filesystem selected by `select` within `dev`.
    ///
    /// Resolves the partition chain to the filesystem's byte offset,
    /// then reads and validates the superblock at +1024.
    pub fn open(dev: D, select: PartitionSelect) -> Result<Self> {
        let fs_offset = partition::locate_filesystem(&dev, select)?;

        let sb_offset = fs_offset
            .checked_add(SUPERBLOCK_OFFSET)
            .ok_or(MfsError::OffsetOverflow {
                context: "superblock offset",
            })?;
        let region = dev.read_vec_at(sb_offset, SUPERBLOCK_SIZE)?;
        let sb = Superblock::parse_superblock_region(&region)?;
        sb.validate_geometry()?;

        let block_size = sb.block_size();
        let zone_size = sb.zone_size();
        debug!(
            target: "mfs::core",
            event = "open",
            fs_offset = fs_offset.0,
            ninodes = sb.ninodes,
            block_size,
            zone_size,
        );

        Ok(Self {
            dev,
            fs_offset,
            sb,
            block_size,
            zone_size,
        })
    }

    #[must_use]
    pub fn device(&self) -> &D {
        &self.dev
    }

    /// Byte offset of the filesystem within the image.
    #[must_use]
    pub fn fs_offset(&self) -> ByteOffset {
        self.fs_offset
    }

    #[must_use]
    pub fn superblock(&self) -> &Superblock {
        &self.sb
    }

    #[must_use]
    pub fn block_size(&self) -> u32 {
        self.block_size
    }

    #[must_use]
    pub fn zone_size(&self) -> u32 {
        self.zone_size
    }

    /// Absolute byte offset of the first byte of `zone`.
    pub(crate) fn zone_offset(&self, zone: ZoneNumber) -> Result<ByteOffset> {
        let relative = u64::from(zone.0)
            .checked_mul(u64::from(self.zone_size))
            .ok_or(MfsError::OffsetOverflow {
                context: "zone offset",
            })?;
        self.fs_offset
            .checked_add(relative)
            .ok_or(MfsError::OffsetOverflow {
                context: "zone offset",
            })
    }

    /// Read one zone's worth of 32-bit zone pointers (an indirect table).
    pub(crate) fn read_zone_table(&self, zone: ZoneNumber) -> Result<Vec<u32>> {
        let offset = self.zone_offset(zone)?;
        let bytes = self
            .dev
            .read_vec_at(offset, u64_to_usize(u64::from(self.zone_size), "zone size")?)?;
        Ok(bytes
            .chunks_exact(4)
            .map(|c| u32::from_le_bytes([c[0], c[1], c[2], c[3]]))
            .collect())
    }

    /// Fetch and decode inode `inum` from the inode table.
    ///
    /// The table begins at block `2 + i_blocks + z_blocks` from the
    /// filesystem start (blocks, not zones).
    pub fn inode(&self, inum: InodeNumber) -> Result<Inode> {
        if inum.0 == 0 || inum.0 > self.sb.ninodes {
            return Err(MfsError::InvalidInodeNumber {
                inum: inum.0,
                ninodes: self.sb.ninodes,
            });
        }

        let table_bytes = self
            .sb
            .inode_table_block()
            .checked_mul(u64::from(self.block_size))
            .ok_or(MfsError::OffsetOverflow {
                context: "inode table offset",
            })?;
        let index_bytes = u64::from(inum.0 - 1)
            .checked_mul(INODE_SIZE as u64)
            .ok_or(MfsError::OffsetOverflow {
                context: "inode index offset",
            })?;
        let offset = self
            .fs_offset
            .checked_add(table_bytes)
            .and_then(|o| o.checked_add(index_bytes))
            .ok_or(MfsError::OffsetOverflow {
                context: "inode offset",
            })?;

        let raw = self.dev.read_vec_at(offset, INODE_SIZE)?;
        let inode = Inode::parse_from_bytes(&raw)?;
        debug!(
            target: "mfs::core",
            event = "inode_fetch",
            inum = inum.0,
            mode = inode.mode,
            size = inode.size,
        );
        Ok(inode)
    }
}
