//! Partition chain resolution.
//!
//! Resolves a (partition, subpartition) selection to the absolute byte
//! offset at which the filesystem begins. The image may be a bare
//! filesystem, a primary partition of an MBR-style table, or one level
//! deeper in a subpartition table stored in the primary's first sector.

use mfs_block::ByteDevice;
use mfs_error::{MfsError, Result};
use mfs_ondisk::{PartitionEntry, PartitionTable};
use mfs_types::{ByteOffset, PART_TABLE_ENTRIES, ParseError, SECTOR_SIZE, u64_to_usize};
use tracing::debug;

/// Which filesystem within the image to open.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PartitionSelect {
    /// The image is an unpartitioned filesystem starting at byte 0.
    Unpartitioned,
    /// A primary partition of the MBR table (index in 0..=3).
    Primary { index: u32 },
    /// A subpartition nested inside a primary partition.
    Subpartition { primary: u32, sub: u32 },
}

/// Resolve `select` to the absolute byte offset of the filesystem.
pub fn locate_filesystem(dev: &impl ByteDevice, select: PartitionSelect) -> Result<ByteOffset> {
    match select {
        PartitionSelect::Unpartitioned => Ok(ByteOffset::ZERO),
        PartitionSelect::Primary { index } => {
            let entry = table_entry(dev, ByteOffset::ZERO, index)?;
            partition_offset(&entry)
        }
        PartitionSelect::Subpartition { primary, sub } => {
            let outer = table_entry(dev, ByteOffset::ZERO, primary)?;
            let base = partition_offset(&outer)?;
            // The subpartition table lives in the primary's first
            // sector, but its lba_first is absolute from the start of
            // the disk, not relative to the primary.
            let inner = table_entry(dev, base, sub)?;
            partition_offset(&inner)
        }
    }
}

fn partition_offset(entry: &PartitionEntry) -> Result<ByteOffset> {
    entry.byte_offset().ok_or(MfsError::OffsetOverflow {
        context: "partition byte offset",
    })
}

/// Read and validate partition table entry `index` of the boot sector
/// at `base`.
fn table_entry(dev: &impl ByteDevice, base: ByteOffset, index: u32) -> Result<PartitionEntry> {
    if index >= PART_TABLE_ENTRIES as u32 {
        return Err(MfsError::InvalidPartitionIndex { index });
    }

    let sector = dev.read_vec_at(base, u64_to_usize(SECTOR_SIZE, "sector size")?)?;
    let table = PartitionTable::parse_boot_sector(&sector).map_err(|err| match err {
        ParseError::InvalidField {
            field: "boot_signature",
            ..
        } => MfsError::BadBootSignature { offset: base.0 },
        other => MfsError::from(other),
    })?;

    let entry = table.entries[index as usize];
    if !entry.is_minix() {
        return Err(MfsError::NotMinixPartition {
            index,
            type_byte: entry.part_type,
        });
    }

    debug!(
        target: "mfs::core",
        event = "partition_entry",
        table_base = base.0,
        index,
        lba_first = entry.lba_first,
        sectors = entry.sectors,
    );
    Ok(entry)
}
