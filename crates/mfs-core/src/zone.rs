//! Zone addressing: mapping logical file blocks to zone numbers.
//!
//! The central walk over an inode's pointer hierarchy: seven direct
//! slots, one single-indirect table, and one double-indirect table. A
//! zone number of 0 anywhere in the hierarchy is a hole — implicitly
//! zero-filled storage — and is propagated without touching the device.
//!
//! An indirect table occupies a full zone of little-endian u32 entries,
//! so `E = zonesize / 4` pointers per table. Tables are loaded lazily
//! and at most once per walker; the second-level table is cached and
//! reloaded only when the first-level index changes.

use crate::MinixFs;
use mfs_block::ByteDevice;
use mfs_error::Result;
use mfs_types::{DIRECT_ZONES, ZoneNumber};
use tracing::trace;

/// The zone backing one logical block of a file.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MappedZone {
    /// Absent storage; the logical block reads as zeros.
    Hole,
    /// Data stored in the given zone.
    Data(ZoneNumber),
}

impl MappedZone {
    fn from_raw(zone: u32) -> Self {
        if zone == 0 {
            Self::Hole
        } else {
            Self::Data(ZoneNumber(zone))
        }
    }
}

/// Walks the zone pointers of one inode.
///
/// Holds per-walk table caches; dropped when the walk finishes or
/// aborts, releasing the buffers on every exit path.
pub struct ZoneWalker<'fs, D> {
    fs: &'fs MinixFs<D>,
    direct: [u32; DIRECT_ZONES],
    indirect: u32,
    two_indirect: u32,
    /// Zone pointers per indirect table.
    entries: u64,
    single: Option<Vec<u32>>,
    double_l1: Option<Vec<u32>>,
    /// Cached second-level table, keyed by its first-level index.
    double_l2: Option<(u64, Vec<u32>)>,
}

impl<'fs, D: ByteDevice> ZoneWalker<'fs, D> {
    #[must_use]
    pub fn new(fs: &'fs MinixFs<D>, inode: &mfs_ondisk::Inode) -> Self {
        Self {
            fs,
            direct: inode.zone,
            indirect: inode.indirect,
            two_indirect: inode.two_indirect,
            entries: u64::from(fs.zone_size() / 4),
            single: None,
            double_l1: None,
            double_l2: None,
        }
    }

    /// Number of logical blocks addressable through the pointer
    /// hierarchy: `7 + E + E*E`.
    #[must_use]
    pub fn addressable_blocks(&self) -> u64 {
        DIRECT_ZONES as u64 + self.entries + self.entries * self.entries
    }

    /// Map logical block `k` to its backing zone.
    ///
    /// Returns `None` once `k` is beyond the addressable range; any
    /// remaining file bytes are unreachable.
    pub fn map_block(&mut self, k: u64) -> Result<Option<MappedZone>> {
        let direct = DIRECT_ZONES as u64;
        let entries = self.entries;

        if k < direct {
            return Ok(Some(MappedZone::from_raw(self.direct[k as usize])));
        }

        if k < direct + entries {
            if self.indirect == 0 {
                // The whole single-indirect region is a hole.
                return Ok(Some(MappedZone::Hole));
            }
            if self.single.is_none() {
                trace!(target: "mfs::core", event = "indirect_load", zone = self.indirect);
                self.single = Some(self.fs.read_zone_table(ZoneNumber(self.indirect))?);
            }
            let zone = table_entry(self.single.as_deref(), k - direct);
            return Ok(Some(MappedZone::from_raw(zone)));
        }

        let j = k - direct - entries;
        let l1 = j / entries;
        let l2 = j % entries;
        if l1 >= entries {
            return Ok(None);
        }

        if self.two_indirect == 0 {
            return Ok(Some(MappedZone::Hole));
        }
        if self.double_l1.is_none() {
            trace!(target: "mfs::core", event = "double_indirect_load", zone = self.two_indirect);
            self.double_l1 = Some(self.fs.read_zone_table(ZoneNumber(self.two_indirect))?);
        }
        let l1_zone = table_entry(self.double_l1.as_deref(), l1);
        if l1_zone == 0 {
            // This entire second-level table is a hole.
            return Ok(Some(MappedZone::Hole));
        }

        let cached = self.double_l2.as_ref().map(|(idx, _)| *idx);
        if cached != Some(l1) {
            trace!(target: "mfs::core", event = "second_level_load", l1, zone = l1_zone);
            let table = self.fs.read_zone_table(ZoneNumber(l1_zone))?;
            self.double_l2 = Some((l1, table));
        }
        let zone = self
            .double_l2
            .as_ref()
            .map_or(0, |(_, table)| table_entry(Some(table), l2));
        Ok(Some(MappedZone::from_raw(zone)))
    }
}

fn table_entry(table: Option<&[u32]>, index: u64) -> u32 {
    table
        .and_then(|t| usize::try_from(index).ok().and_then(|i| t.get(i)))
        .copied()
        .unwrap_or(0)
}
