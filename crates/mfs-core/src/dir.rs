//! Directory scanning.
//!
//! Interprets a directory inode's byte stream as back-to-back 64-byte
//! entries, in lookup mode (find one name) or enumeration mode (visit
//! every live entry). The directory's `size` bounds the entry bytes;
//! holes inside that range cannot hold entries and are skipped.

use crate::zone::{MappedZone, ZoneWalker};
use crate::MinixFs;
use mfs_block::ByteDevice;
use mfs_error::{MfsError, Result};
use mfs_ondisk::{DirEntry, Inode, parse_dir_region};
use mfs_types::{InodeNumber, u64_to_usize};
use tracing::trace;

impl<D: ByteDevice> MinixFs<D> {
    /// Look up `name` in the directory `dir`.
    ///
    /// Returns the child's inode number, or `None` when no live entry
    /// matches. The name is compared as raw bytes against the 60-byte
    /// field, bounded by its optional interior NUL terminator.
    pub fn lookup(&self, dir: &Inode, name: &[u8]) -> Result<Option<InodeNumber>> {
        let mut found = None;
        self.scan_dir(dir, |entry| {
            if !entry.is_free() && entry.matches_name(name) {
                found = Some(entry.inode_number());
                return Ok(false);
            }
            Ok(true)
        })?;
        Ok(found)
    }

    /// Visit every live (non-free) entry of the directory in on-disk
    /// order.
    pub fn for_each_entry(
        &self,
        dir: &Inode,
        mut visit: impl FnMut(&DirEntry) -> Result<()>,
    ) -> Result<()> {
        self.scan_dir(dir, |entry| {
            if !entry.is_free() {
                visit(entry)?;
            }
            Ok(true)
        })
    }

    /// Drive the zone walker over the directory's logical blocks,
    /// feeding decoded entries to `visit` until it returns `false` or
    /// the directory's `size` bytes are exhausted.
    fn scan_dir(
        &self,
        dir: &Inode,
        mut visit: impl FnMut(&DirEntry) -> Result<bool>,
    ) -> Result<()> {
        if !dir.is_dir() {
            return Err(MfsError::NotADirectory);
        }

        let mut walker = ZoneWalker::new(self, dir);
        let zone_size = u64::from(self.zone_size());
        let mut remaining = u64::from(dir.size);
        let mut k = 0_u64;

        while remaining > 0 {
            let Some(mapped) = walker.map_block(k)? else {
                break;
            };
            let step = remaining.min(zone_size);

            match mapped {
                MappedZone::Hole => {
                    // A hole cannot contain valid entries; consume its
                    // share of the directory size and move on.
                    trace!(target: "mfs::core", event = "dir_hole", block = k);
                }
                MappedZone::Data(zone) => {
                    let offset = self.zone_offset(zone)?;
                    let region = self
                        .dev
                        .read_vec_at(offset, u64_to_usize(step, "directory zone bytes")?)?;
                    for entry in parse_dir_region(&region)? {
                        if !visit(&entry)? {
                            return Ok(());
                        }
                    }
                }
            }

            remaining -= step;
            k += 1;
        }

        Ok(())
    }
}
