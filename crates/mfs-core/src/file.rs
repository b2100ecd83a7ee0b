//! File materialization.
//!
//! Streams a regular file's bytes to an output writer by driving the
//! zone walker over its logical blocks. Holes are materialized as
//! explicit zeros without reading the device; output is truncated to
//! the inode's recorded size. Data moves through a bounded chunk
//! buffer, so memory use is independent of file and zone size.

use crate::zone::{MappedZone, ZoneWalker};
use crate::MinixFs;
use mfs_block::ByteDevice;
use mfs_error::{MfsError, Result};
use mfs_ondisk::Inode;
use mfs_types::u64_to_usize;
use std::io::Write;
use tracing::{debug, trace};

/// Copy buffer size; any convenient bound, it does not affect output.
const COPY_CHUNK: usize = 4096;

impl<D: ByteDevice> MinixFs<D> {
    /// Write the file's contents to `out`, returning the byte count
    /// (equal to the inode's size on success).
    ///
    /// Fails with the count of unreachable bytes if the file's size
    /// exceeds what the zone pointer hierarchy can address.
    pub fn copy_file_to(&self, inode: &Inode, out: &mut dyn Write) -> Result<u64> {
        let mut walker = ZoneWalker::new(self, inode);
        let zone_size = u64::from(self.zone_size());
        let mut remaining = u64::from(inode.size);
        let mut written = 0_u64;
        let mut chunk = [0_u8; COPY_CHUNK];
        let zeros = [0_u8; COPY_CHUNK];
        let mut k = 0_u64;

        while remaining > 0 {
            let Some(mapped) = walker.map_block(k)? else {
                debug!(
                    target: "mfs::core",
                    event = "unaddressable",
                    block = k,
                    remaining,
                );
                return Err(MfsError::UnaddressableBytes { remaining });
            };
            let step = remaining.min(zone_size);

            match mapped {
                MappedZone::Hole => {
                    trace!(target: "mfs::core", event = "file_hole", block = k, bytes = step);
                    let mut left = step;
                    while left > 0 {
                        let n = u64_to_usize(left.min(COPY_CHUNK as u64), "hole chunk")?;
                        out.write_all(&zeros[..n])?;
                        left -= n as u64;
                    }
                }
                MappedZone::Data(zone) => {
                    let base = self.zone_offset(zone)?;
                    let mut done = 0_u64;
                    while done < step {
                        let n = u64_to_usize((step - done).min(COPY_CHUNK as u64), "copy chunk")?;
                        let offset = base.checked_add(done).ok_or(MfsError::OffsetOverflow {
                            context: "file data offset",
                        })?;
                        self.dev.read_exact_at(offset, &mut chunk[..n])?;
                        out.write_all(&chunk[..n])?;
                        done += n as u64;
                    }
                }
            }

            remaining -= step;
            written += step;
            k += 1;
        }

        Ok(written)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::PartitionSelect;
    use mfs_block::VecByteDevice;
    use mfs_harness::{ImageBuilder, InodeSpec};
    use mfs_types::{InodeNumber, S_IFREG};

    fn open(img: ImageBuilder) -> MinixFs<VecByteDevice> {
        MinixFs::open(img.into_device(), PartitionSelect::Unpartitioned).expect("open")
    }

    fn extract(fs: &MinixFs<VecByteDevice>, inum: u32) -> Vec<u8> {
        let inode = fs.inode(InodeNumber(inum)).expect("inode");
        let mut out = Vec::new();
        let written = fs.copy_file_to(&inode, &mut out).expect("copy");
        assert_eq!(written, u64::from(inode.size));
        assert_eq!(out.len() as u64, written);
        out
    }

    #[test]
    fn small_file_truncated_to_size() {
        let mut img = ImageBuilder::new(16, 1024, 0);
        let z = img.alloc_zone();
        let mut data = vec![0_u8; 1024];
        data[..12].copy_from_slice(b"Hello, fs!\n?");
        img.write_zone(z, &data);
        img.set_inode(
            2,
            InodeSpec {
                mode: S_IFREG | 0o644,
                size: 11,
                zones: [z, 0, 0, 0, 0, 0, 0],
                ..InodeSpec::default()
            },
        );
        let fs = open(img);
        assert_eq!(extract(&fs, 2), b"Hello, fs!\n");
    }

    #[test]
    fn interior_hole_reads_as_zeros_with_no_device_read() {
        // zone[1] == 0; size = zonesize + 5: first zone's bytes then
        // five zero bytes, capped at the inode size.
        let mut img = ImageBuilder::new(16, 1024, 0);
        let z = img.alloc_zone();
        img.write_zone(z, &vec![0xAA_u8; 1024]);
        img.set_inode(
            2,
            InodeSpec {
                mode: S_IFREG | 0o644,
                size: 1024 + 5,
                zones: [z, 0, 0, 0, 0, 0, 0],
                ..InodeSpec::default()
            },
        );
        let fs = open(img);

        let inode = fs.inode(InodeNumber(2)).expect("inode");
        let before = fs.device().read_count();
        let mut out = Vec::new();
        fs.copy_file_to(&inode, &mut out).expect("copy");

        assert_eq!(out.len(), 1024 + 5);
        assert!(out[..1024].iter().all(|b| *b == 0xAA));
        assert_eq!(&out[1024..], &[0, 0, 0, 0, 0]);
        // Exactly one data-zone read; the hole performed none.
        assert_eq!(fs.device().read_count(), before + 1);
    }

    #[test]
    fn seven_zones_exactly_needs_no_indirect_table() {
        let mut img = ImageBuilder::new(16, 1024, 0);
        let mut zones = [0_u32; 7];
        for (i, slot) in zones.iter_mut().enumerate() {
            let z = img.alloc_zone();
            img.write_zone(z, &vec![i as u8 + 1; 1024]);
            *slot = z;
        }
        img.set_inode(
            2,
            InodeSpec {
                mode: S_IFREG | 0o644,
                size: 7 * 1024,
                zones,
                // A garbage indirect pointer that must never be read.
                indirect: 0xDEAD,
                ..InodeSpec::default()
            },
        );
        let fs = open(img);
        let out = extract(&fs, 2);
        assert_eq!(out.len(), 7 * 1024);
        for i in 0..7 {
            assert!(out[i * 1024..(i + 1) * 1024].iter().all(|b| *b == i as u8 + 1));
        }
    }

    #[test]
    fn one_byte_past_direct_reads_the_indirect_table() {
        let mut img = ImageBuilder::new(16, 1024, 0);
        let mut zones = [0_u32; 7];
        for slot in &mut zones {
            let z = img.alloc_zone();
            img.write_zone(z, &vec![0x11_u8; 1024]);
            *slot = z;
        }
        let ind = img.alloc_zone();
        let extra = img.alloc_zone();
        img.write_zone(extra, &vec![0x22_u8; 1024]);
        let mut table = vec![0_u32; 256];
        table[0] = extra;
        img.write_zone_table(ind, &table);
        img.set_inode(
            2,
            InodeSpec {
                mode: S_IFREG | 0o644,
                size: 7 * 1024 + 1,
                zones,
                indirect: ind,
                ..InodeSpec::default()
            },
        );
        let fs = open(img);
        let out = extract(&fs, 2);
        assert_eq!(out.len(), 7 * 1024 + 1);
        assert_eq!(out[7 * 1024], 0x22);
    }

    #[test]
    fn file_of_all_holes_is_all_zeros() {
        let mut img = ImageBuilder::new(16, 1024, 0);
        img.set_inode(
            2,
            InodeSpec {
                mode: S_IFREG | 0o644,
                size: 3 * 1024 + 100,
                ..InodeSpec::default()
            },
        );
        let fs = open(img);

        let inode = fs.inode(InodeNumber(2)).expect("inode");
        let before = fs.device().read_count();
        let mut out = Vec::new();
        fs.copy_file_to(&inode, &mut out).expect("copy");
        assert_eq!(out.len(), 3 * 1024 + 100);
        assert!(out.iter().all(|b| *b == 0));
        assert_eq!(fs.device().read_count(), before);
    }

    #[test]
    fn size_beyond_addressable_range_fails_with_residue() {
        // All pointers absent: every addressable block is a hole, and
        // the size claims one zone more than 7 + E + E*E blocks.
        let mut img = ImageBuilder::new(16, 1024, 0);
        let addressable = 7_u64 + 256 + 256 * 256;
        let size = (addressable + 1) * 1024;
        img.set_inode(
            2,
            InodeSpec {
                mode: S_IFREG | 0o644,
                size: u32::try_from(size).expect("fits u32"),
                ..InodeSpec::default()
            },
        );
        let fs = open(img);

        let inode = fs.inode(InodeNumber(2)).expect("inode");
        let mut out = std::io::sink();
        let err = fs.copy_file_to(&inode, &mut out).unwrap_err();
        assert!(matches!(
            err,
            MfsError::UnaddressableBytes { remaining: 1024 }
        ));
    }
}
