#![forbid(unsafe_code)]
//! Test support: construct MINIX V3 images in memory.
//!
//! Writes raw on-disk bytes directly — independently of the parsing
//! crates — so tests exercise the real decoders against independently
//! serialized structures. Panics on misuse; this crate backs tests
//! only and is never part of the shipped tools.

use mfs_block::VecByteDevice;
use mfs_types::{
    BOOT_SIGNATURE, DIRENT_NAME_LEN, DIRENT_SIZE, DIRECT_ZONES, INODE_SIZE, MINIX_MAGIC,
    PART_ENTRY_SIZE, PART_TABLE_OFFSET, SECTOR_SIZE,
};

/// Fields of one synthetic inode. Times are left zero.
#[derive(Debug, Clone, Copy)]
pub struct InodeSpec {
    pub mode: u16,
    pub links: u16,
    pub uid: u16,
    pub gid: u16,
    pub size: u32,
    pub zones: [u32; DIRECT_ZONES],
    pub indirect: u32,
    pub two_indirect: u32,
}

impl Default for InodeSpec {
    fn default() -> Self {
        Self {
            mode: 0,
            links: 1,
            uid: 0,
            gid: 0,
            size: 0,
            zones: [0; DIRECT_ZONES],
            indirect: 0,
            two_indirect: 0,
        }
    }
}

/// Builds an unpartitioned MINIX filesystem image.
///
/// Layout: boot block, superblock at +1024, one inode-bitmap block, one
/// zone-bitmap block, then the inode table. Data zones are handed out
/// by `alloc_zone` starting after the inode table.
#[derive(Debug)]
pub struct ImageBuilder {
    ninodes: u32,
    blocksize: u16,
    log_zone_size: i16,
    image: Vec<u8>,
    next_zone: u32,
}

impl ImageBuilder {
    /// `blocksize` must be at least 1024 so block 1 coincides with the
    /// superblock's fixed byte offset.
    #[must_use]
    pub fn new(ninodes: u32, blocksize: u16, log_zone_size: i16) -> Self {
        assert!(blocksize >= 1024, "blocksize must be >= 1024");
        assert!((0..=15).contains(&log_zone_size));
        let mut builder = Self {
            ninodes,
            blocksize,
            log_zone_size,
            image: Vec::new(),
            next_zone: 0,
        };
        let table_end = builder.inode_table_offset() + u64::from(ninodes) * INODE_SIZE as u64;
        builder.next_zone = u32::try_from(table_end.div_ceil(builder.zone_size()))
            .expect("zone count fits u32");
        builder.ensure_len(usize::try_from(table_end).expect("image length fits usize"));
        builder
    }

    #[must_use]
    pub fn block_size(&self) -> u64 {
        u64::from(self.blocksize)
    }

    #[must_use]
    pub fn zone_size(&self) -> u64 {
        u64::from(self.blocksize) << u32::try_from(self.log_zone_size).expect("validated shift")
    }

    /// Byte offset of the inode table: blocks 0 and 1, then one block
    /// each for the two bitmaps.
    #[must_use]
    pub fn inode_table_offset(&self) -> u64 {
        4 * self.block_size()
    }

    fn ensure_len(&mut self, len: usize) {
        if self.image.len() < len {
            self.image.resize(len, 0);
        }
    }

    /// Hand out the next unused data zone and extend the image over it.
    pub fn alloc_zone(&mut self) -> u32 {
        let zone = self.next_zone;
        self.next_zone += 1;
        let end = (u64::from(zone) + 1) * self.zone_size();
        self.ensure_len(usize::try_from(end).expect("image length fits usize"));
        zone
    }

    /// Write raw bytes at the start of `zone` (at most one zone's worth).
    pub fn write_zone(&mut self, zone: u32, data: &[u8]) {
        let zone_size = usize::try_from(self.zone_size()).expect("zone size fits usize");
        assert!(data.len() <= zone_size, "data exceeds zone size");
        let start = usize::try_from(u64::from(zone) * self.zone_size()).expect("offset fits");
        self.ensure_len(start + zone_size);
        self.image[start..start + data.len()].copy_from_slice(data);
    }

    /// Write an indirect table: little-endian u32 zone pointers.
    pub fn write_zone_table(&mut self, zone: u32, entries: &[u32]) {
        let mut bytes = Vec::with_capacity(entries.len() * 4);
        for entry in entries {
            bytes.extend_from_slice(&entry.to_le_bytes());
        }
        self.write_zone(zone, &bytes);
    }

    /// Write back-to-back 64-byte directory entries into `zone`.
    pub fn write_dir_zone(&mut self, zone: u32, entries: &[(u32, &[u8])]) {
        let mut bytes = Vec::with_capacity(entries.len() * DIRENT_SIZE);
        for (inum, name) in entries {
            bytes.extend_from_slice(&dirent(*inum, name));
        }
        self.write_zone(zone, &bytes);
    }

    /// Serialize `spec` into inode table slot `inum` (1-indexed).
    pub fn set_inode(&mut self, inum: u32, spec: InodeSpec) {
        assert!(inum >= 1 && inum <= self.ninodes, "inode number out of range");
        let offset = self.inode_table_offset() + u64::from(inum - 1) * INODE_SIZE as u64;
        let start = usize::try_from(offset).expect("offset fits usize");
        self.ensure_len(start + INODE_SIZE);

        let raw = &mut self.image[start..start + INODE_SIZE];
        raw[0..2].copy_from_slice(&spec.mode.to_le_bytes());
        raw[2..4].copy_from_slice(&spec.links.to_le_bytes());
        raw[4..6].copy_from_slice(&spec.uid.to_le_bytes());
        raw[6..8].copy_from_slice(&spec.gid.to_le_bytes());
        raw[8..12].copy_from_slice(&spec.size.to_le_bytes());
        // atime/mtime/ctime stay zero.
        for (idx, zone) in spec.zones.iter().enumerate() {
            let base = 24 + idx * 4;
            raw[base..base + 4].copy_from_slice(&zone.to_le_bytes());
        }
        raw[52..56].copy_from_slice(&spec.indirect.to_le_bytes());
        raw[56..60].copy_from_slice(&spec.two_indirect.to_le_bytes());
    }

    fn write_superblock(&mut self) {
        self.ensure_len(1024 + 32);
        let ninodes = self.ninodes;
        let zones = self.next_zone;
        let log_zone_size = self.log_zone_size;
        let blocksize = self.blocksize;

        let sb = &mut self.image[1024..1024 + 32];
        sb[0..4].copy_from_slice(&ninodes.to_le_bytes());
        sb[6..8].copy_from_slice(&1_i16.to_le_bytes()); // i_blocks
        sb[8..10].copy_from_slice(&1_i16.to_le_bytes()); // z_blocks
        sb[10..12].copy_from_slice(&0_u16.to_le_bytes()); // firstdata
        sb[12..14].copy_from_slice(&log_zone_size.to_le_bytes());
        sb[16..20].copy_from_slice(&u32::MAX.to_le_bytes()); // max_file
        sb[20..24].copy_from_slice(&zones.to_le_bytes());
        sb[24..26].copy_from_slice(&MINIX_MAGIC.to_le_bytes());
        sb[28..30].copy_from_slice(&blocksize.to_le_bytes());
        sb[30] = 0; // subversion
    }

    /// Finish the image and return its bytes.
    #[must_use]
    pub fn build(mut self) -> Vec<u8> {
        self.write_superblock();
        self.image
    }

    /// Finish the image as an in-memory byte device.
    #[must_use]
    pub fn into_device(self) -> VecByteDevice {
        VecByteDevice::new(self.build())
    }
}

/// Serialize one 64-byte directory entry.
#[must_use]
pub fn dirent(inum: u32, name: &[u8]) -> [u8; DIRENT_SIZE] {
    assert!(name.len() <= DIRENT_NAME_LEN, "name exceeds 60 bytes");
    let mut raw = [0_u8; DIRENT_SIZE];
    raw[0..4].copy_from_slice(&inum.to_le_bytes());
    raw[4..4 + name.len()].copy_from_slice(name);
    raw
}

// ── Partition wrappers ──────────────────────────────────────────────────────

/// Write a boot sector (signature + selected table entries) into
/// `disk` at `offset`. Entries are `(index, type_byte, lba_first,
/// sectors)` tuples; unmentioned slots stay zero.
pub fn write_boot_sector(disk: &mut [u8], offset: u64, entries: &[(usize, u8, u32, u32)]) {
    let base = usize::try_from(offset).expect("offset fits usize");
    assert!(disk.len() >= base + SECTOR_SIZE as usize, "disk too small");

    disk[base + 510..base + 512].copy_from_slice(&BOOT_SIGNATURE);
    for &(index, type_byte, lba_first, sectors) in entries {
        assert!(index < 4, "partition index out of range");
        let slot = base + PART_TABLE_OFFSET + index * PART_ENTRY_SIZE;
        disk[slot + 4] = type_byte;
        disk[slot + 8..slot + 12].copy_from_slice(&lba_first.to_le_bytes());
        disk[slot + 12..slot + 16].copy_from_slice(&sectors.to_le_bytes());
    }
}

/// A standalone 512-byte boot sector with the given entries.
#[must_use]
pub fn boot_sector(entries: &[(usize, u8, u32, u32)]) -> Vec<u8> {
    let mut sector = vec![0_u8; SECTOR_SIZE as usize];
    write_boot_sector(&mut sector, 0, entries);
    sector
}

/// Place `fs` inside primary partition `index` at sector `lba_first`
/// of a fresh MBR-partitioned disk.
#[must_use]
pub fn wrap_in_partition(fs: &[u8], index: usize, lba_first: u32) -> Vec<u8> {
    let fs_start = usize::try_from(u64::from(lba_first) * SECTOR_SIZE).expect("offset fits");
    let sectors = u32::try_from(fs.len().div_ceil(SECTOR_SIZE as usize)).expect("sector count");
    let mut disk = vec![0_u8; fs_start + fs.len()];
    write_boot_sector(&mut disk, 0, &[(index, mfs_types::MINIX_PART_TYPE, lba_first, sectors)]);
    disk[fs_start..].copy_from_slice(fs);
    disk
}

/// Place `fs` one level deeper: a primary partition at `primary_lba`
/// whose first sector carries a subpartition table entry pointing at
/// the **absolute** sector `sub_lba` where the filesystem lives.
#[must_use]
pub fn wrap_in_subpartition(
    fs: &[u8],
    primary_index: usize,
    primary_lba: u32,
    sub_index: usize,
    sub_lba: u32,
) -> Vec<u8> {
    let primary_start = usize::try_from(u64::from(primary_lba) * SECTOR_SIZE).expect("offset");
    let fs_start = usize::try_from(u64::from(sub_lba) * SECTOR_SIZE).expect("offset");
    let sectors = u32::try_from(fs.len().div_ceil(SECTOR_SIZE as usize)).expect("sector count");

    let len = (fs_start + fs.len()).max(primary_start + SECTOR_SIZE as usize);
    let mut disk = vec![0_u8; len];
    write_boot_sector(
        &mut disk,
        0,
        &[(primary_index, mfs_types::MINIX_PART_TYPE, primary_lba, sectors)],
    );
    write_boot_sector(
        &mut disk,
        u64::from(primary_lba) * SECTOR_SIZE,
        &[(sub_index, mfs_types::MINIX_PART_TYPE, sub_lba, sectors)],
    );
    disk[fs_start..fs_start + fs.len()].copy_from_slice(fs);
    disk
}
