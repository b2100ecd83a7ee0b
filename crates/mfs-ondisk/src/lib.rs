#![forbid(unsafe_code)]
//! On-disk format parsing for MINIX V3 structures.
//!
//! Pure parsing crate — no I/O, no side effects. Parses byte slices into
//! typed Rust structures representing the MBR partition table, the MINIX
//! superblock, inodes, and directory entries. All multi-byte fields are
//! little-endian and all records are packed; decoding goes through the
//! byte-level readers in `mfs-types`, never a reinterpret cast.

use mfs_types::{
    BOOT_SIGNATURE, DIRECT_ZONES, DIRENT_NAME_LEN, DIRENT_SIZE, INODE_SIZE, MINIX_MAGIC,
    MINIX_PART_TYPE, PART_ENTRY_SIZE, PART_TABLE_ENTRIES, PART_TABLE_OFFSET, ParseError,
    S_IFDIR, S_IFMT, S_IFREG, SECTOR_SIZE, SUPERBLOCK_SIZE, ByteOffset, InodeNumber,
    ensure_slice, read_fixed, read_le_i16, read_le_i32, read_le_u16, read_le_u32, read_u8,
};
use serde::{Deserialize, Serialize};

// ── Partition table ─────────────────────────────────────────────────────────

/// One 16-byte entry of an MBR-style partition table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PartitionEntry {
    pub bootind: u8,
    pub start_chs: [u8; 3],
    pub part_type: u8,
    pub end_chs: [u8; 3],
    /// First sector as an absolute LBA from the start of the disk.
    pub lba_first: u32,
    /// Number of sectors.
    pub sectors: u32,
}

impl PartitionEntry {
    pub fn parse_from_bytes(bytes: &[u8]) -> Result<Self, ParseError> {
        if bytes.len() < PART_ENTRY_SIZE {
            return Err(ParseError::InsufficientData {
                needed: PART_ENTRY_SIZE,
                offset: 0,
                actual: bytes.len(),
            });
        }

        Ok(Self {
            bootind: read_u8(bytes, 0)?,
            start_chs: read_fixed::<3>(bytes, 1)?,
            part_type: read_u8(bytes, 4)?,
            end_chs: read_fixed::<3>(bytes, 5)?,
            lba_first: read_le_u32(bytes, 8)?,
            sectors: read_le_u32(bytes, 12)?,
        })
    }

    /// Whether the type byte marks a MINIX partition.
    #[must_use]
    pub fn is_minix(&self) -> bool {
        self.part_type == MINIX_PART_TYPE
    }

    /// Byte offset of the partition's first sector from the start of the
    /// disk. Returns `None` on overflow.
    #[must_use]
    pub fn byte_offset(&self) -> Option<ByteOffset> {
        u64::from(self.lba_first)
            .checked_mul(SECTOR_SIZE)
            .map(ByteOffset)
    }
}

/// A decoded 512-byte boot sector: signature plus four partition entries.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PartitionTable {
    pub entries: [PartitionEntry; PART_TABLE_ENTRIES],
}

impl PartitionTable {
    /// Parse a boot sector, validating the `0x55 0xAA` signature first.
    pub fn parse_boot_sector(sector: &[u8]) -> Result<Self, ParseError> {
        const SECTOR_BYTES: usize = SECTOR_SIZE as usize;
        if sector.len() < SECTOR_BYTES {
            return Err(ParseError::InsufficientData {
                needed: SECTOR_BYTES,
                offset: 0,
                actual: sector.len(),
            });
        }

        if sector[510..512] != BOOT_SIGNATURE {
            return Err(ParseError::InvalidField {
                field: "boot_signature",
                reason: "expected 0x55 0xAA at offsets 510/511",
            });
        }

        let mut entries = [PartitionEntry {
            bootind: 0,
            start_chs: [0; 3],
            part_type: 0,
            end_chs: [0; 3],
            lba_first: 0,
            sectors: 0,
        }; PART_TABLE_ENTRIES];

        for (idx, slot) in entries.iter_mut().enumerate() {
            let base = PART_TABLE_OFFSET + idx * PART_ENTRY_SIZE;
            *slot = PartitionEntry::parse_from_bytes(ensure_slice(
                sector,
                base,
                PART_ENTRY_SIZE,
            )?)?;
        }

        Ok(Self { entries })
    }
}

// ── Superblock ──────────────────────────────────────────────────────────────

/// The MINIX V3 superblock, located 1024 bytes into the filesystem.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Superblock {
    pub ninodes: u32,
    /// Blocks occupied by the inode bitmap.
    pub i_blocks: i16,
    /// Blocks occupied by the zone bitmap.
    pub z_blocks: i16,
    pub firstdata: u16,
    /// Power-of-two shift from block size to zone size.
    pub log_zone_size: i16,
    pub max_file: u32,
    pub zones: u32,
    pub magic: u16,
    pub blocksize: u16,
    pub subversion: u8,
}

impl Superblock {
    /// Parse a superblock from its 32-byte on-disk region.
    ///
    /// The magic is validated before any other field is trusted; the
    /// error carries the observed value for the diagnostic.
    pub fn parse_superblock_region(region: &[u8]) -> Result<Self, ParseError> {
        if region.len() < SUPERBLOCK_SIZE {
            return Err(ParseError::InsufficientData {
                needed: SUPERBLOCK_SIZE,
                offset: 0,
                actual: region.len(),
            });
        }

        let magic = read_le_u16(region, 24)?;
        if magic != MINIX_MAGIC {
            return Err(ParseError::InvalidMagic {
                expected: MINIX_MAGIC,
                actual: magic,
            });
        }

        Ok(Self {
            ninodes: read_le_u32(region, 0)?,
            i_blocks: read_le_i16(region, 6)?,
            z_blocks: read_le_i16(region, 8)?,
            firstdata: read_le_u16(region, 10)?,
            log_zone_size: read_le_i16(region, 12)?,
            max_file: read_le_u32(region, 16)?,
            zones: read_le_u32(region, 20)?,
            magic,
            blocksize: read_le_u16(region, 28)?,
            subversion: read_u8(region, 30)?,
        })
    }

    /// Validate geometry fields before deriving sizes (bounded trust in
    /// on-disk values).
    pub fn validate_geometry(&self) -> Result<(), ParseError> {
        if self.blocksize < 1024 || !self.blocksize.is_power_of_two() {
            return Err(ParseError::InvalidField {
                field: "blocksize",
                reason: "must be a power of two >= 1024",
            });
        }
        if !(0..=15).contains(&self.log_zone_size) {
            return Err(ParseError::InvalidField {
                field: "log_zone_size",
                reason: "must be in 0..=15",
            });
        }
        if self.i_blocks < 0 {
            return Err(ParseError::InvalidField {
                field: "i_blocks",
                reason: "cannot be negative",
            });
        }
        if self.z_blocks < 0 {
            return Err(ParseError::InvalidField {
                field: "z_blocks",
                reason: "cannot be negative",
            });
        }
        Ok(())
    }

    /// Block size in bytes.
    #[must_use]
    pub fn block_size(&self) -> u32 {
        u32::from(self.blocksize)
    }

    /// Zone size in bytes: `blocksize << log_zone_size`.
    ///
    /// Callers must have validated geometry; the shift is bounded by
    /// `validate_geometry`, so this cannot overflow u32 (16-bit block
    /// size shifted by at most 15).
    #[must_use]
    pub fn zone_size(&self) -> u32 {
        u32::from(self.blocksize) << u32::try_from(self.log_zone_size).unwrap_or(0)
    }

    /// First block of the inode table: boot block, superblock, then the
    /// two bitmaps (blocks, not zones).
    #[must_use]
    pub fn inode_table_block(&self) -> u64 {
        2 + u64::try_from(self.i_blocks).unwrap_or(0) + u64::try_from(self.z_blocks).unwrap_or(0)
    }
}

// ── Inode ───────────────────────────────────────────────────────────────────

/// A decoded 64-byte MINIX V3 inode.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Inode {
    pub mode: u16,
    pub links: u16,
    pub uid: u16,
    pub gid: u16,
    pub size: u32,
    pub atime: i32,
    pub mtime: i32,
    pub ctime: i32,
    /// Direct zone pointers; 0 denotes a hole.
    pub zone: [u32; DIRECT_ZONES],
    /// Zone number of the single-indirect table, or 0.
    pub indirect: u32,
    /// Zone number of the double-indirect table, or 0.
    pub two_indirect: u32,
}

impl Inode {
    pub fn parse_from_bytes(bytes: &[u8]) -> Result<Self, ParseError> {
        if bytes.len() < INODE_SIZE {
            return Err(ParseError::InsufficientData {
                needed: INODE_SIZE,
                offset: 0,
                actual: bytes.len(),
            });
        }

        let mut zone = [0_u32; DIRECT_ZONES];
        for (idx, slot) in zone.iter_mut().enumerate() {
            *slot = read_le_u32(bytes, 24 + idx * 4)?;
        }

        Ok(Self {
            mode: read_le_u16(bytes, 0)?,
            links: read_le_u16(bytes, 2)?,
            uid: read_le_u16(bytes, 4)?,
            gid: read_le_u16(bytes, 6)?,
            size: read_le_u32(bytes, 8)?,
            atime: read_le_i32(bytes, 12)?,
            mtime: read_le_i32(bytes, 16)?,
            ctime: read_le_i32(bytes, 20)?,
            zone,
            indirect: read_le_u32(bytes, 52)?,
            two_indirect: read_le_u32(bytes, 56)?,
        })
    }

    #[must_use]
    pub fn is_dir(&self) -> bool {
        self.mode & S_IFMT == S_IFDIR
    }

    #[must_use]
    pub fn is_regular(&self) -> bool {
        self.mode & S_IFMT == S_IFREG
    }

    /// Render the ten-character permission string, e.g. `drwxr-xr-x`.
    ///
    /// Only the directory bit and the nine rwx bits are represented; no
    /// setuid/setgid/sticky distinction.
    #[must_use]
    pub fn perm_string(&self) -> String {
        let mode = self.mode;
        let mut out = String::with_capacity(10);
        out.push(if self.is_dir() { 'd' } else { '-' });
        for shift in [6_u16, 3, 0] {
            out.push(if mode >> shift & 0o4 != 0 { 'r' } else { '-' });
            out.push(if mode >> shift & 0o2 != 0 { 'w' } else { '-' });
            out.push(if mode >> shift & 0o1 != 0 { 'x' } else { '-' });
        }
        out
    }
}

// ── Directory entries ───────────────────────────────────────────────────────

/// A decoded 64-byte directory entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DirEntry {
    pub inode: u32,
    /// Raw 60-byte name field; NUL-terminated only when shorter than 60.
    pub name_raw: Vec<u8>,
}

impl DirEntry {
    pub fn parse_from_bytes(bytes: &[u8]) -> Result<Self, ParseError> {
        if bytes.len() < DIRENT_SIZE {
            return Err(ParseError::InsufficientData {
                needed: DIRENT_SIZE,
                offset: 0,
                actual: bytes.len(),
            });
        }

        Ok(Self {
            inode: read_le_u32(bytes, 0)?,
            name_raw: read_fixed::<DIRENT_NAME_LEN>(bytes, 4)?.to_vec(),
        })
    }

    /// Whether this slot is free (inode number 0).
    #[must_use]
    pub fn is_free(&self) -> bool {
        self.inode == 0
    }

    #[must_use]
    pub fn inode_number(&self) -> InodeNumber {
        InodeNumber(self.inode)
    }

    /// The name bytes, bounded by the first interior NUL or the full
    /// 60-byte field when no terminator is present.
    #[must_use]
    pub fn name_bytes(&self) -> &[u8] {
        let end = self
            .name_raw
            .iter()
            .position(|b| *b == 0)
            .unwrap_or(DIRENT_NAME_LEN);
        &self.name_raw[..end]
    }

    /// The name as a UTF-8 string (lossy).
    #[must_use]
    pub fn name_str(&self) -> String {
        String::from_utf8_lossy(self.name_bytes()).into_owned()
    }

    /// Compare against a candidate name without overrunning the field.
    #[must_use]
    pub fn matches_name(&self, candidate: &[u8]) -> bool {
        self.name_bytes() == candidate
    }
}

/// Decode a directory data region as back-to-back 64-byte entries.
///
/// Trailing bytes beyond a whole entry are ignored. Free slots are
/// included so callers can account for them against the directory size.
pub fn parse_dir_region(region: &[u8]) -> Result<Vec<DirEntry>, ParseError> {
    let count = region.len() / DIRENT_SIZE;
    let mut entries = Vec::with_capacity(count);
    for idx in 0..count {
        let base = idx * DIRENT_SIZE;
        entries.push(DirEntry::parse_from_bytes(&region[base..base + DIRENT_SIZE])?);
    }
    Ok(entries)
}
