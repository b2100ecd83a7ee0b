#![forbid(unsafe_code)]
//! End-to-end scenarios against synthetic images: partition chains,
//! root listings, sparse extraction, and resolution failures.

use mfs_block::VecByteDevice;
use mfs_core::{MinixFs, PartitionSelect, canonicalize_path};
use mfs_error::MfsError;
use mfs_harness::{ImageBuilder, InodeSpec, wrap_in_partition, wrap_in_subpartition};
use mfs_types::{ByteOffset, DIRENT_NAME_LEN, DIRENT_SIZE, InodeNumber, S_IFDIR, S_IFREG};

/// An unpartitioned image whose root holds `.`, `..`, and a 12-byte
/// regular file `hello` (mode 0644).
fn hello_image() -> ImageBuilder {
    let mut img = ImageBuilder::new(16, 1024, 0);
    let root_zone = img.alloc_zone();
    let hello_zone = img.alloc_zone();
    img.write_dir_zone(root_zone, &[(1, b"."), (1, b".."), (2, b"hello")]);
    let mut data = vec![0_u8; 1024];
    data[..12].copy_from_slice(b"hello world\n");
    img.write_zone(hello_zone, &data);
    img.set_inode(
        1,
        InodeSpec {
            mode: S_IFDIR | 0o755,
            links: 2,
            size: 3 * DIRENT_SIZE as u32,
            zones: [root_zone, 0, 0, 0, 0, 0, 0],
            ..InodeSpec::default()
        },
    );
    img.set_inode(
        2,
        InodeSpec {
            mode: S_IFREG | 0o644,
            size: 12,
            zones: [hello_zone, 0, 0, 0, 0, 0, 0],
            ..InodeSpec::default()
        },
    );
    img
}

#[test]
fn root_listing_of_unpartitioned_image() {
    let fs = MinixFs::open(hello_image().into_device(), PartitionSelect::Unpartitioned)
        .expect("open");

    let (inum, root) = fs.resolve_path("/").expect("resolve root");
    assert_eq!(inum, InodeNumber::ROOT);

    let mut rows = Vec::new();
    fs.for_each_entry(&root, |entry| {
        let child = fs.inode(entry.inode_number())?;
        rows.push((child.perm_string(), child.size, entry.name_str()));
        Ok(())
    })
    .expect("list");

    assert_eq!(rows.len(), 3);
    assert_eq!(rows[0], ("drwxr-xr-x".to_owned(), 192, ".".to_owned()));
    assert_eq!(rows[1], ("drwxr-xr-x".to_owned(), 192, "..".to_owned()));
    assert_eq!(rows[2], ("-rw-r--r--".to_owned(), 12, "hello".to_owned()));
}

#[test]
fn primary_partition_superblock_at_lba_63() {
    let disk = wrap_in_partition(&hello_image().build(), 0, 63);
    let fs = MinixFs::open(
        VecByteDevice::new(disk),
        PartitionSelect::Primary { index: 0 },
    )
    .expect("open");

    // The superblock was found at 63*512 + 1024.
    assert_eq!(fs.fs_offset(), ByteOffset(63 * 512));
    let (_, inode) = fs.resolve_path("/hello").expect("resolve");
    assert!(inode.is_regular());

    let mut out = Vec::new();
    fs.copy_file_to(&inode, &mut out).expect("extract");
    assert_eq!(out, b"hello world\n");
}

#[test]
fn nested_subpartition_offset_is_absolute() {
    // The subpartition's lba_first is absolute from the start of the
    // disk; the filesystem offset is sub_lba * 512 regardless of the
    // primary's own offset.
    let disk = wrap_in_subpartition(&hello_image().build(), 0, 63, 2, 200);
    let fs = MinixFs::open(
        VecByteDevice::new(disk),
        PartitionSelect::Subpartition {
            primary: 0,
            sub: 2,
        },
    )
    .expect("open");

    assert_eq!(fs.fs_offset(), ByteOffset(200 * 512));
    let (_, inode) = fs.resolve_path("/hello").expect("resolve");
    assert_eq!(inode.size, 12);
}

#[test]
fn sparse_extraction_zone_one_hole() {
    // size = zonesize + 5 with zone[1] == 0: the first zone's bytes
    // followed by 5 zero bytes, capped at the inode size.
    let mut img = ImageBuilder::new(16, 1024, 0);
    let z = img.alloc_zone();
    img.write_zone(z, &vec![0x5A_u8; 1024]);
    img.set_inode(
        1,
        InodeSpec {
            mode: S_IFDIR | 0o755,
            size: DIRENT_SIZE as u32,
            ..InodeSpec::default()
        },
    );
    img.set_inode(
        3,
        InodeSpec {
            mode: S_IFREG | 0o644,
            size: 1024 + 5,
            zones: [z, 0, 0, 0, 0, 0, 0],
            ..InodeSpec::default()
        },
    );
    let fs = MinixFs::open(img.into_device(), PartitionSelect::Unpartitioned).expect("open");

    let inode = fs.inode(InodeNumber(3)).expect("inode");
    let mut out = Vec::new();
    let written = fs.copy_file_to(&inode, &mut out).expect("extract");
    assert_eq!(written, 1024 + 5);
    assert!(out[..1024].iter().all(|b| *b == 0x5A));
    assert_eq!(&out[1024..], &[0, 0, 0, 0, 0]);
}

#[test]
fn listing_survives_leading_hole_zone() {
    // /dir's first direct zone is a hole; the second holds entries.
    let mut img = ImageBuilder::new(16, 1024, 0);
    let root_zone = img.alloc_zone();
    let dir_zone = img.alloc_zone();
    img.write_dir_zone(root_zone, &[(1, b"."), (1, b".."), (2, b"dir")]);
    img.write_dir_zone(dir_zone, &[(2, b"."), (1, b".."), (3, b"entry")]);
    img.set_inode(
        1,
        InodeSpec {
            mode: S_IFDIR | 0o755,
            size: 3 * DIRENT_SIZE as u32,
            zones: [root_zone, 0, 0, 0, 0, 0, 0],
            ..InodeSpec::default()
        },
    );
    img.set_inode(
        2,
        InodeSpec {
            mode: S_IFDIR | 0o755,
            size: 1024 + 3 * DIRENT_SIZE as u32,
            zones: [0, dir_zone, 0, 0, 0, 0, 0],
            ..InodeSpec::default()
        },
    );
    img.set_inode(
        3,
        InodeSpec {
            mode: S_IFREG | 0o644,
            size: 1,
            ..InodeSpec::default()
        },
    );
    let fs = MinixFs::open(img.into_device(), PartitionSelect::Unpartitioned).expect("open");

    let (_, dir) = fs.resolve_path("/dir").expect("resolve");
    let mut names = Vec::new();
    fs.for_each_entry(&dir, |entry| {
        names.push(entry.name_str());
        Ok(())
    })
    .expect("list");
    assert_eq!(names, vec![".", "..", "entry"]);
}

#[test]
fn missing_root_entry_reports_file_not_found() {
    let fs = MinixFs::open(hello_image().into_device(), PartitionSelect::Unpartitioned)
        .expect("open");
    let err = fs.resolve_path("/nope").unwrap_err();
    assert_eq!(err.to_string(), "File not found.");
}

#[test]
fn inode_number_bounds() {
    let fs = MinixFs::open(hello_image().into_device(), PartitionSelect::Unpartitioned)
        .expect("open");
    let ninodes = fs.superblock().ninodes;

    assert!(matches!(
        fs.inode(InodeNumber(0)).unwrap_err(),
        MfsError::InvalidInodeNumber { inum: 0, .. }
    ));
    assert!(fs.inode(InodeNumber(ninodes)).is_ok());
    assert!(matches!(
        fs.inode(InodeNumber(ninodes + 1)).unwrap_err(),
        MfsError::InvalidInodeNumber { .. }
    ));
}

#[test]
fn sixty_byte_name_without_terminator_resolves() {
    let long_name = [b'n'; DIRENT_NAME_LEN];
    let mut img = ImageBuilder::new(16, 1024, 0);
    let root_zone = img.alloc_zone();
    img.write_dir_zone(root_zone, &[(1, b"."), (1, b".."), (4, &long_name)]);
    img.set_inode(
        1,
        InodeSpec {
            mode: S_IFDIR | 0o755,
            size: 3 * DIRENT_SIZE as u32,
            zones: [root_zone, 0, 0, 0, 0, 0, 0],
            ..InodeSpec::default()
        },
    );
    img.set_inode(
        4,
        InodeSpec {
            mode: S_IFREG | 0o644,
            size: 9,
            ..InodeSpec::default()
        },
    );
    let fs = MinixFs::open(img.into_device(), PartitionSelect::Unpartitioned).expect("open");

    let full = String::from_utf8(long_name.to_vec()).expect("utf8");
    let (inum, inode) = fs.resolve_path(&full).expect("resolve");
    assert_eq!(inum, InodeNumber(4));
    assert!(inode.is_regular());

    // A 59-byte prefix must not match the 60-byte name.
    let prefix = &full[..DIRENT_NAME_LEN - 1];
    assert!(matches!(
        fs.resolve_path(prefix).unwrap_err(),
        MfsError::FileNotFound
    ));
}

#[test]
fn directory_byte_accounting() {
    // Entries visited (live + free) account for the directory's size
    // rounded down to whole 64-byte entries.
    let mut img = ImageBuilder::new(16, 1024, 0);
    let z = img.alloc_zone();
    img.write_dir_zone(
        z,
        &[(1, b"."), (1, b".."), (0, b"gone"), (2, b"kept"), (0, b"gone2")],
    );
    let size = 5 * DIRENT_SIZE as u32 + 17; // trailing partial entry
    img.set_inode(
        1,
        InodeSpec {
            mode: S_IFDIR | 0o755,
            size,
            zones: [z, 0, 0, 0, 0, 0, 0],
            ..InodeSpec::default()
        },
    );
    img.set_inode(
        2,
        InodeSpec {
            mode: S_IFREG | 0o644,
            size: 0,
            ..InodeSpec::default()
        },
    );
    let fs = MinixFs::open(img.into_device(), PartitionSelect::Unpartitioned).expect("open");
    let root = fs.inode(InodeNumber(1)).expect("root");

    let mut live = 0_u64;
    fs.for_each_entry(&root, |_| {
        live += 1;
        Ok(())
    })
    .expect("list");
    assert_eq!(live, 3);

    // 5 whole entries fit in `size`; 3 live + 2 free.
    assert_eq!(u64::from(size) / DIRENT_SIZE as u64, 5);
}

#[test]
fn canonicalization_matches_listing_header() {
    assert_eq!(canonicalize_path("dir//sub/"), "/dir/sub");
    assert_eq!(canonicalize_path("/"), "/");
}
