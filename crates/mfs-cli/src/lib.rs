#![forbid(unsafe_code)]
//! Shared plumbing for the `minls` and `minget` front ends: the common
//! flag set, partition selection, verbose summaries, and listing-line
//! formatting.

use clap::Args;
use mfs_core::PartitionSelect;
use mfs_ondisk::{Inode, Superblock};

/// Flags shared by both front ends.
///
/// Help is hand-rolled so `-h` can print the traditional usage block
/// and exit non-zero.
#[derive(Debug, Args)]
pub struct CommonArgs {
    /// Increase verbosity.
    #[arg(short = 'v')]
    pub verbose: bool,

    /// Select the primary partition holding the filesystem.
    #[arg(short = 'p', value_name = "part")]
    pub partition: Option<u32>,

    /// Select a subpartition (requires -p).
    #[arg(short = 's', value_name = "subpart", requires = "partition")]
    pub subpartition: Option<u32>,

    /// Print usage information and exit.
    #[arg(short = 'h')]
    pub help: bool,
}

impl CommonArgs {
    /// Map the flag pair to a partition selection.
    #[must_use]
    pub fn partition_select(&self) -> PartitionSelect {
        match (self.partition, self.subpartition) {
            (None, _) => PartitionSelect::Unpartitioned,
            (Some(index), None) => PartitionSelect::Primary { index },
            (Some(primary), Some(sub)) => PartitionSelect::Subpartition { primary, sub },
        }
    }
}

/// Print the common option lines of the usage block to stderr.
pub fn print_usage_options() {
    eprintln!();
    eprintln!("Options:");
    eprintln!("-p part --- select partition for filesystem (default: none)");
    eprintln!("-s sub --- select subpartition for filesystem (default: none)");
    eprintln!("-h help --- print usage information and exit");
    eprintln!("-v verbose --- increase verbosity level");
}

/// Write the superblock field summary to the diagnostic stream.
pub fn print_superblock_summary(sb: &Superblock) {
    eprintln!("Superblock information:");
    eprintln!("  ninodes       = {}", sb.ninodes);
    eprintln!("  i_blocks      = {}", sb.i_blocks);
    eprintln!("  z_blocks      = {}", sb.z_blocks);
    eprintln!("  firstdata     = {}", sb.firstdata);
    eprintln!("  log_zone_size = {}", sb.log_zone_size);
    eprintln!("  max_file      = {}", sb.max_file);
    eprintln!("  zones         = {}", sb.zones);
    eprintln!("  magic         = 0x{:04x}", sb.magic);
    eprintln!("  blocksize     = {}", sb.blocksize);
    eprintln!("  subversion    = {}", sb.subversion);
}

/// Write the one-line inode summary to the diagnostic stream.
pub fn print_inode_summary(inode: &Inode) {
    eprintln!(
        "mode=0{:o} size={} links={} uid={} gid={}",
        inode.mode, inode.size, inode.links, inode.uid, inode.gid
    );
}

/// One listing row: permission string, size right-aligned to nine
/// columns, then the name.
#[must_use]
pub fn format_entry_line(inode: &Inode, name: &str) -> String {
    format!("{} {:>9} {}", inode.perm_string(), inode.size, name)
}

/// The name a non-directory target is listed under: the canonical path
/// without its leading slash (the root itself stays `/`).
#[must_use]
pub fn display_name(canon: &str) -> &str {
    match canon.strip_prefix('/') {
        Some(rest) if !rest.is_empty() => rest,
        _ => canon,
    }
}
