#![forbid(unsafe_code)]
//! minls: list a directory (or a single file's metadata entry) from a
//! MINIX V3 filesystem image.

use anyhow::{Context, Result};
use clap::Parser;
use mfs_block::FileByteDevice;
use mfs_cli::{
    CommonArgs, display_name, format_entry_line, print_inode_summary, print_superblock_summary,
    print_usage_options,
};
use mfs_core::{MinixFs, canonicalize_path};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "minls", disable_help_flag = true)]
struct Args {
    #[command(flatten)]
    common: CommonArgs,

    /// Filesystem image to read.
    imagefile: Option<PathBuf>,

    /// Path inside the filesystem (default: /).
    path: Option<String>,
}

fn usage() {
    eprintln!("usage: minls [ -v ] [ -p num [ -s num ] ] imagefile [ path ]");
    print_usage_options();
}

fn main() {
    if let Err(error) = run() {
        eprintln!("error: {error:#}");
        std::process::exit(1);
    }
}

fn run() -> Result<()> {
    let args = Args::parse();
    if args.common.help {
        usage();
        std::process::exit(1);
    }
    let Some(imagefile) = args.imagefile else {
        usage();
        std::process::exit(1);
    };

    let path = args.path.as_deref().unwrap_or("/");

    let dev = FileByteDevice::open(&imagefile)
        .with_context(|| format!("failed to open image: {}", imagefile.display()))?;
    let fs = MinixFs::open(dev, args.common.partition_select())?;
    if args.common.verbose {
        print_superblock_summary(fs.superblock());
    }

    let (_, inode) = fs.resolve_path(path)?;
    if args.common.verbose {
        print_inode_summary(&inode);
    }

    let canon = canonicalize_path(path);
    if inode.is_dir() {
        println!("{canon}:");
        fs.for_each_entry(&inode, |entry| {
            let child = fs.inode(entry.inode_number())?;
            println!("{}", format_entry_line(&child, &entry.name_str()));
            Ok(())
        })?;
    } else {
        println!("{}", format_entry_line(&inode, display_name(&canon)));
    }

    Ok(())
}
