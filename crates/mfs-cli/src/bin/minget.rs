#![forbid(unsafe_code)]
//! minget: copy a regular file out of a MINIX V3 filesystem image to a
//! destination file or standard output.

use anyhow::{Context, Result};
use clap::Parser;
use mfs_block::FileByteDevice;
use mfs_cli::{CommonArgs, print_inode_summary, print_superblock_summary, print_usage_options};
use mfs_core::MinixFs;
use mfs_error::MfsError;
use std::fs::File;
use std::io::{self, BufWriter, Write};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "minget", disable_help_flag = true)]
struct Args {
    #[command(flatten)]
    common: CommonArgs,

    /// Filesystem image to read.
    imagefile: Option<PathBuf>,

    /// Source path inside the filesystem.
    srcpath: Option<String>,

    /// Destination file (default: standard output).
    dstpath: Option<PathBuf>,
}

fn usage() {
    eprintln!("usage: minget [ -v ] [ -p num [ -s num ] ] imagefile srcpath [ dstpath ]");
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
    let (Some(imagefile), Some(srcpath)) = (args.imagefile, args.srcpath) else {
        usage();
        std::process::exit(1);
    };

    let dev = FileByteDevice::open(&imagefile)
        .with_context(|| format!("failed to open image: {}", imagefile.display()))?;
    let fs = MinixFs::open(dev, args.common.partition_select())?;
    if args.common.verbose {
        print_superblock_summary(fs.superblock());
    }

    let (_, inode) = fs.resolve_path(&srcpath)?;
    if args.common.verbose {
        print_inode_summary(&inode);
    }

    if !inode.is_regular() {
        return Err(MfsError::NotARegularFile { path: srcpath }.into());
    }

    match args.dstpath {
        Some(ref dstpath) => {
            let file = File::create(dstpath)
                .with_context(|| format!("failed to create {}", dstpath.display()))?;
            let mut out = BufWriter::new(file);
            fs.copy_file_to(&inode, &mut out)?;
            out.flush()?;
        }
        None => {
            let stdout = io::stdout();
            let mut out = stdout.lock();
            fs.copy_file_to(&inode, &mut out)?;
            out.flush()?;
        }
    }

    Ok(())
}
