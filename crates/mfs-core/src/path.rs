//! Path canonicalization and resolution.
//!
//! Canonical form: a leading `/`, single slashes between components, no
//! trailing slash except for the root itself. No `.` or `..` handling.
//! Resolution walks the directory tree from the root inode (1).

use crate::MinixFs;
use mfs_block::ByteDevice;
use mfs_error::{MfsError, Result};
use mfs_ondisk::Inode;
use mfs_types::InodeNumber;
use tracing::debug;

/// Canonicalize a slash-separated path.
///
/// An empty path becomes `/`; a missing leading slash is added; runs of
/// consecutive slashes collapse to one; a trailing slash is stripped
/// unless the result would be empty. Idempotent.
#[must_use]
pub fn canonicalize_path(path: &str) -> String {
    let mut out = String::with_capacity(path.len() + 1);
    out.push('/');
    for component in path.split('/').filter(|c| !c.is_empty()) {
        if out.len() > 1 {
            out.push('/');
        }
        out.push_str(component);
    }
    out
}

impl<D: ByteDevice> MinixFs<D> {
    /// Resolve `path` from the root directory to its terminal inode.
    ///
    /// Every intermediate component must be a directory; a missing
    /// component fails with the file-not-found diagnostic.
    pub fn resolve_path(&self, path: &str) -> Result<(InodeNumber, Inode)> {
        let canon = canonicalize_path(path);
        let mut inum = InodeNumber::ROOT;
        let mut inode = self.inode(inum)?;

        for component in canon.split('/').filter(|c| !c.is_empty()) {
            if !inode.is_dir() {
                return Err(MfsError::NotADirectory);
            }
            let child = self
                .lookup(&inode, component.as_bytes())?
                .ok_or(MfsError::FileNotFound)?;
            debug!(
                target: "mfs::core",
                event = "path_step",
                component,
                inum = child.0,
            );
            inode = self.inode(child)?;
            inum = child;
        }

        Ok((inum, inode))
    }
}
