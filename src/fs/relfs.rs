//! Release FUSE Filesystem Implementation
//!
//! Implements the fuser::Filesystem trait over the virtual tree. Inodes are
//! the remote service's own identifiers (root is 1, tag directories use the
//! release id, asset files the asset id), so no inode table is needed:
//! resolving an inode is a scan of the current catalog snapshots.

use std::ffi::OsStr;
use std::sync::Arc;
use std::time::Duration;

use fuser::{
    FileAttr, FileType, Filesystem, ReplyAttr, ReplyData, ReplyDirectory, ReplyEntry, Request,
};
use tokio::runtime::Handle;
use tracing::{debug, warn};

use super::error::FsError;
use super::node::{AssetFile, DirEntry, Root, TagDir, ROOT_INO};
use crate::catalog::{ReleaseCatalog, ReleaseEntry};

/// TTL for file attributes (how long the kernel caches metadata)
const TTL: Duration = Duration::from_secs(1);

/// Release filesystem - mounts one repository's releases as a FUSE volume
pub struct ReleaseFilesystem {
    /// Top-level release catalog; everything else is reachable from it
    releases: Arc<ReleaseCatalog>,
    /// Tokio runtime handle for async operations
    runtime: Handle,
}

impl ReleaseFilesystem {
    /// Create a new filesystem over a release catalog
    pub fn new(releases: Arc<ReleaseCatalog>) -> Self {
        // Get the current tokio runtime handle
        let runtime = Handle::current();

        Self { releases, runtime }
    }

    fn root(&self) -> Root {
        Root::new(Arc::clone(&self.releases))
    }

    /// Find the release entry carrying this inode in the current snapshot
    fn find_release(&self, ino: u64) -> Option<Arc<ReleaseEntry>> {
        let snapshot = self.runtime.block_on(self.releases.cached());
        snapshot.values().find(|entry| entry.id() == ino).cloned()
    }

    /// Find the asset carrying this inode among the cached asset listings
    ///
    /// Only already-listed assets can be resolved; the kernel always lists or
    /// looks up a directory before addressing its children by inode.
    fn find_asset(&self, ino: u64) -> Option<AssetFile> {
        let snapshot = self.runtime.block_on(self.releases.cached());
        for entry in snapshot.values() {
            let assets = self.runtime.block_on(entry.assets().cached());
            if let Some(asset) = assets.iter().find(|asset| asset.id == ino) {
                return Some(AssetFile::new(
                    Arc::clone(entry.assets().context().host()),
                    asset.clone(),
                ));
            }
        }
        None
    }

    /// Attributes for an inode, from cached state only
    fn attr_for_ino(&self, ino: u64) -> Option<FileAttr> {
        if ino == ROOT_INO {
            return Some(self.root().attr());
        }
        if let Some(entry) = self.find_release(ino) {
            return Some(TagDir::new(entry).attr());
        }
        self.find_asset(ino).map(|file| file.attr())
    }
}

impl Filesystem for ReleaseFilesystem {
    /// Get file attributes
    fn getattr(&mut self, _req: &Request<'_>, ino: u64, _fh: Option<u64>, reply: ReplyAttr) {
        debug!(ino = ino, "getattr");

        match self.attr_for_ino(ino) {
            Some(attr) => {
                reply.attr(&TTL, &attr);
            }
            None => {
                warn!(ino = ino, "getattr: inode not found");
                reply.error(libc::ENOENT);
            }
        }
    }

    /// Look up a tag in the root, or an asset in a tag directory
    fn lookup(&mut self, _req: &Request<'_>, parent: u64, name: &OsStr, reply: ReplyEntry) {
        let name = name.to_string_lossy();
        debug!(parent = parent, name = %name, "lookup");

        let attr: Result<FileAttr, FsError> = if parent == ROOT_INO {
            let root = self.root();
            self.runtime
                .block_on(async { root.lookup(&name).await.map(|dir| dir.attr()) })
        } else if let Some(entry) = self.find_release(parent) {
            let dir = TagDir::new(entry);
            self.runtime
                .block_on(async { dir.lookup(&name).await.map(|file| file.attr()) })
        } else {
            reply.error(libc::ENOENT);
            return;
        };

        match attr {
            Ok(attr) => reply.entry(&TTL, &attr, 0),
            Err(FsError::NotFound(_)) => reply.error(libc::ENOENT),
            Err(e) => {
                warn!(parent = parent, name = %name, error = %e, "lookup failed");
                reply.error(e.to_errno());
            }
        }
    }

    /// Read directory contents
    fn readdir(
        &mut self,
        _req: &Request<'_>,
        ino: u64,
        _fh: u64,
        offset: i64,
        mut reply: ReplyDirectory,
    ) {
        debug!(ino = ino, offset = offset, "readdir");

        let listing: Result<Vec<DirEntry>, FsError> = if ino == ROOT_INO {
            let root = self.root();
            self.runtime.block_on(root.entries())
        } else if let Some(entry) = self.find_release(ino) {
            self.runtime.block_on(TagDir::new(entry).entries())
        } else {
            reply.error(libc::ENOENT);
            return;
        };

        let children = match listing {
            Ok(children) => children,
            Err(e) => {
                warn!(ino = ino, error = %e, "readdir failed");
                reply.error(e.to_errno());
                return;
            }
        };

        // Tag directories hang directly off the root, so ".." is always 1
        let mut entries = vec![
            DirEntry {
                ino,
                name: ".".to_string(),
                kind: FileType::Directory,
            },
            DirEntry {
                ino: ROOT_INO,
                name: "..".to_string(),
                kind: FileType::Directory,
            },
        ];
        entries.extend(children);

        // Skip entries before offset and add the rest
        for (i, entry) in entries.iter().enumerate().skip(offset as usize) {
            // reply.add returns true if buffer is full
            let buffer_full = reply.add(
                entry.ino,
                (i + 1) as i64, // offset for next entry
                entry.kind,
                &entry.name,
            );

            if buffer_full {
                break;
            }
        }

        reply.ok();
    }

    /// Open a file (handles carry no state; reads re-resolve the inode)
    fn open(&mut self, _req: &Request<'_>, ino: u64, _flags: i32, reply: fuser::ReplyOpen) {
        debug!(ino = ino, "open");

        if self.find_asset(ino).is_some() {
            reply.opened(0, 0);
        } else {
            reply.error(libc::ENOENT);
        }
    }

    /// Read file content
    ///
    /// Downloads the full asset and serves the requested window; content is
    /// never cached, so every call reaches the remote host.
    fn read(
        &mut self,
        _req: &Request<'_>,
        ino: u64,
        _fh: u64,
        offset: i64,
        size: u32,
        _flags: i32,
        _lock_owner: Option<u64>,
        reply: ReplyData,
    ) {
        debug!(ino = ino, offset = offset, size = size, "read");

        let file = match self.find_asset(ino) {
            Some(file) => file,
            None => {
                reply.error(libc::ENOENT);
                return;
            }
        };

        match self.runtime.block_on(file.read_all()) {
            Ok(data) => {
                let start = (offset.max(0) as usize).min(data.len());
                let end = (start + size as usize).min(data.len());
                reply.data(&data[start..end]);
            }
            Err(e) => {
                warn!(ino = ino, error = %e, "read failed");
                reply.error(e.to_errno());
            }
        }
    }

    /// Open a directory
    fn opendir(&mut self, _req: &Request<'_>, ino: u64, _flags: i32, reply: fuser::ReplyOpen) {
        debug!(ino = ino, "opendir");

        if ino == ROOT_INO || self.find_release(ino).is_some() {
            // Return a dummy file handle (we don't track state per-open)
            reply.opened(0, 0);
        } else {
            reply.error(libc::ENOENT);
        }
    }

    /// Release (close) a directory
    fn releasedir(
        &mut self,
        _req: &Request<'_>,
        ino: u64,
        _fh: u64,
        _flags: i32,
        reply: fuser::ReplyEmpty,
    ) {
        debug!(ino = ino, "releasedir");
        reply.ok();
    }
}
