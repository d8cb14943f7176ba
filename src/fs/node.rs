//! Virtual tree nodes
//!
//! Three node kinds translate filesystem calls into catalog reads: the root
//! directory lists tags, a tag directory lists one release's assets, an asset
//! file streams its content from the remote host. Nodes are cheap views
//! derived fresh for every call; all caching lives in the catalogs.

use std::sync::Arc;
use std::time::SystemTime;

use fuser::{FileAttr, FileType};

use super::error::FsError;
use crate::catalog::{ReleaseCatalog, ReleaseEntry};
use crate::github::{AssetInfo, ReleaseHost, ReleaseInfo};

/// Root inode number (always 1 per FUSE convention)
pub const ROOT_INO: u64 = 1;

/// Directory entry for readdir results
#[derive(Debug, Clone)]
pub struct DirEntry {
    /// Inode number
    pub ino: u64,
    /// Entry name (tag or asset file name)
    pub name: String,
    /// Directory for tags, regular file for assets
    pub kind: FileType,
}

/// Root of the mount: one directory per release tag
pub struct Root {
    releases: Arc<ReleaseCatalog>,
}

impl Root {
    pub fn new(releases: Arc<ReleaseCatalog>) -> Self {
        Self { releases }
    }

    pub fn attr(&self) -> FileAttr {
        directory_attr(ROOT_INO, SystemTime::now())
    }

    pub async fn entries(&self) -> Result<Vec<DirEntry>, FsError> {
        let releases = self.releases.get().await?;
        Ok(releases
            .values()
            .map(|entry| DirEntry {
                ino: entry.id(),
                name: entry.tag().to_string(),
                kind: FileType::Directory,
            })
            .collect())
    }

    pub async fn lookup(&self, name: &str) -> Result<TagDir, FsError> {
        let releases = self.releases.get().await?;
        match releases.get(name) {
            Some(entry) => Ok(TagDir::new(Arc::clone(entry))),
            None => Err(FsError::NotFound(name.to_string())),
        }
    }
}

/// One release's directory, named after its tag
pub struct TagDir {
    entry: Arc<ReleaseEntry>,
}

impl TagDir {
    pub fn new(entry: Arc<ReleaseEntry>) -> Self {
        Self { entry }
    }

    pub fn attr(&self) -> FileAttr {
        directory_attr(self.entry.id(), release_mtime(self.entry.info()))
    }

    pub async fn entries(&self) -> Result<Vec<DirEntry>, FsError> {
        let assets = self.entry.assets().get().await?;
        Ok(assets
            .iter()
            .map(|asset| DirEntry {
                ino: asset.id,
                name: asset.name.clone(),
                kind: FileType::RegularFile,
            })
            .collect())
    }

    pub async fn lookup(&self, name: &str) -> Result<AssetFile, FsError> {
        let assets = self.entry.assets().get().await?;
        assets
            .iter()
            .find(|asset| asset.name == name)
            .map(|asset| {
                AssetFile::new(
                    Arc::clone(self.entry.assets().context().host()),
                    asset.clone(),
                )
            })
            .ok_or_else(|| FsError::NotFound(name.to_string()))
    }
}

/// One downloadable asset, presented as a read-only file
pub struct AssetFile {
    host: Arc<dyn ReleaseHost>,
    asset: AssetInfo,
}

impl AssetFile {
    pub fn new(host: Arc<dyn ReleaseHost>, asset: AssetInfo) -> Self {
        Self { host, asset }
    }

    pub fn attr(&self) -> FileAttr {
        file_attr(
            self.asset.id,
            self.asset.size,
            SystemTime::from(self.asset.updated_at),
        )
    }

    /// Download the asset's full content
    ///
    /// Content is never cached; every call goes to the remote host.
    pub async fn read_all(&self) -> Result<Vec<u8>, FsError> {
        Ok(self.host.download(&self.asset.url).await?)
    }
}

fn release_mtime(info: &ReleaseInfo) -> SystemTime {
    SystemTime::from(info.published_at.unwrap_or(info.created_at))
}

/// Directory attributes: read+execute only, never writable
fn directory_attr(ino: u64, mtime: SystemTime) -> FileAttr {
    let uid = unsafe { libc::getuid() };
    let gid = unsafe { libc::getgid() };

    FileAttr {
        ino,
        size: 0,
        blocks: 0,
        atime: mtime,
        mtime,
        ctime: mtime,
        crtime: mtime,
        kind: FileType::Directory,
        perm: 0o555,
        nlink: 2,
        uid,
        gid,
        rdev: 0,
        blksize: 4096,
        flags: 0,
    }
}

/// File attributes: read-only, sized from the remote listing
fn file_attr(ino: u64, size: u64, mtime: SystemTime) -> FileAttr {
    let uid = unsafe { libc::getuid() };
    let gid = unsafe { libc::getgid() };

    // 512-byte blocks as per POSIX
    let blocks = (size + 511) / 512;

    FileAttr {
        ino,
        size,
        blocks,
        atime: mtime,
        mtime,
        ctime: mtime,
        crtime: mtime,
        kind: FileType::RegularFile,
        perm: 0o444,
        nlink: 1,
        uid,
        gid,
        rdev: 0,
        blksize: 4096,
        flags: 0,
    }
}
