//! Filesystem-level error types
//!
//! Everything a tree node can fail with: a lookup miss, or a remote fetch
//! failure bubbling up from the catalogs or a download.

use crate::github::GhError;

#[derive(Debug, thiserror::Error)]
pub enum FsError {
    #[error("no entry named {0}")]
    NotFound(String),

    #[error(transparent)]
    Remote(#[from] GhError),
}

impl FsError {
    /// Map to the errno reported through the FUSE reply
    pub fn to_errno(&self) -> i32 {
        match self {
            FsError::NotFound(_) => libc::ENOENT,
            FsError::Remote(_) => libc::EIO,
        }
    }
}
