//! FUSE filesystem implementation

pub mod error;
pub mod node;
pub mod relfs;

pub use error::FsError;
pub use relfs::ReleaseFilesystem;
