//! Two-level lazy cache of remote release metadata
//!
//! The release catalog caches the repository's release listing; each entry
//! owns an asset catalog caching that release's assets. Both refresh from the
//! remote host when their staleness threshold elapses and swap snapshots in
//! wholesale, so readers always observe a single complete fetch generation.

pub mod assets;
pub mod context;
pub mod fetch;
pub mod releases;

#[cfg(test)]
pub(crate) mod testing;

pub use assets::AssetCatalog;
pub use context::RemoteContext;
pub use releases::{ReleaseCatalog, ReleaseEntry, ReleaseMap};
