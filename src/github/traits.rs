//! Remote host interface for release and asset listings.
//!
//! Catalogs and file nodes talk to GitHub through this trait rather than the
//! concrete client, so tests can substitute a scripted host.

use async_trait::async_trait;

use super::errors::GhError;
use super::types::{AssetInfo, ReleaseInfo};

/// One page of a paginated listing.
#[derive(Debug, Clone)]
pub struct Page<T> {
    /// Items in the order the remote service returned them.
    pub items: Vec<T>,
    /// True when no further pages follow this one.
    pub is_last: bool,
}

/// Remote operations the daemon needs - implemented by `GhClient`.
#[async_trait]
pub trait ReleaseHost: Send + Sync {
    /// Fetch one page of the repository's release listing.
    /// Pages are numbered from 1.
    async fn list_releases(&self, page: u32, per_page: u32) -> Result<Page<ReleaseInfo>, GhError>;

    /// Fetch one page of a release's asset listing.
    async fn list_assets(
        &self,
        release_id: u64,
        page: u32,
        per_page: u32,
    ) -> Result<Page<AssetInfo>, GhError>;

    /// Download an asset's full content given its API locator.
    /// Attaches the bearer credential when one is configured.
    async fn download(&self, url: &str) -> Result<Vec<u8>, GhError>;
}
