//! Release catalog: the top-level lazy cache.
//!
//! Maps tag names to release entries, refreshed from the remote listing when
//! the staleness threshold has elapsed. The mapping is swapped wholesale on a
//! successful fetch; a failed fetch leaves the previous generation and its
//! timestamp untouched. The catalog lock is held for the whole of `get` and
//! `refresh`, remote round-trips included, so concurrent late callers block
//! and share a single refresh instead of racing their own.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::Mutex;
use tokio::time::Instant;
use tracing::debug;

use super::assets::AssetCatalog;
use super::context::RemoteContext;
use super::fetch::{fetch_all_pages, PAGE_LIMIT};
use crate::github::{GhError, ReleaseInfo};

/// One refresh generation of the release listing
pub type ReleaseMap = HashMap<String, Arc<ReleaseEntry>>;

/// One release together with its asset catalog
///
/// Created when the listing is fetched and replaced wholesale on the next
/// refresh; never mutated in place. The entry owns its asset catalog, which
/// starts empty and fills on first access.
pub struct ReleaseEntry {
    info: ReleaseInfo,
    assets: AssetCatalog,
}

impl ReleaseEntry {
    fn new(ctx: Arc<RemoteContext>, info: ReleaseInfo) -> Self {
        let assets = AssetCatalog::new(ctx, info.id);
        Self { info, assets }
    }

    /// Remote release identifier; doubles as the directory inode
    pub fn id(&self) -> u64 {
        self.info.id
    }

    /// Tag name; doubles as the directory name
    pub fn tag(&self) -> &str {
        &self.info.tag_name
    }

    pub fn info(&self) -> &ReleaseInfo {
        &self.info
    }

    pub fn assets(&self) -> &AssetCatalog {
        &self.assets
    }
}

struct CatalogState {
    entries: Arc<ReleaseMap>,
    last_refreshed: Option<Instant>,
}

/// Lazy cache of the repository's release listing
pub struct ReleaseCatalog {
    ctx: Arc<RemoteContext>,
    state: Mutex<CatalogState>,
}

impl ReleaseCatalog {
    pub fn new(ctx: Arc<RemoteContext>) -> Self {
        Self {
            ctx,
            state: Mutex::new(CatalogState {
                entries: Arc::new(ReleaseMap::new()),
                last_refreshed: None,
            }),
        }
    }

    /// Current snapshot, refreshing first if the threshold has elapsed
    pub async fn get(&self) -> Result<Arc<ReleaseMap>, GhError> {
        let mut state = self.state.lock().await;
        if stale(state.last_refreshed, self.ctx.refresh_threshold()) {
            self.refresh_locked(&mut state).await?;
        }
        Ok(Arc::clone(&state.entries))
    }

    /// Unconditionally re-fetch the listing and swap in the new generation
    pub async fn refresh(&self) -> Result<Arc<ReleaseMap>, GhError> {
        let mut state = self.state.lock().await;
        self.refresh_locked(&mut state).await?;
        Ok(Arc::clone(&state.entries))
    }

    /// Current snapshot without any staleness check or remote traffic
    pub async fn cached(&self) -> Arc<ReleaseMap> {
        Arc::clone(&self.state.lock().await.entries)
    }

    async fn refresh_locked(&self, state: &mut CatalogState) -> Result<(), GhError> {
        let host = self.ctx.host();
        let releases = fetch_all_pages(|page| host.list_releases(page, PAGE_LIMIT)).await?;

        let mut entries = ReleaseMap::with_capacity(releases.len());
        for info in releases {
            // Later duplicates of a tag replace earlier ones
            entries.insert(
                info.tag_name.clone(),
                Arc::new(ReleaseEntry::new(Arc::clone(&self.ctx), info)),
            );
        }

        state.entries = Arc::new(entries);
        state.last_refreshed = Some(Instant::now());
        debug!(releases = state.entries.len(), "Refreshed release listing");
        Ok(())
    }
}

/// Whether a refresh is due under the time-threshold staleness rule
///
/// True when the threshold has elapsed since the last successful refresh,
/// and always true before the first one.
pub(super) fn stale(last_refreshed: Option<Instant>, threshold: Duration) -> bool {
    match last_refreshed {
        Some(at) => at.elapsed() >= threshold,
        None => true,
    }
}
