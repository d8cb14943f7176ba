//! Per-release asset catalog.
//!
//! Caches the ordered asset listing of a single release under the same
//! staleness and locking rules as the release catalog. Every release owns an
//! independent catalog and lock, so refreshing one release's assets never
//! contends with another's, or with the release listing itself.

use std::collections::HashMap;
use std::sync::Arc;

use tokio::sync::Mutex;
use tokio::time::Instant;
use tracing::debug;

use super::context::RemoteContext;
use super::fetch::{fetch_all_pages, PAGE_LIMIT};
use super::releases::stale;
use crate::github::{AssetInfo, GhError};

struct AssetState {
    assets: Arc<Vec<AssetInfo>>,
    last_refreshed: Option<Instant>,
}

/// Lazy cache of one release's asset listing
pub struct AssetCatalog {
    ctx: Arc<RemoteContext>,
    release_id: u64,
    state: Mutex<AssetState>,
}

impl AssetCatalog {
    pub fn new(ctx: Arc<RemoteContext>, release_id: u64) -> Self {
        Self {
            ctx,
            release_id,
            state: Mutex::new(AssetState {
                assets: Arc::new(Vec::new()),
                last_refreshed: None,
            }),
        }
    }

    pub fn context(&self) -> &Arc<RemoteContext> {
        &self.ctx
    }

    /// Current snapshot, refreshing first if the threshold has elapsed
    pub async fn get(&self) -> Result<Arc<Vec<AssetInfo>>, GhError> {
        let mut state = self.state.lock().await;
        if stale(state.last_refreshed, self.ctx.refresh_threshold()) {
            self.refresh_locked(&mut state).await?;
        }
        Ok(Arc::clone(&state.assets))
    }

    /// Unconditionally re-fetch the listing and swap in the new generation
    pub async fn refresh(&self) -> Result<Arc<Vec<AssetInfo>>, GhError> {
        let mut state = self.state.lock().await;
        self.refresh_locked(&mut state).await?;
        Ok(Arc::clone(&state.assets))
    }

    /// Current snapshot without any staleness check or remote traffic
    pub async fn cached(&self) -> Arc<Vec<AssetInfo>> {
        Arc::clone(&self.state.lock().await.assets)
    }

    async fn refresh_locked(&self, state: &mut AssetState) -> Result<(), GhError> {
        let host = self.ctx.host();
        let release_id = self.release_id;
        let fetched =
            fetch_all_pages(|page| host.list_assets(release_id, page, PAGE_LIMIT)).await?;

        // Remote order is preserved; a duplicated name replaces the earlier
        // occurrence in place
        let mut by_name: HashMap<String, usize> = HashMap::with_capacity(fetched.len());
        let mut assets: Vec<AssetInfo> = Vec::with_capacity(fetched.len());
        for asset in fetched {
            match by_name.get(&asset.name) {
                Some(&index) => assets[index] = asset,
                None => {
                    by_name.insert(asset.name.clone(), assets.len());
                    assets.push(asset);
                }
            }
        }

        state.assets = Arc::new(assets);
        state.last_refreshed = Some(Instant::now());
        debug!(
            release_id = release_id,
            assets = state.assets.len(),
            "Refreshed asset listing"
        );
        Ok(())
    }
}
