//! Scripted in-memory host for catalog and node tests.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Mutex;

use async_trait::async_trait;
use chrono::DateTime;

use crate::github::{AssetInfo, GhError, Page, ReleaseHost, ReleaseInfo};

pub fn release(id: u64, tag: &str) -> ReleaseInfo {
    ReleaseInfo {
        id,
        tag_name: tag.to_string(),
        name: Some(tag.to_string()),
        draft: false,
        prerelease: false,
        created_at: DateTime::from_timestamp(1_600_000_000, 0).unwrap(),
        published_at: Some(DateTime::from_timestamp(1_600_003_600, 0).unwrap()),
    }
}

pub fn asset(id: u64, name: &str, size: u64) -> AssetInfo {
    AssetInfo {
        id,
        name: name.to_string(),
        size,
        url: format!("https://api.test/assets/{}", id),
        content_type: Some("application/octet-stream".to_string()),
        updated_at: DateTime::from_timestamp(1_600_007_200, 0).unwrap(),
    }
}

/// A `ReleaseHost` serving pre-scripted pages and payloads.
///
/// Listings are stored page-by-page so tests control exactly how the remote
/// splits a listing. `release_fetches`/`asset_fetches` count full listing
/// attempts (page-1 requests), including ones that are scripted to fail.
#[derive(Default)]
pub struct ScriptedHost {
    release_pages: Mutex<Vec<Vec<ReleaseInfo>>>,
    asset_pages: Mutex<HashMap<u64, Vec<Vec<AssetInfo>>>>,
    payloads: Mutex<HashMap<String, Vec<u8>>>,
    fail_listings: AtomicBool,
    release_fetches: AtomicUsize,
    asset_fetches: AtomicUsize,
}

impl ScriptedHost {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_releases(&self, pages: Vec<Vec<ReleaseInfo>>) {
        *self.release_pages.lock().unwrap() = pages;
    }

    pub fn set_assets(&self, release_id: u64, pages: Vec<Vec<AssetInfo>>) {
        self.asset_pages.lock().unwrap().insert(release_id, pages);
    }

    pub fn set_payload(&self, url: &str, bytes: Vec<u8>) {
        self.payloads.lock().unwrap().insert(url.to_string(), bytes);
    }

    pub fn fail_listings(&self, fail: bool) {
        self.fail_listings.store(fail, Ordering::SeqCst);
    }

    pub fn release_fetches(&self) -> usize {
        self.release_fetches.load(Ordering::SeqCst)
    }

    pub fn asset_fetches(&self) -> usize {
        self.asset_fetches.load(Ordering::SeqCst)
    }

    fn serve<T: Clone>(pages: &[Vec<T>], page: u32) -> Page<T> {
        let index = page as usize - 1;
        Page {
            items: pages.get(index).cloned().unwrap_or_default(),
            is_last: page as usize >= pages.len(),
        }
    }
}

#[async_trait]
impl ReleaseHost for ScriptedHost {
    async fn list_releases(&self, page: u32, _per_page: u32) -> Result<Page<ReleaseInfo>, GhError> {
        if page == 1 {
            self.release_fetches.fetch_add(1, Ordering::SeqCst);
        }
        if self.fail_listings.load(Ordering::SeqCst) {
            return Err(GhError::api(500, "scripted failure".to_string()));
        }
        Ok(Self::serve(&self.release_pages.lock().unwrap(), page))
    }

    async fn list_assets(
        &self,
        release_id: u64,
        page: u32,
        _per_page: u32,
    ) -> Result<Page<AssetInfo>, GhError> {
        if page == 1 {
            self.asset_fetches.fetch_add(1, Ordering::SeqCst);
        }
        if self.fail_listings.load(Ordering::SeqCst) {
            return Err(GhError::api(500, "scripted failure".to_string()));
        }
        let pages = self.asset_pages.lock().unwrap();
        Ok(Self::serve(
            pages.get(&release_id).map(Vec::as_slice).unwrap_or(&[]),
            page,
        ))
    }

    async fn download(&self, url: &str) -> Result<Vec<u8>, GhError> {
        self.payloads
            .lock()
            .unwrap()
            .get(url)
            .cloned()
            .ok_or_else(|| GhError::api(404, format!("no payload for {}", url)))
    }
}
