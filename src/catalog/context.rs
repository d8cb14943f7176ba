//! Shared remote-connection parameters.

use std::sync::Arc;
use std::time::Duration;

use crate::github::ReleaseHost;

/// Connection parameters shared by every catalog layer
///
/// Immutable after construction; catalogs hold it by `Arc` and never copy it.
/// A zero threshold means every access refetches.
pub struct RemoteContext {
    host: Arc<dyn ReleaseHost>,
    refresh_threshold: Duration,
}

impl RemoteContext {
    pub fn new(host: Arc<dyn ReleaseHost>, refresh_threshold: Duration) -> Self {
        Self {
            host,
            refresh_threshold,
        }
    }

    pub fn host(&self) -> &Arc<dyn ReleaseHost> {
        &self.host
    }

    pub fn refresh_threshold(&self) -> Duration {
        self.refresh_threshold
    }
}
