use std::path::Path;
use std::sync::Arc;

use arc_swap::ArcSwap;
use chrono::NaiveDateTime;
use tracing::{info, warn};

use crate::core::Result;
use crate::modules::sweep::models::{ExpiresUserOrder, ExpirySnapshot};

/// Process-wide store of the latest sweep result.
///
/// Readers get a consistent `Arc` snapshot; each sweep swaps in a whole new
/// one.
pub struct ExpiryCache {
    inner: ArcSwap<ExpirySnapshot>,
}

impl Default for ExpiryCache {
    fn default() -> Self {
        Self::new(ExpirySnapshot::default())
    }
}

impl ExpiryCache {
    pub fn new(snapshot: ExpirySnapshot) -> Self {
        Self {
            inner: ArcSwap::from_pointee(snapshot),
        }
    }

    pub fn snapshot(&self) -> Arc<ExpirySnapshot> {
        self.inner.load_full()
    }

    /// Publish a new result; returns the published snapshot
    pub fn replace(
        &self,
        orders: Vec<ExpiresUserOrder>,
        generated_at: NaiveDateTime,
    ) -> Arc<ExpirySnapshot> {
        let version = self.inner.load().version + 1;
        let snapshot = Arc::new(ExpirySnapshot {
            version,
            generated_at: Some(generated_at),
            orders,
        });
        self.inner.store(snapshot.clone());
        snapshot
    }

    /// Read a persisted snapshot; a missing or unreadable file gives an empty cache
    pub async fn load(path: &Path) -> Self {
        let bytes = match tokio::fs::read(path).await {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                info!(path = %path.display(), "No saved sweep snapshot, starting empty");
                return Self::default();
            }
            Err(e) => {
                warn!(path = %path.display(), error = %e, "Failed to read sweep snapshot");
                return Self::default();
            }
        };

        match serde_json::from_slice::<ExpirySnapshot>(&bytes) {
            Ok(snapshot) => {
                info!(version = snapshot.version, orders = snapshot.orders.len(), "Sweep snapshot loaded");
                Self::new(snapshot)
            }
            Err(e) => {
                warn!(path = %path.display(), error = %e, "Saved sweep snapshot is corrupt, starting empty");
                Self::default()
            }
        }
    }

    /// Write the current snapshot as JSON
    pub async fn persist(&self, path: &Path) -> Result<()> {
        let snapshot = self.snapshot();
        let body = serde_json::to_vec_pretty(snapshot.as_ref())?;

        if let Some(dir) = path.parent().filter(|d| !d.as_os_str().is_empty()) {
            tokio::fs::create_dir_all(dir).await?;
        }
        tokio::fs::write(path, body).await?;
        Ok(())
    }
}
