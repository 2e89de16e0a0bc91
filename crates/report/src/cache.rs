use crate::error::ReportError;
use crate::snapshot::LayerReport;
use configuration::CacheSettings;
use core_types::LayerId;
use std::collections::HashMap;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Mutex;
use tokio::time::Instant;
use uuid::Uuid;

/// Identifies one state of a layer: a report stays valid until another trade settles.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CacheKey {
    pub layer_id: LayerId,
    pub last_trade_id: Option<Uuid>,
}

#[derive(Debug)]
struct CacheEntry {
    report: Arc<LayerReport>,
    inserted_at: Instant,
}

/// Memoises layer reports outside the engines, with a TTL and a size bound.
#[derive(Debug)]
pub struct SnapshotCache {
    ttl: Duration,
    capacity: usize,
    entries: Mutex<HashMap<CacheKey, CacheEntry>>,
}

impl SnapshotCache {
    pub fn new(settings: &CacheSettings) -> Self {
        Self {
            ttl: settings.ttl,
            capacity: settings.capacity.max(1),
            entries: Mutex::new(HashMap::new()),
        }
    }

    pub async fn get(&self, key: &CacheKey) -> Option<Arc<LayerReport>> {
        let mut entries = self.entries.lock().await;
        match entries.get(key) {
            Some(entry) if entry.inserted_at.elapsed() < self.ttl => Some(Arc::clone(&entry.report)),
            Some(_) => {
                entries.remove(key);
                None
            }
            None => None,
        }
    }

    pub async fn insert(&self, key: CacheKey, report: Arc<LayerReport>) {
        let mut entries = self.entries.lock().await;
        entries.retain(|_, entry| entry.inserted_at.elapsed() < self.ttl);

        if !entries.contains_key(&key) && entries.len() >= self.capacity {
            let oldest = entries
                .iter()
                .min_by_key(|(_, entry)| entry.inserted_at)
                .map(|(k, _)| k.clone());
            if let Some(oldest) = oldest {
                tracing::debug!(layer_id = %oldest.layer_id, "Evicting oldest cached report.");
                entries.remove(&oldest);
            }
        }

        entries.insert(
            key,
            CacheEntry {
                report,
                inserted_at: Instant::now(),
            },
        );
    }

    /// Returns the cached report for `key`, or computes and stores it.
    ///
    /// The lock is not held while `compute` runs; two concurrent misses on the same
    /// key may both compute, and the later insert wins.
    pub async fn get_or_compute<F, Fut>(&self, key: CacheKey, compute: F) -> Result<Arc<LayerReport>, ReportError>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<LayerReport, ReportError>>,
    {
        if let Some(report) = self.get(&key).await {
            tracing::debug!(layer_id = %key.layer_id, "Report cache hit.");
            return Ok(report);
        }

        let report = Arc::new(compute().await?);
        self.insert(key, Arc::clone(&report)).await;
        Ok(report)
    }

    /// Drops every cached report of the layer. Returns how many were removed.
    pub async fn invalidate_layer(&self, layer_id: &LayerId) -> usize {
        let mut entries = self.entries.lock().await;
        let before = entries.len();
        entries.retain(|key, _| &key.layer_id != layer_id);
        let removed = before - entries.len();
        tracing::debug!(layer_id = %layer_id, removed, "Invalidated cached reports.");
        removed
    }

    pub async fn len(&self) -> usize {
        self.entries.lock().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }
}
