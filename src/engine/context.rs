// SPDX-License-Identifier: MIT

//! Resolution context shared by every rule of a batch
//!
//! Documents are fetched through the snapshot store at most once per
//! snapshot id, even when several rules ask for the same id concurrently.

use crate::engine::error::StoreError;
use crate::engine::store::SnapshotStore;
use serde_json::Value;
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::sync::OnceCell;

/// Default time allowed for a single document fetch
pub const DEFAULT_FETCH_TIMEOUT: Duration = Duration::from_secs(30);

type DocumentCell = Arc<OnceCell<Arc<Value>>>;

pub struct ResolutionContext {
    /// snapshot id -> collection name
    snapshots: HashMap<String, String>,
    store: Arc<dyn SnapshotStore>,
    default_document: Option<Value>,
    fetch_timeout: Duration,
    cache: Mutex<HashMap<String, DocumentCell>>,
}

impl ResolutionContext {
    pub fn new(snapshots: HashMap<String, String>, store: Arc<dyn SnapshotStore>) -> Self {
        Self {
            snapshots,
            store,
            default_document: None,
            fetch_timeout: DEFAULT_FETCH_TIMEOUT,
            cache: Mutex::new(HashMap::new()),
        }
    }

    /// Document used for paths that do not start with a known snapshot id
    pub fn with_default_document(mut self, document: Value) -> Self {
        self.default_document = Some(document);
        self
    }

    pub fn with_fetch_timeout(mut self, timeout: Duration) -> Self {
        self.fetch_timeout = timeout;
        self
    }

    pub fn is_snapshot(&self, snapshot_id: &str) -> bool {
        self.snapshots.contains_key(snapshot_id)
    }

    pub fn default_document(&self) -> Option<&Value> {
        self.default_document.as_ref()
    }

    /// Content of the latest document for `snapshot_id`.
    ///
    /// A missing document resolves to `null`. Store failures are returned
    /// and not cached, so a later call retries the fetch.
    pub async fn document(&self, snapshot_id: &str) -> Result<Arc<Value>, StoreError> {
        let cell = {
            let mut cache = self
                .cache
                .lock()
                .map_err(|_| StoreError::unavailable("document cache poisoned"))?;
            cache
                .entry(snapshot_id.to_string())
                .or_insert_with(|| Arc::new(OnceCell::new()))
                .clone()
        };

        let document = cell.get_or_try_init(|| self.fetch(snapshot_id)).await?;
        Ok(document.clone())
    }

    /// Fetch every known snapshot id in `ids`; unknown ids are skipped
    pub async fn prefetch(
        &self,
        ids: &[&str],
    ) -> Result<HashMap<String, Arc<Value>>, StoreError> {
        let known: Vec<&str> = ids.iter().copied().filter(|id| self.is_snapshot(id)).collect();
        let documents =
            futures::future::try_join_all(known.iter().map(|id| self.document(id))).await?;
        Ok(known
            .into_iter()
            .map(str::to_string)
            .zip(documents)
            .collect())
    }

    async fn fetch(&self, snapshot_id: &str) -> Result<Arc<Value>, StoreError> {
        let collection = self
            .snapshots
            .get(snapshot_id)
            .ok_or_else(|| StoreError::unavailable(format!("unknown snapshot '{}'", snapshot_id)))?;

        log::debug!("Fetching snapshot {} from collection {}", snapshot_id, collection);
        let fetched = tokio::time::timeout(
            self.fetch_timeout,
            self.store.fetch_latest(snapshot_id, collection),
        )
        .await
        .map_err(|_| StoreError::Timeout {
            snapshot_id: snapshot_id.to_string(),
            timeout_ms: self.fetch_timeout.as_millis() as u64,
        })??;

        match fetched {
            Some(document) => {
                log::debug!(
                    "Snapshot {} checksum {} timestamp {}",
                    snapshot_id,
                    document.checksum,
                    document.timestamp
                );
                Ok(Arc::new(document.json))
            }
            None => {
                log::warn!(
                    "No document for snapshot {} in collection {}",
                    snapshot_id,
                    collection
                );
                Ok(Arc::new(Value::Null))
            }
        }
    }
}
