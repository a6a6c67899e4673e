// SPDX-License-Identifier: MIT

use crate::engine::error::StoreError;
use crate::engine::store::{SnapshotDocument, SnapshotStore};
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;

type StoreKey = (String, String);

/// Snapshot store kept in process memory.
///
/// Several documents may be stored for one snapshot id; fetches return the
/// one with the greatest timestamp.
#[derive(Clone)]
pub struct InMemorySnapshotStore {
    documents: Arc<RwLock<HashMap<StoreKey, Vec<SnapshotDocument>>>>,
}

impl InMemorySnapshotStore {
    pub fn new() -> Self {
        Self {
            documents: Arc::new(RwLock::new(HashMap::new())),
        }
    }

    pub async fn insert(&self, document: SnapshotDocument) {
        let key = (document.snapshot_id.clone(), document.collection.clone());
        let mut documents = self.documents.write().await;
        documents.entry(key).or_default().push(document);
    }
}

impl Default for InMemorySnapshotStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl SnapshotStore for InMemorySnapshotStore {
    async fn fetch_latest(
        &self,
        snapshot_id: &str,
        collection: &str,
    ) -> Result<Option<SnapshotDocument>, StoreError> {
        let documents = self.documents.read().await;
        let key = (snapshot_id.to_string(), collection.to_string());
        Ok(documents
            .get(&key)
            .and_then(|docs| docs.iter().max_by_key(|doc| doc.timestamp))
            .cloned())
    }
}
