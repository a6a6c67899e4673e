// SPDX-License-Identifier: MIT

use crate::engine::error::StoreError;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// A captured snapshot of a resource as persisted by the snapshot store
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SnapshotDocument {
    pub snapshot_id: String,
    pub collection: String,
    pub checksum: String,
    /// Milliseconds since the Unix epoch
    pub timestamp: i64,
    pub json: Value,
}

/// Read-only access to persisted snapshots.
///
/// The engine never writes through this trait. Implementations must be
/// shareable across tasks evaluating rules concurrently.
#[async_trait]
pub trait SnapshotStore: Send + Sync {
    /// Returns the most recent document for the snapshot id in `collection`,
    /// or `Ok(None)` when no such document exists
    async fn fetch_latest(
        &self,
        snapshot_id: &str,
        collection: &str,
    ) -> Result<Option<SnapshotDocument>, StoreError>;
}
