// SPDX-License-Identifier: MIT

use serde::{Deserialize, Serialize};

/// A snapshot definition file: groups of nodes, each naming a snapshot id
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SnapshotFile {
    #[serde(default)]
    pub snapshots: Vec<SnapshotGroup>,
}

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SnapshotGroup {
    #[serde(default)]
    pub source: Option<String>,
    #[serde(default)]
    pub nodes: Vec<SnapshotNode>,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SnapshotNode {
    pub snapshot_id: String,
    /// Collection name as written in the file; normalized on load
    #[serde(default)]
    pub collection: Option<String>,
    /// JSON file holding the node's document, relative to the base directory
    #[serde(default)]
    pub path: Option<String>,
}

impl SnapshotFile {
    pub fn nodes(&self) -> impl Iterator<Item = &SnapshotNode> {
        self.snapshots.iter().flat_map(|group| group.nodes.iter())
    }
}
