//! Snapshot loader - definition files and node documents
//!
//! Definition files are JSON or YAML. Each node points at a JSON file that
//! becomes one document in the snapshot store.

use super::memory::InMemorySnapshotStore;
use super::types::SnapshotFile;
use crate::engine::store::SnapshotDocument;
use crate::validator::error::ValidatorError;
use serde_json::{json, Value};
use sha2::{Digest, Sha256};
use std::collections::HashMap;
use std::fs;
use std::path::Path;

pub struct SnapshotLoader;

impl SnapshotLoader {
    /// Load a snapshot definition file
    pub fn load_file<P: AsRef<Path>>(path: P) -> Result<SnapshotFile, ValidatorError> {
        let path = path.as_ref();
        if !path.exists() {
            return Err(ValidatorError::FileNotFound(path.display().to_string()));
        }
        let content = fs::read_to_string(path)?;
        Self::parse(&content)
    }

    /// Parse a definition from JSON or YAML text
    pub fn parse(content: &str) -> Result<SnapshotFile, ValidatorError> {
        let file: SnapshotFile = serde_yaml::from_str(content)?;
        Ok(file)
    }
}

/// Collection names are stored without dots and in lower case
pub fn normalize_collection(name: &str) -> String {
    name.replace('.', "").to_lowercase()
}

/// Map every node's snapshot id to its normalized collection
pub fn collection_map(file: &SnapshotFile, default_collection: &str) -> HashMap<String, String> {
    let mut map = HashMap::new();
    for (i, group) in file.snapshots.iter().enumerate() {
        if group.nodes.is_empty() {
            log::info!(
                "Snapshot {} ({}) has no nodes, skipping",
                i,
                group.source.as_deref().unwrap_or("unnamed")
            );
            continue;
        }
        for node in &group.nodes {
            let collection = node.collection.as_deref().unwrap_or(default_collection);
            map.insert(node.snapshot_id.clone(), normalize_collection(collection));
        }
    }
    map
}

/// Hex SHA-256 of the document's serialized JSON
pub fn checksum(json: &Value) -> String {
    let mut hasher = Sha256::new();
    hasher.update(json.to_string().as_bytes());
    format!("{:x}", hasher.finalize())
}

/// Read each node's JSON file under `base_dir` into `store`.
///
/// A node whose file is missing or not valid JSON is stored as `{}`.
/// Returns the number of documents inserted.
pub async fn populate_store(
    file: &SnapshotFile,
    base_dir: &Path,
    store: &InMemorySnapshotStore,
    default_collection: &str,
) -> Result<usize, ValidatorError> {
    let collections = collection_map(file, default_collection);
    let mut inserted = 0;

    for node in file.nodes() {
        let Some(collection) = collections.get(&node.snapshot_id) else {
            continue;
        };
        let json = match &node.path {
            Some(path) => read_document(&base_dir.join(path)).await,
            None => {
                log::warn!("Snapshot node {} has no path", node.snapshot_id);
                json!({})
            }
        };

        store
            .insert(SnapshotDocument {
                snapshot_id: node.snapshot_id.clone(),
                collection: collection.clone(),
                checksum: checksum(&json),
                timestamp: chrono::Utc::now().timestamp_millis(),
                json,
            })
            .await;
        inserted += 1;
    }

    log::info!("Loaded {} snapshot documents", inserted);
    Ok(inserted)
}

async fn read_document(path: &Path) -> Value {
    let content = match tokio::fs::read_to_string(path).await {
        Ok(content) => content,
        Err(e) => {
            log::warn!("Cannot read {}: {}", path.display(), e);
            return json!({});
        }
    };
    match serde_json::from_str(&content) {
        Ok(json) => json,
        Err(e) => {
            log::warn!("Invalid JSON in {}: {}", path.display(), e);
            json!({})
        }
    }
}
