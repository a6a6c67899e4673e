// SPDX-License-Identifier: MIT

//! Snapshot definitions and the in-memory snapshot store

pub mod loader;
pub mod memory;
pub mod types;

pub use loader::{collection_map, populate_store, SnapshotLoader};
pub use memory::InMemorySnapshotStore;
pub use types::{SnapshotFile, SnapshotGroup, SnapshotNode};
