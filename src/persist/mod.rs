//! Field snapshot persistence.
//!
//! The store is overwritten wholesale on every input event and read back when
//! a page or swapped region is initialized. Clearing after a submission is
//! the only deletion path.

mod snapshot;
mod storage;

use std::sync::Arc;

pub use snapshot::{FieldValue, FormSnapshot};
pub use storage::{FileStorage, MemoryStorage, SnapshotStorage};

/// Snapshot persistence under a fixed namespace key
#[derive(Clone)]
pub struct PersistenceStore {
    storage: Arc<dyn SnapshotStorage>,
    key: String,
}

impl PersistenceStore {
    pub fn new(storage: Arc<dyn SnapshotStorage>, key: impl Into<String>) -> Self {
        Self {
            storage,
            key: key.into(),
        }
    }

    pub fn key(&self) -> &str {
        &self.key
    }

    /// Read the stored snapshot.
    ///
    /// Missing data yields an empty snapshot. Data that fails to parse is
    /// removed from storage and never partially applied.
    pub fn load(&self) -> FormSnapshot {
        let raw = match self.storage.get(&self.key) {
            Ok(Some(raw)) => raw,
            Ok(None) => return FormSnapshot::default(),
            Err(err) => {
                tracing::warn!(key = %self.key, error = %err, "Failed to read saved form data");
                return FormSnapshot::default();
            }
        };

        match FormSnapshot::parse(&raw) {
            Ok(snapshot) => snapshot,
            Err(err) => {
                tracing::warn!(key = %self.key, error = %err, "Discarding corrupt form data");
                self.clear();
                FormSnapshot::default()
            }
        }
    }

    /// Overwrite the stored snapshot (best effort)
    pub fn save(&self, snapshot: &FormSnapshot) {
        let json = match snapshot.to_json() {
            Ok(json) => json,
            Err(err) => {
                tracing::warn!(error = %err, "Failed to encode form data");
                return;
            }
        };
        if let Err(err) = self.storage.set(&self.key, &json) {
            tracing::warn!(key = %self.key, error = %err, "Failed to save form data");
        }
    }

    /// Remove the stored snapshot (best effort)
    pub fn clear(&self) {
        if let Err(err) = self.storage.remove(&self.key) {
            tracing::warn!(key = %self.key, error = %err, "Failed to clear saved form data");
        }
    }

    /// Raw stored value, for inspection
    pub fn raw(&self) -> Option<String> {
        self.storage.get(&self.key).ok().flatten()
    }
}
