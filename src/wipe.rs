//! Wipe orchestrator: inventory and bulk-delete of all stored app data.
//!
//! A wipe deletes every stored file individually (best effort, one failure
//! does not stop the batch), then flushes the key-value store in one call,
//! then reloads the inventory so the caller sees the post-wipe state.

use crate::backend::{Auth, FileStore, KvStore, StoredEntry};
use crate::error::WipeError;
use crate::record::{UploadRecord, RESUME_KEY_PREFIX};
use std::sync::Arc;
use tracing::{info, warn};

/// Root path listed when gathering stored files.
const FILES_ROOT: &str = "./";

/// Everything the app currently has in storage.
#[derive(Debug, Clone, Default)]
pub struct Inventory {
    pub files: Vec<StoredEntry>,
    pub records: Vec<UploadRecord>,
}

impl Inventory {
    pub fn is_empty(&self) -> bool {
        self.files.is_empty() && self.records.is_empty()
    }
}

/// Result of one file deletion inside a wipe.
#[derive(Debug, Clone)]
pub struct DeletionOutcome {
    pub path: String,
    /// `Err` carries the backend's failure detail; the wipe continued past it.
    pub result: Result<(), String>,
}

/// What a completed wipe did.
#[derive(Debug, Clone)]
pub struct WipeReport {
    pub deletions: Vec<DeletionOutcome>,
    /// Inventory re-read after the wipe; non-empty entries here are files
    /// whose deletion failed.
    pub remaining: Inventory,
}

impl WipeReport {
    pub fn failed_deletions(&self) -> impl Iterator<Item = &DeletionOutcome> {
        self.deletions.iter().filter(|d| d.result.is_err())
    }
}

/// Sequences inventory and wipe operations over storage and auth.
pub struct WipeOrchestrator {
    fs: Arc<dyn FileStore>,
    kv: Arc<dyn KvStore>,
    auth: Arc<dyn Auth>,
}

impl WipeOrchestrator {
    pub fn new(fs: Arc<dyn FileStore>, kv: Arc<dyn KvStore>, auth: Arc<dyn Auth>) -> Self {
        Self { fs, kv, auth }
    }

    /// List all stored files and persisted records.
    ///
    /// Malformed record values are logged and skipped, never fatal: one
    /// corrupt entry must not hide the rest of the inventory.
    pub async fn load_inventory(&self) -> Result<Inventory, WipeError> {
        if !self.auth.is_authenticated() {
            return Err(WipeError::Unauthenticated);
        }

        let files = self
            .fs
            .read_dir(FILES_ROOT)
            .await
            .map_err(|e| WipeError::List { detail: e.0 })?;

        let entries = self
            .kv
            .list(RESUME_KEY_PREFIX)
            .await
            .map_err(|e| WipeError::List { detail: e.0 })?;

        let mut records = Vec::with_capacity(entries.len());
        for entry in entries {
            match serde_json::from_str::<UploadRecord>(&entry.value) {
                Ok(record) => records.push(record),
                Err(e) => warn!("Skipping malformed record under '{}': {e}", entry.key),
            }
        }

        Ok(Inventory { files, records })
    }

    /// Delete all stored files and flush every persisted record.
    pub async fn wipe_all(&self) -> Result<WipeReport, WipeError> {
        let inventory = self.load_inventory().await?;
        info!(
            "Wiping {} files and {} records",
            inventory.files.len(),
            inventory.records.len()
        );

        let mut deletions = Vec::with_capacity(inventory.files.len());
        for file in &inventory.files {
            let result = match self.fs.delete(&file.path).await {
                Ok(()) => Ok(()),
                Err(e) => {
                    warn!("Failed to delete '{}': {}", file.path, e.0);
                    Err(e.0)
                }
            };
            deletions.push(DeletionOutcome {
                path: file.path.clone(),
                result,
            });
        }

        // The flush runs even when some deletions failed: stale records
        // pointing at deleted files are worse than orphaned files.
        self.kv
            .flush()
            .await
            .map_err(|e| WipeError::Flush { detail: e.0 })?;

        let remaining = self.load_inventory().await?;
        Ok(WipeReport {
            deletions,
            remaining,
        })
    }
}
