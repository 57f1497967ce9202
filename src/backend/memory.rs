//! In-memory backend implementations for tests and local runs.
//!
//! Behaviour mirrors the hosted service closely enough for orchestrator
//! tests: uploads get unique paths, listings reflect current contents, and
//! `flush` empties the key-value store wholesale.

use crate::backend::{
    AiClient, AiResponse, Auth, BackendError, FileStore, KvEntry, KvStore, StoredEntry, StoredFile,
};
use crate::pipeline::input::FileData;
use async_trait::async_trait;
use std::collections::BTreeMap;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use tokio::sync::Mutex;

/// File store backed by a map of path → entry.
#[derive(Default)]
pub struct MemoryFileStore {
    files: Mutex<BTreeMap<String, StoredEntry>>,
    next_id: AtomicU64,
}

impl MemoryFileStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of files currently stored.
    pub async fn file_count(&self) -> usize {
        self.files.lock().await.len()
    }
}

#[async_trait]
impl FileStore for MemoryFileStore {
    async fn upload(&self, file: &FileData) -> Result<Option<StoredFile>, BackendError> {
        let id = self.next_id.fetch_add(1, Ordering::SeqCst);
        let path = format!("/files/{id}-{}", file.name);
        let entry = StoredEntry {
            id: id.to_string(),
            name: file.name.clone(),
            path: path.clone(),
            size: file.len() as u64,
        };
        self.files.lock().await.insert(path.clone(), entry);
        Ok(Some(StoredFile { path }))
    }

    async fn read_dir(&self, _path: &str) -> Result<Vec<StoredEntry>, BackendError> {
        Ok(self.files.lock().await.values().cloned().collect())
    }

    async fn delete(&self, path: &str) -> Result<(), BackendError> {
        self.files
            .lock()
            .await
            .remove(path)
            .map(|_| ())
            .ok_or_else(|| BackendError::new(format!("no such file: {path}")))
    }
}

/// Key-value store backed by a `BTreeMap` (listings come back key-ordered).
#[derive(Default)]
pub struct MemoryKv {
    entries: Mutex<BTreeMap<String, String>>,
}

impl MemoryKv {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl KvStore for MemoryKv {
    async fn set(&self, key: &str, value: &str) -> Result<(), BackendError> {
        self.entries
            .lock()
            .await
            .insert(key.to_string(), value.to_string());
        Ok(())
    }

    async fn get(&self, key: &str) -> Result<Option<String>, BackendError> {
        Ok(self.entries.lock().await.get(key).cloned())
    }

    async fn list(&self, prefix: &str) -> Result<Vec<KvEntry>, BackendError> {
        Ok(self
            .entries
            .lock()
            .await
            .iter()
            .filter(|(k, _)| k.starts_with(prefix))
            .map(|(k, v)| KvEntry {
                key: k.clone(),
                value: v.clone(),
            })
            .collect())
    }

    async fn flush(&self) -> Result<(), BackendError> {
        self.entries.lock().await.clear();
        Ok(())
    }
}

/// Auth stub with a switchable signed-in state.
pub struct MemoryAuth {
    signed_in: AtomicBool,
}

impl MemoryAuth {
    pub fn signed_in() -> Self {
        Self {
            signed_in: AtomicBool::new(true),
        }
    }

    pub fn signed_out() -> Self {
        Self {
            signed_in: AtomicBool::new(false),
        }
    }
}

#[async_trait]
impl Auth for MemoryAuth {
    fn is_authenticated(&self) -> bool {
        self.signed_in.load(Ordering::SeqCst)
    }

    async fn sign_out(&self) -> Result<(), BackendError> {
        self.signed_in.store(false, Ordering::SeqCst);
        Ok(())
    }
}

/// AI stub that replies with a fixed response regardless of input.
pub struct CannedAi {
    response: Option<AiResponse>,
}

impl CannedAi {
    pub fn replying_with(response: AiResponse) -> Self {
        Self {
            response: Some(response),
        }
    }

    /// Simulates a service that accepts the call but returns nothing.
    pub fn silent() -> Self {
        Self { response: None }
    }
}

#[async_trait]
impl AiClient for CannedAi {
    async fn feedback(
        &self,
        _file_path: &str,
        _instructions: &str,
    ) -> Result<Option<AiResponse>, BackendError> {
        Ok(self.response.clone())
    }
}
