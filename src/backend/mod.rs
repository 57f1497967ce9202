//! Hosted-backend capability traits: file storage, key-value persistence,
//! AI feedback, and authentication.
//!
//! The orchestrators never talk to a concrete backend; they hold trait
//! objects so the hosted service can be swapped for the in-memory
//! implementations in [`memory`] during tests and local runs.

use crate::pipeline::input::FileData;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;

pub mod memory;

/// A backend call failure. The orchestrators map these to their own error
/// variants so each failing stage keeps a distinct user-facing message.
#[derive(Debug, Clone, Error)]
#[error("{0}")]
pub struct BackendError(pub String);

impl BackendError {
    pub fn new(detail: impl Into<String>) -> Self {
        Self(detail.into())
    }
}

/// Reference to a stored file.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoredFile {
    pub path: String,
}

/// One entry of a storage directory listing.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoredEntry {
    pub id: String,
    pub name: String,
    pub path: String,
    pub size: u64,
}

/// One entry of a key-value listing (value included).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct KvEntry {
    pub key: String,
    pub value: String,
}

/// File storage capability.
#[async_trait]
pub trait FileStore: Send + Sync {
    /// Store a file; `None` means the backend accepted the call but
    /// produced no stored reference.
    async fn upload(&self, file: &FileData) -> Result<Option<StoredFile>, BackendError>;

    /// List all files under `path`.
    async fn read_dir(&self, path: &str) -> Result<Vec<StoredEntry>, BackendError>;

    /// Delete one file by path.
    async fn delete(&self, path: &str) -> Result<(), BackendError>;
}

/// Key-value persistence capability.
#[async_trait]
pub trait KvStore: Send + Sync {
    async fn set(&self, key: &str, value: &str) -> Result<(), BackendError>;

    async fn get(&self, key: &str) -> Result<Option<String>, BackendError>;

    /// List all entries whose key starts with `prefix`, values included.
    async fn list(&self, prefix: &str) -> Result<Vec<KvEntry>, BackendError>;

    /// Delete every key in the store.
    async fn flush(&self) -> Result<(), BackendError>;
}

/// AI analysis capability.
#[async_trait]
pub trait AiClient: Send + Sync {
    /// Analyse a stored file with the given instruction string. `None`
    /// means the service returned no response at all.
    async fn feedback(
        &self,
        file_path: &str,
        instructions: &str,
    ) -> Result<Option<AiResponse>, BackendError>;
}

/// Authentication capability.
#[async_trait]
pub trait Auth: Send + Sync {
    fn is_authenticated(&self) -> bool;

    async fn sign_out(&self) -> Result<(), BackendError>;
}

/// An AI service response.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AiResponse {
    pub message: AiMessage,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AiMessage {
    pub content: MessageContent,
}

/// AI message content arrives in one of two wire shapes: a plain string, or
/// a list of text blocks. `#[serde(untagged)]` accepts both.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(untagged)]
pub enum MessageContent {
    Text(String),
    Blocks(Vec<ContentBlock>),
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ContentBlock {
    pub text: String,
}

impl MessageContent {
    /// The textual content: the string itself, or the first block's text.
    pub fn text(&self) -> &str {
        match self {
            MessageContent::Text(s) => s,
            MessageContent::Blocks(blocks) => {
                blocks.first().map(|b| b.text.as_str()).unwrap_or_default()
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn content_deserialises_from_plain_string() {
        let json = r#"{"content": "hello"}"#;
        let msg: AiMessage = serde_json::from_str(json).unwrap();
        assert_eq!(msg.content.text(), "hello");
    }

    #[test]
    fn content_deserialises_from_block_list() {
        let json = r#"{"content": [{"text": "first"}, {"text": "second"}]}"#;
        let msg: AiMessage = serde_json::from_str(json).unwrap();
        assert_eq!(msg.content.text(), "first");
    }

    #[test]
    fn empty_block_list_yields_empty_text() {
        let json = r#"{"content": []}"#;
        let msg: AiMessage = serde_json::from_str(json).unwrap();
        assert_eq!(msg.content.text(), "");
    }
}
