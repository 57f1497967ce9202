//! # resumelens
//!
//! Turn a résumé PDF into an AI-scored review: rasterise the first page to a
//! PNG preview, store both artefacts, and ask a hosted AI for a structured
//! scoring report (overall score plus ATS, tone & style, content, structure,
//! and skills categories, each with actionable tips).
//!
//! ## Pipeline Overview
//!
//! ```text
//! résumé PDF
//!  │
//!  ├─ 1. Validate  type, non-empty, ≤ 50 MiB — before any engine work
//!  ├─ 2. Engine    acquire pdfium once, shared across concurrent callers
//!  ├─ 3. Convert   parse → render page 1 → encode PNG (per-step timeouts)
//!  ├─ 4. Store     upload original + preview image, persist the record
//!  ├─ 5. Analyze   AI feedback against the target job description
//!  └─ 6. Persist   re-save the record with parsed (or raw) feedback
//! ```
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use resumelens::{convert_page, ConvertConfig, EngineLoader, FileData};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let loader = EngineLoader::pdfium();
//!     let bytes = std::fs::read("resume.pdf")?;
//!     let file = FileData::new("resume.pdf", "application/pdf", bytes);
//!     let page = convert_page(&loader, &file, &ConvertConfig::default()).await?;
//!     std::fs::write(&page.file.name, page.image.as_bytes().unwrap())?;
//!     Ok(())
//! }
//! ```
//!
//! The full review flow wires the conversion into storage and AI backends
//! through [`UploadOrchestrator`]; backends are traits ([`backend::FileStore`],
//! [`backend::KvStore`], [`backend::AiClient`], [`backend::Auth`]) so hosted
//! services and the in-memory test doubles in [`backend::memory`] plug in
//! interchangeably.
//!
//! ## Feature Flags
//!
//! | Feature | Default | Description |
//! |---------|---------|-------------|
//! | `cli`   | on      | Enables the `resumelens` binary (clap + anyhow + indicatif + tracing-subscriber) |
//!
//! Disable `cli` when using only the library:
//! ```toml
//! resumelens = { version = "0.3", default-features = false }
//! ```

// ── Modules ──────────────────────────────────────────────────────────────

pub mod backend;
pub mod config;
pub mod convert;
pub mod engine;
pub mod error;
pub mod loader;
pub mod output;
pub mod pipeline;
pub mod progress;
pub mod prompts;
pub mod record;
pub mod upload;
pub mod wipe;

// ── Re-exports ───────────────────────────────────────────────────────────

pub use config::{ConvertConfig, ConvertConfigBuilder};
pub use convert::{convert_page, convert_pages, page_count};
pub use error::{ConvertError, LoadError, UploadError, WipeError};
pub use loader::EngineLoader;
pub use output::{ConvertedPage, ImageHandle, PageOutcome};
pub use pipeline::input::{FileData, MAX_FILE_BYTES};
pub use progress::{NoopProgress, ProgressCallback, UploadProgress};
pub use record::{Feedback, FeedbackPayload, UploadRecord};
pub use upload::{Submission, UploadOrchestrator, UploadRequest, UploadStage};
pub use wipe::{Inventory, WipeOrchestrator, WipeReport};
