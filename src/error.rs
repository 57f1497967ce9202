//! Error types for the resumelens library.
//!
//! Two distinct layers reflect two distinct failure modes:
//!
//! * [`ConvertError`] / [`LoadError`] — **pipeline data**: a conversion step
//!   failed. These never escape the pipeline boundary as panics or unhandled
//!   faults; they come back as the `Err` half of a [`crate::convert`] result
//!   (or inside a per-page [`crate::output::PageOutcome`]) so callers can
//!   display the reason and let the user retry. Both are `Clone` because a
//!   single in-flight engine load is shared by every concurrent caller, and
//!   `Serialize` so per-page outcomes can be persisted or shipped to a UI.
//!
//! * [`UploadError`] / [`WipeError`] — **orchestrator boundary**: an external
//!   call (storage, AI) failed and the whole submission or wipe stops. Each
//!   variant maps to a distinct user-facing message; there is no automatic
//!   retry — every retry is a fresh user-initiated submission.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Engine acquisition failure.
///
/// Retryable: a failed load clears the loader's in-flight slot, so the next
/// [`crate::loader::EngineLoader::ensure_loaded`] starts from scratch.
#[derive(Debug, Clone, Error, Serialize, Deserialize)]
pub enum LoadError {
    /// The engine fetch exceeded the configured deadline.
    #[error("Engine load timed out after {secs}s")]
    Timeout { secs: u64 },

    /// The fetch itself failed (network, unsupported platform, bad archive…).
    #[error("Failed to load rendering engine: {detail}")]
    Fetch { detail: String },
}

/// A single conversion attempt's failure, tagged by the step that produced it.
///
/// Carried as data: `convert_page` returns `Result<ConvertedPage, ConvertError>`
/// and `convert_pages` records one outcome per attempted page.
#[derive(Debug, Clone, Error, Serialize, Deserialize)]
pub enum ConvertError {
    // ── Before the engine is touched ──────────────────────────────────────
    /// Input failed validation. Never triggers an engine load and never
    /// resets a loaded engine.
    #[error("Invalid input: {reason}")]
    Validation { reason: String },

    /// Configuration value out of range.
    #[error("Invalid configuration: {0}")]
    Config(String),

    // ── Engine acquisition ────────────────────────────────────────────────
    /// The rendering engine could not be acquired.
    #[error(transparent)]
    Load(#[from] LoadError),

    // ── Pipeline steps ────────────────────────────────────────────────────
    /// File content could not be read into memory.
    #[error("Failed to read file content: {detail}")]
    Read { detail: String },

    /// The engine rejected the document, or parsing timed out.
    #[error("Document is invalid or corrupt: {detail}")]
    Parse { detail: String },

    /// The document has no pages, or the requested page exceeds the count.
    #[error("Page {requested} out of range (document has {total} pages)")]
    PageCount { requested: usize, total: usize },

    /// A specific page could not be fetched from the parsed document.
    #[error("Failed to load page {page}: {detail}")]
    Page { page: usize, detail: String },

    /// Rasterisation failed or timed out.
    #[error("Failed to render page: {detail}")]
    Render { detail: String },

    /// Image encoding failed, timed out, or produced zero bytes.
    #[error("Failed to encode page image: {detail}")]
    Encode { detail: String },
}

impl ConvertError {
    /// True when the failure happened at or after engine acquisition.
    ///
    /// Validation and config failures never touched the engine, so the
    /// loader keeps its cached instance for those; everything else forces a
    /// fresh acquisition on the next attempt in case the engine is in a
    /// corrupted or partially-initialised state.
    pub fn touched_engine(&self) -> bool {
        !matches!(
            self,
            ConvertError::Validation { .. } | ConvertError::Config(_)
        )
    }
}

/// Fatal errors from the upload orchestrator.
#[derive(Debug, Error)]
pub enum UploadError {
    /// A required form field was empty.
    #[error("Missing required field: {field}")]
    MissingField { field: &'static str },

    /// The original file upload returned no stored reference.
    #[error("Failed to upload file: {detail}")]
    Upload { detail: String },

    /// The PDF-to-image conversion failed; carries the pipeline's reason.
    #[error("PDF conversion failed: {0}")]
    Conversion(#[from] ConvertError),

    /// The derived image upload returned no stored reference.
    #[error("Failed to upload converted image: {detail}")]
    ImageUpload { detail: String },

    /// Writing the record to the key-value store failed.
    #[error("Failed to persist record: {detail}")]
    Persist { detail: String },

    /// The AI service returned no response or an error.
    #[error("AI analysis failed: {detail}")]
    Analysis { detail: String },
}

/// Fatal errors from the wipe orchestrator.
///
/// Individual file-deletion failures are *not* fatal; they are reported per
/// item in [`crate::wipe::WipeReport`].
#[derive(Debug, Error)]
pub enum WipeError {
    /// The caller is not signed in.
    #[error("Not authenticated")]
    Unauthenticated,

    /// Listing stored files or records failed.
    #[error("Failed to list stored data: {detail}")]
    List { detail: String },

    /// The key-value store flush failed.
    #[error("Failed to flush key-value store: {detail}")]
    Flush { detail: String },
}
