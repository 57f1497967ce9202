//! Pipeline stages for résumé PDF-to-image conversion.
//!
//! Each submodule implements exactly one transformation step. Keeping stages
//! separate makes each independently testable and lets us swap
//! implementations without touching other stages.
//!
//! ## Data Flow
//!
//! ```text
//! input ──▶ engine.parse ──▶ page ──▶ render ──▶ encode ──▶ package
//! (bytes)    (document)    (handle)  (bitmap)    (PNG)    (ConvertedPage)
//! ```
//!
//! 1. [`input`]  — validate the uploaded file before any engine work
//! 2. parse/page/render — engine trait calls driven by [`crate::convert`],
//!    each under its own deadline
//! 3. [`encode`] — PNG-encode the rendered surface for upload and preview

pub mod encode;
pub mod input;
