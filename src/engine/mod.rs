//! Rasterisation engine capability traits.
//!
//! The conversion pipeline never talks to pdfium directly; it goes through
//! these traits so the rendering backend can be swapped (and faked in tests)
//! without touching validation, timeout, or encoding logic.
//!
//! Three objects model the engine's lifecycle:
//!
//! 1. [`RasterEngine`] — the loaded engine; parses document bytes.
//! 2. [`DocumentHandle`] — a parsed document with a known page count.
//! 3. [`PageHandle`] — one page; reports its intrinsic size and rasterises
//!    into an [`image::DynamicImage`] pixel surface.
//!
//! Two more govern how an engine is *acquired* by
//! [`crate::loader::EngineLoader`]:
//!
//! * [`EngineProbe`] — an "already available" check consulted before any
//!   network fetch (e.g. a library path supplied by the environment).
//! * [`EngineFetcher`] — the real acquisition path (download + bind).

use crate::error::LoadError;
use async_trait::async_trait;
use image::DynamicImage;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use thiserror::Error;

pub mod pdfium;

/// An engine-level operation failure, wrapped into
/// [`crate::error::ConvertError`] by the pipeline.
#[derive(Debug, Clone, Error, Serialize, Deserialize)]
#[error("{0}")]
pub struct EngineError(pub String);

impl EngineError {
    pub fn new(detail: impl Into<String>) -> Self {
        Self(detail.into())
    }
}

/// A loaded rasterisation engine.
#[async_trait]
pub trait RasterEngine: Send + Sync {
    /// Parse document bytes into a handle with a known page count.
    async fn parse(&self, bytes: Vec<u8>) -> Result<Box<dyn DocumentHandle>, EngineError>;
}

impl std::fmt::Debug for dyn RasterEngine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("dyn RasterEngine")
    }
}

/// A parsed document.
#[async_trait]
pub trait DocumentHandle: Send + Sync {
    /// Number of pages in the document.
    fn page_count(&self) -> usize;

    /// Fetch a page by 1-indexed number. The pipeline bounds-checks the
    /// number against [`Self::page_count`] before calling this.
    async fn page(&self, number: usize) -> Result<Box<dyn PageHandle>, EngineError>;
}

/// One page of a parsed document.
#[async_trait]
pub trait PageHandle: Send + Sync {
    /// Pixel dimensions of the page at the given scale, derived from the
    /// page's intrinsic size.
    fn viewport(&self, scale: f32) -> (u32, u32);

    /// Rasterise the page into a surface of exactly the given dimensions,
    /// with high-quality smoothing.
    async fn render(&self, width: u32, height: u32) -> Result<DynamicImage, EngineError>;
}

/// Checks whether an engine is already available without any I/O.
///
/// Consulted by the loader before fetching. The default
/// [`pdfium::LibraryPathProbe`] resolves an engine from an environment
/// variable or an existing on-disk cache entry.
pub trait EngineProbe: Send + Sync {
    fn probe(&self) -> Option<Arc<dyn RasterEngine>>;
}

/// A probe that never finds an engine. Useful in tests that must observe
/// every fetch.
pub struct NoProbe;

impl EngineProbe for NoProbe {
    fn probe(&self) -> Option<Arc<dyn RasterEngine>> {
        None
    }
}

/// Acquires an engine, typically by fetching a versioned binary from a fixed
/// remote location. The loader enforces its own deadline around this call,
/// so implementations do not need internal timeouts.
#[async_trait]
pub trait EngineFetcher: Send + Sync {
    async fn fetch(&self) -> Result<Arc<dyn RasterEngine>, LoadError>;
}
