//! Integration tests for the conversion pipeline against a fake engine.
//!
//! Everything here runs without pdfium: a `FakeEngine` stands in behind the
//! [`resumelens::engine`] traits so loader behaviour, validation ordering,
//! page selection, and failure isolation can be exercised deterministically.

use async_trait::async_trait;
use image::DynamicImage;
use resumelens::engine::{
    DocumentHandle, EngineError, EngineFetcher, NoProbe, PageHandle, RasterEngine,
};
use resumelens::{
    convert_page, convert_pages, ConvertConfig, ConvertError, EngineLoader, FileData, LoadError,
    MAX_FILE_BYTES,
};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

// ── Fakes ────────────────────────────────────────────────────────────────

struct FakeEngine {
    pages: usize,
    fail_render_on: Option<usize>,
}

#[async_trait]
impl RasterEngine for FakeEngine {
    async fn parse(&self, bytes: Vec<u8>) -> Result<Box<dyn DocumentHandle>, EngineError> {
        if !bytes.starts_with(b"%PDF") {
            return Err(EngineError::new("not a PDF header"));
        }
        Ok(Box::new(FakeDocument {
            pages: self.pages,
            fail_render_on: self.fail_render_on,
        }))
    }
}

struct FakeDocument {
    pages: usize,
    fail_render_on: Option<usize>,
}

#[async_trait]
impl DocumentHandle for FakeDocument {
    fn page_count(&self) -> usize {
        self.pages
    }

    async fn page(&self, number: usize) -> Result<Box<dyn PageHandle>, EngineError> {
        Ok(Box::new(FakePage {
            fail: self.fail_render_on == Some(number),
        }))
    }
}

struct FakePage {
    fail: bool,
}

#[async_trait]
impl PageHandle for FakePage {
    fn viewport(&self, scale: f32) -> (u32, u32) {
        ((80.0 * scale) as u32, (100.0 * scale) as u32)
    }

    async fn render(&self, width: u32, height: u32) -> Result<DynamicImage, EngineError> {
        if self.fail {
            return Err(EngineError::new("simulated render failure"));
        }
        Ok(DynamicImage::new_rgba8(width, height))
    }
}

struct FakeFetcher {
    fetches: AtomicUsize,
    delay: Duration,
    pages: usize,
    fail_render_on: Option<usize>,
}

impl FakeFetcher {
    fn new(pages: usize) -> Self {
        Self {
            fetches: AtomicUsize::new(0),
            delay: Duration::ZERO,
            pages,
            fail_render_on: None,
        }
    }

    fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }

    fn failing_render_on(mut self, page: usize) -> Self {
        self.fail_render_on = Some(page);
        self
    }

    fn count(&self) -> usize {
        self.fetches.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl EngineFetcher for FakeFetcher {
    async fn fetch(&self) -> Result<Arc<dyn RasterEngine>, LoadError> {
        self.fetches.fetch_add(1, Ordering::SeqCst);
        tokio::time::sleep(self.delay).await;
        Ok(Arc::new(FakeEngine {
            pages: self.pages,
            fail_render_on: self.fail_render_on,
        }))
    }
}

fn loader_with(fetcher: Arc<FakeFetcher>) -> EngineLoader {
    EngineLoader::new(Arc::new(NoProbe), fetcher)
}

fn pdf_file() -> FileData {
    FileData::new("resume.pdf", "application/pdf", b"%PDF-1.4 fake".to_vec())
}

// ── Loader behaviour ─────────────────────────────────────────────────────

#[tokio::test(start_paused = true)]
async fn concurrent_callers_share_one_engine_load() {
    let fetcher = Arc::new(FakeFetcher::new(1).with_delay(Duration::from_millis(50)));
    let loader = loader_with(Arc::clone(&fetcher));

    let (a, b, c, d) = tokio::join!(
        loader.ensure_loaded(),
        loader.ensure_loaded(),
        loader.ensure_loaded(),
        loader.ensure_loaded(),
    );
    assert!(a.is_ok() && b.is_ok() && c.is_ok() && d.is_ok());
    assert_eq!(fetcher.count(), 1);
    assert!(loader.is_ready());
}

#[tokio::test(start_paused = true)]
async fn slow_fetch_times_out_and_next_attempt_is_fresh() {
    let fetcher = Arc::new(FakeFetcher::new(1).with_delay(Duration::from_secs(60)));
    let loader =
        loader_with(Arc::clone(&fetcher)).with_load_timeout(Duration::from_millis(100));

    let err = loader.ensure_loaded().await.unwrap_err();
    assert!(matches!(err, LoadError::Timeout { .. }));

    // The failed load must not be replayed: the next call starts over.
    let err = loader.ensure_loaded().await.unwrap_err();
    assert!(matches!(err, LoadError::Timeout { .. }));
    assert_eq!(fetcher.count(), 2);
}

// ── Validation ordering ──────────────────────────────────────────────────

#[tokio::test]
async fn validation_runs_before_any_engine_load() {
    let fetcher = Arc::new(FakeFetcher::new(1));
    let loader = loader_with(Arc::clone(&fetcher));
    let config = ConvertConfig::default();

    let cases = vec![
        FileData::new("resume.pdf", "application/pdf", vec![]),
        FileData::new("notes.txt", "text/plain", b"hello".to_vec()),
        FileData::new("big.pdf", "application/pdf", vec![0u8; MAX_FILE_BYTES + 1]),
    ];
    for file in cases {
        let err = convert_page(&loader, &file, &config).await.unwrap_err();
        assert!(
            matches!(err, ConvertError::Validation { .. }),
            "expected validation error for '{}', got {err}",
            file.name
        );
    }
    assert_eq!(fetcher.count(), 0, "invalid input must never trigger a fetch");
}

#[tokio::test]
async fn validation_failure_keeps_loaded_engine_but_render_failure_resets() {
    let fetcher = Arc::new(FakeFetcher::new(1).failing_render_on(1));
    let loader = loader_with(Arc::clone(&fetcher));
    let config = ConvertConfig::default();

    loader.ensure_loaded().await.unwrap();
    assert!(loader.is_ready());

    let empty = FileData::new("resume.pdf", "application/pdf", vec![]);
    let _ = convert_page(&loader, &empty, &config).await.unwrap_err();
    assert!(loader.is_ready(), "validation must not reset the engine");

    let err = convert_page(&loader, &pdf_file(), &config).await.unwrap_err();
    assert!(matches!(err, ConvertError::Render { .. }));
    assert!(!loader.is_ready(), "render failure must force reacquisition");
    assert_eq!(fetcher.count(), 1);
}

// ── Page selection ───────────────────────────────────────────────────────

#[tokio::test]
async fn out_of_range_page_is_reported_with_the_document_total() {
    let loader = loader_with(Arc::new(FakeFetcher::new(2)));
    let config = ConvertConfig::builder().page_number(5).build().unwrap();

    let err = convert_page(&loader, &pdf_file(), &config).await.unwrap_err();
    match err {
        ConvertError::PageCount { requested, total } => {
            assert_eq!(requested, 5);
            assert_eq!(total, 2);
        }
        other => panic!("expected PageCount, got {other}"),
    }
}

#[tokio::test]
async fn batch_conversion_caps_at_max_pages_in_order() {
    let loader = loader_with(Arc::new(FakeFetcher::new(10)));
    let config = ConvertConfig::builder().max_pages(3).build().unwrap();

    let outcomes = convert_pages(&loader, &pdf_file(), &config).await.unwrap();
    let pages: Vec<usize> = outcomes.iter().map(|o| o.page_num).collect();
    assert_eq!(pages, vec![1, 2, 3]);
    assert!(outcomes.iter().all(|o| o.is_success()));
}

#[tokio::test]
async fn per_page_failure_does_not_abort_the_batch() {
    let loader = loader_with(Arc::new(FakeFetcher::new(3).failing_render_on(2)));
    let config = ConvertConfig::default();

    let outcomes = convert_pages(&loader, &pdf_file(), &config).await.unwrap();
    assert_eq!(outcomes.len(), 3);
    assert!(outcomes[0].is_success());
    assert!(!outcomes[1].is_success());
    assert!(outcomes[2].is_success());
}

// ── Output shape ─────────────────────────────────────────────────────────

#[tokio::test]
async fn converted_page_is_a_named_png() {
    let loader = loader_with(Arc::new(FakeFetcher::new(1)));
    let converted = convert_page(&loader, &pdf_file(), &ConvertConfig::default())
        .await
        .unwrap();

    assert_eq!(converted.page_num, 1);
    assert_eq!(converted.file.media_type, "image/png");
    assert_eq!(converted.file.name, "resume.png");
    let bytes = converted.image.as_bytes().unwrap();
    assert!(!bytes.is_empty());
    assert_eq!(&bytes[..8], b"\x89PNG\r\n\x1a\n");
}

#[tokio::test]
async fn released_image_reports_empty() {
    let loader = loader_with(Arc::new(FakeFetcher::new(1)));
    let mut converted = convert_page(&loader, &pdf_file(), &ConvertConfig::default())
        .await
        .unwrap();

    assert!(!converted.image.is_released());
    converted.image.release();
    assert!(converted.image.is_released());
    assert!(converted.image.as_bytes().is_none());
    assert_eq!(converted.image.len(), 0);
}
