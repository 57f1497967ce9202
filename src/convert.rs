//! Page conversion entry points.
//!
//! [`convert_page`] turns one page of a validated résumé PDF into a PNG
//! preview; [`convert_pages`] does the same for a bounded page range,
//! strictly one page at a time. Every step runs under its own deadline,
//! and every failure comes back as a [`ConvertError`] value — the pipeline
//! never panics past its own boundary.
//!
//! On any failure at or after engine acquisition the loader's cached engine
//! is dropped, forcing a fresh acquisition on the next attempt. Validation
//! failures never touch the loader, so a ready engine stays ready when the
//! user merely picked the wrong file.

use crate::config::ConvertConfig;
use crate::engine::DocumentHandle;
use crate::error::ConvertError;
use crate::loader::EngineLoader;
use crate::output::{ConvertedPage, ImageHandle, PageOutcome};
use crate::pipeline::{encode, input};
use std::time::Instant;
use tracing::{debug, info, warn};

/// Convert one page of a résumé PDF into a PNG preview.
///
/// Steps execute strictly in order: validate → acquire engine → read →
/// parse → page → layout → render → encode → package. The first failing
/// step determines the returned error.
pub async fn convert_page(
    loader: &EngineLoader,
    file: &input::FileData,
    config: &ConvertConfig,
) -> Result<ConvertedPage, ConvertError> {
    let start = Instant::now();
    let result = convert_page_inner(loader, file, config).await;

    match &result {
        Ok(page) => info!(
            "Converted '{}' page {} in {:?} ({} bytes)",
            file.name,
            page.page_num,
            start.elapsed(),
            page.file.len()
        ),
        Err(e) => {
            warn!("Conversion of '{}' failed: {e}", file.name);
            if e.touched_engine() {
                loader.reset();
            }
        }
    }

    result
}

async fn convert_page_inner(
    loader: &EngineLoader,
    file: &input::FileData,
    config: &ConvertConfig,
) -> Result<ConvertedPage, ConvertError> {
    let page_number = config.page_number;

    // ── Step 1: Validate input ───────────────────────────────────────────
    input::validate(file)?;

    // ── Step 2: Acquire engine ───────────────────────────────────────────
    let engine = loader.ensure_loaded().await?;

    // ── Step 3: Read bytes ───────────────────────────────────────────────
    // Content is already in memory; this re-check guards callers that built
    // a FileData by hand and skipped validation.
    if file.is_empty() {
        return Err(ConvertError::Read {
            detail: format!("'{}' has no content", file.name),
        });
    }
    let bytes = file.bytes.clone();

    // ── Step 4: Parse document ───────────────────────────────────────────
    let document = match tokio::time::timeout(config.parse_timeout, engine.parse(bytes)).await {
        Ok(Ok(doc)) => doc,
        Ok(Err(e)) => return Err(ConvertError::Parse { detail: e.0 }),
        Err(_) => {
            return Err(ConvertError::Parse {
                detail: format!("timed out after {}s", config.parse_timeout.as_secs()),
            })
        }
    };

    let total = document.page_count();
    if total == 0 || page_number > total {
        return Err(ConvertError::PageCount {
            requested: page_number,
            total,
        });
    }

    // ── Step 5: Acquire page ─────────────────────────────────────────────
    let page = document
        .page(page_number)
        .await
        .map_err(|e| ConvertError::Page {
            page: page_number,
            detail: e.0,
        })?;

    // ── Step 6: Compute layout ───────────────────────────────────────────
    let (width, height) = page.viewport(config.scale);
    debug!("Page {page_number}: viewport {width}x{height} at scale {}", config.scale);

    // ── Step 7: Rasterise ────────────────────────────────────────────────
    let surface = match tokio::time::timeout(config.render_timeout, page.render(width, height)).await
    {
        Ok(Ok(img)) => img,
        Ok(Err(e)) => return Err(ConvertError::Render { detail: e.0 }),
        Err(_) => {
            return Err(ConvertError::Render {
                detail: format!("timed out after {}s", config.render_timeout.as_secs()),
            })
        }
    };

    // ── Step 8: Encode ───────────────────────────────────────────────────
    let encode_task =
        tokio::task::spawn_blocking(move || encode::encode_page(&surface));
    let encoded = match tokio::time::timeout(config.encode_timeout, encode_task).await {
        Ok(Ok(Ok(bytes))) => bytes,
        Ok(Ok(Err(e))) => return Err(ConvertError::Encode { detail: e.0 }),
        Ok(Err(join)) => {
            return Err(ConvertError::Encode {
                detail: format!("encode task panicked: {join}"),
            })
        }
        Err(_) => {
            return Err(ConvertError::Encode {
                detail: format!("timed out after {}s", config.encode_timeout.as_secs()),
            })
        }
    };
    if encoded.is_empty() {
        return Err(ConvertError::Encode {
            detail: "encoder produced no data".into(),
        });
    }

    // ── Step 9: Package ──────────────────────────────────────────────────
    let image = ImageHandle::new(encoded.clone());
    let derived = input::FileData::new(
        file.with_extension(encode::IMAGE_EXTENSION),
        encode::IMAGE_MEDIA_TYPE,
        encoded,
    );

    Ok(ConvertedPage {
        page_num: page_number,
        image,
        file: derived,
    })
}

/// Convert pages 1..=min(page count, `max_pages`) of a résumé PDF.
///
/// Pages are processed strictly in ascending order, one at a time — the
/// rasterisation surface is not assumed reusable across concurrent calls.
/// A per-page failure is recorded in that page's [`PageOutcome`] and does
/// not abort the remaining pages.
///
/// Returns `Err` only for failures that precede any per-page work
/// (validation, engine acquisition, the initial parse).
pub async fn convert_pages(
    loader: &EngineLoader,
    file: &input::FileData,
    config: &ConvertConfig,
) -> Result<Vec<PageOutcome>, ConvertError> {
    let total = match page_count(loader, file, config).await {
        Ok(n) => n,
        Err(e) => {
            if e.touched_engine() {
                loader.reset();
            }
            return Err(e);
        }
    };

    let attempted = total.min(config.max_pages);
    info!(
        "Converting '{}': {attempted} of {total} pages",
        file.name
    );

    let mut outcomes = Vec::with_capacity(attempted);
    for page_number in 1..=attempted {
        let page_config = ConvertConfig {
            page_number,
            ..config.clone()
        };
        let result = convert_page(loader, file, &page_config).await;
        if let Err(e) = &result {
            warn!("Page {page_number} of '{}' failed: {e}", file.name);
        }
        outcomes.push(PageOutcome {
            page_num: page_number,
            result,
        });
    }

    Ok(outcomes)
}

/// Validate the file, then parse it just far enough to learn its page count.
pub async fn page_count(
    loader: &EngineLoader,
    file: &input::FileData,
    config: &ConvertConfig,
) -> Result<usize, ConvertError> {
    input::validate(file)?;
    let engine = loader.ensure_loaded().await?;

    let document: Box<dyn DocumentHandle> =
        match tokio::time::timeout(config.parse_timeout, engine.parse(file.bytes.clone())).await {
            Ok(Ok(doc)) => doc,
            Ok(Err(e)) => return Err(ConvertError::Parse { detail: e.0 }),
            Err(_) => {
                return Err(ConvertError::Parse {
                    detail: format!("timed out after {}s", config.parse_timeout.as_secs()),
                })
            }
        };

    Ok(document.page_count())
}
