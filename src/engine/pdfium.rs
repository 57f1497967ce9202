//! Pdfium-backed rasterisation engine.
//!
//! ## Why spawn_blocking?
//!
//! `pdfium-render` wraps the pdfium C++ library, which uses thread-local
//! state internally and is not safe to call from async contexts. Every
//! pdfium operation here runs inside `tokio::task::spawn_blocking` so the
//! Tokio worker threads never stall during CPU-heavy rendering.
//!
//! ## Why rebind per operation?
//!
//! Pdfium handles are not `Send`, so a parsed document cannot travel between
//! the blocking pool and async callers. Instead [`PdfiumDocument`] keeps the
//! original bytes plus the page sizes captured at parse time, and each
//! render rebinds the library and reloads the document on the blocking
//! thread. Résumé PDFs are small (≤ 50 MiB enforced upstream), so the
//! reload cost is negligible next to rasterisation itself.
//!
//! ## Acquisition
//!
//! [`PdfiumFetcher`] downloads the versioned platform binary from the
//! [bblanchon/pdfium-binaries](https://github.com/bblanchon/pdfium-binaries)
//! GitHub release into a per-version cache directory, extracting only the
//! shared library from the `.tgz`. [`LibraryPathProbe`] short-circuits the
//! download when `RESUMELENS_PDFIUM_PATH` points at an existing library or
//! the cache is already populated.

use crate::engine::{
    DocumentHandle, EngineError, EngineFetcher, EngineProbe, PageHandle, RasterEngine,
};
use crate::error::LoadError;
use async_trait::async_trait;
use image::DynamicImage;
use pdfium_render::prelude::*;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{debug, info};

/// The pdfium-binaries release tag used for downloads.
pub const PDFIUM_VERSION: &str = "7690";

/// GitHub release base URL.
const BASE_URL: &str = "https://github.com/bblanchon/pdfium-binaries/releases/download";

/// Progress callback for the engine download: `(bytes_downloaded, total)`.
pub type FetchProgress = Arc<dyn Fn(u64, Option<u64>) + Send + Sync>;

// ── Platform metadata ────────────────────────────────────────────────────

struct PlatformInfo {
    /// Asset filename in the GitHub release, e.g. `pdfium-linux-x64.tgz`.
    archive_name: &'static str,
    /// Relative path inside the archive, e.g. `lib/libpdfium.so`.
    lib_path_in_archive: &'static str,
    /// Filename to write on disk, e.g. `libpdfium.so`.
    lib_name: &'static str,
}

fn detect_platform() -> Result<PlatformInfo, LoadError> {
    let os = std::env::consts::OS;
    let arch = std::env::consts::ARCH;

    match (os, arch) {
        ("macos", "aarch64") => Ok(PlatformInfo {
            archive_name: "pdfium-mac-arm64.tgz",
            lib_path_in_archive: "lib/libpdfium.dylib",
            lib_name: "libpdfium.dylib",
        }),
        ("macos", "x86_64") => Ok(PlatformInfo {
            archive_name: "pdfium-mac-x64.tgz",
            lib_path_in_archive: "lib/libpdfium.dylib",
            lib_name: "libpdfium.dylib",
        }),
        ("linux", "x86_64") => Ok(PlatformInfo {
            archive_name: "pdfium-linux-x64.tgz",
            lib_path_in_archive: "lib/libpdfium.so",
            lib_name: "libpdfium.so",
        }),
        ("linux", "aarch64") => Ok(PlatformInfo {
            archive_name: "pdfium-linux-arm64.tgz",
            lib_path_in_archive: "lib/libpdfium.so",
            lib_name: "libpdfium.so",
        }),
        ("windows", "x86_64") => Ok(PlatformInfo {
            archive_name: "pdfium-win-x64.tgz",
            lib_path_in_archive: "bin/pdfium.dll",
            lib_name: "pdfium.dll",
        }),
        ("windows", "aarch64") => Ok(PlatformInfo {
            archive_name: "pdfium-win-arm64.tgz",
            lib_path_in_archive: "bin/pdfium.dll",
            lib_name: "pdfium.dll",
        }),
        (os, arch) => Err(LoadError::Fetch {
            detail: format!("unsupported platform: {os}/{arch}"),
        }),
    }
}

/// Per-version cache directory for the pdfium library.
///
/// Default locations:
/// - **macOS**: `~/Library/Caches/resumelens/pdfium-{VERSION}/`
/// - **Linux**: `~/.cache/resumelens/pdfium-{VERSION}/`
/// - **Windows**: `%LOCALAPPDATA%\resumelens\pdfium-{VERSION}\`
///
/// Override by setting `RESUMELENS_CACHE_DIR`.
pub fn pdfium_cache_dir() -> PathBuf {
    if let Ok(override_dir) = std::env::var("RESUMELENS_CACHE_DIR") {
        return PathBuf::from(override_dir).join(format!("pdfium-{PDFIUM_VERSION}"));
    }

    let base = dirs::cache_dir()
        .or_else(|| dirs::home_dir().map(|h| h.join(".cache")))
        .unwrap_or_else(std::env::temp_dir);

    base.join("resumelens")
        .join(format!("pdfium-{PDFIUM_VERSION}"))
}

/// On-disk path to an already-available pdfium library, if any.
///
/// Checks `RESUMELENS_PDFIUM_PATH` first, then the cache directory.
pub fn cached_library_path() -> Option<PathBuf> {
    if let Ok(p) = std::env::var("RESUMELENS_PDFIUM_PATH") {
        let pb = PathBuf::from(p);
        if pb.exists() {
            return Some(pb);
        }
    }
    if let Ok(info) = detect_platform() {
        let p = pdfium_cache_dir().join(info.lib_name);
        if p.exists() {
            return Some(p);
        }
    }
    None
}

// ── Engine implementation ────────────────────────────────────────────────

/// A rasterisation engine bound to a pdfium shared library on disk.
pub struct PdfiumEngine {
    library_path: PathBuf,
}

impl PdfiumEngine {
    /// Wrap an existing pdfium library. Binding is validated eagerly so a
    /// broken library surfaces at acquisition time, not mid-pipeline.
    pub fn bind(library_path: impl Into<PathBuf>) -> Result<Self, EngineError> {
        let library_path = library_path.into();
        bind_library(&library_path)?;
        Ok(Self { library_path })
    }
}

/// Pdfium addresses pages by `u16`; a wider index must fail rather than
/// wrap around and render the wrong page.
fn page_index(index: usize) -> Result<u16, EngineError> {
    u16::try_from(index)
        .map_err(|_| EngineError::new(format!("page index {index} exceeds the engine's limit")))
}

fn bind_library(path: &Path) -> Result<Pdfium, EngineError> {
    Pdfium::bind_to_library(path)
        .map(Pdfium::new)
        .map_err(|e| EngineError::new(format!("bind '{}': {e}", path.display())))
}

#[async_trait]
impl RasterEngine for PdfiumEngine {
    async fn parse(&self, bytes: Vec<u8>) -> Result<Box<dyn DocumentHandle>, EngineError> {
        let path = self.library_path.clone();
        let bytes = Arc::new(bytes);
        let doc_bytes = Arc::clone(&bytes);

        // Capture the page count and each page's intrinsic size on the
        // blocking thread; the handles themselves cannot leave it.
        let sizes = tokio::task::spawn_blocking(move || -> Result<Vec<(f32, f32)>, EngineError> {
            let pdfium = bind_library(&path)?;
            let document = pdfium
                .load_pdf_from_byte_slice(&doc_bytes, None)
                .map_err(|e| EngineError::new(format!("{e:?}")))?;
            let sizes = document
                .pages()
                .iter()
                .map(|page| (page.width().value, page.height().value))
                .collect();
            Ok(sizes)
        })
        .await
        .map_err(|e| EngineError::new(format!("parse task panicked: {e}")))??;

        debug!("Parsed document: {} pages", sizes.len());

        Ok(Box::new(PdfiumDocument {
            library_path: self.library_path.clone(),
            bytes,
            sizes,
        }))
    }
}

/// A parsed document: original bytes plus page sizes captured at parse time.
struct PdfiumDocument {
    library_path: PathBuf,
    bytes: Arc<Vec<u8>>,
    sizes: Vec<(f32, f32)>,
}

#[async_trait]
impl DocumentHandle for PdfiumDocument {
    fn page_count(&self) -> usize {
        self.sizes.len()
    }

    async fn page(&self, number: usize) -> Result<Box<dyn PageHandle>, EngineError> {
        let size = self
            .sizes
            .get(number.wrapping_sub(1))
            .copied()
            .ok_or_else(|| EngineError::new(format!("page {number} unavailable")))?;
        Ok(Box::new(PdfiumPage {
            library_path: self.library_path.clone(),
            bytes: Arc::clone(&self.bytes),
            index: number - 1,
            size,
        }))
    }
}

struct PdfiumPage {
    library_path: PathBuf,
    bytes: Arc<Vec<u8>>,
    /// 0-indexed page number.
    index: usize,
    /// Intrinsic size in points.
    size: (f32, f32),
}

#[async_trait]
impl PageHandle for PdfiumPage {
    fn viewport(&self, scale: f32) -> (u32, u32) {
        let (w, h) = self.size;
        ((w * scale).round() as u32, (h * scale).round() as u32)
    }

    async fn render(&self, width: u32, height: u32) -> Result<DynamicImage, EngineError> {
        let path = self.library_path.clone();
        let bytes = Arc::clone(&self.bytes);
        let index = page_index(self.index)?;

        tokio::task::spawn_blocking(move || -> Result<DynamicImage, EngineError> {
            let pdfium = bind_library(&path)?;
            let document = pdfium
                .load_pdf_from_byte_slice(&bytes, None)
                .map_err(|e| EngineError::new(format!("{e:?}")))?;
            let page = document
                .pages()
                .get(index)
                .map_err(|e| EngineError::new(format!("{e:?}")))?;

            // Pdfium anti-aliases text and paths by default, which covers
            // the smoothing requirement for preview bitmaps.
            let render_config = PdfRenderConfig::new()
                .set_target_width(width as i32)
                .set_maximum_height(height as i32);

            let bitmap = page
                .render_with_config(&render_config)
                .map_err(|e| EngineError::new(format!("{e:?}")))?;

            let image = bitmap.as_image();
            debug!(
                "Rendered page {} → {}x{} px",
                u32::from(index) + 1,
                image.width(),
                image.height()
            );
            Ok(image)
        })
        .await
        .map_err(|e| EngineError::new(format!("render task panicked: {e}")))?
    }
}

// ── Probe ────────────────────────────────────────────────────────────────

/// Default probe: resolves an engine from the environment or the on-disk
/// cache without any network access.
pub struct LibraryPathProbe;

impl EngineProbe for LibraryPathProbe {
    fn probe(&self) -> Option<Arc<dyn RasterEngine>> {
        let path = cached_library_path()?;
        match PdfiumEngine::bind(&path) {
            Ok(engine) => {
                info!("Pdfium resolved without download: {}", path.display());
                Some(Arc::new(engine))
            }
            Err(e) => {
                tracing::warn!("Ignoring unusable pdfium at {}: {e}", path.display());
                None
            }
        }
    }
}

// ── Fetcher ──────────────────────────────────────────────────────────────

/// Downloads the platform pdfium binary and binds an engine to it.
pub struct PdfiumFetcher {
    on_progress: Option<FetchProgress>,
}

impl PdfiumFetcher {
    pub fn new() -> Self {
        Self { on_progress: None }
    }

    /// Report download progress (used by the CLI's progress bar).
    pub fn with_progress(mut self, cb: FetchProgress) -> Self {
        self.on_progress = Some(cb);
        self
    }
}

impl Default for PdfiumFetcher {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl EngineFetcher for PdfiumFetcher {
    async fn fetch(&self) -> Result<Arc<dyn RasterEngine>, LoadError> {
        // The cache may have been populated since the probe ran.
        if let Some(path) = cached_library_path() {
            return bind_fetched(&path);
        }

        let info = detect_platform()?;
        let cache_dir = pdfium_cache_dir();
        let lib_path = cache_dir.join(info.lib_name);

        let url = format!("{BASE_URL}/chromium%2F{PDFIUM_VERSION}/{}", info.archive_name);
        info!("Downloading pdfium from {url}");

        tokio::fs::create_dir_all(&cache_dir)
            .await
            .map_err(|e| LoadError::Fetch {
                detail: format!("cache dir: {e}"),
            })?;

        let archive = download_bytes(&url, self.on_progress.as_ref()).await?;

        let dest = lib_path.clone();
        let in_archive = info.lib_path_in_archive;
        tokio::task::spawn_blocking(move || extract_library(&archive, in_archive, &dest))
            .await
            .map_err(|e| LoadError::Fetch {
                detail: format!("extract task panicked: {e}"),
            })??;

        info!("Pdfium cached at {}", lib_path.display());
        bind_fetched(&lib_path)
    }
}

fn bind_fetched(path: &Path) -> Result<Arc<dyn RasterEngine>, LoadError> {
    PdfiumEngine::bind(path)
        .map(|e| Arc::new(e) as Arc<dyn RasterEngine>)
        .map_err(|e| LoadError::Fetch {
            detail: e.to_string(),
        })
}

/// Streams a URL into memory, reporting progress per chunk.
async fn download_bytes(
    url: &str,
    on_progress: Option<&FetchProgress>,
) -> Result<Vec<u8>, LoadError> {
    let client = reqwest::Client::builder()
        .user_agent(concat!("resumelens/", env!("CARGO_PKG_VERSION")))
        .redirect(reqwest::redirect::Policy::limited(5))
        .build()
        .map_err(|e| LoadError::Fetch {
            detail: e.to_string(),
        })?;

    let mut response = client.get(url).send().await.map_err(|e| LoadError::Fetch {
        detail: format!("GET {url}: {e}"),
    })?;

    if !response.status().is_success() {
        return Err(LoadError::Fetch {
            detail: format!("HTTP {} for {url}", response.status()),
        });
    }

    let total = response.content_length();
    let mut buf = Vec::with_capacity(total.unwrap_or(35 * 1024 * 1024) as usize);
    let mut downloaded: u64 = 0;

    while let Some(chunk) = response.chunk().await.map_err(|e| LoadError::Fetch {
        detail: format!("read error: {e}"),
    })? {
        buf.extend_from_slice(&chunk);
        downloaded += chunk.len() as u64;
        if let Some(cb) = on_progress {
            cb(downloaded, total);
        }
    }

    Ok(buf)
}

/// Extracts a single file from a gzipped tar archive into `dest_path`.
fn extract_library(
    archive_bytes: &[u8],
    lib_path_in_archive: &str,
    dest_path: &Path,
) -> Result<(), LoadError> {
    use flate2::read::GzDecoder;
    use tar::Archive;

    let gz = GzDecoder::new(archive_bytes);
    let mut archive = Archive::new(gz);

    for entry in archive.entries().map_err(|e| LoadError::Fetch {
        detail: e.to_string(),
    })? {
        let mut entry = entry.map_err(|e| LoadError::Fetch {
            detail: e.to_string(),
        })?;
        let entry_path = entry.path().map_err(|e| LoadError::Fetch {
            detail: e.to_string(),
        })?;

        if entry_path.to_string_lossy() == lib_path_in_archive {
            entry.unpack(dest_path).map_err(|e| LoadError::Fetch {
                detail: format!("unpack failed: {e}"),
            })?;
            return Ok(());
        }
    }

    Err(LoadError::Fetch {
        detail: format!("'{lib_path_in_archive}' not found in archive"),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn detect_platform_is_supported() {
        detect_platform().expect("current platform should be supported");
    }

    #[test]
    fn cache_dir_is_deterministic() {
        let d1 = pdfium_cache_dir();
        let d2 = pdfium_cache_dir();
        assert_eq!(d1, d2);
        assert!(d1.to_str().unwrap().contains("resumelens"));
        assert!(d1.to_str().unwrap().contains(PDFIUM_VERSION));
    }

    #[test]
    fn platform_info_fields_nonempty() {
        let info = detect_platform().unwrap();
        assert!(!info.archive_name.is_empty());
        assert!(!info.lib_path_in_archive.is_empty());
        assert!(!info.lib_name.is_empty());
    }

    /// Gzipped tar holding the given entries (path, content).
    fn gz_tar(entries: &[(&str, &[u8])]) -> Vec<u8> {
        use flate2::write::GzEncoder;
        use flate2::Compression;

        let mut tar_bytes = Vec::new();
        {
            let enc = GzEncoder::new(&mut tar_bytes, Compression::default());
            let mut builder = tar::Builder::new(enc);
            for (path, data) in entries {
                let mut header = tar::Header::new_gnu();
                header.set_size(data.len() as u64);
                header.set_cksum();
                builder.append_data(&mut header, path, *data).unwrap();
            }
            builder.into_inner().unwrap().finish().unwrap();
        }
        tar_bytes
    }

    #[test]
    fn page_index_rejects_values_past_the_engine_limit() {
        assert_eq!(page_index(0).unwrap(), 0);
        assert_eq!(page_index(u16::MAX as usize).unwrap(), u16::MAX);
        assert!(page_index(u16::MAX as usize + 1).is_err());
    }

    #[test]
    fn extract_rejects_archive_without_library() {
        let archive = gz_tar(&[("README.md", b"not a library".as_slice())]);
        let dir = tempfile::tempdir().unwrap();
        let dest = dir.path().join("libpdfium.so");

        let err = extract_library(&archive, "lib/libpdfium.so", &dest);
        assert!(err.is_err());
        assert!(!dest.exists());
    }

    #[test]
    fn extract_unpacks_only_the_library_entry() {
        let archive = gz_tar(&[
            ("LICENSE", b"ignored".as_slice()),
            ("lib/libpdfium.so", b"fake library bytes".as_slice()),
        ]);
        let dir = tempfile::tempdir().unwrap();
        let dest = dir.path().join("libpdfium.so");

        extract_library(&archive, "lib/libpdfium.so", &dest).unwrap();
        assert_eq!(std::fs::read(&dest).unwrap(), b"fake library bytes");
    }
}
