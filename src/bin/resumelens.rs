//! CLI binary for resumelens.
//!
//! A thin shim over the library crate: converts résumé PDFs to PNG
//! previews from the terminal, with the same engine auto-download the
//! library performs.

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use indicatif::{ProgressBar, ProgressStyle};
use resumelens::engine::pdfium::{
    cached_library_path, pdfium_cache_dir, LibraryPathProbe, PdfiumFetcher, PDFIUM_VERSION,
};
use resumelens::{convert_page, convert_pages, page_count, ConvertConfig, EngineLoader, FileData};
use std::io;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;
use tracing_subscriber::EnvFilter;

// ── ANSI colour helpers (no extra deps) ──────────────────────────────────────

fn green(s: &str) -> String {
    format!("\x1b[32m{s}\x1b[0m")
}
fn red(s: &str) -> String {
    format!("\x1b[31m{s}\x1b[0m")
}
fn dim(s: &str) -> String {
    format!("\x1b[2m{s}\x1b[0m")
}
fn bold(s: &str) -> String {
    format!("\x1b[1m{s}\x1b[0m")
}

const AFTER_HELP: &str = r#"EXAMPLES:
  # Render page 1 of a résumé as a PNG next to it
  resumelens convert resume.pdf

  # Render every page (up to the 10-page cap) at 3x scale
  resumelens convert --all-pages --scale 3 resume.pdf -o previews/

  # Page count without converting anything
  resumelens inspect resume.pdf

  # Warm the engine cache ahead of first use
  resumelens preload

ENVIRONMENT VARIABLES:
  RESUMELENS_PDFIUM_PATH   Path to an existing libpdfium — skips auto-download
  RESUMELENS_CACHE_DIR     Override the default engine cache directory

SETUP:
  PDFium (~30 MB) is downloaded automatically on first run and cached in
  ~/.cache/resumelens/pdfium-7690/. No manual library setup is required.
"#;

/// Convert résumé PDFs to PNG previews.
#[derive(Parser, Debug)]
#[command(
    name = "resumelens",
    version,
    about = "Convert résumé PDFs to PNG previews",
    arg_required_else_help = true,
    after_long_help = AFTER_HELP
)]
struct Cli {
    #[command(subcommand)]
    command: Command,

    /// Enable DEBUG-level tracing logs.
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Suppress all output except errors.
    #[arg(short, long, global = true)]
    quiet: bool,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Render one page (or all pages) of a PDF as PNG files.
    Convert {
        /// Local PDF file path.
        input: PathBuf,

        /// Directory for the generated PNGs (defaults to the input's).
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Page to render (1-indexed).
        #[arg(short, long, default_value_t = 1)]
        page: usize,

        /// Render every page up to the per-document cap instead of one.
        #[arg(long, conflicts_with = "page")]
        all_pages: bool,

        /// Rendering scale factor (>= 1.0).
        #[arg(long, default_value_t = 2.0)]
        scale: f32,
    },

    /// Print a PDF's page count without converting anything.
    Inspect {
        /// Local PDF file path.
        input: PathBuf,
    },

    /// Download and cache the rendering engine ahead of first use.
    Preload,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let filter = if cli.verbose {
        "debug"
    } else if cli.quiet {
        "error"
    } else {
        "warn"
    };
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter)))
        .with_writer(io::stderr)
        .init();

    let loader = Arc::new(build_loader(cli.quiet));

    match cli.command {
        Command::Convert {
            input,
            output,
            page,
            all_pages,
            scale,
        } => run_convert(&loader, &input, output, page, all_pages, scale, cli.quiet).await,
        Command::Inspect { input } => run_inspect(&loader, &input).await,
        Command::Preload => run_preload(&loader, cli.quiet).await,
    }
}

/// Loader with a download progress bar attached when one would be visible.
fn build_loader(quiet: bool) -> EngineLoader {
    let fetcher = if quiet || cached_library_path().is_some() {
        PdfiumFetcher::new()
    } else {
        let bar = ProgressBar::new(0);
        bar.set_style(
            ProgressStyle::with_template(
                "{spinner:.cyan} {prefix:.bold}  \
                 [{bar:42.green/238}] {bytes}/{total_bytes}  ETA {eta_precise}",
            )
            .unwrap_or_else(|_| ProgressStyle::default_bar())
            .progress_chars("█▉▊▋▌▍▎▏  "),
        );
        bar.set_prefix("PDF engine");
        bar.enable_steady_tick(Duration::from_millis(80));

        PdfiumFetcher::new().with_progress(Arc::new(move |downloaded, total| {
            if let Some(t) = total {
                if bar.length().unwrap_or(0) != t {
                    bar.set_length(t);
                }
            }
            bar.set_position(downloaded);
        }))
    };

    EngineLoader::new(Arc::new(LibraryPathProbe), Arc::new(fetcher))
}

async fn run_convert(
    loader: &EngineLoader,
    input: &Path,
    output: Option<PathBuf>,
    page: usize,
    all_pages: bool,
    scale: f32,
    quiet: bool,
) -> Result<()> {
    let file = read_input(input).await?;
    let out_dir = match output {
        Some(dir) => {
            tokio::fs::create_dir_all(&dir)
                .await
                .with_context(|| format!("Failed to create {}", dir.display()))?;
            dir
        }
        None => input.parent().unwrap_or(Path::new(".")).to_path_buf(),
    };

    let config = ConvertConfig::builder()
        .scale(scale)
        .page_number(page)
        .build()
        .context("Invalid configuration")?;

    if all_pages {
        let outcomes = convert_pages(loader, &file, &config)
            .await
            .context("Conversion failed")?;

        let mut failed = 0usize;
        for outcome in &outcomes {
            match &outcome.result {
                Ok(converted) => {
                    let path = write_page(&out_dir, input, converted.page_num, converted).await?;
                    if !quiet {
                        eprintln!(
                            "  {} page {:>3}  {}",
                            green("✓"),
                            converted.page_num,
                            dim(&path.display().to_string())
                        );
                    }
                }
                Err(e) => {
                    failed += 1;
                    if !quiet {
                        eprintln!("  {} page {:>3}  {}", red("✗"), outcome.page_num, red(&e.to_string()));
                    }
                }
            }
        }

        if !quiet {
            let ok = outcomes.len() - failed;
            eprintln!(
                "{} {}/{} pages converted",
                if failed == 0 { green("✔") } else { red("✘") },
                bold(&ok.to_string()),
                outcomes.len()
            );
        }
        if failed > 0 {
            anyhow::bail!("{failed} pages failed to convert");
        }
    } else {
        let converted = convert_page(loader, &file, &config)
            .await
            .context("Conversion failed")?;
        let path = write_page(&out_dir, input, converted.page_num, &converted).await?;
        if !quiet {
            eprintln!(
                "{} page {} → {}",
                green("✔"),
                converted.page_num,
                bold(&path.display().to_string())
            );
        }
    }

    Ok(())
}

async fn run_inspect(loader: &EngineLoader, input: &Path) -> Result<()> {
    let file = read_input(input).await?;
    let pages = page_count(loader, &file, &ConvertConfig::default())
        .await
        .context("Failed to inspect PDF")?;
    println!("File:   {}", input.display());
    println!("Pages:  {pages}");
    Ok(())
}

async fn run_preload(loader: &EngineLoader, quiet: bool) -> Result<()> {
    if loader.preload().await {
        if !quiet {
            eprintln!(
                "{} engine ready in {}",
                green("✔"),
                dim(&pdfium_cache_dir().display().to_string())
            );
        }
        Ok(())
    } else {
        anyhow::bail!("Failed to acquire PDFium {PDFIUM_VERSION}");
    }
}

async fn read_input(input: &Path) -> Result<FileData> {
    let bytes = tokio::fs::read(input)
        .await
        .with_context(|| format!("Failed to read {}", input.display()))?;
    let name = input
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| "input.pdf".to_string());
    Ok(FileData::new(name, "application/pdf", bytes))
}

async fn write_page(
    out_dir: &Path,
    input: &Path,
    page_num: usize,
    converted: &resumelens::ConvertedPage,
) -> Result<PathBuf> {
    let stem = input
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| "page".to_string());
    let path = out_dir.join(format!("{stem}-p{page_num}.png"));
    let bytes = converted
        .image
        .as_bytes()
        .context("Converted image was already released")?;
    tokio::fs::write(&path, bytes)
        .await
        .with_context(|| format!("Failed to write {}", path.display()))?;
    Ok(path)
}
