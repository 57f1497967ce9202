//! Engine loader: single-flight acquisition of the rasterisation engine.
//!
//! One loader instance owns the process's engine handle. Concurrent callers
//! (a page preloading the engine while a user-triggered conversion also
//! requests it) attach to the same in-flight load instead of starting a
//! second fetch, and all of them observe the same outcome — shared success
//! or shared failure. A failed load clears the in-flight slot, so the next
//! call retries from scratch rather than replaying a cached failure.
//!
//! The loader is an ordinary owned value, not a process global: pass it by
//! shared reference (or `Arc`) to every call site. Tests instantiate one
//! loader per case with fake probes and fetchers.
//!
//! Invariant on [`LoaderState`]: either the engine is present and no load is
//! pending, or the engine is absent and at most one load is in flight.

use crate::engine::{EngineFetcher, EngineProbe, RasterEngine};
use crate::error::LoadError;
use futures::future::{BoxFuture, FutureExt, Shared};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tracing::{debug, info, warn};

type SharedLoad = Shared<BoxFuture<'static, Result<Arc<dyn RasterEngine>, LoadError>>>;

struct LoaderState {
    engine: Option<Arc<dyn RasterEngine>>,
    pending: Option<SharedLoad>,
}

/// Owns the cached engine and coordinates its acquisition.
pub struct EngineLoader {
    state: Mutex<LoaderState>,
    probe: Arc<dyn EngineProbe>,
    fetcher: Arc<dyn EngineFetcher>,
    load_timeout: Duration,
}

impl EngineLoader {
    /// Default deadline for one engine fetch.
    pub const DEFAULT_LOAD_TIMEOUT: Duration = Duration::from_secs(15);

    pub fn new(probe: Arc<dyn EngineProbe>, fetcher: Arc<dyn EngineFetcher>) -> Self {
        Self {
            state: Mutex::new(LoaderState {
                engine: None,
                pending: None,
            }),
            probe,
            fetcher,
            load_timeout: Self::DEFAULT_LOAD_TIMEOUT,
        }
    }

    /// A loader wired to the bundled pdfium probe and fetcher.
    pub fn pdfium() -> Self {
        Self::new(
            Arc::new(crate::engine::pdfium::LibraryPathProbe),
            Arc::new(crate::engine::pdfium::PdfiumFetcher::new()),
        )
    }

    pub fn with_load_timeout(mut self, timeout: Duration) -> Self {
        self.load_timeout = timeout;
        self
    }

    /// Return the engine, loading it on first use.
    ///
    /// Resolution order: cached engine → in-flight load (attach) → probe
    /// ("already available" escape hatch, no I/O) → fetch under the load
    /// deadline.
    pub async fn ensure_loaded(&self) -> Result<Arc<dyn RasterEngine>, LoadError> {
        let pending = {
            let mut state = self.state.lock().expect("loader state poisoned");

            if let Some(engine) = &state.engine {
                return Ok(Arc::clone(engine));
            }
            if let Some(pending) = &state.pending {
                debug!("Attaching to in-flight engine load");
                pending.clone()
            } else {
                if let Some(engine) = self.probe.probe() {
                    info!("Engine resolved via probe");
                    state.engine = Some(Arc::clone(&engine));
                    return Ok(engine);
                }

                let fetcher = Arc::clone(&self.fetcher);
                let timeout = self.load_timeout;
                let load = async move {
                    match tokio::time::timeout(timeout, fetcher.fetch()).await {
                        Ok(result) => result,
                        Err(_) => Err(LoadError::Timeout {
                            secs: timeout.as_secs(),
                        }),
                    }
                }
                .boxed()
                .shared();

                state.pending = Some(load.clone());
                load
            }
        };

        let outcome = pending.clone().await;

        // Only the load we attached to may clear the pending slot; a reset
        // (or a completed retry) may already have replaced it.
        let mut state = self.state.lock().expect("loader state poisoned");
        let still_ours = state
            .pending
            .as_ref()
            .map_or(false, |p| Shared::ptr_eq(p, &pending));
        if still_ours {
            state.pending = None;
            match &outcome {
                Ok(engine) => {
                    info!("Engine loaded");
                    state.engine = Some(Arc::clone(engine));
                }
                Err(e) => warn!("Engine load failed: {e}"),
            }
        }

        outcome
    }

    /// True when an engine is available without fetching: already cached on
    /// this loader, or resolvable through the probe.
    pub fn is_ready(&self) -> bool {
        if self
            .state
            .lock()
            .expect("loader state poisoned")
            .engine
            .is_some()
        {
            return true;
        }
        self.probe.probe().is_some()
    }

    /// Drop the cached engine and any in-flight load.
    ///
    /// Used after a pipeline failure so the next attempt re-acquires a fresh
    /// engine instead of reusing a possibly corrupted one.
    pub fn reset(&self) {
        let mut state = self.state.lock().expect("loader state poisoned");
        if state.engine.is_some() || state.pending.is_some() {
            debug!("Resetting engine loader state");
        }
        state.engine = None;
        state.pending = None;
    }

    /// Best-effort warm-up: load the engine, swallowing errors.
    ///
    /// Returns whether the engine is now ready.
    pub async fn preload(&self) -> bool {
        match self.ensure_loaded().await {
            Ok(_) => true,
            Err(e) => {
                warn!("Engine preload failed: {e}");
                false
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::{
        DocumentHandle, EngineError, EngineFetcher, NoProbe, PageHandle, RasterEngine,
    };
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct StubEngine;

    #[async_trait]
    impl RasterEngine for StubEngine {
        async fn parse(&self, _bytes: Vec<u8>) -> Result<Box<dyn DocumentHandle>, EngineError> {
            Err(EngineError::new("stub"))
        }
    }

    struct CountingFetcher {
        fetches: AtomicUsize,
        fail: bool,
    }

    #[async_trait]
    impl EngineFetcher for CountingFetcher {
        async fn fetch(&self) -> Result<Arc<dyn RasterEngine>, LoadError> {
            self.fetches.fetch_add(1, Ordering::SeqCst);
            if self.fail {
                Err(LoadError::Fetch {
                    detail: "simulated".into(),
                })
            } else {
                Ok(Arc::new(StubEngine))
            }
        }
    }

    struct StubProbe;

    impl EngineProbe for StubProbe {
        fn probe(&self) -> Option<Arc<dyn RasterEngine>> {
            Some(Arc::new(StubEngine))
        }
    }

    #[tokio::test]
    async fn probe_short_circuits_fetch() {
        let fetcher = Arc::new(CountingFetcher {
            fetches: AtomicUsize::new(0),
            fail: false,
        });
        let loader = EngineLoader::new(Arc::new(StubProbe), Arc::clone(&fetcher) as _);

        loader.ensure_loaded().await.unwrap();
        assert_eq!(fetcher.fetches.load(Ordering::SeqCst), 0);
        assert!(loader.is_ready());
    }

    #[tokio::test]
    async fn repeated_calls_fetch_once() {
        let fetcher = Arc::new(CountingFetcher {
            fetches: AtomicUsize::new(0),
            fail: false,
        });
        let loader = EngineLoader::new(Arc::new(NoProbe), Arc::clone(&fetcher) as _);

        loader.ensure_loaded().await.unwrap();
        loader.ensure_loaded().await.unwrap();
        loader.ensure_loaded().await.unwrap();
        assert_eq!(fetcher.fetches.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn failed_fetch_is_retried_fresh() {
        let fetcher = Arc::new(CountingFetcher {
            fetches: AtomicUsize::new(0),
            fail: true,
        });
        let loader = EngineLoader::new(Arc::new(NoProbe), Arc::clone(&fetcher) as _);

        assert!(loader.ensure_loaded().await.is_err());
        assert!(loader.ensure_loaded().await.is_err());
        // Each call after a failure starts a new fetch; nothing is poisoned.
        assert_eq!(fetcher.fetches.load(Ordering::SeqCst), 2);
        assert!(!loader.is_ready());
    }

    #[tokio::test]
    async fn reset_forces_reacquisition() {
        let fetcher = Arc::new(CountingFetcher {
            fetches: AtomicUsize::new(0),
            fail: false,
        });
        let loader = EngineLoader::new(Arc::new(NoProbe), Arc::clone(&fetcher) as _);

        loader.ensure_loaded().await.unwrap();
        loader.reset();
        assert!(!loader.is_ready());
        loader.ensure_loaded().await.unwrap();
        assert_eq!(fetcher.fetches.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn preload_swallows_errors() {
        let fetcher = Arc::new(CountingFetcher {
            fetches: AtomicUsize::new(0),
            fail: true,
        });
        let loader = EngineLoader::new(Arc::new(NoProbe), fetcher as _);
        assert!(!loader.preload().await);
    }
}
