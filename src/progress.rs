//! Progress narration for the upload orchestrator.
//!
//! Inject an `Arc<dyn UploadProgress>` via
//! [`crate::upload::UploadOrchestrator::with_progress`] to receive an event
//! at each stage of a submission. The callback approach is the
//! least-invasive integration point: callers can forward events to a status
//! line, a channel, or a websocket without the library knowing how the host
//! application communicates.
//!
//! All methods have default no-op implementations, so callers only override
//! what they care about.

use crate::upload::UploadStage;
use std::sync::Arc;
use uuid::Uuid;

/// Called by the upload orchestrator as a submission progresses.
///
/// Implementations must be `Send + Sync`; events for one submission arrive
/// in stage order from a single task.
pub trait UploadProgress: Send + Sync {
    /// Called when a stage begins. [`UploadStage::message`] provides the
    /// standard status line for display.
    fn on_stage(&self, stage: UploadStage) {
        let _ = stage;
    }

    /// Called when the submission completes, with the persisted record id
    /// a results view would be keyed by.
    fn on_done(&self, record_id: Uuid) {
        let _ = record_id;
    }

    /// Called when the submission fails; `message` is the user-facing
    /// `Error: <reason>` text.
    fn on_failed(&self, message: &str) {
        let _ = message;
    }
}

/// A no-op implementation for callers that don't need narration.
///
/// This is the default when no callback is configured.
pub struct NoopProgress;

impl UploadProgress for NoopProgress {}

/// Convenience alias matching the type stored in the orchestrator.
pub type ProgressCallback = Arc<dyn UploadProgress>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn noop_progress_does_not_panic() {
        let cb = NoopProgress;
        cb.on_stage(UploadStage::Uploading);
        cb.on_done(Uuid::nil());
        cb.on_failed("Error: something went wrong");
    }
}
