//! Upload orchestrator: drives one submission end to end.
//!
//! Sequence: upload original file → convert page 1 to a PNG → upload the
//! image → persist a record with empty feedback → request AI analysis →
//! re-persist the record with the (parsed or raw) feedback. Each stage's
//! external-call failure stops the submission with a distinct message and
//! re-enables the form for a fresh attempt; there is no automatic retry.
//!
//! Cancellation is a UI concern: [`UploadOrchestrator::cancel`] suppresses
//! further progress narration and marks the submission discarded, but
//! in-flight network calls and rasterisation run to completion in the
//! background — matching the behaviour of a user navigating away while an
//! upload finishes.

use crate::backend::{AiClient, FileStore, KvStore};
use crate::config::ConvertConfig;
use crate::convert;
use crate::error::UploadError;
use crate::loader::EngineLoader;
use crate::pipeline::input::FileData;
use crate::progress::{NoopProgress, ProgressCallback};
use crate::prompts;
use crate::record::{resume_key, FeedbackPayload, UploadRecord};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tracing::{info, warn};
use uuid::Uuid;

/// One submission's form data.
#[derive(Debug, Clone)]
pub struct UploadRequest {
    pub company_name: String,
    pub job_title: String,
    pub job_description: String,
    pub file: FileData,
}

/// The stages a submission passes through, in order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UploadStage {
    Uploading,
    Converting,
    UploadingImage,
    PersistingInitial,
    Analyzing,
    PersistingFinal,
    Done,
}

impl UploadStage {
    /// Standard status line for this stage.
    pub fn message(&self) -> &'static str {
        match self {
            UploadStage::Uploading => "Uploading file...",
            UploadStage::Converting => "Converting PDF to image...",
            UploadStage::UploadingImage => "Uploading converted image...",
            UploadStage::PersistingInitial => "Preparing analysis data...",
            UploadStage::Analyzing => "Analyzing resume with AI...",
            UploadStage::PersistingFinal => "Saving analysis results...",
            UploadStage::Done => "Analysis complete!",
        }
    }
}

/// A completed submission.
#[derive(Debug, Clone, Copy)]
pub struct Submission {
    /// Id of the persisted record; a results view is keyed by this.
    pub record_id: Uuid,
    /// True when the submission was cancelled mid-flight; the record was
    /// still persisted, but the UI has moved on and should ignore it.
    pub discarded: bool,
}

/// Sequences one submission across storage, conversion, and AI analysis.
pub struct UploadOrchestrator {
    loader: Arc<EngineLoader>,
    fs: Arc<dyn FileStore>,
    kv: Arc<dyn KvStore>,
    ai: Arc<dyn AiClient>,
    progress: ProgressCallback,
    processing: AtomicBool,
    cancelled: AtomicBool,
}

impl UploadOrchestrator {
    pub fn new(
        loader: Arc<EngineLoader>,
        fs: Arc<dyn FileStore>,
        kv: Arc<dyn KvStore>,
        ai: Arc<dyn AiClient>,
    ) -> Self {
        Self {
            loader,
            fs,
            kv,
            ai,
            progress: Arc::new(NoopProgress),
            processing: AtomicBool::new(false),
            cancelled: AtomicBool::new(false),
        }
    }

    pub fn with_progress(mut self, progress: ProgressCallback) -> Self {
        self.progress = progress;
        self
    }

    /// Best-effort engine warm-up, typically called when the form mounts so
    /// the first submission doesn't pay the download cost.
    pub async fn preload_engine(&self) -> bool {
        self.loader.preload().await
    }

    /// True while a submission is in flight.
    pub fn is_processing(&self) -> bool {
        self.processing.load(Ordering::SeqCst)
    }

    /// Stop narrating the current submission and re-enable the form.
    ///
    /// Does not abort in-flight work; its result is marked discarded.
    pub fn cancel(&self) {
        info!("Submission cancelled by user");
        self.cancelled.store(true, Ordering::SeqCst);
        self.processing.store(false, Ordering::SeqCst);
    }

    /// Run one submission to completion.
    pub async fn submit(&self, request: UploadRequest) -> Result<Submission, UploadError> {
        self.cancelled.store(false, Ordering::SeqCst);
        self.processing.store(true, Ordering::SeqCst);

        let result = self.submit_inner(&request).await;
        self.processing.store(false, Ordering::SeqCst);

        match result {
            Ok(record_id) => {
                let discarded = self.cancelled.load(Ordering::SeqCst);
                if discarded {
                    info!("Submission {record_id} completed after cancel; result discarded");
                } else {
                    self.progress.on_done(record_id);
                }
                Ok(Submission {
                    record_id,
                    discarded,
                })
            }
            Err(e) => {
                warn!("Submission failed: {e}");
                if !self.cancelled.load(Ordering::SeqCst) {
                    self.progress.on_failed(&format!("Error: {e}"));
                }
                Err(e)
            }
        }
    }

    async fn submit_inner(&self, request: &UploadRequest) -> Result<Uuid, UploadError> {
        validate_fields(request)?;

        // ── Upload original file ─────────────────────────────────────────
        self.report(UploadStage::Uploading);
        let resume = self
            .fs
            .upload(&request.file)
            .await
            .map_err(|e| UploadError::Upload { detail: e.0 })?
            .ok_or_else(|| UploadError::Upload {
                detail: "no stored reference returned".into(),
            })?;

        // ── Convert page 1 to an image ───────────────────────────────────
        self.report(UploadStage::Converting);
        let config = ConvertConfig::default(); // scale 2, quality 0.9, page 1
        let mut converted = convert::convert_page(&self.loader, &request.file, &config).await?;

        // ── Upload the derived image ─────────────────────────────────────
        self.report(UploadStage::UploadingImage);
        let image = self
            .fs
            .upload(&converted.file)
            .await
            .map_err(|e| UploadError::ImageUpload { detail: e.0 })?
            .ok_or_else(|| UploadError::ImageUpload {
                detail: "no stored reference returned".into(),
            })?;
        // Headless context: nothing displays the preview, so release the
        // bitmap buffer as soon as the upload has a copy.
        converted.image.release();

        // ── Persist the record with empty feedback ───────────────────────
        self.report(UploadStage::PersistingInitial);
        let mut record = UploadRecord {
            id: Uuid::new_v4(),
            resume_path: resume.path.clone(),
            image_path: image.path,
            company_name: request.company_name.clone(),
            job_title: request.job_title.clone(),
            job_description: request.job_description.clone(),
            feedback: FeedbackPayload::empty(),
        };
        let key = resume_key(&record.id);
        self.persist(&key, &record).await?;

        // ── AI analysis ──────────────────────────────────────────────────
        self.report(UploadStage::Analyzing);
        let instructions =
            prompts::prepare_instructions(&request.job_title, &request.job_description);
        let response = self
            .ai
            .feedback(&resume.path, &instructions)
            .await
            .map_err(|e| UploadError::Analysis { detail: e.0 })?
            .ok_or_else(|| UploadError::Analysis {
                detail: "no response received".into(),
            })?;

        record.feedback = FeedbackPayload::from_ai_text(response.message.content.text());

        // ── Re-persist under the same key ────────────────────────────────
        self.report(UploadStage::PersistingFinal);
        self.persist(&key, &record).await?;

        self.report(UploadStage::Done);
        Ok(record.id)
    }

    async fn persist(&self, key: &str, record: &UploadRecord) -> Result<(), UploadError> {
        let json = serde_json::to_string(record).map_err(|e| UploadError::Persist {
            detail: e.to_string(),
        })?;
        self.kv
            .set(key, &json)
            .await
            .map_err(|e| UploadError::Persist { detail: e.0 })
    }

    /// Narrate a stage unless the user has cancelled.
    fn report(&self, stage: UploadStage) {
        if !self.cancelled.load(Ordering::SeqCst) {
            info!("{}", stage.message());
            self.progress.on_stage(stage);
        }
    }
}

fn validate_fields(request: &UploadRequest) -> Result<(), UploadError> {
    if request.company_name.trim().is_empty() {
        return Err(UploadError::MissingField {
            field: "company name",
        });
    }
    if request.job_title.trim().is_empty() {
        return Err(UploadError::MissingField { field: "job title" });
    }
    if request.job_description.trim().is_empty() {
        return Err(UploadError::MissingField {
            field: "job description",
        });
    }
    if request.file.name.trim().is_empty() {
        return Err(UploadError::MissingField { field: "file" });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn request() -> UploadRequest {
        UploadRequest {
            company_name: "Acme".into(),
            job_title: "Engineer".into(),
            job_description: "Build".into(),
            file: FileData::new("cv.pdf", "application/pdf", vec![1]),
        }
    }

    #[test]
    fn blank_fields_are_rejected() {
        let mut r = request();
        r.company_name = "   ".into();
        assert!(matches!(
            validate_fields(&r),
            Err(UploadError::MissingField {
                field: "company name"
            })
        ));

        let mut r = request();
        r.job_description = String::new();
        assert!(validate_fields(&r).is_err());

        assert!(validate_fields(&request()).is_ok());
    }

    #[test]
    fn stage_messages_are_distinct() {
        let stages = [
            UploadStage::Uploading,
            UploadStage::Converting,
            UploadStage::UploadingImage,
            UploadStage::PersistingInitial,
            UploadStage::Analyzing,
            UploadStage::PersistingFinal,
            UploadStage::Done,
        ];
        for (i, a) in stages.iter().enumerate() {
            for b in &stages[i + 1..] {
                assert_ne!(a.message(), b.message());
            }
        }
    }
}
