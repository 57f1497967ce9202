//! Persisted records and the structured feedback report.
//!
//! Field names follow the persisted wire format (camelCase, `ATS` in caps):
//! records written here are byte-compatible with values already sitting in
//! the hosted key-value store, so the serde renames are load-bearing.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Build the key-value key for a record: `resume:<uuid>`.
pub fn resume_key(id: &Uuid) -> String {
    format!("resume:{id}")
}

/// Prefix matching every persisted record key.
pub const RESUME_KEY_PREFIX: &str = "resume:";

/// One submission, persisted as JSON under [`resume_key`].
///
/// Lifecycle: created with empty feedback at upload start, persisted,
/// then re-persisted under the same key after AI analysis completes —
/// an idempotent overwrite, never a second key.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UploadRecord {
    pub id: Uuid,
    pub resume_path: String,
    pub image_path: String,
    pub company_name: String,
    pub job_title: String,
    pub job_description: String,
    pub feedback: FeedbackPayload,
}

/// The record's feedback slot.
///
/// Starts empty; after analysis it holds either the parsed score report or,
/// when the AI reply was not valid JSON, the raw reply text. Keeping both
/// shapes in a tagged union forces downstream consumers to handle the raw
/// case explicitly instead of discovering a string where an object was
/// expected.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(untagged)]
pub enum FeedbackPayload {
    Parsed(Feedback),
    Raw(String),
}

impl FeedbackPayload {
    /// The initial state: an empty raw payload, matching records persisted
    /// before analysis ran.
    pub fn empty() -> Self {
        FeedbackPayload::Raw(String::new())
    }

    pub fn is_empty(&self) -> bool {
        matches!(self, FeedbackPayload::Raw(s) if s.is_empty())
    }

    /// Parse AI reply text into a structured report, falling back to the
    /// raw text when it is not valid feedback JSON. Never fails.
    pub fn from_ai_text(text: &str) -> Self {
        match serde_json::from_str::<Feedback>(text) {
            Ok(feedback) => FeedbackPayload::Parsed(feedback),
            Err(e) => {
                tracing::warn!("AI feedback was not valid JSON ({e}); storing raw text");
                FeedbackPayload::Raw(text.to_string())
            }
        }
    }
}

/// The structured scoring report: one overall score plus five categories.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Feedback {
    #[serde(rename = "overallScore")]
    pub overall_score: u8,
    #[serde(rename = "ATS")]
    pub ats: Category,
    #[serde(rename = "toneAndStyle")]
    pub tone_and_style: Category,
    pub content: Category,
    pub structure: Category,
    pub skills: Category,
}

/// One scored category with its tips.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Category {
    pub score: u8,
    pub tips: Vec<Tip>,
}

/// A single piece of advice, tagged as praise or an improvement point.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Tip {
    #[serde(rename = "type")]
    pub kind: TipKind,
    pub tip: String,
    /// Longer explanation; the ATS category's tips omit it.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub explanation: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TipKind {
    Good,
    Improve,
}
