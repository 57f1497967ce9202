//! Instruction strings sent to the AI feedback service.
//!
//! Centralising every prompt here serves two purposes:
//!
//! 1. **Single source of truth** — changing the analysis behaviour (e.g.
//!    adjusting a category or the strictness guidance) requires editing
//!    exactly one place.
//!
//! 2. **Testability** — unit tests can inspect the assembled instructions
//!    directly without calling the hosted service.

/// The response schema the AI is asked to fill in, expressed as the
/// interface notation the service handles most reliably. Matches the
/// deserialisation shape in [`crate::record::Feedback`].
pub const RESPONSE_FORMAT: &str = r#"interface Feedback {
  overallScore: number; // max 100
  ATS: {
    score: number; // rated for ATS suitability
    tips: {
      type: "good" | "improve";
      tip: string; // give 3-4 tips
    }[];
  };
  toneAndStyle: {
    score: number; // max 100
    tips: {
      type: "good" | "improve";
      tip: string; // short headline for the explanation
      explanation: string; // detailed explanation here
    }[]; // give 3-4 tips
  };
  content: {
    score: number; // max 100
    tips: {
      type: "good" | "improve";
      tip: string; // short headline for the explanation
      explanation: string; // detailed explanation here
    }[]; // give 3-4 tips
  };
  structure: {
    score: number; // max 100
    tips: {
      type: "good" | "improve";
      tip: string; // short headline for the explanation
      explanation: string; // detailed explanation here
    }[]; // give 3-4 tips
  };
  skills: {
    score: number; // max 100
    tips: {
      type: "good" | "improve";
      tip: string; // short headline for the explanation
      explanation: string; // detailed explanation here
    }[]; // give 3-4 tips
  };
}"#;

/// Build the analysis instructions for one submission.
///
/// The job title and description are embedded verbatim so the service can
/// tailor its scoring to the target role.
pub fn prepare_instructions(job_title: &str, job_description: &str) -> String {
    format!(
        r#"You are an expert in ATS (Applicant Tracking Systems) and resume analysis.
Analyse and rate this resume and suggest how to improve it.
The rating can be low if the resume is bad.
Be thorough and detailed. Don't hesitate to point out mistakes or areas for improvement.
If there is a lot to improve, don't hesitate to give low scores. This helps the user improve their resume.
If available, use the job description for the role the user is applying to for more detailed feedback.
If provided, take that job description into account.
The job title is: {job_title}
The job description is: {job_description}
Provide the feedback using the following format:
{RESPONSE_FORMAT}
Return the analysis as a JSON object, without any other text and without backticks.
Do not include any other text or comments."#
    )
}
