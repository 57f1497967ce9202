//! Input validation: reject bad uploads before any engine work.
//!
//! Validation runs first so a wrong file type or an oversize upload never
//! triggers an engine download, and never resets an already-loaded engine.

use crate::error::ConvertError;
use tracing::debug;

/// Maximum accepted upload size.
pub const MAX_FILE_BYTES: usize = 50 * 1024 * 1024;

/// An uploaded or derived binary file: content plus declared identity.
#[derive(Debug, Clone)]
pub struct FileData {
    /// Original filename, extension included.
    pub name: String,
    /// Declared media type, e.g. `application/pdf`.
    pub media_type: String,
    pub bytes: Vec<u8>,
}

impl FileData {
    pub fn new(name: impl Into<String>, media_type: impl Into<String>, bytes: Vec<u8>) -> Self {
        Self {
            name: name.into(),
            media_type: media_type.into(),
            bytes,
        }
    }

    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }

    /// True when the declared type or the filename suffix identifies a PDF.
    pub fn looks_like_pdf(&self) -> bool {
        self.media_type == "application/pdf" || self.name.to_lowercase().ends_with(".pdf")
    }

    /// Filename with the extension swapped, e.g. `cv.pdf` → `cv.png`.
    pub fn with_extension(&self, ext: &str) -> String {
        let stem = match self.name.rfind('.') {
            Some(idx) if idx > 0 => &self.name[..idx],
            _ => self.name.as_str(),
        };
        format!("{stem}.{ext}")
    }
}

/// Validate an upload for conversion.
///
/// Fails when the file is not identified as a PDF, is empty, or exceeds
/// [`MAX_FILE_BYTES`].
pub fn validate(file: &FileData) -> Result<(), ConvertError> {
    if !file.looks_like_pdf() {
        return Err(ConvertError::Validation {
            reason: format!(
                "'{}' is not a PDF (declared type: {})",
                file.name, file.media_type
            ),
        });
    }
    if file.is_empty() {
        return Err(ConvertError::Validation {
            reason: format!("'{}' is empty", file.name),
        });
    }
    if file.len() > MAX_FILE_BYTES {
        return Err(ConvertError::Validation {
            reason: format!(
                "'{}' is too large ({} bytes, max {} bytes)",
                file.name,
                file.len(),
                MAX_FILE_BYTES
            ),
        });
    }

    debug!("Validated upload '{}' ({} bytes)", file.name, file.len());
    Ok(())
}
