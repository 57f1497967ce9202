//! Conversion outputs: the derived image file, the transient display
//! handle, and per-page outcomes for batch conversion.

use crate::error::ConvertError;
use crate::pipeline::input::FileData;

/// A transient handle to the rendered image bytes, held for display.
///
/// The handle references an in-memory bitmap encoding; whoever created it
/// must release it once it is no longer shown, or memory grows with every
/// conversion. [`ImageHandle::release`] revokes the handle explicitly;
/// dropping it has the same effect.
#[derive(Debug)]
pub struct ImageHandle {
    bytes: Option<Vec<u8>>,
}

impl ImageHandle {
    pub(crate) fn new(bytes: Vec<u8>) -> Self {
        Self { bytes: Some(bytes) }
    }

    /// The encoded image bytes, or `None` after release.
    pub fn as_bytes(&self) -> Option<&[u8]> {
        self.bytes.as_deref()
    }

    /// Byte length of the encoded image (0 after release).
    pub fn len(&self) -> usize {
        self.bytes.as_ref().map_or(0, Vec::len)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn is_released(&self) -> bool {
        self.bytes.is_none()
    }

    /// Revoke the handle, freeing the underlying buffer.
    pub fn release(&mut self) {
        self.bytes = None;
    }
}

/// A successfully converted page: the derived image file (named after the
/// original, extension replaced) plus a display handle over the same bytes.
#[derive(Debug)]
pub struct ConvertedPage {
    /// 1-indexed page number this image was rendered from.
    pub page_num: usize,
    /// Transient display handle; release when no longer shown.
    pub image: ImageHandle,
    /// Named, typed image file ready for upload.
    pub file: FileData,
}

/// One entry of a batch conversion: the attempted page and its result.
///
/// A failed page does not abort the batch; later pages still get their own
/// outcome, in page order.
#[derive(Debug)]
pub struct PageOutcome {
    /// 1-indexed page number that was attempted.
    pub page_num: usize,
    pub result: Result<ConvertedPage, ConvertError>,
}

impl PageOutcome {
    pub fn is_success(&self) -> bool {
        self.result.is_ok()
    }
}
