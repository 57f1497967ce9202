//! Configuration for résumé page conversion.
//!
//! All conversion behaviour is controlled through [`ConvertConfig`], built via
//! its [`ConvertConfigBuilder`]. Keeping every knob in one struct makes it
//! trivial to share configs across call sites and to diff two runs when their
//! outputs differ.

use crate::error::ConvertError;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Configuration for converting a résumé PDF page to an image.
///
/// Built via [`ConvertConfig::builder()`] or [`ConvertConfig::default()`].
///
/// # Example
/// ```rust
/// use resumelens::ConvertConfig;
///
/// let config = ConvertConfig::builder()
///     .scale(2.0)
///     .page_number(1)
///     .build()
///     .unwrap();
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConvertConfig {
    /// Multiplier applied to the page's intrinsic size when computing pixel
    /// dimensions. Must be ≥ 1. Default: 2.0.
    ///
    /// A résumé page at its intrinsic size (~612 × 792 pt) is too coarse for
    /// readable on-screen preview; doubling it keeps body text crisp while
    /// the PNG stays comfortably under typical upload limits.
    pub scale: f32,

    /// Encoder quality in `(0, 1]`. Default: 0.9.
    ///
    /// Only meaningful for lossy targets. The current PNG target is lossless,
    /// so this value is validated and carried but does not change the output;
    /// it exists so callers don't need a config change if a lossy format is
    /// ever selected.
    pub quality: f32,

    /// 1-indexed page to convert. Default: 1 (résumés are almost always
    /// single-page; the first page is the preview).
    pub page_number: usize,

    /// Upper bound on pages attempted by [`crate::convert::convert_pages`].
    /// Default: 10.
    pub max_pages: usize,

    /// Deadline for parsing the document. Default: 20 s.
    ///
    /// The engine *acquisition* deadline is a property of the loader, not of
    /// one conversion; see [`crate::loader::EngineLoader::with_load_timeout`].
    pub parse_timeout: Duration,

    /// Deadline for rasterising one page. Default: 30 s.
    pub render_timeout: Duration,

    /// Deadline for encoding the rendered surface. Default: 10 s.
    pub encode_timeout: Duration,
}

impl Default for ConvertConfig {
    fn default() -> Self {
        Self {
            scale: 2.0,
            quality: 0.9,
            page_number: 1,
            max_pages: 10,
            parse_timeout: Duration::from_secs(20),
            render_timeout: Duration::from_secs(30),
            encode_timeout: Duration::from_secs(10),
        }
    }
}

impl ConvertConfig {
    /// Create a new builder for `ConvertConfig`.
    pub fn builder() -> ConvertConfigBuilder {
        ConvertConfigBuilder {
            config: Self::default(),
        }
    }
}

/// Builder for [`ConvertConfig`].
#[derive(Debug)]
pub struct ConvertConfigBuilder {
    config: ConvertConfig,
}

impl ConvertConfigBuilder {
    pub fn scale(mut self, scale: f32) -> Self {
        self.config.scale = scale;
        self
    }

    pub fn quality(mut self, quality: f32) -> Self {
        self.config.quality = quality;
        self
    }

    pub fn page_number(mut self, page: usize) -> Self {
        self.config.page_number = page.max(1);
        self
    }

    pub fn max_pages(mut self, n: usize) -> Self {
        self.config.max_pages = n.max(1);
        self
    }

    pub fn parse_timeout(mut self, d: Duration) -> Self {
        self.config.parse_timeout = d;
        self
    }

    pub fn render_timeout(mut self, d: Duration) -> Self {
        self.config.render_timeout = d;
        self
    }

    pub fn encode_timeout(mut self, d: Duration) -> Self {
        self.config.encode_timeout = d;
        self
    }

    /// Build the configuration, validating constraints.
    pub fn build(self) -> Result<ConvertConfig, ConvertError> {
        let c = &self.config;
        if !c.scale.is_finite() || c.scale < 1.0 {
            return Err(ConvertError::Config(format!(
                "scale must be ≥ 1, got {}",
                c.scale
            )));
        }
        if !c.quality.is_finite() || c.quality <= 0.0 || c.quality > 1.0 {
            return Err(ConvertError::Config(format!(
                "quality must be in (0, 1], got {}",
                c.quality
            )));
        }
        if c.page_number == 0 {
            return Err(ConvertError::Config("page_number must be ≥ 1".into()));
        }
        Ok(self.config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_matches_documented_values() {
        let c = ConvertConfig::default();
        assert_eq!(c.scale, 2.0);
        assert_eq!(c.quality, 0.9);
        assert_eq!(c.page_number, 1);
        assert_eq!(c.max_pages, 10);
        assert_eq!(c.parse_timeout, Duration::from_secs(20));
        assert_eq!(c.render_timeout, Duration::from_secs(30));
        assert_eq!(c.encode_timeout, Duration::from_secs(10));
    }

    #[test]
    fn builder_rejects_fractional_scale() {
        let err = ConvertConfig::builder().scale(0.5).build();
        assert!(matches!(err, Err(ConvertError::Config(_))));
    }

    #[test]
    fn builder_rejects_out_of_range_quality() {
        assert!(ConvertConfig::builder().quality(0.0).build().is_err());
        assert!(ConvertConfig::builder().quality(1.5).build().is_err());
        assert!(ConvertConfig::builder().quality(1.0).build().is_ok());
    }

    #[test]
    fn page_number_setter_clamps_to_one() {
        let c = ConvertConfig::builder().page_number(0).build().unwrap();
        assert_eq!(c.page_number, 1);
    }
}
