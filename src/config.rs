//! Configuration for a conversion.
//!
//! Conversion options themselves are fixed per format pair. What a caller
//! configures are the *collaborators*: which document-to-PDF capability to
//! use (if any) and where to send stage events.

use crate::pipeline::document::{DocumentConverter, SofficeConverter};
use crate::progress::ProgressCallback;
use std::fmt;
use std::path::PathBuf;
use std::sync::Arc;

/// Collaborators injected into the dispatcher.
///
/// Built via [`ConversionConfig::builder()`] or using
/// [`ConversionConfig::default()`].
///
/// # Example
/// ```rust
/// use fileconv::ConversionConfig;
///
/// let config = ConversionConfig::builder()
///     .soffice_program("/opt/libreoffice/program/soffice")
///     .build();
/// assert!(config.document_converter.is_some());
/// ```
#[derive(Clone)]
pub struct ConversionConfig {
    /// Document → PDF capability. `None` makes every docx conversion fail
    /// with `CapabilityUnavailable`. Default: LibreOffice on `PATH`.
    pub document_converter: Option<Arc<dyn DocumentConverter>>,

    /// Optional stage observer.
    pub progress_callback: Option<ProgressCallback>,
}

impl Default for ConversionConfig {
    fn default() -> Self {
        Self {
            document_converter: Some(Arc::new(SofficeConverter::default())),
            progress_callback: None,
        }
    }
}

impl fmt::Debug for ConversionConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ConversionConfig")
            .field(
                "document_converter",
                &self.document_converter.as_ref().map(|c| c.name().to_string()),
            )
            .field(
                "progress_callback",
                &self
                    .progress_callback
                    .as_ref()
                    .map(|_| "<dyn ConversionProgressCallback>"),
            )
            .finish()
    }
}

impl ConversionConfig {
    /// Create a new builder for `ConversionConfig`.
    pub fn builder() -> ConversionConfigBuilder {
        ConversionConfigBuilder {
            config: Self::default(),
        }
    }
}

/// Builder for [`ConversionConfig`].
#[derive(Debug)]
pub struct ConversionConfigBuilder {
    config: ConversionConfig,
}

impl ConversionConfigBuilder {
    pub fn document_converter(mut self, converter: Arc<dyn DocumentConverter>) -> Self {
        self.config.document_converter = Some(converter);
        self
    }

    /// Use LibreOffice at a specific path instead of `soffice` on `PATH`.
    pub fn soffice_program(mut self, program: impl Into<PathBuf>) -> Self {
        self.config.document_converter = Some(Arc::new(SofficeConverter::new(program)));
        self
    }

    pub fn without_document_converter(mut self) -> Self {
        self.config.document_converter = None;
        self
    }

    pub fn progress_callback(mut self, cb: ProgressCallback) -> Self {
        self.config.progress_callback = Some(cb);
        self
    }

    pub fn build(self) -> ConversionConfig {
        self.config
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::progress::NoopProgressCallback;

    #[test]
    fn default_uses_libreoffice() {
        let c = ConversionConfig::default();
        assert_eq!(c.document_converter.as_ref().map(|d| d.name()), Some("LibreOffice"));
        assert!(c.progress_callback.is_none());
    }

    #[test]
    fn builder_can_drop_capability() {
        let c = ConversionConfig::builder().without_document_converter().build();
        assert!(c.document_converter.is_none());
    }

    #[test]
    fn debug_hides_trait_objects() {
        let c = ConversionConfig::builder()
            .progress_callback(Arc::new(NoopProgressCallback))
            .build();
        let s = format!("{c:?}");
        assert!(s.contains("LibreOffice"), "{s}");
        assert!(s.contains("<dyn ConversionProgressCallback>"), "{s}");
    }
}
