//! Error types for the fileconv library.
//!
//! Two layers of error exist:
//!
//! * [`ConvertError`] — **Fatal**: the conversion stopped. Every variant
//!   carries the structured context (path, extension, detail) needed to build
//!   a message for the user, and maps onto exactly one [`FailureKind`] via
//!   [`ConvertError::kind`].
//!
//! * [`FailureKind`] — the coarse taxonomy a caller branches on. A UI shell
//!   shows the `Display` text of the error and picks an icon or exit code from
//!   the kind.
//!
//! Nothing is retried. The dispatcher reports the first failure it hits.

use serde::Serialize;
use std::fmt;
use std::path::PathBuf;
use thiserror::Error;

/// The category a failed conversion falls into.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum FailureKind {
    /// Missing or non-regular input file, missing output directory, or no
    /// target chosen.
    InvalidInput,
    /// Unknown source extension, or a target not allowed for the source class.
    UnsupportedConversion,
    /// The source exists but cannot be parsed as its claimed format.
    DecodeError,
    /// Decoding succeeded but producing the target file failed.
    EncodeError,
    /// An external capability (document → PDF) is not present.
    CapabilityUnavailable,
    /// The background worker running the conversion was cancelled.
    Internal,
}

impl fmt::Display for FailureKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            FailureKind::InvalidInput => "invalid input",
            FailureKind::UnsupportedConversion => "unsupported conversion",
            FailureKind::DecodeError => "decode error",
            FailureKind::EncodeError => "encode error",
            FailureKind::CapabilityUnavailable => "capability unavailable",
            FailureKind::Internal => "internal error",
        };
        f.write_str(s)
    }
}

/// All fatal errors returned by the fileconv library.
#[derive(Debug, Error)]
pub enum ConvertError {
    // ── Input errors ──────────────────────────────────────────────────────
    /// Input file was not found at the given path.
    #[error("Input file not found: '{path}'")]
    InputNotFound { path: PathBuf },

    /// Input path exists but is a directory or other non-regular file.
    #[error("Input is not a regular file: '{path}'")]
    InputNotAFile { path: PathBuf },

    /// Output directory is missing or is not a directory.
    #[error("Output folder not found: '{path}'")]
    OutputDirNotFound { path: PathBuf },

    /// Target extension was empty or the "no selection" sentinel.
    #[error("Target format not selected")]
    NoTargetSelected,

    // ── Dispatch errors ───────────────────────────────────────────────────
    /// The input extension is not in the format table.
    #[error("Unsupported source format '{extension}'")]
    UnsupportedSource { extension: String },

    /// The target extension is not legal for the source's class.
    #[error("Cannot convert '{source_ext}' to '{target}' (allowed: {})", allowed_list(.allowed))]
    UnsupportedTarget {
        source_ext: String,
        target: String,
        allowed: Vec<&'static str>,
    },

    // ── Codec errors ──────────────────────────────────────────────────────
    /// The source file could not be read as `format`.
    #[error("Failed to read '{path}' as {format}: {detail}")]
    Decode {
        path: PathBuf,
        format: &'static str,
        detail: String,
    },

    /// The intermediate representation could not be written as `format`.
    #[error("Failed to write '{path}' as {format}: {detail}")]
    Encode {
        path: PathBuf,
        format: &'static str,
        detail: String,
    },

    /// Creating, writing, or renaming the output file failed.
    #[error("Failed to write output file '{path}': {source}")]
    OutputWriteFailed {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    // ── Capability errors ─────────────────────────────────────────────────
    /// The document → PDF capability is not available in this environment.
    #[error("{capability} is not available.\n{hint}")]
    CapabilityUnavailable { capability: String, hint: String },

    // ── Catch-all ─────────────────────────────────────────────────────────
    /// The background worker was cancelled before returning.
    #[error("Internal error: {0}")]
    Internal(String),
}

impl ConvertError {
    /// The coarse failure category of this error.
    pub fn kind(&self) -> FailureKind {
        match self {
            ConvertError::InputNotFound { .. }
            | ConvertError::InputNotAFile { .. }
            | ConvertError::OutputDirNotFound { .. }
            | ConvertError::NoTargetSelected => FailureKind::InvalidInput,
            ConvertError::UnsupportedSource { .. } | ConvertError::UnsupportedTarget { .. } => {
                FailureKind::UnsupportedConversion
            }
            ConvertError::Decode { .. } => FailureKind::DecodeError,
            ConvertError::Encode { .. } | ConvertError::OutputWriteFailed { .. } => {
                FailureKind::EncodeError
            }
            ConvertError::CapabilityUnavailable { .. } => FailureKind::CapabilityUnavailable,
            ConvertError::Internal(_) => FailureKind::Internal,
        }
    }
}

fn allowed_list(allowed: &[&'static str]) -> String {
    if allowed.is_empty() {
        "none".to_string()
    } else {
        allowed.join(", ")
    }
}

/// Failure reported by a [`crate::pipeline::document::DocumentConverter`].
///
/// Kept apart from [`ConvertError`] so the dispatcher can tell a missing
/// capability from a conversion the capability attempted and failed.
#[derive(Debug, Error)]
pub enum DocumentError {
    /// The capability cannot be reached at all (binary not installed, etc.).
    #[error("{0}")]
    Unavailable(String),

    /// The capability ran but did not produce a PDF.
    #[error("{0}")]
    Failed(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn invalid_input_variants_share_kind() {
        let errs = [
            ConvertError::InputNotFound {
                path: "/nope.csv".into(),
            },
            ConvertError::InputNotAFile { path: "/tmp".into() },
            ConvertError::OutputDirNotFound {
                path: "/missing".into(),
            },
            ConvertError::NoTargetSelected,
        ];
        for e in errs {
            assert_eq!(e.kind(), FailureKind::InvalidInput, "{e}");
        }
    }

    #[test]
    fn unsupported_target_lists_allowed() {
        let e = ConvertError::UnsupportedTarget {
            source_ext: "png".into(),
            target: "pdf".into(),
            allowed: vec!["png", "jpg", "webp"],
        };
        let msg = e.to_string();
        assert!(msg.contains("png, jpg, webp"), "got: {msg}");
        assert_eq!(e.kind(), FailureKind::UnsupportedConversion);
    }

    #[test]
    fn unsupported_target_with_empty_allowed_set() {
        let e = ConvertError::UnsupportedTarget {
            source_ext: "exe".into(),
            target: "csv".into(),
            allowed: vec![],
        };
        assert!(e.to_string().contains("allowed: none"));
    }

    #[test]
    fn output_write_failure_is_encode_kind() {
        let e = ConvertError::OutputWriteFailed {
            path: "/out/a.csv".into(),
            source: std::io::Error::new(std::io::ErrorKind::PermissionDenied, "denied"),
        };
        assert_eq!(e.kind(), FailureKind::EncodeError);
        assert!(e.to_string().contains("denied"));
    }

    #[test]
    fn capability_display_includes_hint() {
        let e = ConvertError::CapabilityUnavailable {
            capability: "LibreOffice".into(),
            hint: "Install LibreOffice".into(),
        };
        assert_eq!(e.kind(), FailureKind::CapabilityUnavailable);
        assert!(e.to_string().contains("Install LibreOffice"));
    }

    #[test]
    fn failure_kind_serialises_snake_case() {
        let s = serde_json::to_string(&FailureKind::UnsupportedConversion).unwrap();
        assert_eq!(s, "\"unsupported_conversion\"");
    }
}
