//! Conversion dispatcher.
//!
//! One call converts one file, start to finish, on the calling thread:
//!
//! ```text
//! Validating ─▶ classify ─▶ Decoding ─▶ Encoding ─▶ Done
//! ```
//!
//! Any stage may stop with a [`ConvertError`]. Validation runs before any
//! file is opened, and classification before any decoding, so an unknown
//! extension or an illegal target never touches the input's bytes. The
//! output is written through [`sink::write_atomically`], so a failure never
//! leaves a partial file at `{output_dir}/{stem}.{target}`.
//!
//! Use [`convert_async`] from an async front end to keep the conversion off
//! the executor threads.

use crate::config::ConversionConfig;
use crate::error::{ConvertError, DocumentError};
use crate::format::{classify, extension_of, Format, FormatClass};
use crate::output::{ConversionOutput, ConversionRequest, FormatInfo, NO_SELECTION};
use crate::pipeline::{document, raster, sink, tabular};
use crate::progress::Stage;
use std::path::{Path, PathBuf};
use std::time::Instant;
use tracing::{debug, info, warn};

/// Convert one file according to `request`.
///
/// # Errors
/// - `InvalidInput`: input missing or not a file, output directory missing,
///   or no target selected
/// - `UnsupportedConversion`: unknown source extension or illegal target
/// - `DecodeError`: the source cannot be parsed as its extension claims
/// - `EncodeError`: the target could not be produced or written
/// - `CapabilityUnavailable`: docx → pdf requested without a working
///   document converter
pub fn convert(
    request: &ConversionRequest,
    config: &ConversionConfig,
) -> Result<ConversionOutput, ConvertError> {
    let start = Instant::now();
    info!(
        "Starting conversion: {} → {}",
        request.input_path.display(),
        request.target_extension
    );

    let result = run(request, config, start);

    match &result {
        Ok(output) => {
            info!(
                "Conversion complete: {} ({} bytes, {}ms)",
                output.output_path.display(),
                output.bytes_written,
                output.duration_ms
            );
            notify(config, Stage::Done);
            if let Some(ref cb) = config.progress_callback {
                cb.on_complete(output);
            }
        }
        Err(e) => {
            warn!("Conversion failed ({}): {}", e.kind(), e);
            if let Some(ref cb) = config.progress_callback {
                cb.on_failure(e.kind(), &e.to_string());
            }
        }
    }
    result
}

/// Run [`convert`] on tokio's blocking pool.
pub async fn convert_async(
    request: ConversionRequest,
    config: ConversionConfig,
) -> Result<ConversionOutput, ConvertError> {
    tokio::task::spawn_blocking(move || convert(&request, &config))
        .await
        .map_err(|e| ConvertError::Internal(format!("Conversion task failed: {}", e)))?
}

/// Classify a path by extension without reading it.
///
/// This is what a shell calls after the user picks a file, to fill its list
/// of target formats. Unsupported files get an empty list.
pub fn inspect(input: impl AsRef<Path>) -> FormatInfo {
    let extension = extension_of(input.as_ref());
    let classification = classify(&extension);
    FormatInfo {
        allowed_targets: classification.target_extensions(),
        class: classification.class,
        extension,
    }
}

// ── Internal helpers ─────────────────────────────────────────────────────

fn run(
    request: &ConversionRequest,
    config: &ConversionConfig,
    start: Instant,
) -> Result<ConversionOutput, ConvertError> {
    // ── Step 1: Validate ─────────────────────────────────────────────────
    notify(config, Stage::Validating);
    let target_ext = validate(request)?;

    // ── Step 2: Classify ─────────────────────────────────────────────────
    let source_ext = extension_of(&request.input_path);
    let classification = classify(&source_ext);
    let source = classification
        .format
        .ok_or_else(|| ConvertError::UnsupportedSource {
            extension: source_ext.clone(),
        })?;
    let target = classification
        .resolve_target(&target_ext)
        .ok_or_else(|| ConvertError::UnsupportedTarget {
            source_ext: source_ext.clone(),
            target: target_ext.clone(),
            allowed: classification.target_extensions(),
        })?;
    let output_path = request.output_path(target);
    debug!(
        "Classified {} as {} ({} → {})",
        request.input_path.display(),
        classification.class,
        source,
        target
    );

    // ── Steps 3–4: Decode and encode ─────────────────────────────────────
    let pair = Pair {
        input: &request.input_path,
        output: &output_path,
        source,
        target,
    };
    let summary = match classification.class {
        FormatClass::TabularText => convert_tabular(&pair, config)?,
        FormatClass::Image => convert_image(&pair, config)?,
        FormatClass::Document => convert_document(&pair, config)?,
        FormatClass::Unsupported => {
            return Err(ConvertError::UnsupportedSource {
                extension: source_ext,
            })
        }
    };

    Ok(ConversionOutput {
        output_path,
        source,
        target,
        class: classification.class,
        records: summary.records,
        dimensions: summary.dimensions,
        bytes_written: summary.bytes_written,
        duration_ms: start.elapsed().as_millis() as u64,
    })
}

/// Check the request before any I/O beyond `stat`. Returns the normalised
/// target extension.
fn validate(request: &ConversionRequest) -> Result<String, ConvertError> {
    let input = &request.input_path;
    if input.as_os_str().is_empty() || !input.exists() {
        return Err(ConvertError::InputNotFound {
            path: input.clone(),
        });
    }
    if !input.is_file() {
        return Err(ConvertError::InputNotAFile {
            path: input.clone(),
        });
    }

    let output_dir = &request.output_dir;
    if output_dir.as_os_str().is_empty() || !output_dir.is_dir() {
        return Err(ConvertError::OutputDirNotFound {
            path: output_dir.clone(),
        });
    }

    let target = request.normalised_target();
    if target.is_empty() || target == NO_SELECTION {
        return Err(ConvertError::NoTargetSelected);
    }
    Ok(target)
}

fn notify(config: &ConversionConfig, stage: Stage) {
    debug!("Stage: {}", stage);
    if let Some(ref cb) = config.progress_callback {
        cb.on_stage(stage);
    }
}

struct Pair<'a> {
    input: &'a Path,
    output: &'a Path,
    source: Format,
    target: Format,
}

impl Pair<'_> {
    fn read_input(&self) -> Result<Vec<u8>, ConvertError> {
        std::fs::read(self.input).map_err(|e| self.decode_error(e))
    }

    fn decode_error(&self, detail: impl ToString) -> ConvertError {
        ConvertError::Decode {
            path: self.input.to_path_buf(),
            format: self.source.name(),
            detail: detail.to_string(),
        }
    }

    fn encode_error(&self, detail: impl ToString) -> ConvertError {
        ConvertError::Encode {
            path: self.output.to_path_buf(),
            format: self.target.name(),
            detail: detail.to_string(),
        }
    }
}

#[derive(Default)]
struct Summary {
    records: Option<usize>,
    dimensions: Option<(u32, u32)>,
    bytes_written: u64,
}

fn convert_tabular(pair: &Pair<'_>, config: &ConversionConfig) -> Result<Summary, ConvertError> {
    notify(config, Stage::Decoding);
    let bytes = pair.read_input()?;
    let doc = tabular::decode(&bytes, pair.source).map_err(|e| pair.decode_error(e))?;
    drop(bytes);
    debug!("Decoded {} records, {} columns", doc.len(), doc.columns().len());

    notify(config, Stage::Encoding);
    let bytes_written = sink::write_atomically(pair.output, |w| {
        tabular::encode(&doc, pair.target, w).map_err(|e| pair.encode_error(e))
    })?;

    Ok(Summary {
        records: Some(doc.len()),
        bytes_written,
        ..Summary::default()
    })
}

fn convert_image(pair: &Pair<'_>, config: &ConversionConfig) -> Result<Summary, ConvertError> {
    notify(config, Stage::Decoding);
    let bytes = pair.read_input()?;
    let image = raster::decode(&bytes, pair.source).map_err(|e| pair.decode_error(e))?;
    drop(bytes);

    notify(config, Stage::Encoding);
    let bytes_written = sink::write_atomically(pair.output, |w| {
        raster::encode(&image, pair.target, w).map_err(|e| pair.encode_error(e))
    })?;

    Ok(Summary {
        dimensions: Some((image.width(), image.height())),
        bytes_written,
        ..Summary::default()
    })
}

fn convert_document(pair: &Pair<'_>, config: &ConversionConfig) -> Result<Summary, ConvertError> {
    let converter =
        config
            .document_converter
            .as_ref()
            .ok_or_else(|| ConvertError::CapabilityUnavailable {
                capability: "Document to PDF conversion".to_string(),
                hint: "No document converter is configured.".to_string(),
            })?;

    notify(config, Stage::Decoding);
    match document::check_docx_magic(pair.input) {
        Ok(Ok(())) => {}
        Ok(Err(magic)) => {
            return Err(pair.decode_error(format!(
                "not a DOCX package (first bytes {:?})",
                magic
            )))
        }
        Err(e) => return Err(pair.decode_error(e)),
    }

    notify(config, Stage::Encoding);
    let staging = tempfile::TempDir::new().map_err(|e| ConvertError::OutputWriteFailed {
        path: pair.output.to_path_buf(),
        source: e,
    })?;
    let staged: PathBuf = staging
        .path()
        .join(pair.output.file_name().unwrap_or_default());

    converter
        .convert_to_pdf(pair.input, &staged)
        .map_err(|e| match e {
            DocumentError::Unavailable(hint) => ConvertError::CapabilityUnavailable {
                capability: converter.name().to_string(),
                hint,
            },
            DocumentError::Failed(detail) => pair.encode_error(detail),
        })?;

    let bytes_written = sink::write_atomically(pair.output, |w| {
        let mut pdf = std::fs::File::open(&staged).map_err(|e| pair.encode_error(e))?;
        std::io::copy(&mut pdf, w)
            .map(|_| ())
            .map_err(|e| ConvertError::OutputWriteFailed {
                path: pair.output.to_path_buf(),
                source: e,
            })
    })?;

    Ok(Summary {
        bytes_written,
        ..Summary::default()
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::FailureKind;
    use crate::progress::ConversionProgressCallback;
    use std::sync::{Arc, Mutex};

    fn config() -> ConversionConfig {
        ConversionConfig::builder().without_document_converter().build()
    }

    #[derive(Default)]
    struct Stages(Mutex<Vec<Stage>>);

    impl ConversionProgressCallback for Stages {
        fn on_stage(&self, stage: Stage) {
            self.0.lock().unwrap().push(stage);
        }
    }

    #[test]
    fn validate_order_input_before_target() {
        let dir = tempfile::tempdir().unwrap();
        let req = ConversionRequest::new(dir.path().join("missing.csv"), dir.path(), "");
        assert!(matches!(
            validate(&req),
            Err(ConvertError::InputNotFound { .. })
        ));
    }

    #[test]
    fn validate_rejects_directory_input() {
        let dir = tempfile::tempdir().unwrap();
        let req = ConversionRequest::new(dir.path(), dir.path(), "csv");
        assert!(matches!(
            validate(&req),
            Err(ConvertError::InputNotAFile { .. })
        ));
    }

    #[test]
    fn validate_rejects_sentinel_target() {
        let dir = tempfile::tempdir().unwrap();
        let input = dir.path().join("a.csv");
        std::fs::write(&input, "a\n1\n").unwrap();
        for target in ["", "  ", "none", "NONE", "."] {
            let req = ConversionRequest::new(&input, dir.path(), target);
            assert!(
                matches!(validate(&req), Err(ConvertError::NoTargetSelected)),
                "{target:?}"
            );
        }
    }

    #[test]
    fn validate_rejects_file_as_output_dir() {
        let dir = tempfile::tempdir().unwrap();
        let input = dir.path().join("a.csv");
        std::fs::write(&input, "a\n1\n").unwrap();
        let req = ConversionRequest::new(&input, &input, "json");
        assert!(matches!(
            validate(&req),
            Err(ConvertError::OutputDirNotFound { .. })
        ));
    }

    #[test]
    fn stages_fire_in_order() {
        let dir = tempfile::tempdir().unwrap();
        let input = dir.path().join("a.txt");
        std::fs::write(&input, "x\ny\n").unwrap();
        let stages = Arc::new(Stages::default());
        let cfg = ConversionConfig::builder()
            .progress_callback(stages.clone())
            .build();
        convert(&ConversionRequest::new(&input, dir.path(), "csv"), &cfg).unwrap();
        assert_eq!(
            *stages.0.lock().unwrap(),
            vec![
                Stage::Validating,
                Stage::Decoding,
                Stage::Encoding,
                Stage::Done
            ]
        );
    }

    #[test]
    fn unsupported_target_stops_before_decoding() {
        let dir = tempfile::tempdir().unwrap();
        let input = dir.path().join("a.png");
        std::fs::write(&input, b"not even a png").unwrap();
        let stages = Arc::new(Stages::default());
        let cfg = ConversionConfig::builder()
            .progress_callback(stages.clone())
            .build();
        let err = convert(&ConversionRequest::new(&input, dir.path(), "pdf"), &cfg).unwrap_err();
        assert_eq!(err.kind(), FailureKind::UnsupportedConversion);
        assert_eq!(*stages.0.lock().unwrap(), vec![Stage::Validating]);
    }

    #[test]
    fn docx_without_converter_is_capability_failure() {
        let dir = tempfile::tempdir().unwrap();
        let input = dir.path().join("a.docx");
        std::fs::write(&input, b"PK\x03\x04").unwrap();
        let req = ConversionRequest::new(&input, dir.path(), "pdf");
        let err = convert(&req, &config()).unwrap_err();
        assert_eq!(err.kind(), FailureKind::CapabilityUnavailable);
        assert!(!dir.path().join("a.pdf").exists());
    }

    #[test]
    fn inspect_lists_targets() {
        let info = inspect("/some/where/Sheet.XLSX");
        assert_eq!(info.extension, "xlsx");
        assert_eq!(info.class, FormatClass::TabularText);
        assert_eq!(info.allowed_targets, vec!["csv"]);

        let info = inspect("notes");
        assert_eq!(info.class, FormatClass::Unsupported);
        assert!(info.allowed_targets.is_empty());
    }
}
