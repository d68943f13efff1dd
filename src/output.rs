//! Request and result types exchanged with the calling shell.

use crate::format::{Format, FormatClass};
use serde::Serialize;
use std::path::{Path, PathBuf};

/// Value a shell passes when the user has not picked a target format.
pub const NO_SELECTION: &str = "none";

/// One conversion: which file, where to, and into what.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ConversionRequest {
    pub input_path: PathBuf,
    pub output_dir: PathBuf,
    pub target_extension: String,
}

impl ConversionRequest {
    pub fn new(
        input_path: impl Into<PathBuf>,
        output_dir: impl Into<PathBuf>,
        target_extension: impl Into<String>,
    ) -> Self {
        Self {
            input_path: input_path.into(),
            output_dir: output_dir.into(),
            target_extension: target_extension.into(),
        }
    }

    /// Target extension as matched against the format table: trimmed,
    /// lowercased, one leading `.` removed.
    pub fn normalised_target(&self) -> String {
        let t = self.target_extension.trim();
        t.strip_prefix('.').unwrap_or(t).to_lowercase()
    }

    /// `{output_dir}/{input stem}.{target}`.
    pub fn output_path(&self, target: Format) -> PathBuf {
        let mut name = self
            .input_path
            .file_stem()
            .unwrap_or_default()
            .to_os_string();
        name.push(".");
        name.push(target.extension());
        self.output_dir.join(name)
    }
}

/// Successful conversion summary.
#[derive(Debug, Clone, Serialize)]
pub struct ConversionOutput {
    /// Final file path, `{output_dir}/{stem}.{target}`.
    pub output_path: PathBuf,
    pub source: Format,
    pub target: Format,
    pub class: FormatClass,
    /// Records carried through a tabular conversion.
    pub records: Option<usize>,
    /// `(width, height)` of an image conversion.
    pub dimensions: Option<(u32, u32)>,
    pub bytes_written: u64,
    pub duration_ms: u64,
}

impl ConversionOutput {
    pub fn output_path(&self) -> &Path {
        &self.output_path
    }
}

/// What a path can be converted into, without converting it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FormatInfo {
    pub extension: String,
    pub class: FormatClass,
    pub allowed_targets: Vec<&'static str>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn output_path_replaces_only_last_extension() {
        let req = ConversionRequest::new("/in/report.final.CSV", "/out", "json");
        assert_eq!(
            req.output_path(Format::Json),
            PathBuf::from("/out/report.final.json")
        );
    }

    #[test]
    fn output_path_uses_canonical_extension() {
        let req = ConversionRequest::new("/in/photo.jpeg", "/out", "JPG");
        assert_eq!(req.output_path(Format::Jpeg), PathBuf::from("/out/photo.jpg"));
    }

    #[test]
    fn target_normalisation() {
        assert_eq!(ConversionRequest::new("a", "b", " .CSV ").normalised_target(), "csv");
        assert_eq!(ConversionRequest::new("a", "b", "Yaml").normalised_target(), "yaml");
        assert_eq!(ConversionRequest::new("a", "b", "").normalised_target(), "");
    }
}
