//! Format classification: extension → content class → legal targets.
//!
//! Every supported extension appears exactly once in [`FORMAT_TABLE`]. Adding
//! a format means adding a row here plus a decoder/encoder arm in the
//! matching codec; the dispatcher never branches on extension strings.

use serde::Serialize;
use std::fmt;
use std::path::Path;

/// Coarse content category that decides which targets are legal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum FormatClass {
    /// Line lists, CSV, JSON/YAML record lists and XLSX sheets.
    TabularText,
    /// Raster images.
    Image,
    /// Word-processor documents, convertible to PDF only.
    Document,
    /// Anything not in the table.
    Unsupported,
}

impl fmt::Display for FormatClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            FormatClass::TabularText => "tabular-text",
            FormatClass::Image => "image",
            FormatClass::Document => "document-to-pdf",
            FormatClass::Unsupported => "unsupported",
        };
        f.write_str(s)
    }
}

/// A concrete file format known to the converter, as a source or a target.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Format {
    Txt,
    Csv,
    Json,
    Yaml,
    Xlsx,
    Png,
    Jpeg,
    Webp,
    Docx,
    Pdf,
}

impl Format {
    /// Canonical extension written on output files.
    pub fn extension(self) -> &'static str {
        match self {
            Format::Txt => "txt",
            Format::Csv => "csv",
            Format::Json => "json",
            Format::Yaml => "yaml",
            Format::Xlsx => "xlsx",
            Format::Png => "png",
            Format::Jpeg => "jpg",
            Format::Webp => "webp",
            Format::Docx => "docx",
            Format::Pdf => "pdf",
        }
    }

    /// Human-readable name used in error messages.
    pub fn name(self) -> &'static str {
        match self {
            Format::Txt => "plain text",
            Format::Csv => "CSV",
            Format::Json => "JSON",
            Format::Yaml => "YAML",
            Format::Xlsx => "XLSX",
            Format::Png => "PNG",
            Format::Jpeg => "JPEG",
            Format::Webp => "WebP",
            Format::Docx => "DOCX",
            Format::Pdf => "PDF",
        }
    }
}

impl fmt::Display for Format {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.extension())
    }
}

/// One row of the classification table.
#[derive(Debug, Clone, Copy)]
pub struct FormatEntry {
    pub extension: &'static str,
    pub format: Format,
    pub class: FormatClass,
    pub targets: &'static [Format],
}

const TABULAR_TARGETS: &[Format] = &[Format::Txt, Format::Csv, Format::Json, Format::Yaml];
const XLSX_TARGETS: &[Format] = &[Format::Csv];
const IMAGE_TARGETS: &[Format] = &[Format::Png, Format::Jpeg, Format::Webp];
const DOCUMENT_TARGETS: &[Format] = &[Format::Pdf];

/// Source extensions and what each may become.
///
/// `xlsx` is tabular but decode-only: no row lists it as a target.
#[rustfmt::skip]
pub const FORMAT_TABLE: &[FormatEntry] = &[
    FormatEntry { extension: "txt", format: Format::Txt, class: FormatClass::TabularText, targets: TABULAR_TARGETS },
    FormatEntry { extension: "csv", format: Format::Csv, class: FormatClass::TabularText, targets: TABULAR_TARGETS },
    FormatEntry { extension: "json", format: Format::Json, class: FormatClass::TabularText, targets: TABULAR_TARGETS },
    FormatEntry { extension: "yaml", format: Format::Yaml, class: FormatClass::TabularText, targets: TABULAR_TARGETS },
    FormatEntry { extension: "xlsx", format: Format::Xlsx, class: FormatClass::TabularText, targets: XLSX_TARGETS },
    FormatEntry { extension: "png", format: Format::Png, class: FormatClass::Image, targets: IMAGE_TARGETS },
    FormatEntry { extension: "jpg", format: Format::Jpeg, class: FormatClass::Image, targets: IMAGE_TARGETS },
    FormatEntry { extension: "jpeg", format: Format::Jpeg, class: FormatClass::Image, targets: IMAGE_TARGETS },
    FormatEntry { extension: "webp", format: Format::Webp, class: FormatClass::Image, targets: IMAGE_TARGETS },
    FormatEntry { extension: "docx", format: Format::Docx, class: FormatClass::Document, targets: DOCUMENT_TARGETS },
];

/// Result of classifying a source extension.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Classification {
    /// The decoded source format, `None` when unsupported.
    pub format: Option<Format>,
    pub class: FormatClass,
    pub targets: &'static [Format],
}

impl Classification {
    /// Allowed target extensions, in table order.
    pub fn target_extensions(&self) -> Vec<&'static str> {
        self.targets.iter().map(|f| f.extension()).collect()
    }

    /// Look up `extension` among this source's allowed targets.
    ///
    /// Only canonical target extensions match, so `jpeg` is rejected as a
    /// target even though it is accepted as a source.
    pub fn resolve_target(&self, extension: &str) -> Option<Format> {
        self.targets
            .iter()
            .copied()
            .find(|f| f.extension() == extension)
    }
}

/// Classify a lowercase extension (without the leading dot).
pub fn classify(extension: &str) -> Classification {
    match FORMAT_TABLE.iter().find(|e| e.extension == extension) {
        Some(entry) => Classification {
            format: Some(entry.format),
            class: entry.class,
            targets: entry.targets,
        },
        None => Classification {
            format: None,
            class: FormatClass::Unsupported,
            targets: &[],
        },
    }
}

/// Lowercased extension of `path`, or an empty string when it has none.
pub fn extension_of(path: &Path) -> String {
    path.extension()
        .map(|e| e.to_string_lossy().to_lowercase())
        .unwrap_or_default()
}
