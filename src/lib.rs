//! # fileconv
//!
//! Convert a single file from one format to another.
//!
//! ## Why this crate?
//!
//! Most "convert this file" jobs are one of a handful of shapes: a table
//! moving between text formats, an image changing container, or a document
//! becoming a PDF. This crate classifies the input by extension, decodes it
//! into an in-memory form that all formats of its class share, and encodes
//! that into the chosen target. Whatever shell drives it (the bundled CLI,
//! a GUI, a service) only has to gather a request and show the result.
//!
//! ## Pipeline Overview
//!
//! ```text
//! input file
//!  │
//!  ├─ 1. Validate  input exists, output folder exists, target chosen
//!  ├─ 2. Classify  extension → class → legal targets
//!  ├─ 3. Decode    tabular / raster / (document: magic check only)
//!  ├─ 4. Encode    target codec, or the external document converter
//!  └─ 5. Sink      temp file in the output folder, renamed into place
//! ```
//!
//! ## Supported Conversions
//!
//! | Source | Class | Targets |
//! |--------|-------|---------|
//! | `txt` `csv` `json` `yaml` | tabular-text | `txt` `csv` `json` `yaml` |
//! | `xlsx` | tabular-text | `csv` |
//! | `png` `jpg` `jpeg` `webp` | image | `png` `jpg` `webp` |
//! | `docx` | document | `pdf` (needs LibreOffice or an injected converter) |
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use fileconv::{convert, ConversionConfig, ConversionRequest};
//!
//! fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let request = ConversionRequest::new("people.csv", ".", "json");
//!     let output = convert(&request, &ConversionConfig::default())?;
//!     println!("wrote {}", output.output_path.display());
//!     Ok(())
//! }
//! ```
//!
//! ## Feature Flags
//!
//! | Feature | Default | Description |
//! |---------|---------|-------------|
//! | `cli`   | on      | Enables the `fileconv` binary (clap + anyhow + tracing-subscriber + indicatif) |
//!
//! Disable `cli` when using only the library:
//! ```toml
//! fileconv = { version = "0.1", default-features = false }
//! ```

// ── Modules ──────────────────────────────────────────────────────────────

pub mod config;
pub mod convert;
pub mod error;
pub mod format;
pub mod output;
pub mod pipeline;
pub mod progress;

// ── Re-exports ───────────────────────────────────────────────────────────

pub use config::{ConversionConfig, ConversionConfigBuilder};
pub use convert::{convert, convert_async, inspect};
pub use error::{ConvertError, DocumentError, FailureKind};
pub use format::{classify, Format, FormatClass};
pub use output::{ConversionOutput, ConversionRequest, FormatInfo, NO_SELECTION};
pub use pipeline::document::{DocumentConverter, SofficeConverter};
pub use pipeline::raster::RasterImage;
pub use pipeline::tabular::{Cell, TabularDocument};
pub use progress::{ConversionProgressCallback, NoopProgressCallback, ProgressCallback, Stage};
