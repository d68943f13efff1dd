//! Conversion stages.
//!
//! Each submodule owns one concern. The dispatcher in [`crate::convert`]
//! strings them together; no stage knows about any other.
//!
//! ## Data Flow
//!
//! ```text
//!            ┌─ tabular ─▶ TabularDocument ─┐
//! input ──▶  ├─ raster  ─▶ RasterImage     ─┼──▶ sink (temp file → rename)
//!            └─ document (external capability)┘
//! ```
//!
//! 1. [`tabular`]  — txt/csv/json/yaml/xlsx decode, txt/csv/json/yaml encode
//! 2. [`raster`]   — png/jpg/webp decode and encode with colour normalisation
//! 3. [`document`] — docx → pdf through an injected [`document::DocumentConverter`]
//! 4. [`sink`]     — atomic write of the final file

pub mod document;
pub mod raster;
pub mod sink;
pub mod tabular;
