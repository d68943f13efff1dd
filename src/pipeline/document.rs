//! Document → PDF via an injected external capability.
//!
//! Rendering a word-processor document is not something this crate does
//! itself. A [`DocumentConverter`] is handed an input `.docx` and a path for
//! the PDF; [`SofficeConverter`] implements it by shelling out to LibreOffice
//! in headless mode. Callers without LibreOffice (tests, sandboxes) inject
//! their own implementation or none at all, and the dispatcher reports
//! `CapabilityUnavailable` instead of a conversion failure.

use crate::error::DocumentError;
use std::io::Read;
use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};
use tempfile::TempDir;
use tracing::{debug, info};

/// ZIP local-file-header signature; every OOXML document starts with it.
const ZIP_MAGIC: [u8; 4] = *b"PK\x03\x04";

/// External capability that renders a document to PDF.
pub trait DocumentConverter: Send + Sync {
    /// Short name for logs and error messages.
    fn name(&self) -> &str;

    /// Render `input` to a PDF at `output`.
    ///
    /// `output` does not exist yet and its parent directory does. Return
    /// [`DocumentError::Unavailable`] when the capability itself cannot run.
    fn convert_to_pdf(&self, input: &Path, output: &Path) -> Result<(), DocumentError>;
}

/// Check that `path` starts with the ZIP signature.
///
/// Returns the first bytes read when they do not match.
pub fn check_docx_magic(path: &Path) -> std::io::Result<Result<(), [u8; 4]>> {
    let mut magic = [0u8; 4];
    let mut file = std::fs::File::open(path)?;
    let n = file.read(&mut magic)?;
    if n == 4 && magic == ZIP_MAGIC {
        Ok(Ok(()))
    } else {
        Ok(Err(magic))
    }
}

/// LibreOffice (`soffice --headless --convert-to pdf`).
#[derive(Debug, Clone)]
pub struct SofficeConverter {
    program: PathBuf,
}

impl Default for SofficeConverter {
    fn default() -> Self {
        Self::new("soffice")
    }
}

impl SofficeConverter {
    pub fn new(program: impl Into<PathBuf>) -> Self {
        Self {
            program: program.into(),
        }
    }

    pub fn program(&self) -> &Path {
        &self.program
    }
}

impl DocumentConverter for SofficeConverter {
    fn name(&self) -> &str {
        "LibreOffice"
    }

    fn convert_to_pdf(&self, input: &Path, output: &Path) -> Result<(), DocumentError> {
        // soffice picks the output name itself (<stem>.pdf inside --outdir),
        // so it renders into a private directory and the result is moved.
        let staging = TempDir::new()
            .map_err(|e| DocumentError::Failed(format!("staging directory: {e}")))?;

        info!(
            "Running {} --convert-to pdf on {}",
            self.program.display(),
            input.display()
        );
        let result = Command::new(&self.program)
            .arg("--headless")
            .arg("--convert-to")
            .arg("pdf")
            .arg("--outdir")
            .arg(staging.path())
            .arg(input)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .output();

        let out = match result {
            Ok(out) => out,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                return Err(DocumentError::Unavailable(format!(
                    "'{}' was not found. Install LibreOffice or point --soffice at it.",
                    self.program.display()
                )));
            }
            Err(e) => {
                return Err(DocumentError::Unavailable(format!(
                    "could not start '{}': {e}",
                    self.program.display()
                )));
            }
        };

        if !out.status.success() {
            let stderr = String::from_utf8_lossy(&out.stderr);
            return Err(DocumentError::Failed(format!(
                "exit code {}: {}",
                out.status.code().unwrap_or(-1),
                stderr.chars().take(2000).collect::<String>().trim()
            )));
        }

        let mut pdf_name = input.file_stem().unwrap_or_default().to_os_string();
        pdf_name.push(".pdf");
        let produced = staging.path().join(pdf_name);
        if !produced.is_file() {
            return Err(DocumentError::Failed(format!(
                "no PDF produced (stdout: {})",
                String::from_utf8_lossy(&out.stdout).trim()
            )));
        }

        debug!("Moving {} → {}", produced.display(), output.display());
        std::fs::copy(&produced, output)
            .map(|_| ())
            .map_err(|e| DocumentError::Failed(format!("copying PDF: {e}")))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_program_is_unavailable() {
        let dir = tempfile::tempdir().unwrap();
        let input = dir.path().join("a.docx");
        std::fs::write(&input, b"PK\x03\x04rest").unwrap();
        let conv = SofficeConverter::new(dir.path().join("definitely-not-soffice"));
        let err = conv
            .convert_to_pdf(&input, &dir.path().join("a.pdf"))
            .unwrap_err();
        assert!(matches!(err, DocumentError::Unavailable(_)), "{err:?}");
        assert!(!dir.path().join("a.pdf").exists());
    }

    #[test]
    fn docx_magic() {
        let dir = tempfile::tempdir().unwrap();
        let good = dir.path().join("good.docx");
        let bad = dir.path().join("bad.docx");
        let short = dir.path().join("short.docx");
        std::fs::write(&good, b"PK\x03\x04....").unwrap();
        std::fs::write(&bad, b"%PDF-1.7").unwrap();
        std::fs::write(&short, b"PK").unwrap();
        assert_eq!(check_docx_magic(&good).unwrap(), Ok(()));
        assert_eq!(check_docx_magic(&bad).unwrap(), Err(*b"%PDF"));
        assert!(check_docx_magic(&short).unwrap().is_err());
    }

    #[test]
    fn default_program_is_soffice() {
        assert_eq!(SofficeConverter::default().program(), Path::new("soffice"));
        assert_eq!(SofficeConverter::default().name(), "LibreOffice");
    }
}
