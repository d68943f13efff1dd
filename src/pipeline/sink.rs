//! Atomic output: write into a temp file beside the target, then rename.
//!
//! The temp file lives in the output directory so the final `persist` is a
//! same-filesystem rename. If the encoder fails, or the process panics, the
//! `NamedTempFile` is dropped and removed; the target path is either the old
//! file untouched or the complete new one, never a truncated mix.

use crate::error::ConvertError;
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;
use tempfile::NamedTempFile;
use tracing::debug;

/// Run `write` against a buffered temp file and move the result onto `path`.
///
/// Any pre-existing file at `path` is replaced. Returns the number of bytes
/// written.
pub fn write_atomically<F>(path: &Path, write: F) -> Result<u64, ConvertError>
where
    F: FnOnce(&mut BufWriter<&File>) -> Result<(), ConvertError>,
{
    let dir = match path.parent() {
        Some(p) if !p.as_os_str().is_empty() => p,
        _ => Path::new("."),
    };
    let io_err = |source: std::io::Error| ConvertError::OutputWriteFailed {
        path: path.to_path_buf(),
        source,
    };

    let tmp: NamedTempFile = tempfile::Builder::new()
        .prefix(".fileconv-")
        .suffix(".part")
        .tempfile_in(dir)
        .map_err(io_err)?;

    {
        let mut writer = BufWriter::new(tmp.as_file());
        write(&mut writer)?;
        writer.flush().map_err(io_err)?;
    }
    tmp.as_file().sync_all().map_err(io_err)?;
    let bytes = tmp.as_file().metadata().map_err(io_err)?.len();

    tmp.persist(path).map_err(|e| io_err(e.error))?;
    debug!("Wrote {} bytes to {}", bytes, path.display());
    Ok(bytes)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entries(dir: &Path) -> Vec<String> {
        let mut names: Vec<String> = std::fs::read_dir(dir)
            .unwrap()
            .map(|e| e.unwrap().file_name().to_string_lossy().into_owned())
            .collect();
        names.sort();
        names
    }

    #[test]
    fn writes_and_renames() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("out.txt");
        let n = write_atomically(&path, |w| {
            w.write_all(b"hello").map_err(|e| ConvertError::OutputWriteFailed {
                path: path.clone(),
                source: e,
            })
        })
        .unwrap();
        assert_eq!(n, 5);
        assert_eq!(std::fs::read_to_string(&path).unwrap(), "hello");
        assert_eq!(entries(dir.path()), vec!["out.txt"]);
    }

    #[test]
    fn replaces_existing_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("out.txt");
        std::fs::write(&path, "a much longer previous content").unwrap();
        write_atomically(&path, |w| {
            w.write_all(b"new").map_err(|e| ConvertError::OutputWriteFailed {
                path: path.clone(),
                source: e,
            })
        })
        .unwrap();
        assert_eq!(std::fs::read_to_string(&path).unwrap(), "new");
    }

    #[test]
    fn failure_leaves_nothing_behind() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("out.json");
        let err = write_atomically(&path, |w| {
            let _ = w.write_all(b"[{\"half\":");
            Err(ConvertError::Encode {
                path: path.clone(),
                format: "JSON",
                detail: "boom".into(),
            })
        })
        .unwrap_err();
        assert!(matches!(err, ConvertError::Encode { .. }));
        assert!(entries(dir.path()).is_empty());
    }

    #[test]
    fn failure_keeps_previous_target() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("out.csv");
        std::fs::write(&path, "old").unwrap();
        let _ = write_atomically(&path, |_| {
            Err(ConvertError::Encode {
                path: path.clone(),
                format: "CSV",
                detail: "boom".into(),
            })
        });
        assert_eq!(std::fs::read_to_string(&path).unwrap(), "old");
        assert_eq!(entries(dir.path()), vec!["out.csv"]);
    }

    #[test]
    fn missing_directory_is_write_failure() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nope").join("out.csv");
        let err = write_atomically(&path, |_| Ok(())).unwrap_err();
        assert!(matches!(err, ConvertError::OutputWriteFailed { .. }));
    }
}
