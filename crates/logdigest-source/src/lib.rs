//! Log bundle readers for logdigest
//!
//! A bundle is either a plain directory tree or a single zip archive. Both are
//! exposed through the [`FileSource`] trait; [`open_source`] picks the
//! implementation once from the shape of the root path.

mod archive;
mod dir;

use std::path::{Path, PathBuf};

pub use archive::ZipSource;
pub use dir::DirSource;

/// Errors raised while opening or reading a bundle
#[derive(Debug, thiserror::Error)]
pub enum SourceError {
    #[error("file not found: {0}")]
    NotFound(String),

    #[error("failed to read {path}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to open archive {path}")]
    Archive {
        path: String,
        #[source]
        source: zip::result::ZipError,
    },

    #[error("{0} is neither a directory nor a .zip file")]
    UnsupportedRoot(PathBuf),
}

/// Read-only view over the files of a log bundle
pub trait FileSource: Send + Sync {
    /// All file paths in the bundle, relative, `/`-separated, sorted
    fn list_files(&self) -> Result<Vec<String>, SourceError>;

    /// Read a file as UTF-8 lines (invalid bytes are replaced)
    fn read_file(&self, path: &str) -> Result<Vec<String>, SourceError>;

    /// Human-readable description of the bundle root
    fn describe(&self) -> String;
}

/// Open a bundle rooted at `path`
pub fn open_source(path: &Path) -> Result<Box<dyn FileSource>, SourceError> {
    if path.is_file() && has_zip_extension(path) {
        tracing::debug!(path = %path.display(), "opening zip bundle");
        return Ok(Box::new(ZipSource::open(path)?));
    }
    if path.is_dir() {
        tracing::debug!(path = %path.display(), "opening directory bundle");
        return Ok(Box::new(DirSource::new(path)));
    }
    if !path.exists() {
        return Err(SourceError::NotFound(path.display().to_string()));
    }
    Err(SourceError::UnsupportedRoot(path.to_path_buf()))
}

fn has_zip_extension(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| ext.eq_ignore_ascii_case("zip"))
}

/// Normalize a caller-supplied relative path
fn clean_path(path: &str) -> &str {
    path.trim_end_matches('/')
}

/// Split raw file bytes into lines, decoding lossily
fn decode_lines(bytes: &[u8]) -> Vec<String> {
    String::from_utf8_lossy(bytes)
        .lines()
        .map(str::to_string)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_open_missing_root() {
        let err = open_source(Path::new("/definitely/not/here")).err().unwrap();
        assert!(matches!(err, SourceError::NotFound(_)));
    }

    #[test]
    fn test_open_plain_file_is_unsupported() {
        let dir = tempfile::tempdir().unwrap();
        let file = dir.path().join("notes.txt");
        std::fs::write(&file, "hi").unwrap();
        let err = open_source(&file).err().unwrap();
        assert!(matches!(err, SourceError::UnsupportedRoot(_)));
    }

    #[test]
    fn test_open_directory() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("pod.a.log"), "line").unwrap();
        let source = open_source(dir.path()).unwrap();
        assert_eq!(source.list_files().unwrap(), vec!["pod.a.log".to_string()]);
    }

    #[test]
    fn test_decode_lines_handles_crlf_and_invalid_utf8() {
        let lines = decode_lines(b"one\r\ntwo\n\xffthree");
        assert_eq!(lines, vec!["one", "two", "\u{FFFD}three"]);
    }

    #[test]
    fn test_clean_path_strips_trailing_slashes() {
        assert_eq!(clean_path("ns/comp//"), "ns/comp");
        assert_eq!(clean_path("pod.a.log"), "pod.a.log");
    }
}
