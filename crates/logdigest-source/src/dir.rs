use std::path::{Path, PathBuf};

use walkdir::WalkDir;

use crate::{FileSource, SourceError, clean_path, decode_lines};

/// Bundle backed by a directory tree on disk
#[derive(Clone, Debug)]
pub struct DirSource {
    root: PathBuf,
}

impl DirSource {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Convert an on-disk path to a `/`-separated path relative to the root
    fn relative(&self, path: &Path) -> Option<String> {
        let rel = path.strip_prefix(&self.root).ok()?;
        let parts: Vec<_> = rel
            .components()
            .map(|c| c.as_os_str().to_string_lossy().into_owned())
            .collect();
        Some(parts.join("/"))
    }
}

impl FileSource for DirSource {
    fn list_files(&self) -> Result<Vec<String>, SourceError> {
        let mut files = Vec::new();
        for entry in WalkDir::new(&self.root).sort_by_file_name() {
            let entry = entry.map_err(|e| SourceError::Io {
                path: e
                    .path()
                    .map(|p| p.display().to_string())
                    .unwrap_or_else(|| self.root.display().to_string()),
                source: e.into(),
            })?;
            if !entry.file_type().is_file() {
                continue;
            }
            if let Some(rel) = self.relative(entry.path()) {
                files.push(rel);
            }
        }
        files.sort();
        Ok(files)
    }

    fn read_file(&self, path: &str) -> Result<Vec<String>, SourceError> {
        let path = clean_path(path);
        let full = self.root.join(path);
        let bytes = std::fs::read(&full).map_err(|e| match e.kind() {
            std::io::ErrorKind::NotFound => SourceError::NotFound(path.to_string()),
            _ => SourceError::Io {
                path: path.to_string(),
                source: e,
            },
        })?;
        Ok(decode_lines(&bytes))
    }

    fn describe(&self) -> String {
        format!("directory {}", self.root.display())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use std::fs;

    fn bundle() -> tempfile::TempDir {
        let dir = tempfile::tempdir().unwrap();
        let comp = dir.path().join("ns1").join("compA");
        fs::create_dir_all(&comp).unwrap();
        fs::create_dir_all(dir.path().join("empty")).unwrap();
        fs::write(comp.join("pod.worker-0.main.log"), "a\n\nb\n").unwrap();
        fs::write(dir.path().join("readme.txt"), "hello").unwrap();
        dir
    }

    #[test]
    fn test_list_files_excludes_directories() {
        let dir = bundle();
        let source = DirSource::new(dir.path());
        assert_eq!(
            source.list_files().unwrap(),
            vec![
                "ns1/compA/pod.worker-0.main.log".to_string(),
                "readme.txt".to_string(),
            ]
        );
    }

    #[test]
    fn test_read_file_keeps_blank_lines() {
        let dir = bundle();
        let source = DirSource::new(dir.path());
        let lines = source.read_file("ns1/compA/pod.worker-0.main.log/").unwrap();
        assert_eq!(lines, vec!["a", "", "b"]);
    }

    #[test]
    fn test_read_missing_file() {
        let dir = bundle();
        let source = DirSource::new(dir.path());
        let err = source.read_file("nope.log").unwrap_err();
        assert!(matches!(err, SourceError::NotFound(p) if p == "nope.log"));
    }
}
