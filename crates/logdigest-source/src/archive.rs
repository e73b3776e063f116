use std::fs::File;
use std::io::{BufReader, Read};
use std::path::{Path, PathBuf};

use parking_lot::Mutex;
use zip::ZipArchive;
use zip::result::ZipError;

use crate::{FileSource, SourceError, clean_path, decode_lines};

/// Bundle backed by a single zip archive
pub struct ZipSource {
    path: PathBuf,

    /// Reading an entry needs `&mut`, so the archive sits behind a lock
    archive: Mutex<ZipArchive<BufReader<File>>>,
}

impl ZipSource {
    /// Open the archive and read its central directory
    pub fn open(path: &Path) -> Result<Self, SourceError> {
        let file = File::open(path).map_err(|e| match e.kind() {
            std::io::ErrorKind::NotFound => SourceError::NotFound(path.display().to_string()),
            _ => SourceError::Io {
                path: path.display().to_string(),
                source: e,
            },
        })?;
        let archive = ZipArchive::new(BufReader::new(file)).map_err(|e| SourceError::Archive {
            path: path.display().to_string(),
            source: e,
        })?;
        Ok(Self {
            path: path.to_path_buf(),
            archive: Mutex::new(archive),
        })
    }
}

impl FileSource for ZipSource {
    fn list_files(&self) -> Result<Vec<String>, SourceError> {
        let archive = self.archive.lock();
        let mut files: Vec<String> = archive
            .file_names()
            .filter(|name| !name.ends_with('/'))
            .map(str::to_string)
            .collect();
        files.sort();
        Ok(files)
    }

    fn read_file(&self, path: &str) -> Result<Vec<String>, SourceError> {
        let path = clean_path(path);
        let mut archive = self.archive.lock();
        let mut entry = archive.by_name(path).map_err(|e| match e {
            ZipError::FileNotFound => SourceError::NotFound(path.to_string()),
            other => SourceError::Archive {
                path: path.to_string(),
                source: other,
            },
        })?;
        let mut bytes = Vec::new();
        entry
            .read_to_end(&mut bytes)
            .map_err(|e| SourceError::Io {
                path: path.to_string(),
                source: e,
            })?;
        Ok(decode_lines(&bytes))
    }

    fn describe(&self) -> String {
        format!("archive {}", self.path.display())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use std::io::Write;
    use zip::write::SimpleFileOptions;

    fn write_bundle(dir: &Path) -> PathBuf {
        let path = dir.join("bundle.zip");
        let mut writer = zip::ZipWriter::new(File::create(&path).unwrap());
        let options =
            SimpleFileOptions::default().compression_method(zip::CompressionMethod::Stored);
        writer.add_directory("ns1/", options).unwrap();
        writer.add_directory("ns1/compA/", options).unwrap();
        writer
            .start_file("ns1/compA/pod.worker-0.main.log", options)
            .unwrap();
        writer.write_all(b"first\n\nsecond\n").unwrap();
        writer.start_file("ns1/pod.solo.log", options).unwrap();
        writer.write_all(b"only").unwrap();
        writer.finish().unwrap();
        path
    }

    #[test]
    fn test_list_files_skips_directory_entries() {
        let dir = tempfile::tempdir().unwrap();
        let source = ZipSource::open(&write_bundle(dir.path())).unwrap();
        assert_eq!(
            source.list_files().unwrap(),
            vec![
                "ns1/compA/pod.worker-0.main.log".to_string(),
                "ns1/pod.solo.log".to_string(),
            ]
        );
    }

    #[test]
    fn test_read_file_lines() {
        let dir = tempfile::tempdir().unwrap();
        let source = ZipSource::open(&write_bundle(dir.path())).unwrap();
        assert_eq!(
            source.read_file("ns1/compA/pod.worker-0.main.log").unwrap(),
            vec!["first", "", "second"]
        );
    }

    #[test]
    fn test_read_missing_entry() {
        let dir = tempfile::tempdir().unwrap();
        let source = ZipSource::open(&write_bundle(dir.path())).unwrap();
        let err = source.read_file("ns1/missing.log").unwrap_err();
        assert!(matches!(err, SourceError::NotFound(_)));
    }

    #[test]
    fn test_open_corrupt_archive() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("broken.zip");
        std::fs::write(&path, b"not a zip").unwrap();
        assert!(matches!(
            ZipSource::open(&path),
            Err(SourceError::Archive { .. })
        ));
    }

    #[test]
    fn test_open_source_picks_zip() {
        let dir = tempfile::tempdir().unwrap();
        let source = crate::open_source(&write_bundle(dir.path())).unwrap();
        assert!(source.describe().starts_with("archive"));
    }
}
