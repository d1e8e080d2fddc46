//! Payload documents read from a JSON file on disk.

use std::fs;
use std::path::{Path, PathBuf};
use std::time::SystemTime;

use super::{DataSource, PayloadDocument};
use crate::error::Result;

/// Modification time and length identify one version of the file.
type Fingerprint = (Option<SystemTime>, u64);

/// Reads a payload file, re-reading it only when its fingerprint changes.
///
/// The last document that parsed is kept, so a half-written or broken
/// update never replaces good data.
#[derive(Debug)]
pub struct FileSource {
    path: PathBuf,
    label: String,
    seen: Option<Fingerprint>,
    latest: Option<PayloadDocument>,
}

impl FileSource {
    pub fn new<P: AsRef<Path>>(path: P) -> Self {
        let path = path.as_ref().to_path_buf();
        Self {
            label: format!("file: {}", path.display()),
            path,
            seen: None,
            latest: None,
        }
    }

    /// Read and parse `path` once.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<PayloadDocument> {
        let content = fs::read_to_string(path)?;
        Ok(serde_json::from_str(&content)?)
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Most recent document that parsed, if any.
    pub fn latest(&self) -> Option<&PayloadDocument> {
        self.latest.as_ref()
    }

    fn fingerprint(&self) -> Result<Fingerprint> {
        let meta = fs::metadata(&self.path)?;
        Ok((meta.modified().ok(), meta.len()))
    }
}

impl DataSource for FileSource {
    fn poll(&mut self) -> Result<Option<PayloadDocument>> {
        let fingerprint = self.fingerprint()?;
        if self.seen == Some(fingerprint) {
            return Ok(None);
        }
        // A broken version is reported once, not on every poll
        self.seen = Some(fingerprint);

        match Self::load(&self.path) {
            Ok(document) => {
                tracing::debug!(
                    path = %self.path.display(),
                    series = document.series_count(),
                    "Payload reloaded"
                );
                self.latest = Some(document.clone());
                Ok(Some(document))
            }
            Err(e) => {
                tracing::warn!(path = %self.path.display(), error = %e, "Payload rejected");
                Err(e)
            }
        }
    }

    fn description(&self) -> &str {
        &self.label
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::Error;
    use std::io::Write;

    const GOOD: &str = r#"{ "soilPH": { "unit": "pH", "history": [] } }"#;

    fn payload_file(content: &str) -> tempfile::NamedTempFile {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(content.as_bytes()).unwrap();
        file.flush().unwrap();
        file
    }

    fn rewrite(path: &Path, content: &str) {
        fs::write(path, content).unwrap();
    }

    #[test]
    fn first_poll_yields_document_then_nothing() {
        let file = payload_file(GOOD);
        let mut source = FileSource::new(file.path());

        let document = source.poll().unwrap().unwrap();
        assert_eq!(document.series_count(), 1);
        assert!(source.poll().unwrap().is_none());
        assert!(source.description().starts_with("file: "));
    }

    #[test]
    fn broken_update_keeps_last_good_document() {
        let file = payload_file(GOOD);
        let mut source = FileSource::new(file.path());
        source.poll().unwrap();

        rewrite(file.path(), "{ \"soilPH\": ");
        assert!(matches!(source.poll(), Err(Error::Serialize(_))));
        // Same broken bytes are not reported again
        assert!(source.poll().unwrap().is_none());
        assert_eq!(source.latest().map(PayloadDocument::series_count), Some(1));
    }

    #[test]
    fn recovers_when_file_is_fixed() {
        let file = payload_file("not json");
        let mut source = FileSource::new(file.path());
        assert!(source.poll().is_err());
        assert!(source.latest().is_none());

        rewrite(file.path(), r#"{ "soilPH": {}, "soilMoisture": {} }"#);
        let document = source.poll().unwrap().unwrap();
        assert_eq!(document.series_count(), 2);
        assert_eq!(source.latest(), Some(&document));
    }

    #[test]
    fn missing_file_is_an_io_error() {
        let dir = tempfile::tempdir().unwrap();
        let mut source = FileSource::new(dir.path().join("payload.json"));
        assert!(matches!(source.poll(), Err(Error::Io(_))));
        assert!(matches!(
            FileSource::load(source.path()),
            Err(Error::Io(_))
        ));
    }
}
