//! Destinations for finished export artifacts.

use std::fs;
use std::path::{Path, PathBuf};

use super::orchestrator::ExportArtifact;
use crate::error::Result;

/// Receives complete artifacts. Implementations never see partial bodies.
pub trait ExportSink {
    fn deliver(&mut self, artifact: &ExportArtifact) -> Result<()>;
}

/// Writes artifacts into a directory under their export filename.
///
/// The body is written to a hidden sibling first and renamed into place,
/// so a failed write never leaves a truncated file under the final name.
#[derive(Debug, Clone)]
pub struct DirectorySink {
    dir: PathBuf,
}

impl DirectorySink {
    pub fn new<P: AsRef<Path>>(dir: P) -> Self {
        Self {
            dir: dir.as_ref().to_path_buf(),
        }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Where `artifact` ends up once delivered.
    pub fn path_for(&self, artifact: &ExportArtifact) -> PathBuf {
        self.dir.join(&artifact.filename)
    }
}

impl ExportSink for DirectorySink {
    fn deliver(&mut self, artifact: &ExportArtifact) -> Result<()> {
        fs::create_dir_all(&self.dir)?;

        let target = self.path_for(artifact);
        let staging = self.dir.join(format!(".{}.partial", artifact.filename));

        if let Err(e) = fs::write(&staging, &artifact.body) {
            let _ = fs::remove_file(&staging);
            return Err(e.into());
        }
        if let Err(e) = fs::rename(&staging, &target) {
            let _ = fs::remove_file(&staging);
            return Err(e.into());
        }

        tracing::info!(path = %target.display(), bytes = artifact.body.len(), "Export written");
        Ok(())
    }
}

/// Keeps delivered artifacts in memory.
#[derive(Debug, Clone, Default)]
pub struct MemorySink {
    pub artifacts: Vec<ExportArtifact>,
}

impl ExportSink for MemorySink {
    fn deliver(&mut self, artifact: &ExportArtifact) -> Result<()> {
        self.artifacts.push(artifact.clone());
        Ok(())
    }
}
