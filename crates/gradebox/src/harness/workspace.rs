//! Private scratch directory for one invocation
//!
//! Holds the driver, the submission source, the request and the report.
//! The directory is removed by [`cleanup()`](Workspace::cleanup), or when the
//! workspace is dropped.

use std::path::{Path, PathBuf};

use tempfile::TempDir;
use tracing::{debug, instrument};

use crate::harness::HarnessError;

#[derive(Debug)]
pub struct Workspace {
    dir: TempDir,
}

impl Workspace {
    /// Create a fresh, empty scratch directory
    pub fn create() -> Result<Self, HarnessError> {
        let dir = tempfile::Builder::new()
            .prefix("gradebox-")
            .tempdir()
            .map_err(HarnessError::Workspace)?;
        debug!(path = %dir.path().display(), "workspace created");
        Ok(Self { dir })
    }

    /// Get the path to the scratch directory
    pub fn path(&self) -> &Path {
        self.dir.path()
    }

    /// Get the host path to a file inside the workspace
    ///
    /// Returns an error if the path contains path traversal attempts.
    pub fn file_path(&self, name: &str) -> Result<PathBuf, HarnessError> {
        if name.is_empty() || name.contains("..") || name.starts_with('/') {
            return Err(HarnessError::InvalidPath(format!(
                "path traversal not allowed: {name}"
            )));
        }
        Ok(self.dir.path().join(name))
    }

    /// Write a file into the workspace
    #[instrument(skip(self, content))]
    pub async fn write_file(&self, name: &str, content: &[u8]) -> Result<(), HarnessError> {
        let path = self.file_path(name)?;
        tokio::fs::write(&path, content).await?;
        debug!(?path, len = content.len(), "wrote file to workspace");
        Ok(())
    }

    /// Read a file from the workspace
    #[instrument(skip(self))]
    pub async fn read_file(&self, name: &str) -> Result<Vec<u8>, HarnessError> {
        let path = self.file_path(name)?;
        let content = tokio::fs::read(&path).await?;
        debug!(?path, len = content.len(), "read file from workspace");
        Ok(content)
    }

    /// Check if a file exists in the workspace
    pub async fn file_exists(&self, name: &str) -> Result<bool, HarnessError> {
        let path = self.file_path(name)?;
        Ok(tokio::fs::try_exists(&path).await?)
    }

    /// Remove the scratch directory and everything in it
    #[must_use = "cleanup errors should be handled"]
    pub fn cleanup(self) -> Result<(), HarnessError> {
        let path = self.dir.path().to_path_buf();
        self.dir.close()?;
        debug!(path = %path.display(), "workspace removed");
        Ok(())
    }
}
