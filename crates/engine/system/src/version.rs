//! Persisted application version
//!
//! A plain text file named `version` in the settings directory. Line 1 holds
//! the installed version string, line 2 the optional release timestamp.
//! A missing or unreadable file reads as "no cached version".

use std::path::{Path, PathBuf};

use crate::error::FrameworkResult;
use crate::path::AppPaths;

/// File name inside the settings directory
pub const VERSION_FILE_NAME: &str = "version";

const VERSION_LINE: usize = 0;
const RELEASE_DATE_LINE: usize = 1;

/// Handle to the version file of one application
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VersionFile {
    path: PathBuf,
}

impl VersionFile {
    /// Version file for the given application identity
    ///
    /// Fails when neither an organization nor an application name is set.
    pub fn for_app(paths: &AppPaths) -> FrameworkResult<Self> {
        Ok(Self {
            path: paths.settings_file(VERSION_FILE_NAME)?,
        })
    }

    pub fn at(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Stored version, empty if none
    pub fn application_version(&self) -> String {
        self.read_line(VERSION_LINE)
    }

    /// Stored release timestamp, empty if none
    pub fn release_date(&self) -> String {
        self.read_line(RELEASE_DATE_LINE)
    }

    /// Replace line 1, creating the file if needed
    pub fn set_application_version(&self, version: &str) -> FrameworkResult<()> {
        self.write_line(VERSION_LINE, version)
    }

    /// Replace line 2, inserting an empty version line if needed
    pub fn set_release_date(&self, timestamp: &str) -> FrameworkResult<()> {
        self.write_line(RELEASE_DATE_LINE, timestamp)
    }

    fn read_lines(&self) -> Option<Vec<String>> {
        match std::fs::read_to_string(&self.path) {
            Ok(content) => Some(content.lines().map(str::to_owned).collect()),
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => None,
            Err(err) => {
                tracing::warn!(
                    "Failed to read version file {}: {}",
                    self.path.display(),
                    err
                );
                None
            }
        }
    }

    fn read_line(&self, index: usize) -> String {
        self.read_lines()
            .and_then(|mut lines| (index < lines.len()).then(|| lines.swap_remove(index)))
            .unwrap_or_default()
    }

    fn write_line(&self, index: usize, value: &str) -> FrameworkResult<()> {
        let mut lines = self.read_lines().unwrap_or_default();
        if lines.len() <= index {
            lines.resize(index + 1, String::new());
        }
        lines[index] = value.trim().to_owned();

        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(&self.path, lines.join("\n"))?;
        tracing::debug!("Wrote {} to {}", value, self.path.display());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_file_reads_empty() {
        let dir = tempfile::tempdir().unwrap();
        let file = VersionFile::at(dir.path().join("version"));
        assert_eq!(file.application_version(), "");
        assert_eq!(file.release_date(), "");
    }

    #[test]
    fn test_release_date_on_fresh_file_leaves_empty_version() {
        let dir = tempfile::tempdir().unwrap();
        let file = VersionFile::at(dir.path().join("version"));
        file.set_release_date("2021-01-02T10:34:52Z").unwrap();

        assert_eq!(file.application_version(), "");
        assert_eq!(file.release_date(), "2021-01-02T10:34:52Z");
        assert_eq!(
            std::fs::read_to_string(file.path()).unwrap(),
            "\n2021-01-02T10:34:52Z"
        );
    }

    #[test]
    fn test_version_replaces_only_first_line() {
        let dir = tempfile::tempdir().unwrap();
        let file = VersionFile::at(dir.path().join("version"));
        std::fs::write(file.path(), "v1.0\n2020-05-05T00:00:00Z").unwrap();

        file.set_application_version("v1.1").unwrap();
        assert_eq!(file.application_version(), "v1.1");
        assert_eq!(file.release_date(), "2020-05-05T00:00:00Z");
    }

    #[test]
    fn test_creates_missing_directories() {
        let dir = tempfile::tempdir().unwrap();
        let file = VersionFile::at(dir.path().join("a").join("b").join("version"));
        file.set_application_version("0.3.0").unwrap();
        assert_eq!(file.application_version(), "0.3.0");
    }
}
