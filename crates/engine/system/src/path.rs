//! Per-application settings directory
//!
//! Settings live under `dirs::config_dir()/<organization>/<application>`.
//! Either name may be empty, but not both.

use std::path::{Path, PathBuf};

use crate::error::{FrameworkError, FrameworkResult};

/// Application identity used to resolve the settings directory
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AppPaths {
    organization: String,
    application: String,
    /// Overrides the platform config directory (tests, portable installs)
    base_dir: Option<PathBuf>,
}

impl AppPaths {
    pub fn new(organization: impl Into<String>, application: impl Into<String>) -> Self {
        Self {
            organization: organization.into(),
            application: application.into(),
            base_dir: None,
        }
    }

    /// Resolve relative to `base` instead of the platform config directory
    pub fn with_base_dir(mut self, base: impl Into<PathBuf>) -> Self {
        self.base_dir = Some(base.into());
        self
    }

    pub fn organization(&self) -> &str {
        &self.organization
    }

    pub fn application(&self) -> &str {
        &self.application
    }

    /// Settings directory for this application (not created)
    pub fn settings_dir(&self) -> FrameworkResult<PathBuf> {
        if self.organization.is_empty() && self.application.is_empty() {
            return Err(FrameworkError::MissingAppIdentity);
        }

        let base = match &self.base_dir {
            Some(base) => base.clone(),
            None => dirs::config_dir().ok_or(FrameworkError::NoSettingsDir)?,
        };

        Ok(join_non_empty(&base, [&self.organization, &self.application]))
    }

    /// Path of a file inside the settings directory
    pub fn settings_file(&self, name: &str) -> FrameworkResult<PathBuf> {
        Ok(self.settings_dir()?.join(name))
    }

    /// Like [`settings_dir`](Self::settings_dir), creating it if missing
    pub fn ensure_settings_dir(&self) -> FrameworkResult<PathBuf> {
        let dir = self.settings_dir()?;
        std::fs::create_dir_all(&dir)?;
        Ok(dir)
    }
}

fn join_non_empty<'a>(base: &Path, parts: impl IntoIterator<Item = &'a String>) -> PathBuf {
    parts
        .into_iter()
        .filter(|p| !p.is_empty())
        .fold(base.to_path_buf(), |path, part| path.join(part))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_settings_dir_joins_names() {
        let paths = AppPaths::new("acme", "demo").with_base_dir("/tmp/base");
        assert_eq!(
            paths.settings_dir().unwrap(),
            PathBuf::from("/tmp/base/acme/demo")
        );
        assert_eq!(
            paths.settings_file("version").unwrap(),
            PathBuf::from("/tmp/base/acme/demo/version")
        );
    }

    #[test]
    fn test_empty_organization_is_skipped() {
        let paths = AppPaths::new("", "demo").with_base_dir("/tmp/base");
        assert_eq!(
            paths.settings_dir().unwrap(),
            PathBuf::from("/tmp/base/demo")
        );
    }

    #[test]
    fn test_missing_identity() {
        let paths = AppPaths::default().with_base_dir("/tmp/base");
        assert!(matches!(
            paths.settings_dir(),
            Err(FrameworkError::MissingAppIdentity)
        ));
    }

    #[test]
    fn test_ensure_creates_directory() {
        let dir = tempfile::tempdir().unwrap();
        let paths = AppPaths::new("acme", "demo").with_base_dir(dir.path());
        let created = paths.ensure_settings_dir().unwrap();
        assert!(created.is_dir());
    }
}
