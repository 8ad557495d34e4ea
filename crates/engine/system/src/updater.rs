//! GitHub release update check
//!
//! Queries the latest release of a repository and compares its tag with the
//! version stored in the [`VersionFile`]. Any failure along the way
//! (transport, status, JSON) is logged and reads as "no update".

use std::time::Duration;

use serde::Deserialize;
use thiserror::Error;

use crate::version::VersionFile;

/// Default GitHub REST API root
pub const GITHUB_API_BASE: &str = "https://api.github.com";

const USER_AGENT: &str = concat!("battery/", env!("CARGO_PKG_VERSION"));
const REQUEST_TIMEOUT: Duration = Duration::from_secs(10);

/// Release metadata returned by `/releases/latest`
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct ReleaseInfo {
    pub tag_name: String,
    #[serde(default)]
    pub published_at: Option<String>,
}

/// Reasons a release could not be fetched
#[derive(Error, Debug)]
pub enum UpdateError {
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("server responded with status {0}")]
    Status(u16),

    #[error("invalid release JSON: {0}")]
    Parse(#[from] serde_json::Error),
}

/// Blocking client for the releases endpoint
#[derive(Debug, Clone)]
pub struct UpdateChecker {
    api_base: String,
    timeout: Duration,
    use_proxy: bool,
}

impl Default for UpdateChecker {
    fn default() -> Self {
        Self::new()
    }
}

impl UpdateChecker {
    pub fn new() -> Self {
        Self {
            api_base: GITHUB_API_BASE.to_string(),
            timeout: REQUEST_TIMEOUT,
            use_proxy: true,
        }
    }

    /// Point the checker at another API root (mirrors, tests)
    pub fn with_api_base(mut self, api_base: impl Into<String>) -> Self {
        self.api_base = api_base.into().trim_end_matches('/').to_string();
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Ignore proxy settings from the environment
    pub fn without_proxy(mut self) -> Self {
        self.use_proxy = false;
        self
    }

    pub fn latest_release_url(&self, user: &str, repo: &str) -> String {
        format!("{}/repos/{}/{}/releases/latest", self.api_base, user, repo)
    }

    /// Fetch the latest release of `user/repo`
    pub fn fetch_latest_release(&self, user: &str, repo: &str) -> Result<ReleaseInfo, UpdateError> {
        let url = self.latest_release_url(user, repo);
        tracing::debug!("Requesting {}", url);

        let mut builder = reqwest::blocking::Client::builder()
            .user_agent(USER_AGENT)
            .timeout(self.timeout);
        if !self.use_proxy {
            builder = builder.no_proxy();
        }
        let client = builder.build()?;

        let response = client
            .get(&url)
            .header(reqwest::header::ACCEPT, "application/vnd.github+json")
            .send()?;

        let status = response.status();
        if !status.is_success() {
            return Err(UpdateError::Status(status.as_u16()));
        }

        let body = response.text()?;
        Ok(serde_json::from_str(&body)?)
    }

    /// True when the latest release tag differs from the stored version
    pub fn check_for_github_update(
        &self,
        version_file: &VersionFile,
        user: &str,
        repo: &str,
    ) -> bool {
        match self.fetch_latest_release(user, repo) {
            Ok(release) => {
                let installed = version_file.application_version();
                let available = release.tag_name != installed;
                tracing::info!(
                    "Latest release of {}/{} is '{}', installed '{}'",
                    user,
                    repo,
                    release.tag_name,
                    installed
                );
                available
            }
            Err(err) => {
                tracing::warn!("Update check for {}/{} failed: {}", user, repo, err);
                false
            }
        }
    }

    /// Record a fetched release as the installed one
    pub fn apply_release(
        &self,
        version_file: &VersionFile,
        release: &ReleaseInfo,
    ) -> crate::error::FrameworkResult<()> {
        version_file.set_application_version(&release.tag_name)?;
        if let Some(published_at) = &release.published_at {
            version_file.set_release_date(published_at)?;
        }
        Ok(())
    }
}

/// Check `user/repo` on GitHub against the stored version
pub fn check_for_github_update(version_file: &VersionFile, user: &str, repo: &str) -> bool {
    UpdateChecker::new().check_for_github_update(version_file, user, repo)
}
