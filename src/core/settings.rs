//! Optional TOML settings
//!
//! Tunables that rarely change between runs. Every key is optional; missing
//! keys fall back to the defaults below.
//!
//! ```toml
//! package = "gettext"
//! http_timeout_secs = 60
//! keyserver_timeout_secs = 30
//! gpg = "/usr/bin/gpg"
//! gpg_home = "/var/lib/gettext-dist/gnupg"
//! jobs = 8
//! ```

use super::config::ConfigError;
use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::time::Duration;

pub const DEFAULT_PACKAGE: &str = "gettext";
const DEFAULT_HTTP_TIMEOUT_SECS: u64 = 60;
const DEFAULT_KEYSERVER_TIMEOUT_SECS: u64 = 30;
const DEFAULT_GPG: &str = "gpg";

#[derive(Debug, Clone, Deserialize, Default)]
#[serde(deny_unknown_fields)]
struct SettingsToml {
    package: Option<String>,
    http_timeout_secs: Option<u64>,
    keyserver_timeout_secs: Option<u64>,
    gpg: Option<String>,
    gpg_home: Option<PathBuf>,
    jobs: Option<usize>,
}

/// Resolved settings for one run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Settings {
    /// Upstream package name, used in artifact filenames.
    pub package: String,
    /// Connect and idle-read timeout for mirror requests.
    pub http_timeout: Duration,
    /// Per-keyserver timeout for key imports.
    pub keyserver_timeout: Duration,
    /// gpg executable.
    pub gpg: String,
    /// Keyring directory. `None` means `{output-dir}/.gnupg`.
    pub gpg_home: Option<PathBuf>,
    /// `make -j` parallelism.
    pub jobs: usize,
}

impl Default for Settings {
    fn default() -> Self {
        Self::from_toml(SettingsToml::default())
    }
}

impl Settings {
    /// Load settings from `path`, or defaults when `path` is `None`.
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        let Some(path) = path else {
            return Ok(Self::default());
        };

        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            kind: "settings",
            path: path.to_path_buf(),
            source,
        })?;
        Self::parse(&content).map_err(|reason| ConfigError::Settings {
            path: path.to_path_buf(),
            reason,
        })
    }

    /// Parse settings from TOML text.
    pub fn parse(content: &str) -> Result<Self, String> {
        let raw: SettingsToml = toml::from_str(content).map_err(|e| e.to_string())?;
        if let Some(package) = &raw.package
            && package.trim().is_empty()
        {
            return Err("package name cannot be empty".to_string());
        }
        if raw.jobs == Some(0) {
            return Err("jobs must be at least 1".to_string());
        }
        Ok(Self::from_toml(raw))
    }

    fn from_toml(raw: SettingsToml) -> Self {
        // Clamp to a sane range so a typo cannot hang a run forever
        let http_secs = raw
            .http_timeout_secs
            .unwrap_or(DEFAULT_HTTP_TIMEOUT_SECS)
            .clamp(5, 600);
        let keyserver_secs = raw
            .keyserver_timeout_secs
            .unwrap_or(DEFAULT_KEYSERVER_TIMEOUT_SECS)
            .clamp(5, 300);

        Self {
            package: raw.package.unwrap_or_else(|| DEFAULT_PACKAGE.to_string()),
            http_timeout: Duration::from_secs(http_secs),
            keyserver_timeout: Duration::from_secs(keyserver_secs),
            gpg: raw.gpg.unwrap_or_else(|| DEFAULT_GPG.to_string()),
            gpg_home: raw.gpg_home,
            jobs: raw.jobs.unwrap_or_else(num_cpus::get),
        }
    }

    /// Keyring directory for a run writing into `output_dir`.
    pub fn gpg_home_for(&self, output_dir: &Path) -> PathBuf {
        self.gpg_home
            .clone()
            .unwrap_or_else(|| output_dir.join(".gnupg"))
    }
}
