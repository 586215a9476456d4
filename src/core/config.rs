//! Pipeline configuration: mirrors, trusted keys, keyservers
//!
//! Configuration is loaded once per run through a [`ConfigSource`] and is
//! immutable afterwards. [`FileConfig`] reads the line-oriented files shipped
//! in `config/`; [`StaticConfig`] hands out a fixed value (tests, embedding).
//!
//! File format, one entry per line:
//!
//! ```text
//! # Trusted gettext release signers
//! B6301D9E1BBEAC08
//! F5BE8B267C6A406D
//! ```
//!
//! Blank lines and lines starting with `#` are ignored.

use std::path::{Path, PathBuf};
use thiserror::Error;

/// Keyservers tried when no keyserver file is configured.
pub const DEFAULT_KEYSERVERS: &[&str] = &[
    "hkps://keyserver.ubuntu.com",
    "hkps://keys.openpgp.org",
    "hkps://pgp.mit.edu",
];

/// File names looked up inside the config directory.
pub const MIRRORS_FILE: &str = "mirrors.txt";
pub const KEYS_FILE: &str = "keys.txt";
pub const KEYSERVERS_FILE: &str = "keyservers.txt";

/// Errors raised while loading configuration. All of them are fatal and
/// happen before any network activity.
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("{kind} file not found: {}", path.display())]
    MissingFile { kind: &'static str, path: PathBuf },

    #[error("cannot read {kind} file {}: {source}", path.display())]
    Read {
        kind: &'static str,
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("mirror list is empty (add a URL to {} or pass --mirror)", path.display())]
    EmptyMirrorList { path: PathBuf },

    #[error("no trusted signing keys listed in {}", path.display())]
    EmptyKeyList { path: PathBuf },

    #[error("invalid settings file {}: {reason}", path.display())]
    Settings { path: PathBuf, reason: String },
}

/// Ordered list of candidate base URLs. The first entry is the most preferred.
///
/// Order is fixed at construction; nothing in the pipeline re-sorts it.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MirrorList(Vec<String>);

impl MirrorList {
    pub fn new<I, S>(mirrors: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self(mirrors.into_iter().map(Into::into).collect())
    }

    /// Return a new list with `preferred` placed ahead of the existing
    /// entries, keeping the given order.
    pub fn prepend<I, S>(&self, preferred: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut mirrors: Vec<String> = preferred.into_iter().map(Into::into).collect();
        mirrors.extend(self.0.iter().cloned());
        Self(mirrors)
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.0.iter().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

/// Ordered list of keyserver endpoints, same priority rules as [`MirrorList`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KeyserverList(Vec<String>);

impl KeyserverList {
    pub fn new<I, S>(keyservers: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self(keyservers.into_iter().map(Into::into).collect())
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.0.iter().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl Default for KeyserverList {
    fn default() -> Self {
        Self::new(DEFAULT_KEYSERVERS.iter().copied())
    }
}

/// Everything the pipeline needs to know about where to fetch from and whom
/// to trust.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PipelineConfig {
    pub mirrors: MirrorList,
    pub keys: Vec<String>,
    pub keyservers: KeyserverList,
}

/// Provider of a [`PipelineConfig`].
pub trait ConfigSource {
    fn load(&self) -> Result<PipelineConfig, ConfigError>;
}

/// Fixed in-memory configuration.
#[derive(Debug, Clone)]
pub struct StaticConfig(pub PipelineConfig);

impl ConfigSource for StaticConfig {
    fn load(&self) -> Result<PipelineConfig, ConfigError> {
        Ok(self.0.clone())
    }
}

/// Configuration read from line-oriented text files.
#[derive(Debug, Clone)]
pub struct FileConfig {
    pub mirrors_file: PathBuf,
    pub keys_file: PathBuf,
    /// When `None`, [`DEFAULT_KEYSERVERS`] is used.
    pub keyservers_file: Option<PathBuf>,
    /// Mirrors given on the command line, tried before the file's entries.
    pub extra_mirrors: Vec<String>,
}

impl FileConfig {
    /// Use the standard file names inside `dir`. The keyserver file is only
    /// picked up if it exists.
    pub fn in_dir(dir: &Path) -> Self {
        let keyservers = dir.join(KEYSERVERS_FILE);
        Self {
            mirrors_file: dir.join(MIRRORS_FILE),
            keys_file: dir.join(KEYS_FILE),
            keyservers_file: keyservers.exists().then_some(keyservers),
            extra_mirrors: Vec::new(),
        }
    }

    pub fn with_extra_mirrors(mut self, mirrors: Vec<String>) -> Self {
        self.extra_mirrors = mirrors;
        self
    }
}

impl ConfigSource for FileConfig {
    fn load(&self) -> Result<PipelineConfig, ConfigError> {
        // Check both required files up front so a missing key file is reported
        // even when the mirror file is fine.
        require_file("mirror", &self.mirrors_file)?;
        require_file("key", &self.keys_file)?;

        let mirrors = MirrorList::new(read_entries("mirror", &self.mirrors_file)?)
            .prepend(self.extra_mirrors.iter().cloned());
        if mirrors.is_empty() {
            return Err(ConfigError::EmptyMirrorList {
                path: self.mirrors_file.clone(),
            });
        }

        let keys = read_entries("key", &self.keys_file)?;
        if keys.is_empty() {
            return Err(ConfigError::EmptyKeyList {
                path: self.keys_file.clone(),
            });
        }

        let keyservers = match &self.keyservers_file {
            Some(path) => {
                require_file("keyserver", path)?;
                let entries = read_entries("keyserver", path)?;
                if entries.is_empty() {
                    KeyserverList::default()
                } else {
                    KeyserverList::new(entries)
                }
            }
            None => KeyserverList::default(),
        };

        Ok(PipelineConfig {
            mirrors,
            keys,
            keyservers,
        })
    }
}

/// Default config directory: `./config` if present, otherwise
/// `$XDG_CONFIG_HOME/gettext-dist`.
pub fn default_config_dir() -> PathBuf {
    let local = PathBuf::from("config");
    if local.is_dir() {
        return local;
    }

    dirs::config_dir()
        .unwrap_or_else(|| PathBuf::from(".config"))
        .join("gettext-dist")
}

/// Split line-oriented config content into entries.
pub fn parse_lines(content: &str) -> Vec<String> {
    content
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty() && !line.starts_with('#'))
        .map(str::to_string)
        .collect()
}

fn require_file(kind: &'static str, path: &Path) -> Result<(), ConfigError> {
    if path.is_file() {
        Ok(())
    } else {
        Err(ConfigError::MissingFile {
            kind,
            path: path.to_path_buf(),
        })
    }
}

fn read_entries(kind: &'static str, path: &Path) -> Result<Vec<String>, ConfigError> {
    let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
        kind,
        path: path.to_path_buf(),
        source,
    })?;
    Ok(parse_lines(&content))
}
