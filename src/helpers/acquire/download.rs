//! Mirror-fallback downloads
//!
//! [`Fetcher::fetch`] walks an ordered mirror list and stops at the first
//! mirror that serves the file. Failed attempts are recorded and reported,
//! never fatal on their own. Only when every mirror has failed does the fetch
//! fail, carrying one error per mirror in list order.
//!
//! The body is streamed into a temporary sibling of the destination and
//! renamed into place once complete, so a destination path either holds a
//! whole artifact or nothing.

use crate::core::config::MirrorList;
use crate::core::output;
use std::fmt;
use std::io::{Read, Write};
use std::path::{Path, PathBuf};
use std::time::Duration;
use thiserror::Error;

use super::resolve::FetchTarget;
use crate::helpers::internal::fs_utils;

const USER_AGENT: &str = concat!("gettext-dist/", env!("CARGO_PKG_VERSION"));

/// Why a single mirror attempt failed.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum FetchError {
    #[error("HTTP status {0}")]
    Status(u16),

    #[error("transport error: {0}")]
    Transport(String),

    #[error("read error: {0}")]
    Read(String),

    #[error("write error: {0}")]
    Write(String),

    #[error("unusable response: {0}")]
    Unusable(String),
}

/// A failed attempt against one mirror.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MirrorError {
    pub mirror: String,
    pub url: String,
    pub error: FetchError,
}

impl fmt::Display for MirrorError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.url, self.error)
    }
}

/// Outcome of fetching one artifact across a mirror list.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FetchResult {
    Fetched {
        path: PathBuf,
        mirror: String,
        bytes: u64,
    },
    /// Every mirror failed. Errors are in mirror order; empty when the mirror
    /// list itself was empty.
    Failed { errors: Vec<MirrorError> },
}

impl FetchResult {
    pub fn is_success(&self) -> bool {
        matches!(self, Self::Fetched { .. })
    }

    pub fn path(&self) -> Option<&Path> {
        match self {
            Self::Fetched { path, .. } => Some(path),
            Self::Failed { .. } => None,
        }
    }

    pub fn errors(&self) -> &[MirrorError] {
        match self {
            Self::Fetched { .. } => &[],
            Self::Failed { errors } => errors,
        }
    }
}

/// Blocking HTTP client.
#[derive(Clone)]
pub struct Fetcher {
    agent: ureq::Agent,
}

impl Fetcher {
    /// `timeout` bounds connecting and each individual read. A slow mirror
    /// that keeps sending is never cut off; a stalled one is.
    pub fn new(timeout: Duration) -> Self {
        let agent = ureq::AgentBuilder::new()
            .timeout_connect(timeout)
            .timeout_read(timeout)
            .user_agent(USER_AGENT)
            .build();
        Self { agent }
    }

    /// Download `target` from the first mirror that serves it.
    ///
    /// Mirrors are tried strictly in list order; once one succeeds no later
    /// mirror is contacted. Any stale file at the destination is removed
    /// first so a failed fetch never leaves an old artifact behind; if it
    /// cannot be removed the fetch fails without contacting any mirror.
    pub fn fetch(&self, target: &FetchTarget, mirrors: &MirrorList) -> FetchResult {
        if mirrors.is_empty() {
            output::attempt_failed(&target.filename, "no mirrors configured");
            return FetchResult::Failed { errors: Vec::new() };
        }

        if std::fs::symlink_metadata(&target.dest).is_ok()
            && let Err(e) = std::fs::remove_file(&target.dest)
        {
            let reason = format!("cannot remove stale {}: {}", target.dest.display(), e);
            output::attempt_failed(&target.filename, &reason);
            let errors = mirrors
                .iter()
                .map(|mirror| MirrorError {
                    mirror: mirror.to_string(),
                    url: target.url_on(mirror),
                    error: FetchError::Write(reason.clone()),
                })
                .collect();
            return FetchResult::Failed { errors };
        }

        let mut errors = Vec::with_capacity(mirrors.len());
        for mirror in mirrors.iter() {
            let url = target.url_on(mirror);
            output::detail(&format!("trying {}", url));

            match self.download_to(&url, &target.dest, &target.filename) {
                Ok(bytes) => {
                    output::detail(&format!("downloaded {} ({} bytes)", target.filename, bytes));
                    return FetchResult::Fetched {
                        path: target.dest.clone(),
                        mirror: mirror.to_string(),
                        bytes,
                    };
                }
                Err(error) => {
                    output::attempt_failed(&url, &error.to_string());
                    errors.push(MirrorError {
                        mirror: mirror.to_string(),
                        url,
                        error,
                    });
                }
            }
        }

        FetchResult::Failed { errors }
    }

    /// GET `url` and return the body as text.
    pub fn get_text(&self, url: &str) -> Result<String, FetchError> {
        self.get(url)?
            .into_string()
            .map_err(|e| FetchError::Read(e.to_string()))
    }

    fn get(&self, url: &str) -> Result<ureq::Response, FetchError> {
        let response = self.agent.get(url).call().map_err(|e| match e {
            ureq::Error::Status(code, _) => FetchError::Status(code),
            ureq::Error::Transport(t) => FetchError::Transport(t.to_string()),
        })?;

        let status = response.status();
        if !(200..300).contains(&status) {
            return Err(FetchError::Status(status));
        }
        Ok(response)
    }

    /// Stream `url` into `dest` via a temporary sibling file.
    fn download_to(&self, url: &str, dest: &Path, filename: &str) -> Result<u64, FetchError> {
        let response = self.get(url)?;

        fs_utils::ensure_parent_dir(dest).map_err(|e| FetchError::Write(e.to_string()))?;
        let mut part = tempfile::Builder::new()
            .prefix(&format!(".{}.", filename))
            .suffix(".part")
            .tempfile_in(fs_utils::parent_or_cwd(dest))
            .map_err(|e| FetchError::Write(format!("cannot create temporary file: {}", e)))?;

        let pb = output::spinner(&format!("downloading {}", filename));
        if let Some(len) = response
            .header("content-length")
            .and_then(|s| s.parse().ok())
        {
            output::upgrade_to_bytes(&pb, len);
        }

        let mut reader = response.into_reader();
        let mut buffer = [0u8; 8192];
        let mut total_bytes = 0u64;

        let copied: Result<(), FetchError> = loop {
            let n = match reader.read(&mut buffer) {
                Ok(0) => break Ok(()),
                Ok(n) => n,
                Err(e) => break Err(FetchError::Read(e.to_string())),
            };
            if let Err(e) = part.write_all(&buffer[..n]) {
                break Err(FetchError::Write(e.to_string()));
            }
            total_bytes += n as u64;
            pb.set_position(total_bytes);
        };
        pb.finish_and_clear();

        // On error `part` is dropped here and the temporary file removed
        copied?;
        part.as_file()
            .sync_all()
            .map_err(|e| FetchError::Write(e.to_string()))?;
        part.persist(dest)
            .map_err(|e| FetchError::Write(format!("cannot move into place: {}", e.error)))?;

        Ok(total_bytes)
    }
}
