//! Build phase: turning a verified source tarball into installed trees
//!
//! - **extract**: unpack the release tarball natively, stripping its top directory
//! - **driver**: run `configure` and `make install` per target platform
//! - **package**: archive a directory as `.tar.gz` under a chosen top-level name

pub mod driver;
pub mod extract;
pub mod package;

use std::fmt;
use std::io;
use std::path::PathBuf;
use std::str::FromStr;
use thiserror::Error;

pub use driver::{BuildDriver, ConfigureMake};
pub use extract::extract_source;
pub use package::package_dir;

#[derive(Error, Debug)]
pub enum BuildError {
    #[error("unknown platform '{0}' (expected one of: linux-amd64, linux-aarch64)")]
    UnknownPlatform(String),

    #[error("cannot extract {}: {reason}", archive.display())]
    Extract { archive: PathBuf, reason: String },

    #[error("command failed with exit code {code:?}\n  command: {command}\n  in: {}{}", dir.display(), tail_block(output_tail))]
    Command {
        command: String,
        dir: PathBuf,
        code: Option<i32>,
        output_tail: String,
    },

    #[error("failed to run {command}: {reason}")]
    Run { command: String, reason: String },

    #[error("{}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

fn tail_block(tail: &str) -> String {
    if tail.is_empty() {
        String::new()
    } else {
        format!("\n{}", tail)
    }
}

/// Target platforms a release can be built for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Platform {
    LinuxAmd64,
    LinuxAarch64,
}

impl Platform {
    pub const ALL: [Platform; 2] = [Platform::LinuxAmd64, Platform::LinuxAarch64];

    pub fn as_str(self) -> &'static str {
        match self {
            Platform::LinuxAmd64 => "linux-amd64",
            Platform::LinuxAarch64 => "linux-aarch64",
        }
    }

    /// GNU host triple passed to `configure --host`.
    pub fn host_triple(self) -> &'static str {
        match self {
            Platform::LinuxAmd64 => "x86_64-linux-gnu",
            Platform::LinuxAarch64 => "aarch64-linux-gnu",
        }
    }

    /// Cross compiler, if the platform needs one.
    pub fn cross_cc(self) -> Option<&'static str> {
        match self {
            Platform::LinuxAmd64 => None,
            Platform::LinuxAarch64 => Some("aarch64-linux-gnu-gcc"),
        }
    }
}

impl fmt::Display for Platform {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Platform {
    type Err = BuildError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Platform::ALL
            .into_iter()
            .find(|p| p.as_str() == s.trim())
            .ok_or_else(|| BuildError::UnknownPlatform(s.to_string()))
    }
}
