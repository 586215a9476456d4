//! Fetch, verify, and build GNU gettext releases from upstream mirrors
//!
//! A run resolves the release artifacts for a version, downloads the tarball
//! (and its detached signature) from an ordered list of mirrors, imports the
//! trusted signing keys from an ordered list of keyservers, and verifies the
//! signature. The trust gate turns those outcomes plus the policy flags into
//! one of three decisions: proceed, proceed with a warning, or abort.
//!
//! ```text
//! resolve -> fetch(tarball) -> [fetch(signature) -> import keys -> verify]
//!         -> trust gate -> build (optional) -> package
//! ```
//!
//! # Configuration
//!
//! Mirrors, trusted keys and keyservers come from a [`ConfigSource`]. The
//! line-oriented file provider ([`FileConfig`]) is what the binaries use:
//!
//! ```text
//! # config/mirrors.txt
//! https://ftp.gnu.org/gnu/gettext/
//! https://ftpmirror.gnu.org/gettext/
//! ```
//!
//! # Binaries
//!
//! - `gettext-fetch <version>` - fetch, verify, and optionally build a release
//! - `gettext-versions` - list the versions published upstream

pub mod core;
pub mod helpers;
pub mod pipeline;

pub use crate::core::config::{
    ConfigError, ConfigSource, FileConfig, KeyserverList, MirrorList, PipelineConfig,
    StaticConfig,
};
pub use crate::core::output;
pub use crate::core::settings::Settings;
pub use helpers::acquire::{
    FetchResult, FetchTarget, Fetcher, Gpg, Keyring, Release, VerificationOutcome,
};
pub use helpers::build::{BuildDriver, ConfigureMake, Platform};
pub use pipeline::{Decision, Pipeline, PipelineError, PipelineReport, Policy};
