//! Acquire phase: getting release artifacts onto disk and deciding whether
//! to trust them.
//!
//! - **resolve**: map a version to its tarball and signature targets
//! - **download**: mirror-fallback HTTP downloads
//! - **verify**: keyserver-fallback key import and detached signature checks
//! - **versions**: list the versions published on the mirrors

pub mod download;
pub mod resolve;
pub mod verify;
pub mod versions;

pub use download::{FetchError, FetchResult, Fetcher, MirrorError};
pub use resolve::{FetchTarget, Release, mirror_url};
pub use verify::{Gpg, Keyring, StatusReport, ToolError, VerificationOutcome, key_matches};
pub use versions::{ListFailure, compare_versions, list_versions, parse_versions};
