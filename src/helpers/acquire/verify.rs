//! Detached signature verification
//!
//! Two operations, both behind the [`Keyring`] trait:
//!
//! - `import_keys`: make every trusted key available, trying keyservers in
//!   order until one yields all of them. Keys already in the keyring are
//!   not fetched again.
//! - `verify`: check a detached signature against a file and require that
//!   the signing key is one of the trusted keys.
//!
//! [`Gpg`] implements the trait by driving `gpg` in a dedicated home
//! directory and reading its machine-readable `--status-fd` output, so a
//! good signature from a key that merely happens to be in the keyring is
//! still rejected unless its fingerprint matches a trusted identifier.

use crate::core::config::KeyserverList;
use crate::core::output;
use crate::helpers::internal::fs_utils;
use crate::helpers::internal::process::{self, RunError};
use std::path::{Path, PathBuf};
use std::process::Command;
use std::time::Duration;
use thiserror::Error;

/// Result of checking one signature. Never coerced to success: only
/// [`VerificationOutcome::Verified`] means the tarball is authentic.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum VerificationOutcome {
    /// Good signature by a trusted key over exactly these bytes.
    Verified { fingerprint: String },
    /// No signature file was fetched.
    SignatureMissing,
    /// The trusted keys could not be imported from any keyserver.
    KeysUnimportable,
    /// The signature is bad, unknown, untrusted, or unreadable.
    VerificationFailed { reason: String },
}

impl VerificationOutcome {
    pub fn is_verified(&self) -> bool {
        matches!(self, Self::Verified { .. })
    }
}

/// The verification tool itself is broken. Distinct from a bad signature.
#[derive(Error, Debug)]
pub enum ToolError {
    #[error("signature verification tool unavailable: {0}")]
    Unavailable(#[source] RunError),

    #[error("cannot prepare keyring directory {}: {source}", path.display())]
    Keyring {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Key import and signature verification.
pub trait Keyring {
    /// Make every key in `keys` available. Returns `Ok(false)` when no
    /// keyserver could supply all of them.
    fn import_keys(&self, keys: &[String], keyservers: &KeyserverList) -> Result<bool, ToolError>;

    /// Verify `signature` over `tarball`, accepting only keys in `trusted`.
    fn verify(
        &self,
        tarball: &Path,
        signature: &Path,
        trusted: &[String],
    ) -> Result<VerificationOutcome, ToolError>;
}

/// `gpg` running against its own home directory.
#[derive(Debug, Clone)]
pub struct Gpg {
    program: String,
    home: PathBuf,
    timeout: Duration,
}

impl Gpg {
    /// `timeout` bounds every gpg invocation, keyserver imports included.
    pub fn new(program: impl Into<String>, home: impl Into<PathBuf>, timeout: Duration) -> Self {
        Self {
            program: program.into(),
            home: home.into(),
            timeout,
        }
    }

    fn command(&self) -> Command {
        let mut cmd = Command::new(&self.program);
        cmd.arg("--homedir")
            .arg(&self.home)
            .args(["--batch", "--no-tty"]);
        cmd
    }

    fn prepare_home(&self) -> Result<(), ToolError> {
        fs_utils::create_private_dir(&self.home).map_err(|source| ToolError::Keyring {
            path: self.home.clone(),
            source,
        })
    }

    fn run(&self, mut cmd: Command) -> Result<std::process::Output, RunError> {
        process::run_captured(&mut cmd, Some(self.timeout))
    }

    /// True when every key is already present in the keyring.
    fn has_keys(&self, keys: &[String]) -> Result<bool, ToolError> {
        let mut cmd = self.command();
        cmd.args(["--with-colons", "--list-keys"]).args(keys);
        match self.run(cmd) {
            Ok(out) => Ok(out.status.success()),
            Err(e @ (RunError::NotFound { .. } | RunError::Spawn { .. })) => {
                Err(ToolError::Unavailable(e))
            }
            Err(_) => Ok(false),
        }
    }
}

impl Keyring for Gpg {
    fn import_keys(&self, keys: &[String], keyservers: &KeyserverList) -> Result<bool, ToolError> {
        self.prepare_home()?;

        if self.has_keys(keys)? {
            output::detail("trusted keys already in keyring");
            return Ok(true);
        }

        for keyserver in keyservers.iter() {
            output::detail(&format!("importing {} key(s) from {}", keys.len(), keyserver));
            let pb = output::spinner(&format!("contacting {}", keyserver));

            let mut cmd = self.command();
            cmd.args(["--keyserver", keyserver, "--recv-keys"]).args(keys);
            let result = self.run(cmd);
            pb.finish_and_clear();

            match result {
                Ok(out) if out.status.success() => {
                    // A zero exit does not guarantee every key arrived
                    if self.has_keys(keys)? {
                        output::detail(&format!("keys imported from {}", keyserver));
                        return Ok(true);
                    }
                    output::attempt_failed(keyserver, "not all keys were imported");
                }
                Ok(out) => {
                    let stderr = String::from_utf8_lossy(&out.stderr);
                    output::attempt_failed(keyserver, last_line(&stderr));
                }
                Err(e @ (RunError::NotFound { .. } | RunError::Spawn { .. })) => {
                    return Err(ToolError::Unavailable(e));
                }
                Err(e) => output::attempt_failed(keyserver, &e.to_string()),
            }
        }

        Ok(false)
    }

    fn verify(
        &self,
        tarball: &Path,
        signature: &Path,
        trusted: &[String],
    ) -> Result<VerificationOutcome, ToolError> {
        if !signature.is_file() {
            return Ok(VerificationOutcome::VerificationFailed {
                reason: format!("signature file not found: {}", signature.display()),
            });
        }
        if !tarball.is_file() {
            return Ok(VerificationOutcome::VerificationFailed {
                reason: format!("file to verify not found: {}", tarball.display()),
            });
        }
        self.prepare_home()?;

        let mut cmd = self.command();
        cmd.args(["--status-fd", "1", "--verify"])
            .arg(signature)
            .arg(tarball);

        let out = match self.run(cmd) {
            Ok(out) => out,
            Err(e @ (RunError::NotFound { .. } | RunError::Spawn { .. })) => {
                return Err(ToolError::Unavailable(e));
            }
            Err(e) => {
                return Ok(VerificationOutcome::VerificationFailed {
                    reason: e.to_string(),
                });
            }
        };

        let report = StatusReport::parse(&String::from_utf8_lossy(&out.stdout));
        let mut outcome = report.evaluate(trusted);
        if outcome.is_verified() && !out.status.success() {
            outcome = VerificationOutcome::VerificationFailed {
                reason: format!("gpg exited with {}", out.status),
            };
        }
        if let VerificationOutcome::VerificationFailed { reason } = &outcome {
            let stderr = String::from_utf8_lossy(&out.stderr);
            if !stderr.trim().is_empty() {
                output::detail(&format!("gpg: {}", last_line(&stderr)));
            }
            output::attempt_failed(&signature.display().to_string(), reason);
        }
        Ok(outcome)
    }
}

fn last_line(text: &str) -> &str {
    text.lines()
        .rev()
        .find(|l| !l.trim().is_empty())
        .map(str::trim)
        .unwrap_or("no output")
}

/// The parts of gpg's `--status-fd` output that decide trust.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct StatusReport {
    /// `(signing key fingerprint, primary key fingerprint)` per VALIDSIG
    pub valid: Vec<(String, String)>,
    /// Key ids from BADSIG lines
    pub bad: Vec<String>,
    /// Key ids from ERRSIG lines
    pub errors: Vec<String>,
    /// Key ids from NO_PUBKEY lines
    pub missing_keys: Vec<String>,
    /// A REVKEYSIG line was seen
    pub revoked: bool,
    /// NODATA: the signature file held no OpenPGP data
    pub no_data: bool,
}

impl StatusReport {
    pub fn parse(status: &str) -> Self {
        let mut report = Self::default();

        for line in status.lines() {
            let Some(rest) = line.strip_prefix("[GNUPG:] ") else {
                continue;
            };
            let fields: Vec<&str> = rest.split_whitespace().collect();
            let Some((&keyword, args)) = fields.split_first() else {
                continue;
            };
            let first = args.first().map(|s| s.to_string()).unwrap_or_default();

            match keyword {
                "VALIDSIG" => {
                    // The primary key fingerprint is the tenth argument; older
                    // gpg versions may omit it.
                    let primary = args.get(9).map(|s| s.to_string()).unwrap_or_else(|| first.clone());
                    report.valid.push((first, primary));
                }
                "BADSIG" => report.bad.push(first),
                "ERRSIG" => report.errors.push(first),
                "NO_PUBKEY" => report.missing_keys.push(first),
                "REVKEYSIG" => report.revoked = true,
                "NODATA" => report.no_data = true,
                _ => {}
            }
        }

        report
    }

    /// Decide the outcome against the trusted identifiers.
    pub fn evaluate(&self, trusted: &[String]) -> VerificationOutcome {
        let failed = |reason: String| VerificationOutcome::VerificationFailed { reason };

        if self.no_data {
            return failed("signature file contains no OpenPGP data".to_string());
        }
        if let Some(key) = self.bad.first() {
            return failed(format!("BAD signature from key {}", key));
        }
        if self.revoked {
            return failed("signing key has been revoked".to_string());
        }
        if let Some(key) = self.missing_keys.first() {
            return failed(format!("no public key for {} in keyring", key));
        }
        if let Some(key) = self.errors.first() {
            return failed(format!("cannot check signature by key {}", key));
        }
        if self.valid.is_empty() {
            return failed("no valid signature found".to_string());
        }

        let trusted_match = self.valid.iter().find_map(|(signing, primary)| {
            trusted
                .iter()
                .any(|id| key_matches(signing, id) || key_matches(primary, id))
                .then(|| primary.clone())
        });

        match trusted_match {
            Some(fingerprint) => VerificationOutcome::Verified { fingerprint },
            None => failed(format!(
                "signature made by untrusted key {}",
                self.valid[0].1
            )),
        }
    }
}

/// Match a fingerprint against a trusted identifier.
///
/// Identifiers may be full fingerprints or long key ids (at least the
/// fingerprint's trailing 16 hex digits), with or without a `0x` prefix or
/// spaces. Short 8-digit ids are trivially forged and never match.
pub fn key_matches(fingerprint: &str, identifier: &str) -> bool {
    let id: String = identifier
        .trim()
        .trim_start_matches("0x")
        .trim_start_matches("0X")
        .chars()
        .filter(|c| !c.is_whitespace())
        .collect::<String>()
        .to_ascii_uppercase();
    let fpr = fingerprint.to_ascii_uppercase();

    id.len() >= 16 && id.chars().all(|c| c.is_ascii_hexdigit()) && fpr.ends_with(&id)
}
