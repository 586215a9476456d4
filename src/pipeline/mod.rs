//! Fetch, verify, gate, and build one release
//!
//! ```text
//! Release::resolve -> fetch tarball -> [fetch signature -> import keys -> verify]
//!                  -> gate::decide -> (build -> package)
//! ```
//!
//! Components return typed outcomes; only the trust gate turns them into a
//! [`Decision`]. Configuration and collaborators are handed in at
//! construction so tests can swap the keyring for a stub.

pub mod gate;

use crate::core::config::{ConfigError, PipelineConfig};
use crate::core::output;
use crate::core::settings::Settings;
use crate::helpers::acquire::{FetchResult, Fetcher, Keyring, Release, ToolError, VerificationOutcome};
use crate::helpers::build::{self, BuildDriver, BuildError, Platform};
use crate::helpers::internal::hash;
use std::path::{Path, PathBuf};
use thiserror::Error;

pub use gate::{Decision, Policy, decide};

/// Fatal errors. Trust failures are not errors; they are decisions.
#[derive(Error, Debug)]
pub enum PipelineError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Tool(#[from] ToolError),

    #[error(transparent)]
    Build(#[from] BuildError),

    #[error("cannot hash {}: {source}", path.display())]
    Digest {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("refusing to build {0}: the trust gate rejected it")]
    Rejected(String),
}

/// Everything one run found out.
#[derive(Debug, Clone)]
pub struct PipelineReport {
    pub release: Release,
    pub tarball: FetchResult,
    /// `None` when the signature was never requested.
    pub signature: Option<FetchResult>,
    /// `None` when verification was skipped or the tarball never arrived.
    pub verification: Option<VerificationOutcome>,
    pub decision: Decision,
    /// SHA-256 of the tarball, set only when it was accepted.
    pub sha256: Option<String>,
}

impl PipelineReport {
    pub fn exit_code(&self) -> i32 {
        self.decision.exit_code()
    }
}

/// Installed and packaged output for one platform.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BuildArtifact {
    pub platform: Platform,
    pub install_dir: PathBuf,
    pub archive: PathBuf,
}

pub struct Pipeline<K: Keyring> {
    config: PipelineConfig,
    settings: Settings,
    policy: Policy,
    fetcher: Fetcher,
    keyring: K,
}

impl<K: Keyring> Pipeline<K> {
    pub fn new(
        config: PipelineConfig,
        settings: Settings,
        policy: Policy,
        fetcher: Fetcher,
        keyring: K,
    ) -> Self {
        Self {
            config,
            settings,
            policy,
            fetcher,
            keyring,
        }
    }

    /// Download and judge `version`, writing artifacts into `output_dir`.
    ///
    /// Returns `Ok` for every gate decision, including abort. `Err` means a
    /// tool or filesystem problem made a decision impossible.
    pub fn run(&self, version: &str, output_dir: &Path) -> Result<PipelineReport, PipelineError> {
        let release = Release::resolve(&self.settings.package, version, output_dir);
        output::action(&format!("Fetching {} {}", release.package, release.version));

        output::sub_action(&format!("tarball {}", release.tarball.filename));
        let tarball = self.fetcher.fetch(&release.tarball, &self.config.mirrors);
        if !tarball.is_success() {
            report_exhausted(&release.tarball.filename, &tarball);
            let decision = Decision::Abort {
                reason: format!(
                    "{} could not be downloaded from any mirror",
                    release.tarball.filename
                ),
            };
            return Ok(self.finish(release, tarball, None, None, decision, None));
        }

        if self.policy.skip_verify {
            output::loud_warning(&[
                "SIGNATURE VERIFICATION DISABLED (--skip-verify)",
                &format!("{} has NOT been verified", release.tarball.filename),
                "it could have been tampered with; do not ship it",
            ]);
            let decision = decide(self.policy, None);
            let sha256 = digest(&release.tarball.dest)?;
            return Ok(self.finish(release, tarball, None, None, decision, Some(sha256)));
        }

        output::sub_action(&format!("signature {}", release.signature.filename));
        let signature = self.fetcher.fetch(&release.signature, &self.config.mirrors);
        let verification = if signature.is_success() {
            self.check_signature(&release)?
        } else {
            report_exhausted(&release.signature.filename, &signature);
            VerificationOutcome::SignatureMissing
        };

        let decision = decide(self.policy, Some(&verification));
        let sha256 = if decision.is_abort() {
            None
        } else {
            Some(digest(&release.tarball.dest)?)
        };

        Ok(self.finish(
            release,
            tarball,
            Some(signature),
            Some(verification),
            decision,
            sha256,
        ))
    }

    fn check_signature(&self, release: &Release) -> Result<VerificationOutcome, PipelineError> {
        output::sub_action("importing trusted keys");
        if !self
            .keyring
            .import_keys(&self.config.keys, &self.config.keyservers)?
        {
            output::error("no keyserver supplied every trusted key");
            return Ok(VerificationOutcome::KeysUnimportable);
        }

        output::sub_action("verifying signature");
        let outcome = self.keyring.verify(
            &release.tarball.dest,
            &release.signature.dest,
            &self.config.keys,
        )?;
        match &outcome {
            VerificationOutcome::Verified { fingerprint } => {
                output::detail(&format!("good signature from {}", fingerprint));
            }
            VerificationOutcome::VerificationFailed { reason } => {
                output::error(&format!("signature verification failed: {}", reason));
            }
            _ => {}
        }
        Ok(outcome)
    }

    fn finish(
        &self,
        release: Release,
        tarball: FetchResult,
        signature: Option<FetchResult>,
        verification: Option<VerificationOutcome>,
        decision: Decision,
        sha256: Option<String>,
    ) -> PipelineReport {
        let name = &release.tarball.filename;
        match &decision {
            Decision::Proceed => {
                output::success(&format!("{}: {}", decision.label(), name));
            }
            Decision::ProceedWithWarning { warning } => {
                output::warning(warning);
                output::warning(&format!("{}: {}", decision.label(), name));
            }
            Decision::Abort { reason } => {
                output::error(reason);
                output::error(&format!("{}: {}", decision.label(), name));
            }
        }
        if let Some(sha256) = &sha256 {
            output::info(&format!("sha256 {}  {}", sha256, name));
        }

        PipelineReport {
            release,
            tarball,
            signature,
            verification,
            decision,
            sha256,
        }
    }

    /// Extract the accepted tarball, build it for each platform, and package
    /// the results next to it.
    ///
    /// Refuses to run for a rejected release.
    pub fn build(
        &self,
        report: &PipelineReport,
        platforms: &[Platform],
        driver: &dyn BuildDriver,
        output_dir: &Path,
    ) -> Result<Vec<BuildArtifact>, PipelineError> {
        let release = &report.release;
        if report.decision.is_abort() {
            return Err(PipelineError::Rejected(release.tarball.filename.clone()));
        }

        output::action(&format!("Building {} {}", release.package, release.version));
        let source_dir = output_dir.join(release.source_dir_name());
        build::extract_source(&release.tarball.dest, &source_dir)?;
        build::package_dir(
            &source_dir,
            &output_dir.join(format!("{}-src.tar.gz", release.version)),
            &format!("{}-src", release.version),
        )?;

        let work_dir = output_dir.join("build");
        let mut artifacts = Vec::with_capacity(platforms.len());
        for &platform in platforms {
            let install_dir = driver.build(&source_dir, platform, &work_dir)?;
            let name = format!("{}-{}", release.version, platform);
            let archive = build::package_dir(
                &install_dir,
                &output_dir.join(format!("{}.tar.gz", name)),
                &name,
            )?;
            output::success(&format!("built {}", archive.display()));
            artifacts.push(BuildArtifact {
                platform,
                install_dir,
                archive,
            });
        }

        Ok(artifacts)
    }
}

fn digest(path: &Path) -> Result<String, PipelineError> {
    hash::sha256_file(path).map_err(|source| PipelineError::Digest {
        path: path.to_path_buf(),
        source,
    })
}

fn report_exhausted(filename: &str, result: &FetchResult) {
    let errors = result.errors();
    if errors.is_empty() {
        output::error(&format!("{}: no mirrors to try", filename));
        return;
    }
    output::error(&format!("{}: all {} mirror(s) failed", filename, errors.len()));
    for err in errors {
        output::detail(&err.to_string());
    }
}
