//! gettext-fetch - download, verify, and optionally build a gettext release
//!
//! Usage:
//!   gettext-fetch 0.26
//!   gettext-fetch 0.26 --mirror https://mirror.example/gnu/gettext/
//!   gettext-fetch 0.26 --allow-insecure --build linux-amd64
//!
//! Exit status is 0 when the release was accepted (verified, or unverified
//! with a warning) and 1 when it was rejected or anything fatal happened.

use anyhow::{Context, Result};
use clap::Parser;
use gettext_dist::core::config::default_config_dir;
use gettext_dist::core::lock::acquire_output_lock;
use gettext_dist::{
    ConfigSource, ConfigureMake, FileConfig, Fetcher, Gpg, Pipeline, Platform, Policy, Settings,
    output,
};
use std::path::PathBuf;
use std::process::ExitCode;

#[derive(Parser)]
#[command(name = "gettext-fetch")]
#[command(about = "Fetch and verify a GNU gettext release from upstream mirrors")]
#[command(version)]
struct Cli {
    /// Release version, e.g. 0.26
    #[arg(value_name = "VERSION")]
    release: String,

    /// Mirror to try before the configured ones (repeatable, tried in order)
    #[arg(long = "mirror", value_name = "URL")]
    mirrors: Vec<String>,

    /// Directory for downloaded and built artifacts
    #[arg(short, long, default_value = "downloads")]
    output_dir: PathBuf,

    /// Do not download or check the signature (loudly unverified)
    #[arg(long)]
    skip_verify: bool,

    /// Continue with a warning when verification fails
    #[arg(long)]
    allow_insecure: bool,

    /// Mirror list file (one URL per line)
    #[arg(long, env = "GETTEXT_DIST_MIRRORS")]
    mirrors_file: Option<PathBuf>,

    /// Trusted key list file (one fingerprint or key id per line)
    #[arg(long, env = "GETTEXT_DIST_KEYS")]
    keys_file: Option<PathBuf>,

    /// Keyserver list file (defaults to built-in keyservers when absent)
    #[arg(long, env = "GETTEXT_DIST_KEYSERVERS")]
    keyservers_file: Option<PathBuf>,

    /// TOML settings file
    #[arg(long, env = "GETTEXT_DIST_SETTINGS")]
    settings: Option<PathBuf>,

    /// Build the accepted release for a platform (repeatable)
    #[arg(long = "build", value_name = "PLATFORM")]
    platforms: Vec<Platform>,
}

impl Cli {
    fn config_source(&self) -> FileConfig {
        let mut source = FileConfig::in_dir(&default_config_dir());
        if let Some(path) = &self.mirrors_file {
            source.mirrors_file = path.clone();
        }
        if let Some(path) = &self.keys_file {
            source.keys_file = path.clone();
        }
        if let Some(path) = &self.keyservers_file {
            source.keyservers_file = Some(path.clone());
        }
        source.with_extra_mirrors(self.mirrors.clone())
    }
}

fn main() -> Result<ExitCode> {
    let cli = Cli::parse();

    // Configuration problems are reported before any network activity
    let config = cli
        .config_source()
        .load()
        .context("Failed to load configuration")?;
    let settings = Settings::load(cli.settings.as_deref()).context("Failed to load settings")?;

    let _lock = acquire_output_lock(&cli.output_dir)?;

    let policy = Policy {
        skip_verify: cli.skip_verify,
        allow_insecure: cli.allow_insecure,
    };
    let gpg = Gpg::new(
        settings.gpg.clone(),
        settings.gpg_home_for(&cli.output_dir),
        settings.keyserver_timeout,
    );
    let fetcher = Fetcher::new(settings.http_timeout);
    let jobs = settings.jobs;

    let pipeline = Pipeline::new(config, settings, policy, fetcher, gpg);
    let report = pipeline
        .run(&cli.release, &cli.output_dir)
        .with_context(|| format!("Failed to process gettext {}", cli.release))?;

    if report.decision.is_abort() {
        return Ok(ExitCode::from(report.exit_code() as u8));
    }

    if !cli.platforms.is_empty() {
        let driver = ConfigureMake::new(jobs);
        let artifacts = pipeline
            .build(&report, &cli.platforms, &driver, &cli.output_dir)
            .context("Build failed")?;
        output::info(&format!("{} platform archive(s) written", artifacts.len()));
    }

    Ok(ExitCode::from(report.exit_code() as u8))
}
