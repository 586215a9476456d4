//! gettext-versions - list the releases published on the mirrors
//!
//! Prints one version per line on stdout, oldest first. Progress and mirror
//! failures go to stderr.

use anyhow::{Context, Result};
use clap::Parser;
use gettext_dist::core::config::{MIRRORS_FILE, default_config_dir, parse_lines};
use gettext_dist::helpers::acquire::list_versions;
use gettext_dist::{ConfigError, Fetcher, MirrorList, Settings, output};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "gettext-versions")]
#[command(about = "List GNU gettext versions available on the mirrors")]
#[command(version)]
struct Cli {
    /// Mirror to try before the configured ones (repeatable, tried in order)
    #[arg(long = "mirror", value_name = "URL")]
    mirrors: Vec<String>,

    /// Mirror list file (one URL per line)
    #[arg(long, env = "GETTEXT_DIST_MIRRORS")]
    mirrors_file: Option<PathBuf>,

    /// TOML settings file
    #[arg(long, env = "GETTEXT_DIST_SETTINGS")]
    settings: Option<PathBuf>,
}

/// Mirrors from the file, with command-line mirrors first.
///
/// A missing or empty file is fine as long as `--mirror` was given.
fn load_mirrors(cli: &Cli) -> Result<MirrorList, ConfigError> {
    let path = cli
        .mirrors_file
        .clone()
        .unwrap_or_else(|| default_config_dir().join(MIRRORS_FILE));

    let from_file = if path.is_file() {
        let content = std::fs::read_to_string(&path).map_err(|source| ConfigError::Read {
            kind: "mirror",
            path: path.clone(),
            source,
        })?;
        parse_lines(&content)
    } else if cli.mirrors.is_empty() {
        return Err(ConfigError::MissingFile {
            kind: "mirror",
            path,
        });
    } else {
        Vec::new()
    };

    let mirrors = MirrorList::new(from_file).prepend(cli.mirrors.iter().cloned());
    if mirrors.is_empty() {
        return Err(ConfigError::EmptyMirrorList { path });
    }
    Ok(mirrors)
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let mirrors = load_mirrors(&cli).context("Failed to load configuration")?;
    let settings = Settings::load(cli.settings.as_deref()).context("Failed to load settings")?;
    let fetcher = Fetcher::new(settings.http_timeout);

    output::action(&format!("Listing {} versions", settings.package));
    let versions = list_versions(&fetcher, &mirrors, &settings.package)
        .with_context(|| format!("Failed to list {} versions", settings.package))?;

    for version in &versions {
        println!("{}", version);
    }
    output::success(&format!("{} version(s) found", versions.len()));
    Ok(())
}
