//! Build drivers
//!
//! A driver takes a verified source tree and produces an installed tree for
//! one platform. [`ConfigureMake`] is the autotools driver used for gettext.

use crate::core::output;
use crate::helpers::internal::fs_utils;
use crate::helpers::internal::process::run_captured;
use std::path::{Path, PathBuf};
use std::process::Command;

use super::{BuildError, Platform};

/// Lines of build output kept for error messages.
const OUTPUT_TAIL_LINES: usize = 20;

/// Produces an installed tree from a source tree.
pub trait BuildDriver {
    /// Build `source` for `platform` using `work_dir` as scratch space.
    ///
    /// Returns the root of the installed tree.
    fn build(&self, source: &Path, platform: Platform, work_dir: &Path) -> Result<PathBuf, BuildError>;
}

/// `./configure && make install` with a per-platform build directory.
#[derive(Debug, Clone)]
pub struct ConfigureMake {
    jobs: usize,
}

impl ConfigureMake {
    pub fn new(jobs: usize) -> Self {
        Self { jobs: jobs.max(1) }
    }

    fn configure_args(&self, platform: Platform, install: &Path) -> Vec<String> {
        let mut args = vec![format!("--prefix={}", install.display())];
        // Native builds let configure guess the host
        if platform.cross_cc().is_some() {
            args.push(format!("--host={}", platform.host_triple()));
        }
        args
    }

    fn make_args(&self) -> Vec<String> {
        vec![format!("-j{}", self.jobs), "install".to_string()]
    }
}

impl BuildDriver for ConfigureMake {
    fn build(&self, source: &Path, platform: Platform, work_dir: &Path) -> Result<PathBuf, BuildError> {
        let root = work_dir.join(platform.as_str());
        let build_dir = root.join("build");
        let install = root.join("install");

        if root.exists() {
            std::fs::remove_dir_all(&root).map_err(|source| BuildError::Io {
                path: root.clone(),
                source,
            })?;
        }
        std::fs::create_dir_all(&install).map_err(|source| BuildError::Io {
            path: install.clone(),
            source,
        })?;
        fs_utils::copy_dir_all(source, &build_dir).map_err(|source| BuildError::Io {
            path: build_dir.clone(),
            source,
        })?;

        let cc = platform.cross_cc();
        output::sub_action(&format!("configure ({})", platform));
        run_step(
            &build_dir,
            "./configure",
            &self.configure_args(platform, &install),
            cc,
        )?;

        output::sub_action(&format!("make install ({})", platform));
        run_step(&build_dir, "make", &self.make_args(), cc)?;

        Ok(install)
    }
}

fn run_step(dir: &Path, program: &str, args: &[String], cc: Option<&str>) -> Result<(), BuildError> {
    let command = std::iter::once(program.to_string())
        .chain(args.iter().cloned())
        .collect::<Vec<_>>()
        .join(" ");

    let mut cmd = Command::new(program);
    cmd.args(args).current_dir(dir);
    if let Some(cc) = cc {
        cmd.env("CC", cc);
    }

    let pb = output::build_spinner(&command);
    let result = run_captured(&mut cmd, None);
    pb.finish_and_clear();

    let out = result.map_err(|e| BuildError::Run {
        command: command.clone(),
        reason: e.to_string(),
    })?;

    if !out.status.success() {
        let mut combined = String::from_utf8_lossy(&out.stdout).to_string();
        combined.push_str(&String::from_utf8_lossy(&out.stderr));
        return Err(BuildError::Command {
            command,
            dir: dir.to_path_buf(),
            code: out.status.code(),
            output_tail: tail(&combined, OUTPUT_TAIL_LINES),
        });
    }

    output::detail(&format!("{} ok", command));
    Ok(())
}

fn tail(text: &str, lines: usize) -> String {
    let all: Vec<&str> = text.lines().collect();
    all[all.len().saturating_sub(lines)..].join("\n")
}
