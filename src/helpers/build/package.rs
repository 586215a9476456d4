//! Directory to `.tar.gz` packaging

use crate::core::output;
use crate::helpers::internal::fs_utils;
use flate2::Compression;
use flate2::write::GzEncoder;
use std::io::Write;
use std::path::{Path, PathBuf};

use super::BuildError;

/// Archive `src_dir` into `archive` with every entry under `top_level/`.
///
/// The archive is written to a temporary sibling and renamed into place.
/// Symlinks are stored as links, not followed.
pub fn package_dir(src_dir: &Path, archive: &Path, top_level: &str) -> Result<PathBuf, BuildError> {
    let io_err = |path: &Path| {
        let path = path.to_path_buf();
        move |source| BuildError::Io { path, source }
    };

    if !src_dir.is_dir() {
        return Err(BuildError::Io {
            path: src_dir.to_path_buf(),
            source: std::io::Error::new(std::io::ErrorKind::NotFound, "not a directory"),
        });
    }

    fs_utils::ensure_parent_dir(archive).map_err(io_err(archive))?;
    let tmp = tempfile::Builder::new()
        .prefix(".package.")
        .suffix(".part")
        .tempfile_in(fs_utils::parent_or_cwd(archive))
        .map_err(io_err(archive))?;

    let name = archive
        .file_name()
        .map(|s| s.to_string_lossy().to_string())
        .unwrap_or_default();
    let pb = output::build_spinner(&format!("packaging {}", name));

    let written = (|| -> std::io::Result<()> {
        let mut builder = tar::Builder::new(GzEncoder::new(tmp.as_file(), Compression::default()));
        builder.follow_symlinks(false);
        builder.append_dir_all(top_level, src_dir)?;
        let mut encoder = builder.into_inner()?;
        encoder.flush()?;
        encoder.finish()?.sync_all()
    })();
    pb.finish_and_clear();
    written.map_err(io_err(archive))?;

    tmp.persist(archive)
        .map_err(|e| BuildError::Io {
            path: archive.to_path_buf(),
            source: e.error,
        })?;

    output::detail(&format!("packaged {}", archive.display()));
    Ok(archive.to_path_buf())
}
