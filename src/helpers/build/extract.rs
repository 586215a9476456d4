//! Native tarball extraction (no external tools needed)
//!
//! Release tarballs wrap everything in a single `{pkg}-{version}/` directory.
//! [`extract_source`] strips that component so the tree lands directly in the
//! destination, and refuses any entry that would write outside it.

use crate::core::output;
use crate::helpers::internal::fs_utils::{is_safe_path, normalize_lexical};
use std::fs::File;
use std::io::{BufReader, Read};
use std::path::{Component, Path, PathBuf};

use super::BuildError;

type Result<T> = std::result::Result<T, String>;

/// Extract a `.tar.gz` into `dest`, dropping the leading path component.
///
/// `dest` is recreated from scratch so files from an earlier run never mix
/// with the new tree.
pub fn extract_source(archive: &Path, dest: &Path) -> std::result::Result<(), BuildError> {
    let fail = |reason: String| BuildError::Extract {
        archive: archive.to_path_buf(),
        reason,
    };

    if dest.exists() {
        std::fs::remove_dir_all(dest).map_err(|source| BuildError::Io {
            path: dest.to_path_buf(),
            source,
        })?;
    }
    std::fs::create_dir_all(dest).map_err(|source| BuildError::Io {
        path: dest.to_path_buf(),
        source,
    })?;

    let filename = archive
        .file_name()
        .map(|s| s.to_string_lossy().to_string())
        .unwrap_or_else(|| "archive".to_string());

    let pb = output::build_spinner(&format!("extracting {}", filename));
    let result = File::open(archive)
        .map_err(|e| format!("cannot open: {}", e))
        .and_then(|file| {
            let decoder = flate2::read::GzDecoder::new(BufReader::new(file));
            extract_tar(decoder, dest, 1)
        });
    pb.finish_and_clear();

    result.map_err(fail)?;
    output::detail(&format!("extracted {} to {}", filename, dest.display()));
    Ok(())
}

/// Drop the first `strip` normal components; `None` when nothing remains.
fn strip_components(path: &Path, strip: usize) -> Option<PathBuf> {
    let rest: PathBuf = path
        .components()
        .filter(|c| !matches!(c, Component::CurDir))
        .skip(strip)
        .collect();
    (!rest.as_os_str().is_empty()).then_some(rest)
}

fn ensure_no_symlink_components(dest: &Path, full_path: &Path) -> Result<()> {
    let rel = full_path
        .strip_prefix(dest)
        .map_err(|_| format!("tar contains path outside destination: {}", full_path.display()))?;

    // Writing through an existing symlink could escape `dest`
    let mut cur = dest.to_path_buf();
    for comp in rel.components() {
        cur.push(comp);
        if let Ok(md) = std::fs::symlink_metadata(&cur)
            && md.file_type().is_symlink()
        {
            return Err(format!(
                "tar extraction blocked: symlink in path component: {}",
                cur.display()
            ));
        }
    }

    Ok(())
}

fn ensure_within_dest(dest: &Path, candidate: &Path, what: &str) -> Result<()> {
    if normalize_lexical(candidate)
        .strip_prefix(normalize_lexical(dest))
        .is_err()
    {
        return Err(format!(
            "tar contains unsafe link target (escapes dest): {} -> {}",
            what,
            candidate.display()
        ));
    }
    Ok(())
}

fn reject_absolute(link_name: &Path) -> Result<()> {
    if link_name.is_absolute()
        || link_name
            .components()
            .any(|c| matches!(c, Component::Prefix(_) | Component::RootDir))
    {
        return Err(format!(
            "tar contains unsafe link target (absolute): {}",
            link_name.display()
        ));
    }
    Ok(())
}

fn extract_tar<R: Read>(reader: R, dest: &Path, strip: usize) -> Result<()> {
    let mut archive = tar::Archive::new(reader);

    for entry in archive
        .entries()
        .map_err(|e| format!("tar read error: {}", e))?
    {
        let mut entry = entry.map_err(|e| format!("tar entry error: {}", e))?;
        let path = entry
            .path()
            .map_err(|e| format!("tar path error: {}", e))?
            .into_owned();

        if !is_safe_path(&path) {
            return Err(format!("tar contains unsafe path: {}", path.display()));
        }

        // The wrapping directory itself, or a "." entry
        let Some(rel) = strip_components(&path, strip) else {
            continue;
        };
        let full_path = dest.join(&rel);
        ensure_no_symlink_components(dest, &full_path)?;

        if let Some(parent) = full_path.parent() {
            ensure_no_symlink_components(dest, parent)?;
            std::fs::create_dir_all(parent)
                .map_err(|e| format!("cannot create directory {}: {}", parent.display(), e))?;
        }

        let entry_type = entry.header().entry_type();
        if entry_type == tar::EntryType::Symlink {
            let link_name = entry
                .link_name()
                .map_err(|e| format!("tar link_name error: {}", e))?
                .ok_or_else(|| format!("tar contains symlink without link target: {}", path.display()))?;
            reject_absolute(&link_name)?;
            let link_parent = full_path.parent().unwrap_or(dest);
            ensure_within_dest(dest, &link_parent.join(&link_name), &path.to_string_lossy())?;
        } else if entry_type == tar::EntryType::Link {
            // Hard link targets name another archive member, so they are
            // stripped the same way and created by hand
            let link_name = entry
                .link_name()
                .map_err(|e| format!("tar link_name error: {}", e))?
                .ok_or_else(|| format!("tar contains hardlink without link target: {}", path.display()))?
                .into_owned();
            reject_absolute(&link_name)?;
            if link_name.components().any(|c| c == Component::ParentDir) {
                return Err(format!(
                    "tar contains unsafe link target (escapes dest): {} -> {}",
                    path.display(),
                    link_name.display()
                ));
            }
            let target = strip_components(&link_name, strip)
                .map(|t| dest.join(t))
                .ok_or_else(|| format!("tar contains hardlink to archive root: {}", path.display()))?;
            ensure_no_symlink_components(dest, &target)?;
            std::fs::hard_link(&target, &full_path)
                .map_err(|e| format!("cannot link {}: {}", rel.display(), e))?;
            continue;
        }

        entry
            .unpack(&full_path)
            .map_err(|e| format!("unpack error for {}: {}", path.display(), e))?;
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use flate2::Compression;
    use flate2::write::GzEncoder;

    fn file_header(len: usize) -> tar::Header {
        let mut header = tar::Header::new_gnu();
        header.set_size(len as u64);
        header.set_mode(0o644);
        header.set_cksum();
        header
    }

    fn link_header(kind: tar::EntryType, target: &str) -> tar::Header {
        let mut header = tar::Header::new_gnu();
        header.set_entry_type(kind);
        header.set_size(0);
        header.set_mode(0o777);
        header.set_link_name(target).unwrap();
        header.set_cksum();
        header
    }

    fn write_archive(path: &Path, fill: impl FnOnce(&mut tar::Builder<GzEncoder<File>>)) {
        let file = File::create(path).unwrap();
        let mut builder = tar::Builder::new(GzEncoder::new(file, Compression::default()));
        fill(&mut builder);
        builder.into_inner().unwrap().finish().unwrap();
    }

    #[test]
    fn test_strip_components() {
        assert_eq!(
            strip_components(Path::new("gettext-0.26/configure"), 1),
            Some(PathBuf::from("configure"))
        );
        assert_eq!(
            strip_components(Path::new("./gettext-0.26/a/b.c"), 1),
            Some(PathBuf::from("a/b.c"))
        );
        assert_eq!(strip_components(Path::new("gettext-0.26/"), 1), None);
        assert_eq!(strip_components(Path::new("."), 1), None);
    }

    #[test]
    fn test_extract_strips_top_directory() {
        let temp_dir = tempfile::tempdir().unwrap();
        let archive_path = temp_dir.path().join("gettext-0.26.tar.gz");
        let dest = temp_dir.path().join("gettext-0.26-src");

        write_archive(&archive_path, |b| {
            let content = b"#!/bin/sh\necho configured\n";
            b.append_data(&mut file_header(content.len()), "gettext-0.26/configure", &content[..])
                .unwrap();
            let nested = b"int main(void) { return 0; }\n";
            b.append_data(
                &mut file_header(nested.len()),
                "gettext-0.26/gettext-tools/src/main.c",
                &nested[..],
            )
            .unwrap();
        });

        extract_source(&archive_path, &dest).unwrap();

        assert!(dest.join("configure").is_file());
        assert_eq!(
            std::fs::read_to_string(dest.join("gettext-tools/src/main.c")).unwrap(),
            "int main(void) { return 0; }\n"
        );
        assert!(!dest.join("gettext-0.26").exists());
    }

    #[test]
    fn test_extract_replaces_previous_tree() {
        let temp_dir = tempfile::tempdir().unwrap();
        let archive_path = temp_dir.path().join("pkg.tar.gz");
        let dest = temp_dir.path().join("src");
        std::fs::create_dir_all(&dest).unwrap();
        std::fs::write(dest.join("stale.o"), "old").unwrap();

        write_archive(&archive_path, |b| {
            b.append_data(&mut file_header(2), "pkg/new.c", &b"x\n"[..])
                .unwrap();
        });

        extract_source(&archive_path, &dest).unwrap();
        assert!(dest.join("new.c").exists());
        assert!(!dest.join("stale.o").exists());
    }

    #[test]
    fn test_extract_hardlink_inside_tree() {
        let temp_dir = tempfile::tempdir().unwrap();
        let archive_path = temp_dir.path().join("pkg.tar.gz");
        let dest = temp_dir.path().join("src");

        write_archive(&archive_path, |b| {
            b.append_data(&mut file_header(5), "pkg/orig.txt", &b"hello"[..])
                .unwrap();
            b.append_data(
                &mut link_header(tar::EntryType::Link, "pkg/orig.txt"),
                "pkg/copy.txt",
                std::io::empty(),
            )
            .unwrap();
        });

        extract_source(&archive_path, &dest).unwrap();
        assert_eq!(std::fs::read_to_string(dest.join("copy.txt")).unwrap(), "hello");
    }

    #[test]
    fn test_extract_blocks_symlink_escape() {
        let temp_dir = tempfile::tempdir().unwrap();
        let archive_path = temp_dir.path().join("escape.tar.gz");
        let dest = temp_dir.path().join("src");

        // "a" -> "/" followed by a write through "a/evil.txt"
        write_archive(&archive_path, |b| {
            b.append_data(
                &mut link_header(tar::EntryType::Symlink, "/"),
                "pkg/a",
                std::io::empty(),
            )
            .unwrap();
            b.append_data(&mut file_header(5), "pkg/a/evil.txt", &b"pwned"[..])
                .unwrap();
        });

        let err = extract_source(&archive_path, &dest).unwrap_err();
        let msg = err.to_string();
        assert!(
            msg.contains("unsafe link target") || msg.contains("symlink"),
            "expected link/symlink safety error, got: {msg}"
        );
        assert!(!dest.join("a/evil.txt").exists());
    }

    #[test]
    fn test_extract_blocks_relative_symlink_escape() {
        let temp_dir = tempfile::tempdir().unwrap();
        let archive_path = temp_dir.path().join("escape.tar.gz");
        let dest = temp_dir.path().join("src");

        write_archive(&archive_path, |b| {
            b.append_data(
                &mut link_header(tar::EntryType::Symlink, "../../outside"),
                "pkg/up",
                std::io::empty(),
            )
            .unwrap();
        });

        let err = extract_source(&archive_path, &dest).unwrap_err();
        assert!(err.to_string().contains("escapes dest"), "got: {err}");
    }

    #[test]
    fn test_extract_blocks_hardlink_outside_dest() {
        let temp_dir = tempfile::tempdir().unwrap();
        let archive_path = temp_dir.path().join("hardlink.tar.gz");
        let dest = temp_dir.path().join("src");

        write_archive(&archive_path, |b| {
            b.append_data(
                &mut link_header(tar::EntryType::Link, "/etc/passwd"),
                "pkg/hl",
                std::io::empty(),
            )
            .unwrap();
        });

        let err = extract_source(&archive_path, &dest).unwrap_err();
        assert!(
            err.to_string().contains("unsafe link target"),
            "expected unsafe link target error, got: {err}"
        );
    }

    #[test]
    fn test_extract_missing_archive() {
        let temp_dir = tempfile::tempdir().unwrap();
        let err = extract_source(
            &temp_dir.path().join("missing.tar.gz"),
            &temp_dir.path().join("src"),
        )
        .unwrap_err();
        assert!(matches!(err, BuildError::Extract { .. }));
        assert!(err.to_string().contains("cannot open"));
    }
}
