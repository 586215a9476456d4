//! Release artifact resolution
//!
//! Pure string composition: a version turns into a tarball and a detached
//! signature, each with a destination under the output directory. The
//! version is not validated; a bogus one simply 404s on every mirror.

use std::path::{Path, PathBuf};

/// One artifact to download.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchTarget {
    /// File name on the mirror, e.g. `gettext-0.26.tar.gz`
    pub filename: String,
    /// Where the downloaded file ends up
    pub dest: PathBuf,
}

impl FetchTarget {
    pub fn new(filename: impl Into<String>, output_dir: &Path) -> Self {
        let filename = filename.into();
        let dest = output_dir.join(&filename);
        Self { filename, dest }
    }

    /// Full URL of this artifact on `mirror`.
    pub fn url_on(&self, mirror: &str) -> String {
        mirror_url(mirror, &self.filename)
    }
}

/// The artifacts that make up one upstream release.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Release {
    pub package: String,
    pub version: String,
    pub tarball: FetchTarget,
    pub signature: FetchTarget,
}

impl Release {
    /// Resolve `{package}-{version}.tar.gz` and its `.sig` sibling under
    /// `output_dir`.
    pub fn resolve(package: &str, version: &str, output_dir: &Path) -> Self {
        let tarball = format!("{}-{}.tar.gz", package, version);
        let signature = format!("{}.sig", tarball);
        Self {
            package: package.to_string(),
            version: version.to_string(),
            tarball: FetchTarget::new(tarball, output_dir),
            signature: FetchTarget::new(signature, output_dir),
        }
    }

    /// Directory name used for the extracted source tree
    pub fn source_dir_name(&self) -> String {
        format!("{}-{}-src", self.package, self.version)
    }
}

/// Join a mirror base and a file name with exactly one `/` between them.
pub fn mirror_url(mirror: &str, filename: &str) -> String {
    format!("{}/{}", mirror.trim_end_matches('/'), filename)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_resolve_filenames() {
        let release = Release::resolve("gettext", "0.26", Path::new("downloads"));
        assert_eq!(release.tarball.filename, "gettext-0.26.tar.gz");
        assert_eq!(release.signature.filename, "gettext-0.26.tar.gz.sig");
    }

    #[test]
    fn test_resolve_destinations_under_output_dir() {
        let release = Release::resolve("gettext", "0.26", Path::new("/tmp/out"));
        assert_eq!(release.tarball.dest, PathBuf::from("/tmp/out/gettext-0.26.tar.gz"));
        assert_eq!(release.signature.dest, PathBuf::from("/tmp/out/gettext-0.26.tar.gz.sig"));
    }

    #[test]
    fn test_version_is_not_validated() {
        let release = Release::resolve("gettext", "not a version", Path::new("."));
        assert_eq!(release.tarball.filename, "gettext-not a version.tar.gz");
    }

    #[test]
    fn test_mirror_url_trailing_slash() {
        assert_eq!(
            mirror_url("https://m1/", "gettext-0.26.tar.gz"),
            "https://m1/gettext-0.26.tar.gz"
        );
        assert_eq!(
            mirror_url("https://m1", "gettext-0.26.tar.gz"),
            "https://m1/gettext-0.26.tar.gz"
        );
        assert_eq!(
            mirror_url("https://ftp.gnu.org/gnu/gettext//", "x.sig"),
            "https://ftp.gnu.org/gnu/gettext/x.sig"
        );
    }

    #[test]
    fn test_url_on_mirror() {
        let release = Release::resolve("gettext", "0.22.5", Path::new("."));
        assert_eq!(
            release.signature.url_on("https://ftpmirror.gnu.org/gettext/"),
            "https://ftpmirror.gnu.org/gettext/gettext-0.22.5.tar.gz.sig"
        );
    }

    #[test]
    fn test_source_dir_name() {
        let release = Release::resolve("gettext", "0.26", Path::new("."));
        assert_eq!(release.source_dir_name(), "gettext-0.26-src");
    }
}
