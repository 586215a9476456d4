//! Tests for the gettext-fetch and gettext-versions binaries.
//!
//! These run the real binaries against mock mirrors. None of them needs gpg:
//! they either skip verification or fail before gpg would run.

mod common;

use common::*;
use std::process::Command;
use wiremock::MockServer;

// =============================================================================
// Help and argument handling
// =============================================================================

#[test]
fn test_fetch_help() {
    let output = Command::new(env!("CARGO_BIN_EXE_gettext-fetch"))
        .arg("--help")
        .output()
        .unwrap();

    assert!(output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("--allow-insecure"));
    assert!(stdout.contains("--skip-verify"));
    assert!(stdout.contains("--mirror"));
    assert!(stdout.contains("<VERSION>"));
}

#[test]
fn test_fetch_version_flag() {
    let output = Command::new(env!("CARGO_BIN_EXE_gettext-fetch"))
        .arg("--version")
        .output()
        .unwrap();

    assert_eq!(output.status.code(), Some(0));
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains(env!("CARGO_PKG_VERSION")));
}

#[test]
fn test_fetch_requires_version() {
    let output = Command::new(env!("CARGO_BIN_EXE_gettext-fetch"))
        .output()
        .unwrap();
    assert!(!output.status.success());
}

#[test]
fn test_unknown_platform_rejected() {
    let dir = tempfile::tempdir().unwrap();
    let config = write_config(&dir.path().join("config"), &["https://m1/".into()], &[TRUSTED_KEY]);

    let output = fetch_cmd(&config, &dir.path().join("out"))
        .args([VERSION, "--build", "solaris-sparc"])
        .output()
        .unwrap();

    assert!(!output.status.success());
    assert!(stderr(&output).contains("solaris-sparc"));
}

// =============================================================================
// Configuration errors happen before any network activity
// =============================================================================

#[tokio::test]
async fn test_missing_key_file_is_fatal_before_network() {
    let m1 = MockServer::start().await;
    serve(&m1, TARBALL, 200, b"never served", 0).await;

    let dir = tempfile::tempdir().unwrap();
    let config = write_config(&dir.path().join("config"), &[base(&m1)], &[TRUSTED_KEY]);
    std::fs::remove_file(config.join("keys.txt")).unwrap();

    let output = fetch_cmd(&config, &dir.path().join("out"))
        .arg(VERSION)
        .output()
        .unwrap();

    assert_eq!(output.status.code(), Some(1));
    assert!(stderr(&output).contains("key file not found"));
}

#[tokio::test]
async fn test_empty_mirror_file_without_cli_mirror_is_fatal() {
    let dir = tempfile::tempdir().unwrap();
    let config = write_config(&dir.path().join("config"), &["# nothing here".into()], &[TRUSTED_KEY]);

    let output = fetch_cmd(&config, &dir.path().join("out"))
        .arg(VERSION)
        .output()
        .unwrap();

    assert_eq!(output.status.code(), Some(1));
    assert!(stderr(&output).contains("mirror list is empty"));
}

#[tokio::test]
async fn test_cli_mirror_fills_empty_mirror_file() {
    let m1 = MockServer::start().await;
    serve(&m1, TARBALL, 200, &release_tarball(), 1).await;

    let dir = tempfile::tempdir().unwrap();
    let config = write_config(&dir.path().join("config"), &[], &[TRUSTED_KEY]);
    let out = dir.path().join("out");

    let output = fetch_cmd(&config, &out)
        .args([VERSION, "--skip-verify", "--mirror"])
        .arg(base(&m1))
        .output()
        .unwrap();

    assert_eq!(output.status.code(), Some(0), "stderr: {}", stderr(&output));
    assert!(out.join(TARBALL).is_file());
}

// =============================================================================
// Trust gate outcomes
// =============================================================================

#[tokio::test]
async fn test_skip_verify_is_loud_and_never_fetches_signature() {
    let m1 = MockServer::start().await;
    serve(&m1, TARBALL, 200, &release_tarball(), 1).await;
    serve(&m1, SIGNATURE, 200, b"sig", 0).await;

    let dir = tempfile::tempdir().unwrap();
    let config = write_config(&dir.path().join("config"), &[base(&m1)], &[TRUSTED_KEY]);
    let out = dir.path().join("out");

    let output = fetch_cmd(&config, &out)
        .args([VERSION, "--skip-verify"])
        .output()
        .unwrap();

    assert_eq!(output.status.code(), Some(0));
    let err = stderr(&output);
    assert!(err.contains("SIGNATURE VERIFICATION DISABLED"));
    assert!(err.contains("accepted-unverified"));
    assert!(err.contains("sha256"));
    assert!(out.join(TARBALL).is_file());
    assert!(!out.join(SIGNATURE).exists());
}

#[tokio::test]
async fn test_missing_signature_aborts_by_default() {
    let m1 = MockServer::start().await;
    serve(&m1, TARBALL, 200, &release_tarball(), 1).await;
    serve(&m1, SIGNATURE, 404, b"", 1).await;

    let dir = tempfile::tempdir().unwrap();
    let config = write_config(&dir.path().join("config"), &[base(&m1)], &[TRUSTED_KEY]);

    let output = fetch_cmd(&config, &dir.path().join("out"))
        .arg(VERSION)
        .output()
        .unwrap();

    assert_eq!(output.status.code(), Some(1));
    let err = stderr(&output);
    assert!(err.contains("rejected"));
    assert!(err.contains("--allow-insecure"));
}

#[tokio::test]
async fn test_missing_signature_allowed_insecure() {
    let m1 = MockServer::start().await;
    serve(&m1, TARBALL, 200, &release_tarball(), 1).await;
    serve(&m1, SIGNATURE, 404, b"", 1).await;

    let dir = tempfile::tempdir().unwrap();
    let config = write_config(&dir.path().join("config"), &[base(&m1)], &[TRUSTED_KEY]);

    let output = fetch_cmd(&config, &dir.path().join("out"))
        .args([VERSION, "--allow-insecure"])
        .output()
        .unwrap();

    assert_eq!(output.status.code(), Some(0));
    let err = stderr(&output);
    assert!(err.contains("warning:"));
    assert!(err.contains("accepted-unverified"));
}

#[tokio::test]
async fn test_unavailable_tarball_exits_one() {
    let m1 = MockServer::start().await;
    let m2 = MockServer::start().await;
    serve(&m1, TARBALL, 404, b"", 1).await;
    serve(&m2, TARBALL, 503, b"", 1).await;

    let dir = tempfile::tempdir().unwrap();
    let config = write_config(&dir.path().join("config"), &[base(&m1), base(&m2)], &[TRUSTED_KEY]);

    let output = fetch_cmd(&config, &dir.path().join("out"))
        .args([VERSION, "--allow-insecure"])
        .output()
        .unwrap();

    assert_eq!(output.status.code(), Some(1));
    let err = stderr(&output);
    assert!(err.contains("HTTP status 404"));
    assert!(err.contains("HTTP status 503"));
}

#[tokio::test]
async fn test_locked_output_dir_is_fatal() {
    let m1 = MockServer::start().await;
    serve(&m1, TARBALL, 200, b"", 0).await;

    let dir = tempfile::tempdir().unwrap();
    let config = write_config(&dir.path().join("config"), &[base(&m1)], &[TRUSTED_KEY]);
    let out = dir.path().join("out");
    let _held = gettext_dist::core::lock::acquire_output_lock(&out).unwrap();

    let output = fetch_cmd(&config, &out)
        .args([VERSION, "--skip-verify"])
        .output()
        .unwrap();

    assert_eq!(output.status.code(), Some(1));
    assert!(stderr(&output).contains("in use by another run"));
}

// =============================================================================
// gettext-versions
// =============================================================================

const INDEX: &str = r#"<html><body>
<a href="gettext-0.22.5.tar.gz">gettext-0.22.5.tar.gz</a>
<a href="gettext-0.22.5.tar.gz.sig">gettext-0.22.5.tar.gz.sig</a>
<a href="gettext-0.26.tar.gz">gettext-0.26.tar.gz</a>
<a href="gettext-0.9.tar.gz">gettext-0.9.tar.gz</a>
</body></html>"#;

#[tokio::test]
async fn test_versions_lists_sorted_on_stdout() {
    let down = MockServer::start().await;
    serve(&down, "", 500, b"", 1).await;
    let up = MockServer::start().await;
    serve(&up, "", 200, INDEX.as_bytes(), 1).await;

    let dir = tempfile::tempdir().unwrap();
    let mirrors = dir.path().join("mirrors.txt");
    std::fs::write(&mirrors, format!("{}\n{}\n", base(&down), base(&up))).unwrap();

    let output = Command::new(env!("CARGO_BIN_EXE_gettext-versions"))
        .arg("--mirrors-file")
        .arg(&mirrors)
        .env_remove("GETTEXT_DIST_SETTINGS")
        .output()
        .unwrap();

    assert!(output.status.success(), "stderr: {}", stderr(&output));
    assert_eq!(
        String::from_utf8_lossy(&output.stdout),
        "0.9\n0.22.5\n0.26\n"
    );
}

#[tokio::test]
async fn test_versions_all_mirrors_failing() {
    let down = MockServer::start().await;
    serve(&down, "", 404, b"", 1).await;

    let output = Command::new(env!("CARGO_BIN_EXE_gettext-versions"))
        .arg("--mirror")
        .arg(base(&down))
        .arg("--mirrors-file")
        .arg("/nonexistent/mirrors.txt")
        .env_remove("GETTEXT_DIST_SETTINGS")
        .output()
        .unwrap();

    assert_eq!(output.status.code(), Some(1));
    assert!(output.stdout.is_empty());
}
