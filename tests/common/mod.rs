//! Shared fixtures for integration tests.

#![allow(dead_code)]

use flate2::Compression;
use flate2::write::GzEncoder;
use std::path::{Path, PathBuf};
use std::process::{Command, Output};
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

pub const VERSION: &str = "0.26";
pub const TARBALL: &str = "gettext-0.26.tar.gz";
pub const SIGNATURE: &str = "gettext-0.26.tar.gz.sig";
pub const TRUSTED_KEY: &str = "B6301D9E1BBEAC08";

/// A small but real release tarball with a `gettext-0.26/` top directory.
pub fn release_tarball() -> Vec<u8> {
    let mut builder = tar::Builder::new(GzEncoder::new(Vec::new(), Compression::default()));
    for (name, content) in [
        ("gettext-0.26/README", "GNU gettext\n"),
        ("gettext-0.26/configure", "#!/bin/sh\nexit 0\n"),
        ("gettext-0.26/gettext-tools/src/msgfmt.c", "int main(void) { return 0; }\n"),
    ] {
        let mut header = tar::Header::new_gnu();
        header.set_size(content.len() as u64);
        header.set_mode(0o755);
        header.set_cksum();
        builder
            .append_data(&mut header, name, content.as_bytes())
            .unwrap();
    }
    builder.into_inner().unwrap().finish().unwrap()
}

/// Mount `body` at `/{file}` and require exactly `times` requests for it.
pub async fn serve(server: &MockServer, file: &str, status: u16, body: &[u8], times: u64) {
    Mock::given(method("GET"))
        .and(path(format!("/{}", file)))
        .respond_with(ResponseTemplate::new(status).set_body_bytes(body.to_vec()))
        .expect(times)
        .mount(server)
        .await;
}

/// Mirror base URL with the trailing slash real mirror lists carry.
pub fn base(server: &MockServer) -> String {
    format!("{}/", server.uri())
}

/// Write the line-oriented config files into `dir`.
pub fn write_config(dir: &Path, mirrors: &[String], keys: &[&str]) -> PathBuf {
    std::fs::create_dir_all(dir).unwrap();
    std::fs::write(dir.join("mirrors.txt"), mirrors.join("\n")).unwrap();
    std::fs::write(dir.join("keys.txt"), keys.join("\n")).unwrap();
    // Unroutable keyserver so nothing ever reaches the network
    std::fs::write(dir.join("keyservers.txt"), "hkp://127.0.0.1:9\n").unwrap();
    dir.to_path_buf()
}

pub fn fetch_cmd(config_dir: &Path, output_dir: &Path) -> Command {
    let mut cmd = Command::new(env!("CARGO_BIN_EXE_gettext-fetch"));
    cmd.arg("--mirrors-file")
        .arg(config_dir.join("mirrors.txt"))
        .arg("--keys-file")
        .arg(config_dir.join("keys.txt"))
        .arg("--keyservers-file")
        .arg(config_dir.join("keyservers.txt"))
        .arg("--output-dir")
        .arg(output_dir)
        .env_remove("GETTEXT_DIST_MIRRORS")
        .env_remove("GETTEXT_DIST_KEYS")
        .env_remove("GETTEXT_DIST_KEYSERVERS")
        .env_remove("GETTEXT_DIST_SETTINGS");
    cmd
}

pub fn stderr(output: &Output) -> String {
    String::from_utf8_lossy(&output.stderr).to_string()
}

pub fn have_gpg() -> bool {
    Command::new("gpg")
        .arg("--version")
        .output()
        .is_ok_and(|o| o.status.success())
}
