//! Upstream version listing
//!
//! Reads a mirror's directory index and collects the versions that have a
//! `{package}-{version}.tar.gz` entry. Mirrors are tried in order like
//! downloads; one that answers but lists nothing counts as a failure.

use crate::core::config::MirrorList;
use crate::core::output;
use std::cmp::Ordering;
use std::collections::BTreeSet;
use std::fmt;

use super::download::{FetchError, Fetcher, MirrorError};

/// Every mirror failed to produce a version list.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ListFailure {
    pub errors: Vec<MirrorError>,
}

impl fmt::Display for ListFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.errors.is_empty() {
            return write!(f, "no mirrors configured");
        }
        write!(f, "no mirror produced a version list")?;
        for err in &self.errors {
            write!(f, "\n  {}", err)?;
        }
        Ok(())
    }
}

impl std::error::Error for ListFailure {}

/// Fetch the version list from the first mirror that has one.
pub fn list_versions(
    fetcher: &Fetcher,
    mirrors: &MirrorList,
    package: &str,
) -> Result<Vec<String>, ListFailure> {
    let mut errors = Vec::new();

    for mirror in mirrors.iter() {
        let url = format!("{}/", mirror.trim_end_matches('/'));
        output::detail(&format!("trying {}", url));

        let error = match fetcher.get_text(&url) {
            Ok(index) => {
                let versions = parse_versions(&index, package);
                if !versions.is_empty() {
                    output::detail(&format!("{} version(s) listed at {}", versions.len(), url));
                    return Ok(versions);
                }
                FetchError::Unusable(format!("no {} tarballs listed", package))
            }
            Err(e) => e,
        };

        output::attempt_failed(&url, &error.to_string());
        errors.push(MirrorError {
            mirror: mirror.to_string(),
            url,
            error,
        });
    }

    Err(ListFailure { errors })
}

/// Extract versions from a directory index, sorted ascending.
///
/// Signature entries are ignored, as are aliases such as
/// `gettext-latest.tar.gz` that do not start with a digit.
pub fn parse_versions(index: &str, package: &str) -> Vec<String> {
    let prefix = format!("{}-", package);
    let mut found = BTreeSet::new();
    let mut rest = index;

    while let Some(pos) = rest.find(&prefix) {
        let at_boundary = rest[..pos]
            .chars()
            .next_back()
            .is_none_or(|c| !(c.is_ascii_alphanumeric() || c == '-' || c == '_'));
        let after = &rest[pos + prefix.len()..];
        let end = after
            .find(|c: char| !(c.is_ascii_alphanumeric() || matches!(c, '.' | '_' | '+' | '-')))
            .unwrap_or(after.len());

        if at_boundary
            && let Some(version) = after[..end].strip_suffix(".tar.gz")
            && version.starts_with(|c: char| c.is_ascii_digit())
        {
            found.insert(version.to_string());
        }

        rest = &after[end..];
    }

    let mut versions: Vec<String> = found.into_iter().collect();
    versions.sort_by(|a, b| compare_versions(a, b));
    versions
}

/// Compare dotted versions segment by segment.
///
/// Leading digits of a segment compare numerically, any remainder lexically;
/// a version that runs out of segments first is the smaller one.
pub fn compare_versions(a: &str, b: &str) -> Ordering {
    let mut left = a.split(['.', '-']);
    let mut right = b.split(['.', '-']);

    loop {
        match (left.next(), right.next()) {
            (None, None) => return Ordering::Equal,
            (None, Some(_)) => return Ordering::Less,
            (Some(_), None) => return Ordering::Greater,
            (Some(l), Some(r)) => {
                let ord = compare_segment(l, r);
                if ord != Ordering::Equal {
                    return ord;
                }
            }
        }
    }
}

fn compare_segment(a: &str, b: &str) -> Ordering {
    let (a_num, a_rest) = split_numeric(a);
    let (b_num, b_rest) = split_numeric(b);

    match (a_num, b_num) {
        (Some(x), Some(y)) => x.cmp(&y).then_with(|| a_rest.cmp(b_rest)),
        // Numeric segments sort before purely alphabetic ones
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => a.cmp(b),
    }
}

fn split_numeric(segment: &str) -> (Option<u64>, &str) {
    let digits = segment
        .find(|c: char| !c.is_ascii_digit())
        .unwrap_or(segment.len());
    (segment[..digits].parse().ok(), &segment[digits..])
}
