//! `checksums.sha256` codec.
//!
//! Each line is `<64 hex digest>  <relative path>`, sha256sum style. The file
//! never lists itself.
use super::{BundlePaths, CHECKSUMS_FILE};
use crate::util::{collect_files_recursive, rel_path, sha256_file};
use anyhow::{anyhow, Context, Result};
use regex::Regex;
use std::fs;
use std::path::Path;

const SEPARATOR: &str = "  ";
const DIGEST_LEN: usize = 64;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChecksumEntry {
    pub digest: String,
    pub rel_path: String,
}

/// Bundle-relative paths of every file except the checksum file, sorted.
pub fn bundle_file_list(root: &Path) -> Result<Vec<String>> {
    let mut names = Vec::new();
    for path in collect_files_recursive(root)? {
        let rel = rel_path(root, &path)?;
        if rel != CHECKSUMS_FILE {
            names.push(rel);
        }
    }
    Ok(names)
}

/// Hash every bundle file and rewrite `checksums.sha256`.
pub fn write_checksums(paths: &BundlePaths) -> Result<Vec<ChecksumEntry>> {
    let mut entries = Vec::new();
    for rel in bundle_file_list(paths.root())? {
        let digest = sha256_file(&paths.resolve(&rel))?;
        tracing::debug!(path = %rel, digest = %digest, "hashed bundle file");
        entries.push(ChecksumEntry {
            digest,
            rel_path: rel,
        });
    }
    let target = paths.checksums_path();
    fs::write(&target, render_checksums(&entries))
        .with_context(|| format!("write {}", target.display()))?;
    Ok(entries)
}

pub fn render_checksums(entries: &[ChecksumEntry]) -> String {
    entries
        .iter()
        .map(|entry| format!("{}{SEPARATOR}{}\n", entry.digest, entry.rel_path))
        .collect()
}

/// Parse checksum lines, rejecting the whole file on the first malformed line.
///
/// The digest is followed by exactly two spaces; everything after them is the
/// path, taken verbatim. Blank lines are skipped.
pub fn parse_checksums(text: &str) -> Result<Vec<ChecksumEntry>> {
    let digest_pattern = Regex::new(r"^[0-9a-fA-F]{64}$").context("compile digest pattern")?;
    let mut entries = Vec::new();
    for (offset, line) in text.lines().enumerate() {
        let line_number = offset + 1;
        if line.is_empty() {
            continue;
        }
        let digest = line
            .get(..DIGEST_LEN)
            .filter(|digest| digest_pattern.is_match(digest))
            .ok_or_else(|| anyhow!("Invalid checksum digest on line {line_number}"))?;
        let rel = line
            .get(DIGEST_LEN..)
            .and_then(|rest| rest.strip_prefix(SEPARATOR))
            .filter(|rel| !rel.starts_with(' '))
            .ok_or_else(|| anyhow!("Invalid checksum format on line {line_number}"))?;
        if rel.is_empty() {
            return Err(anyhow!("Invalid checksum path on line {line_number}"));
        }
        entries.push(ChecksumEntry {
            digest: digest.to_ascii_lowercase(),
            rel_path: rel.to_string(),
        });
    }
    Ok(entries)
}
