//! Read-only bundle verification.
use super::checksums::parse_checksums;
use super::{BundlePaths, CHECKSUMS_FILE, REQUIRED_FILES};
use crate::model::VerificationResult;
use crate::util::{read_json_object, resolve_user_path, sha256_file};
use anyhow::{Context, Result};
use serde_json::{Map, Value};
use std::fs;
use std::path::Path;

/// Re-check structure, checksums, and manifest consistency of a bundle.
///
/// Findings accumulate; nothing here returns early except a missing bundle
/// directory. The bundle is never modified.
pub fn verify(bundle_dir: &Path) -> VerificationResult {
    let root = resolve_user_path(bundle_dir);
    if !root.is_dir() {
        return VerificationResult::from_findings(
            0,
            vec![format!("Bundle directory not found: {}", root.display())],
            Vec::new(),
        );
    }
    let paths = BundlePaths::new(root);
    let mut errors = Vec::new();
    let mut warnings = Vec::new();

    for name in REQUIRED_FILES {
        if !paths.resolve(name).exists() {
            errors.push(format!("Missing required file: {name}"));
        }
    }

    let manifest = if paths.manifest_path().exists() {
        match read_json_object(&paths.manifest_path()) {
            Ok(manifest) => Some(manifest),
            Err(err) => {
                errors.push(format!("Invalid manifest.json: {err:#}"));
                None
            }
        }
    } else {
        None
    };

    let mut checked_files = 0;
    if paths.checksums_path().exists() {
        let entries = fs::read_to_string(paths.checksums_path())
            .context("read checksums.sha256")
            .and_then(|text| parse_checksums(&text));
        match entries {
            Ok(entries) => {
                for entry in entries {
                    if entry.rel_path == CHECKSUMS_FILE {
                        warnings.push("checksums.sha256 should not include itself".to_string());
                        continue;
                    }
                    let target = paths.resolve(&entry.rel_path);
                    if !target.is_file() {
                        errors.push(format!("Checksum file missing target: {}", entry.rel_path));
                        continue;
                    }
                    checked_files += 1;
                    match sha256_file(&target) {
                        Ok(actual) if actual == entry.digest => {}
                        Ok(actual) => errors.push(format!(
                            "Checksum mismatch for {}: expected {}, observed {actual}",
                            entry.rel_path, entry.digest
                        )),
                        Err(err) => errors.push(format!(
                            "Checksum mismatch for {}: {err:#}",
                            entry.rel_path
                        )),
                    }
                }
            }
            Err(err) => errors.push(format!("Invalid checksums.sha256: {err:#}")),
        }
    }

    if let Some(manifest) = manifest {
        check_manifest_files(&paths, &manifest, &mut errors);
        if let Err(err) = check_decision_count(&paths, &manifest, &mut errors) {
            errors.push(format!("Unreadable decisions.jsonl: {err:#}"));
        }
    }

    if !errors.is_empty() {
        tracing::debug!(errors = errors.len(), "bundle verification failed");
    }
    VerificationResult::from_findings(checked_files, errors, warnings)
}

fn check_manifest_files(paths: &BundlePaths, manifest: &Map<String, Value>, errors: &mut Vec<String>) {
    let Some(files) = manifest.get("files").and_then(Value::as_array) else {
        errors.push("manifest.files must be a list".to_string());
        return;
    };
    let mut missing = Vec::new();
    for entry in files {
        let Some(rel) = entry.as_str() else {
            errors.push("manifest.files must contain only strings".to_string());
            break;
        };
        if !paths.resolve(rel).exists() {
            missing.push(rel.to_string());
        }
    }
    if !missing.is_empty() {
        missing.sort();
        errors.push(format!(
            "manifest.files contains missing files: {}",
            missing.join(", ")
        ));
    }
}

fn check_decision_count(
    paths: &BundlePaths,
    manifest: &Map<String, Value>,
    errors: &mut Vec<String>,
) -> Result<()> {
    let decisions_path = paths.decisions_path();
    if !decisions_path.exists() {
        return Ok(());
    }
    let Some(declared) = manifest.get("decision_count").and_then(Value::as_u64) else {
        return Ok(());
    };
    let text = fs::read_to_string(&decisions_path)
        .with_context(|| format!("read {}", decisions_path.display()))?;
    let observed = text.lines().filter(|line| !line.trim().is_empty()).count() as u64;
    if declared != observed {
        errors.push(format!(
            "Decision count mismatch: manifest={declared}, decisions.jsonl={observed}"
        ));
    }
    Ok(())
}
