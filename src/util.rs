//! Hashing, identifier, and JSON persistence helpers shared by every stage.
use anyhow::{anyhow, Context, Result};
use serde::Serialize;
use serde_json::{Map, Value};
use sha2::{Digest, Sha256};
use std::fs;
use std::io::{Read, Write};
use std::path::{Path, PathBuf};

const CHUNK_SIZE: usize = 4 * 1024 * 1024;
const STABLE_ID_NAMESPACE: &str = "evidence-bundle";
const STABLE_ID_HEX_LEN: usize = 32;

/// Default character budget for decision and summary previews.
pub const PREVIEW_MAX_CHARS: usize = 1000;
const TRUNCATION_MARKER: &str = "...";

/// Current UTC time as an RFC 3339 string.
pub fn utc_now_iso() -> String {
    chrono::Utc::now().to_rfc3339()
}

pub fn sha256_hex(bytes: &[u8]) -> String {
    let mut hasher = Sha256::new();
    hasher.update(bytes);
    format!("{:x}", hasher.finalize())
}

/// Stream a file through SHA-256 without loading it fully into memory.
pub fn sha256_file(path: &Path) -> Result<String> {
    let mut file = fs::File::open(path).with_context(|| format!("open {}", path.display()))?;
    let mut hasher = Sha256::new();
    let mut buf = vec![0u8; CHUNK_SIZE];
    loop {
        let read = file
            .read(&mut buf)
            .with_context(|| format!("read {}", path.display()))?;
        if read == 0 {
            break;
        }
        hasher.update(&buf[..read]);
    }
    Ok(format!("{:x}", hasher.finalize()))
}

/// Deterministic identifier derived from an ordered tuple of strings.
///
/// Parts are trimmed and joined with `::` under a fixed namespace, so the same
/// tuple yields the same id on every run and platform.
pub fn stable_id(parts: &[&str]) -> String {
    let normalized = parts
        .iter()
        .map(|part| part.trim())
        .collect::<Vec<_>>()
        .join("::");
    let digest = sha256_hex(format!("{STABLE_ID_NAMESPACE}::{normalized}").as_bytes());
    digest[..STABLE_ID_HEX_LEN].to_string()
}

/// Recursively rebuild a JSON value with object keys in sorted order.
pub fn canonicalize(value: &Value) -> Value {
    match value {
        Value::Object(map) => {
            let mut keys: Vec<&String> = map.keys().collect();
            keys.sort();
            let mut sorted = Map::new();
            for key in keys {
                sorted.insert(key.clone(), canonicalize(&map[key]));
            }
            Value::Object(sorted)
        }
        Value::Array(items) => Value::Array(items.iter().map(canonicalize).collect()),
        other => other.clone(),
    }
}

/// Canonical single-line JSON rendering (sorted keys, non-ASCII escaped).
pub fn canonical_json(value: &Value) -> String {
    let rendered = serde_json::to_string(&canonicalize(value)).unwrap_or_default();
    escape_non_ascii(&rendered)
}

fn escape_non_ascii(text: &str) -> String {
    if text.is_ascii() {
        return text.to_string();
    }
    let mut out = String::with_capacity(text.len());
    for ch in text.chars() {
        if ch.is_ascii() {
            out.push(ch);
            continue;
        }
        let mut units = [0u16; 2];
        for unit in ch.encode_utf16(&mut units) {
            out.push_str(&format!("\\u{unit:04x}"));
        }
    }
    out
}

/// Render a value as canonical JSON bounded to `max_chars` characters.
///
/// Oversized renderings keep a prefix and end with `...`.
pub fn truncate_preview(value: &Value, max_chars: usize) -> String {
    let rendered = canonical_json(value);
    truncate_chars(&rendered, max_chars)
}

pub fn truncate_chars(text: &str, max_chars: usize) -> String {
    if text.chars().count() <= max_chars {
        return text.to_string();
    }
    let keep = max_chars.saturating_sub(TRUNCATION_MARKER.len());
    let mut truncated: String = text.chars().take(keep).collect();
    truncated.push_str(TRUNCATION_MARKER);
    truncated
}

/// Read a JSON file that must contain an object at the top level.
pub fn read_json_object(path: &Path) -> Result<Map<String, Value>> {
    let bytes = fs::read(path).with_context(|| format!("read {}", path.display()))?;
    let value: Value = serde_json::from_slice(&bytes)
        .with_context(|| format!("parse JSON {}", path.display()))?;
    match value {
        Value::Object(map) => Ok(map),
        _ => Err(anyhow!("JSON payload at {} must be an object", path.display())),
    }
}

/// Pretty-print a value to disk, creating parent directories as needed.
pub fn write_json<T: Serialize>(path: &Path, value: &T) -> Result<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).with_context(|| format!("create {}", parent.display()))?;
    }
    let mut text = serde_json::to_string_pretty(value)
        .with_context(|| format!("serialize {}", path.display()))?;
    text.push('\n');
    fs::write(path, text.as_bytes()).with_context(|| format!("write {}", path.display()))?;
    Ok(())
}

/// Write one JSON object per line.
pub fn write_jsonl<T: Serialize>(path: &Path, items: &[T]) -> Result<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).with_context(|| format!("create {}", parent.display()))?;
    }
    let mut file = fs::File::create(path).with_context(|| format!("create {}", path.display()))?;
    for item in items {
        let line = serde_json::to_string(item).context("serialize JSONL entry")?;
        file.write_all(line.as_bytes())
            .with_context(|| format!("write {}", path.display()))?;
        file.write_all(b"\n")
            .with_context(|| format!("write {}", path.display()))?;
    }
    Ok(())
}

/// Collect regular files under `root`, sorted by path.
pub fn collect_files_recursive(root: &Path) -> Result<Vec<PathBuf>> {
    let mut files = Vec::new();
    if !root.exists() {
        return Ok(files);
    }
    for entry in fs::read_dir(root).with_context(|| format!("read {}", root.display()))? {
        let entry = entry?;
        let path = entry.path();
        if path.is_dir() {
            files.extend(collect_files_recursive(&path)?);
        } else if path.is_file() {
            files.push(path);
        }
    }
    files.sort();
    Ok(files)
}

/// Forward-slash relative path of `path` under `root`.
pub fn rel_path(root: &Path, path: &Path) -> Result<String> {
    let rel = path
        .strip_prefix(root)
        .with_context(|| format!("{} is not under {}", path.display(), root.display()))?;
    let parts: Vec<String> = rel
        .components()
        .map(|part| part.as_os_str().to_string_lossy().to_string())
        .collect();
    Ok(parts.join("/"))
}

/// Expand a leading `~` and make the path absolute against the working directory.
pub fn resolve_user_path(path: &Path) -> PathBuf {
    let expanded = match path.strip_prefix("~") {
        Ok(rest) => match dirs::home_dir() {
            Some(home) => home.join(rest),
            None => path.to_path_buf(),
        },
        Err(_) => path.to_path_buf(),
    };
    if expanded.is_absolute() {
        return expanded;
    }
    match std::env::current_dir() {
        Ok(cwd) => cwd.join(expanded),
        Err(_) => expanded,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn stable_id_is_deterministic_and_trims_parts() {
        let first = stable_id(&["run", "1", "objective", ""]);
        let second = stable_id(&[" run ", "1", "objective", ""]);
        assert_eq!(first, second);
        assert_eq!(first.len(), 32);
        assert!(first.chars().all(|ch| ch.is_ascii_hexdigit()));
        assert_ne!(first, stable_id(&["other", "1", "objective", ""]));
    }

    #[test]
    fn canonical_json_sorts_keys_and_escapes_non_ascii() {
        let value = json!({"b": 1, "a": {"z": true, "y": "é"}});
        assert_eq!(
            canonical_json(&value),
            r#"{"a":{"y":"\u00e9","z":true},"b":1}"#
        );
    }

    #[test]
    fn truncate_preview_marks_oversized_values() {
        let value = json!("x".repeat(5000));
        let preview = truncate_preview(&value, PREVIEW_MAX_CHARS);
        assert_eq!(preview.chars().count(), PREVIEW_MAX_CHARS);
        assert!(preview.ends_with("..."));

        let short = truncate_preview(&json!({"k": 1}), PREVIEW_MAX_CHARS);
        assert_eq!(short, r#"{"k":1}"#);
    }

    #[test]
    fn sha256_file_matches_in_memory_digest() {
        let dir = tempfile::tempdir().expect("create temp dir");
        let path = dir.path().join("blob.bin");
        std::fs::write(&path, b"evidence").expect("write blob");
        assert_eq!(
            sha256_file(&path).expect("hash file"),
            sha256_hex(b"evidence")
        );
    }

    #[test]
    fn rel_path_uses_forward_slashes() {
        let root = Path::new("/bundle");
        let nested = root.join("artifacts").join("campaign_run.json");
        assert_eq!(
            rel_path(root, &nested).expect("relative path"),
            "artifacts/campaign_run.json"
        );
        assert!(rel_path(root, Path::new("/elsewhere/file")).is_err());
    }
}
