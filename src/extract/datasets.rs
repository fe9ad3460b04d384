//! Dataset provenance loaded from external data manifests.
use super::{object_field, str_field};
use crate::model::DataProvenance;
use anyhow::{anyhow, Result};
use serde_json::{Map, Value};
use std::fs;
use std::path::{Path, PathBuf};

const RETAINED_METADATA: [&str; 3] = ["api_pages", "api_rows", "row_count"];

/// Parse one data manifest into a provenance record.
///
/// The error message is suitable for use as a build warning verbatim.
pub fn parse_data_manifest(path: &Path) -> Result<DataProvenance> {
    if !path.exists() {
        return Err(anyhow!("Missing data manifest: {}", path.display()));
    }
    let payload: Value = fs::read_to_string(path)
        .map_err(anyhow::Error::from)
        .and_then(|text| serde_json::from_str(&text).map_err(anyhow::Error::from))
        .map_err(|err| anyhow!("Failed to parse data manifest {}: {err}", path.display()))?;
    let Value::Object(payload) = payload else {
        return Err(anyhow!(
            "Data manifest is not a JSON object: {}",
            path.display()
        ));
    };

    let dataset_id = str_field(&payload, "dataset_id")
        .map(str::trim)
        .filter(|id| !id.is_empty())
        .ok_or_else(|| anyhow!("Data manifest missing dataset_id: {}", path.display()))?;

    let source = object_field(&payload, "source");
    let nested = |key: &str| source.and_then(|source| str_field(source, key));
    let source_url = nested("url").or_else(|| str_field(&payload, "source_url"));
    let sha256 = nested("sha256").or_else(|| str_field(&payload, "sha256"));

    let mut metadata = Map::new();
    let manifest_name = path
        .file_name()
        .map(|name| name.to_string_lossy().to_string())
        .unwrap_or_default();
    metadata.insert("manifest_name".to_string(), Value::String(manifest_name));
    for key in RETAINED_METADATA {
        metadata.insert(
            key.to_string(),
            payload.get(key).cloned().unwrap_or(Value::Null),
        );
    }

    Ok(DataProvenance {
        dataset_id: dataset_id.to_string(),
        version: coerce_version(payload.get("version")),
        source_url: source_url.map(str::to_string),
        sha256: sha256.map(str::to_string),
        license_name: str_field(&payload, "license_name").map(str::to_string),
        manifest_rel_path: None,
        metadata,
    })
}

fn coerce_version(value: Option<&Value>) -> Option<String> {
    match value? {
        Value::String(text) => Some(text.clone()),
        Value::Number(number) => Some(number.to_string()),
        _ => None,
    }
}

/// Load every manifest, skipping the ones that cannot be used.
///
/// Returns the parsed records in input order plus one warning per skipped file.
pub fn load_data_provenance_from_manifests(
    paths: &[PathBuf],
) -> (Vec<DataProvenance>, Vec<String>) {
    let mut records = Vec::new();
    let mut warnings = Vec::new();
    for path in paths {
        match parse_data_manifest(path) {
            Ok(record) => records.push(record),
            Err(err) => {
                tracing::warn!(path = %path.display(), "skipping data manifest");
                warnings.push(err.to_string());
            }
        }
    }
    (records, warnings)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn write(dir: &Path, name: &str, text: &str) -> PathBuf {
        let path = dir.join(name);
        fs::write(&path, text).expect("write manifest");
        path
    }

    #[test]
    fn nested_source_wins_over_top_level_fallbacks() {
        let dir = tempfile::tempdir().expect("temp dir");
        let path = write(
            dir.path(),
            "chembl.json",
            &json!({
                "dataset_id": " chembl_activity_ki_human ",
                "version": 33,
                "source": {"url": "https://example.org/chembl", "sha256": "a".repeat(64)},
                "source_url": "https://ignored.example.org",
                "license_name": "CC-BY-SA-3.0",
                "row_count": 1200
            })
            .to_string(),
        );
        let record = parse_data_manifest(&path).expect("parse manifest");
        assert_eq!(record.dataset_id, "chembl_activity_ki_human");
        assert_eq!(record.version.as_deref(), Some("33"));
        assert_eq!(
            record.source_url.as_deref(),
            Some("https://example.org/chembl")
        );
        assert_eq!(record.sha256, Some("a".repeat(64)));
        assert_eq!(record.metadata.get("row_count"), Some(&json!(1200)));
        assert_eq!(record.metadata.get("api_pages"), Some(&Value::Null));
        assert_eq!(
            record.metadata.get("manifest_name"),
            Some(&json!("chembl.json"))
        );
        assert!(record.manifest_rel_path.is_none());
    }

    #[test]
    fn top_level_fallbacks_fill_missing_source_fields() {
        let dir = tempfile::tempdir().expect("temp dir");
        let path = write(
            dir.path(),
            "flat.json",
            r#"{"dataset_id": "flat", "version": 1.5, "source": {"url": 3}, "source_url": "https://flat", "sha256": "b"}"#,
        );
        let record = parse_data_manifest(&path).expect("parse manifest");
        assert_eq!(record.version.as_deref(), Some("1.5"));
        assert_eq!(record.source_url.as_deref(), Some("https://flat"));
        assert_eq!(record.sha256.as_deref(), Some("b"));
        assert!(record.license_name.is_none());
    }

    #[test]
    fn unusable_manifests_become_warnings() {
        let dir = tempfile::tempdir().expect("temp dir");
        let good = write(dir.path(), "good.json", r#"{"dataset_id": "ok", "version": true}"#);
        let broken = write(dir.path(), "broken.json", "{not json");
        let list = write(dir.path(), "list.json", "[1, 2]");
        let blank = write(dir.path(), "blank.json", r#"{"dataset_id": "  "}"#);
        let missing = dir.path().join("missing.json");

        let (records, warnings) =
            load_data_provenance_from_manifests(&[good, broken, list, blank, missing]);
        assert_eq!(records.len(), 1);
        assert!(records[0].version.is_none());
        assert_eq!(warnings.len(), 4);
        assert!(warnings[0].starts_with("Failed to parse data manifest"));
        assert!(warnings[1].starts_with("Data manifest is not a JSON object"));
        assert!(warnings[2].starts_with("Data manifest missing dataset_id"));
        assert!(warnings[3].starts_with("Missing data manifest"));
    }
}
