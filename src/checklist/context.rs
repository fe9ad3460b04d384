//! Read-only view of a bundle used by every check.
use crate::bundle::{verify, BundlePaths};
use crate::model::VerificationResult;
use crate::util::read_json_object;
use serde_json::{Map, Value};
use std::collections::BTreeSet;
use std::fs;
use std::path::{Path, PathBuf};

type JsonObject = Map<String, Value>;

/// Everything checks may read, loaded once per evaluation.
///
/// Missing or malformed files load as `None` or empty; checks decide what
/// that means.
#[derive(Debug, Clone)]
pub struct ChecklistContext {
    pub bundle_dir: PathBuf,
    pub manifest: Option<JsonObject>,
    pub lineage: Option<JsonObject>,
    pub decisions: Vec<JsonObject>,
    pub campaign_run: Option<JsonObject>,
    pub verification: VerificationResult,
}

impl ChecklistContext {
    pub fn load(bundle_dir: &Path) -> Self {
        let paths = BundlePaths::new(bundle_dir.to_path_buf());
        Self {
            manifest: read_optional(&paths.manifest_path()),
            lineage: read_optional(&paths.lineage_path()),
            decisions: read_decisions(&paths.decisions_path()),
            campaign_run: read_optional(&paths.campaign_run_path()),
            verification: verify(bundle_dir),
            bundle_dir: bundle_dir.to_path_buf(),
        }
    }

    pub fn manifest_str(&self, key: &str) -> Option<String> {
        self.manifest
            .as_ref()?
            .get(key)
            .and_then(Value::as_str)
            .map(str::to_string)
    }

    fn manifest_count(&self, key: &str) -> u64 {
        self.manifest
            .as_ref()
            .and_then(|manifest| manifest.get(key))
            .and_then(Value::as_u64)
            .unwrap_or(0)
    }

    pub fn decision_count(&self) -> u64 {
        self.manifest_count("decision_count")
    }

    pub fn model_count(&self) -> u64 {
        self.manifest_count("model_count")
    }

    pub fn data_count(&self) -> u64 {
        self.manifest_count("data_count")
    }

    pub fn manifest_warnings(&self) -> Vec<String> {
        let Some(warnings) = self
            .manifest
            .as_ref()
            .and_then(|manifest| manifest.get("warnings"))
            .and_then(Value::as_array)
        else {
            return Vec::new();
        };
        warnings
            .iter()
            .map(|item| match item {
                Value::String(text) => text.clone(),
                other => other.to_string(),
            })
            .collect()
    }

    /// String entries of `manifest.files`.
    pub fn manifest_files(&self) -> Vec<&str> {
        self.manifest
            .as_ref()
            .and_then(|manifest| manifest.get("files"))
            .and_then(Value::as_array)
            .map(|files| files.iter().filter_map(Value::as_str).collect())
            .unwrap_or_default()
    }

    fn campaign_text(&self, key: &str) -> String {
        self.campaign_run
            .as_ref()
            .and_then(|run| run.get(key))
            .and_then(Value::as_str)
            .map(|text| text.trim().to_string())
            .unwrap_or_default()
    }

    pub fn objective(&self) -> String {
        self.campaign_text("objective")
    }

    pub fn planner_response_text(&self) -> String {
        self.campaign_text("planner_response_text")
    }

    /// Calls from `final_plan`, falling back to the initial `plan`.
    pub fn plan_calls(&self) -> Vec<&JsonObject> {
        let Some(run) = self.campaign_run.as_ref() else {
            return Vec::new();
        };
        for key in ["final_plan", "plan"] {
            let calls = run
                .get(key)
                .and_then(Value::as_object)
                .and_then(|plan| plan.get("calls"))
                .and_then(Value::as_array);
            if let Some(calls) = calls {
                return calls.iter().filter_map(Value::as_object).collect();
            }
        }
        Vec::new()
    }

    pub fn first_tool(&self) -> Option<String> {
        self.plan_calls()
            .first()
            .and_then(|call| call.get("tool"))
            .and_then(Value::as_str)
            .map(str::to_string)
    }

    pub fn tool_results(&self) -> Vec<&JsonObject> {
        self.campaign_run
            .as_ref()
            .and_then(|run| run.get("results"))
            .and_then(Value::as_array)
            .map(|results| results.iter().filter_map(Value::as_object).collect())
            .unwrap_or_default()
    }

    pub fn lineage_counts(&self) -> (usize, usize) {
        let len = |key: &str| {
            self.lineage
                .as_ref()
                .and_then(|lineage| lineage.get(key))
                .and_then(Value::as_array)
                .map_or(0, Vec::len)
        };
        (len("nodes"), len("edges"))
    }
}

fn read_optional(path: &Path) -> Option<JsonObject> {
    if !path.is_file() {
        return None;
    }
    match read_json_object(path) {
        Ok(map) => Some(map),
        Err(err) => {
            tracing::debug!(path = %path.display(), error = %err, "unreadable bundle file");
            None
        }
    }
}

fn read_decisions(path: &Path) -> Vec<JsonObject> {
    let Ok(text) = fs::read_to_string(path) else {
        return Vec::new();
    };
    text.lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .filter_map(|line| serde_json::from_str::<Value>(line).ok())
        .filter_map(|value| match value {
            Value::Object(map) => Some(map),
            _ => None,
        })
        .collect()
}

/// Lowercased key paths of a JSON value, written as `a.b` and `a[0].c`.
pub fn flatten_keys(value: &Value) -> BTreeSet<String> {
    let mut keys = BTreeSet::new();
    collect_keys(value, "", &mut keys);
    keys
}

fn collect_keys(value: &Value, prefix: &str, keys: &mut BTreeSet<String>) {
    match value {
        Value::Object(map) => {
            for (key, nested) in map {
                let path = if prefix.is_empty() {
                    key.clone()
                } else {
                    format!("{prefix}.{key}")
                };
                keys.insert(path.to_lowercase());
                collect_keys(nested, &path, keys);
            }
        }
        Value::Array(items) => {
            for (index, nested) in items.iter().enumerate() {
                collect_keys(nested, &format!("{prefix}[{index}]"), keys);
            }
        }
        _ => {}
    }
}
