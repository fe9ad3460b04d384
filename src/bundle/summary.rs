//! Compact bundle overview for operators.
use super::{verify, BundlePaths};
use crate::model::{ChecklistBuildSummary, VerificationResult};
use crate::util::{read_json_object, resolve_user_path, truncate_preview};
use anyhow::Result;
use serde::Serialize;
use serde_json::Value;
use std::path::Path;

const WARNINGS_PREVIEW_CHARS: usize = 400;

#[derive(Debug, Serialize, Clone, PartialEq, Eq)]
pub struct LineageCounts {
    pub node_count: usize,
    pub edge_count: usize,
}

#[derive(Debug, Serialize, Clone, PartialEq)]
pub struct BundleSummary {
    pub bundle_id: Option<String>,
    pub campaign_run_id: Option<String>,
    pub created_at: Option<String>,
    pub decision_count: Option<u64>,
    pub artifact_count: Option<u64>,
    pub model_count: Option<u64>,
    pub data_count: Option<u64>,
    pub lineage: LineageCounts,
    pub checklist_summary: ChecklistBuildSummary,
    pub verification: VerificationResult,
    pub warnings_preview: String,
}

/// Summarize a bundle from its manifest and lineage, plus a fresh verification.
///
/// Only an unreadable `manifest.json` is an error; a damaged lineage file
/// counts as an empty graph.
pub fn load_bundle_summary(bundle_dir: &Path) -> Result<BundleSummary> {
    let paths = BundlePaths::new(resolve_user_path(bundle_dir));
    let manifest = read_json_object(&paths.manifest_path())?;
    let lineage = read_json_object(&paths.lineage_path()).unwrap_or_default();
    let array_len = |key: &str| lineage.get(key).and_then(Value::as_array).map_or(0, Vec::len);

    let text = |key: &str| manifest.get(key).and_then(Value::as_str).map(str::to_string);
    let count = |key: &str| manifest.get(key).and_then(Value::as_u64);
    let checklist_summary = manifest
        .get("checklist_summary")
        .cloned()
        .and_then(|value| serde_json::from_value(value).ok())
        .unwrap_or_default();
    let warnings = manifest
        .get("warnings")
        .cloned()
        .unwrap_or_else(|| Value::Array(Vec::new()));

    Ok(BundleSummary {
        bundle_id: text("bundle_id"),
        campaign_run_id: text("campaign_run_id"),
        created_at: text("created_at"),
        decision_count: count("decision_count"),
        artifact_count: count("artifact_count"),
        model_count: count("model_count"),
        data_count: count("data_count"),
        lineage: LineageCounts {
            node_count: array_len("nodes"),
            edge_count: array_len("edges"),
        },
        checklist_summary,
        verification: verify(paths.root()),
        warnings_preview: truncate_preview(&warnings, WARNINGS_PREVIEW_CHARS),
    })
}
