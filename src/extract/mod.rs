//! Extraction of decisions and provenance from open-schema campaign records.
//!
//! Campaign records have no fixed schema. Every accessor here gates on the JSON
//! type it expects and treats anything else as absent.
use crate::util::stable_id;
use serde_json::{Map, Value};
use std::path::Path;

mod datasets;
mod decisions;
mod models;

pub use datasets::{load_data_provenance_from_manifests, parse_data_manifest};
pub use decisions::extract_decisions;
pub use models::{extract_model_provenance, model_name_for_tool};

/// Campaign record as parsed from disk.
pub type CampaignRecord = Map<String, Value>;

/// Resolve the campaign run id for a record.
///
/// The first non-empty `campaign_run_id` or `run_id` string is the candidate; if
/// it trims to nothing, or neither is set, the id is derived from the objective,
/// planner text, and source path. `source_path` should already be canonical.
pub fn infer_campaign_run_id(record: &CampaignRecord, source_path: Option<&Path>) -> String {
    let explicit = ["campaign_run_id", "run_id"]
        .into_iter()
        .find_map(|key| str_field(record, key).filter(|value| !value.is_empty()));
    if let Some(trimmed) = explicit.map(str::trim).filter(|value| !value.is_empty()) {
        return trimmed.to_string();
    }

    let objective = str_field(record, "objective").unwrap_or_default();
    let planner_text = str_field(record, "planner_response_text").unwrap_or_default();
    let source_key = source_path
        .map(|path| path.display().to_string())
        .unwrap_or_default();
    stable_id(&["campaign_run", objective, planner_text, &source_key])
}

pub(crate) fn str_field<'a>(map: &'a Map<String, Value>, key: &str) -> Option<&'a str> {
    map.get(key).and_then(Value::as_str)
}

pub(crate) fn object_field<'a>(
    map: &'a Map<String, Value>,
    key: &str,
) -> Option<&'a Map<String, Value>> {
    map.get(key).and_then(Value::as_object)
}

pub(crate) fn array_field<'a>(map: &'a Map<String, Value>, key: &str) -> Option<&'a Vec<Value>> {
    map.get(key).and_then(Value::as_array)
}
