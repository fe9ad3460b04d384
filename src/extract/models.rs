//! Model provenance derived from tool results.
use super::{array_field, object_field, str_field, CampaignRecord};
use crate::model::ModelProvenance;
use std::collections::BTreeSet;

const TOOL_TO_MODEL: [(&str, &str); 6] = [
    ("refua_validate_spec", "refua-validator"),
    ("refua_fold", "refua-boltz"),
    ("refua_affinity", "refua-boltz-affinity"),
    ("refua_antibody_design", "refua-boltzgen-antibody"),
    ("refua_admet_profile", "refua-admet"),
    ("refua_job", "refua-job-tracker"),
];

/// Model name for a tool, falling back to the tool name itself.
pub fn model_name_for_tool(tool: &str) -> &str {
    TOOL_TO_MODEL
        .iter()
        .find(|(name, _)| *name == tool)
        .map(|(_, model)| *model)
        .unwrap_or(tool)
}

/// Derive deduplicated model provenance from `results`.
///
/// `override_name` replaces every derived name; when nothing is derived it
/// yields a single override record instead.
pub fn extract_model_provenance(
    record: &CampaignRecord,
    override_name: Option<&str>,
    override_version: Option<&str>,
) -> Vec<ModelProvenance> {
    let mut models = Vec::new();
    let mut seen = BTreeSet::new();

    for item in array_field(record, "results").into_iter().flatten() {
        let Some(item) = item.as_object() else {
            continue;
        };
        let Some(tool) = str_field(item, "tool") else {
            continue;
        };
        let output = object_field(item, "output");
        let backend = output
            .and_then(|output| str_field(output, "backend"))
            .map(str::to_string);
        let model_version = match override_version {
            Some(version) => Some(version.to_string()),
            None => output
                .and_then(|output| str_field(output, "model_version"))
                .map(str::trim)
                .filter(|version| !version.is_empty())
                .map(str::to_string),
        };
        let model = ModelProvenance {
            model_name: override_name
                .unwrap_or_else(|| model_name_for_tool(tool))
                .to_string(),
            model_version,
            tool: Some(tool.to_string()),
            backend,
            parameters: object_field(item, "args").cloned().unwrap_or_default(),
        };
        if seen.insert(model.dedupe_key()) {
            models.push(model);
        }
    }

    if models.is_empty() {
        if let Some(name) = override_name {
            models.push(ModelProvenance {
                model_name: name.to_string(),
                model_version: override_version.map(str::to_string),
                tool: None,
                backend: None,
                parameters: Default::default(),
            });
        }
    }

    models
}
