//! Decision trail reconstruction.
use super::{array_field, object_field, str_field, CampaignRecord};
use crate::model::{DecisionRecord, DecisionType};
use crate::util::{
    canonical_json, stable_id, truncate_chars, truncate_preview, utc_now_iso, PREVIEW_MAX_CHARS,
};
use serde_json::{json, Map, Value};

/// Fields of a decision before it is placed in the trail.
struct DecisionDraft {
    decision_type: DecisionType,
    actor: &'static str,
    rationale: String,
    tool: Option<String>,
    args: Map<String, Value>,
    output_preview: Option<String>,
    input_refs: Vec<String>,
    output_refs: Vec<String>,
    metadata: Map<String, Value>,
}

impl DecisionDraft {
    fn new(decision_type: DecisionType, actor: &'static str, rationale: impl Into<String>) -> Self {
        Self {
            decision_type,
            actor,
            rationale: rationale.into(),
            tool: None,
            args: Map::new(),
            output_preview: None,
            input_refs: Vec::new(),
            output_refs: Vec::new(),
            metadata: Map::new(),
        }
    }

    fn preview(mut self, value: &Value) -> Self {
        self.output_preview = Some(truncate_preview(value, PREVIEW_MAX_CHARS));
        self
    }

    fn output_refs(mut self, refs: &[String]) -> Self {
        self.output_refs = refs.to_vec();
        self
    }

    fn input_refs(mut self, refs: &[String]) -> Self {
        self.input_refs = refs.to_vec();
        self
    }

    fn meta(mut self, key: &str, value: Value) -> Self {
        self.metadata.insert(key.to_string(), value);
        self
    }
}

/// Appends drafts in emission order, assigning contiguous step indices.
struct DecisionTrail<'a> {
    campaign_run_id: &'a str,
    records: Vec<DecisionRecord>,
}

impl<'a> DecisionTrail<'a> {
    fn new(campaign_run_id: &'a str) -> Self {
        Self {
            campaign_run_id,
            records: Vec::new(),
        }
    }

    fn push(&mut self, draft: DecisionDraft) {
        let step_index = self.records.len() as u32 + 1;
        let step_text = step_index.to_string();
        let decision_id = stable_id(&[
            self.campaign_run_id,
            &step_text,
            draft.decision_type.as_str(),
            draft.tool.as_deref().unwrap_or_default(),
        ]);
        self.records.push(DecisionRecord {
            decision_id,
            campaign_run_id: self.campaign_run_id.to_string(),
            step_index,
            timestamp: utc_now_iso(),
            decision_type: draft.decision_type,
            actor: draft.actor.to_string(),
            rationale: draft.rationale,
            tool: draft.tool,
            args: draft.args,
            output_preview: draft.output_preview,
            input_refs: draft.input_refs,
            output_refs: draft.output_refs,
            metadata: draft.metadata,
        });
    }
}

/// Turn a campaign record into an ordered, never-empty decision trail.
pub fn extract_decisions(record: &CampaignRecord, campaign_run_id: &str) -> Vec<DecisionRecord> {
    let mut trail = DecisionTrail::new(campaign_run_id);

    let objective = str_field(record, "objective").map(str::trim).unwrap_or("");
    if !objective.is_empty() {
        let mut draft = DecisionDraft::new(
            DecisionType::Objective,
            "campaign",
            "Campaign objective accepted.",
        );
        draft.output_preview = Some(truncate_chars(objective, PREVIEW_MAX_CHARS));
        trail.push(draft);
    }

    let plan = object_field(record, "plan");
    if let Some(plan) = plan {
        trail.push(
            DecisionDraft::new(
                DecisionType::Planning,
                "planner",
                "Initial tool plan generated.",
            )
            .preview(&Value::Object(plan.clone()))
            .output_refs(&["plan:initial".to_string()]),
        );
    }

    if let Some(iterations) = array_field(record, "iterations") {
        for (offset, item) in iterations.iter().enumerate() {
            let round = offset + 1;
            let Some(item) = item.as_object() else {
                continue;
            };
            if let Some(policy) = object_field(item, "policy") {
                trail.push(
                    DecisionDraft::new(
                        DecisionType::Policy,
                        "policy",
                        format!("Policy evaluation completed for round {round}."),
                    )
                    .preview(&Value::Object(policy.clone()))
                    .meta("round_index", json!(round)),
                );
            }
            if let Some(critic) = object_field(item, "critic") {
                trail.push(
                    DecisionDraft::new(
                        DecisionType::Critic,
                        "critic",
                        format!("Critic evaluation completed for round {round}."),
                    )
                    .preview(&Value::Object(critic.clone()))
                    .meta("round_index", json!(round)),
                );
            }
        }
    }

    if let Some(final_plan) = object_field(record, "final_plan") {
        let final_value = Value::Object(final_plan.clone());
        let rendered_plan = plan
            .map(|plan| canonical_json(&Value::Object(plan.clone())))
            .unwrap_or_default();
        if canonical_json(&final_value) != rendered_plan {
            trail.push(
                DecisionDraft::new(
                    DecisionType::Planning,
                    "planner",
                    "Final autonomous plan approved.",
                )
                .preview(&final_value)
                .output_refs(&["plan:final".to_string()])
                .meta("stage", json!("final")),
            );
        }
    }

    if let Some(results) = array_field(record, "results") {
        for (offset, item) in results.iter().enumerate() {
            let index = offset + 1;
            let Some(item) = item.as_object() else {
                continue;
            };
            let tool = str_field(item, "tool").map(str::to_string);
            let args = object_field(item, "args").cloned().unwrap_or_default();
            let output = item.get("output").cloned().unwrap_or(Value::Null);
            let tool_ref = format!("tool:{}", tool.as_deref().unwrap_or("unknown"));
            let result_ref = format!("result:{index}");

            let mut call = DecisionDraft::new(
                DecisionType::ToolCall,
                "executor",
                format!("Dispatch tool call #{index}."),
            )
            .input_refs(&[tool_ref])
            .output_refs(std::slice::from_ref(&result_ref))
            .meta("tool_index", json!(index));
            call.tool = tool.clone();
            call.args = args.clone();
            trail.push(call);

            let mut captured = DecisionDraft::new(
                DecisionType::ToolResult,
                "executor",
                format!("Captured tool result #{index}."),
            )
            .preview(&output)
            .input_refs(&[result_ref])
            .output_refs(&[format!("artifact:tool_result:{index}")])
            .meta("tool_index", json!(index));
            captured.tool = tool;
            captured.args = args;
            trail.push(captured);
        }
    }

    if let Some(warnings) = array_field(record, "warnings") {
        if !warnings.is_empty() {
            trail.push(
                DecisionDraft::new(DecisionType::Note, "system", "Run emitted warnings.")
                    .preview(&Value::Array(warnings.clone())),
            );
        }
    }

    if trail.records.is_empty() {
        trail.push(
            DecisionDraft::new(
                DecisionType::Note,
                "system",
                "No structured decisions were detected in payload.",
            )
            .preview(&Value::Object(record.clone())),
        );
    }

    trail.records
}
