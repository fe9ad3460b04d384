//! Serialized records that make up an evidence bundle.
//!
//! These types mirror the JSON files written into the bundle so the builder,
//! verifier, and checklist engine agree on one schema.
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::BTreeMap;
use std::fmt;

/// Current schema version for `manifest.json`.
pub const BUNDLE_SCHEMA_VERSION: &str = "1.0.0";

/// Kind of event recorded in the decision trail.
#[derive(Debug, Deserialize, Serialize, Clone, Copy, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum DecisionType {
    Objective,
    Planning,
    Policy,
    Critic,
    ToolCall,
    ToolResult,
    Selection,
    Note,
}

impl DecisionType {
    /// Return the stable string identifier used in JSON artifacts.
    pub fn as_str(&self) -> &'static str {
        match self {
            DecisionType::Objective => "objective",
            DecisionType::Planning => "planning",
            DecisionType::Policy => "policy",
            DecisionType::Critic => "critic",
            DecisionType::ToolCall => "tool_call",
            DecisionType::ToolResult => "tool_result",
            DecisionType::Selection => "selection",
            DecisionType::Note => "note",
        }
    }
}

impl fmt::Display for DecisionType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One causally-ordered event in a campaign run.
#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
pub struct DecisionRecord {
    pub decision_id: String,
    pub campaign_run_id: String,
    pub step_index: u32,
    pub timestamp: String,
    pub decision_type: DecisionType,
    pub actor: String,
    pub rationale: String,
    pub tool: Option<String>,
    #[serde(default)]
    pub args: Map<String, Value>,
    pub output_preview: Option<String>,
    #[serde(default)]
    pub input_refs: Vec<String>,
    #[serde(default)]
    pub output_refs: Vec<String>,
    #[serde(default)]
    pub metadata: Map<String, Value>,
}

#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
pub struct ModelProvenance {
    pub model_name: String,
    pub model_version: Option<String>,
    pub tool: Option<String>,
    pub backend: Option<String>,
    #[serde(default)]
    pub parameters: Map<String, Value>,
}

impl ModelProvenance {
    /// Key used to drop repeated model observations.
    pub fn dedupe_key(&self) -> (String, Option<String>, Option<String>, Option<String>) {
        (
            self.model_name.clone(),
            self.model_version.clone(),
            self.tool.clone(),
            self.backend.clone(),
        )
    }
}

#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
pub struct DataProvenance {
    pub dataset_id: String,
    pub version: Option<String>,
    pub source_url: Option<String>,
    pub sha256: Option<String>,
    pub license_name: Option<String>,
    /// Bundle-relative path of the copied manifest; set once the copy exists.
    pub manifest_rel_path: Option<String>,
    #[serde(default)]
    pub metadata: Map<String, Value>,
}

/// A file copied into the bundle, hashed after the copy.
#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
pub struct ArtifactRef {
    pub artifact_id: String,
    pub role: String,
    pub rel_path: String,
    pub sha256: String,
    pub size_bytes: u64,
    pub media_type: Option<String>,
    #[serde(default)]
    pub metadata: Map<String, Value>,
}

/// Environment snapshot supplied by the provenance collector.
#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
pub struct ExecutionProvenance {
    pub captured_at: String,
    pub runtime: Map<String, Value>,
    pub git: Map<String, Value>,
    pub dependencies: BTreeMap<String, String>,
    #[serde(default)]
    pub extra: Map<String, Value>,
}

/// Which of the two manifest writes produced a manifest value.
#[derive(Debug, Deserialize, Serialize, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum ManifestStage {
    /// Written before checklists run; checklist fields are empty.
    Bootstrap,
    /// Written after checklists run, with their reports folded in.
    Final,
}

/// Per-template digest folded into the final manifest.
#[derive(Debug, Deserialize, Serialize, Clone, PartialEq, Eq)]
pub struct TemplateSummary {
    pub template: String,
    pub total_checks: usize,
    pub failed: usize,
    pub manual_review: usize,
    pub blocking_failed: usize,
    pub auto_checks_passed: bool,
    pub submission_ready: bool,
}

#[derive(Debug, Deserialize, Serialize, Clone, PartialEq, Eq, Default)]
pub struct ChecklistAggregate {
    pub template_count: usize,
    pub failed_templates: Vec<String>,
    pub manual_review_templates: Vec<String>,
    pub blocking_failed_templates: Vec<String>,
}

/// Checklist results recorded in the manifest; empty (`{}`) until checklists run.
#[derive(Debug, Deserialize, Serialize, Clone, PartialEq, Eq, Default)]
pub struct ChecklistBuildSummary {
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub templates: Vec<TemplateSummary>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub aggregate: Option<ChecklistAggregate>,
}

impl ChecklistBuildSummary {
    pub fn is_empty(&self) -> bool {
        self.templates.is_empty() && self.aggregate.is_none()
    }
}

/// Root descriptor written to `manifest.json`.
#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
pub struct EvidenceBundleManifest {
    pub schema_version: String,
    pub stage: ManifestStage,
    pub bundle_id: String,
    pub created_at: String,
    pub campaign_run_id: String,
    pub source_kind: String,
    pub source_rel_path: String,
    pub decision_count: usize,
    pub artifact_count: usize,
    pub model_count: usize,
    pub data_count: usize,
    /// Every bundle file except `checksums.sha256`.
    pub files: Vec<String>,
    #[serde(default)]
    pub model_provenance: Vec<ModelProvenance>,
    #[serde(default)]
    pub data_provenance: Vec<DataProvenance>,
    pub execution_provenance: Option<ExecutionProvenance>,
    #[serde(default)]
    pub checklist_reports: Vec<String>,
    #[serde(default)]
    pub checklist_summary: ChecklistBuildSummary,
    #[serde(default)]
    pub warnings: Vec<String>,
}

/// Outcome of re-verifying a bundle directory.
#[derive(Debug, Deserialize, Serialize, Clone, PartialEq, Eq)]
pub struct VerificationResult {
    pub ok: bool,
    pub checked_files: usize,
    pub errors: Vec<String>,
    pub warnings: Vec<String>,
}

impl VerificationResult {
    pub fn from_findings(checked_files: usize, errors: Vec<String>, warnings: Vec<String>) -> Self {
        Self {
            ok: errors.is_empty(),
            checked_files,
            errors,
            warnings,
        }
    }
}
