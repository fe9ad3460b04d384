//! Template definitions.
//!
//! Templates are built by layering: each one is the previous template's
//! checks followed by its own additions.
use super::{checks, manual, CheckDefinition, Severity};

pub const DEFAULT_TEMPLATE: &str = "drug_discovery_comprehensive";

const CORE: &[CheckDefinition] = &[
    CheckDefinition {
        id: "bundle_structure",
        title: "Evidence bundle contains required files",
        domain: "audit_integrity",
        severity: Severity::Critical,
        automated: true,
        regulatory_tags: &["traceability", "audit"],
        evaluate: checks::bundle_structure,
    },
    CheckDefinition {
        id: "integrity_verification",
        title: "Evidence bundle integrity verification passes",
        domain: "audit_integrity",
        severity: Severity::Critical,
        automated: true,
        regulatory_tags: &["integrity", "audit"],
        evaluate: checks::integrity_verification,
    },
    CheckDefinition {
        id: "objective_defined",
        title: "Campaign objective is explicitly defined",
        domain: "campaign_design",
        severity: Severity::Critical,
        automated: true,
        regulatory_tags: &["intended_use"],
        evaluate: checks::objective_defined,
    },
    CheckDefinition {
        id: "executable_plan_present",
        title: "Executable plan with tool calls is present",
        domain: "campaign_design",
        severity: Severity::Critical,
        automated: true,
        regulatory_tags: &["traceability"],
        evaluate: checks::executable_plan_present,
    },
    CheckDefinition {
        id: "validation_first_policy",
        title: "Validation-first tool policy is satisfied",
        domain: "model_execution",
        severity: Severity::High,
        automated: true,
        regulatory_tags: &["risk_control"],
        evaluate: checks::validation_first_policy,
    },
    CheckDefinition {
        id: "traceability_lineage",
        title: "Decision traceability and lineage graph are complete",
        domain: "traceability",
        severity: Severity::High,
        automated: true,
        regulatory_tags: &["audit", "lineage"],
        evaluate: checks::traceability_lineage,
    },
    CheckDefinition {
        id: "model_provenance",
        title: "Model provenance is captured",
        domain: "model_governance",
        severity: Severity::High,
        automated: true,
        regulatory_tags: &["reproducibility"],
        evaluate: checks::model_provenance,
    },
    CheckDefinition {
        id: "data_provenance",
        title: "Data provenance is captured",
        domain: "data_governance",
        severity: Severity::High,
        automated: true,
        regulatory_tags: &["reproducibility", "data_lineage"],
        evaluate: checks::data_provenance,
    },
    CheckDefinition {
        id: "execution_provenance",
        title: "Execution environment provenance is captured",
        domain: "reproducibility",
        severity: Severity::High,
        automated: true,
        regulatory_tags: &["reproducibility", "audit"],
        evaluate: checks::execution_provenance,
    },
    CheckDefinition {
        id: "tool_results_present",
        title: "Tool execution results are present",
        domain: "evidence_completeness",
        severity: Severity::High,
        automated: true,
        regulatory_tags: &["evidence"],
        evaluate: checks::tool_results_present,
    },
    CheckDefinition {
        id: "uncertainty_reporting",
        title: "Uncertainty/confidence reporting is present",
        domain: "scientific_rigor",
        severity: Severity::Medium,
        automated: true,
        regulatory_tags: &["uncertainty"],
        evaluate: checks::uncertainty_reporting,
    },
    CheckDefinition {
        id: "safety_signal_capture",
        title: "Safety signal capture fields are present",
        domain: "safety",
        severity: Severity::High,
        automated: true,
        regulatory_tags: &["safety"],
        evaluate: checks::safety_signal_capture,
    },
    CheckDefinition {
        id: "reproducibility_identifiers",
        title: "Bundle reproducibility identifiers are complete",
        domain: "reproducibility",
        severity: Severity::Medium,
        automated: true,
        regulatory_tags: &["traceability"],
        evaluate: checks::reproducibility_identifiers,
    },
    CheckDefinition {
        id: "no_prohibited_claims",
        title: "No prohibited overclaim language is present",
        domain: "communications",
        severity: Severity::Critical,
        automated: true,
        regulatory_tags: &["risk_control", "labeling"],
        evaluate: checks::no_prohibited_claims,
    },
    CheckDefinition {
        id: "warning_review",
        title: "Warnings have been dispositioned",
        domain: "quality_review",
        severity: Severity::Medium,
        automated: true,
        regulatory_tags: &["quality_system"],
        evaluate: checks::warning_review,
    },
];

const COMPREHENSIVE_ADDITIONS: &[CheckDefinition] = &[
    CheckDefinition {
        id: "benchmark_evidence_linkage",
        title: "Benchmark/regression evidence linkage is present",
        domain: "model_validation",
        severity: Severity::Medium,
        automated: true,
        regulatory_tags: &["validation", "change_control"],
        evaluate: checks::benchmark_evidence_linkage,
    },
    CheckDefinition {
        id: "assay_strategy_documented",
        title: "Assay strategy and endpoints are documented",
        domain: "experimental_design",
        severity: Severity::High,
        automated: false,
        regulatory_tags: &["scientific_rigor"],
        evaluate: manual::assay_strategy,
    },
    CheckDefinition {
        id: "experimental_controls_documented",
        title: "Experimental controls and replication are documented",
        domain: "experimental_design",
        severity: Severity::High,
        automated: false,
        regulatory_tags: &["scientific_rigor", "quality_system"],
        evaluate: manual::experimental_controls,
    },
    CheckDefinition {
        id: "human_data_governance",
        title: "Human-data governance controls are documented",
        domain: "governance",
        severity: Severity::High,
        automated: false,
        regulatory_tags: &["privacy", "ethics"],
        evaluate: manual::human_data_governance,
    },
    CheckDefinition {
        id: "translation_plan",
        title: "Translational PK/PD validation plan is documented",
        domain: "translation",
        severity: Severity::High,
        automated: false,
        regulatory_tags: &["translation"],
        evaluate: manual::translation_plan,
    },
    CheckDefinition {
        id: "change_control",
        title: "Model/data change-control approvals are documented",
        domain: "quality_system",
        severity: Severity::High,
        automated: false,
        regulatory_tags: &["change_control", "quality_system"],
        evaluate: manual::change_control,
    },
    CheckDefinition {
        id: "benefit_risk_narrative",
        title: "Benefit-risk narrative is documented",
        domain: "clinical_rationale",
        severity: Severity::High,
        automated: false,
        regulatory_tags: &["benefit_risk"],
        evaluate: manual::benefit_risk,
    },
    CheckDefinition {
        id: "gxp_readiness",
        title: "GxP readiness mapping is documented",
        domain: "quality_system",
        severity: Severity::Medium,
        automated: false,
        regulatory_tags: &["gxp", "quality_system"],
        evaluate: manual::gxp_readiness,
    },
];

const FDA_ADDITIONS: &[CheckDefinition] = &[CheckDefinition {
    id: "submission_mapping",
    title: "Evidence artifacts are mapped to submission sections",
    domain: "regulatory_submission",
    severity: Severity::High,
    automated: false,
    regulatory_tags: &["submission"],
    evaluate: manual::submission_mapping,
}];

/// Template name and the layers it is composed from, in order.
const TEMPLATES: [(&str, &[&[CheckDefinition]]); 3] = [
    ("core", &[CORE]),
    ("drug_discovery_comprehensive", &[CORE, COMPREHENSIVE_ADDITIONS]),
    (
        "fda_cder_ai_ml",
        &[CORE, COMPREHENSIVE_ADDITIONS, FDA_ADDITIONS],
    ),
];

/// Registered template names, sorted.
pub fn available_templates() -> Vec<&'static str> {
    let mut names: Vec<&'static str> = TEMPLATES.iter().map(|(name, _)| *name).collect();
    names.sort_unstable();
    names
}

/// Ordered checks for a template, or `None` when the name is unknown.
pub fn template_checks(name: &str) -> Option<Vec<CheckDefinition>> {
    TEMPLATES
        .iter()
        .find(|(template, _)| *template == name)
        .map(|(_, layers)| layers.iter().flat_map(|layer| layer.iter().copied()).collect())
}
