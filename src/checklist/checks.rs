//! Automated checks.
use super::context::flatten_keys;
use super::{CheckOutcome, ChecklistContext};
use crate::bundle::{CAMPAIGN_RUN_REL, REQUIRED_FILES};
use serde_json::Value;
use std::collections::BTreeSet;

const VALIDATION_TOOL: &str = "refua_validate_spec";

const UNCERTAINTY_TOKENS: [&str; 7] = [
    "binding_probability",
    "confidence",
    "confidence_score",
    "uncertainty",
    "ci_low",
    "ci_high",
    "warnings",
];

const SAFETY_TOKENS: [&str; 9] = [
    "admet",
    "tox",
    "toxic",
    "herg",
    "ames",
    "warning",
    "warnings",
    "assessment",
    "safety",
];

const REPRODUCIBILITY_KEYS: [&str; 5] = [
    "bundle_id",
    "campaign_run_id",
    "created_at",
    "source_rel_path",
    "decision_count",
];

const PROHIBITED_PHRASES: [&str; 5] = [
    "guaranteed cure",
    "guaranteed remission",
    "proven cure",
    "certain cure",
    "eradicate all disease",
];

const BENCHMARK_TOKENS: [&str; 6] = [
    "benchmark",
    "baseline",
    "compare",
    "gate",
    "validation",
    "refua-bench",
];

pub(super) fn bundle_structure(context: &ChecklistContext) -> CheckOutcome {
    let required: Vec<&str> = REQUIRED_FILES
        .iter()
        .copied()
        .chain(std::iter::once(CAMPAIGN_RUN_REL))
        .collect();
    let missing: Vec<&str> = required
        .iter()
        .copied()
        .filter(|rel| !context.bundle_dir.join(rel).exists())
        .collect();
    if missing.is_empty() {
        CheckOutcome::pass("All required bundle files are present.").with_evidence(required)
    } else {
        CheckOutcome::fail(
            "Missing required bundle files.",
            "Rebuild bundle and ensure required artifacts are present.",
        )
        .with_evidence(missing)
    }
}

pub(super) fn integrity_verification(context: &ChecklistContext) -> CheckOutcome {
    if context.verification.ok {
        return CheckOutcome::pass("Bundle integrity verification passed.")
            .with_evidence(["verify.ok=true"]);
    }
    CheckOutcome::fail(
        "Bundle integrity verification failed.",
        "Regenerate bundle and investigate checksum or missing-file errors.",
    )
    .with_evidence(context.verification.errors.clone())
}

pub(super) fn objective_defined(context: &ChecklistContext) -> CheckOutcome {
    let objective = context.objective();
    if objective.is_empty() {
        return CheckOutcome::fail(
            "Campaign objective is missing.",
            "Set a clear, measurable campaign objective in run payload.",
        );
    }
    CheckOutcome::pass("Campaign objective is present.").with_evidence([objective])
}

pub(super) fn executable_plan_present(context: &ChecklistContext) -> CheckOutcome {
    let calls = context.plan_calls();
    if calls.is_empty() {
        return CheckOutcome::fail(
            "No executable tool plan calls were found.",
            "Ensure plan/final_plan contains a `calls` list.",
        );
    }
    CheckOutcome::pass("Executable tool plan is present.")
        .with_evidence([format!("call_count={}", calls.len())])
}

pub(super) fn validation_first_policy(context: &ChecklistContext) -> CheckOutcome {
    match context.first_tool() {
        None => CheckOutcome::fail(
            "No first tool is available for validation-first policy.",
            "Provide a non-empty plan.",
        ),
        Some(tool) if tool == VALIDATION_TOOL => {
            CheckOutcome::pass("Validation-first policy satisfied.")
                .with_evidence([format!("first_tool={tool}")])
        }
        Some(tool) => CheckOutcome::fail(
            "Plan does not start with `refua_validate_spec`.",
            "Run validate_spec before expensive fold/affinity calls.",
        )
        .with_evidence([format!("first_tool={tool}")]),
    }
}

pub(super) fn traceability_lineage(context: &ChecklistContext) -> CheckOutcome {
    if context.manifest.is_none() {
        return CheckOutcome::fail(
            "Manifest is missing or invalid.",
            "Rebuild the evidence bundle.",
        );
    }
    let decision_count = context.decision_count();
    if decision_count < 1 {
        return CheckOutcome::fail(
            "No decision records were captured.",
            "Ensure campaign outputs include plan/results and rebuild bundle.",
        )
        .with_evidence([format!("decision_count={decision_count}")]);
    }
    let (node_count, edge_count) = context.lineage_counts();
    let counts = [
        format!("node_count={node_count}"),
        format!("edge_count={edge_count}"),
    ];
    if node_count == 0 || edge_count == 0 {
        return CheckOutcome::fail(
            "Lineage graph is empty or malformed.",
            "Inspect `lineage.json` generation and rebuild.",
        )
        .with_evidence(counts);
    }
    CheckOutcome::pass("Decision trail and lineage graph are present.").with_evidence(
        std::iter::once(format!("decision_count={decision_count}")).chain(counts),
    )
}

pub(super) fn model_provenance(context: &ChecklistContext) -> CheckOutcome {
    let evidence = [format!("model_count={}", context.model_count())];
    if context.model_count() < 1 {
        return CheckOutcome::fail(
            "No model provenance records were captured.",
            "Include tool results and model metadata in campaign output.",
        )
        .with_evidence(evidence);
    }
    CheckOutcome::pass("Model provenance records are present.").with_evidence(evidence)
}

pub(super) fn data_provenance(context: &ChecklistContext) -> CheckOutcome {
    let evidence = [format!("data_count={}", context.data_count())];
    if context.data_count() < 1 {
        return CheckOutcome::fail(
            "No data provenance records were captured.",
            "Provide `--data-manifest` inputs during bundle build when external datasets \
             inform campaign decisions.",
        )
        .with_evidence(evidence);
    }
    CheckOutcome::pass("Data provenance records are present.").with_evidence(evidence)
}

pub(super) fn execution_provenance(context: &ChecklistContext) -> CheckOutcome {
    let Some(manifest) = context.manifest.as_ref() else {
        return CheckOutcome::fail("Manifest is missing or invalid.", "Rebuild bundle.");
    };
    let Some(execution) = manifest
        .get("execution_provenance")
        .and_then(Value::as_object)
    else {
        return CheckOutcome::fail(
            "Execution provenance block is missing.",
            "Capture execution provenance during bundle generation.",
        );
    };
    let section = |key: &str| execution.get(key).and_then(Value::as_object);
    let (Some(runtime), Some(git), Some(dependencies)) =
        (section("runtime"), section("git"), section("dependencies"))
    else {
        return CheckOutcome::fail(
            "Execution provenance block is malformed.",
            "Inspect provenance serialization and rebuild bundle.",
        );
    };
    let git_available = git.get("available").cloned().unwrap_or(Value::Null);
    CheckOutcome::pass("Execution provenance is present and structured.").with_evidence([
        format!("runtime_keys={}", runtime.len()),
        format!("git_available={git_available}"),
        format!("dependency_keys={}", dependencies.len()),
    ])
}

pub(super) fn tool_results_present(context: &ChecklistContext) -> CheckOutcome {
    let results = context.tool_results();
    if results.is_empty() {
        return CheckOutcome::manual_review(
            "No tool execution results were found (dry-run or missing outputs).",
            "Attach execution outputs for reproducible evidence.",
        );
    }
    CheckOutcome::pass("Tool execution results are present.")
        .with_evidence([format!("result_count={}", results.len())])
}

/// Tokens found as substrings of any flattened output key across all results.
fn matched_output_tokens(context: &ChecklistContext, tokens: &[&str]) -> Vec<String> {
    let mut matched = BTreeSet::new();
    for result in context.tool_results() {
        let keys = result.get("output").map(flatten_keys).unwrap_or_default();
        for token in tokens {
            if keys.iter().any(|key| key.contains(token)) {
                matched.insert(token.to_string());
            }
        }
    }
    matched.into_iter().collect()
}

pub(super) fn uncertainty_reporting(context: &ChecklistContext) -> CheckOutcome {
    if context.tool_results().is_empty() {
        return CheckOutcome::manual_review(
            "No tool results available to evaluate uncertainty reporting.",
            "Attach execution outputs with confidence/uncertainty fields.",
        );
    }
    let matched = matched_output_tokens(context, &UNCERTAINTY_TOKENS);
    if matched.is_empty() {
        return CheckOutcome::fail(
            "No uncertainty/confidence fields detected in tool outputs.",
            "Include confidence metrics and uncertainty qualifiers in outputs.",
        );
    }
    CheckOutcome::pass("Uncertainty/confidence fields were detected in outputs.")
        .with_evidence(matched)
}

pub(super) fn safety_signal_capture(context: &ChecklistContext) -> CheckOutcome {
    if context.tool_results().is_empty() {
        return CheckOutcome::manual_review(
            "No tool results available to evaluate safety signal capture.",
            "Attach safety-related outputs (ADMET/toxicity/warnings).",
        );
    }
    let matched = matched_output_tokens(context, &SAFETY_TOKENS);
    if matched.is_empty() {
        return CheckOutcome::fail(
            "No safety-related fields detected in tool outputs.",
            "Include ADMET/toxicity/warning outputs in decision evidence.",
        );
    }
    CheckOutcome::pass("Safety-related signal fields are present in outputs.")
        .with_evidence(matched)
}

pub(super) fn reproducibility_identifiers(context: &ChecklistContext) -> CheckOutcome {
    let Some(manifest) = context.manifest.as_ref() else {
        return CheckOutcome::fail("Manifest is missing.", "Rebuild bundle.");
    };
    let missing: Vec<&str> = REPRODUCIBILITY_KEYS
        .iter()
        .copied()
        .filter(|key| !manifest.contains_key(*key))
        .collect();
    if !missing.is_empty() {
        return CheckOutcome::fail(
            "Manifest is missing reproducibility identifiers.",
            "Populate missing identifiers during bundle generation.",
        )
        .with_evidence(missing);
    }
    CheckOutcome::pass("Bundle contains core reproducibility identifiers.")
        .with_evidence(REPRODUCIBILITY_KEYS)
}

pub(super) fn no_prohibited_claims(context: &ChecklistContext) -> CheckOutcome {
    let text = [context.objective(), context.planner_response_text()]
        .into_iter()
        .filter(|blob| !blob.is_empty())
        .collect::<Vec<_>>()
        .join("\n")
        .to_lowercase();
    let matches: Vec<&str> = PROHIBITED_PHRASES
        .iter()
        .copied()
        .filter(|phrase| text.contains(phrase))
        .collect();
    if !matches.is_empty() {
        return CheckOutcome::fail(
            "Prohibited overclaim language detected.",
            "Replace absolute cure/guarantee language with evidence-qualified claims.",
        )
        .with_evidence(matches);
    }
    CheckOutcome::pass("No prohibited overclaim phrases detected.")
}

pub(super) fn warning_review(context: &ChecklistContext) -> CheckOutcome {
    let warnings = context.manifest_warnings();
    if warnings.is_empty() {
        return CheckOutcome::pass("No bundle warnings were reported.");
    }
    CheckOutcome::manual_review(
        "Bundle contains warnings that require reviewer sign-off.",
        "Review all warning entries and document disposition.",
    )
    .with_evidence(warnings)
}

pub(super) fn benchmark_evidence_linkage(context: &ChecklistContext) -> CheckOutcome {
    if context.manifest.is_none() {
        return CheckOutcome::manual_review(
            "Manifest unavailable to inspect benchmark artifacts.",
            "Attach benchmark and regression reports.",
        );
    }
    let matched: Vec<&str> = context
        .manifest_files()
        .into_iter()
        .filter(|path| {
            let lowered = path.to_lowercase();
            BENCHMARK_TOKENS.iter().any(|token| lowered.contains(token))
        })
        .collect();
    if matched.is_empty() {
        return CheckOutcome::manual_review(
            "No explicit benchmark/regression artifact linkage found.",
            "Attach `refua-bench` compare/gate outputs for model-change justification.",
        );
    }
    CheckOutcome::pass("Benchmark/regression artifacts were detected in bundle files.")
        .with_evidence(matched)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::checklist::CheckStatus;
    use crate::model::VerificationResult;
    use serde_json::{json, Map};
    use std::path::PathBuf;

    fn context(manifest: Option<Value>, campaign_run: Option<Value>) -> ChecklistContext {
        let as_map = |value: Value| value.as_object().cloned().unwrap_or_else(Map::new);
        ChecklistContext {
            bundle_dir: PathBuf::from("/nonexistent/bundle"),
            manifest: manifest.map(as_map),
            lineage: None,
            decisions: Vec::new(),
            campaign_run: campaign_run.map(as_map),
            verification: VerificationResult::from_findings(0, Vec::new(), Vec::new()),
        }
    }

    #[test]
    fn validation_first_requires_validator_as_first_call() {
        let ok = context(
            None,
            Some(json!({"plan": {"calls": [{"tool": "refua_validate_spec"}, {"tool": "refua_fold"}]}})),
        );
        assert_eq!(validation_first_policy(&ok).status, CheckStatus::Pass);

        let wrong = context(None, Some(json!({"plan": {"calls": [{"tool": "refua_fold"}]}})));
        let outcome = validation_first_policy(&wrong);
        assert_eq!(outcome.status, CheckStatus::Fail);
        assert_eq!(outcome.evidence, vec!["first_tool=refua_fold".to_string()]);

        let empty = context(None, Some(json!({"plan": {"calls": []}})));
        assert_eq!(validation_first_policy(&empty).status, CheckStatus::Fail);
    }

    #[test]
    fn token_scans_distinguish_missing_results_from_missing_tokens() {
        let no_results = context(None, Some(json!({"results": []})));
        assert_eq!(
            uncertainty_reporting(&no_results).status,
            CheckStatus::ManualReview
        );
        assert_eq!(
            safety_signal_capture(&no_results).status,
            CheckStatus::ManualReview
        );

        let bare = context(None, Some(json!({"results": [{"output": {"score": 1}}]})));
        assert_eq!(uncertainty_reporting(&bare).status, CheckStatus::Fail);
        assert_eq!(safety_signal_capture(&bare).status, CheckStatus::Fail);

        let rich = context(
            None,
            Some(json!({"results": [{"output": {
                "affinity": {"binding_probability": 0.83},
                "ADMET": {"hERG_risk": "low"}
            }}]})),
        );
        let uncertainty = uncertainty_reporting(&rich);
        assert_eq!(uncertainty.status, CheckStatus::Pass);
        assert_eq!(uncertainty.evidence, vec!["binding_probability".to_string()]);
        let safety = safety_signal_capture(&rich);
        assert_eq!(safety.status, CheckStatus::Pass);
        assert_eq!(safety.evidence, vec!["admet".to_string(), "herg".to_string()]);
    }

    #[test]
    fn prohibited_claims_are_case_insensitive() {
        let claim = context(
            None,
            Some(json!({"objective": "A Guaranteed Cure for KRAS", "planner_response_text": "proven cure"})),
        );
        let outcome = no_prohibited_claims(&claim);
        assert_eq!(outcome.status, CheckStatus::Fail);
        assert_eq!(
            outcome.evidence,
            vec!["guaranteed cure".to_string(), "proven cure".to_string()]
        );
    }

    #[test]
    fn warnings_and_benchmarks_drive_manual_review() {
        let warned = context(Some(json!({"warnings": ["Missing data manifest: x"], "files": []})), None);
        let outcome = warning_review(&warned);
        assert_eq!(outcome.status, CheckStatus::ManualReview);
        assert_eq!(outcome.evidence.len(), 1);
        assert_eq!(
            benchmark_evidence_linkage(&warned).status,
            CheckStatus::ManualReview
        );

        let linked = context(
            Some(json!({"files": ["artifacts/extras/extra_001_refua-bench-gate.json", 3]})),
            None,
        );
        assert_eq!(warning_review(&linked).status, CheckStatus::Pass);
        let outcome = benchmark_evidence_linkage(&linked);
        assert_eq!(outcome.status, CheckStatus::Pass);
        assert_eq!(outcome.evidence.len(), 1);
    }

    #[test]
    fn execution_provenance_requires_structured_sections() {
        let good = context(
            Some(json!({"execution_provenance": {
                "runtime": {"os": "linux"}, "git": {"available": false}, "dependencies": {}
            }})),
            None,
        );
        let outcome = execution_provenance(&good);
        assert_eq!(outcome.status, CheckStatus::Pass);
        assert!(outcome.evidence.contains(&"git_available=false".to_string()));

        let malformed = context(
            Some(json!({"execution_provenance": {"runtime": {}, "git": [], "dependencies": {}}})),
            None,
        );
        assert_eq!(execution_provenance(&malformed).status, CheckStatus::Fail);
        assert_eq!(
            execution_provenance(&context(Some(json!({})), None)).status,
            CheckStatus::Fail
        );
    }

    #[test]
    fn reproducibility_lists_missing_keys() {
        let partial = context(Some(json!({"bundle_id": "b", "created_at": "t"})), None);
        let outcome = reproducibility_identifiers(&partial);
        assert_eq!(outcome.status, CheckStatus::Fail);
        assert_eq!(
            outcome.evidence,
            vec!["campaign_run_id", "source_rel_path", "decision_count"]
        );
    }
}
