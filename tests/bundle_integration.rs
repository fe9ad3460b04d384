//! End-to-end build, verify, and checklist behavior over real temp directories.
mod common;

use common::{read_json, write_campaign_payload, write_campaign_run, write_data_manifest};
use evidence_bundle::checklist::{self, CheckStatus};
use evidence_bundle::util::sha256_file;
use evidence_bundle::{build, load_bundle_summary, verify, BuildOptions, BundleError};
use serde_json::{json, Value};
use std::fs;
use tempfile::TempDir;

fn core_options() -> BuildOptions {
    BuildOptions {
        checklist_templates: vec!["core".to_string()],
        ..BuildOptions::default()
    }
}

#[test]
fn built_bundle_verifies() {
    let temp = TempDir::new().expect("temp dir");
    let run = write_campaign_run(temp.path());
    let data = write_data_manifest(temp.path());
    let out = temp.path().join("bundle");

    let options = BuildOptions {
        data_manifests: vec![data],
        ..BuildOptions::default()
    };
    let manifest = build(&run, &out, &options).expect("build bundle");
    assert!(manifest.decision_count > 0);
    assert_eq!(manifest.data_count, 1);
    assert_eq!(manifest.artifact_count, 1);
    assert!(manifest.model_count >= 1);

    for rel in [
        "manifest.json",
        "decisions.jsonl",
        "lineage.json",
        "checksums.sha256",
        "artifacts/campaign_run.json",
    ] {
        assert!(out.join(rel).is_file(), "missing {rel}");
    }
    assert!(out
        .join("artifacts/data_manifests/manifest_001_chembl_manifest.json")
        .is_file());

    let result = verify(&out);
    assert!(result.ok, "unexpected errors: {:?}", result.errors);
    assert!(result.checked_files > 0);
    assert!(result.errors.is_empty());

    let written = read_json(&out.join("manifest.json"));
    assert_eq!(written["stage"], json!("final"));
    assert_eq!(
        written["checklist_reports"],
        json!([
            "checklists/drug_discovery_comprehensive.json",
            "checklists/drug_discovery_comprehensive.md"
        ])
    );
    assert_eq!(
        written["data_provenance"][0]["manifest_rel_path"],
        json!("artifacts/data_manifests/manifest_001_chembl_manifest.json")
    );
}

#[test]
fn tampered_artifact_fails_verification() {
    let temp = TempDir::new().expect("temp dir");
    let run = write_campaign_run(temp.path());
    let out = temp.path().join("bundle");
    build(&run, &out, &BuildOptions::default()).expect("build bundle");

    let artifact = out.join("artifacts/campaign_run.json");
    let mut text = fs::read_to_string(&artifact).expect("read artifact");
    text.push_str("\n ");
    fs::write(&artifact, text).expect("tamper artifact");

    let result = verify(&out);
    assert!(!result.ok);
    assert!(result
        .errors
        .iter()
        .any(|error| error.starts_with("Checksum mismatch for artifacts/campaign_run.json")));
}

#[test]
fn decision_lines_match_manifest_count() {
    let temp = TempDir::new().expect("temp dir");
    let run = write_campaign_run(temp.path());
    let out = temp.path().join("bundle");
    let manifest = build(&run, &out, &BuildOptions::default()).expect("build bundle");

    let text = fs::read_to_string(out.join("decisions.jsonl")).expect("read decisions");
    let lines = text.lines().filter(|line| !line.trim().is_empty()).count();
    assert_eq!(lines, manifest.decision_count);
}

#[test]
fn strict_core_gate_fails_without_data_provenance() {
    let temp = TempDir::new().expect("temp dir");
    let run = write_campaign_run(temp.path());

    let strict = BuildOptions {
        checklist_strict: true,
        ..core_options()
    };
    let err = build(&run, &temp.path().join("strict"), &strict).expect_err("strict build fails");
    match err.downcast_ref::<BundleError>() {
        Some(BundleError::ChecklistPolicy(message)) => {
            assert!(message.contains("Checklist strict mode failed"));
            assert!(message.contains("core"));
        }
        other => panic!("unexpected error: {other:?}"),
    }
    let left_behind = read_json(&temp.path().join("strict").join("manifest.json"));
    assert_eq!(left_behind["stage"], json!("bootstrap"));
    assert_eq!(left_behind["checklist_reports"], json!([]));
    let checksums = fs::read_to_string(temp.path().join("strict").join("checksums.sha256"))
        .expect("read checksums");
    assert!(!checksums.contains("checklists/"));

    let relaxed = build(&run, &temp.path().join("relaxed"), &core_options())
        .expect("unenforced build succeeds");
    let aggregate = relaxed
        .checklist_summary
        .aggregate
        .expect("aggregate recorded");
    assert_eq!(aggregate.failed_templates, vec!["core".to_string()]);
}

#[test]
fn disabled_checklists_leave_summary_empty() {
    let temp = TempDir::new().expect("temp dir");
    let run = write_campaign_run(temp.path());
    let out = temp.path().join("bundle");
    let options = BuildOptions {
        include_checklists: false,
        ..BuildOptions::default()
    };
    let manifest = build(&run, &out, &options).expect("build bundle");

    assert!(manifest.checklist_reports.is_empty());
    assert!(manifest.checklist_summary.is_empty());
    assert!(!out.join("checklists").exists());
    let written = read_json(&out.join("manifest.json"));
    assert_eq!(written["checklist_summary"], json!({}));
    assert!(verify(&out).ok);
}

#[test]
fn core_passes_with_data_manifest() {
    let temp = TempDir::new().expect("temp dir");
    let run = write_campaign_run(temp.path());
    let data = write_data_manifest(temp.path());
    let out = temp.path().join("bundle");
    let options = BuildOptions {
        data_manifests: vec![data],
        checklist_strict: true,
        ..core_options()
    };
    build(&run, &out, &options).expect("strict core build succeeds");

    let report = checklist::evaluate(&out, "core").expect("evaluate core");
    let failing: Vec<&str> = report
        .items
        .iter()
        .filter(|item| item.status == CheckStatus::Fail)
        .map(|item| item.id.as_str())
        .collect();
    assert!(failing.is_empty(), "failing checks: {failing:?}");
    assert_eq!(report.summary.failed, 0);
    assert!(report.summary.auto_checks_passed);
}

#[test]
fn fda_template_requires_manual_review() {
    let temp = TempDir::new().expect("temp dir");
    let run = write_campaign_run(temp.path());
    let data = write_data_manifest(temp.path());
    let out = temp.path().join("bundle");
    let options = BuildOptions {
        data_manifests: vec![data],
        checklist_templates: vec!["fda_cder_ai_ml".to_string()],
        ..BuildOptions::default()
    };
    build(&run, &out, &options).expect("build bundle");

    let report = checklist::evaluate(&out, "fda_cder_ai_ml").expect("evaluate fda");
    assert_eq!(report.items.len(), 24);
    assert!(report.summary.manual_review >= 2);
    assert!(!report.summary.submission_ready);
    assert!(out.join("checklists/fda_cder_ai_ml.md").is_file());
}

#[test]
fn output_dir_must_be_empty_unless_overwriting() {
    let temp = TempDir::new().expect("temp dir");
    let run = write_campaign_run(temp.path());
    let out = temp.path().join("bundle");
    fs::create_dir_all(&out).expect("create out");
    fs::write(out.join("stale.txt"), "old").expect("write stale file");

    let err = build(&run, &out, &BuildOptions::default()).expect_err("occupied dir");
    assert!(matches!(
        err.downcast_ref::<BundleError>(),
        Some(BundleError::OutputDirNotEmpty(_))
    ));

    let options = BuildOptions {
        overwrite: true,
        ..BuildOptions::default()
    };
    build(&run, &out, &options).expect("overwrite build");
    assert!(!out.join("stale.txt").exists());
    assert!(verify(&out).ok);
}

#[test]
fn missing_bundle_dir_reports_single_error() {
    let temp = TempDir::new().expect("temp dir");
    let result = verify(&temp.path().join("absent"));
    assert!(!result.ok);
    assert_eq!(result.errors.len(), 1);
    assert_eq!(result.checked_files, 0);
}

#[test]
fn missing_campaign_run_is_typed_error() {
    let temp = TempDir::new().expect("temp dir");
    let err = build(
        &temp.path().join("nope.json"),
        &temp.path().join("bundle"),
        &BuildOptions::default(),
    )
    .expect_err("missing run");
    assert!(matches!(
        err.downcast_ref::<BundleError>(),
        Some(BundleError::CampaignRunMissing(_))
    ));
}

#[test]
fn missing_inputs_become_warnings() {
    let temp = TempDir::new().expect("temp dir");
    let run = write_campaign_run(temp.path());
    let out = temp.path().join("bundle");
    let options = BuildOptions {
        data_manifests: vec![temp.path().join("absent_data.json")],
        extra_artifacts: vec![temp.path().join("absent_extra.txt")],
        ..BuildOptions::default()
    };
    let manifest = build(&run, &out, &options).expect("build bundle");
    assert_eq!(manifest.data_count, 0);
    assert_eq!(manifest.artifact_count, 1);
    assert_eq!(manifest.warnings.len(), 2);
    assert!(manifest.warnings[0].starts_with("Missing data manifest:"));
    assert!(manifest.warnings[1].starts_with("Missing extra artifact:"));
}

#[test]
fn summary_reports_counts_and_verification() {
    let temp = TempDir::new().expect("temp dir");
    let payload = json!({
        "campaign_run_id": "run-42",
        "objective": "Screen binders",
        "plan": {"calls": [{"tool": "refua_validate_spec"}]},
        "results": []
    });
    let run = write_campaign_payload(temp.path(), &payload);
    let out = temp.path().join("bundle");
    let options = BuildOptions {
        bundle_id: Some("bundle-42".to_string()),
        ..BuildOptions::default()
    };
    let manifest = build(&run, &out, &options).expect("build bundle");
    assert_eq!(manifest.campaign_run_id, "run-42");

    let summary = load_bundle_summary(&out).expect("summary");
    assert_eq!(summary.bundle_id.as_deref(), Some("bundle-42"));
    assert_eq!(summary.campaign_run_id.as_deref(), Some("run-42"));
    assert_eq!(summary.decision_count, Some(manifest.decision_count as u64));
    assert!(summary.lineage.node_count > 0);
    assert!(summary.verification.ok);
}

fn unchecked_options() -> BuildOptions {
    BuildOptions {
        include_checklists: false,
        ..BuildOptions::default()
    }
}

fn decision_ids(bundle: &std::path::Path) -> Vec<String> {
    fs::read_to_string(bundle.join("decisions.jsonl"))
        .expect("read decisions")
        .lines()
        .filter(|line| !line.trim().is_empty())
        .map(|line| {
            let record: Value = serde_json::from_str(line).expect("decision json");
            record["decision_id"].as_str().expect("decision id").to_string()
        })
        .collect()
}

#[test]
fn derived_ids_ignore_record_path_spelling() {
    let temp = TempDir::new().expect("temp dir");
    let run = write_campaign_run(temp.path());
    fs::create_dir_all(temp.path().join("sub")).expect("create sub dir");
    let dotted = temp.path().join("sub").join("..").join("campaign_run.json");

    let plain = build(&run, &temp.path().join("plain"), &unchecked_options())
        .expect("build via plain path");
    let indirect = build(&dotted, &temp.path().join("dotted"), &unchecked_options())
        .expect("build via dotted path");

    assert_eq!(plain.campaign_run_id, indirect.campaign_run_id);
    assert_eq!(
        decision_ids(&temp.path().join("plain")),
        decision_ids(&temp.path().join("dotted"))
    );
}

#[test]
fn extra_artifacts_are_copied_hashed_and_linked() {
    let temp = TempDir::new().expect("temp dir");
    let run = write_campaign_run(temp.path());
    let notes = temp.path().join("notes.txt");
    fs::write(&notes, "assay notes\n").expect("write notes");
    let out = temp.path().join("bundle");
    let options = BuildOptions {
        extra_artifacts: vec![notes.clone()],
        ..unchecked_options()
    };
    let manifest = build(&run, &out, &options).expect("build bundle");
    assert_eq!(manifest.artifact_count, 2);

    let copy_rel = "artifacts/extras/extra_001_notes.txt";
    let copy = out.join(copy_rel);
    assert!(copy.is_file());
    assert!(manifest.files.iter().any(|rel| rel == copy_rel));

    let lineage = read_json(&out.join("lineage.json"));
    let nodes = lineage["nodes"].as_array().expect("nodes");
    let extra = nodes
        .iter()
        .find(|node| node["id"] == "artifact:extra_001")
        .expect("extra artifact node");
    assert_eq!(extra["label"], json!(copy_rel));
    let metadata = &extra["metadata"];
    assert_eq!(metadata["role"], json!("extra"));
    assert_eq!(
        metadata["sha256"],
        json!(sha256_file(&copy).expect("hash copy"))
    );
    assert_eq!(
        metadata["size_bytes"],
        json!(fs::metadata(&copy).expect("stat copy").len())
    );
    assert_eq!(metadata["media_type"], json!("text/plain"));
    assert_eq!(
        metadata["metadata"]["original_path"],
        json!(notes.display().to_string())
    );

    let edges = lineage["edges"].as_array().expect("edges");
    let recorded: Vec<&Value> = edges
        .iter()
        .filter(|edge| edge["type"] == "recorded_in")
        .collect();
    assert!(!recorded.is_empty());
    assert!(recorded
        .iter()
        .all(|edge| edge["to"] == "artifact:campaign_run"));
    assert!(verify(&out).ok);
}

#[cfg(unix)]
#[test]
fn artifact_names_with_trailing_space_still_verify() {
    let temp = TempDir::new().expect("temp dir");
    let run = write_campaign_run(temp.path());
    let notes = temp.path().join("notes.txt ");
    fs::write(&notes, "spaced").expect("write notes");
    let out = temp.path().join("bundle");
    let options = BuildOptions {
        extra_artifacts: vec![notes],
        ..unchecked_options()
    };
    build(&run, &out, &options).expect("build bundle");

    assert!(out.join("artifacts/extras/extra_001_notes.txt ").is_file());
    let result = verify(&out);
    assert!(result.ok, "unexpected errors: {:?}", result.errors);
}
