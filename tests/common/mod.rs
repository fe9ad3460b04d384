//! Shared fixtures for integration tests.
#![allow(dead_code)]

use serde_json::{json, Value};
use std::fs;
use std::path::{Path, PathBuf};

/// Campaign payload with a validate-then-fold plan and executed results.
pub fn sample_campaign_payload() -> Value {
    let plan = json!({
        "calls": [
            {"tool": "refua_validate_spec", "args": {"name": "kras_g12d", "entities": []}},
            {"tool": "refua_fold", "args": {"name": "kras_g12d", "affinity": true}}
        ]
    });
    json!({
        "objective": "Identify KRAS G12D binders with acceptable predicted affinity.",
        "planner_response_text": "Validate the specification first, then fold and score the complex.",
        "plan": plan,
        "final_plan": plan,
        "results": [
            {
                "tool": "refua_validate_spec",
                "args": {"name": "kras_g12d"},
                "output": {"valid": true, "warnings": []}
            },
            {
                "tool": "refua_fold",
                "args": {"name": "kras_g12d"},
                "output": {
                    "name": "kras_g12d",
                    "backend": "refua",
                    "affinity": {"binding_probability": 0.83, "ic50": 14.2},
                    "warnings": []
                }
            }
        ]
    })
}

/// Write the sample campaign run into `dir` and return its path.
pub fn write_campaign_run(dir: &Path) -> PathBuf {
    write_campaign_payload(dir, &sample_campaign_payload())
}

pub fn write_campaign_payload(dir: &Path, payload: &Value) -> PathBuf {
    let path = dir.join("campaign_run.json");
    let text = serde_json::to_string_pretty(payload).expect("serialize campaign");
    fs::write(&path, text).expect("write campaign run");
    path
}

/// Write a ChEMBL-style dataset manifest into `dir` and return its path.
pub fn write_data_manifest(dir: &Path) -> PathBuf {
    let manifest = json!({
        "dataset_id": "chembl_activity_ki_human",
        "version": "latest",
        "source": {
            "url": "https://www.ebi.ac.uk/chembl/api/data/activity.json",
            "sha256": "f".repeat(64)
        },
        "row_count": 12500
    });
    let path = dir.join("chembl_manifest.json");
    fs::write(&path, manifest.to_string()).expect("write data manifest");
    path
}

pub fn read_json(path: &Path) -> Value {
    let text = fs::read_to_string(path).expect("read json");
    serde_json::from_str(&text).expect("parse json")
}
