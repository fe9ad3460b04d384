//! Execution provenance: runtime, git checkout, and dependency versions.
//!
//! Collection never fails. Anything that cannot be determined is recorded as
//! unavailable or with the `not-installed` sentinel.
use crate::model::ExecutionProvenance;
use crate::util::utc_now_iso;
use serde_json::{json, Map, Value};
use std::collections::BTreeMap;
use std::fs;
use std::path::Path;
use std::process::Command;

pub const NOT_INSTALLED: &str = "not-installed";
const SELF_DEPENDENCY: &str = "evidence-bundle";

/// Dependencies recorded when the caller names none.
pub const DEFAULT_DEPENDENCIES: [&str; 5] = [
    SELF_DEPENDENCY,
    "refua-campaign",
    "refua-mcp",
    "refua-data",
    "refua-bench",
];

/// Snapshot the execution environment rooted at `cwd`.
pub fn collect_execution_provenance(
    cwd: &Path,
    dependency_names: &[String],
    extra: Map<String, Value>,
) -> ExecutionProvenance {
    let names: Vec<String> = if dependency_names.is_empty() {
        DEFAULT_DEPENDENCIES.iter().map(|name| name.to_string()).collect()
    } else {
        dependency_names.to_vec()
    };
    ExecutionProvenance {
        captured_at: utc_now_iso(),
        runtime: runtime_info(),
        git: git_info(cwd),
        dependencies: dependency_versions(&names),
        extra,
    }
}

fn runtime_info() -> Map<String, Value> {
    let cpu_count = std::thread::available_parallelism()
        .map(|count| count.get())
        .ok();
    let info = json!({
        "os": std::env::consts::OS,
        "arch": std::env::consts::ARCH,
        "family": std::env::consts::FAMILY,
        "hostname": hostname(),
        "cpu_count": cpu_count,
        "crate_name": env!("CARGO_PKG_NAME"),
        "crate_version": env!("CARGO_PKG_VERSION"),
        "rust_target": format!("{}-{}", std::env::consts::ARCH, std::env::consts::OS),
    });
    match info {
        Value::Object(map) => map,
        _ => Map::new(),
    }
}

fn hostname() -> String {
    for var in ["HOSTNAME", "COMPUTERNAME"] {
        if let Ok(value) = std::env::var(var) {
            if !value.trim().is_empty() {
                return value.trim().to_string();
            }
        }
    }
    fs::read_to_string("/etc/hostname")
        .ok()
        .map(|text| text.trim().to_string())
        .filter(|name| !name.is_empty())
        .unwrap_or_else(|| "unknown".to_string())
}

fn git_info(cwd: &Path) -> Map<String, Value> {
    let mut info = Map::new();
    let head = which::which("git")
        .ok()
        .and_then(|git| run_git(&git, &["rev-parse", "HEAD"], cwd).map(|head| (git, head)));
    let Some((git, head)) = head else {
        info.insert("available".to_string(), Value::Bool(false));
        return info;
    };

    let root = run_git(&git, &["rev-parse", "--show-toplevel"], cwd);
    let dirty = run_git(&git, &["status", "--porcelain"], cwd)
        .map(|status| !status.is_empty())
        .unwrap_or(false);
    info.insert("available".to_string(), Value::Bool(true));
    info.insert("commit".to_string(), Value::String(head));
    info.insert("root".to_string(), root.map(Value::String).unwrap_or(Value::Null));
    info.insert("dirty".to_string(), Value::Bool(dirty));
    info
}

fn run_git(git: &Path, args: &[&str], cwd: &Path) -> Option<String> {
    let output = Command::new(git).args(args).current_dir(cwd).output().ok()?;
    if !output.status.success() {
        return None;
    }
    Some(String::from_utf8_lossy(&output.stdout).trim().to_string())
}

fn dependency_versions(names: &[String]) -> BTreeMap<String, String> {
    names
        .iter()
        .map(|name| (name.clone(), dependency_version(name)))
        .collect()
}

fn dependency_version(name: &str) -> String {
    if name == SELF_DEPENDENCY {
        return env!("CARGO_PKG_VERSION").to_string();
    }
    let Ok(program) = which::which(name) else {
        return NOT_INSTALLED.to_string();
    };
    let output = match Command::new(&program).arg("--version").output() {
        Ok(output) if output.status.success() => output,
        _ => {
            tracing::debug!(dependency = name, "version probe failed");
            return NOT_INSTALLED.to_string();
        }
    };
    String::from_utf8_lossy(&output.stdout)
        .lines()
        .map(str::trim)
        .find(|line| !line.is_empty())
        .map(str::to_string)
        .unwrap_or_else(|| NOT_INSTALLED.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn collects_runtime_and_default_dependencies() {
        let dir = tempfile::tempdir().expect("temp dir");
        let provenance = collect_execution_provenance(dir.path(), &[], Map::new());
        assert!(!provenance.captured_at.is_empty());
        assert!(provenance.runtime.contains_key("os"));
        assert!(provenance.runtime.contains_key("hostname"));
        assert!(provenance.git.contains_key("available"));
        assert_eq!(
            provenance.dependencies.get(SELF_DEPENDENCY).map(String::as_str),
            Some(env!("CARGO_PKG_VERSION"))
        );
        assert_eq!(provenance.dependencies.len(), DEFAULT_DEPENDENCIES.len());
    }

    #[test]
    fn unknown_dependency_uses_sentinel() {
        let dir = tempfile::tempdir().expect("temp dir");
        let names = vec!["definitely-not-a-real-binary-4f1c".to_string()];
        let mut extra = Map::new();
        extra.insert("operator".to_string(), json!("ci"));
        let provenance = collect_execution_provenance(dir.path(), &names, extra);
        assert_eq!(
            provenance.dependencies.get(&names[0]).map(String::as_str),
            Some(NOT_INSTALLED)
        );
        assert_eq!(provenance.extra.get("operator"), Some(&json!("ci")));
    }
}
