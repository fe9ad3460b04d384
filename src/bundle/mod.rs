//! Evidence bundle layout, construction, and verification.
use std::path::{Path, PathBuf};

mod build;
pub mod checksums;
mod summary;
mod verify;

pub use build::{build, BuildOptions, DEFAULT_SOURCE_KIND};
pub use summary::{load_bundle_summary, BundleSummary};
pub use verify::verify;

pub const MANIFEST_FILE: &str = "manifest.json";
pub const DECISIONS_FILE: &str = "decisions.jsonl";
pub const LINEAGE_FILE: &str = "lineage.json";
pub const CHECKSUMS_FILE: &str = "checksums.sha256";
pub const CAMPAIGN_RUN_REL: &str = "artifacts/campaign_run.json";
pub const DATA_MANIFESTS_REL: &str = "artifacts/data_manifests";
pub const EXTRAS_REL: &str = "artifacts/extras";
pub const CHECKLISTS_REL: &str = "checklists";

/// Top-level files every bundle must carry.
pub const REQUIRED_FILES: [&str; 4] = [MANIFEST_FILE, DECISIONS_FILE, LINEAGE_FILE, CHECKSUMS_FILE];

/// Typed paths into a bundle directory.
#[derive(Debug, Clone)]
pub struct BundlePaths {
    root: PathBuf,
}

impl BundlePaths {
    pub fn new(root: PathBuf) -> Self {
        Self { root }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn manifest_path(&self) -> PathBuf {
        self.root.join(MANIFEST_FILE)
    }

    pub fn decisions_path(&self) -> PathBuf {
        self.root.join(DECISIONS_FILE)
    }

    pub fn lineage_path(&self) -> PathBuf {
        self.root.join(LINEAGE_FILE)
    }

    pub fn checksums_path(&self) -> PathBuf {
        self.root.join(CHECKSUMS_FILE)
    }

    /// Return the copied campaign record path.
    pub fn campaign_run_path(&self) -> PathBuf {
        self.root.join(CAMPAIGN_RUN_REL)
    }

    pub fn data_manifests_dir(&self) -> PathBuf {
        self.root.join(DATA_MANIFESTS_REL)
    }

    pub fn extras_dir(&self) -> PathBuf {
        self.root.join(EXTRAS_REL)
    }

    pub fn checklists_dir(&self) -> PathBuf {
        self.root.join(CHECKLISTS_REL)
    }

    /// Return the JSON report path for a checklist template.
    pub fn checklist_json_path(&self, template: &str) -> PathBuf {
        self.checklists_dir().join(format!("{template}.json"))
    }

    /// Return the Markdown report path for a checklist template.
    pub fn checklist_markdown_path(&self, template: &str) -> PathBuf {
        self.checklists_dir().join(format!("{template}.md"))
    }

    /// Resolve a bundle-relative path that uses forward slashes.
    pub fn resolve(&self, rel: &str) -> PathBuf {
        rel.split('/')
            .filter(|part| !part.is_empty())
            .fold(self.root.clone(), |path, part| path.join(part))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn paths_follow_bundle_layout() {
        let paths = BundlePaths::new(PathBuf::from("/tmp/bundle"));
        assert_eq!(
            paths.campaign_run_path(),
            PathBuf::from("/tmp/bundle/artifacts/campaign_run.json")
        );
        assert_eq!(
            paths.checklist_markdown_path("core"),
            PathBuf::from("/tmp/bundle/checklists/core.md")
        );
        assert_eq!(
            paths.resolve("artifacts/extras/extra_001_notes.txt"),
            PathBuf::from("/tmp/bundle/artifacts/extras/extra_001_notes.txt")
        );
    }
}
