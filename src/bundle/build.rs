//! Bundle construction.
//!
//! The manifest is written twice. The bootstrap manifest and its checksums make
//! the bundle structurally complete so checklist evaluation can read it; the
//! final manifest folds the checklist results in and checksums are recomputed.
use super::checksums::{bundle_file_list, write_checksums};
use super::{BundlePaths, CAMPAIGN_RUN_REL};
use crate::checklist::{self, ChecklistReport, DEFAULT_TEMPLATE};
use crate::error::BundleError;
use crate::extract::{
    extract_decisions, extract_model_provenance, infer_campaign_run_id, parse_data_manifest,
};
use crate::lineage::build_lineage_graph;
use crate::model::{
    ArtifactRef, ChecklistBuildSummary, DataProvenance, EvidenceBundleManifest,
    ExecutionProvenance, ManifestStage, BUNDLE_SCHEMA_VERSION,
};
use crate::provenance::collect_execution_provenance;
use crate::util::{
    read_json_object, rel_path, resolve_user_path, sha256_file, stable_id, utc_now_iso,
    write_json, write_jsonl,
};
use anyhow::{Context, Result};
use serde_json::{json, Map, Value};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Instant;

pub const DEFAULT_SOURCE_KIND: &str = "refua-campaign";

/// Inputs that shape one bundle build.
#[derive(Debug, Clone)]
pub struct BuildOptions {
    pub source_kind: String,
    /// Explicit bundle id; derived from the run id and build time when absent.
    pub bundle_id: Option<String>,
    pub data_manifests: Vec<PathBuf>,
    pub extra_artifacts: Vec<PathBuf>,
    pub model_name: Option<String>,
    pub model_version: Option<String>,
    /// Dependencies whose versions are captured; empty means the defaults.
    pub dependency_names: Vec<String>,
    /// Pre-collected provenance; collected from the environment when absent.
    pub execution_provenance: Option<ExecutionProvenance>,
    pub include_checklists: bool,
    /// Templates to evaluate; empty means the default template.
    pub checklist_templates: Vec<String>,
    pub checklist_strict: bool,
    pub checklist_require_no_manual_review: bool,
    pub overwrite: bool,
}

impl Default for BuildOptions {
    fn default() -> Self {
        Self {
            source_kind: DEFAULT_SOURCE_KIND.to_string(),
            bundle_id: None,
            data_manifests: Vec::new(),
            extra_artifacts: Vec::new(),
            model_name: None,
            model_version: None,
            dependency_names: Vec::new(),
            execution_provenance: None,
            include_checklists: true,
            checklist_templates: vec![DEFAULT_TEMPLATE.to_string()],
            checklist_strict: false,
            checklist_require_no_manual_review: false,
            overwrite: false,
        }
    }
}

impl BuildOptions {
    fn templates(&self) -> Vec<String> {
        if self.checklist_templates.is_empty() {
            vec![DEFAULT_TEMPLATE.to_string()]
        } else {
            self.checklist_templates.clone()
        }
    }
}

/// Build an evidence bundle for one campaign record and return the final manifest.
///
/// A checklist policy violation fails the build after the bundle has been
/// written; the directory is left in place.
pub fn build(
    campaign_run_path: &Path,
    output_dir: &Path,
    options: &BuildOptions,
) -> Result<EvidenceBundleManifest> {
    let start = Instant::now();
    let campaign_run_path = resolve_user_path(campaign_run_path);
    let output_dir = resolve_user_path(output_dir);

    if !campaign_run_path.is_file() {
        return Err(BundleError::CampaignRunMissing(campaign_run_path).into());
    }
    // The derived run id hashes this path, so every spelling must collapse to one.
    let campaign_run_path = fs::canonicalize(&campaign_run_path).unwrap_or(campaign_run_path);
    prepare_output_dir(&output_dir, options.overwrite)?;
    let paths = BundlePaths::new(output_dir);

    let record = read_json_object(&campaign_run_path)?;
    let campaign_run_id = infer_campaign_run_id(&record, Some(&campaign_run_path));
    let bundle_id = match options.bundle_id.as_deref().map(str::trim) {
        Some(explicit) if !explicit.is_empty() => explicit.to_string(),
        _ => stable_id(&["bundle", &campaign_run_id, &utc_now_iso()]),
    };

    let decisions = extract_decisions(&record, &campaign_run_id);
    let models = extract_model_provenance(
        &record,
        options.model_name.as_deref(),
        options.model_version.as_deref(),
    );

    let mut warnings = Vec::new();
    let datasets = copy_data_manifests(&paths, &options.data_manifests, &mut warnings)?;
    let artifacts = copy_artifacts(
        &paths,
        &campaign_run_path,
        &options.extra_artifacts,
        &mut warnings,
    )?;

    let execution = match &options.execution_provenance {
        Some(provenance) => provenance.clone(),
        None => {
            let cwd = campaign_run_path.parent().unwrap_or(Path::new("."));
            collect_execution_provenance(cwd, &options.dependency_names, Map::new())
        }
    };

    let lineage = build_lineage_graph(&campaign_run_id, &decisions, &artifacts, &models, &datasets);
    write_jsonl(&paths.decisions_path(), &decisions)?;
    write_json(&paths.lineage_path(), &lineage)?;

    let bootstrap = EvidenceBundleManifest {
        schema_version: BUNDLE_SCHEMA_VERSION.to_string(),
        stage: ManifestStage::Bootstrap,
        bundle_id,
        created_at: utc_now_iso(),
        campaign_run_id,
        source_kind: options.source_kind.clone(),
        source_rel_path: CAMPAIGN_RUN_REL.to_string(),
        decision_count: decisions.len(),
        artifact_count: artifacts.len(),
        model_count: models.len(),
        data_count: datasets.len(),
        files: bundle_file_list(paths.root())?,
        model_provenance: models,
        data_provenance: datasets,
        execution_provenance: Some(execution),
        checklist_reports: Vec::new(),
        checklist_summary: ChecklistBuildSummary::default(),
        warnings,
    };
    write_json(&paths.manifest_path(), &bootstrap)?;
    write_checksums(&paths)?;
    tracing::info!(
        bundle_id = %bootstrap.bundle_id,
        decision_count = bootstrap.decision_count,
        artifact_count = bootstrap.artifact_count,
        "bootstrap manifest written"
    );

    let mut checklist_reports = Vec::new();
    let mut checklist_summary = ChecklistBuildSummary::default();
    if options.include_checklists {
        let reports = write_checklist_reports(&paths, &options.templates(), &mut checklist_reports)?;
        checklist_summary = checklist::summarize_reports(&reports);
        checklist::enforce_policy(
            &reports,
            options.checklist_strict,
            options.checklist_require_no_manual_review,
        )?;
    }

    let manifest = EvidenceBundleManifest {
        stage: ManifestStage::Final,
        files: bundle_file_list(paths.root())?,
        checklist_reports,
        checklist_summary,
        ..bootstrap
    };
    write_json(&paths.manifest_path(), &manifest)?;
    let entries = write_checksums(&paths)?;
    tracing::info!(
        bundle_id = %manifest.bundle_id,
        checksummed_files = entries.len(),
        elapsed_ms = start.elapsed().as_millis(),
        "evidence bundle complete"
    );
    Ok(manifest)
}

fn prepare_output_dir(output_dir: &Path, overwrite: bool) -> Result<()> {
    if output_dir.exists() {
        let occupied = fs::read_dir(output_dir)
            .with_context(|| format!("read {}", output_dir.display()))?
            .next()
            .is_some();
        if overwrite {
            fs::remove_dir_all(output_dir)
                .with_context(|| format!("remove {}", output_dir.display()))?;
        } else if occupied {
            return Err(BundleError::OutputDirNotEmpty(output_dir.to_path_buf()).into());
        }
    }
    fs::create_dir_all(output_dir).with_context(|| format!("create {}", output_dir.display()))?;
    Ok(())
}

/// Copy data manifests into the bundle and parse the copies.
///
/// Copies keep their input position in the file name even when earlier inputs
/// were skipped.
fn copy_data_manifests(
    paths: &BundlePaths,
    sources: &[PathBuf],
    warnings: &mut Vec<String>,
) -> Result<Vec<DataProvenance>> {
    let mut records = Vec::new();
    if sources.is_empty() {
        return Ok(records);
    }
    let data_dir = paths.data_manifests_dir();
    fs::create_dir_all(&data_dir).with_context(|| format!("create {}", data_dir.display()))?;

    for (offset, original) in sources.iter().enumerate() {
        let source = resolve_user_path(original);
        if !source.is_file() {
            tracing::warn!(path = %source.display(), "data manifest not found");
            warnings.push(format!("Missing data manifest: {}", source.display()));
            continue;
        }
        let target = data_dir.join(format!("manifest_{:03}_{}", offset + 1, file_name(&source)));
        copy_file(&source, &target)?;

        match parse_data_manifest(&target) {
            Ok(mut record) => {
                record.manifest_rel_path = Some(rel_path(paths.root(), &target)?);
                records.push(record);
            }
            Err(err) => {
                tracing::warn!(path = %target.display(), "data manifest rejected");
                warnings.push(err.to_string());
            }
        }
    }
    Ok(records)
}

fn copy_artifacts(
    paths: &BundlePaths,
    campaign_run_path: &Path,
    extras: &[PathBuf],
    warnings: &mut Vec<String>,
) -> Result<Vec<ArtifactRef>> {
    let campaign_target = paths.campaign_run_path();
    copy_file(campaign_run_path, &campaign_target)?;
    let mut artifacts = vec![artifact_ref(
        paths,
        "campaign_run",
        "campaign_run",
        &campaign_target,
        Map::new(),
    )?];

    if extras.is_empty() {
        return Ok(artifacts);
    }
    let extras_dir = paths.extras_dir();
    fs::create_dir_all(&extras_dir).with_context(|| format!("create {}", extras_dir.display()))?;

    for (offset, original) in extras.iter().enumerate() {
        let source = resolve_user_path(original);
        if !source.is_file() {
            tracing::warn!(path = %source.display(), "extra artifact not found");
            warnings.push(format!("Missing extra artifact: {}", source.display()));
            continue;
        }
        let artifact_id = format!("extra_{:03}", offset + 1);
        let target = extras_dir.join(format!("{artifact_id}_{}", file_name(&source)));
        copy_file(&source, &target)?;

        let mut metadata = Map::new();
        metadata.insert(
            "original_path".to_string(),
            json!(source.display().to_string()),
        );
        artifacts.push(artifact_ref(paths, &artifact_id, "extra", &target, metadata)?);
    }
    Ok(artifacts)
}

/// Describe a file already copied into the bundle; the hash is of the copy.
fn artifact_ref(
    paths: &BundlePaths,
    artifact_id: &str,
    role: &str,
    target: &Path,
    metadata: Map<String, Value>,
) -> Result<ArtifactRef> {
    let size_bytes = fs::metadata(target)
        .with_context(|| format!("stat {}", target.display()))?
        .len();
    Ok(ArtifactRef {
        artifact_id: artifact_id.to_string(),
        role: role.to_string(),
        rel_path: rel_path(paths.root(), target)?,
        sha256: sha256_file(target)?,
        size_bytes,
        media_type: Some(guess_media_type(target).to_string()),
        metadata,
    })
}

fn write_checklist_reports(
    paths: &BundlePaths,
    templates: &[String],
    rel_paths: &mut Vec<String>,
) -> Result<Vec<ChecklistReport>> {
    let checklists_dir = paths.checklists_dir();
    fs::create_dir_all(&checklists_dir)
        .with_context(|| format!("create {}", checklists_dir.display()))?;

    let mut reports = Vec::with_capacity(templates.len());
    for template in templates {
        let report = checklist::evaluate(paths.root(), template)?;
        let json_path = paths.checklist_json_path(template);
        let markdown_path = paths.checklist_markdown_path(template);
        write_json(&json_path, &report)?;
        fs::write(&markdown_path, checklist::render_markdown(&report))
            .with_context(|| format!("write {}", markdown_path.display()))?;
        rel_paths.push(rel_path(paths.root(), &json_path)?);
        rel_paths.push(rel_path(paths.root(), &markdown_path)?);
        tracing::info!(
            template = %template,
            failed = report.summary.failed,
            manual_review = report.summary.manual_review,
            "checklist evaluated"
        );
        reports.push(report);
    }
    Ok(reports)
}

fn copy_file(source: &Path, target: &Path) -> Result<()> {
    if let Some(parent) = target.parent() {
        fs::create_dir_all(parent).with_context(|| format!("create {}", parent.display()))?;
    }
    fs::copy(source, target)
        .with_context(|| format!("copy {} to {}", source.display(), target.display()))?;
    Ok(())
}

fn file_name(path: &Path) -> String {
    path.file_name()
        .map(|name| name.to_string_lossy().to_string())
        .unwrap_or_default()
}

fn guess_media_type(path: &Path) -> &'static str {
    let extension = path
        .extension()
        .map(|ext| ext.to_string_lossy().to_ascii_lowercase())
        .unwrap_or_default();
    match extension.as_str() {
        "json" => "application/json",
        "yaml" | "yml" => "application/yaml",
        "txt" => "text/plain",
        _ => "application/octet-stream",
    }
}
