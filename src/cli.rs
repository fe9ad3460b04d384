//! CLI argument parsing for evidence bundle commands.
//!
//! Flags map one-to-one onto library options; no policy lives here.
use clap::builder::PossibleValuesParser;
use clap::{Parser, Subcommand};
use evidence_bundle::checklist::{available_templates, DEFAULT_TEMPLATE};
use evidence_bundle::{BuildOptions, DEFAULT_SOURCE_KIND};
use std::path::PathBuf;

/// Root CLI entrypoint.
#[derive(Parser, Debug)]
#[command(
    name = "ebundle",
    version,
    about = "Build, verify, and score regulatory evidence bundles for campaign runs",
    after_help = "Examples:\n  ebundle build --campaign-run run.json --output-dir bundle --data-manifest data.json\n  ebundle verify --bundle-dir bundle --json\n  ebundle checklist --bundle-dir bundle --template core --strict\n  ebundle templates",
    subcommand_required = true,
    arg_required_else_help = true
)]
pub struct RootArgs {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    Build(BuildArgs),
    Verify(VerifyArgs),
    Summary(SummaryArgs),
    Checklist(ChecklistArgs),
    Templates,
}

#[derive(Parser, Debug)]
#[command(about = "Build an evidence bundle from a campaign run")]
pub struct BuildArgs {
    /// Campaign run JSON to bundle
    #[arg(long, value_name = "PATH")]
    pub campaign_run: PathBuf,

    /// Directory the bundle is written to
    #[arg(long, value_name = "DIR")]
    pub output_dir: PathBuf,

    /// Source system label
    #[arg(long, default_value = DEFAULT_SOURCE_KIND)]
    pub source_kind: String,

    /// Explicit bundle id (derived when omitted)
    #[arg(long)]
    pub bundle_id: Option<String>,

    /// Dataset manifest JSON to copy into the bundle (repeatable)
    #[arg(long, value_name = "PATH")]
    pub data_manifest: Vec<PathBuf>,

    /// Additional artifact to copy into the bundle (repeatable)
    #[arg(long, value_name = "PATH")]
    pub extra_artifact: Vec<PathBuf>,

    /// Model name recorded for every derived model
    #[arg(long)]
    pub model_name: Option<String>,

    /// Model version recorded for every derived model
    #[arg(long)]
    pub model_version: Option<String>,

    /// Dependency whose version is captured (repeatable)
    #[arg(long, value_name = "NAME")]
    pub dependency: Vec<String>,

    /// Skip checklist generation
    #[arg(long)]
    pub no_checklist: bool,

    /// Checklist template to generate (repeatable; defaults to drug_discovery_comprehensive)
    #[arg(long, value_parser = PossibleValuesParser::new(available_templates()))]
    pub checklist_template: Vec<String>,

    /// Fail the build when a generated checklist has failed checks
    #[arg(long)]
    pub checklist_strict: bool,

    /// Fail the build when a generated checklist has manual-review items
    #[arg(long)]
    pub checklist_require_no_manual_review: bool,

    /// Replace a non-empty output directory
    #[arg(long)]
    pub overwrite: bool,
}

impl BuildArgs {
    pub fn to_options(&self) -> BuildOptions {
        BuildOptions {
            source_kind: self.source_kind.clone(),
            bundle_id: self.bundle_id.clone(),
            data_manifests: self.data_manifest.clone(),
            extra_artifacts: self.extra_artifact.clone(),
            model_name: self.model_name.clone(),
            model_version: self.model_version.clone(),
            dependency_names: self.dependency.clone(),
            execution_provenance: None,
            include_checklists: !self.no_checklist,
            checklist_templates: self.checklist_template.clone(),
            checklist_strict: self.checklist_strict,
            checklist_require_no_manual_review: self.checklist_require_no_manual_review,
            overwrite: self.overwrite,
        }
    }
}

#[derive(Parser, Debug)]
#[command(about = "Verify bundle integrity")]
pub struct VerifyArgs {
    /// Evidence bundle directory
    #[arg(long, value_name = "DIR")]
    pub bundle_dir: PathBuf,

    /// Emit machine-readable JSON output
    #[arg(long)]
    pub json: bool,
}

#[derive(Parser, Debug)]
#[command(about = "Print a bundle summary as JSON")]
pub struct SummaryArgs {
    /// Evidence bundle directory
    #[arg(long, value_name = "DIR")]
    pub bundle_dir: PathBuf,
}

#[derive(Parser, Debug)]
#[command(about = "Evaluate a regulatory checklist against a bundle")]
pub struct ChecklistArgs {
    /// Evidence bundle directory
    #[arg(long, value_name = "DIR")]
    pub bundle_dir: PathBuf,

    /// Checklist template name
    #[arg(
        long,
        default_value = DEFAULT_TEMPLATE,
        value_parser = PossibleValuesParser::new(available_templates())
    )]
    pub template: String,

    /// Also write the report JSON here
    #[arg(long, value_name = "PATH")]
    pub output_json: Option<PathBuf>,

    /// Also write the report Markdown here
    #[arg(long, value_name = "PATH")]
    pub output_markdown: Option<PathBuf>,

    /// Exit non-zero when any check fails
    #[arg(long)]
    pub strict: bool,

    /// Exit non-zero when any check needs manual review
    #[arg(long)]
    pub require_no_manual_review: bool,
}
