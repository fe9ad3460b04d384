//! Regulatory checklist evaluation over a written bundle.
//!
//! A template is an ordered list of [`CheckDefinition`]s. Each check is a pure
//! function of a read-only [`ChecklistContext`] loaded once per evaluation.
use crate::error::BundleError;
use crate::util::{resolve_user_path, utc_now_iso};
use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::Path;

mod checks;
mod context;
mod manual;
mod policy;
mod render;
mod templates;

pub use context::ChecklistContext;
pub use policy::{enforce_policy, policy_violations, summarize_reports};
pub use render::render_markdown;
pub use templates::{available_templates, template_checks, DEFAULT_TEMPLATE};

pub const REPORT_SCHEMA_VERSION: &str = "1.1.0";

#[derive(Debug, Deserialize, Serialize, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum CheckStatus {
    Pass,
    Fail,
    ManualReview,
    NotApplicable,
}

impl CheckStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            CheckStatus::Pass => "pass",
            CheckStatus::Fail => "fail",
            CheckStatus::ManualReview => "manual_review",
            CheckStatus::NotApplicable => "not_applicable",
        }
    }
}

impl fmt::Display for CheckStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Deserialize, Serialize, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum Severity {
    Critical,
    High,
    Medium,
    Low,
}

impl Severity {
    pub fn as_str(&self) -> &'static str {
        match self {
            Severity::Critical => "critical",
            Severity::High => "high",
            Severity::Medium => "medium",
            Severity::Low => "low",
        }
    }

    /// Failed checks at this severity block submission.
    pub fn is_blocking(&self) -> bool {
        matches!(self, Severity::Critical | Severity::High)
    }
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Result of running one check.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CheckOutcome {
    pub status: CheckStatus,
    pub details: String,
    pub recommendation: String,
    pub evidence: Vec<String>,
}

impl CheckOutcome {
    pub fn pass(details: &str) -> Self {
        Self {
            status: CheckStatus::Pass,
            details: details.to_string(),
            recommendation: String::new(),
            evidence: Vec::new(),
        }
    }

    pub fn fail(details: &str, recommendation: &str) -> Self {
        Self {
            status: CheckStatus::Fail,
            details: details.to_string(),
            recommendation: recommendation.to_string(),
            evidence: Vec::new(),
        }
    }

    pub fn manual_review(details: &str, recommendation: &str) -> Self {
        Self {
            status: CheckStatus::ManualReview,
            details: details.to_string(),
            recommendation: recommendation.to_string(),
            evidence: Vec::new(),
        }
    }

    pub fn with_evidence<I, S>(mut self, evidence: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.evidence = evidence.into_iter().map(Into::into).collect();
        self
    }
}

pub type CheckFn = fn(&ChecklistContext) -> CheckOutcome;

/// Static description of a check plus its evaluation function.
#[derive(Debug, Clone, Copy)]
pub struct CheckDefinition {
    pub id: &'static str,
    pub title: &'static str,
    pub domain: &'static str,
    pub severity: Severity,
    pub automated: bool,
    pub regulatory_tags: &'static [&'static str],
    pub evaluate: CheckFn,
}

/// One evaluated check as it appears in a report.
#[derive(Debug, Deserialize, Serialize, Clone, PartialEq, Eq)]
pub struct ChecklistItem {
    pub id: String,
    pub title: String,
    pub domain: String,
    pub severity: Severity,
    pub automated: bool,
    pub regulatory_tags: Vec<String>,
    pub status: CheckStatus,
    pub details: String,
    pub recommendation: String,
    pub evidence: Vec<String>,
}

impl ChecklistItem {
    fn from_outcome(check: &CheckDefinition, outcome: CheckOutcome) -> Self {
        Self {
            id: check.id.to_string(),
            title: check.title.to_string(),
            domain: check.domain.to_string(),
            severity: check.severity,
            automated: check.automated,
            regulatory_tags: check
                .regulatory_tags
                .iter()
                .map(|tag| tag.to_string())
                .collect(),
            status: outcome.status,
            details: outcome.details,
            recommendation: outcome.recommendation,
            evidence: outcome.evidence,
        }
    }
}

#[derive(Debug, Deserialize, Serialize, Clone, Copy, PartialEq, Eq, Default)]
pub struct StatusCounts {
    pub pass: usize,
    pub fail: usize,
    pub manual_review: usize,
}

#[derive(Debug, Deserialize, Serialize, Clone, Copy, PartialEq, Eq, Default)]
pub struct SeverityBreakdown {
    pub critical: StatusCounts,
    pub high: StatusCounts,
    pub medium: StatusCounts,
    pub low: StatusCounts,
}

impl SeverityBreakdown {
    fn slot(&mut self, severity: Severity) -> &mut StatusCounts {
        match severity {
            Severity::Critical => &mut self.critical,
            Severity::High => &mut self.high,
            Severity::Medium => &mut self.medium,
            Severity::Low => &mut self.low,
        }
    }
}

#[derive(Debug, Deserialize, Serialize, Clone, PartialEq, Eq, Default)]
pub struct ChecklistSummary {
    pub total_checks: usize,
    pub passed: usize,
    pub failed: usize,
    pub manual_review: usize,
    pub not_applicable: usize,
    /// No automated check failed or fell back to manual review.
    pub auto_checks_passed: bool,
    /// Nothing failed and nothing awaits manual review.
    pub submission_ready: bool,
    /// Failed checks of critical or high severity.
    pub blocking_failed: usize,
    pub by_severity: SeverityBreakdown,
}

impl ChecklistSummary {
    pub fn from_items(items: &[ChecklistItem]) -> Self {
        let mut summary = Self {
            total_checks: items.len(),
            ..Self::default()
        };
        let mut automated_unresolved = 0;
        for item in items {
            let slot = summary.by_severity.slot(item.severity);
            match item.status {
                CheckStatus::Pass => {
                    summary.passed += 1;
                    slot.pass += 1;
                }
                CheckStatus::Fail => {
                    summary.failed += 1;
                    slot.fail += 1;
                    if item.severity.is_blocking() {
                        summary.blocking_failed += 1;
                    }
                }
                CheckStatus::ManualReview => {
                    summary.manual_review += 1;
                    slot.manual_review += 1;
                }
                CheckStatus::NotApplicable => summary.not_applicable += 1,
            }
            if item.automated
                && matches!(item.status, CheckStatus::Fail | CheckStatus::ManualReview)
            {
                automated_unresolved += 1;
            }
        }
        summary.auto_checks_passed = automated_unresolved == 0;
        summary.submission_ready = summary.failed == 0 && summary.manual_review == 0;
        summary
    }
}

#[derive(Debug, Deserialize, Serialize, Clone, PartialEq, Eq)]
pub struct ChecklistReport {
    pub schema_version: String,
    pub template: String,
    pub generated_at: String,
    pub bundle_dir: String,
    pub bundle_id: Option<String>,
    pub campaign_run_id: Option<String>,
    pub summary: ChecklistSummary,
    pub items: Vec<ChecklistItem>,
}

/// Evaluate a named template against a bundle directory.
///
/// Only an unknown template name is an error; an unreadable bundle simply
/// fails the checks that depend on the missing pieces.
pub fn evaluate(bundle_dir: &Path, template: &str) -> Result<ChecklistReport> {
    let checks = template_checks(template).ok_or_else(|| BundleError::UnknownTemplate {
        name: template.to_string(),
        available: available_templates().join(", "),
    })?;
    let root = resolve_user_path(bundle_dir);
    let context = ChecklistContext::load(&root);

    let items: Vec<ChecklistItem> = checks
        .iter()
        .map(|check| ChecklistItem::from_outcome(check, (check.evaluate)(&context)))
        .collect();
    tracing::debug!(template, checks = items.len(), "checklist items evaluated");

    Ok(ChecklistReport {
        schema_version: REPORT_SCHEMA_VERSION.to_string(),
        template: template.to_string(),
        generated_at: utc_now_iso(),
        bundle_dir: root.display().to_string(),
        bundle_id: context.manifest_str("bundle_id"),
        campaign_run_id: context.manifest_str("campaign_run_id"),
        summary: ChecklistSummary::from_items(&items),
        items,
    })
}
