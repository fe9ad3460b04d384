//! Cross-template aggregation and policy gating for builds.
use super::ChecklistReport;
use crate::error::BundleError;
use crate::model::{ChecklistAggregate, ChecklistBuildSummary, TemplateSummary};
use anyhow::Result;

/// Fold per-template reports into the summary recorded in the manifest.
pub fn summarize_reports(reports: &[ChecklistReport]) -> ChecklistBuildSummary {
    let templates: Vec<TemplateSummary> = reports
        .iter()
        .map(|report| TemplateSummary {
            template: report.template.clone(),
            total_checks: report.summary.total_checks,
            failed: report.summary.failed,
            manual_review: report.summary.manual_review,
            blocking_failed: report.summary.blocking_failed,
            auto_checks_passed: report.summary.auto_checks_passed,
            submission_ready: report.summary.submission_ready,
        })
        .collect();
    let names_where = |keep: fn(&TemplateSummary) -> bool| -> Vec<String> {
        templates
            .iter()
            .filter(|summary| keep(summary))
            .map(|summary| summary.template.clone())
            .collect()
    };
    let aggregate = ChecklistAggregate {
        template_count: templates.len(),
        failed_templates: names_where(|summary| summary.failed > 0),
        manual_review_templates: names_where(|summary| summary.manual_review > 0),
        blocking_failed_templates: names_where(|summary| summary.blocking_failed > 0),
    };
    ChecklistBuildSummary {
        templates,
        aggregate: Some(aggregate),
    }
}

/// Describe every policy violation, or `None` when the reports are acceptable.
///
/// Offending template names are sorted; strict and no-manual-review findings
/// are joined with `; `.
pub fn policy_violations(
    reports: &[ChecklistReport],
    strict: bool,
    require_no_manual_review: bool,
) -> Option<String> {
    let offending = |predicate: fn(&ChecklistReport) -> bool| -> Vec<&str> {
        let mut names: Vec<&str> = reports
            .iter()
            .filter(|report| predicate(report))
            .map(|report| report.template.as_str())
            .collect();
        names.sort_unstable();
        names
    };

    let mut messages = Vec::new();
    if strict {
        let failed = offending(|report| report.summary.failed > 0);
        if !failed.is_empty() {
            messages.push(format!(
                "Checklist strict mode failed for templates: {}",
                failed.join(", ")
            ));
        }
    }
    if require_no_manual_review {
        let manual = offending(|report| report.summary.manual_review > 0);
        if !manual.is_empty() {
            messages.push(format!(
                "Checklist no-manual-review mode failed for templates: {}",
                manual.join(", ")
            ));
        }
    }
    if messages.is_empty() {
        None
    } else {
        Some(messages.join("; "))
    }
}

/// Fail with [`BundleError::ChecklistPolicy`] when any gate trips.
pub fn enforce_policy(
    reports: &[ChecklistReport],
    strict: bool,
    require_no_manual_review: bool,
) -> Result<()> {
    match policy_violations(reports, strict, require_no_manual_review) {
        Some(message) => {
            tracing::warn!(%message, "checklist policy violated");
            Err(BundleError::ChecklistPolicy(message).into())
        }
        None => Ok(()),
    }
}
