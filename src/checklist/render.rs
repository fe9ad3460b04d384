use super::ChecklistReport;

/// Render a checklist report as Markdown: a summary block and a check table.
pub fn render_markdown(report: &ChecklistReport) -> String {
    let summary = &report.summary;
    let or_none = |value: &Option<String>| value.clone().unwrap_or_else(|| "<none>".to_string());
    let mut lines = vec![
        format!("# Regulatory Checklist: {}", report.template),
        String::new(),
        format!("- Bundle ID: `{}`", or_none(&report.bundle_id)),
        format!("- Campaign Run ID: `{}`", or_none(&report.campaign_run_id)),
        format!("- Generated At: `{}`", report.generated_at),
        String::new(),
        "## Summary".to_string(),
        String::new(),
        format!("- Total Checks: `{}`", summary.total_checks),
        format!("- Passed: `{}`", summary.passed),
        format!("- Failed: `{}`", summary.failed),
        format!("- Manual Review: `{}`", summary.manual_review),
        format!("- Not Applicable: `{}`", summary.not_applicable),
        format!("- Auto Checks Passed: `{}`", summary.auto_checks_passed),
        format!("- Submission Ready: `{}`", summary.submission_ready),
        format!("- Blocking Failed: `{}`", summary.blocking_failed),
        String::new(),
        "## Check Items".to_string(),
        String::new(),
        "| ID | Domain | Severity | Automated | Status | Details |".to_string(),
        "|---|---|---|---|---|---|".to_string(),
    ];
    for item in &report.items {
        lines.push(format!(
            "| {} | {} | {} | {} | {} | {} |",
            item.id,
            item.domain,
            item.severity,
            item.automated,
            item.status,
            item.details.replace('|', "\\|")
        ));
    }
    let mut text = lines.join("\n");
    text.push('\n');
    text
}
