//! Markdown and JSON report generation.
//!
//! This module turns grouped notifications into a readable digest,
//! one block per group, in the order the groups were emitted.

use crate::grouping::{most_active_accounts, SkippedRecord};
use crate::models::{
    AccountActivity, GroupKind, GroupSummary, GroupedNotification, Report, ReportMetadata,
};
use anyhow::{Context, Result};
use std::path::Path;

/// Assemble a report from grouped output.
pub fn build_report(
    metadata: ReportMetadata,
    groups: Vec<GroupedNotification>,
    skipped: Vec<SkippedRecord>,
    top_accounts: usize,
) -> Report {
    let summary = GroupSummary::from_groups(&groups);
    let top_accounts = most_active_accounts(&groups, top_accounts);

    Report {
        metadata,
        summary,
        top_accounts,
        groups,
        skipped,
    }
}

/// Generate a complete Markdown report.
pub fn generate_markdown_report(report: &Report) -> String {
    let mut output = String::new();

    output.push_str("# Notification Digest\n\n");
    output.push_str(&generate_metadata_section(&report.metadata));
    output.push_str(&generate_summary_section(&report.summary));
    output.push_str(&generate_accounts_section(&report.top_accounts));
    output.push_str(&generate_groups_section(&report.groups));
    output.push_str(&generate_skipped_section(&report.skipped));
    output.push_str(&generate_footer());

    output
}

/// Generate the metadata section.
fn generate_metadata_section(metadata: &ReportMetadata) -> String {
    let mut section = String::new();

    section.push_str("## Metadata\n\n");
    section.push_str(&format!("- **Sources:** {}\n", metadata.sources.join(", ")));
    section.push_str(&format!(
        "- **Generated:** {}\n",
        metadata.generated_at.format("%Y-%m-%d %H:%M:%S UTC")
    ));
    section.push_str(&format!("- **Day Boundaries:** `{}`\n", metadata.day_zone));
    section.push_str(&format!(
        "- **Notifications Read:** {}\n",
        metadata.input_notifications
    ));
    if metadata.excluded_notifications > 0 {
        section.push_str(&format!(
            "- **Excluded by Type:** {}\n",
            metadata.excluded_notifications
        ));
    }
    if metadata.skipped_records > 0 {
        section.push_str(&format!(
            "- **Skipped Records:** {}\n",
            metadata.skipped_records
        ));
    }
    section.push_str(&format!(
        "- **Processing Time:** {:.3}s\n",
        metadata.duration_seconds
    ));
    section.push('\n');

    section
}

/// Generate the summary section.
fn generate_summary_section(summary: &GroupSummary) -> String {
    let mut section = String::new();

    section.push_str("## Summary\n\n");
    section.push_str(&format!(
        "{} notifications folded into {} entries.\n\n",
        summary.total_notifications, summary.total_groups
    ));

    if !summary.by_type.is_empty() {
        section.push_str("| Type | Entries |\n");
        section.push_str("|:---|:---:|\n");

        let mut types: Vec<_> = summary.by_type.iter().collect();
        types.sort_by(|a, b| b.1.cmp(a.1).then_with(|| a.0.cmp(b.0)));

        for (kind, count) in types {
            section.push_str(&format!("| {} | {} |\n", kind, count));
        }
        section.push('\n');
    }

    section
}

/// Generate the most active accounts table.
fn generate_accounts_section(accounts: &[AccountActivity]) -> String {
    if accounts.is_empty() {
        return String::new();
    }

    let mut section = String::new();

    section.push_str("## Most Active Accounts\n\n");
    section.push_str("| Account | Notifications |\n");
    section.push_str("|:---|:---:|\n");
    for activity in accounts {
        section.push_str(&format!(
            "| {} | {} |\n",
            activity.account.handle(),
            activity.notifications
        ));
    }
    section.push('\n');

    section
}

/// Generate the per-group section.
fn generate_groups_section(groups: &[GroupedNotification]) -> String {
    let mut section = String::new();

    section.push_str("## Notifications\n\n");

    if groups.is_empty() {
        section.push_str("Nothing to show.\n\n");
        return section;
    }

    for group in groups {
        section.push_str(&generate_group_block(group));
    }

    section
}

/// Generate a single group block.
fn generate_group_block(group: &GroupedNotification) -> String {
    let mut block = String::new();

    block.push_str(&format!(
        "### {} {} ({})\n\n",
        group_emoji(&group.kind),
        group.kind,
        group.created_at.format("%Y-%m-%d %H:%M UTC")
    ));

    if let Some(ref status) = group.status {
        match status.url {
            Some(ref url) => block.push_str(&format!("**Post:** [{}]({})\n\n", status.id, url)),
            None => block.push_str(&format!("**Post:** `{}`\n\n", status.id)),
        }
    }

    if group.is_standalone() {
        block.push_str(&format!("- {}\n", group.account.handle()));
    } else {
        for grouped in &group.accounts {
            let types: Vec<&str> = grouped.types.iter().map(|t| t.as_str()).collect();
            block.push_str(&format!(
                "- {} ({})\n",
                grouped.account.handle(),
                types.join(", ")
            ));
        }
    }
    block.push('\n');

    block
}

fn group_emoji(kind: &GroupKind) -> &'static str {
    match kind {
        GroupKind::FavouriteReblog => "⭐🔁",
        GroupKind::Single(kind) => kind.emoji(),
    }
}

/// Generate the skipped records section.
fn generate_skipped_section(skipped: &[SkippedRecord]) -> String {
    if skipped.is_empty() {
        return String::new();
    }

    let mut section = String::new();

    section.push_str("## Skipped Records\n\n");
    for record in skipped {
        section.push_str(&format!(
            "- `{}` #{}: {}\n",
            record.origin, record.index, record.reason
        ));
    }
    section.push('\n');

    section
}

/// Generate the report footer.
fn generate_footer() -> String {
    "---\n\n*Generated by notifold*\n".to_string()
}

/// Generate a JSON report.
pub fn generate_json_report(report: &Report) -> Result<String> {
    serde_json::to_string_pretty(report).map_err(Into::into)
}

/// Write rendered report content to a file.
pub fn write_report(content: &str, path: &Path) -> Result<()> {
    std::fs::write(path, content)
        .with_context(|| format!("Failed to write report to {}", path.display()))
}
