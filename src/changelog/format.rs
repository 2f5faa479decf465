//! Markdown rendering of one changelog section.

use chrono::NaiveDate;

use crate::pipeline::DiffAnalysis;

/// Written once at the top of a new changelog file.
pub const CHANGELOG_HEADER: &str = "# Changelog\n\nEntries generated by quill from staged changes.\n";

/// Render the section for one commit.
///
/// The message subject becomes the heading and any body follows as a
/// paragraph. Every analyzed file is listed exactly once, in diff order.
pub fn render_section(analysis: &DiffAnalysis, message: &str, date: NaiveDate) -> String {
    let message = message.trim();
    let (subject, body) = match message.split_once('\n') {
        Some((subject, rest)) => (subject.trim(), rest.trim()),
        None => (message, ""),
    };

    let mut out = format!("## {subject}\n\n");
    if !body.is_empty() {
        out.push_str(body);
        out.push_str("\n\n");
    }
    out.push_str(&format!("_Generated on {}_\n\n", date.format("%Y-%m-%d")));

    out.push_str("### Summary\n\n");
    out.push_str(&analysis.summary);
    out.push_str("\n\n");

    out.push_str("### Changed Files\n\n");
    for file in &analysis.files {
        out.push_str(&format!("- **{}**: {}\n", file.path(), file.purpose()));
    }
    out.push('\n');

    out.push_str(&format!("**Type:** `{}`\n", analysis.change_type));

    if analysis.breaking_change {
        out.push_str("\n### BREAKING CHANGES\n\n");
        let notes: Vec<&str> = message
            .lines()
            .filter_map(|l| l.trim().strip_prefix("BREAKING CHANGE:"))
            .map(str::trim)
            .filter(|n| !n.is_empty())
            .collect();
        if notes.is_empty() {
            out.push_str("This change breaks a public interface.\n");
        } else {
            for note in notes {
                out.push_str(&format!("- {note}\n"));
            }
        }
    }

    out
}
