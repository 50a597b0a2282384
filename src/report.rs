//! Human-readable and JSON run reports.

use std::fmt;

use color_eyre::eyre::Result;

use shelfsweep_ops::{DeleteStatus, EntryKind};

use crate::pipeline::{RunMode, RunOutcome};

const RULE_WIDTH: usize = 70;

/// Format size in human-readable form.
fn format_size(bytes: u64) -> String {
    humansize::format_size(bytes, humansize::BINARY)
}

/// Render the outcome as JSON.
pub fn render_json(outcome: &RunOutcome) -> Result<String> {
    Ok(serde_json::to_string_pretty(outcome)?)
}

/// Render the outcome as text.
pub fn render_text(outcome: &RunOutcome) -> String {
    TextReport(outcome).to_string()
}

/// Text layout of a run outcome.
struct TextReport<'a>(&'a RunOutcome);

impl fmt::Display for TextReport<'_> {
    fn fmt(&self, out: &mut fmt::Formatter<'_>) -> fmt::Result {
        let outcome = self.0;
        let rule = "─".repeat(RULE_WIDTH);

        let title = match outcome.mode {
            RunMode::ScanOnly => "SCAN SUMMARY",
            RunMode::DryRun => "DRY RUN SUMMARY",
            RunMode::Execute => "SUMMARY",
        };

        writeln!(out)?;
        writeln!(out, "{rule}")?;
        writeln!(out, " {title} - {}", outcome.root.display())?;
        writeln!(out, "{rule}")?;

        if let Some(report) = &outcome.duplicates {
            writeln!(
                out,
                " {} books scanned, {} duplicate groups ({} files)",
                outcome.books_scanned,
                report.group_count(),
                report.files_with_duplicates
            )?;
            if outcome.scan_warnings > 0 {
                writeln!(out, " {} warning(s) during scan", outcome.scan_warnings)?;
            }

            if outcome.mode == RunMode::ScanOnly {
                writeln!(
                    out,
                    " Reclaimable space: {}",
                    format_size(report.total_wasted_space)
                )?;
                writeln!(out)?;
                for (i, group) in report.groups.iter().enumerate() {
                    writeln!(out, " Group {} ({})", i + 1, group.key)?;
                    for (j, member) in group.members.iter().enumerate() {
                        let marker = if j == 0 { "keep" } else { "drop" };
                        writeln!(
                            out,
                            "   [{marker}] {:>4}  {}",
                            member.score.value(),
                            member.record.relative.display()
                        )?;
                    }
                }
            }
        }

        if let Some(summary) = &outcome.summary {
            let verb = if summary.dry_run { "Would delete" } else { "Deleted" };
            writeln!(out)?;
            writeln!(out, " Groups processed:     {}", summary.groups)?;
            writeln!(out, " Files kept:           {}", summary.kept)?;
            writeln!(out, " {verb:<21} {} files", summary.deleted_files)?;
            writeln!(out, " Sidecars:             {}", summary.deleted_sidecars)?;
            writeln!(out, " Directories pruned:   {}", summary.pruned_dirs)?;
            writeln!(out, " Space freed:          {}", format_size(summary.bytes_freed))?;
            writeln!(out, " Failures:             {}", summary.failures)?;

            for failed in summary.failed() {
                if let DeleteStatus::Failed(reason) = &failed.status {
                    let kind = match failed.kind {
                        EntryKind::Directory => "dir ",
                        EntryKind::Book | EntryKind::Sidecar => "file",
                    };
                    writeln!(out, "   ! {kind} {reason}")?;
                }
            }
        }

        if let Some(sync) = &outcome.sync {
            writeln!(out)?;
            if let Some(db) = &sync.library_db {
                writeln!(
                    out,
                    " Library DB:           {} of {} entries removed",
                    db.removed, db.checked
                )?;
            }
            if let Some(jf) = &sync.jellyfin {
                writeln!(
                    out,
                    " Jellyfin:             {} of {} entries removed{}",
                    jf.entries_removed,
                    jf.total_books,
                    if jf.refreshed { ", library refreshed" } else { "" }
                )?;
            }
            for skipped in &sync.skipped {
                writeln!(out, "   - skipped {skipped}")?;
            }
            for error in &sync.errors {
                writeln!(out, "   ! {error}")?;
            }
        }

        if outcome.mode != RunMode::Execute {
            writeln!(out)?;
            writeln!(out, " No changes were made.")?;
        }
        writeln!(out, "{rule}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pipeline::{RunOptions, run};
    use shelfsweep_core::DedupConfig;
    use std::fs;
    use tempfile::TempDir;

    fn outcome(mode: RunMode) -> (TempDir, RunOutcome) {
        let temp = TempDir::new().unwrap();
        fs::write(temp.path().join("book.pdf"), b"12345678").unwrap();
        fs::write(temp.path().join("book (1).pdf"), b"12345678").unwrap();

        let options = RunOptions {
            jellyfin: false,
            library_db: false,
            ..RunOptions::new(mode)
        };
        let outcome = run(&DedupConfig::new(temp.path()), options).unwrap();
        (temp, outcome)
    }

    #[test]
    fn test_scan_only_lists_groups() {
        let (_temp, outcome) = outcome(RunMode::ScanOnly);
        let text = render_text(&outcome);

        assert!(text.contains("SCAN SUMMARY"));
        assert!(text.contains("unknown||book"));
        assert!(text.contains("[keep]"));
        assert!(text.contains("book (1).pdf"));
        assert!(text.contains("No changes were made."));
    }

    #[test]
    fn test_dry_run_summary() {
        let (_temp, outcome) = outcome(RunMode::DryRun);
        let text = render_text(&outcome);

        assert!(text.contains("DRY RUN SUMMARY"));
        assert!(text.contains("Would delete          1 files"));
        assert!(text.contains("Space freed:          8 B"));
    }

    #[test]
    fn test_json_is_parseable() {
        let (_temp, outcome) = outcome(RunMode::DryRun);
        let json = render_json(&outcome).unwrap();
        let value: serde_json::Value = serde_json::from_str(&json).unwrap();

        assert_eq!(value["mode"], "dry_run");
        assert_eq!(value["summary"]["deleted_files"], 1);
    }
}
