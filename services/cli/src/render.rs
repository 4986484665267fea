use list_hygiene::hygiene::{CheckpointStats, SweepSummary};
use std::fmt::Write;

pub(crate) fn sweep_summary(summary: &SweepSummary) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "Total emails: {}", summary.total);
    let _ = writeln!(out, "Already checked: {}", summary.already_checked);
    let _ = writeln!(out, "Remaining to check: {}", summary.remaining);
    let _ = writeln!(
        out,
        "Checked this run: {} ({} failed, {} still pending)",
        summary.checked,
        summary.failed,
        summary.left_over()
    );
    let _ = writeln!(out, "Newly bad: {}", summary.newly_bad);
    if summary.carried_over > 0 {
        let _ = writeln!(out, "Carried over from earlier runs: {}", summary.carried_over);
    }
    let _ = writeln!(out, "Rows updated: {}", summary.updated);
    if summary.interrupted {
        let _ = writeln!(out, "Interrupted: rerun to continue from the checkpoint log");
    }
    out
}

pub(crate) fn checkpoint_stats(path: &str, stats: &CheckpointStats) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "Checkpoint log: {path}");
    let _ = writeln!(out, "Rows: {}", stats.rows);
    let _ = writeln!(out, "Distinct addresses: {}", stats.distinct_emails);
    let _ = writeln!(out, "Bad addresses: {}", stats.bad_emails);

    match (stats.first_checked, stats.last_checked) {
        (Some(first), Some(last)) => {
            let _ = writeln!(out, "Checked between {first} and {last}");
        }
        _ => {
            let _ = writeln!(out, "No checks recorded");
        }
    }

    if !stats.by_result.is_empty() {
        let _ = writeln!(out, "\nResults");
        for (result, count) in &stats.by_result {
            let _ = writeln!(out, "- {result}: {count}");
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sweep_summary_reports_convergence_counts() {
        let summary = SweepSummary {
            total: 2,
            already_checked: 0,
            remaining: 2,
            checked: 2,
            failed: 0,
            newly_bad: 1,
            carried_over: 0,
            updated: 1,
            interrupted: false,
        };

        let text = sweep_summary(&summary);
        assert!(text.contains("Total emails: 2"));
        assert!(text.contains("Remaining to check: 2"));
        assert!(text.contains("Newly bad: 1"));
        assert!(text.contains("Rows updated: 1"));
        assert!(!text.contains("Carried over"));
        assert!(!text.contains("Interrupted"));
    }

    #[test]
    fn interrupted_sweep_says_so() {
        let summary = SweepSummary {
            remaining: 3,
            checked: 1,
            interrupted: true,
            ..SweepSummary::default()
        };
        let text = sweep_summary(&summary);
        assert!(text.contains("2 still pending"));
        assert!(text.contains("Interrupted"));
    }

    #[test]
    fn empty_log_stats() {
        let text = checkpoint_stats("log.csv", &CheckpointStats::default());
        assert!(text.contains("Rows: 0"));
        assert!(text.contains("No checks recorded"));
        assert!(!text.contains("Results"));
    }
}
