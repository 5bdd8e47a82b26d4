//! Console output for run plans and summaries.

use owo_colors::OwoColorize;
use thememiner_rs::core::types::RecordId;
use thememiner_rs::{RunSummary, WorkPlan};

/// Collapse ascending identifiers into `1-3, 7, 9-10`.
pub fn format_id_ranges(ids: &[RecordId]) -> String {
    let mut parts = Vec::new();
    let mut iter = ids.iter().map(|id| id.get()).peekable();
    while let Some(start) = iter.next() {
        let mut end = start;
        while let Some(next) = end.checked_add(1) {
            if iter.peek() != Some(&next) {
                break;
            }
            end = next;
            iter.next();
        }
        if start == end {
            parts.push(start.to_string());
        } else {
            parts.push(format!("{start}-{end}"));
        }
    }
    parts.join(", ")
}

/// Print what a dry run would do.
pub fn print_plan(stage: &str, plan: &WorkPlan) {
    println!(
        "{} {} {}",
        "Dry run:".bright_blue().bold(),
        stage.cyan(),
        plan.range
    );
    println!("   Planned:  {}", plan.planned());
    println!("   Skipped:  {} already completed", plan.skipped);
    println!("   Pending:  {}", plan.pending.len().to_string().bold());
    if !plan.pending.is_empty() {
        println!("   Ids:      {}", format_id_ranges(&plan.pending).dimmed());
    }
    println!("{}", "No provider calls were made and nothing was written.".dimmed());
}

/// Print the end-of-run summary.
pub fn print_summary(stage: &str, summary: &RunSummary) {
    let headline = if summary.is_clean() {
        format!("{} finished", stage).bright_green().bold().to_string()
    } else {
        format!("{} finished with failures", stage)
            .yellow()
            .bold()
            .to_string()
    };
    println!("{headline}");
    println!(
        "   Completed: {}   Failed: {}   Skipped: {}",
        summary.completed.to_string().green(),
        summary.failed.to_string().red(),
        summary.skipped
    );
    for failure in &summary.failures {
        println!(
            "   {} {} ({}): {}",
            "✗".red(),
            failure.id,
            failure.kind,
            failure.message.dimmed()
        );
    }
    if summary.failed > 0 {
        println!(
            "{}",
            "Failed records stay pending; re-run the same range to retry them.".dimmed()
        );
    }
    if let Some(path) = &summary.rollup {
        println!("   Rollup:    {}", path.display().to_string().cyan());
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn id_ranges_are_collapsed() {
        let ids: Vec<RecordId> = [1, 2, 3, 7, 9, 10].into_iter().map(RecordId).collect();
        assert_eq!(format_id_ranges(&ids), "1-3, 7, 9-10");
        assert_eq!(format_id_ranges(&[]), "");
        assert_eq!(format_id_ranges(&[RecordId(4)]), "4");
    }

    #[test]
    fn id_ranges_reach_the_top_of_the_id_space() {
        let ids = [RecordId(u64::MAX - 1), RecordId(u64::MAX)];
        assert_eq!(
            format_id_ranges(&ids),
            format!("{}-{}", u64::MAX - 1, u64::MAX)
        );
    }
}
