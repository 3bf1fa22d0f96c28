//! Statistics display
//!
//! This module renders store statistics and crawl run reports for the
//! terminal.

use crate::crawler::RunReport;
use crate::storage::StoreStats;
use std::fmt::Write;

/// Formats store statistics as a human-readable block
pub fn format_statistics(stats: &StoreStats) -> String {
    let mut out = String::new();

    let _ = writeln!(out, "=== Corpus Statistics ===\n");
    let _ = writeln!(out, "Overview:");
    let _ = writeln!(out, "  Total pages: {}", stats.total_pages);
    let _ = writeln!(out, "  Unique domains: {}", stats.unique_domains);
    let _ = writeln!(
        out,
        "  Total content: {} characters",
        stats.total_content_length
    );
    let _ = writeln!(
        out,
        "  Average content: {:.0} characters",
        stats.avg_content_length
    );

    if !stats.pages_by_source.is_empty() {
        let _ = writeln!(out, "\nPages by Extractor:");
        for (source, count) in sorted_by_count(&stats.pages_by_source) {
            let _ = writeln!(
                out,
                "  {}: {} ({:.1}%)",
                source,
                count,
                percentage(count, stats.total_pages)
            );
        }
    }

    if !stats.pages_by_crawler.is_empty() {
        let _ = writeln!(out, "\nPages by Source:");
        for (crawler, count) in sorted_by_count(&stats.pages_by_crawler) {
            let _ = writeln!(out, "  {}: {}", crawler, count);
        }
    }

    out
}

/// Prints statistics to stdout in a formatted manner
pub fn print_statistics(stats: &StoreStats) {
    print!("{}", format_statistics(stats));
}

/// Formats the report of one finished crawl instance
pub fn format_run_report(report: &RunReport) -> String {
    let mut out = String::new();

    let _ = writeln!(out, "=== Crawl '{}': {} ===", report.source, report.state);
    let _ = writeln!(out, "  Pages collected: {}", report.pages_collected);
    let _ = writeln!(out, "  Pages processed: {}", report.pages_processed);
    let _ = writeln!(out, "  Failed: {}", report.pages_failed);
    let _ = writeln!(out, "  Too short: {}", report.pages_rejected);
    let _ = writeln!(out, "  Disallowed by robots.txt: {}", report.pages_disallowed);
    let _ = writeln!(
        out,
        "  Frontier: {} discovered, {} visited, {} skipped, {} still queued",
        report.frontier.total_discovered,
        report.frontier.total_visited,
        report.frontier.total_skipped,
        report.queue_remaining
    );
    let _ = writeln!(out, "  Elapsed: {:.1}s", report.elapsed.as_secs_f64());

    out
}

pub fn print_run_report(report: &RunReport) {
    print!("{}", format_run_report(report));
}

fn sorted_by_count(counts: &std::collections::BTreeMap<String, u64>) -> Vec<(&str, u64)> {
    let mut sorted: Vec<_> = counts.iter().map(|(k, v)| (k.as_str(), *v)).collect();
    sorted.sort_by(|a, b| b.1.cmp(&a.1).then(a.0.cmp(b.0)));
    sorted
}

fn percentage(count: u64, total: u64) -> f64 {
    if total > 0 {
        (count as f64 / total as f64) * 100.0
    } else {
        0.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::frontier::FrontierStats;
    use crate::state::RunState;
    use std::collections::BTreeMap;
    use std::time::Duration;

    #[test]
    fn test_format_statistics() {
        let stats = StoreStats {
            total_pages: 4,
            unique_domains: 2,
            total_content_length: 4000,
            avg_content_length: 1000.0,
            pages_by_source: BTreeMap::from([
                ("habr".to_string(), 1),
                ("wikipedia".to_string(), 3),
            ]),
            pages_by_crawler: BTreeMap::from([("wiki".to_string(), 4)]),
        };

        let text = format_statistics(&stats);
        assert!(text.contains("Total pages: 4"));
        assert!(text.contains("wikipedia: 3 (75.0%)"));

        let wiki = text.find("wikipedia: 3").unwrap();
        let habr = text.find("habr: 1").unwrap();
        assert!(wiki < habr);
    }

    #[test]
    fn test_format_empty_statistics() {
        let text = format_statistics(&StoreStats::default());
        assert!(text.contains("Total pages: 0"));
        assert!(!text.contains("Pages by Extractor"));
    }

    #[test]
    fn test_format_run_report() {
        let report = RunReport {
            source: "habr".to_string(),
            state: RunState::BudgetReached,
            pages_collected: 2,
            pages_processed: 3,
            pages_failed: 0,
            pages_rejected: 1,
            pages_disallowed: 0,
            frontier: FrontierStats::default(),
            queue_remaining: 7,
            elapsed: Duration::from_millis(1500),
        };

        let text = format_run_report(&report);
        assert!(text.starts_with("=== Crawl 'habr': budget_reached ==="));
        assert!(text.contains("7 still queued"));
        assert!(text.contains("Elapsed: 1.5s"));
    }
}
