use std::io::Write;

use crate::{
    batch::{BatchOutcome, RunReport, TraceSummary},
    stats::{PageFrequency, Summary},
};

/// Formats an integer with `,` between groups of three digits.
pub fn thousands(n: u64) -> String {
    let digits = n.to_string();
    let mut out = String::with_capacity(digits.len() + digits.len() / 3);
    for (idx, ch) in digits.chars().enumerate() {
        if idx > 0 && (digits.len() - idx) % 3 == 0 {
            out.push(',');
        }
        out.push(ch);
    }
    out
}

fn page_label(page: &PageFrequency) -> String {
    format!("0x{:08X}", page.vpn.0)
}

pub fn write_trace_header<W: Write>(w: &mut W, trace: &TraceSummary) -> std::io::Result<()> {
    writeln!(w, "# Trace `{}`\n", trace.name)?;
    write_metrics(
        w,
        "## Input",
        &[
            ("Lines", thousands(trace.lines as u64)),
            ("References", thousands(trace.references as u64)),
        ],
    )?;
    writeln!(w)
}

pub fn write_run_report<W: Write>(w: &mut W, run: &RunReport, top_shown: usize) -> std::io::Result<()> {
    let stats = &run.stats;
    let with_share = |count: u64, share: f64| format!("{} ({:.2}%)", thousands(count), share);

    let mut rows = vec![
        ("Memory accesses", thousands(stats.accesses)),
        ("Page hits", with_share(stats.hits, stats.hit_rate)),
        ("Page faults", with_share(stats.faults, stats.fault_rate)),
        ("Replacements", thousands(stats.evictions)),
        ("Disk writes", thousands(stats.disk_writes)),
        ("EAT", format!("{:.2} ns", stats.eat_ns)),
        ("Elapsed", format!("{:.2} s", stats.elapsed.as_secs_f64())),
    ];
    if stats.reads + stats.writes > 0 {
        rows.push(("Reads", with_share(stats.reads, stats.read_share())));
        rows.push(("Writes", with_share(stats.writes, stats.write_share())));
    }
    let title = format!(
        "## `{}` with {} frames ({})",
        stats.policy, stats.frame_count, run.trace
    );
    write_metrics(w, &title, &rows)?;
    writeln!(w)?;

    if !stats.top_pages.is_empty() {
        writeln!(w, "### Top {} pages", top_shown.min(stats.top_pages.len()))?;
        write_page_rows(
            w,
            stats
                .top_pages
                .iter()
                .take(top_shown)
                .map(|page| (page, stats.page_share(page))),
        )?;
        writeln!(w)?;
    }
    Ok(())
}

pub fn write_comparison<W: Write>(w: &mut W, runs: &[RunReport]) -> std::io::Result<()> {
    writeln!(w, "## Comparison")?;
    writeln!(
        w,
        "| {:<15} | {:>8} | {:>6} | {:>12} | {:>10} | {:>12} | {:>12} | {:>11} | {:>9} | {:>15} | {:>10} |",
        "Trace",
        "Frames",
        "Policy",
        "Accesses",
        "Hits",
        "Page faults",
        "Replacements",
        "Disk writes",
        "Hit rate",
        "EAT (ns)",
        "Time (s)"
    )?;
    writeln!(
        w,
        "| {:-<15} | {:->8} | {:->6} | {:->12} | {:->10} | {:->12} | {:->12} | {:->11} | {:->9} | {:->15} | {:->10} |",
        "-", "-", "-", "-", "-", "-", "-", "-", "-", "-", "-"
    )?;
    for run in runs {
        let stats = &run.stats;
        let trace: String = run.trace.chars().take(15).collect();
        writeln!(
            w,
            "| {:<15} | {:>8} | {:>6} | {:>12} | {:>10} | {:>12} | {:>12} | {:>11} | {:>8.2}% | {:>15.2} | {:>10.2} |",
            trace,
            stats.frame_count,
            stats.policy.name(),
            thousands(stats.accesses),
            thousands(stats.hits),
            thousands(stats.faults),
            thousands(stats.evictions),
            thousands(stats.disk_writes),
            stats.hit_rate,
            stats.eat_ns,
            stats.elapsed.as_secs_f64()
        )?;
    }
    writeln!(w)
}

pub fn write_combined_pages<W: Write>(w: &mut W, summary: &Summary) -> std::io::Result<()> {
    writeln!(w, "## Most accessed pages (all runs)")?;
    write_page_rows(
        w,
        summary
            .top_pages
            .iter()
            .map(|page| (page, summary.page_share(page))),
    )?;
    writeln!(w)
}

pub fn write_policy_comparison<W: Write>(w: &mut W, summary: &Summary) -> std::io::Result<()> {
    writeln!(w, "## Policy averages")?;
    writeln!(
        w,
        "| {:<6} | {:>4} | {:>12} | {:>15} | {:>15} | {:>12} | {:>10} |",
        "Policy", "Runs", "Hit rate", "Page faults", "EAT (ns)", "Disk writes", "Time (s)"
    )?;
    writeln!(
        w,
        "| {:-<6} | {:->4} | {:->12} | {:->15} | {:->15} | {:->12} | {:->10} |",
        "-", "-", "-", "-", "-", "-", "-"
    )?;
    for avg in &summary.policies {
        writeln!(
            w,
            "| {:<6} | {:>4} | {:>11.2}% | {:>15.2} | {:>15.2} | {:>12.2} | {:>10.2} |",
            avg.policy.name(),
            avg.runs,
            avg.hit_rate,
            avg.faults,
            avg.eat_ns,
            avg.disk_writes,
            avg.elapsed_secs
        )?;
    }
    writeln!(w)
}

pub fn write_final_report<W: Write>(
    w: &mut W,
    outcome: &BatchOutcome,
    top_shown: usize,
) -> std::io::Result<()> {
    if outcome.runs.is_empty() {
        return writeln!(w, "No results to show. Check the input traces.");
    }

    for trace in &outcome.traces {
        write_trace_header(w, trace)?;
    }
    for run in &outcome.runs {
        write_run_report(w, run, top_shown)?;
    }

    let summary = outcome.summary();
    write_comparison(w, &outcome.runs)?;
    write_combined_pages(w, &summary)?;
    write_policy_comparison(w, &summary)
}

fn write_page_rows<'a, W: Write>(
    w: &mut W,
    pages: impl Iterator<Item = (&'a PageFrequency, f64)>,
) -> std::io::Result<()> {
    writeln!(w, "| {:<12} | {:>12} | {:>10} |", "Page", "Accesses", "Share")?;
    writeln!(w, "| {:-<12} | {:->12} | {:->10} |", "-", "-", "-")?;
    for (page, share) in pages {
        writeln!(
            w,
            "| {:<12} | {:>12} | {:>9.2}% |",
            page_label(page),
            thousands(page.count),
            share
        )?;
    }
    Ok(())
}

const METRIC_WIDTH: usize = 20;

/// Two-column `Metric | Value` table under `title`.
fn write_metrics<W: Write>(w: &mut W, title: &str, rows: &[(&str, String)]) -> std::io::Result<()> {
    writeln!(w, "{title}")?;
    writeln!(
        w,
        "| {:<width$} | {:<width$} |",
        "Metric",
        "Value",
        width = METRIC_WIDTH
    )?;
    writeln!(w, "| {:-<width$} | {:-<width$} |", "", "", width = METRIC_WIDTH)?;
    for (label, value) in rows {
        writeln!(w, "| {:<width$} | {:<width$} |", label, value, width = METRIC_WIDTH)?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use super::*;
    use crate::{
        paging::{PolicyKind, Vpn},
        stats::RunStatistics,
    };

    fn sample_run() -> RunReport {
        RunReport {
            trace: "sample.trace".to_string(),
            stats: RunStatistics {
                policy: PolicyKind::Lru,
                frame_count: 10,
                accesses: 1_234_567,
                hits: 1_000_000,
                faults: 234_567,
                evictions: 234_557,
                disk_writes: 42,
                reads: 1_000_000,
                writes: 234_567,
                hit_rate: 81.0,
                fault_rate: 19.0,
                eat_ns: 1_900_100.0,
                elapsed: Duration::from_millis(1_250),
                top_pages: vec![PageFrequency {
                    vpn: Vpn(0x7fff2),
                    count: 500,
                }],
            },
        }
    }

    fn render(f: impl FnOnce(&mut Vec<u8>) -> std::io::Result<()>) -> String {
        let mut buf = Vec::new();
        f(&mut buf).unwrap();
        String::from_utf8(buf).unwrap()
    }

    #[test]
    fn thousands_groups_digits() {
        assert_eq!(thousands(0), "0");
        assert_eq!(thousands(999), "999");
        assert_eq!(thousands(1_000), "1,000");
        assert_eq!(thousands(1_234_567), "1,234,567");
    }

    #[test]
    fn run_report_lists_metrics_and_pages() {
        let out = render(|w| write_run_report(w, &sample_run(), 10));
        assert!(out.contains("## `LRU` with 10 frames (sample.trace)"));
        assert!(out.contains("| Page faults          | 234,567 (19.00%)"));
        assert!(out.contains("| EAT                  | 1900100.00 ns"));
        assert!(out.contains("0x0007FFF2"));
        assert!(out.contains("### Top 1 pages"));
    }

    #[test]
    fn empty_outcome_prints_no_results() {
        let out = render(|w| write_final_report(w, &BatchOutcome::default(), 10));
        assert_eq!(out, "No results to show. Check the input traces.\n");
    }

    #[test]
    fn final_report_includes_aggregates() {
        let outcome = BatchOutcome {
            traces: vec![TraceSummary {
                name: "sample.trace".to_string(),
                lines: 1_234_600,
                references: 1_234_567,
            }],
            runs: vec![sample_run()],
            failures: vec![],
        };
        let out = render(|w| write_final_report(w, &outcome, 10));
        assert!(out.contains("# Trace `sample.trace`"));
        assert!(out.contains("## Comparison"));
        assert!(out.contains("## Most accessed pages (all runs)"));
        assert!(out.contains("## Policy averages"));
        assert!(out.contains("| LRU    |    1 |"));
    }
}
