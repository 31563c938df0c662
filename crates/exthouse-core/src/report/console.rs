use crate::report::progress::{ProgressEvent, ProgressSink};
use crate::report::BatchReport;
use std::fmt::Write as _;
use std::sync::Arc;

/// `[ 3/12] Grammarly run 2 failed`, with the counter padded to the total's width.
#[must_use]
pub fn progress_line(ev: &ProgressEvent) -> String {
    let width = ev.total.to_string().len();
    format!(
        "[{:>w$}/{}] {} run {} {}",
        ev.done,
        ev.total,
        ev.extension,
        ev.run_index,
        if ev.failed { "failed" } else { "done" },
        w = width
    )
}

/// Sink printing one line per finished audit to stderr.
pub fn console_progress_sink() -> ProgressSink {
    Arc::new(|ev: ProgressEvent| eprintln!("{}", progress_line(&ev)))
}

fn fmt_opt(v: Option<f64>, precision: usize) -> String {
    v.map(|x| format!("{:.*}", precision, x))
        .unwrap_or_else(|| "—".into())
}

/// Plain-text results table, one row per extension in report order.
pub fn render_table(report: &BatchReport) -> String {
    let name_width = report
        .results
        .iter()
        .map(|r| r.extension_name.chars().count())
        .chain(std::iter::once("Extension".len()))
        .max()
        .unwrap_or(9);

    let mut out = String::new();
    let _ = writeln!(
        out,
        "{} ({} run(s), ranked by {})",
        report.url, report.runs, report.ranking_metric
    );
    let _ = writeln!(
        out,
        "Baseline: max-potential-fid {:.0} ms, long tasks {:.0} ms, interactive {} ms",
        report.baseline.max_potential_fid,
        report.baseline.long_task_total,
        fmt_opt(report.baseline.interactive_ms, 0)
    );
    let _ = writeln!(out);
    let _ = writeln!(
        out,
        "{:<w$}  {:>5}  {:>16}  {:>14}  {:>16}",
        "Extension",
        "Score",
        "New long tasks",
        "FID change",
        "Scripting files",
        w = name_width
    );
    for r in &report.results {
        let _ = writeln!(
            out,
            "{:<w$}  {:>5}  {:>13.0} ms  {:>11.0} ms  {:>16}",
            r.extension_name,
            fmt_opt(r.score, 2),
            r.long_task_delta,
            r.fid_delta,
            r.extra_file_count,
            w = name_width
        );
    }
    if report.results.is_empty() {
        let _ = writeln!(out, "(no extension produced a valid sample)");
    }
    out
}

/// Horizontal bar chart of Time to Interactive, fastest first. Extensions
/// without an interactive figure are left out.
pub fn render_tti_chart(report: &BatchReport, width: usize) -> String {
    let mut rows: Vec<(&str, f64)> = report
        .results
        .iter()
        .filter_map(|r| Some((r.extension_name.as_str(), r.interactive_ms?)))
        .collect();
    if let Some(tti) = report.baseline.interactive_ms {
        rows.push((report.baseline.name.as_str(), tti));
    }
    if rows.is_empty() {
        return String::new();
    }
    rows.sort_by(|a, b| a.1.total_cmp(&b.1));

    let max = rows.iter().map(|(_, v)| *v).fold(0.0_f64, f64::max);
    let margin = rows.iter().map(|(n, _)| n.chars().count()).max().unwrap_or(0);
    let width = width.max(1);

    let mut out = String::new();
    for (name, value) in &rows {
        let len = if max > 0.0 {
            ((value / max) * width as f64).round() as usize
        } else {
            0
        };
        let _ = writeln!(
            out,
            "{:>m$} │{} {:.0}",
            name,
            "█".repeat(len),
            value,
            m = margin
        );
    }
    let _ = writeln!(out, "{:>m$} ╰{}", "", "─".repeat(width + 1), m = margin);
    let _ = writeln!(out, "{:>m$}  Time to Interactive (ms)", "", m = margin);
    out
}
