use super::super::args::OutputFormat;
use anyhow::Context;
use exthouse_core::report::console::{render_table, render_tti_chart};
use exthouse_core::report::json::{to_json_string, write_json};
use exthouse_core::BatchReport;
use std::path::Path;

const CHART_WIDTH: usize = 40;

fn render_text(report: &BatchReport) -> String {
    let mut text = render_table(report);
    let chart = render_tti_chart(report, CHART_WIDTH);
    if !chart.is_empty() {
        text.push('\n');
        text.push_str(&chart);
    }
    text
}

pub(crate) fn emit(
    report: &BatchReport,
    format: OutputFormat,
    out: Option<&Path>,
) -> anyhow::Result<()> {
    match (format, out) {
        (OutputFormat::Json, Some(path)) => write_json(report, path)?,
        (OutputFormat::Json, None) => println!("{}", to_json_string(report)?),
        (OutputFormat::Text, Some(path)) => std::fs::write(path, render_text(report))
            .with_context(|| format!("failed to write {}", path.display()))?,
        (OutputFormat::Text, None) => print!("{}", render_text(report)),
    }
    if let Some(path) = out {
        tracing::info!(out = %path.display(), "report written");
    }
    Ok(())
}
