use crate::report::BatchReport;
use anyhow::Context;
use std::path::Path;

pub fn to_json_string(report: &BatchReport) -> anyhow::Result<String> {
    Ok(serde_json::to_string_pretty(report)?)
}

pub fn write_json(report: &BatchReport, out: &Path) -> anyhow::Result<()> {
    let body = to_json_string(report)?;
    std::fs::write(out, body).with_context(|| format!("failed to write {}", out.display()))?;
    Ok(())
}
