//! Lighthouse result (LHR) → sample metrics.

use crate::metrics::{
    BOOTUP_FILES, INTERACTIVE, LONG_TASKS, LONG_TASK_THRESHOLD_MS, MAX_POTENTIAL_FID,
};
use crate::model::{FileRecord, MetricValue, Metrics, TaskRecord};
use anyhow::{bail, Context, Result};
use serde_json::Value;

fn numeric_value(audits: &Value, id: &str) -> Option<f64> {
    audits
        .get(id)?
        .get("numericValue")?
        .as_f64()
        .filter(|v| v.is_finite())
}

fn detail_items<'a>(audits: &'a Value, id: &str) -> Option<&'a Vec<Value>> {
    audits.get(id)?.get("details")?.get("items")?.as_array()
}

fn long_tasks(audits: &Value) -> Option<Vec<TaskRecord>> {
    let items = detail_items(audits, "main-thread-tasks")?;
    Some(
        items
            .iter()
            .filter_map(|item| {
                Some(TaskRecord {
                    start_time: item.get("startTime")?.as_f64()?,
                    duration: item.get("duration")?.as_f64()?,
                })
            })
            .filter(|t| t.duration >= LONG_TASK_THRESHOLD_MS)
            .collect(),
    )
}

fn bootup_files(audits: &Value) -> Option<Vec<FileRecord>> {
    let items = detail_items(audits, "bootup-time")?;
    Some(
        items
            .iter()
            .filter_map(|item| {
                let num = |k: &str| item.get(k).and_then(Value::as_f64).unwrap_or(0.0);
                Some(FileRecord {
                    url: item.get("url")?.as_str()?.to_string(),
                    total: num("total"),
                    scripting: num("scripting"),
                    script_parse_compile: num("scriptParseCompile"),
                })
            })
            .collect(),
    )
}

/// Extract the metrics this tool ranks and compares on. Audits that are
/// missing from the report are left out of the map.
pub fn metrics_from_lhr(report: &Value) -> Result<Metrics> {
    // Programmatic runs wrap the report as `{ "lhr": { ... } }`.
    let lhr = report.get("lhr").unwrap_or(report);

    if let Some(code) = lhr.pointer("/runtimeError/code").and_then(Value::as_str) {
        if code != "NO_ERROR" {
            let msg = lhr
                .pointer("/runtimeError/message")
                .and_then(Value::as_str)
                .unwrap_or("");
            bail!("lighthouse runtime error {}: {}", code, msg);
        }
    }

    let audits = lhr
        .get("audits")
        .filter(|a| a.is_object())
        .context("not a Lighthouse result: missing 'audits'")?;

    let mut metrics = Metrics::new();
    if let Some(tti) = numeric_value(audits, "interactive") {
        metrics.insert(INTERACTIVE.into(), MetricValue::Number(tti.round()));
    }
    if let Some(fid) = numeric_value(audits, "max-potential-fid") {
        metrics.insert(MAX_POTENTIAL_FID.into(), MetricValue::Number(fid));
    }
    if let Some(tasks) = long_tasks(audits) {
        metrics.insert(LONG_TASKS.into(), MetricValue::Tasks(tasks));
    }
    if let Some(files) = bootup_files(audits) {
        metrics.insert(BOOTUP_FILES.into(), MetricValue::Files(files));
    }
    Ok(metrics)
}

/// Parse LHR JSON text.
pub fn metrics_from_lhr_str(raw: &str) -> Result<Metrics> {
    let v: Value = serde_json::from_str(raw).context("auditor output is not valid JSON")?;
    metrics_from_lhr(&v)
}
