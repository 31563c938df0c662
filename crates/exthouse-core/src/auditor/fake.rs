use super::{AuditTarget, Auditor};
use crate::metrics::{BOOTUP_FILES, INTERACTIVE, LONG_TASKS, MAX_POTENTIAL_FID};
use crate::model::{FileRecord, MetricValue, Metrics, TaskRecord};
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

#[derive(Debug, Clone)]
enum Scripted {
    Ok(Metrics),
    Err(String),
}

/// In-process auditor that replays canned results per (extension, run).
///
/// Runs without a script entry fail. Tracks peak concurrency so callers can
/// assert the fan-out limit.
#[derive(Debug, Default)]
pub struct ScriptedAuditor {
    script: HashMap<(String, u32), Scripted>,
    delay: Option<Duration>,
    calls: AtomicUsize,
    in_flight: AtomicUsize,
    peak_in_flight: AtomicUsize,
}

impl ScriptedAuditor {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    pub fn ok(mut self, extension: &str, run_index: u32, metrics: Metrics) -> Self {
        self.script
            .insert((extension.to_string(), run_index), Scripted::Ok(metrics));
        self
    }

    pub fn fail(mut self, extension: &str, run_index: u32, message: &str) -> Self {
        self.script.insert(
            (extension.to_string(), run_index),
            Scripted::Err(message.to_string()),
        );
        self
    }

    /// Script runs `1..=values.len()` with the given max-potential-fid values.
    pub fn fid_runs(mut self, extension: &str, values: &[f64], extra: &Metrics) -> Self {
        for (i, v) in values.iter().enumerate() {
            let mut m = extra.clone();
            m.insert(MAX_POTENTIAL_FID.into(), MetricValue::Number(*v));
            self = self.ok(extension, i as u32 + 1, m);
        }
        self
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn peak_concurrency(&self) -> usize {
        self.peak_in_flight.load(Ordering::SeqCst)
    }
}

/// Metrics map with the usual audit keys, for scripting tests and demos.
pub fn page_metrics(
    fid: f64,
    interactive: f64,
    long_tasks: &[f64],
    extension_files: usize,
) -> Metrics {
    let mut m = Metrics::new();
    m.insert(MAX_POTENTIAL_FID.into(), MetricValue::Number(fid));
    m.insert(INTERACTIVE.into(), MetricValue::Number(interactive));
    let tasks = long_tasks
        .iter()
        .enumerate()
        .map(|(i, d)| TaskRecord {
            start_time: 1000.0 * (i as f64 + 1.0),
            duration: *d,
        })
        .collect();
    m.insert(LONG_TASKS.into(), MetricValue::Tasks(tasks));
    let files = (0..extension_files)
        .map(|i| FileRecord {
            url: format!("chrome-extension://fixture/script-{}.js", i),
            total: 120.0,
            scripting: 100.0,
            script_parse_compile: 20.0,
        })
        .collect();
    m.insert(BOOTUP_FILES.into(), MetricValue::Files(files));
    m
}

#[async_trait]
impl Auditor for ScriptedAuditor {
    fn name(&self) -> &'static str {
        "scripted"
    }

    async fn audit(&self, _url: &str, target: &AuditTarget) -> anyhow::Result<Metrics> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.peak_in_flight.fetch_max(now, Ordering::SeqCst);

        if let Some(d) = self.delay {
            tokio::time::sleep(d).await;
        }

        let entry = self
            .script
            .get(&(target.extension_name.clone(), target.run_index))
            .cloned();
        self.in_flight.fetch_sub(1, Ordering::SeqCst);

        match entry {
            Some(Scripted::Ok(m)) => Ok(m),
            Some(Scripted::Err(msg)) => Err(anyhow::anyhow!(msg)),
            None => anyhow::bail!(
                "no scripted result for '{}' run {}",
                target.extension_name,
                target.run_index
            ),
        }
    }
}
