use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::PathBuf;

/// Display name of the no-extension baseline entry.
pub const BASELINE_NAME: &str = "Default (no extension)";

/// An extension under test. Exactly one entry per batch is the baseline.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Extension {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source_path: Option<PathBuf>,
    #[serde(default)]
    pub is_baseline: bool,
}

impl Extension {
    pub fn new(name: impl Into<String>, source_path: impl Into<PathBuf>) -> Self {
        Self {
            name: name.into(),
            source_path: Some(source_path.into()),
            is_baseline: false,
        }
    }

    pub fn baseline() -> Self {
        Self {
            name: BASELINE_NAME.to_string(),
            source_path: None,
            is_baseline: true,
        }
    }
}

/// A main-thread task as reported by the audit tool.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct TaskRecord {
    pub start_time: f64,
    pub duration: f64,
}

/// Per-script CPU cost from the bootup-time audit.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct FileRecord {
    pub url: String,
    #[serde(default)]
    pub total: f64,
    #[serde(default)]
    pub scripting: f64,
    #[serde(default)]
    pub script_parse_compile: f64,
}

/// A single named metric value.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(untagged)]
pub enum MetricValue {
    Number(f64),
    Tasks(Vec<TaskRecord>),
    Files(Vec<FileRecord>),
}

pub type Metrics = BTreeMap<String, MetricValue>;

/// One raw audit result for one (extension, run) pair.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Sample {
    pub extension_name: String,
    /// 1-based.
    pub run_index: u32,
    #[serde(default)]
    pub metrics: Metrics,
    #[serde(default)]
    pub failed: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub duration_ms: Option<u64>,
}

impl Sample {
    pub fn new(extension_name: impl Into<String>, run_index: u32, metrics: Metrics) -> Self {
        Self {
            extension_name: extension_name.into(),
            run_index,
            metrics,
            failed: false,
            error: None,
            duration_ms: None,
        }
    }

    /// Placeholder for a run whose audit raised an error.
    pub fn failed(
        extension_name: impl Into<String>,
        run_index: u32,
        error: impl Into<String>,
    ) -> Self {
        Self {
            extension_name: extension_name.into(),
            run_index,
            metrics: Metrics::new(),
            failed: true,
            error: Some(error.into()),
            duration_ms: None,
        }
    }

    pub fn with_duration_ms(mut self, duration_ms: u64) -> Self {
        self.duration_ms = Some(duration_ms);
        self
    }
}

/// The sample chosen as typical for one extension. Borrows from the store.
#[derive(Debug, Clone, Copy)]
pub struct RepresentativeResult<'a> {
    pub extension_name: &'a str,
    pub sample: &'a Sample,
    pub ranking_value: f64,
    pub sample_count: usize,
}

/// Component scores, each absent when its underlying metric was unavailable.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq)]
pub struct ComponentScores {
    pub long_tasks: Option<f64>,
    pub fid: Option<f64>,
    pub extra_files: Option<f64>,
}

impl ComponentScores {
    /// Arithmetic mean over the available components.
    pub fn mean(&self) -> Option<f64> {
        let available: Vec<f64> = [self.long_tasks, self.fid, self.extra_files]
            .into_iter()
            .flatten()
            .collect();
        if available.is_empty() {
            return None;
        }
        Some(available.iter().sum::<f64>() / available.len() as f64)
    }
}

/// Impact of one extension relative to the baseline.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ImpactReport {
    pub extension_name: String,
    /// Representative run index the figures were taken from.
    pub run_index: u32,
    pub long_task_delta: f64,
    pub fid_delta: f64,
    pub extra_file_count: usize,
    pub score: Option<f64>,
    pub scores: ComponentScores,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub new_long_tasks: Vec<TaskRecord>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub extension_files: Vec<FileRecord>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub interactive_ms: Option<f64>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn metric_values_parse_by_shape() {
        let raw = serde_json::json!({
            "max-potential-fid": 120.5,
            "long-tasks": [{"startTime": 1200.0, "duration": 350.0}],
            "bootup-files": [{
                "url": "chrome-extension://abc/h1.js",
                "total": 1010.9,
                "scripting": 735.5,
                "scriptParseCompile": 274.3
            }]
        });
        let metrics: Metrics = serde_json::from_value(raw).unwrap();
        assert_eq!(metrics["max-potential-fid"], MetricValue::Number(120.5));
        assert!(matches!(&metrics["long-tasks"], MetricValue::Tasks(t) if t.len() == 1));
        match &metrics["bootup-files"] {
            MetricValue::Files(f) => assert_eq!(f[0].script_parse_compile, 274.3),
            other => panic!("expected files, got {:?}", other),
        }
    }

    #[test]
    fn component_mean_skips_missing() {
        let scores = ComponentScores {
            long_tasks: Some(1.0),
            fid: None,
            extra_files: Some(0.5),
        };
        assert_eq!(scores.mean(), Some(0.75));
        assert_eq!(ComponentScores::default().mean(), None);
    }

    #[test]
    fn failed_sample_keeps_error() {
        let s = Sample::failed("Honey", 3, "browser crashed");
        assert!(s.failed);
        assert!(s.metrics.is_empty());
        assert_eq!(s.error.as_deref(), Some("browser crashed"));
    }
}
