//! Typed access to sample metrics.
//!
//! Every extractor is total: a missing key or a value of the wrong shape maps
//! to the documented default instead of an error.

use crate::errors::ExthouseError;
use crate::model::{FileRecord, MetricValue, Sample, TaskRecord};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

pub const MAX_POTENTIAL_FID: &str = "max-potential-fid";
pub const INTERACTIVE: &str = "interactive";
pub const LONG_TASKS: &str = "long-tasks";
pub const BOOTUP_FILES: &str = "bootup-files";

/// Tasks at or above this duration (ms) count as long tasks.
pub const LONG_TASK_THRESHOLD_MS: f64 = 50.0;

fn number(sample: &Sample, key: &str) -> Option<f64> {
    match sample.metrics.get(key) {
        Some(MetricValue::Number(v)) if v.is_finite() => Some(*v),
        _ => None,
    }
}

/// Max potential first input delay in ms; 0 when absent.
pub fn max_potential_fid(sample: &Sample) -> f64 {
    number(sample, MAX_POTENTIAL_FID).unwrap_or(0.0)
}

/// Time to Interactive in ms; 0 when absent.
pub fn interactive(sample: &Sample) -> f64 {
    number(sample, INTERACTIVE).unwrap_or(0.0)
}

/// Long-task records; `None` when the sample carries no task list.
pub fn long_tasks(sample: &Sample) -> Option<&[TaskRecord]> {
    match sample.metrics.get(LONG_TASKS) {
        Some(MetricValue::Tasks(tasks)) => Some(tasks),
        Some(MetricValue::Files(files)) if files.is_empty() => Some(&[]),
        _ => None,
    }
}

/// Bootup file records; `None` when the sample carries no file list.
pub fn bootup_files(sample: &Sample) -> Option<&[FileRecord]> {
    match sample.metrics.get(BOOTUP_FILES) {
        Some(MetricValue::Files(files)) => Some(files),
        // An empty JSON list deserializes as Tasks.
        Some(MetricValue::Tasks(tasks)) if tasks.is_empty() => Some(&[]),
        _ => None,
    }
}

/// Sum of durations of tasks with `duration >= 50ms`; 0 when absent.
pub fn long_task_total(sample: &Sample) -> f64 {
    long_tasks(sample)
        .unwrap_or_default()
        .iter()
        .filter(|t| t.duration >= LONG_TASK_THRESHOLD_MS)
        .map(|t| t.duration)
        .sum()
}

pub fn is_extension_url(url: &str, prefixes: &[String]) -> bool {
    prefixes.iter().any(|p| url.starts_with(p.as_str()))
}

/// Bootup entries whose URL has an extension-origin prefix.
pub fn extension_files<'a>(sample: &'a Sample, prefixes: &[String]) -> Vec<&'a FileRecord> {
    bootup_files(sample)
        .unwrap_or_default()
        .iter()
        .filter(|f| is_extension_url(&f.url, prefixes))
        .collect()
}

/// Scalar used by the median selector to rank samples.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum RankingMetric {
    #[default]
    MaxPotentialFid,
    Interactive,
    LongTasks,
}

impl RankingMetric {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::MaxPotentialFid => MAX_POTENTIAL_FID,
            Self::Interactive => INTERACTIVE,
            Self::LongTasks => LONG_TASKS,
        }
    }

    pub fn extract(&self, sample: &Sample) -> f64 {
        match self {
            Self::MaxPotentialFid => max_potential_fid(sample),
            Self::Interactive => interactive(sample),
            Self::LongTasks => long_task_total(sample),
        }
    }
}

impl fmt::Display for RankingMetric {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for RankingMetric {
    type Err = ExthouseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            MAX_POTENTIAL_FID | "fid" => Ok(Self::MaxPotentialFid),
            INTERACTIVE | "tti" => Ok(Self::Interactive),
            LONG_TASKS => Ok(Self::LongTasks),
            other => Err(ExthouseError::invalid_config(format!(
                "unknown ranking metric '{}' (expected one of: {}, {}, {})",
                other, MAX_POTENTIAL_FID, INTERACTIVE, LONG_TASKS
            ))),
        }
    }
}
