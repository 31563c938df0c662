//! Impact of an extension's representative sample against the baseline's.

use super::scoring::log_normal_score;
use crate::config::ScoringConfig;
use crate::metrics::{self, LONG_TASK_THRESHOLD_MS, MAX_POTENTIAL_FID};
use crate::model::{ComponentScores, ImpactReport, RepresentativeResult, Sample};

/// Inputs the comparator needs besides the two samples.
#[derive(Debug, Clone)]
pub struct CompareOptions {
    pub scoring: ScoringConfig,
    pub extension_url_prefixes: Vec<String>,
}

impl Default for CompareOptions {
    fn default() -> Self {
        Self {
            scoring: ScoringConfig::default(),
            extension_url_prefixes: vec!["chrome-extension://".to_string()],
        }
    }
}

fn has_metric(sample: &Sample, key: &str) -> bool {
    sample.metrics.contains_key(key)
}

/// Compare `ext` against `baseline`. Pure.
pub fn compare(
    ext: &RepresentativeResult<'_>,
    baseline: &RepresentativeResult<'_>,
    opts: &CompareOptions,
) -> ImpactReport {
    let ext_sample = ext.sample;
    let base_sample = baseline.sample;

    let extension_files: Vec<_> =
        metrics::extension_files(ext_sample, &opts.extension_url_prefixes)
            .into_iter()
            .cloned()
            .collect();
    let extra_file_count = extension_files.len();

    // Long tasks are attributed to the extension only when its files were seen
    // loading; with zero extension files the delta is forced to 0.
    let long_task_delta = if extra_file_count == 0 {
        0.0
    } else {
        metrics::long_task_total(ext_sample) - metrics::long_task_total(base_sample)
    };

    let fid_delta =
        (metrics::max_potential_fid(ext_sample) - metrics::max_potential_fid(base_sample)).max(0.0);

    let scores = ComponentScores {
        long_tasks: metrics::long_tasks(ext_sample)
            .map(|_| log_normal_score(long_task_delta, opts.scoring.long_tasks)),
        fid: (has_metric(ext_sample, MAX_POTENTIAL_FID)
            && has_metric(base_sample, MAX_POTENTIAL_FID))
        .then(|| log_normal_score(fid_delta, opts.scoring.fid)),
        extra_files: metrics::bootup_files(ext_sample)
            .map(|_| log_normal_score(extra_file_count as f64, opts.scoring.extra_files)),
    };

    let new_long_tasks = metrics::long_tasks(ext_sample)
        .unwrap_or_default()
        .iter()
        .filter(|t| t.duration >= LONG_TASK_THRESHOLD_MS)
        .copied()
        .collect();

    let interactive_ms =
        has_metric(ext_sample, metrics::INTERACTIVE).then(|| metrics::interactive(ext_sample));

    ImpactReport {
        extension_name: ext.extension_name.to_string(),
        run_index: ext_sample.run_index,
        long_task_delta,
        fid_delta,
        extra_file_count,
        score: scores.mean(),
        scores,
        new_long_tasks,
        extension_files,
        interactive_ms,
    }
}
