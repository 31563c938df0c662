pub mod console;
pub mod json;
pub mod progress;

use crate::config::{CacheState, MeasureConfig};
use crate::engine::{compare, select_representative, CompareOptions};
use crate::errors::ExthouseError;
use crate::extension::validate_batch;
use crate::metrics::{self, RankingMetric};
use crate::model::{Extension, ImpactReport, RepresentativeResult};
use crate::storage::SampleStore;
use serde::{Deserialize, Serialize};

pub const REPORT_SCHEMA_VERSION: &str = "exthouse-report-v1";

/// Figures of the baseline representative, kept next to the results so a
/// reader can see what every delta was measured against.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct BaselineSummary {
    pub name: String,
    pub run_index: u32,
    pub sample_count: usize,
    pub max_potential_fid: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub interactive_ms: Option<f64>,
    pub long_task_total: f64,
}

impl BaselineSummary {
    fn from_representative(rep: &RepresentativeResult<'_>) -> Self {
        let s = rep.sample;
        Self {
            name: rep.extension_name.to_string(),
            run_index: s.run_index,
            sample_count: rep.sample_count,
            max_potential_fid: metrics::max_potential_fid(s),
            interactive_ms: s
                .metrics
                .contains_key(metrics::INTERACTIVE)
                .then(|| metrics::interactive(s)),
            long_task_total: metrics::long_task_total(s),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct BatchReport {
    pub schema_version: String,
    pub generated_at: String,
    pub url: String,
    pub runs: u32,
    #[serde(default)]
    pub cache: CacheState,
    pub ranking_metric: RankingMetric,
    pub baseline: BaselineSummary,
    pub results: Vec<ImpactReport>,
}

fn baseline_of(extensions: &[Extension]) -> Result<&Extension, ExthouseError> {
    extensions
        .iter()
        .find(|e| e.is_baseline)
        .ok_or_else(|| ExthouseError::invalid_config("batch has no baseline entry"))
}

fn baseline_representative<'a>(
    store: &'a SampleStore,
    baseline: &Extension,
    metric: RankingMetric,
) -> Result<RepresentativeResult<'a>, ExthouseError> {
    let samples = store.samples_for(&baseline.name);
    select_representative(&baseline.name, &samples, metric).map_err(|_| {
        ExthouseError::MissingBaseline(format!(
            "no valid samples for '{}' ({} failed)",
            baseline.name,
            store.failed_count(&baseline.name)
        ))
    })
}

/// Compare every extension's representative against the baseline's.
///
/// Output follows `extensions` order and never contains the baseline.
/// Extensions without a single valid sample are logged and left out.
pub fn impact_reports(
    store: &SampleStore,
    extensions: &[Extension],
    base_rep: &RepresentativeResult<'_>,
    metric: RankingMetric,
    opts: &CompareOptions,
) -> Vec<ImpactReport> {
    let mut reports = Vec::with_capacity(extensions.len().saturating_sub(1));
    for ext in extensions.iter().filter(|e| !e.is_baseline) {
        let samples = store.samples_for(&ext.name);
        let rep = match select_representative(&ext.name, &samples, metric) {
            Ok(rep) => rep,
            Err(e) => {
                tracing::warn!(error = %e, "extension excluded from report");
                continue;
            }
        };
        tracing::debug!(
            extension = %ext.name,
            run = rep.sample.run_index,
            ranking_value = rep.ranking_value,
            samples = rep.sample_count,
            "representative selected"
        );
        reports.push(compare(&rep, base_rep, opts));
    }
    reports
}

/// Build the final report for a finished batch.
pub fn assemble(
    store: &SampleStore,
    extensions: &[Extension],
    cfg: &MeasureConfig,
) -> Result<BatchReport, ExthouseError> {
    validate_batch(extensions)?;
    let metric = cfg.ranking_metric;
    let opts = CompareOptions {
        scoring: cfg.scoring,
        extension_url_prefixes: cfg.effective_url_prefixes(),
    };

    let baseline = baseline_of(extensions)?;
    let base_rep = baseline_representative(store, baseline, metric)?;
    let results = impact_reports(store, extensions, &base_rep, metric, &opts);

    tracing::info!(
        extensions = extensions.len() - 1,
        reported = results.len(),
        "report assembled"
    );

    Ok(BatchReport {
        schema_version: REPORT_SCHEMA_VERSION.to_string(),
        generated_at: chrono::Utc::now().to_rfc3339(),
        url: cfg.url.clone(),
        runs: cfg.runs,
        cache: cfg.cache,
        ranking_metric: metric,
        baseline: BaselineSummary::from_representative(&base_rep),
        results,
    })
}
