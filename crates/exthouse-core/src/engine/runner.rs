use crate::auditor::{AuditTarget, Auditor};
use crate::config::{MeasureConfig, Schedule};
use crate::errors::ExthouseError;
use crate::extension::validate_batch;
use crate::model::{Extension, Metrics, Sample};
use crate::report::progress::{ProgressEvent, ProgressSink};
use crate::report::{assemble, BatchReport};
use crate::storage::{save_batch, BatchManifest, SampleStore};
use std::collections::HashSet;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Instant;
use tokio::sync::{OwnedSemaphorePermit, Semaphore};
use tokio::task::{JoinError, JoinSet};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunPolicy {
    pub runs: u32,
    pub concurrency: usize,
    pub schedule: Schedule,
}

impl Default for RunPolicy {
    fn default() -> Self {
        Self {
            runs: 1,
            concurrency: 1,
            schedule: Schedule::Interleaved,
        }
    }
}

impl From<&MeasureConfig> for RunPolicy {
    fn from(cfg: &MeasureConfig) -> Self {
        Self {
            runs: cfg.runs,
            concurrency: cfg.concurrency,
            schedule: cfg.schedule,
        }
    }
}

impl RunPolicy {
    fn validate(&self) -> Result<(), ExthouseError> {
        if self.runs == 0 {
            return Err(ExthouseError::invalid_config("runs must be > 0"));
        }
        if self.concurrency == 0 {
            return Err(ExthouseError::invalid_config("concurrency must be > 0"));
        }
        Ok(())
    }

    /// (extension index, 1-based run index) pairs in issue order.
    fn run_order(&self, extension_count: usize) -> Vec<(usize, u32)> {
        match self.schedule {
            Schedule::Interleaved => (1..=self.runs)
                .flat_map(|run| (0..extension_count).map(move |idx| (idx, run)))
                .collect(),
            Schedule::Grouped => (0..extension_count)
                .flat_map(|idx| (1..=self.runs).map(move |run| (idx, run)))
                .collect(),
        }
    }
}

/// Outcome of one (extension, run) audit, before it becomes a stored sample.
#[derive(Debug)]
struct RunOutcome {
    idx: usize,
    run_index: u32,
    extension: String,
    result: anyhow::Result<Sample>,
}

/// What an audit task hands back. The permit travels with the result so the
/// next audit is only issued once this one has been counted.
type Finished = (usize, u32, anyhow::Result<Metrics>, u64, OwnedSemaphorePermit);

pub struct Runner {
    pub auditor: Arc<dyn Auditor>,
    pub policy: RunPolicy,
    /// Settings recorded with saved samples and passed to each audit.
    pub config: MeasureConfig,
    pub progress: Option<ProgressSink>,
    /// When set, raw samples are written here once all runs have finished.
    pub samples_dir: Option<PathBuf>,
}

impl Runner {
    pub fn new(auditor: Arc<dyn Auditor>, cfg: &MeasureConfig) -> Self {
        Self {
            auditor,
            policy: RunPolicy::from(cfg),
            config: cfg.clone(),
            progress: None,
            samples_dir: None,
        }
    }

    pub fn with_progress(mut self, progress: Option<ProgressSink>) -> Self {
        self.progress = progress;
        self
    }

    pub fn with_samples_dir(mut self, dir: Option<PathBuf>) -> Self {
        self.samples_dir = dir;
        self
    }

    /// Audit every extension `runs` times with at most `concurrency` audits in
    /// flight. Individual failures become failed samples; the batch always
    /// completes. Samples land in the store ordered by extension, then run.
    /// Progress is reported as each audit finishes.
    pub async fn run_batch(&self, extensions: &[Extension]) -> Result<SampleStore, ExthouseError> {
        self.policy.validate()?;
        validate_batch(extensions)?;

        let order = self.policy.run_order(extensions.len());
        let total = order.len();
        tracing::info!(
            url = %self.config.url,
            auditor = self.auditor.name(),
            browser = %self.config.browser,
            cache = %self.config.cache,
            extensions = extensions.len(),
            runs = self.policy.runs,
            concurrency = self.policy.concurrency,
            "starting measurement batch"
        );

        let sem = Arc::new(Semaphore::new(self.policy.concurrency));
        let mut join_set: JoinSet<Finished> = JoinSet::new();
        let mut issued: Vec<(usize, u32)> = Vec::with_capacity(total);
        let mut outcomes: Vec<RunOutcome> = Vec::with_capacity(total);
        let mut seen: HashSet<(usize, u32)> = HashSet::with_capacity(total);

        let mut pending = order.into_iter().peekable();
        while let Some(&(idx, run_index)) = pending.peek() {
            tokio::select! {
                biased;
                Some(joined) = join_set.join_next(), if !join_set.is_empty() => {
                    self.absorb(joined, extensions, &mut outcomes, &mut seen, total);
                }
                permit = sem.clone().acquire_owned() => {
                    let Ok(permit) = permit else {
                        tracing::error!("run semaphore closed; no further audits are issued");
                        break;
                    };
                    let auditor = self.auditor.clone();
                    let url = self.config.url.clone();
                    let target = AuditTarget::for_run(&extensions[idx], run_index)
                        .with_cache(self.config.cache);
                    join_set.spawn(async move {
                        let started = Instant::now();
                        let res = auditor.audit(&url, &target).await;
                        let duration_ms =
                            started.elapsed().as_millis().min(u128::from(u64::MAX)) as u64;
                        (idx, run_index, res, duration_ms, permit)
                    });
                    issued.push((idx, run_index));
                    pending.next();
                }
            }
        }
        while let Some(joined) = join_set.join_next().await {
            self.absorb(joined, extensions, &mut outcomes, &mut seen, total);
        }

        for (idx, run_index) in issued.into_iter().filter(|k| !seen.contains(k)) {
            outcomes.push(RunOutcome {
                idx,
                run_index,
                extension: extensions[idx].name.clone(),
                result: Err(anyhow::anyhow!("audit task aborted")),
            });
            self.report_progress(&outcomes, total);
        }

        let store = Self::collect_samples(outcomes);
        for ext in extensions {
            let failed = store.failed_count(&ext.name);
            if failed > 0 {
                tracing::warn!(
                    extension = %ext.name,
                    failed,
                    ok = store.samples_for(&ext.name).len(),
                    "some runs failed"
                );
            }
        }

        if let Some(dir) = &self.samples_dir {
            let manifest = BatchManifest::new(&self.config, extensions);
            if let Err(e) = save_batch(dir, &manifest, &store) {
                let error = format!("{:#}", e);
                tracing::warn!(dir = %dir.display(), error = %error, "failed to save raw samples");
            }
        }

        Ok(store)
    }

    /// Record one finished task and report progress before its permit is freed.
    fn absorb(
        &self,
        joined: Result<Finished, JoinError>,
        extensions: &[Extension],
        outcomes: &mut Vec<RunOutcome>,
        seen: &mut HashSet<(usize, u32)>,
        total: usize,
    ) {
        let (idx, run_index, res, duration_ms, permit) = match joined {
            Ok(done) => done,
            Err(e) => {
                // Identity is recovered from the issued list once all tasks are joined.
                tracing::warn!(error = %e, "audit task aborted");
                return;
            }
        };
        seen.insert((idx, run_index));
        let name = &extensions[idx].name;
        let result = res.map(|metrics| {
            tracing::debug!(extension = %name, run = run_index, duration_ms, "audit finished");
            Sample::new(name.clone(), run_index, metrics).with_duration_ms(duration_ms)
        });
        outcomes.push(RunOutcome {
            idx,
            run_index,
            extension: name.clone(),
            result,
        });
        self.report_progress(outcomes.as_slice(), total);
        drop(permit);
    }

    /// Report the most recently pushed outcome.
    fn report_progress(&self, outcomes: &[RunOutcome], total: usize) {
        let (Some(sink), Some(last)) = (&self.progress, outcomes.last()) else {
            return;
        };
        sink(ProgressEvent {
            done: outcomes.len(),
            total,
            extension: last.extension.clone(),
            run_index: last.run_index,
            failed: last.result.is_err(),
        });
    }

    /// Turn per-run outcomes into stored samples. Failures are logged and kept
    /// as `failed` placeholders so run counts stay consistent.
    fn collect_samples(mut outcomes: Vec<RunOutcome>) -> SampleStore {
        outcomes.sort_by_key(|o| (o.idx, o.run_index));
        outcomes
            .into_iter()
            .map(|o| match o.result {
                Ok(sample) => sample,
                Err(e) => {
                    let message = format!("{:#}", e);
                    let failure = ExthouseError::AuditFailure {
                        extension: o.extension.clone(),
                        run_index: o.run_index,
                        message: message.clone(),
                    };
                    tracing::warn!(error = %failure, "run failed");
                    Sample::failed(o.extension, o.run_index, message)
                }
            })
            .collect()
    }
}

/// Run the batch and assemble the report.
pub async fn measure(
    runner: &Runner,
    extensions: &[Extension],
    cfg: &MeasureConfig,
) -> Result<(SampleStore, BatchReport), ExthouseError> {
    let store = runner.run_batch(extensions).await?;
    let report = assemble(&store, extensions, cfg)?;
    Ok((store, report))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn interleaved_order_cycles_extensions() {
        let p = RunPolicy {
            runs: 2,
            concurrency: 1,
            schedule: Schedule::Interleaved,
        };
        assert_eq!(p.run_order(3), vec![(0, 1), (1, 1), (2, 1), (0, 2), (1, 2), (2, 2)]);
    }

    #[test]
    fn grouped_order_finishes_each_extension() {
        let p = RunPolicy {
            runs: 2,
            concurrency: 1,
            schedule: Schedule::Grouped,
        };
        assert_eq!(p.run_order(2), vec![(0, 1), (0, 2), (1, 1), (1, 2)]);
    }

    #[test]
    fn zero_runs_or_concurrency_is_invalid() {
        let p = RunPolicy {
            runs: 0,
            ..RunPolicy::default()
        };
        assert!(p.validate().is_err());
        let p = RunPolicy {
            concurrency: 0,
            ..RunPolicy::default()
        };
        assert!(p.validate().is_err());
    }

    #[test]
    fn outcomes_are_stored_in_extension_then_run_order() {
        let ok = |idx, ext: &str, run| RunOutcome {
            idx,
            run_index: run,
            extension: ext.into(),
            result: Ok(Sample::new(ext, run, Default::default())),
        };
        let outcomes = vec![
            ok(1, "B", 2),
            RunOutcome {
                idx: 0,
                run_index: 2,
                extension: "A".into(),
                result: Err(anyhow::anyhow!("boom")),
            },
            ok(1, "B", 1),
            ok(0, "A", 1),
        ];
        let store = Runner::collect_samples(outcomes);
        let seq: Vec<(String, u32, bool)> = store
            .iter()
            .map(|s| (s.extension_name.clone(), s.run_index, s.failed))
            .collect();
        assert_eq!(
            seq,
            vec![
                ("A".into(), 1, false),
                ("A".into(), 2, true),
                ("B".into(), 1, false),
                ("B".into(), 2, false),
            ]
        );
    }
}
