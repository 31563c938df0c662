//! `exthouse.yaml` loading and validation.

use crate::errors::ExthouseError;
use crate::extension::Browser;
use crate::metrics::RankingMetric;
use anyhow::Context;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::Path;
use std::str::FromStr;

pub const SUPPORTED_CONFIG_VERSION: u32 = 1;
pub const DEFAULT_URL: &str = "https://example.com/";

/// `(podr, median)` pair for one log-normal scoring curve.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct CurveConstants {
    /// Point of diminishing returns.
    pub podr: f64,
    pub median: f64,
}

impl CurveConstants {
    pub const fn new(podr: f64, median: f64) -> Self {
        Self { podr, median }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ScoringConfig {
    pub long_tasks: CurveConstants,
    pub fid: CurveConstants,
    pub extra_files: CurveConstants,
}

impl Default for ScoringConfig {
    fn default() -> Self {
        Self {
            long_tasks: CurveConstants::new(50.0, 250.0),
            fid: CurveConstants::new(50.0, 250.0),
            extra_files: CurveConstants::new(1.0, 2.0),
        }
    }
}

/// Order in which (extension, run) pairs are issued to the auditor.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Schedule {
    /// Run 1 of every extension, then run 2, ...
    #[default]
    Interleaved,
    /// All runs of one extension before the next.
    Grouped,
}

/// Browser cache state the page is measured in.
///
/// `warm` and `hot` keep storage between loads and precede the measured load
/// with one or two unmeasured loads. Performing those loads is the audit
/// command's job; exthouse passes the state through.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CacheState {
    #[default]
    Cold,
    Warm,
    Hot,
}

impl CacheState {
    pub fn as_str(self) -> &'static str {
        match self {
            CacheState::Cold => "cold",
            CacheState::Warm => "warm",
            CacheState::Hot => "hot",
        }
    }

    /// Unmeasured page loads before the measured one.
    pub fn warmup_loads(self) -> u32 {
        match self {
            CacheState::Cold => 0,
            CacheState::Warm => 1,
            CacheState::Hot => 2,
        }
    }
}

impl fmt::Display for CacheState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for CacheState {
    type Err = ExthouseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "cold" => Ok(CacheState::Cold),
            "warm" => Ok(CacheState::Warm),
            "hot" => Ok(CacheState::Hot),
            other => Err(ExthouseError::invalid_config(format!(
                "unknown cache state '{}' (expected cold, warm or hot)",
                other
            ))),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct MeasureConfig {
    pub version: u32,
    pub url: String,
    pub browser: Browser,
    pub cache: CacheState,
    pub runs: u32,
    pub concurrency: usize,
    pub ranking_metric: RankingMetric,
    pub schedule: Schedule,
    pub scoring: ScoringConfig,
    /// URL prefixes that mark a bootup resource as extension-owned.
    /// Empty means "use the browser's default".
    pub extension_url_prefixes: Vec<String>,
    pub audit_timeout_secs: u64,
}

impl Default for MeasureConfig {
    fn default() -> Self {
        Self {
            version: SUPPORTED_CONFIG_VERSION,
            url: DEFAULT_URL.to_string(),
            browser: Browser::default(),
            cache: CacheState::default(),
            runs: 1,
            concurrency: 1,
            ranking_metric: RankingMetric::default(),
            schedule: Schedule::default(),
            scoring: ScoringConfig::default(),
            extension_url_prefixes: Vec::new(),
            audit_timeout_secs: 120,
        }
    }
}

impl MeasureConfig {
    /// Prefixes in effect: explicit list, else the browser default.
    pub fn effective_url_prefixes(&self) -> Vec<String> {
        if self.extension_url_prefixes.is_empty() {
            vec![self.browser.extension_url_prefix().to_string()]
        } else {
            self.extension_url_prefixes.clone()
        }
    }

    pub fn validate(&self) -> Result<(), ExthouseError> {
        if self.runs == 0 {
            return Err(ExthouseError::invalid_config("runs must be > 0"));
        }
        if self.concurrency == 0 {
            return Err(ExthouseError::invalid_config("concurrency must be > 0"));
        }
        if self.url.trim().is_empty() {
            return Err(ExthouseError::invalid_config("url must not be empty"));
        }
        for (name, c) in [
            ("long_tasks", self.scoring.long_tasks),
            ("fid", self.scoring.fid),
            ("extra_files", self.scoring.extra_files),
        ] {
            // The log-normal curve needs 0 < podr < median.
            if !(c.podr > 0.0 && c.median > c.podr && c.median.is_finite()) {
                return Err(ExthouseError::invalid_config(format!(
                    "scoring.{}: expected 0 < podr < median, got podr={} median={}",
                    name, c.podr, c.median
                )));
            }
        }
        Ok(())
    }
}

pub fn load_config(path: &Path) -> anyhow::Result<MeasureConfig> {
    let raw = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read config {}", path.display()))?;
    let cfg: MeasureConfig = serde_yaml::from_str(&raw)
        .with_context(|| format!("failed to parse YAML in {}", path.display()))?;
    if cfg.version != SUPPORTED_CONFIG_VERSION {
        return Err(ExthouseError::invalid_config(format!(
            "unsupported config version {} (supported: {})",
            cfg.version, SUPPORTED_CONFIG_VERSION
        ))
        .into());
    }
    cfg.validate()?;
    Ok(cfg)
}
