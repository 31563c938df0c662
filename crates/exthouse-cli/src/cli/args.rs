use clap::{Parser, Subcommand, ValueEnum};
use exthouse_core::config::CacheState;
use exthouse_core::extension::Browser;
use exthouse_core::metrics::RankingMetric;
use std::path::PathBuf;

#[derive(Parser)]
#[command(
    name = "exthouse",
    version,
    about = "Measure how much browser extensions slow down a page load"
)]
pub struct Cli {
    #[command(subcommand)]
    pub cmd: Command,
}

#[derive(Subcommand)]
pub enum Command {
    /// Audit a page with and without each extension and report the impact
    Measure(MeasureArgs),
    /// Rebuild the report from samples saved by `measure --save-samples`
    Analyze(AnalyzeArgs),
    Version,
}

#[derive(ValueEnum, Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum OutputFormat {
    #[default]
    Text,
    Json,
}

#[derive(Parser, Debug)]
pub struct MeasureArgs {
    /// Page to audit (overrides `url` in the config)
    #[arg(long)]
    pub url: Option<String>,

    /// Extension package or unpacked directory; repeat for several
    #[arg(long = "ext", value_name = "PATH")]
    pub extensions: Vec<PathBuf>,

    /// Folder scanned (non-recursively) for extension packages
    #[arg(long, conflicts_with = "extensions")]
    pub folder: Option<PathBuf>,

    /// chrome or firefox
    #[arg(long)]
    pub browser: Option<Browser>,

    /// cold, warm or hot browser cache for the measured load
    #[arg(long)]
    pub cache: Option<CacheState>,

    #[arg(long)]
    pub runs: Option<u32>,

    /// Audits in flight at once
    #[arg(long)]
    pub concurrency: Option<usize>,

    /// Config file; `exthouse.yaml` is picked up when present
    #[arg(long)]
    pub config: Option<PathBuf>,

    /// max-potential-fid, interactive or long-tasks
    #[arg(long)]
    pub ranking_metric: Option<RankingMetric>,

    /// Command that audits one page load and prints a Lighthouse JSON report.
    /// Supports {url}, {extension}, {name}, {run} and {cache} placeholders.
    #[arg(long, env = "EXTHOUSE_AUDIT_CMD")]
    pub audit_cmd: String,

    /// Per-audit timeout in seconds
    #[arg(long)]
    pub timeout: Option<u64>,

    #[arg(long, value_enum, default_value_t)]
    pub format: OutputFormat,

    /// Write the report here instead of stdout
    #[arg(long)]
    pub out: Option<PathBuf>,

    /// Keep every raw sample under this directory for `exthouse analyze`
    #[arg(long, value_name = "DIR")]
    pub save_samples: Option<PathBuf>,

    #[arg(long)]
    pub no_progress: bool,
}

#[derive(Parser, Debug)]
pub struct AnalyzeArgs {
    /// Directory written by `measure --save-samples`
    #[arg(long, value_name = "DIR")]
    pub samples: PathBuf,

    #[arg(long)]
    pub config: Option<PathBuf>,

    /// Browser the samples came from; defaults to the one recorded with them
    #[arg(long)]
    pub browser: Option<Browser>,

    #[arg(long)]
    pub ranking_metric: Option<RankingMetric>,

    #[arg(long, value_enum, default_value_t)]
    pub format: OutputFormat,

    #[arg(long)]
    pub out: Option<PathBuf>,
}
