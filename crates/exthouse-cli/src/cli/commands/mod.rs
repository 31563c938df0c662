use super::args::*;

pub mod analyze;
pub mod measure;
pub(crate) mod output;

use crate::exit_codes::EXIT_SUCCESS;
use exthouse_core::{load_config, MeasureConfig};
use std::path::{Path, PathBuf};

pub const DEFAULT_CONFIG_FILE: &str = "exthouse.yaml";

pub async fn dispatch(cli: Cli) -> anyhow::Result<i32> {
    match cli.cmd {
        Command::Measure(args) => measure::run(args).await,
        Command::Analyze(args) => analyze::run(args),
        Command::Version => {
            println!("{}", env!("CARGO_PKG_VERSION"));
            Ok(EXIT_SUCCESS)
        }
    }
}

/// Explicit `--config` must exist; otherwise `exthouse.yaml` in the working
/// directory is used when present, else built-in defaults.
pub(crate) fn resolve_config(explicit: Option<&Path>) -> anyhow::Result<MeasureConfig> {
    let path: Option<PathBuf> = match explicit {
        Some(p) => Some(p.to_path_buf()),
        None => {
            let default = PathBuf::from(DEFAULT_CONFIG_FILE);
            default.is_file().then_some(default)
        }
    };
    match path {
        Some(p) => {
            tracing::debug!(config = %p.display(), "loading config");
            load_config(&p)
        }
        None => Ok(MeasureConfig::default()),
    }
}
