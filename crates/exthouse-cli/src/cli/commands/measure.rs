use super::super::args::MeasureArgs;
use super::output::emit;
use super::resolve_config;
use crate::exit_codes::EXIT_SUCCESS;
use exthouse_core::auditor::CommandAuditor;
use exthouse_core::extension::{discover_extensions, load_extensions};
use exthouse_core::report::console::console_progress_sink;
use exthouse_core::{measure, Extension, ExthouseError, MeasureConfig, Runner};
use std::sync::Arc;
use std::time::Duration;

fn apply_overrides(cfg: &mut MeasureConfig, args: &MeasureArgs) {
    if let Some(url) = &args.url {
        cfg.url = url.clone();
    }
    if let Some(browser) = args.browser {
        cfg.browser = browser;
    }
    if let Some(cache) = args.cache {
        cfg.cache = cache;
    }
    if let Some(runs) = args.runs {
        cfg.runs = runs;
    }
    if let Some(concurrency) = args.concurrency {
        cfg.concurrency = concurrency;
    }
    if let Some(metric) = args.ranking_metric {
        cfg.ranking_metric = metric;
    }
    if let Some(secs) = args.timeout {
        cfg.audit_timeout_secs = secs;
    }
}

fn select_extensions(
    args: &MeasureArgs,
    cfg: &MeasureConfig,
) -> Result<Vec<Extension>, ExthouseError> {
    match &args.folder {
        Some(folder) => discover_extensions(folder, cfg.browser),
        None if args.extensions.is_empty() => Err(ExthouseError::invalid_config(
            "no extensions given; pass --ext or --folder",
        )),
        None => load_extensions(&args.extensions, cfg.browser),
    }
}

pub async fn run(args: MeasureArgs) -> anyhow::Result<i32> {
    let mut cfg = resolve_config(args.config.as_deref())?;
    apply_overrides(&mut cfg, &args);
    cfg.validate()?;

    let extensions = select_extensions(&args, &cfg)?;
    let auditor = CommandAuditor::from_command_line(
        &args.audit_cmd,
        Duration::from_secs(cfg.audit_timeout_secs),
    )
    .map_err(|e| ExthouseError::invalid_config(format!("--audit-cmd: {e}")))?;

    tracing::info!(
        url = %cfg.url,
        browser = %cfg.browser,
        cache = %cfg.cache,
        extensions = extensions.len() - 1,
        runs = cfg.runs,
        "measuring extension impact"
    );

    let progress = (!args.no_progress).then(console_progress_sink);
    let runner = Runner::new(Arc::new(auditor), &cfg)
        .with_progress(progress)
        .with_samples_dir(args.save_samples.clone());

    let (_, report) = measure(&runner, &extensions, &cfg).await?;
    emit(&report, args.format, args.out.as_deref())?;
    Ok(EXIT_SUCCESS)
}
