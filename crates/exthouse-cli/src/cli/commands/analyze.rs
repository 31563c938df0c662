use super::super::args::AnalyzeArgs;
use super::output::emit;
use super::resolve_config;
use crate::exit_codes::EXIT_SUCCESS;
use anyhow::Context;
use exthouse_core::assemble;
use exthouse_core::storage::load_batch;

pub fn run(args: AnalyzeArgs) -> anyhow::Result<i32> {
    let mut cfg = resolve_config(args.config.as_deref())?;
    let (manifest, store) = load_batch(&args.samples)
        .with_context(|| format!("loading samples from {}", args.samples.display()))?;

    cfg.url = manifest.url;
    cfg.runs = manifest.runs;
    cfg.cache = manifest.cache;
    match args.browser {
        Some(browser) => cfg.browser = browser,
        None => {
            cfg.browser = manifest.browser;
            // Prefixes configured for this analysis still win over recorded ones.
            if cfg.extension_url_prefixes.is_empty() {
                cfg.extension_url_prefixes = manifest.extension_url_prefixes;
            }
        }
    }
    if let Some(metric) = args.ranking_metric {
        cfg.ranking_metric = metric;
    }
    cfg.validate()?;

    tracing::info!(
        samples = store.len(),
        extensions = manifest.extensions.len(),
        browser = %cfg.browser,
        ranking_metric = %cfg.ranking_metric,
        "re-analyzing saved samples"
    );
    let report = assemble(&store, &manifest.extensions, &cfg)?;
    emit(&report, args.format, args.out.as_deref())?;
    Ok(EXIT_SUCCESS)
}
