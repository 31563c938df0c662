//! Raw sample persistence for debugging and offline re-analysis.
//!
//! Layout:
//! ```text
//! <dir>/batch.json                 url, browser, cache state + ordered extension list
//! <dir>/<NN>-<name>/run-<N>.json   one Sample per file
//! ```
//!
//! Saving into a directory that already holds a batch replaces it.

use super::SampleStore;
use crate::config::{CacheState, MeasureConfig};
use crate::extension::Browser;
use crate::model::{Extension, Sample};
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

const MANIFEST_FILE: &str = "batch.json";

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct BatchManifest {
    pub url: String,
    pub runs: u32,
    #[serde(default)]
    pub browser: Browser,
    /// Prefixes that were in effect when the batch was measured.
    #[serde(default)]
    pub extension_url_prefixes: Vec<String>,
    #[serde(default)]
    pub cache: CacheState,
    pub extensions: Vec<Extension>,
}

impl BatchManifest {
    pub fn new(cfg: &MeasureConfig, extensions: &[Extension]) -> Self {
        Self {
            url: cfg.url.clone(),
            runs: cfg.runs,
            browser: cfg.browser,
            extension_url_prefixes: cfg.effective_url_prefixes(),
            cache: cfg.cache,
            extensions: extensions.to_vec(),
        }
    }
}

fn dir_name(index: usize, name: &str) -> String {
    let safe: String = name
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || c == '-' || c == '_' || c == '.' {
                c
            } else {
                '_'
            }
        })
        .collect();
    format!("{:02}-{}", index, safe)
}

/// Remove the sample directories listed by a manifest already in `dir`.
fn clear_previous_batch(dir: &Path) -> Result<()> {
    let manifest_path = dir.join(MANIFEST_FILE);
    let Ok(raw) = fs::read_to_string(&manifest_path) else {
        return Ok(());
    };
    let previous: BatchManifest = match serde_json::from_str(&raw) {
        Ok(m) => m,
        Err(e) => {
            tracing::warn!(
                manifest = %manifest_path.display(),
                error = %e,
                "unreadable previous manifest; its samples are left in place"
            );
            return Ok(());
        }
    };
    for (i, ext) in previous.extensions.iter().enumerate() {
        let ext_dir = dir.join(dir_name(i, &ext.name));
        if ext_dir.is_dir() {
            fs::remove_dir_all(&ext_dir)
                .with_context(|| format!("removing {}", ext_dir.display()))?;
        }
    }
    Ok(())
}

/// Write the manifest and every sample in `store` under `dir`, replacing any
/// batch saved there before.
pub fn save_batch(dir: &Path, manifest: &BatchManifest, store: &SampleStore) -> Result<()> {
    fs::create_dir_all(dir).with_context(|| format!("creating {}", dir.display()))?;
    clear_previous_batch(dir)?;
    fs::write(
        dir.join(MANIFEST_FILE),
        serde_json::to_string_pretty(manifest)?,
    )
    .with_context(|| format!("writing {}", dir.join(MANIFEST_FILE).display()))?;

    for (i, ext) in manifest.extensions.iter().enumerate() {
        let ext_dir = dir.join(dir_name(i, &ext.name));
        fs::create_dir_all(&ext_dir)
            .with_context(|| format!("creating {}", ext_dir.display()))?;
        for sample in store.all_for(&ext.name) {
            let path = ext_dir.join(format!("run-{}.json", sample.run_index));
            fs::write(&path, serde_json::to_string_pretty(sample)?)
                .with_context(|| format!("writing {}", path.display()))?;
        }
    }
    tracing::debug!(dir = %dir.display(), samples = store.len(), "saved raw samples");
    Ok(())
}

fn sample_files(dir: &Path) -> Result<Vec<PathBuf>> {
    let mut files: Vec<PathBuf> = fs::read_dir(dir)
        .with_context(|| format!("reading {}", dir.display()))?
        .filter_map(|e| e.ok().map(|e| e.path()))
        .filter(|p| p.extension().is_some_and(|x| x == "json"))
        .collect();
    files.sort();
    Ok(files)
}

/// Load a directory written by [`save_batch`].
///
/// Samples are returned ordered by extension (manifest order), then run index.
pub fn load_batch(dir: &Path) -> Result<(BatchManifest, SampleStore)> {
    let manifest_path = dir.join(MANIFEST_FILE);
    let raw = fs::read_to_string(&manifest_path)
        .with_context(|| format!("reading {}", manifest_path.display()))?;
    let manifest: BatchManifest = serde_json::from_str(&raw)
        .with_context(|| format!("invalid batch manifest {}", manifest_path.display()))?;

    let mut store = SampleStore::new();
    for (i, ext) in manifest.extensions.iter().enumerate() {
        let ext_dir = dir.join(dir_name(i, &ext.name));
        if !ext_dir.is_dir() {
            tracing::warn!(extension = %ext.name, "no sample directory");
            continue;
        }
        let mut samples = Vec::new();
        for path in sample_files(&ext_dir)? {
            let raw = fs::read_to_string(&path)
                .with_context(|| format!("reading {}", path.display()))?;
            let sample: Sample = serde_json::from_str(&raw)
                .with_context(|| format!("invalid sample {}", path.display()))?;
            if sample.run_index == 0 || sample.run_index > manifest.runs {
                anyhow::bail!(
                    "sample {} has run {} but the batch has {} run(s)",
                    path.display(),
                    sample.run_index,
                    manifest.runs
                );
            }
            if sample.extension_name != ext.name {
                anyhow::bail!(
                    "sample {} belongs to '{}', expected '{}'",
                    path.display(),
                    sample.extension_name,
                    ext.name
                );
            }
            samples.push(sample);
        }
        samples.sort_by_key(|s| s.run_index);
        store.extend(samples);
    }
    Ok((manifest, store))
}
