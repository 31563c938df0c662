//! Extension discovery and batch validation.
//!
//! Packages are not unpacked here; the auditor receives the package (or
//! directory) path and owns installing it into the browser.

use crate::errors::ExthouseError;
use crate::model::Extension;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Browser {
    #[default]
    Chrome,
    Firefox,
}

impl Browser {
    /// File suffix of packaged extensions for this browser.
    pub fn package_suffix(&self) -> &'static str {
        match self {
            Self::Chrome => "crx",
            Self::Firefox => "xpi",
        }
    }

    /// URL scheme under which the browser serves extension resources.
    pub fn extension_url_prefix(&self) -> &'static str {
        match self {
            Self::Chrome => "chrome-extension://",
            Self::Firefox => "moz-extension://",
        }
    }
}

impl fmt::Display for Browser {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Chrome => f.write_str("chrome"),
            Self::Firefox => f.write_str("firefox"),
        }
    }
}

impl FromStr for Browser {
    type Err = ExthouseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "chrome" | "chromium" => Ok(Self::Chrome),
            "firefox" | "ff" => Ok(Self::Firefox),
            other => Err(ExthouseError::invalid_config(format!(
                "unknown browser '{}' (expected chrome or firefox)",
                other
            ))),
        }
    }
}

fn extension_name(path: &Path) -> String {
    path.file_stem()
        .or_else(|| path.file_name())
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string())
}

fn is_candidate(path: &Path, browser: Browser) -> bool {
    path.is_dir()
        || path
            .extension()
            .is_some_and(|x| x.eq_ignore_ascii_case(browser.package_suffix()))
}

/// Build the batch from explicit paths: baseline first, then one entry per
/// package file (or unpacked directory) in the given order.
pub fn load_extensions(
    paths: &[PathBuf],
    browser: Browser,
) -> Result<Vec<Extension>, ExthouseError> {
    let mut list = vec![Extension::baseline()];
    for path in paths {
        if !is_candidate(path, browser) {
            tracing::debug!(path = %path.display(), "skipping non-extension path");
            continue;
        }
        list.push(Extension::new(extension_name(path), path.clone()));
    }
    if list.len() == 1 {
        return Err(ExthouseError::invalid_config("no extensions found"));
    }
    validate_batch(&list)?;
    Ok(list)
}

/// List `folder` (non-recursive, sorted) and load every package found.
pub fn discover_extensions(
    folder: &Path,
    browser: Browser,
) -> Result<Vec<Extension>, ExthouseError> {
    if !folder.is_dir() {
        return Err(ExthouseError::invalid_config(format!(
            "invalid path to extension folder: {}",
            folder.display()
        )));
    }
    let mut paths: Vec<PathBuf> = std::fs::read_dir(folder)
        .map_err(|e| {
            ExthouseError::invalid_config(format!("cannot read {}: {}", folder.display(), e))
        })?
        .filter_map(|e| e.ok().map(|e| e.path()))
        .filter(|p| {
            p.extension()
                .is_some_and(|x| x.eq_ignore_ascii_case(browser.package_suffix()))
        })
        .collect();
    paths.sort();
    load_extensions(&paths, browser)
}

/// Exactly one baseline and unique names.
pub fn validate_batch(extensions: &[Extension]) -> Result<(), ExthouseError> {
    let baselines = extensions.iter().filter(|e| e.is_baseline).count();
    if baselines != 1 {
        return Err(ExthouseError::invalid_config(format!(
            "expected exactly one baseline entry, found {}",
            baselines
        )));
    }
    let mut seen = HashSet::new();
    for ext in extensions {
        if !seen.insert(ext.name.as_str()) {
            return Err(ExthouseError::invalid_config(format!(
                "duplicate extension name '{}'",
                ext.name
            )));
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::BASELINE_NAME;

    #[test]
    fn baseline_is_prepended() {
        let list = load_extensions(
            &[PathBuf::from("Honey_v10.8.1.crx"), PathBuf::from("notes.txt")],
            Browser::Chrome,
        )
        .unwrap();
        assert_eq!(list.len(), 2);
        assert!(list[0].is_baseline);
        assert_eq!(list[0].name, BASELINE_NAME);
        assert_eq!(list[1].name, "Honey_v10.8.1");
    }

    #[test]
    fn nothing_matching_is_invalid() {
        let err = load_extensions(&[PathBuf::from("a.xpi")], Browser::Chrome).unwrap_err();
        assert_eq!(err, ExthouseError::invalid_config("no extensions found"));
    }

    #[test]
    fn discover_lists_folder_sorted() {
        let dir = tempfile::tempdir().unwrap();
        for f in ["b.crx", "a.crx", "c.xpi", "readme.md"] {
            std::fs::write(dir.path().join(f), b"").unwrap();
        }
        let list = discover_extensions(dir.path(), Browser::Chrome).unwrap();
        let names: Vec<&str> = list.iter().map(|e| e.name.as_str()).collect();
        assert_eq!(names, vec![BASELINE_NAME, "a", "b"]);

        let ff = discover_extensions(dir.path(), Browser::Firefox).unwrap();
        assert_eq!(ff[1].name, "c");
    }

    #[test]
    fn missing_folder_is_invalid() {
        let err = discover_extensions(Path::new("/definitely/not/here"), Browser::Chrome)
            .unwrap_err();
        assert!(err.to_string().contains("invalid path to extension folder"));
    }

    #[test]
    fn batch_requires_single_baseline() {
        let no_base = vec![Extension::new("A", "a.crx")];
        assert!(validate_batch(&no_base).is_err());
        let two = vec![Extension::baseline(), Extension::baseline()];
        assert!(validate_batch(&two).is_err());
        let dup = vec![
            Extension::baseline(),
            Extension::new("A", "a.crx"),
            Extension::new("A", "other/a.crx"),
        ];
        assert!(validate_batch(&dup)
            .unwrap_err()
            .to_string()
            .contains("duplicate"));
    }
}
