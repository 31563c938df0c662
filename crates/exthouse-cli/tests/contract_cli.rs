#![allow(deprecated)]
use assert_cmd::Command;
use exthouse_core::extension::Browser;
use exthouse_core::metrics::{BOOTUP_FILES, MAX_POTENTIAL_FID};
use exthouse_core::model::{FileRecord, MetricValue, Metrics, Sample};
use exthouse_core::storage::{save_batch, BatchManifest};
use exthouse_core::{Extension, MeasureConfig, SampleStore};
use predicates::prelude::*;
use serde_json::Value;
use std::path::Path;
use tempfile::tempdir;

fn exthouse() -> Command {
    let mut cmd = Command::cargo_bin("exthouse").unwrap();
    cmd.env_remove("EXTHOUSE_AUDIT_CMD").env("RUST_LOG", "warn");
    cmd
}

fn fid(v: f64) -> Metrics {
    let mut m = Metrics::new();
    m.insert(MAX_POTENTIAL_FID.into(), MetricValue::Number(v));
    m
}

fn write_samples(dir: &Path, baseline_ok: bool) {
    let exts = vec![Extension::baseline(), Extension::new("Honey", "/exts/honey.crx")];
    let base = &exts[0].name;
    let mut store = SampleStore::new();
    for (run, v) in [(1, 100.0), (2, 120.0), (3, 110.0)] {
        if baseline_ok {
            store.record(Sample::new(base.clone(), run, fid(v)));
        } else {
            store.record(Sample::failed(base.clone(), run, "no paint"));
        }
    }
    for (run, v) in [(1, 300.0), (2, 310.0), (3, 305.0)] {
        store.record(Sample::new("Honey", run, fid(v)));
    }
    let cfg = MeasureConfig {
        runs: 3,
        ..MeasureConfig::default()
    };
    save_batch(dir, &BatchManifest::new(&cfg, &exts), &store).unwrap();
}

/// One Firefox run where the extension loads two scripts.
fn write_firefox_samples(dir: &Path) {
    let exts = vec![Extension::baseline(), Extension::new("Tabs", "/exts/tabs.xpi")];
    let mut with_files = fid(180.0);
    let files = (0..2)
        .map(|i| FileRecord {
            url: format!("moz-extension://0a1b/content-{}.js", i),
            total: 80.0,
            scripting: 70.0,
            script_parse_compile: 10.0,
        })
        .collect();
    with_files.insert(BOOTUP_FILES.into(), MetricValue::Files(files));
    let store: SampleStore = vec![
        Sample::new(exts[0].name.clone(), 1, fid(100.0)),
        Sample::new("Tabs", 1, with_files),
    ]
    .into_iter()
    .collect();
    let cfg = MeasureConfig {
        browser: Browser::Firefox,
        ..MeasureConfig::default()
    };
    save_batch(dir, &BatchManifest::new(&cfg, &exts), &store).unwrap();
}

fn analyze_json(dir: &Path, extra: &[&str]) -> Value {
    let out = exthouse()
        .current_dir(dir)
        .args(["analyze", "--samples", ".", "--format", "json"])
        .args(extra)
        .assert()
        .success()
        .get_output()
        .stdout
        .clone();
    serde_json::from_slice(&out).expect("stdout is not JSON")
}

#[test]
fn version_prints_package_version() {
    exthouse()
        .arg("version")
        .assert()
        .success()
        .stdout(predicate::str::contains(env!("CARGO_PKG_VERSION")));
}

#[test]
fn analyze_rebuilds_json_report() {
    let dir = tempdir().unwrap();
    write_samples(dir.path(), true);

    let out = exthouse()
        .current_dir(dir.path())
        .args(["analyze", "--samples", ".", "--format", "json"])
        .assert()
        .success()
        .get_output()
        .stdout
        .clone();
    let v: Value = serde_json::from_slice(&out).expect("stdout is not JSON");
    assert_eq!(v["schema_version"], "exthouse-report-v1");
    assert_eq!(v["baseline"]["max_potential_fid"], 110.0);
    assert_eq!(v["results"][0]["extension_name"], "Honey");
    assert_eq!(v["results"][0]["fid_delta"], 195.0);
}

#[test]
fn analyze_text_output_goes_to_file() {
    let dir = tempdir().unwrap();
    write_samples(dir.path(), true);
    let out = dir.path().join("report.txt");

    exthouse()
        .current_dir(dir.path())
        .args(["analyze", "--samples", "."])
        .arg("--out")
        .arg(&out)
        .assert()
        .success();
    let text = std::fs::read_to_string(&out).unwrap();
    assert!(text.contains("Honey"), "{}", text);
}

#[test]
fn analyze_uses_the_recorded_browser() {
    let dir = tempdir().unwrap();
    write_firefox_samples(dir.path());

    let v = analyze_json(dir.path(), &[]);
    assert_eq!(v["results"][0]["extra_file_count"], 2);

    let v = analyze_json(dir.path(), &["--browser", "chrome"]);
    assert_eq!(v["results"][0]["extra_file_count"], 0);
}

#[test]
fn failed_baseline_exits_with_1() {
    let dir = tempdir().unwrap();
    write_samples(dir.path(), false);

    exthouse()
        .current_dir(dir.path())
        .args(["analyze", "--samples", "."])
        .assert()
        .code(1)
        .stderr(predicate::str::contains("missing baseline"));
}

#[test]
fn zero_runs_is_a_config_error() {
    let dir = tempdir().unwrap();
    exthouse()
        .current_dir(dir.path())
        .args(["measure", "--ext", "a.crx", "--runs", "0", "--audit-cmd", "true"])
        .assert()
        .code(2)
        .stderr(predicate::str::contains("runs must be > 0"));
}

#[test]
fn missing_extension_folder_is_a_config_error() {
    let dir = tempdir().unwrap();
    exthouse()
        .current_dir(dir.path())
        .args(["measure", "--folder", "does-not-exist", "--audit-cmd", "true"])
        .assert()
        .code(2)
        .stderr(predicate::str::contains("invalid path to extension folder"));
}

#[test]
fn unknown_config_keys_are_rejected() {
    let dir = tempdir().unwrap();
    std::fs::write(dir.path().join("exthouse.yaml"), "version: 1\nrunz: 3\n").unwrap();
    exthouse()
        .current_dir(dir.path())
        .args(["measure", "--ext", "a.crx", "--audit-cmd", "true"])
        .assert()
        .code(2);
}

#[cfg(unix)]
#[test]
fn measure_runs_the_audit_command() {
    let dir = tempdir().unwrap();
    let script = dir.path().join("audit.sh");
    std::fs::write(
        &script,
        r#"if [ -n "$EXTHOUSE_EXTENSION_PATH" ]; then FID=300; else FID=100; fi
AUDITS='"max-potential-fid":{"numericValue":%s},"interactive":{"numericValue":2500}'
printf "{\"audits\":{$AUDITS}}" "$FID"
"#,
    )
    .unwrap();
    std::fs::create_dir(dir.path().join("exts")).unwrap();
    std::fs::write(dir.path().join("exts/heavy.crx"), b"").unwrap();
    std::fs::write(dir.path().join("exts/notes.txt"), b"").unwrap();

    let out = exthouse()
        .current_dir(dir.path())
        .env("EXTHOUSE_AUDIT_CMD", "sh audit.sh")
        .args([
            "measure",
            "--folder",
            "exts",
            "--runs",
            "2",
            "--concurrency",
            "2",
            "--format",
            "json",
            "--no-progress",
            "--save-samples",
            "samples",
        ])
        .assert()
        .success()
        .get_output()
        .stdout
        .clone();

    let v: Value = serde_json::from_slice(&out).expect("stdout is not JSON");
    let results = v["results"].as_array().unwrap();
    assert_eq!(results.len(), 1);
    assert_eq!(results[0]["extension_name"], "heavy");
    assert_eq!(results[0]["fid_delta"], 200.0);
    assert_eq!(results[0]["interactive_ms"], 2500.0);
    assert!(dir.path().join("samples/batch.json").is_file());
}
