//! Auditor backed by an external command.
//!
//! The command launches the browser (with or without the extension), runs the
//! audit and prints a Lighthouse JSON report on stdout. Argument placeholders
//! `{url}`, `{extension}`, `{name}`, `{run}` and `{cache}` are substituted per
//! run; the same values are exported as `EXTHOUSE_*` environment variables.

use super::{lighthouse, AuditTarget, Auditor};
use crate::model::Metrics;
use anyhow::{bail, Context, Result};
use async_trait::async_trait;
use std::process::Stdio;
use std::time::Duration;
use tokio::process::Command;

/// Cap on captured stderr in error messages.
const MAX_STDERR_BYTES: usize = 4096;

#[derive(Debug, Clone)]
pub struct CommandAuditor {
    program: String,
    args: Vec<String>,
    timeout: Duration,
}

impl CommandAuditor {
    pub fn new(program: impl Into<String>, args: Vec<String>, timeout: Duration) -> Self {
        Self {
            program: program.into(),
            args,
            timeout,
        }
    }

    /// Split a whitespace-separated command line. Placeholders are substituted
    /// after splitting, so substituted paths may contain spaces.
    pub fn from_command_line(line: &str, timeout: Duration) -> Result<Self> {
        let mut parts = line.split_whitespace().map(str::to_string);
        let program = parts.next().context("audit command is empty")?;
        Ok(Self::new(program, parts.collect(), timeout))
    }

    fn expand(&self, arg: &str, url: &str, target: &AuditTarget) -> String {
        let ext = target
            .path
            .as_ref()
            .map(|p| p.display().to_string())
            .unwrap_or_default();
        arg.replace("{url}", url)
            .replace("{extension}", &ext)
            .replace("{name}", &target.extension_name)
            .replace("{run}", &target.run_index.to_string())
            .replace("{cache}", target.cache.as_str())
    }

    fn build(&self, url: &str, target: &AuditTarget) -> Command {
        let mut cmd = Command::new(&self.program);
        cmd.args(self.args.iter().map(|a| self.expand(a, url, target)))
            .env("EXTHOUSE_URL", url)
            .env("EXTHOUSE_EXTENSION_NAME", &target.extension_name)
            .env("EXTHOUSE_RUN_INDEX", target.run_index.to_string())
            .env("EXTHOUSE_CACHE", target.cache.as_str())
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);
        match &target.path {
            Some(p) => {
                cmd.env("EXTHOUSE_EXTENSION_PATH", p);
            }
            None => {
                cmd.env_remove("EXTHOUSE_EXTENSION_PATH");
            }
        }
        cmd
    }
}

fn truncated(bytes: &[u8]) -> String {
    let mut s = String::from_utf8_lossy(bytes).into_owned();
    if s.len() > MAX_STDERR_BYTES {
        let mut cut = MAX_STDERR_BYTES;
        while !s.is_char_boundary(cut) {
            cut -= 1;
        }
        s.truncate(cut);
    }
    s.trim().to_string()
}

#[async_trait]
impl Auditor for CommandAuditor {
    fn name(&self) -> &'static str {
        "command"
    }

    async fn audit(&self, url: &str, target: &AuditTarget) -> Result<Metrics> {
        let child = self
            .build(url, target)
            .spawn()
            .with_context(|| format!("spawning audit command '{}'", self.program))?;

        // On timeout the future is dropped and kill_on_drop reaps the child.
        let output = match tokio::time::timeout(self.timeout, child.wait_with_output()).await {
            Ok(res) => res.context("waiting for audit command")?,
            Err(_) => bail!("audit command timed out after {}s", self.timeout.as_secs()),
        };

        if !output.status.success() {
            bail!(
                "audit command exited with {}: {}",
                output
                    .status
                    .code()
                    .map(|c| c.to_string())
                    .unwrap_or_else(|| "signal".into()),
                truncated(&output.stderr)
            );
        }

        let stdout = String::from_utf8_lossy(&output.stdout);
        lighthouse::metrics_from_lhr_str(&stdout)
    }
}
