//! The auditor boundary: something that loads a page (optionally with an
//! extension installed) and returns named performance metrics.

pub mod command;
pub mod fake;
pub mod lighthouse;

use crate::config::CacheState;
use crate::model::{Extension, Metrics};
use async_trait::async_trait;
use std::path::PathBuf;

pub use command::CommandAuditor;
pub use fake::ScriptedAuditor;

/// What a single audit should load. `path == None` measures the bare page.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuditTarget {
    pub extension_name: String,
    pub path: Option<PathBuf>,
    pub run_index: u32,
    pub cache: CacheState,
}

impl AuditTarget {
    pub fn for_run(ext: &Extension, run_index: u32) -> Self {
        Self {
            extension_name: ext.name.clone(),
            path: if ext.is_baseline {
                None
            } else {
                ext.source_path.clone()
            },
            run_index,
            cache: CacheState::default(),
        }
    }

    pub fn with_cache(mut self, cache: CacheState) -> Self {
        self.cache = cache;
        self
    }
}

#[async_trait]
pub trait Auditor: Send + Sync {
    fn name(&self) -> &'static str;

    /// Run one audit. Each call owns its own browser instance, so concurrent
    /// calls share no mutable state. Timeouts are the implementation's concern.
    async fn audit(&self, url: &str, target: &AuditTarget) -> anyhow::Result<Metrics>;
}
