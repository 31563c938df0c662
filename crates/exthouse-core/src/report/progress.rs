//! Run progress. The runner emits one event per finished audit, in completion
//! order; the console layer consumes them through a sink.

use std::sync::Arc;

/// One finished (extension, run) audit and the batch count so far.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProgressEvent {
    pub done: usize,
    pub total: usize,
    pub extension: String,
    pub run_index: u32,
    pub failed: bool,
}

/// Sink for progress events. Called once per completed (extension, run).
pub type ProgressSink = Arc<dyn Fn(ProgressEvent) + Send + Sync>;
