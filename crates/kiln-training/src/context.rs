use crate::layout::RunLayout;
use crate::progress::{ProgressSink, TracingProgressSink};
use chrono::Utc;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Identifier for one training run, e.g. `20261016-101500-1a2b3c4d`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct RunId(pub String);

impl RunId {
    /// Timestamp prefix keeps run directories sorted by start time.
    #[must_use]
    pub fn new() -> Self {
        let suffix = Uuid::new_v4().simple().to_string();
        Self(format!("{}-{}", Utc::now().format("%Y%m%d-%H%M%S"), &suffix[..8]))
    }
}

impl Default for RunId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for RunId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        self.0.fmt(f)
    }
}

/// Everything a training driver receives besides its own options.
pub struct RunContext {
    pub run_id: RunId,
    /// Where checkpoints and the manifest go; `None` keeps the run in memory.
    pub layout: Option<RunLayout>,
    pub progress: Box<dyn ProgressSink>,
}

impl RunContext {
    #[must_use]
    pub fn new(run_id: RunId) -> Self {
        Self { run_id, layout: None, progress: Box::new(TracingProgressSink) }
    }

    #[must_use]
    pub fn with_layout(mut self, layout: RunLayout) -> Self {
        self.layout = Some(layout);
        self
    }

    #[must_use]
    pub fn with_progress(mut self, progress: Box<dyn ProgressSink>) -> Self {
        self.progress = progress;
        self
    }
}

impl std::fmt::Debug for RunContext {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RunContext").field("run_id", &self.run_id).field("layout", &self.layout).finish_non_exhaustive()
    }
}
