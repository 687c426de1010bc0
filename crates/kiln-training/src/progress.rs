use crate::context::RunId;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ProgressEvent {
    Started { run_id: RunId },
    Message { run_id: RunId, message: String },
    Step { run_id: RunId, step: u64, loss: f64 },
    EpochEnd { run_id: RunId, epoch: u64, mean_loss: f64, accuracy: f64 },
    Finished { run_id: RunId },
}

pub trait ProgressSink: Send + Sync {
    fn on_event(&self, event: ProgressEvent);
}

#[derive(Debug, Default)]
pub struct StdoutProgressSink;

impl ProgressSink for StdoutProgressSink {
    fn on_event(&self, event: ProgressEvent) {
        match event {
            ProgressEvent::Started { run_id } => println!("[train:{run_id}] started"),
            ProgressEvent::Message { run_id, message } => println!("[train:{run_id}] {message}"),
            ProgressEvent::Step { run_id, step, loss } => println!("[train:{run_id}] step {step} loss {loss:.4}"),
            ProgressEvent::EpochEnd { run_id, epoch, mean_loss, accuracy } => {
                println!("[train:{run_id}] epoch {epoch} loss {mean_loss:.4} acc {accuracy:.3}");
            }
            ProgressEvent::Finished { run_id } => println!("[train:{run_id}] finished"),
        }
    }
}

/// Routes events through `tracing`, leaving stdout free for machine output.
#[derive(Debug, Default)]
pub struct TracingProgressSink;

impl ProgressSink for TracingProgressSink {
    fn on_event(&self, event: ProgressEvent) {
        match event {
            ProgressEvent::Started { run_id } => tracing::info!(%run_id, "training started"),
            ProgressEvent::Message { run_id, message } => tracing::info!(%run_id, "{message}"),
            ProgressEvent::Step { run_id, step, loss } => tracing::info!(%run_id, step, loss, "step"),
            ProgressEvent::EpochEnd { run_id, epoch, mean_loss, accuracy } => {
                tracing::info!(%run_id, epoch, mean_loss, accuracy, "epoch finished");
            }
            ProgressEvent::Finished { run_id } => tracing::info!(%run_id, "training finished"),
        }
    }
}
