//! Incremental progress reporting toward the UI collaborator.
//!
//! Emission is best-effort: a sink must never fail the synthesis run.

use serde::{Deserialize, Serialize};

/// Snapshot sent after every successfully generated unit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProgressEvent {
    pub units_completed: usize,
    pub units_total: usize,
}

/// Terminal signal: the flow id on success, an error message otherwise.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "camelCase")]
pub enum FlowOutcome {
    #[serde(rename_all = "camelCase")]
    Persisted { flow_id: String },
    #[serde(rename_all = "camelCase")]
    Failed { message: String },
}

/// Receiver for synthesis progress.
pub trait ProgressSink: Send + Sync {
    fn unit_completed(&self, event: ProgressEvent);
    fn flow_finished(&self, outcome: &FlowOutcome);
}

/// Discards every event.
#[derive(Debug, Default, Clone, Copy)]
pub struct NullProgress;

impl ProgressSink for NullProgress {
    fn unit_completed(&self, _event: ProgressEvent) {}
    fn flow_finished(&self, _outcome: &FlowOutcome) {}
}

/// Logs progress through the tracing subscriber. Used by the CLI.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingProgress;

impl ProgressSink for TracingProgress {
    fn unit_completed(&self, event: ProgressEvent) {
        tracing::info!(
            completed = event.units_completed,
            total = event.units_total,
            "unit generated"
        );
    }

    fn flow_finished(&self, outcome: &FlowOutcome) {
        match outcome {
            FlowOutcome::Persisted { flow_id } => {
                tracing::info!(flow_id = %flow_id, "flow persisted");
            }
            FlowOutcome::Failed { message } => {
                tracing::error!(error = %message, "synthesis failed");
            }
        }
    }
}
