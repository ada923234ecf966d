//! SLA aggregation over the request history log.
//!
//! Derives the average medical-audit duration from history events: the first
//! AUDIT event marks the entry, the last ADMINISTRATIVE/RELEASE/FINISHED event
//! marks the exit. Requests lacking either boundary, or with a non-positive
//! span (clock skew, malformed history), contribute nothing.

use crate::request::Request;
use crate::workflow::WorkflowStep;
use serde::{Deserialize, Serialize};

/// Aggregated audit-duration statistics.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SlaStats {
    /// Human-readable average; the sentinel `---` when no sample qualifies.
    pub label: String,
    pub raw_millis: i64,
    pub count: usize,
}

/// Requests per workflow step, for the management dashboard.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StepCounts {
    pub administrative: usize,
    pub audit: usize,
    pub release: usize,
    pub finished: usize,
}

/// Computes the average time requests spend under medical audit.
pub fn average_audit_duration(requests: &[Request]) -> SlaStats {
    let mut total_ms: i64 = 0;
    let mut count: usize = 0;

    for request in requests {
        let entry = request
            .history
            .iter()
            .find(|h| h.step == WorkflowStep::Audit);
        let exit = request
            .history
            .iter()
            .filter(|h| {
                matches!(
                    h.step,
                    WorkflowStep::Administrative | WorkflowStep::Release | WorkflowStep::Finished
                )
            })
            .last();

        if let (Some(entry), Some(exit)) = (entry, exit) {
            let span = exit
                .timestamp
                .signed_duration_since(entry.timestamp)
                .num_milliseconds();
            if span > 0 {
                total_ms += span;
                count += 1;
            }
        }
    }

    if count == 0 {
        return SlaStats {
            label: "---".to_owned(),
            raw_millis: 0,
            count: 0,
        };
    }

    let avg = total_ms / count as i64;
    SlaStats {
        label: format_duration(avg),
        raw_millis: avg,
        count,
    }
}

/// Renders a millisecond span: fractional days (one decimal) at 24h and
/// above, `{hours}h {minutes}m` below.
pub fn format_duration(millis: i64) -> String {
    let hours = millis / 3_600_000;
    let minutes = (millis % 3_600_000) / 60_000;
    if hours >= 24 {
        format!("{:.1} dias", hours as f64 / 24.0)
    } else {
        format!("{hours}h {minutes}m")
    }
}

/// Counts requests per workflow step.
pub fn step_counts(requests: &[Request]) -> StepCounts {
    let mut counts = StepCounts::default();
    for request in requests {
        match request.workflow_step {
            WorkflowStep::Administrative => counts.administrative += 1,
            WorkflowStep::Audit => counts.audit += 1,
            WorkflowStep::Release => counts.release += 1,
            WorkflowStep::Finished => counts.finished += 1,
        }
    }
    counts
}
