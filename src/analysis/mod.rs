//! Analysis passes over an activity snapshot.

pub mod bottlenecks;
pub mod crossref;
pub mod incidents;
pub mod reliability;
pub mod slo;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::config::EngineConfig;
use crate::model::{parse_timestamp, ActivitySnapshot};

pub use bottlenecks::{
    detect_bottlenecks, suggest_actions, ActionPriority, Bottleneck, BottleneckKind,
    SuggestedAction,
};
pub use crossref::CrossReferenceIndex;
pub use incidents::{
    detect_incidents, Incident, IncidentCategory, IncidentSeverity, IncidentSource,
};
pub use reliability::{compute_reliability_budget, ReliabilityBudget, RELIABILITY_POLICY};
pub use slo::{evaluate_slos, median, AggregateStatus, SloCheck, SloReport, SloStatus};

/// Combined output of one analysis run.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HealthReport {
    pub generated_at: String,
    pub slo: SloReport,
    pub incidents: Vec<Incident>,
    pub budget: ReliabilityBudget,
    pub bottlenecks: Vec<Bottleneck>,
    pub actions: Vec<SuggestedAction>,
}

/// Resolve the evaluation time: explicit `now` if parsable, else the
/// snapshot's own timestamp, else the wall clock.
pub fn resolve_now(snapshot: &ActivitySnapshot, now: Option<&str>) -> DateTime<Utc> {
    now.and_then(parse_timestamp)
        .or_else(|| parse_timestamp(&snapshot.generated_at))
        .unwrap_or_else(Utc::now)
}

/// Run the full pipeline: cross-reference index, SLO checks, incidents,
/// reliability budget, bottlenecks, suggested actions. Pure value in, pure
/// value out; the caller owns persistence and rendering.
pub fn analyze(snapshot: &ActivitySnapshot, now: Option<&str>, config: &EngineConfig) -> HealthReport {
    let now = resolve_now(snapshot, now);
    let index = CrossReferenceIndex::build(&snapshot.pull_requests, &snapshot.repository);

    let slo = evaluate_slos(snapshot, &index, now, config);
    let incidents = detect_incidents(&snapshot.comments, now, &snapshot.repository, config);
    let budget = compute_reliability_budget(&slo.checks, incidents.len());
    let bottlenecks = detect_bottlenecks(snapshot, &index, config);
    let actions = suggest_actions(&bottlenecks);

    HealthReport {
        generated_at: snapshot.generated_at.clone(),
        slo,
        incidents,
        budget,
        bottlenecks,
        actions,
    }
}
