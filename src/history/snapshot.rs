//! Longitudinal health snapshot.
//!
//! Four sub-metrics, each capped at 25 points, summed before rounding so the
//! composite score is always a multiple of 5 in [0, 100].

use std::collections::HashSet;

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::model::{parse_timestamp, round_to_tenth, ActivitySnapshot};

const SUBMETRIC_CAP: f64 = 25.0;
const PARTICIPATION_WINDOW_DAYS: i64 = 14;
const VELOCITY_WINDOW_DAYS: i64 = 7;

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GovernanceSnapshot {
    pub timestamp: String,
    /// Composite 0-100 score, always a multiple of 5.
    pub health_score: u32,
    pub participation: f64,
    pub pipeline_flow: f64,
    pub follow_through: f64,
    pub consensus_quality: f64,
    pub active_proposals: u64,
    pub total_proposals: u64,
    pub active_agents: u64,
    /// Proposals resolved per day over the trailing 7 days; `null` when none
    /// were resolved (serialized as JSON null, which is meaningful).
    pub proposal_velocity: Option<f64>,
}

/// Compute a health snapshot from the activity data. `timestamp` overrides
/// the snapshot's own generation time as the reference instant.
pub fn compute_snapshot(data: &ActivitySnapshot, timestamp: Option<&str>) -> GovernanceSnapshot {
    let now = timestamp
        .and_then(parse_timestamp)
        .or_else(|| parse_timestamp(&data.generated_at))
        .unwrap_or_else(Utc::now);

    let active_agents = count_active_agents(data, now);
    let participation = (active_agents as f64 * 5.0).min(SUBMETRIC_CAP);
    let pipeline_flow = pipeline_flow_score(data);
    let follow_through = follow_through_score(data);
    let consensus_quality = consensus_quality_score(data);

    let total = participation + pipeline_flow + follow_through + consensus_quality;
    let health_score = ((total / 5.0).round() * 5.0).clamp(0.0, 100.0) as u32;

    let active_proposals = data
        .proposals
        .iter()
        .filter(|p| p.phase.is_active())
        .count() as u64;

    debug!(health_score, active_proposals, "health snapshot computed");
    GovernanceSnapshot {
        timestamp: now.to_rfc3339_opts(chrono::SecondsFormat::Secs, true),
        health_score,
        participation: round_to_tenth(participation),
        pipeline_flow: round_to_tenth(pipeline_flow),
        follow_through: round_to_tenth(follow_through),
        consensus_quality: round_to_tenth(consensus_quality),
        active_proposals,
        total_proposals: data.proposals.len() as u64,
        active_agents,
        proposal_velocity: proposal_velocity(data, now),
    }
}

/// Distinct authors with any recorded activity (proposal, PR, or comment
/// creation) inside the participation window.
fn count_active_agents(data: &ActivitySnapshot, now: DateTime<Utc>) -> u64 {
    let window_start = now - Duration::days(PARTICIPATION_WINDOW_DAYS);
    let mut agents: HashSet<&str> = HashSet::new();

    let in_window = |raw: &str| {
        parse_timestamp(raw).is_some_and(|ts| ts > window_start && ts <= now)
    };
    for proposal in &data.proposals {
        if in_window(&proposal.created_at) {
            agents.insert(proposal.author.as_str());
        }
    }
    for pr in &data.pull_requests {
        if in_window(&pr.created_at) {
            agents.insert(pr.author.as_str());
        }
    }
    for comment in &data.comments {
        if in_window(&comment.created_at) {
            agents.insert(comment.author.as_str());
        }
    }
    agents.len() as u64
}

/// Share of active proposals that have progressed past discussion. An empty
/// active set means nothing is stuck.
fn pipeline_flow_score(data: &ActivitySnapshot) -> f64 {
    let active: Vec<_> = data
        .proposals
        .iter()
        .filter(|p| p.phase.is_active())
        .collect();
    if active.is_empty() {
        return SUBMETRIC_CAP;
    }
    let progressed = active
        .iter()
        .filter(|p| p.phase != crate::model::ProposalPhase::Discussion)
        .count();
    SUBMETRIC_CAP * progressed as f64 / active.len() as f64
}

/// Implemented proposals as a share of everything that reached at least
/// ready-to-implement.
fn follow_through_score(data: &ActivitySnapshot) -> f64 {
    use crate::model::ProposalPhase::{Implemented, ReadyToImplement};
    let implemented = data.proposals.iter().filter(|p| p.phase == Implemented).count();
    let ready = data
        .proposals
        .iter()
        .filter(|p| p.phase == ReadyToImplement)
        .count();
    if implemented + ready == 0 {
        return SUBMETRIC_CAP;
    }
    SUBMETRIC_CAP * implemented as f64 / (implemented + ready) as f64
}

/// Mean approval ratio over proposals that carry votes; zero when none do.
fn consensus_quality_score(data: &ActivitySnapshot) -> f64 {
    let ratios: Vec<f64> = data
        .proposals
        .iter()
        .filter_map(|p| p.votes_summary.as_ref())
        .filter(|v| v.thumbs_up + v.thumbs_down > 0)
        .map(|v| v.thumbs_up as f64 / (v.thumbs_up + v.thumbs_down) as f64)
        .collect();
    if ratios.is_empty() {
        return 0.0;
    }
    SUBMETRIC_CAP * ratios.iter().sum::<f64>() / ratios.len() as f64
}

/// Proposals whose phase became terminal within the trailing 7 days, per day.
fn proposal_velocity(data: &ActivitySnapshot, now: DateTime<Utc>) -> Option<f64> {
    let window_start = now - Duration::days(VELOCITY_WINDOW_DAYS);
    let resolved = data
        .proposals
        .iter()
        .filter(|p| p.phase.is_terminal())
        .filter_map(|p| p.entered_phase_at(p.phase))
        .filter(|ts| *ts > window_start && *ts <= now)
        .count();
    if resolved == 0 {
        None
    } else {
        Some(resolved as f64 / VELOCITY_WINDOW_DAYS as f64)
    }
}
