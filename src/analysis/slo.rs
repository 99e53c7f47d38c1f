//! Service-level objective evaluation.
//!
//! Five independent checks over proposals, the cross-reference index, and the
//! evaluation time. A check never fails on missing data; each one defines a
//! fallback status instead.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::config::EngineConfig;
use crate::model::{
    hours_between, parse_timestamp, ActivitySnapshot, ProposalPhase,
};

use super::crossref::CrossReferenceIndex;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum SloStatus {
    Healthy,
    AtRisk,
    Breach,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AggregateStatus {
    Green,
    Yellow,
    Red,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SloCheck {
    pub id: String,
    pub label: String,
    pub target: String,
    pub status: SloStatus,
    pub value: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub details: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SloReport {
    pub checks: Vec<SloCheck>,
    /// Rounded mean of per-check scores (healthy=100, at-risk=65, breach=30).
    pub score: u32,
    pub status: AggregateStatus,
}

/// Run all five checks and aggregate them.
pub fn evaluate_slos(
    snapshot: &ActivitySnapshot,
    index: &CrossReferenceIndex,
    now: DateTime<Utc>,
    config: &EngineConfig,
) -> SloReport {
    let checks = vec![
        check_proposal_cycle_time(snapshot, config),
        check_implementation_lead_time(snapshot, index, config),
        check_blocked_ready_work(snapshot, index, now, config),
        check_dashboard_freshness(snapshot, now, config),
        check_discoverability(snapshot, config),
    ];

    let score = aggregate_score(&checks);
    let status = if checks.iter().any(|c| c.status == SloStatus::Breach) {
        AggregateStatus::Red
    } else if checks.iter().any(|c| c.status == SloStatus::AtRisk) {
        AggregateStatus::Yellow
    } else {
        AggregateStatus::Green
    };

    info!(score, ?status, "SLO evaluation complete");
    SloReport {
        checks,
        score,
        status,
    }
}

/// Median of an unsorted list: central value, or the average of the two
/// central values for even lengths. `None` for an empty list.
pub fn median(values: &[f64]) -> Option<f64> {
    if values.is_empty() {
        return None;
    }
    let mut sorted = values.to_vec();
    sorted.sort_by(|a, b| a.partial_cmp(b).unwrap_or(std::cmp::Ordering::Equal));
    let mid = sorted.len() / 2;
    if sorted.len() % 2 == 0 {
        Some((sorted[mid - 1] + sorted[mid]) / 2.0)
    } else {
        Some(sorted[mid])
    }
}

fn check_proposal_cycle_time(snapshot: &ActivitySnapshot, config: &EngineConfig) -> SloCheck {
    let mut samples = Vec::new();
    for proposal in &snapshot.proposals {
        let ready_at = match proposal.entered_phase_at(ProposalPhase::ReadyToImplement) {
            Some(ts) => ts,
            None => continue,
        };
        let started_at = proposal
            .entered_phase_at(ProposalPhase::Discussion)
            .or_else(|| parse_timestamp(&proposal.created_at));
        let started_at = match started_at {
            Some(ts) => ts,
            None => continue,
        };
        samples.push(hours_between(started_at, ready_at).max(0.0));
    }

    let target = "median discussion to ready within 48h".to_string();
    match median(&samples) {
        Some(hours) => {
            let status = threshold_at_most(
                hours,
                config.cycle_time_healthy_hours,
                config.cycle_time_at_risk_hours,
            );
            SloCheck {
                id: "proposal-cycle-time".to_string(),
                label: "Proposal cycle time".to_string(),
                target,
                status,
                value: format!("{} median", format_hours(hours)),
                details: None,
            }
        }
        None => SloCheck {
            id: "proposal-cycle-time".to_string(),
            label: "Proposal cycle time".to_string(),
            target,
            status: SloStatus::AtRisk,
            value: "n/a".to_string(),
            details: Some("no proposals ready yet".to_string()),
        },
    }
}

fn check_implementation_lead_time(
    snapshot: &ActivitySnapshot,
    index: &CrossReferenceIndex,
    config: &EngineConfig,
) -> SloCheck {
    let mut samples = Vec::new();
    let mut ready_without_merged = 0usize;

    for proposal in &snapshot.proposals {
        let ready_at = match proposal.entered_phase_at(ProposalPhase::ReadyToImplement) {
            Some(ts) => ts,
            None => continue,
        };
        let repo = proposal.repo_tag(&snapshot.repository);
        let merged = index.merged_linked(repo, proposal.number);
        if merged.is_empty() {
            ready_without_merged += 1;
            continue;
        }

        // Only a PR merged at or after the ready transition counts as
        // causal implementation work; earlier merges contribute no sample.
        let earliest_causal = merged
            .iter()
            .filter_map(|pr| pr.merged_at.as_deref().and_then(parse_timestamp))
            .filter(|merged_at| *merged_at >= ready_at)
            .min();
        if let Some(merged_at) = earliest_causal {
            samples.push(hours_between(ready_at, merged_at));
        }
    }

    let target = "median ready to merged PR within 72h".to_string();
    match median(&samples) {
        Some(hours) => {
            let status = threshold_at_most(
                hours,
                config.lead_time_healthy_hours,
                config.lead_time_at_risk_hours,
            );
            SloCheck {
                id: "implementation-lead-time".to_string(),
                label: "Implementation lead time".to_string(),
                target,
                status,
                value: format!("{} median", format_hours(hours)),
                details: None,
            }
        }
        None => {
            let (status, details) = if ready_without_merged > 0 {
                (
                    SloStatus::Breach,
                    format!(
                        "{} ready proposal(s) with no merged linked PR",
                        ready_without_merged
                    ),
                )
            } else {
                (
                    SloStatus::AtRisk,
                    "no merged implementation PRs linked yet".to_string(),
                )
            };
            SloCheck {
                id: "implementation-lead-time".to_string(),
                label: "Implementation lead time".to_string(),
                target,
                status,
                value: "n/a".to_string(),
                details: Some(details),
            }
        }
    }
}

fn check_blocked_ready_work(
    snapshot: &ActivitySnapshot,
    index: &CrossReferenceIndex,
    now: DateTime<Utc>,
    config: &EngineConfig,
) -> SloCheck {
    let mut aged = 0usize;
    let mut blocked = 0usize;

    for proposal in &snapshot.proposals {
        if proposal.phase != ProposalPhase::ReadyToImplement {
            continue;
        }
        let since = proposal
            .entered_phase_at(ProposalPhase::ReadyToImplement)
            .or_else(|| parse_timestamp(&proposal.created_at));
        let since = match since {
            Some(ts) => ts,
            None => continue,
        };
        if hours_between(since, now) <= config.blocked_ready_age_hours {
            continue;
        }
        aged += 1;
        let repo = proposal.repo_tag(&snapshot.repository);
        if index
            .open_or_merged_linked(repo, proposal.number)
            .is_empty()
        {
            blocked += 1;
        }
    }

    let target = "at most 20% of aged ready proposals without a PR".to_string();
    if aged == 0 {
        return SloCheck {
            id: "blocked-ready-work".to_string(),
            label: "Blocked ready work".to_string(),
            target,
            status: SloStatus::Healthy,
            value: "0% (0/0)".to_string(),
            details: None,
        };
    }

    let fraction = blocked as f64 / aged as f64;
    let status = threshold_at_most(
        fraction,
        config.blocked_ready_healthy_fraction,
        config.blocked_ready_at_risk_fraction,
    );
    SloCheck {
        id: "blocked-ready-work".to_string(),
        label: "Blocked ready work".to_string(),
        target,
        status,
        value: format!("{:.0}% ({}/{})", fraction * 100.0, blocked, aged),
        details: None,
    }
}

fn check_dashboard_freshness(
    snapshot: &ActivitySnapshot,
    now: DateTime<Utc>,
    config: &EngineConfig,
) -> SloCheck {
    let target = "snapshot regenerated within 24h".to_string();
    match parse_timestamp(&snapshot.generated_at) {
        Some(generated_at) => {
            let hours = hours_between(generated_at, now).max(0.0);
            let status = threshold_at_most(
                hours,
                config.freshness_healthy_hours,
                config.freshness_at_risk_hours,
            );
            SloCheck {
                id: "dashboard-freshness".to_string(),
                label: "Dashboard freshness".to_string(),
                target,
                status,
                value: format!("{} old", format_hours(hours)),
                details: None,
            }
        }
        None => SloCheck {
            id: "dashboard-freshness".to_string(),
            label: "Dashboard freshness".to_string(),
            target,
            status: SloStatus::AtRisk,
            value: "n/a".to_string(),
            details: Some("snapshot timestamp unparsable".to_string()),
        },
    }
}

fn check_discoverability(snapshot: &ActivitySnapshot, config: &EngineConfig) -> SloCheck {
    let target = "visibility score at least 80".to_string();
    match snapshot.visibility_score {
        Some(score) => {
            let status = if score >= config.visibility_healthy_score {
                SloStatus::Healthy
            } else if score >= config.visibility_at_risk_score {
                SloStatus::AtRisk
            } else {
                SloStatus::Breach
            };
            SloCheck {
                id: "discoverability-health".to_string(),
                label: "Discoverability health".to_string(),
                target,
                status,
                value: format!("{:.0}/100", score),
                details: None,
            }
        }
        None => SloCheck {
            id: "discoverability-health".to_string(),
            label: "Discoverability health".to_string(),
            target,
            status: SloStatus::AtRisk,
            value: "n/a".to_string(),
            details: Some("visibility data unavailable".to_string()),
        },
    }
}

fn threshold_at_most(value: f64, healthy: f64, at_risk: f64) -> SloStatus {
    if value <= healthy {
        SloStatus::Healthy
    } else if value <= at_risk {
        SloStatus::AtRisk
    } else {
        SloStatus::Breach
    }
}

fn aggregate_score(checks: &[SloCheck]) -> u32 {
    if checks.is_empty() {
        return 0;
    }
    let total: f64 = checks
        .iter()
        .map(|c| match c.status {
            SloStatus::Healthy => 100.0,
            SloStatus::AtRisk => 65.0,
            SloStatus::Breach => 30.0,
        })
        .sum();
    (total / checks.len() as f64).round() as u32
}

fn format_hours(hours: f64) -> String {
    let rounded = (hours * 10.0).round() / 10.0;
    if rounded.fract() == 0.0 {
        format!("{}h", rounded as i64)
    } else {
        format!("{:.1}h", rounded)
    }
}
