//! Workflow bottleneck detection and suggested actions.
//!
//! Five detectors over the same proposal/PR/comment entities, all measured
//! against a 24h staleness cutoff relative to the snapshot's generation time.

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::config::EngineConfig;
use crate::model::{
    parse_timestamp, ActivitySnapshot, CommentType, ProposalPhase, PullRequestState,
};

use super::crossref::CrossReferenceIndex;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum BottleneckKind {
    UnclaimedWork,
    StalledDiscussion,
    CompetingImplementations,
    TraceabilityGap,
    StalePr,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Bottleneck {
    pub kind: BottleneckKind,
    pub number: u64,
    pub title: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub detail: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ActionPriority {
    High,
    Medium,
    Low,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SuggestedAction {
    pub priority: ActionPriority,
    pub description: String,
    pub issue_number: u64,
}

/// Run all five detectors. Returns an empty list when the snapshot's own
/// timestamp is unparsable, since nothing can be aged against it.
pub fn detect_bottlenecks(
    snapshot: &ActivitySnapshot,
    index: &CrossReferenceIndex,
    config: &EngineConfig,
) -> Vec<Bottleneck> {
    let generated_at = match parse_timestamp(&snapshot.generated_at) {
        Some(ts) => ts,
        None => {
            warn!("snapshot generatedAt unparsable, skipping bottleneck detection");
            return Vec::new();
        }
    };
    let cutoff = generated_at - Duration::hours(config.staleness_hours);

    let mut bottlenecks = Vec::new();
    detect_unclaimed_work(snapshot, index, &mut bottlenecks);
    detect_stalled_discussions(snapshot, generated_at, cutoff, &mut bottlenecks);
    detect_competing_implementations(snapshot, index, &mut bottlenecks);
    detect_traceability_gaps(snapshot, index, &mut bottlenecks);
    detect_stale_prs(snapshot, generated_at, cutoff, &mut bottlenecks);

    info!(count = bottlenecks.len(), "bottleneck detection complete");
    bottlenecks
}

fn detect_unclaimed_work(
    snapshot: &ActivitySnapshot,
    index: &CrossReferenceIndex,
    out: &mut Vec<Bottleneck>,
) {
    for proposal in &snapshot.proposals {
        if proposal.phase != ProposalPhase::ReadyToImplement {
            continue;
        }
        let repo = proposal.repo_tag(&snapshot.repository);
        if index.open_linked(repo, proposal.number).is_empty() {
            out.push(Bottleneck {
                kind: BottleneckKind::UnclaimedWork,
                number: proposal.number,
                title: proposal.title.clone(),
                detail: Some("no open implementation PR linked".to_string()),
            });
        }
    }
}

fn detect_stalled_discussions(
    snapshot: &ActivitySnapshot,
    generated_at: DateTime<Utc>,
    cutoff: DateTime<Utc>,
    out: &mut Vec<Bottleneck>,
) {
    for proposal in &snapshot.proposals {
        if proposal.phase != ProposalPhase::Discussion {
            continue;
        }
        let created_at = match parse_timestamp(&proposal.created_at) {
            Some(ts) => ts,
            None => continue,
        };
        if created_at >= cutoff {
            continue;
        }

        let repo = proposal.repo_tag(&snapshot.repository);
        let last_comment = snapshot
            .comments
            .iter()
            .filter(|c| {
                matches!(c.kind, CommentType::Issue | CommentType::Proposal)
                    && c.issue_or_pr_number == proposal.number
                    && c.repo_tag(&snapshot.repository) == repo
            })
            .filter_map(|c| parse_timestamp(&c.created_at))
            .max();

        let last_activity = last_comment.unwrap_or(created_at);
        if last_activity < cutoff {
            let days = (generated_at - last_activity).num_days();
            out.push(Bottleneck {
                kind: BottleneckKind::StalledDiscussion,
                number: proposal.number,
                title: proposal.title.clone(),
                detail: Some(format!("{}d since last comment", days)),
            });
        }
    }
}

fn detect_competing_implementations(
    snapshot: &ActivitySnapshot,
    index: &CrossReferenceIndex,
    out: &mut Vec<Bottleneck>,
) {
    for proposal in &snapshot.proposals {
        let repo = proposal.repo_tag(&snapshot.repository);
        let open = index.open_linked(repo, proposal.number);
        if open.len() >= 2 {
            let numbers = open
                .iter()
                .map(|pr| format!("#{}", pr.number))
                .collect::<Vec<_>>()
                .join(", ");
            out.push(Bottleneck {
                kind: BottleneckKind::CompetingImplementations,
                number: proposal.number,
                title: proposal.title.clone(),
                detail: Some(format!("{} open PRs: {}", open.len(), numbers)),
            });
        }
    }
}

fn detect_traceability_gaps(
    snapshot: &ActivitySnapshot,
    index: &CrossReferenceIndex,
    out: &mut Vec<Bottleneck>,
) {
    for proposal in &snapshot.proposals {
        if proposal.phase != ProposalPhase::Implemented {
            continue;
        }
        let repo = proposal.repo_tag(&snapshot.repository);
        if index.merged_linked(repo, proposal.number).is_empty() {
            out.push(Bottleneck {
                kind: BottleneckKind::TraceabilityGap,
                number: proposal.number,
                title: proposal.title.clone(),
                detail: Some("no merged PR recorded".to_string()),
            });
        }
    }
}

fn detect_stale_prs(
    snapshot: &ActivitySnapshot,
    generated_at: DateTime<Utc>,
    cutoff: DateTime<Utc>,
    out: &mut Vec<Bottleneck>,
) {
    for pr in &snapshot.pull_requests {
        if pr.state != PullRequestState::Open || pr.is_draft() {
            continue;
        }
        let created_at = match parse_timestamp(&pr.created_at) {
            Some(ts) => ts,
            None => continue,
        };
        if created_at >= cutoff {
            continue;
        }

        let repo = pr.repo_tag(&snapshot.repository);
        let last_comment = snapshot
            .comments
            .iter()
            .filter(|c| {
                matches!(c.kind, CommentType::Pr | CommentType::Review)
                    && c.issue_or_pr_number == pr.number
                    && c.repo_tag(&snapshot.repository) == repo
            })
            .filter_map(|c| parse_timestamp(&c.created_at))
            .max();

        let last_activity = last_comment.unwrap_or(created_at);
        if last_activity < cutoff {
            let days = (generated_at - last_activity).num_days();
            out.push(Bottleneck {
                kind: BottleneckKind::StalePr,
                number: pr.number,
                title: pr.title.clone(),
                detail: Some(format!("{}d since last comment", days)),
            });
        }
    }
}

/// Flatten bottlenecks into prioritized actions, stable-sorted so equal
/// priorities keep detection order.
pub fn suggest_actions(bottlenecks: &[Bottleneck]) -> Vec<SuggestedAction> {
    let mut actions: Vec<SuggestedAction> = bottlenecks
        .iter()
        .map(|b| SuggestedAction {
            priority: priority_for(b.kind),
            description: describe(b),
            issue_number: b.number,
        })
        .collect();
    actions.sort_by_key(|a| a.priority);
    actions
}

fn priority_for(kind: BottleneckKind) -> ActionPriority {
    match kind {
        BottleneckKind::CompetingImplementations | BottleneckKind::StalePr => ActionPriority::High,
        BottleneckKind::StalledDiscussion | BottleneckKind::TraceabilityGap => {
            ActionPriority::Medium
        }
        BottleneckKind::UnclaimedWork => ActionPriority::Low,
    }
}

fn describe(bottleneck: &Bottleneck) -> String {
    let base = match bottleneck.kind {
        BottleneckKind::UnclaimedWork => {
            format!("Pick up unclaimed proposal #{}", bottleneck.number)
        }
        BottleneckKind::StalledDiscussion => {
            format!("Revive stalled discussion on #{}", bottleneck.number)
        }
        BottleneckKind::CompetingImplementations => {
            format!("Coordinate competing PRs for #{}", bottleneck.number)
        }
        BottleneckKind::TraceabilityGap => {
            format!("Link the merged implementation for #{}", bottleneck.number)
        }
        BottleneckKind::StalePr => format!("Review or close stale PR #{}", bottleneck.number),
    };
    match &bottleneck.detail {
        Some(detail) => format!("{} ({})", base, detail),
        None => base,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn bottleneck(kind: BottleneckKind, number: u64) -> Bottleneck {
        Bottleneck {
            kind,
            number,
            title: "t".to_string(),
            detail: None,
        }
    }

    #[test]
    fn actions_sort_high_to_low_and_stay_stable() {
        let bottlenecks = vec![
            bottleneck(BottleneckKind::UnclaimedWork, 1),
            bottleneck(BottleneckKind::StalledDiscussion, 2),
            bottleneck(BottleneckKind::StalePr, 3),
            bottleneck(BottleneckKind::TraceabilityGap, 4),
            bottleneck(BottleneckKind::CompetingImplementations, 5),
        ];
        let actions = suggest_actions(&bottlenecks);

        let order: Vec<u64> = actions.iter().map(|a| a.issue_number).collect();
        // High: stale-pr then competing (detection order), medium: stalled
        // then traceability, low: unclaimed.
        assert_eq!(order, vec![3, 5, 2, 4, 1]);
        assert_eq!(actions[0].priority, ActionPriority::High);
        assert_eq!(actions[4].priority, ActionPriority::Low);
    }

    #[test]
    fn descriptions_carry_detail_strings() {
        let mut b = bottleneck(BottleneckKind::CompetingImplementations, 60);
        b.detail = Some("2 open PRs: #60, #61".to_string());
        let actions = suggest_actions(&[b]);
        assert_eq!(
            actions[0].description,
            "Coordinate competing PRs for #60 (2 open PRs: #60, #61)"
        );
    }
}
