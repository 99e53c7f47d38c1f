#![allow(dead_code)]

use governance_health::model::{
    ActivitySnapshot, Comment, CommentType, PhaseTransition, Proposal, ProposalPhase,
    PullRequest, PullRequestState, VotesSummary,
};

pub const GENERATED_AT: &str = "2026-08-20T12:00:00Z";

/// Snapshot with no activity, generated at [`GENERATED_AT`].
pub fn empty_snapshot() -> ActivitySnapshot {
    ActivitySnapshot {
        repository: "org/repo".to_string(),
        repositories: vec!["org/repo".to_string()],
        generated_at: GENERATED_AT.to_string(),
        proposals: Vec::new(),
        pull_requests: Vec::new(),
        comments: Vec::new(),
        visibility_score: Some(90.0),
    }
}

pub fn proposal(number: u64, phase: ProposalPhase, created_at: &str) -> Proposal {
    Proposal {
        number,
        title: format!("Proposal {}", number),
        author: "alice".to_string(),
        created_at: created_at.to_string(),
        phase,
        comment_count: 0,
        votes_summary: None,
        phase_transitions: None,
        repo: None,
    }
}

pub fn with_transitions(mut proposal: Proposal, transitions: &[(ProposalPhase, &str)]) -> Proposal {
    proposal.phase_transitions = Some(
        transitions
            .iter()
            .map(|(phase, entered_at)| PhaseTransition {
                phase: *phase,
                entered_at: (*entered_at).to_string(),
            })
            .collect(),
    );
    proposal
}

pub fn with_votes(mut proposal: Proposal, thumbs_up: u64, thumbs_down: u64) -> Proposal {
    proposal.votes_summary = Some(VotesSummary {
        thumbs_up,
        thumbs_down,
    });
    proposal
}

pub fn pull_request(
    number: u64,
    title: &str,
    state: PullRequestState,
    created_at: &str,
) -> PullRequest {
    PullRequest {
        number,
        title: title.to_string(),
        body: None,
        state,
        author: "bob".to_string(),
        created_at: created_at.to_string(),
        merged_at: None,
        draft: None,
        repo: None,
    }
}

pub fn merged_pr(number: u64, title: &str, created_at: &str, merged_at: &str) -> PullRequest {
    let mut pr = pull_request(number, title, PullRequestState::Merged, created_at);
    pr.merged_at = Some(merged_at.to_string());
    pr
}

pub fn comment(
    id: &str,
    number: u64,
    kind: CommentType,
    body: &str,
    created_at: &str,
) -> Comment {
    Comment {
        id: id.to_string(),
        issue_or_pr_number: number,
        kind,
        author: "carol".to_string(),
        body: body.to_string(),
        created_at: created_at.to_string(),
        url: format!("https://example.test/{}#{}", number, id),
        repo: None,
    }
}
