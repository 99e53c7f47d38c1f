//! Activity snapshot entities shared by every analysis pass.
//!
//! Timestamps cross the boundary as ISO-8601 strings and are parsed lazily:
//! a malformed timestamp makes the affected comparison resolve to `None` and
//! the record drop out of the aggregate, never an error.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ProposalPhase {
    Discussion,
    Voting,
    ExtendedVoting,
    ReadyToImplement,
    Implemented,
    Rejected,
    Inconclusive,
}

impl ProposalPhase {
    /// Terminal phases end the proposal lifecycle.
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            Self::Implemented | Self::Rejected | Self::Inconclusive
        )
    }

    /// Active proposals are still moving through the pipeline.
    pub fn is_active(&self) -> bool {
        !self.is_terminal()
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VotesSummary {
    pub thumbs_up: u64,
    pub thumbs_down: u64,
}

/// One recorded entry into a phase. Proposals may re-enter a phase; the
/// earliest occurrence is canonical for cycle-time purposes.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PhaseTransition {
    pub phase: ProposalPhase,
    pub entered_at: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Proposal {
    pub number: u64,
    pub title: String,
    pub author: String,
    pub created_at: String,
    pub phase: ProposalPhase,
    pub comment_count: u64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub votes_summary: Option<VotesSummary>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub phase_transitions: Option<Vec<PhaseTransition>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub repo: Option<String>,
}

impl Proposal {
    /// The repository this proposal belongs to. `(repo, number)` is the true
    /// unique key; an absent tag means the caller's primary repository.
    pub fn repo_tag<'a>(&'a self, default_repo: &'a str) -> &'a str {
        self.repo.as_deref().unwrap_or(default_repo)
    }

    /// Earliest recorded entry into `phase`, if transition history exists.
    pub fn entered_phase_at(&self, phase: ProposalPhase) -> Option<DateTime<Utc>> {
        self.phase_transitions
            .as_ref()?
            .iter()
            .filter(|t| t.phase == phase)
            .filter_map(|t| parse_timestamp(&t.entered_at))
            .min()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PullRequestState {
    Open,
    Closed,
    Merged,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PullRequest {
    pub number: u64,
    pub title: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub body: Option<String>,
    pub state: PullRequestState,
    pub author: String,
    pub created_at: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub merged_at: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub draft: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub repo: Option<String>,
}

impl PullRequest {
    pub fn repo_tag<'a>(&'a self, default_repo: &'a str) -> &'a str {
        self.repo.as_deref().unwrap_or(default_repo)
    }

    pub fn is_draft(&self) -> bool {
        self.draft.unwrap_or(false)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CommentType {
    Issue,
    Pr,
    Review,
    Proposal,
}

impl CommentType {
    /// Scope bucket for incident correlation: review comments attach to the
    /// PR, proposal comments to the underlying issue.
    pub fn scope(&self) -> &'static str {
        match self {
            Self::Pr | Self::Review => "pr",
            Self::Issue | Self::Proposal => "issue",
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Comment {
    pub id: String,
    pub issue_or_pr_number: u64,
    #[serde(rename = "type")]
    pub kind: CommentType,
    pub author: String,
    pub body: String,
    pub created_at: String,
    pub url: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub repo: Option<String>,
}

impl Comment {
    pub fn repo_tag<'a>(&'a self, default_repo: &'a str) -> &'a str {
        self.repo.as_deref().unwrap_or(default_repo)
    }
}

/// One immutable snapshot of project activity, supplied by the caller.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ActivitySnapshot {
    /// Primary repository ("owner/name"); the default tag for untagged records.
    pub repository: String,
    /// All repositories the snapshot covers, for artifact provenance.
    #[serde(default)]
    pub repositories: Vec<String>,
    pub generated_at: String,
    #[serde(default)]
    pub proposals: Vec<Proposal>,
    #[serde(default)]
    pub pull_requests: Vec<PullRequest>,
    #[serde(default)]
    pub comments: Vec<Comment>,
    /// Externally supplied discoverability score, 0-100.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub visibility_score: Option<f64>,
}

/// Parse an ISO-8601 timestamp, treating malformed values as absent.
pub fn parse_timestamp(raw: &str) -> Option<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(raw)
        .ok()
        .map(|dt| dt.with_timezone(&Utc))
}

/// Signed hours between two instants.
pub fn hours_between(earlier: DateTime<Utc>, later: DateTime<Utc>) -> f64 {
    (later - earlier).num_seconds() as f64 / 3600.0
}

/// Round to one decimal place, for reported hour values.
pub fn round_to_tenth(value: f64) -> f64 {
    (value * 10.0).round() / 10.0
}
