//! Incident detection from comment text.
//!
//! A comment containing a `BLOCKED: <marker>` token opens an incident for its
//! issue or PR scope; a later `VERIFIED` or "resolved" comment on the same
//! scope closes it. Classification is an ordered keyword heuristic, not a
//! parser; the patterns are part of the behavioral contract.

use std::collections::{HashMap, HashSet};
use std::sync::OnceLock;

use chrono::{DateTime, Utc};
use regex::Regex;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::config::EngineConfig;
use crate::model::{hours_between, parse_timestamp, round_to_tenth, Comment};

static BLOCKER_MARKER: OnceLock<Regex> = OnceLock::new();
static RESOLUTION_MARKER: OnceLock<Regex> = OnceLock::new();

fn blocker_marker() -> &'static Regex {
    BLOCKER_MARKER.get_or_init(|| {
        Regex::new(r"(?i)\bBLOCKED:\s*([a-z-]+)").expect("blocker pattern is valid")
    })
}

fn resolution_marker() -> &'static Regex {
    RESOLUTION_MARKER.get_or_init(|| {
        Regex::new(r"(?i)\bVERIFIED\b|\bresolved\b").expect("resolution pattern is valid")
    })
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum IncidentCategory {
    MaintainerGate,
    Permissions,
    CiRegression,
    AutomationFailure,
    GovernanceDeadlock,
}

impl IncidentCategory {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::MaintainerGate => "maintainer-gate",
            Self::Permissions => "permissions",
            Self::CiRegression => "ci-regression",
            Self::AutomationFailure => "automation-failure",
            Self::GovernanceDeadlock => "governance-deadlock",
        }
    }

    pub fn severity(&self) -> IncidentSeverity {
        match self {
            Self::Permissions | Self::MaintainerGate | Self::GovernanceDeadlock => {
                IncidentSeverity::High
            }
            Self::CiRegression | Self::AutomationFailure => IncidentSeverity::Medium,
        }
    }
}

/// `Low` has no classification path today; the variant stays so persisted
/// values and future rules keep a place to land.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum IncidentSeverity {
    Low,
    Medium,
    High,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum IncidentSource {
    Issue,
    Pr,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Incident {
    /// Deterministic: scope key plus category, so re-runs are idempotent.
    pub id: String,
    pub category: IncidentCategory,
    pub severity: IncidentSeverity,
    pub source_type: IncidentSource,
    pub source_number: u64,
    pub source_url: String,
    pub marker: String,
    pub summary: String,
    pub detected_at: String,
    pub age_hours: f64,
}

/// Detect unresolved operational blockers across all comments.
pub fn detect_incidents(
    comments: &[Comment],
    now: DateTime<Utc>,
    default_repo: &str,
    config: &EngineConfig,
) -> Vec<Incident> {
    // Comments with unparsable timestamps cannot be ordered against
    // resolutions and are skipped outright.
    let mut dated: Vec<(&Comment, DateTime<Utc>)> = comments
        .iter()
        .filter_map(|c| parse_timestamp(&c.created_at).map(|ts| (c, ts)))
        .collect();
    dated.sort_by_key(|(_, ts)| *ts);

    // Latest resolution timestamp per scope. Ascending order means the last
    // insert wins.
    let mut resolutions: HashMap<String, DateTime<Utc>> = HashMap::new();
    for (comment, ts) in &dated {
        if resolution_marker().is_match(&comment.body) {
            resolutions.insert(scope_key(comment, default_repo), *ts);
        }
    }

    // Newest-first so deduplication keeps the most recent unresolved
    // occurrence per (scope, category).
    let mut seen: HashSet<String> = HashSet::new();
    let mut incidents = Vec::new();
    for (comment, ts) in dated.iter().rev() {
        let captures = match blocker_marker().captures(&comment.body) {
            Some(c) => c,
            None => continue,
        };
        let marker = captures
            .get(1)
            .map(|m| m.as_str().to_ascii_lowercase())
            .unwrap_or_default();

        let scope = scope_key(comment, default_repo);
        if let Some(resolved_at) = resolutions.get(&scope) {
            if *resolved_at > *ts {
                debug!(%scope, "blocker already resolved, skipping");
                continue;
            }
        }

        let category = classify(&marker, &comment.body);
        let id = format!("{}:{}", scope, category.as_str());
        if !seen.insert(id.clone()) {
            continue;
        }

        let source_type = match comment.kind.scope() {
            "pr" => IncidentSource::Pr,
            _ => IncidentSource::Issue,
        };
        incidents.push(Incident {
            id,
            category,
            severity: category.severity(),
            source_type,
            source_number: comment.issue_or_pr_number,
            source_url: comment.url.clone(),
            marker,
            summary: summarize(&comment.body),
            detected_at: comment.created_at.clone(),
            age_hours: round_to_tenth(hours_between(*ts, now).max(0.0)),
        });
    }

    incidents.sort_by(|a, b| {
        b.age_hours
            .partial_cmp(&a.age_hours)
            .unwrap_or(std::cmp::Ordering::Equal)
    });
    incidents.truncate(config.max_incidents);

    info!(count = incidents.len(), "incident detection complete");
    incidents
}

/// Correlation key: `{issue|pr}:{number}:{repo}`, with the repo normalized to
/// the default so tagged and untagged comments on the same record correlate
/// while cross-repo number collisions stay distinct.
fn scope_key(comment: &Comment, default_repo: &str) -> String {
    format!(
        "{}:{}:{}",
        comment.kind.scope(),
        comment.issue_or_pr_number,
        comment.repo_tag(default_repo)
    )
}

// Ordered rules, first match wins.
fn classify(marker: &str, body: &str) -> IncidentCategory {
    let haystack = format!("{} {}", marker, body).to_lowercase();

    if haystack.contains("merge-required") {
        return IncidentCategory::MaintainerGate;
    }
    if ["admin-required", "permission", "push=false", "forbidden", "403"]
        .iter()
        .any(|needle| haystack.contains(needle))
    {
        return IncidentCategory::Permissions;
    }
    if ["ci", "check", "test", "lint", "build"]
        .iter()
        .any(|needle| haystack.contains(needle))
    {
        return IncidentCategory::CiRegression;
    }
    if ["automation", "workflow", "action"]
        .iter()
        .any(|needle| haystack.contains(needle))
    {
        return IncidentCategory::AutomationFailure;
    }
    IncidentCategory::GovernanceDeadlock
}

fn summarize(body: &str) -> String {
    let first_line = body.lines().next().unwrap_or("").trim();
    if first_line.chars().count() <= 140 {
        return first_line.to_string();
    }
    first_line.chars().take(140).collect()
}
