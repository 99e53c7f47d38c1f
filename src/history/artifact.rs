//! Versioned, integrity-checked history artifact.
//!
//! The artifact is a value: each run builds a fresh one from the prior run's
//! snapshot list plus one new snapshot. Persistence belongs to the caller.
//! Legacy persisted files that are a bare snapshot array still load, as
//! schema version 0.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use sha2::{Digest, Sha256};
use tracing::debug;

use crate::config::{MAX_HISTORY_ENTRIES, SCHEMA_VERSION};
use crate::error::EngineError;

use super::snapshot::GovernanceSnapshot;

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Provenance {
    pub repositories: Vec<String>,
    pub generated_by: String,
    pub generator_version: String,
    pub source_commit_sha: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CompletenessStatus {
    Complete,
    Partial,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Completeness {
    pub status: CompletenessStatus,
    pub missing_repositories: Vec<String>,
    pub permission_gaps: Vec<String>,
    pub api_partials: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Integrity {
    pub algorithm: String,
    pub digest: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GovernanceHistoryArtifact {
    pub schema_version: u32,
    pub generated_at: String,
    /// Oldest first; insertion order is significant.
    pub snapshots: Vec<GovernanceSnapshot>,
    pub provenance: Provenance,
    pub completeness: Completeness,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub integrity: Option<Integrity>,
}

/// Inputs for [`build_history_artifact`].
#[derive(Debug, Clone, Default)]
pub struct ArtifactParams {
    pub generated_at: String,
    pub snapshots: Vec<GovernanceSnapshot>,
    pub repositories: Vec<String>,
    pub generated_by: String,
    pub generator_version: String,
    pub source_commit_sha: Option<String>,
    pub missing_repositories: Vec<String>,
    pub permission_gaps: Vec<String>,
    pub api_partials: Vec<String>,
}

/// Append without mutating: returns a new sequence, front-truncated to
/// [`MAX_HISTORY_ENTRIES`] so the oldest entries drop first.
pub fn append_snapshot(
    history: &[GovernanceSnapshot],
    snapshot: GovernanceSnapshot,
) -> Vec<GovernanceSnapshot> {
    let mut next = history.to_vec();
    next.push(snapshot);
    if next.len() > MAX_HISTORY_ENTRIES {
        let excess = next.len() - MAX_HISTORY_ENTRIES;
        next.drain(..excess);
    }
    next
}

/// Wrap snapshots in the versioned schema. Completeness is `partial` as soon
/// as any gap is reported; integrity starts empty and is filled by the caller
/// via [`compute_integrity`].
pub fn build_history_artifact(params: ArtifactParams) -> GovernanceHistoryArtifact {
    let complete = params.missing_repositories.is_empty()
        && params.permission_gaps.is_empty()
        && params.api_partials.is_empty();

    GovernanceHistoryArtifact {
        schema_version: SCHEMA_VERSION,
        generated_at: params.generated_at,
        snapshots: params.snapshots,
        provenance: Provenance {
            repositories: params.repositories,
            generated_by: params.generated_by,
            generator_version: params.generator_version,
            source_commit_sha: params.source_commit_sha,
        },
        completeness: Completeness {
            status: if complete {
                CompletenessStatus::Complete
            } else {
                CompletenessStatus::Partial
            },
            missing_repositories: params.missing_repositories,
            permission_gaps: params.permission_gaps,
            api_partials: params.api_partials,
        },
        integrity: None,
    }
}

/// Canonical JSON for hashing: fixed field order, `integrity` omitted so the
/// digest never covers itself.
pub fn serialize_for_integrity(
    artifact: &GovernanceHistoryArtifact,
) -> Result<String, EngineError> {
    let mut stripped = artifact.clone();
    stripped.integrity = None;
    Ok(serde_json::to_string(&stripped)?)
}

/// Sha256 digest over the canonical serialization, ready to be stored back
/// into the artifact by the caller.
pub fn compute_integrity(artifact: &GovernanceHistoryArtifact) -> Result<Integrity, EngineError> {
    let canonical = serialize_for_integrity(artifact)?;
    let digest = Sha256::digest(canonical.as_bytes());
    Ok(Integrity {
        algorithm: "sha256".to_string(),
        digest: hex::encode(digest),
    })
}

/// Accept both persisted formats: a bare snapshot array (legacy, normalized
/// to schema version 0 with partial completeness) or a full artifact object.
/// Anything else is `None`; whether that is fatal is the caller's call.
pub fn parse_history_artifact(raw: &Value) -> Option<GovernanceHistoryArtifact> {
    if let Some(entries) = raw.as_array() {
        let mut snapshots = Vec::with_capacity(entries.len());
        for entry in entries {
            let snapshot: GovernanceSnapshot = serde_json::from_value(entry.clone()).ok()?;
            snapshots.push(snapshot);
        }
        debug!(count = snapshots.len(), "parsed legacy bare-array history");
        return Some(GovernanceHistoryArtifact {
            schema_version: 0,
            generated_at: snapshots
                .last()
                .map(|s| s.timestamp.clone())
                .unwrap_or_default(),
            snapshots,
            provenance: Provenance {
                repositories: Vec::new(),
                generated_by: String::new(),
                generator_version: String::new(),
                source_commit_sha: None,
            },
            completeness: Completeness {
                status: CompletenessStatus::Partial,
                missing_repositories: Vec::new(),
                permission_gaps: Vec::new(),
                api_partials: Vec::new(),
            },
            integrity: None,
        });
    }

    if raw.is_object() {
        return serde_json::from_value(raw.clone()).ok();
    }
    None
}
