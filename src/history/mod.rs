//! Health snapshot computation and the append-only history artifact.

pub mod artifact;
pub mod snapshot;

pub use artifact::{
    append_snapshot, build_history_artifact, compute_integrity, parse_history_artifact,
    serialize_for_integrity, ArtifactParams, Completeness, CompletenessStatus,
    GovernanceHistoryArtifact, Integrity, Provenance,
};
pub use snapshot::{compute_snapshot, GovernanceSnapshot};
