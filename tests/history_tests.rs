use governance_health::config::{MAX_HISTORY_ENTRIES, SCHEMA_VERSION};
use governance_health::history::{
    append_snapshot, build_history_artifact, compute_integrity, compute_snapshot,
    parse_history_artifact, serialize_for_integrity, ArtifactParams, CompletenessStatus,
};
use governance_health::model::ProposalPhase;

mod common;
use common::*;

#[test]
fn health_score_is_a_bounded_multiple_of_five() {
    let empty = compute_snapshot(&empty_snapshot(), None);
    assert_eq!(empty.health_score % 5, 0);
    assert!(empty.health_score <= 100);

    let mut busy = empty_snapshot();
    for number in 1..=8 {
        busy.proposals.push(with_votes(
            proposal(number, ProposalPhase::Voting, "2026-08-18T00:00:00Z"),
            9,
            1,
        ));
    }
    let snapshot = compute_snapshot(&busy, None);
    assert_eq!(snapshot.health_score % 5, 0);
    assert!(snapshot.health_score <= 100);
    assert_eq!(snapshot.active_proposals, 8);
    assert_eq!(snapshot.total_proposals, 8);
}

#[test]
fn velocity_counts_recent_terminal_transitions() {
    let mut data = empty_snapshot();
    data.proposals.push(with_transitions(
        proposal(1, ProposalPhase::Implemented, "2026-08-01T00:00:00Z"),
        &[(ProposalPhase::Implemented, "2026-08-18T00:00:00Z")],
    ));
    data.proposals.push(with_transitions(
        proposal(2, ProposalPhase::Rejected, "2026-08-01T00:00:00Z"),
        &[(ProposalPhase::Rejected, "2026-08-19T00:00:00Z")],
    ));
    // Outside the 7-day window.
    data.proposals.push(with_transitions(
        proposal(3, ProposalPhase::Inconclusive, "2026-07-01T00:00:00Z"),
        &[(ProposalPhase::Inconclusive, "2026-08-01T00:00:00Z")],
    ));

    let snapshot = compute_snapshot(&data, None);
    assert_eq!(snapshot.proposal_velocity, Some(2.0 / 7.0));
}

#[test]
fn velocity_is_null_when_nothing_resolved() {
    let snapshot = compute_snapshot(&empty_snapshot(), None);
    assert_eq!(snapshot.proposal_velocity, None);

    let json = serde_json::to_value(&snapshot).unwrap();
    assert!(json.get("proposalVelocity").unwrap().is_null());
}

#[test]
fn append_is_capped_and_keeps_the_newest_entry() {
    let base = compute_snapshot(&empty_snapshot(), None);
    let mut history = Vec::new();
    for i in 0..MAX_HISTORY_ENTRIES + 3 {
        let mut snapshot = base.clone();
        snapshot.timestamp = format!("t{}", i);
        history = append_snapshot(&history, snapshot);
        assert!(history.len() <= MAX_HISTORY_ENTRIES);
        assert_eq!(history.last().unwrap().timestamp, format!("t{}", i));
    }
    assert_eq!(history[0].timestamp, "t3");
}

#[test]
fn bare_array_parses_as_legacy_schema_zero() {
    let snapshot = compute_snapshot(&empty_snapshot(), None);
    let raw = serde_json::to_value(vec![snapshot.clone()]).unwrap();

    let artifact = parse_history_artifact(&raw).unwrap();
    assert_eq!(artifact.schema_version, 0);
    assert_eq!(artifact.completeness.status, CompletenessStatus::Partial);
    assert_eq!(artifact.snapshots.len(), 1);
    assert_eq!(artifact.generated_at, snapshot.timestamp);
}

#[test]
fn full_artifact_round_trips_through_json() {
    let snapshot = compute_snapshot(&empty_snapshot(), None);
    let mut artifact = build_history_artifact(ArtifactParams {
        generated_at: GENERATED_AT.to_string(),
        snapshots: vec![snapshot],
        repositories: vec!["org/repo".to_string()],
        generated_by: "governance-health".to_string(),
        generator_version: "0.1.0".to_string(),
        source_commit_sha: Some("abc123".to_string()),
        ..Default::default()
    });
    artifact.integrity = Some(compute_integrity(&artifact).unwrap());

    let raw = serde_json::to_value(&artifact).unwrap();
    assert_eq!(raw["schemaVersion"], SCHEMA_VERSION);
    assert_eq!(raw["completeness"]["status"], "complete");

    let parsed = parse_history_artifact(&raw).unwrap();
    assert_eq!(parsed.schema_version, SCHEMA_VERSION);
    assert_eq!(parsed.provenance.repositories, vec!["org/repo".to_string()]);
    assert_eq!(
        parsed.integrity.unwrap().digest,
        artifact.integrity.unwrap().digest
    );
}

#[test]
fn stored_digest_matches_a_recomputed_one() {
    let mut artifact = build_history_artifact(ArtifactParams {
        generated_at: GENERATED_AT.to_string(),
        snapshots: vec![compute_snapshot(&empty_snapshot(), None)],
        ..Default::default()
    });
    artifact.integrity = Some(compute_integrity(&artifact).unwrap());

    // The digest covers the canonical form without the integrity field, so
    // recomputing after storage must agree.
    let recomputed = compute_integrity(&artifact).unwrap();
    assert_eq!(artifact.integrity.unwrap().digest, recomputed.digest);
    assert!(!serialize_for_integrity(
        &build_history_artifact(ArtifactParams::default())
    )
    .unwrap()
    .contains("integrity"));
}

#[test]
fn gapped_artifact_reports_partial_completeness() {
    let artifact = build_history_artifact(ArtifactParams {
        generated_at: GENERATED_AT.to_string(),
        missing_repositories: vec!["org/missing".to_string()],
        ..Default::default()
    });
    assert_eq!(artifact.completeness.status, CompletenessStatus::Partial);
    assert_eq!(
        artifact.completeness.missing_repositories,
        vec!["org/missing".to_string()]
    );
}
