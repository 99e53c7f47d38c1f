use governance_health::analysis::{
    detect_incidents, IncidentCategory, IncidentSeverity, IncidentSource,
};
use governance_health::config::EngineConfig;
use governance_health::model::{parse_timestamp, CommentType};

mod common;
use common::*;

const NOW: &str = "2026-08-20T12:00:00Z";

fn detect(comments: &[governance_health::model::Comment]) -> Vec<governance_health::analysis::Incident> {
    detect_incidents(
        comments,
        parse_timestamp(NOW).unwrap(),
        "org/repo",
        &EngineConfig::default(),
    )
}

#[test]
fn blocked_then_verified_yields_no_incident() {
    let comments = vec![
        comment(
            "a",
            42,
            CommentType::Issue,
            "BLOCKED: admin-required",
            "2026-08-20T06:00:00Z",
        ),
        comment(
            "b",
            42,
            CommentType::Issue,
            "VERIFIED: admin applied fix",
            "2026-08-20T08:00:00Z",
        ),
    ];
    assert!(detect(&comments).is_empty());
}

#[test]
fn resolution_older_than_the_blocker_does_not_clear_it() {
    let comments = vec![
        comment(
            "a",
            42,
            CommentType::Issue,
            "resolved the earlier problem",
            "2026-08-20T06:00:00Z",
        ),
        comment(
            "b",
            42,
            CommentType::Issue,
            "BLOCKED: admin-required",
            "2026-08-20T08:00:00Z",
        ),
    ];
    let incidents = detect(&comments);
    assert_eq!(incidents.len(), 1);
    assert_eq!(incidents[0].category, IncidentCategory::Permissions);
    assert_eq!(incidents[0].severity, IncidentSeverity::High);
    assert_eq!(incidents[0].source_type, IncidentSource::Issue);
    assert_eq!(incidents[0].age_hours, 4.0);
}

#[test]
fn detection_is_idempotent_with_stable_ids() {
    let comments = vec![
        comment(
            "a",
            7,
            CommentType::Pr,
            "BLOCKED: merge-required",
            "2026-08-19T00:00:00Z",
        ),
        comment(
            "b",
            9,
            CommentType::Issue,
            "BLOCKED: ci keeps failing",
            "2026-08-19T12:00:00Z",
        ),
    ];
    let first = detect(&comments);
    let second = detect(&comments);

    assert_eq!(first.len(), 2);
    let ids: Vec<_> = first.iter().map(|i| i.id.clone()).collect();
    assert_eq!(ids, second.iter().map(|i| i.id.clone()).collect::<Vec<_>>());
    assert_eq!(first[0].id, "pr:7:org/repo:maintainer-gate");
}

#[test]
fn duplicate_blockers_keep_the_most_recent_occurrence() {
    let comments = vec![
        comment(
            "old",
            7,
            CommentType::Issue,
            "BLOCKED: ci red on main",
            "2026-08-18T00:00:00Z",
        ),
        comment(
            "new",
            7,
            CommentType::Issue,
            "BLOCKED: ci still red",
            "2026-08-19T00:00:00Z",
        ),
    ];
    let incidents = detect(&comments);
    assert_eq!(incidents.len(), 1);
    assert_eq!(incidents[0].detected_at, "2026-08-19T00:00:00Z");
    assert_eq!(incidents[0].summary, "BLOCKED: ci still red");
}

#[test]
fn same_number_in_different_repos_stays_separate() {
    let mut other = comment(
        "b",
        42,
        CommentType::Issue,
        "BLOCKED: vote-deadlock",
        "2026-08-19T00:00:00Z",
    );
    other.repo = Some("org/other".to_string());
    let comments = vec![
        comment(
            "a",
            42,
            CommentType::Issue,
            "BLOCKED: vote-deadlock",
            "2026-08-19T06:00:00Z",
        ),
        other,
    ];

    let incidents = detect(&comments);
    assert_eq!(incidents.len(), 2);
    assert_ne!(incidents[0].id, incidents[1].id);
}

#[test]
fn resolution_in_one_repo_does_not_clear_the_other() {
    let mut resolution = comment(
        "b",
        42,
        CommentType::Issue,
        "VERIFIED fixed over here",
        "2026-08-20T00:00:00Z",
    );
    resolution.repo = Some("org/other".to_string());
    let comments = vec![
        comment(
            "a",
            42,
            CommentType::Issue,
            "BLOCKED: admin-required",
            "2026-08-19T00:00:00Z",
        ),
        resolution,
    ];

    let incidents = detect(&comments);
    assert_eq!(incidents.len(), 1);
    assert_eq!(incidents[0].source_number, 42);
}

#[test]
fn output_is_capped_at_ten_oldest_first() {
    let mut comments = Vec::new();
    for i in 0..15u64 {
        comments.push(comment(
            &format!("c{}", i),
            100 + i,
            CommentType::Issue,
            "BLOCKED: quorum-missing",
            &format!("2026-08-{:02}T00:00:00Z", 1 + i),
        ));
    }

    let incidents = detect(&comments);
    assert_eq!(incidents.len(), 10);
    // Oldest (largest age) first, and only the ten oldest survive.
    assert!(incidents[0].age_hours > incidents[9].age_hours);
    assert_eq!(incidents[0].source_number, 100);
}

#[test]
fn review_comments_map_to_the_pr_scope() {
    let comments = vec![
        comment(
            "a",
            7,
            CommentType::Review,
            "BLOCKED: merge-required",
            "2026-08-19T00:00:00Z",
        ),
        comment(
            "b",
            7,
            CommentType::Pr,
            "VERIFIED after maintainer merge",
            "2026-08-19T06:00:00Z",
        ),
    ];
    // The PR-type resolution clears the review-type blocker on the same PR.
    assert!(detect(&comments).is_empty());
}

#[test]
fn comments_with_malformed_timestamps_are_skipped() {
    let comments = vec![comment(
        "a",
        7,
        CommentType::Issue,
        "BLOCKED: admin-required",
        "not-a-timestamp",
    )];
    assert!(detect(&comments).is_empty());
}
