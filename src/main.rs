use std::fs;
use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use governance_health::analysis::analyze;
use governance_health::config::EngineConfig;
use governance_health::history::{
    append_snapshot, build_history_artifact, compute_integrity, compute_snapshot,
    parse_history_artifact, ArtifactParams,
};
use governance_health::model::ActivitySnapshot;
use governance_health::EngineError;

/// Run the governance health engine over an activity snapshot file.
#[derive(Parser, Debug)]
#[command(version, about)]
struct Args {
    /// Path to the activity snapshot JSON
    snapshot: PathBuf,

    /// Evaluation time (ISO-8601); defaults to the snapshot's generatedAt
    #[arg(long)]
    now: Option<String>,

    /// Previously persisted history artifact to extend
    #[arg(long)]
    history: Option<PathBuf>,

    /// Emit the refreshed history artifact instead of the analysis report
    #[arg(long)]
    emit_history: bool,
}

fn main() -> Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "governance_health=info".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let args = Args::parse();

    let raw = fs::read_to_string(&args.snapshot)
        .with_context(|| format!("failed to read {}", args.snapshot.display()))?;
    let snapshot: ActivitySnapshot =
        serde_json::from_str(&raw).context("failed to parse activity snapshot")?;
    info!(
        repository = %snapshot.repository,
        proposals = snapshot.proposals.len(),
        pull_requests = snapshot.pull_requests.len(),
        comments = snapshot.comments.len(),
        "snapshot loaded"
    );

    let config = EngineConfig::default();

    if args.emit_history {
        let prior = match &args.history {
            Some(path) => {
                let raw = fs::read_to_string(path)
                    .with_context(|| format!("failed to read {}", path.display()))?;
                let value: serde_json::Value =
                    serde_json::from_str(&raw).context("history file is not JSON")?;
                parse_history_artifact(&value).ok_or_else(|| {
                    EngineError::ArtifactError(
                        "history file does not match any known schema".to_string(),
                    )
                })?
            }
            None => parse_history_artifact(&serde_json::json!([]))
                .context("empty history should always parse")?,
        };

        let new_snapshot = compute_snapshot(&snapshot, args.now.as_deref());
        let generated_at = new_snapshot.timestamp.clone();
        let mut artifact = build_history_artifact(ArtifactParams {
            generated_at,
            snapshots: append_snapshot(&prior.snapshots, new_snapshot),
            repositories: if snapshot.repositories.is_empty() {
                vec![snapshot.repository.clone()]
            } else {
                snapshot.repositories.clone()
            },
            generated_by: "governance-health".to_string(),
            generator_version: env!("CARGO_PKG_VERSION").to_string(),
            ..Default::default()
        });
        artifact.integrity = Some(compute_integrity(&artifact)?);

        println!("{}", serde_json::to_string_pretty(&artifact)?);
        return Ok(());
    }

    let report = analyze(&snapshot, args.now.as_deref(), &config);
    println!("{}", serde_json::to_string_pretty(&report)?);
    Ok(())
}
