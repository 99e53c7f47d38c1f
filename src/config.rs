//! Engine thresholds and limits.
//!
//! Every cutoff used by the analysis passes lives here as a named value so
//! tests can exercise boundary behavior directly instead of chasing literals.

use serde::{Deserialize, Serialize};

/// Maximum number of snapshots retained in a history artifact. Oldest entries
/// are dropped first when the cap is exceeded.
pub const MAX_HISTORY_ENTRIES: usize = 90;

/// Current history artifact schema version. The legacy bare-array format is
/// normalized to version 0 on parse.
pub const SCHEMA_VERSION: u32 = 1;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EngineConfig {
    /// Proposal cycle time (discussion to ready) healthy/at-risk cutoffs, hours.
    pub cycle_time_healthy_hours: f64,
    pub cycle_time_at_risk_hours: f64,

    /// Implementation lead time (ready to merged PR) cutoffs, hours.
    pub lead_time_healthy_hours: f64,
    pub lead_time_at_risk_hours: f64,

    /// Blocked-ready-work fraction cutoffs and the age at which a ready
    /// proposal counts as waiting.
    pub blocked_ready_healthy_fraction: f64,
    pub blocked_ready_at_risk_fraction: f64,
    pub blocked_ready_age_hours: f64,

    /// Dashboard freshness cutoffs, hours since the snapshot was generated.
    pub freshness_healthy_hours: f64,
    pub freshness_at_risk_hours: f64,

    /// Discoverability visibility-score floors.
    pub visibility_healthy_score: f64,
    pub visibility_at_risk_score: f64,

    /// Staleness threshold for bottleneck detection, hours.
    pub staleness_hours: i64,

    /// Maximum incidents reported per run.
    pub max_incidents: usize,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            cycle_time_healthy_hours: 48.0,
            cycle_time_at_risk_hours: 72.0,
            lead_time_healthy_hours: 72.0,
            lead_time_at_risk_hours: 120.0,
            blocked_ready_healthy_fraction: 0.20,
            blocked_ready_at_risk_fraction: 0.40,
            blocked_ready_age_hours: 24.0,
            freshness_healthy_hours: 24.0,
            freshness_at_risk_hours: 48.0,
            visibility_healthy_score: 80.0,
            visibility_at_risk_score: 60.0,
            staleness_hours: 24,
            max_incidents: 10,
        }
    }
}
