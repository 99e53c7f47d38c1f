//! Reliability budget: how much failure headroom remains before reliability
//! work should displace feature delivery.

use serde::{Deserialize, Serialize};
use tracing::info;

use super::slo::{SloCheck, SloStatus};

/// Fixed action rule attached to every budget.
pub const RELIABILITY_POLICY: &str =
    "If the reliability budget stays below 40 for 3 consecutive days, prioritize reliability work over feature delivery.";

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReliabilityBudget {
    /// 0-100, after SLO and incident penalties.
    pub remaining: u32,
    pub policy: String,
    pub recommendation: String,
}

pub fn compute_reliability_budget(checks: &[SloCheck], incident_count: usize) -> ReliabilityBudget {
    let breaches = checks
        .iter()
        .filter(|c| c.status == SloStatus::Breach)
        .count() as i64;
    let at_risk = checks
        .iter()
        .filter(|c| c.status == SloStatus::AtRisk)
        .count() as i64;
    let incident_penalty = (incident_count as i64 * 4).min(20);

    let remaining = (100 - breaches * 25 - at_risk * 10 - incident_penalty).clamp(0, 100) as u32;

    let recommendation = if remaining < 40 || breaches > 0 {
        "pause features, fix reliability"
    } else if at_risk > 0 {
        "watch and schedule preventative maintenance"
    } else {
        "continue feature delivery"
    };

    info!(remaining, breaches, at_risk, "reliability budget computed");
    ReliabilityBudget {
        remaining,
        policy: RELIABILITY_POLICY.to_string(),
        recommendation: recommendation.to_string(),
    }
}
