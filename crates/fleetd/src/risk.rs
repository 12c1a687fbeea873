//! Risk classification.
//!
//! Derives a risk level from the evidence confidence distribution and emits
//! the baseline narrative sentence for that tier. The thresholds are fixed
//! design constants; behavioral parity requires these exact values.

use fleet_common::{EvidenceItem, RiskLevel};

/// Confidence at or above which an item counts as high-confidence.
pub const HIGH_CONFIDENCE: f64 = 0.8;

/// High-confidence item count at which risk becomes HIGH.
pub const HIGH_RISK_COUNT: usize = 3;

/// Classify risk from the high-confidence item count.
pub fn classify(evidence: &[EvidenceItem]) -> RiskLevel {
    let high_conf = evidence
        .iter()
        .filter(|item| item.confidence >= HIGH_CONFIDENCE)
        .count();

    if high_conf >= HIGH_RISK_COUNT {
        RiskLevel::High
    } else if high_conf >= 1 {
        RiskLevel::Elevated
    } else {
        RiskLevel::Low
    }
}

/// Baseline narrative for a tier. This is the deterministic text the
/// composer falls back to when no external candidate is available.
pub fn baseline_narrative(vin: &str, risk_level: RiskLevel, top_signals: &str) -> String {
    match risk_level {
        RiskLevel::High => format!(
            "VIN {} shows multiple high-confidence predictive anomalies. Dominant signals: {}.",
            vin, top_signals
        ),
        RiskLevel::Elevated => format!(
            "VIN {} shows elevated predictive risk with active anomaly signals. Dominant signals: {}.",
            vin, top_signals
        ),
        RiskLevel::Low => format!(
            "VIN {} currently has no high-confidence anomaly cluster. Observed signals: {}.",
            vin, top_signals
        ),
    }
}
